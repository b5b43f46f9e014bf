//! Data and functions handed to a renderer for one package

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use knife_core::knife_graph::PackageId;
use knife_core::Session;
use knife_path::Value;

use crate::funcs;
use crate::view::{Entity, EntityView};

/// A callable template primitive
pub type TemplateFunc = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Named template primitives
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: BTreeMap<String, TemplateFunc>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFunc> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    /// Call `name` with `args`
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self
            .funcs
            .get(name)
            .ok_or_else(|| anyhow!("function {:?} not defined", name))?;
        func(args)
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

/// Everything a renderer needs for one package
#[derive(Clone)]
pub struct TemplateData {
    session: Arc<Session>,
    package: PackageId,
    extra: Arc<BTreeMap<String, serde_json::Value>>,
    exported_only: bool,
}

impl fmt::Debug for TemplateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateData")
            .field("package", &self.package)
            .field("exported_only", &self.exported_only)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TemplateData {
    pub fn new(session: Arc<Session>, package: PackageId) -> Self {
        Self {
            session,
            package,
            extra: Arc::new(BTreeMap::new()),
            exported_only: false,
        }
    }

    pub fn with_extra(mut self, extra: Arc<BTreeMap<String, serde_json::Value>>) -> Self {
        self.extra = extra;
        self
    }

    pub fn exported_only(mut self, exported_only: bool) -> Self {
        self.exported_only = exported_only;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn package_id(&self) -> PackageId {
        self.package
    }

    /// Import path of the package
    pub fn path(&self) -> &str {
        &self.session.graph().package(self.package).path
    }

    /// Default navigation context: the package view
    pub fn root(&self) -> Value {
        Value::object(
            EntityView::new(self.session.clone(), Entity::Package(self.package))
                .exported_only(self.exported_only),
        )
    }

    /// Entry of the configured extra data, converted to a value
    pub fn data(&self, key: &str) -> Value {
        self.extra
            .get(key)
            .cloned()
            .map_or(Value::Null, Value::from)
    }

    pub fn view(&self, entity: Entity) -> Value {
        Value::object(EntityView::new(self.session.clone(), entity))
    }

    /// `"path.Name"` resolved as seen from this package
    pub fn object_of(&self, qualified: &str) -> Value {
        self.session
            .object_of(self.package, qualified)
            .map_or(Value::Null, |obj| self.view(Entity::Object(obj.id())))
    }

    /// `"*path.Name"` resolved as seen from this package
    pub fn type_of(&self, expr: &str) -> Value {
        self.session
            .type_of(self.package, expr)
            .map_or(Value::Null, |ty| self.view(Entity::Type(ty.id())))
    }

    /// The full set of template primitives bound to this package
    pub fn func_map(&self) -> FuncMap {
        funcs::builtins(self)
    }
}
