//! Object entities: variables, constants, functions, type names and fields

use std::fmt;
use std::sync::{Arc, OnceLock};

use knife_graph::{ConstKind, ConstValue, ObjectId, PackageId, Pos, ScopeId, TypeId};

/// Attributes shared by every object kind
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub name: String,
    pub exported: bool,
    pub ty: TypeId,
    pub package: Option<PackageId>,
    pub pos: Pos,
}

/// The domain view of one declared entity
pub struct Object {
    id: ObjectId,
    kind: OnceLock<ObjectKind>,
}

impl Object {
    pub(crate) fn pending(id: ObjectId) -> Self {
        Self {
            id,
            kind: OnceLock::new(),
        }
    }

    pub(crate) fn populate(&self, kind: ObjectKind) {
        let _ = self.kind.set(kind);
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> Option<&ObjectKind> {
        self.kind.get()
    }

    pub fn info(&self) -> Option<&ObjectInfo> {
        self.kind().map(ObjectKind::info)
    }

    pub fn name(&self) -> Option<&str> {
        self.info().map(|i| i.name.as_str())
    }

    pub fn as_var(&self) -> Option<Arc<Var>> {
        match self.kind()? {
            ObjectKind::Var(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<Arc<Const>> {
        match self.kind()? {
            ObjectKind::Const(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<Arc<Func>> {
        match self.kind()? {
            ObjectKind::Func(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_type_name(&self) -> Option<Arc<TypeName>> {
        match self.kind()? {
            ObjectKind::TypeName(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<Arc<Field>> {
        match self.kind()? {
            ObjectKind::Field(o) => Some(o.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

/// Closed set of object kinds
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Var(Arc<Var>),
    Const(Arc<Const>),
    Func(Arc<Func>),
    TypeName(Arc<TypeName>),
    Field(Arc<Field>),
}

impl ObjectKind {
    pub fn info(&self) -> &ObjectInfo {
        match self {
            ObjectKind::Var(o) => &o.info,
            ObjectKind::Const(o) => &o.info,
            ObjectKind::Func(o) => &o.info,
            ObjectKind::TypeName(o) => &o.info,
            ObjectKind::Field(o) => &o.info,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Var(_) => "Var",
            ObjectKind::Const(_) => "Const",
            ObjectKind::Func(_) => "Func",
            ObjectKind::TypeName(_) => "TypeName",
            ObjectKind::Field(_) => "Field",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Var {
    pub info: ObjectInfo,
}

/// A struct member
#[derive(Debug, Clone)]
pub struct Field {
    pub info: ObjectInfo,
    /// Embedded field
    pub anonymous: bool,
    pub tag: String,
    /// Struct type declaring the field
    pub owner: TypeId,
}

#[derive(Debug, Clone)]
pub struct Func {
    pub info: ObjectInfo,
    /// Same as `info.ty`
    pub signature: TypeId,
    /// Body scope, when recorded
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct TypeName {
    pub info: ObjectInfo,
    pub is_alias: bool,
}

/// A declared constant and its value
#[derive(Debug, Clone)]
pub struct Const {
    pub info: ObjectInfo,
    value: ConstValue,
}

impl Const {
    pub(crate) fn new(info: ObjectInfo, value: ConstValue) -> Self {
        Self { info, value }
    }

    /// The raw constant value
    pub fn val(&self) -> &ConstValue {
        &self.value
    }

    pub fn const_kind(&self) -> ConstKind {
        self.value.kind()
    }

    /// # Panics
    ///
    /// Panics if the constant is not a boolean.
    pub fn bool_val(&self) -> bool {
        self.try_bool_val()
            .unwrap_or_else(|| self.mismatch("bool"))
    }

    /// # Panics
    ///
    /// Panics if the constant is not a string.
    pub fn string_val(&self) -> String {
        self.try_string_val()
            .unwrap_or_else(|| self.mismatch("string"))
    }

    /// # Panics
    ///
    /// Panics if the constant is not an integer representable as `i64`.
    pub fn int64_val(&self) -> i64 {
        self.try_int64_val()
            .unwrap_or_else(|| self.mismatch("int64"))
    }

    /// # Panics
    ///
    /// Panics if the constant is not an integer representable as `u64`.
    pub fn uint64_val(&self) -> u64 {
        self.try_uint64_val()
            .unwrap_or_else(|| self.mismatch("uint64"))
    }

    /// # Panics
    ///
    /// Panics if the constant is not numeric or not exactly representable as `f32`.
    pub fn float32_val(&self) -> f32 {
        self.try_float32_val()
            .unwrap_or_else(|| self.mismatch("float32"))
    }

    /// # Panics
    ///
    /// Panics if the constant is not numeric or not exactly representable as `f64`.
    pub fn float64_val(&self) -> f64 {
        self.try_float64_val()
            .unwrap_or_else(|| self.mismatch("float64"))
    }

    pub fn try_bool_val(&self) -> Option<bool> {
        self.value.as_bool()
    }

    pub fn try_string_val(&self) -> Option<String> {
        self.value.as_str().map(str::to_string)
    }

    pub fn try_int64_val(&self) -> Option<i64> {
        self.value.as_i64()
    }

    pub fn try_uint64_val(&self) -> Option<u64> {
        self.value.as_u64()
    }

    pub fn try_float32_val(&self) -> Option<f32> {
        self.value.as_f32()
    }

    pub fn try_float64_val(&self) -> Option<f64> {
        self.value.as_f64()
    }

    fn mismatch(&self, wanted: &str) -> ! {
        panic!(
            "constant {} is {:?} ({}), not {}",
            self.info.name,
            self.value.kind(),
            self.value,
            wanted
        )
    }
}
