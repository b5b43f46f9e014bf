//! Domain entities as navigable template values
//!
//! An [`EntityView`] pairs a session with one entity id and exposes the
//! entity's members under the names templates use (`Name`, `Fields`,
//! `Methods`, ...). Members are produced on demand, so cyclic type graphs
//! never have to be unrolled into a tree.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use knife_core::knife_graph::{
    ChanDir, ConstValue, ObjectId, PackageId, Pos, Position, ScopeId, TypeId,
};
use knife_core::{AsType, HasPos, NameTable, ObjectKind, Session, TypeKind};
use knife_path::{Mapping, Navigable, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Package(PackageId),
    Type(TypeId),
    Object(ObjectId),
    Scope(ScopeId),
}

#[derive(Clone)]
pub struct EntityView {
    session: Arc<Session>,
    entity: Entity,
    exported_only: bool,
}

impl EntityView {
    pub fn new(session: Arc<Session>, entity: Entity) -> Self {
        Self {
            session,
            entity,
            exported_only: false,
        }
    }

    /// Restrict the name tables of a package view to exported entities
    pub fn exported_only(mut self, exported_only: bool) -> Self {
        self.exported_only = exported_only;
        self
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The view inside `value`, if it holds one
    pub fn from_value(value: &Value) -> Option<&EntityView> {
        value.as_object()?.as_any().downcast_ref::<EntityView>()
    }

    fn wrap(&self, entity: Entity) -> Value {
        Value::object(EntityView::new(self.session.clone(), entity))
    }

    fn type_value(&self, id: TypeId) -> Value {
        self.wrap(Entity::Type(id))
    }

    fn object_value(&self, id: ObjectId) -> Value {
        self.wrap(Entity::Object(id))
    }

    fn package_value(&self, id: Option<PackageId>) -> Value {
        id.map_or(Value::Null, |id| self.wrap(Entity::Package(id)))
    }

    fn objects(&self, ids: &[ObjectId]) -> Value {
        Value::seq(ids.iter().map(|id| self.object_value(*id)))
    }

    fn keep(&self, id: ObjectId) -> bool {
        !self.exported_only || self.session.graph().object(id).is_exported()
    }

    fn table(&self, table: &NameTable<ObjectId>) -> Value {
        Value::Map(Mapping::strings(
            table
                .iter()
                .filter(|(_, id)| self.keep(**id))
                .map(|(name, id)| (name, self.object_value(*id))),
        ))
    }

    fn table_names(&self, table: &NameTable<ObjectId>) -> Value {
        Value::seq(
            table
                .iter()
                .filter(|(_, id)| self.keep(**id))
                .map(|(name, _)| Value::string(name)),
        )
    }

    fn position(&self, pos: Pos) -> Value {
        Value::object(PositionView(self.session.graph().fset().position(pos)))
    }

    fn package_field(&self, id: PackageId, name: &str) -> Option<Value> {
        let package = self.session.package(id);
        let data = package.get()?;
        let value = match name {
            "Name" => Value::string(&data.name),
            "Path" => Value::string(&data.path),
            "Imports" => Value::seq(
                data.imports
                    .iter()
                    .map(|imp| self.wrap(Entity::Package(*imp))),
            ),
            "Funcs" => self.table(&data.funcs),
            "FuncNames" => self.table_names(&data.funcs),
            "Vars" => self.table(&data.vars),
            "VarNames" => self.table_names(&data.vars),
            "Consts" => self.table(&data.consts),
            "ConstNames" => self.table_names(&data.consts),
            "Types" => self.table(&data.types),
            "TypeNames" => self.table_names(&data.types),
            "Scope" => self.wrap(Entity::Scope(data.scope)),
            _ => return None,
        };
        Some(value)
    }

    /// `Struct`, `Map`, `Named`, ... on any type view; null when the kind differs
    fn kind_member(&self, id: TypeId, name: &str) -> Option<Value> {
        if !KIND_MEMBERS.contains(&name) {
            return None;
        }
        if name == "Named" {
            return Some(match self.session.to_named(&id) {
                Some(_) => self.type_value(id),
                None => Value::Null,
            });
        }
        let value = self
            .session
            .under(&id)
            .filter(|node| {
                node.kind()
                    .is_some_and(|kind| name == "Underlying" || kind.name() == name)
            })
            .map_or(Value::Null, |node| self.type_value(node.id()));
        Some(value)
    }

    fn type_field(&self, id: TypeId, name: &str) -> Option<Value> {
        if name == "String" {
            return Some(Value::string(self.session.graph().type_string(id)));
        }
        if let Some(value) = self.kind_member(id, name) {
            return Some(value);
        }
        let node = self.session.type_node(id);
        let value = match (node.kind()?, name) {
            (TypeKind::Basic(b), "Name") => Value::string(&b.name),
            (TypeKind::Basic(b), "Kind") => Value::string(format!("{:?}", b.kind)),
            (TypeKind::Basic(b), "Info") => Value::from(serde_json::json!(b.info)),
            (TypeKind::Array(a), "Elem") => self.type_value(a.elem),
            (TypeKind::Array(a), "Len") => Value::from(a.len),
            (TypeKind::Slice(s), "Elem") => self.type_value(s.elem),
            (TypeKind::Struct(s), "Fields") => self.table(&s.fields),
            (TypeKind::Struct(s), "FieldNames") => Value::seq(
                s.list
                    .iter()
                    .map(|f| Value::string(&self.session.graph().object(*f).name)),
            ),
            (TypeKind::Struct(s), "FieldList") => self.objects(&s.list),
            (TypeKind::Struct(s), "NumFields") => Value::from(s.num_fields() as i64),
            (TypeKind::Map(m), "Key") => self.type_value(m.key),
            (TypeKind::Map(m), "Elem") => self.type_value(m.elem),
            (TypeKind::Pointer(p), "Elem") => self.type_value(p.elem),
            (TypeKind::Chan(c), "Elem") => self.type_value(c.elem),
            (TypeKind::Chan(c), "Dir") => Value::string(match c.dir {
                ChanDir::Both => "SendRecv",
                ChanDir::Send => "SendOnly",
                ChanDir::Recv => "RecvOnly",
            }),
            (TypeKind::Interface(i), "Empty") => Value::Bool(i.empty),
            (TypeKind::Interface(i), "Embeddeds") => {
                Value::seq(i.embeddeds.iter().map(|t| self.type_value(*t)))
            }
            (TypeKind::Interface(i), "Methods") => self.table(&i.methods),
            (TypeKind::Interface(i), "MethodNames") => self.table_names(&i.methods),
            (TypeKind::Interface(i), "ExplicitMethods") => self.table(&i.explicit_methods),
            (TypeKind::Interface(i), "ExplicitMethodNames") => {
                self.table_names(&i.explicit_methods)
            }
            (TypeKind::Signature(s), "Recv") => s.recv.map_or(Value::Null, |r| self.object_value(r)),
            (TypeKind::Signature(s), "Params") => self.objects(&s.params),
            (TypeKind::Signature(s), "Results") => self.objects(&s.results),
            (TypeKind::Signature(s), "Variadic") => Value::Bool(s.variadic),
            (TypeKind::Named(n), "Methods") => self.table(&n.methods),
            (TypeKind::Named(n), "MethodNames") => self.table_names(&n.methods),
            (TypeKind::Named(n), "Object") => self.object_value(n.object),
            _ => return None,
        };
        Some(value)
    }

    fn object_field(&self, id: ObjectId, name: &str) -> Option<Value> {
        let object = self.session.object(id);
        let kind = object.kind()?;
        let info = kind.info();
        let common = match name {
            "Name" => Some(Value::string(&info.name)),
            "Exported" => Some(Value::Bool(info.exported)),
            "Type" => Some(self.type_value(info.ty)),
            "Package" => Some(self.package_value(info.package)),
            "Pos" => Some(self.position(info.pos)),
            "Doc" => Some(Value::string(self.session.graph().fset().doc(info.pos))),
            _ => None,
        };
        if common.is_some() {
            return common;
        }
        let value = match (kind, name) {
            (ObjectKind::Field(f), "Tag") => Value::string(&f.tag),
            (ObjectKind::Field(f), "Anonymous") => Value::Bool(f.anonymous),
            (ObjectKind::Field(f), "Struct") => self.type_value(f.owner),
            (ObjectKind::Func(f), "Signature") => self.type_value(f.signature),
            (ObjectKind::Func(f), "Scope") => f
                .scope
                .map_or(Value::Null, |s| self.wrap(Entity::Scope(s))),
            (ObjectKind::TypeName(t), "IsAlias") => Value::Bool(t.is_alias),
            (ObjectKind::Const(c), "Value") => const_value(c.val()),
            _ => return None,
        };
        Some(value)
    }

    fn scope_field(&self, id: ScopeId, name: &str) -> Option<Value> {
        let scope = self.session.scope(id);
        let data = scope.get()?;
        let value = match name {
            "Parent" => data
                .parent
                .map_or(Value::Null, |p| self.wrap(Entity::Scope(p))),
            "Children" => Value::seq(
                data.children
                    .iter()
                    .map(|c| self.wrap(Entity::Scope(*c))),
            ),
            "Pos" => self.position(data.pos),
            "End" => self.position(data.end),
            "Objects" => self.table(&data.objects),
            "Names" => self.table_names(&data.objects),
            "Kind" => Value::string(format!("{:?}", data.kind)),
            _ => return None,
        };
        Some(value)
    }
}

fn const_value(value: &ConstValue) -> Value {
    match value {
        ConstValue::Unknown => Value::Null,
        ConstValue::Bool(b) => Value::Bool(*b),
        ConstValue::String(s) => Value::string(s),
        ConstValue::Int(i) => match (i64::try_from(*i), u64::try_from(*i)) {
            (Ok(v), _) => Value::int(v),
            (_, Ok(v)) => Value::uint(v),
            _ => Value::string(i.to_string()),
        },
        ConstValue::Float(f) => Value::float(*f),
    }
}

const PACKAGE_FIELDS: &[&str] = &[
    "Name", "Path", "Imports", "Funcs", "FuncNames", "Vars", "VarNames", "Consts", "ConstNames",
    "Types", "TypeNames", "Scope",
];

const KIND_MEMBERS: &[&str] = &[
    "Array", "Slice", "Struct", "Map", "Pointer", "Chan", "Basic", "Interface", "Signature",
    "Named", "Underlying",
];

const OBJECT_FIELDS: &[&str] = &["Name", "Exported", "Type", "Package", "Pos", "Doc"];

const SCOPE_FIELDS: &[&str] = &["Parent", "Children", "Pos", "End", "Objects", "Names", "Kind"];

impl Navigable for EntityView {
    fn type_name(&self) -> String {
        match self.entity {
            Entity::Package(_) => "Package".to_string(),
            Entity::Type(id) => self
                .session
                .type_node(id)
                .kind()
                .map_or("Type", TypeKind::name)
                .to_string(),
            Entity::Object(id) => self
                .session
                .object(id)
                .kind()
                .map_or("Object", ObjectKind::name)
                .to_string(),
            Entity::Scope(_) => "Scope".to_string(),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match self.entity {
            Entity::Package(id) => self.package_field(id, name),
            Entity::Type(id) => self.type_field(id, name),
            Entity::Object(id) => self.object_field(id, name),
            Entity::Scope(id) => self.scope_field(id, name),
        }
    }

    fn field_names(&self) -> Vec<String> {
        let names: &[&str] = match self.entity {
            Entity::Package(_) => PACKAGE_FIELDS,
            Entity::Object(_) => OBJECT_FIELDS,
            Entity::Scope(_) => SCOPE_FIELDS,
            Entity::Type(id) => match self.session.type_node(id).kind() {
                Some(TypeKind::Basic(_)) => &["String", "Name", "Kind", "Info"],
                Some(TypeKind::Array(_)) => &["String", "Elem", "Len"],
                Some(TypeKind::Slice(_) | TypeKind::Pointer(_)) => &["String", "Elem"],
                Some(TypeKind::Struct(_)) => {
                    &["String", "Fields", "FieldNames", "FieldList", "NumFields"]
                }
                Some(TypeKind::Map(_)) => &["String", "Key", "Elem"],
                Some(TypeKind::Chan(_)) => &["String", "Dir", "Elem"],
                Some(TypeKind::Interface(_)) => &[
                    "String",
                    "Empty",
                    "Embeddeds",
                    "Methods",
                    "MethodNames",
                    "ExplicitMethods",
                    "ExplicitMethodNames",
                ],
                Some(TypeKind::Signature(_)) => &["String", "Recv", "Params", "Results", "Variadic"],
                Some(TypeKind::Named(_)) => &["String", "Methods", "MethodNames", "Object"],
                None => &["String"],
            },
        };
        let kind_members: &[&str] = match self.entity {
            Entity::Type(_) => KIND_MEMBERS,
            _ => &[],
        };
        names
            .iter()
            .chain(kind_members)
            .map(|n| n.to_string())
            .collect()
    }

    fn describe(&self) -> String {
        let graph = self.session.graph();
        match self.entity {
            Entity::Package(id) => graph.package(id).path.clone(),
            Entity::Type(id) => graph.type_string(id),
            Entity::Object(id) => graph.object_string(id),
            Entity::Scope(id) => {
                let scope = graph.scope(id);
                format!(
                    "scope {}-{}",
                    graph.fset().position(scope.pos),
                    graph.fset().position(scope.end)
                )
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for EntityView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityView")
            .field("entity", &self.entity)
            .field("exported_only", &self.exported_only)
            .finish()
    }
}

impl AsType for EntityView {
    fn type_id(&self, session: &Session) -> Option<TypeId> {
        match self.entity {
            Entity::Type(id) => Some(id),
            Entity::Object(id) => AsType::type_id(&id, session),
            Entity::Package(_) | Entity::Scope(_) => None,
        }
    }
}

impl HasPos for EntityView {
    fn pos(&self, session: &Session) -> Pos {
        match self.entity {
            Entity::Object(id) => id.pos(session),
            Entity::Scope(id) => id.pos(session),
            Entity::Package(_) | Entity::Type(_) => Pos::NONE,
        }
    }
}

/// A resolved source position; prints as `file:line:column`
#[derive(Debug, Clone, PartialEq)]
pub struct PositionView(pub Position);

impl Navigable for PositionView {
    fn type_name(&self) -> String {
        "Position".to_string()
    }

    fn field(&self, name: &str) -> Option<Value> {
        let p = &self.0;
        let value = match name {
            "Filename" => Value::string(&p.filename),
            "Offset" => Value::from(i64::from(p.offset)),
            "Line" => Value::from(i64::from(p.line)),
            "Column" => Value::from(i64::from(p.column)),
            "IsValid" => Value::Bool(p.is_valid()),
            _ => return None,
        };
        Some(value)
    }

    fn field_names(&self) -> Vec<String> {
        ["Filename", "Offset", "Line", "Column", "IsValid"]
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    fn describe(&self) -> String {
        self.0.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knife_core::knife_graph::{FileSet, TypeGraph};

    #[test]
    fn test_position_view() {
        let mut fset = FileSet::new();
        let file = fset.add_file("a.go", "package a\nvar x int\n");
        let view = PositionView(fset.position(fset.pos(file, 2, 5)));
        assert_eq!(view.describe(), "a.go:2:5");
        assert_eq!(view.field("Line"), Some(Value::from(2i64)));
        assert_eq!(view.field("Nope"), None);
    }

    #[test]
    fn test_basic_type_view() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(knife_core::knife_graph::BasicKind::Int);
        let session = Arc::new(Session::new(Arc::new(graph)));
        let view = EntityView::new(session, Entity::Type(int));
        assert_eq!(view.type_name(), "Basic");
        assert_eq!(view.field("Name"), Some(Value::string("int")));
        assert_eq!(view.field("String"), Some(Value::string("int")));
        assert_eq!(view.field("Elem"), None);
        assert_eq!(view.describe(), "int");

        assert_eq!(view.field("Struct"), Some(Value::Null));
        assert_eq!(view.field("Named"), Some(Value::Null));
        let under = view.field("Underlying").unwrap();
        assert_eq!(under.to_string(), "int");
        assert!(view.field_names().iter().any(|n| n == "Signature"));
    }

    #[test]
    fn test_struct_view_keeps_blank_fields() {
        use knife_core::knife_graph::{BasicKind, FieldSpec};

        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("pad", "example.com/pad");
        let int = graph.basic(BasicKind::Int);
        let padded = graph.struct_type(
            Some(pkg),
            vec![
                FieldSpec::new("_", int),
                FieldSpec::new("_", int),
                FieldSpec::new("X", int),
            ],
        );
        let session = Arc::new(Session::new(Arc::new(graph)));
        let view = EntityView::new(session, Entity::Type(padded));

        assert_eq!(
            view.field("FieldNames"),
            Some(Value::seq(["_", "_", "X"].map(Value::string)))
        );
        assert_eq!(view.field("NumFields"), Some(Value::from(3i64)));
        let list = view.field("FieldList").unwrap();
        assert!(matches!(&list, Value::Seq(items) if items.len() == 3));
        assert_eq!(view.field("Struct").unwrap().to_string(), "struct{_ int; _ int; X int}");
    }

    #[test]
    fn test_const_values() {
        assert_eq!(const_value(&ConstValue::Int(-3)), Value::int(-3));
        assert_eq!(
            const_value(&ConstValue::Int(1 << 63)),
            Value::uint(1 << 63)
        );
        assert_eq!(
            const_value(&ConstValue::Int(1 << 100)),
            Value::string((1i128 << 100).to_string())
        );
        assert_eq!(const_value(&ConstValue::Unknown), Value::Null);
    }
}
