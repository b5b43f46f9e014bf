//! Raw type-checker graph and its builder
//!
//! The loader fills a [`TypeGraph`] once per session and hands it to the
//! domain layer behind an `Arc`. After construction the graph is read-only.
//! Nodes reference each other through ids, so cycles (a method whose
//! receiver is its own declaring type, mutually recursive structs) are
//! expressed without ownership loops.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::basic::BasicKind;
use crate::constant::ConstValue;
use crate::error::GraphError;
use crate::ids::{ObjectId, PackageId, ScopeId, TypeId};
use crate::position::{FileSet, Pos};

/// Direction of a channel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A type node as produced by the type checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawType {
    Basic(BasicKind),
    Array {
        elem: TypeId,
        len: i64,
    },
    Slice {
        elem: TypeId,
    },
    /// Fields are `Field` objects in declaration order
    Struct {
        fields: Vec<ObjectId>,
    },
    Map {
        key: TypeId,
        elem: TypeId,
    },
    Pointer {
        elem: TypeId,
    },
    Chan {
        dir: ChanDir,
        elem: TypeId,
    },
    /// Explicitly declared methods plus embedded interface types
    Interface {
        methods: Vec<ObjectId>,
        embeddeds: Vec<TypeId>,
    },
    Signature {
        recv: Option<ObjectId>,
        params: Vec<ObjectId>,
        results: Vec<ObjectId>,
        variadic: bool,
    },
    Named {
        obj: ObjectId,
        underlying: Option<TypeId>,
        methods: Vec<ObjectId>,
    },
}

/// Kind specific part of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawObjectKind {
    Var,
    Field {
        embedded: bool,
        tag: String,
        /// Struct type declaring the field
        owner: TypeId,
    },
    Const(ConstValue),
    Func {
        /// Scope of the function body, when the loader recorded one
        scope: Option<ScopeId>,
    },
    TypeName {
        alias: bool,
    },
}

/// A declared entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObject {
    pub name: String,
    pub package: Option<PackageId>,
    pub ty: TypeId,
    pub pos: Pos,
    /// Scope the object is declared in (None for fields, params, methods)
    pub parent: Option<ScopeId>,
    pub kind: RawObjectKind,
}

impl RawObject {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPackage {
    pub name: String,
    pub path: String,
    pub imports: Vec<PackageId>,
    pub scope: ScopeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub pos: Pos,
    pub end: Pos,
    /// Declared names, sorted
    pub names: BTreeMap<String, ObjectId>,
    /// Debug label, e.g. "package a" or "function F"
    pub comment: String,
}

impl RawScope {
    /// Whether `pos` lies within the scope's extent
    pub fn contains(&self, pos: Pos) -> bool {
        self.pos <= pos && pos < self.end
    }
}

/// Reports whether a name starts with an upper-case letter
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Field description used by [`TypeGraph::struct_type`]
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TypeId,
    pub tag: String,
    pub embedded: bool,
    pub pos: Pos,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: String::new(),
            embedded: false,
            pos: Pos::NONE,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }
}

/// The complete output of a type-checking session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeGraph {
    types: Vec<RawType>,
    objects: Vec<RawObject>,
    packages: Vec<RawPackage>,
    scopes: Vec<RawScope>,
    universe: ScopeId,
    basics: HashMap<BasicKind, TypeId>,
    pointers: HashMap<TypeId, TypeId>,
    error_type: TypeId,
    fset: FileSet,
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    /// Create a graph holding only the universe scope
    pub fn new() -> Self {
        let mut graph = Self {
            types: Vec::new(),
            objects: Vec::new(),
            packages: Vec::new(),
            scopes: Vec::new(),
            universe: ScopeId(0),
            basics: HashMap::new(),
            pointers: HashMap::new(),
            error_type: TypeId(0),
            fset: FileSet::new(),
        };
        graph.universe = graph.new_scope(None, Pos::NONE, Pos::NONE, "universe");
        graph.populate_universe();
        graph
    }

    fn populate_universe(&mut self) {
        let universe = self.universe;

        for &kind in BasicKind::PREDECLARED {
            let ty = self.basic(kind);
            let obj = self.push_object(RawObject {
                name: kind.name().to_string(),
                package: None,
                ty,
                pos: Pos::NONE,
                parent: None,
                kind: RawObjectKind::TypeName { alias: false },
            });
            self.insert(universe, obj);
        }

        // byte and rune are aliases
        for (alias, kind) in [("byte", BasicKind::Uint8), ("rune", BasicKind::Int32)] {
            let ty = self.basic(kind);
            let obj = self.push_object(RawObject {
                name: alias.to_string(),
                package: None,
                ty,
                pos: Pos::NONE,
                parent: None,
                kind: RawObjectKind::TypeName { alias: true },
            });
            self.insert(universe, obj);
        }

        // type error interface { Error() string }
        let (error_type, error_obj) = self.named_in(None, "error", Pos::NONE);
        let string = self.basic(BasicKind::String);
        let result = self.new_param(None, "", string);
        let sig = self.signature(None, vec![], vec![result], false);
        let method = self.push_object(RawObject {
            name: "Error".to_string(),
            package: None,
            ty: sig,
            pos: Pos::NONE,
            parent: None,
            kind: RawObjectKind::Func { scope: None },
        });
        let iface = self.interface_type(vec![method], vec![]);
        self.types[error_type.index()] = RawType::Named {
            obj: error_obj,
            underlying: Some(iface),
            methods: Vec::new(),
        };
        self.error_type = error_type;
        self.insert(universe, error_obj);

        let empty = self.interface_type(vec![], vec![]);
        let any = self.push_object(RawObject {
            name: "any".to_string(),
            package: None,
            ty: empty,
            pos: Pos::NONE,
            parent: None,
            kind: RawObjectKind::TypeName { alias: true },
        });
        self.insert(universe, any);

        let untyped_bool = self.basic(BasicKind::UntypedBool);
        for (name, value) in [("true", true), ("false", false)] {
            let obj = self.push_object(RawObject {
                name: name.to_string(),
                package: None,
                ty: untyped_bool,
                pos: Pos::NONE,
                parent: None,
                kind: RawObjectKind::Const(ConstValue::Bool(value)),
            });
            self.insert(universe, obj);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn type_(&self, id: TypeId) -> &RawType {
        &self.types[id.index()]
    }

    pub fn object(&self, id: ObjectId) -> &RawObject {
        &self.objects[id.index()]
    }

    pub fn package(&self, id: PackageId) -> &RawPackage {
        &self.packages[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &RawScope {
        &self.scopes[id.index()]
    }

    pub fn universe(&self) -> ScopeId {
        self.universe
    }

    /// The predeclared `error` type
    pub fn error_type(&self) -> TypeId {
        self.error_type
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        (0..self.packages.len()).map(PackageId::from_index)
    }

    pub fn package_by_path(&self, path: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.path == path)
            .map(PackageId::from_index)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn fset(&self) -> &FileSet {
        &self.fset
    }

    pub fn fset_mut(&mut self) -> &mut FileSet {
        &mut self.fset
    }

    /// Look a name up in a single scope
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        self.scope(scope).names.get(name).copied()
    }

    /// The interned pointer type to `elem`, if one was created
    pub fn lookup_pointer(&self, elem: TypeId) -> Option<TypeId> {
        self.pointers.get(&elem).copied()
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    fn push_type(&mut self, ty: RawType) -> TypeId {
        self.types.push(ty);
        TypeId::from_index(self.types.len() - 1)
    }

    /// Append an object. A type name also interns `*T` for its type, so
    /// `*Name` resolves for every declared name.
    fn push_object(&mut self, obj: RawObject) -> ObjectId {
        let type_name = matches!(obj.kind, RawObjectKind::TypeName { .. }).then_some(obj.ty);
        self.objects.push(obj);
        let id = ObjectId::from_index(self.objects.len() - 1);
        if let Some(ty) = type_name {
            self.pointer_to(ty);
        }
        id
    }

    fn insert(&mut self, scope: ScopeId, obj: ObjectId) {
        let name = self.objects[obj.index()].name.clone();
        self.objects[obj.index()].parent = Some(scope);
        self.scopes[scope.index()].names.insert(name, obj);
    }

    /// Create a package with its own top-level scope under the universe
    pub fn new_package(&mut self, name: impl Into<String>, path: impl Into<String>) -> PackageId {
        let name = name.into();
        let scope = self.new_scope(
            Some(self.universe),
            Pos::NONE,
            Pos::NONE,
            format!("package {}", name),
        );
        self.packages.push(RawPackage {
            name,
            path: path.into(),
            imports: Vec::new(),
            scope,
        });
        PackageId::from_index(self.packages.len() - 1)
    }

    pub fn add_import(&mut self, pkg: PackageId, imported: PackageId) {
        let imports = &mut self.packages[pkg.index()].imports;
        if !imports.contains(&imported) {
            imports.push(imported);
        }
    }

    /// Create a lexical scope nested in `parent`
    pub fn new_scope(
        &mut self,
        parent: Option<ScopeId>,
        pos: Pos,
        end: Pos,
        comment: impl Into<String>,
    ) -> ScopeId {
        self.scopes.push(RawScope {
            parent,
            children: Vec::new(),
            pos,
            end,
            names: BTreeMap::new(),
            comment: comment.into(),
        });
        let id = ScopeId::from_index(self.scopes.len() - 1);
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        id
    }

    /// Declare `obj` in `scope`
    pub fn declare(&mut self, scope: ScopeId, obj: ObjectId) -> Result<(), GraphError> {
        let name = &self.objects[obj.index()].name;
        if self.scopes[scope.index()].names.contains_key(name) {
            return Err(GraphError::Redeclared {
                name: name.clone(),
                scope,
            });
        }
        self.insert(scope, obj);
        Ok(())
    }

    /// The canonical node for a basic kind
    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        if let Some(&id) = self.basics.get(&kind) {
            return id;
        }
        let id = self.push_type(RawType::Basic(kind));
        self.basics.insert(kind, id);
        id
    }

    pub fn array(&mut self, elem: TypeId, len: i64) -> TypeId {
        self.push_type(RawType::Array { elem, len })
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.push_type(RawType::Slice { elem })
    }

    pub fn map(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        self.push_type(RawType::Map { key, elem })
    }

    pub fn chan(&mut self, dir: ChanDir, elem: TypeId) -> TypeId {
        self.push_type(RawType::Chan { dir, elem })
    }

    /// Pointer to `elem`; at most one pointer node exists per element type
    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        if let Some(&id) = self.pointers.get(&elem) {
            return id;
        }
        let id = self.push_type(RawType::Pointer { elem });
        self.pointers.insert(elem, id);
        id
    }

    /// Create a struct type together with its field objects
    pub fn struct_type(&mut self, package: Option<PackageId>, fields: Vec<FieldSpec>) -> TypeId {
        let owner = self.push_type(RawType::Struct { fields: Vec::new() });
        let ids = fields
            .into_iter()
            .map(|f| {
                self.push_object(RawObject {
                    name: f.name,
                    package,
                    ty: f.ty,
                    pos: f.pos,
                    parent: None,
                    kind: RawObjectKind::Field {
                        embedded: f.embedded,
                        tag: f.tag,
                        owner,
                    },
                })
            })
            .collect();
        self.types[owner.index()] = RawType::Struct { fields: ids };
        owner
    }

    pub fn interface_type(&mut self, methods: Vec<ObjectId>, embeddeds: Vec<TypeId>) -> TypeId {
        self.push_type(RawType::Interface { methods, embeddeds })
    }

    pub fn signature(
        &mut self,
        recv: Option<ObjectId>,
        params: Vec<ObjectId>,
        results: Vec<ObjectId>,
        variadic: bool,
    ) -> TypeId {
        self.push_type(RawType::Signature {
            recv,
            params,
            results,
            variadic,
        })
    }

    /// Parameter, result or receiver variable (not declared in any scope)
    pub fn new_param(&mut self, package: Option<PackageId>, name: &str, ty: TypeId) -> ObjectId {
        self.push_object(RawObject {
            name: name.to_string(),
            package,
            ty,
            pos: Pos::NONE,
            parent: None,
            kind: RawObjectKind::Var,
        })
    }

    /// Package-level variable, declared in the package scope
    pub fn new_var(
        &mut self,
        package: PackageId,
        name: &str,
        ty: TypeId,
        pos: Pos,
    ) -> Result<ObjectId, GraphError> {
        let obj = self.push_object(RawObject {
            name: name.to_string(),
            package: Some(package),
            ty,
            pos,
            parent: None,
            kind: RawObjectKind::Var,
        });
        self.declare(self.package(package).scope, obj)?;
        Ok(obj)
    }

    /// Local variable declared in a nested scope at `pos`
    pub fn new_local(
        &mut self,
        scope: ScopeId,
        package: Option<PackageId>,
        name: &str,
        ty: TypeId,
        pos: Pos,
    ) -> Result<ObjectId, GraphError> {
        let obj = self.push_object(RawObject {
            name: name.to_string(),
            package,
            ty,
            pos,
            parent: None,
            kind: RawObjectKind::Var,
        });
        self.declare(scope, obj)?;
        Ok(obj)
    }

    /// Package-level constant, declared in the package scope
    pub fn new_const(
        &mut self,
        package: PackageId,
        name: &str,
        ty: TypeId,
        value: ConstValue,
        pos: Pos,
    ) -> Result<ObjectId, GraphError> {
        let obj = self.push_object(RawObject {
            name: name.to_string(),
            package: Some(package),
            ty,
            pos,
            parent: None,
            kind: RawObjectKind::Const(value),
        });
        self.declare(self.package(package).scope, obj)?;
        Ok(obj)
    }

    /// Package-level function, declared in the package scope
    pub fn new_func(
        &mut self,
        package: PackageId,
        name: &str,
        signature: TypeId,
        pos: Pos,
    ) -> Result<ObjectId, GraphError> {
        let obj = self.push_object(RawObject {
            name: name.to_string(),
            package: Some(package),
            ty: signature,
            pos,
            parent: None,
            kind: RawObjectKind::Func { scope: None },
        });
        self.declare(self.package(package).scope, obj)?;
        Ok(obj)
    }

    /// Attach the scope of a function body
    pub fn set_func_scope(&mut self, func: ObjectId, scope: ScopeId) -> Result<(), GraphError> {
        match &mut self.objects[func.index()].kind {
            RawObjectKind::Func { scope: slot } => {
                *slot = Some(scope);
                Ok(())
            }
            _ => Err(GraphError::NotFunc(func)),
        }
    }

    fn named_in(&mut self, package: Option<PackageId>, name: &str, pos: Pos) -> (TypeId, ObjectId) {
        let ty = self.push_type(RawType::Named {
            obj: ObjectId(0),
            underlying: None,
            methods: Vec::new(),
        });
        let obj = self.push_object(RawObject {
            name: name.to_string(),
            package,
            ty,
            pos,
            parent: None,
            kind: RawObjectKind::TypeName { alias: false },
        });
        if let RawType::Named { obj: slot, .. } = &mut self.types[ty.index()] {
            *slot = obj;
        }
        (ty, obj)
    }

    /// Declare a defined type; its underlying type is set afterwards so that
    /// the definition may refer to itself.
    pub fn new_named(
        &mut self,
        package: PackageId,
        name: &str,
        pos: Pos,
    ) -> Result<(TypeId, ObjectId), GraphError> {
        let (ty, obj) = self.named_in(Some(package), name, pos);
        self.declare(self.package(package).scope, obj)?;
        Ok((ty, obj))
    }

    /// Declare `name` as an alias of `target`
    pub fn new_alias(
        &mut self,
        package: PackageId,
        name: &str,
        target: TypeId,
        pos: Pos,
    ) -> Result<ObjectId, GraphError> {
        let obj = self.push_object(RawObject {
            name: name.to_string(),
            package: Some(package),
            ty: target,
            pos,
            parent: None,
            kind: RawObjectKind::TypeName { alias: true },
        });
        self.declare(self.package(package).scope, obj)?;
        Ok(obj)
    }

    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> Result<(), GraphError> {
        match &mut self.types[named.index()] {
            RawType::Named {
                underlying: slot @ None,
                ..
            } => {
                *slot = Some(underlying);
                Ok(())
            }
            RawType::Named { .. } => Err(GraphError::UnderlyingAlreadySet(named)),
            _ => Err(GraphError::NotNamed(named)),
        }
    }

    /// Attach an already created method object to a named type
    pub fn add_method(&mut self, named: TypeId, method: ObjectId) -> Result<(), GraphError> {
        if !matches!(self.objects[method.index()].kind, RawObjectKind::Func { .. }) {
            return Err(GraphError::NotFunc(method));
        }
        match &mut self.types[named.index()] {
            RawType::Named { methods, .. } => {
                methods.push(method);
                Ok(())
            }
            _ => Err(GraphError::NotNamed(named)),
        }
    }

    /// Create a method on `named` with a value or pointer receiver
    pub fn new_method(
        &mut self,
        named: TypeId,
        name: &str,
        pointer_receiver: bool,
        params: Vec<ObjectId>,
        results: Vec<ObjectId>,
        pos: Pos,
    ) -> Result<ObjectId, GraphError> {
        let RawType::Named { obj, .. } = self.type_(named) else {
            return Err(GraphError::NotNamed(named));
        };
        let package = self.object(*obj).package;
        let recv_ty = if pointer_receiver {
            self.pointer_to(named)
        } else {
            named
        };
        let recv = self.new_param(package, "", recv_ty);
        let sig = self.signature(Some(recv), params, results, false);
        let method = self.push_object(RawObject {
            name: name.to_string(),
            package,
            ty: sig,
            pos,
            parent: None,
            kind: RawObjectKind::Func { scope: None },
        });
        self.add_method(named, method)?;
        Ok(method)
    }

    /// Interface method (no receiver)
    pub fn new_interface_method(
        &mut self,
        package: Option<PackageId>,
        name: &str,
        params: Vec<ObjectId>,
        results: Vec<ObjectId>,
    ) -> ObjectId {
        let sig = self.signature(None, params, results, false);
        self.push_object(RawObject {
            name: name.to_string(),
            package,
            ty: sig,
            pos: Pos::NONE,
            parent: None,
            kind: RawObjectKind::Func { scope: None },
        })
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Go-style spelling of a type, package-qualified by import path
    pub fn type_string(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        match self.type_(ty) {
            RawType::Basic(kind) => out.push_str(kind.name()),
            RawType::Array { elem, len } => {
                let _ = write!(out, "[{}]", len);
                self.write_type(out, *elem);
            }
            RawType::Slice { elem } => {
                out.push_str("[]");
                self.write_type(out, *elem);
            }
            RawType::Struct { fields } => {
                out.push_str("struct{");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    let field = self.object(*f);
                    if let RawObjectKind::Field { embedded, tag, .. } = &field.kind {
                        if !embedded {
                            out.push_str(&field.name);
                            out.push(' ');
                        }
                        self.write_type(out, field.ty);
                        if !tag.is_empty() {
                            let _ = write!(out, " {:?}", tag);
                        }
                    }
                }
                out.push('}');
            }
            RawType::Map { key, elem } => {
                out.push_str("map[");
                self.write_type(out, *key);
                out.push(']');
                self.write_type(out, *elem);
            }
            RawType::Pointer { elem } => {
                out.push('*');
                self.write_type(out, *elem);
            }
            RawType::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.write_type(out, *elem);
            }
            RawType::Interface { methods, embeddeds } => {
                out.push_str("interface{");
                let mut first = true;
                for e in embeddeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    self.write_type(out, *e);
                }
                for m in methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    let method = self.object(*m);
                    out.push_str(&method.name);
                    self.write_signature(out, method.ty);
                }
                out.push('}');
            }
            RawType::Signature { .. } => {
                out.push_str("func");
                self.write_signature(out, ty);
            }
            RawType::Named { obj, .. } => {
                let obj = self.object(*obj);
                if let Some(pkg) = obj.package {
                    out.push_str(&self.package(pkg).path);
                    out.push('.');
                }
                out.push_str(&obj.name);
            }
        }
    }

    fn write_signature(&self, out: &mut String, sig: TypeId) {
        let RawType::Signature {
            params,
            results,
            variadic,
            ..
        } = self.type_(sig)
        else {
            return;
        };

        self.write_tuple(out, params, *variadic);
        match results.as_slice() {
            [] => {}
            [single] if self.object(*single).name.is_empty() => {
                out.push(' ');
                self.write_type(out, self.object(*single).ty);
            }
            many => {
                out.push(' ');
                self.write_tuple(out, many, false);
            }
        }
    }

    fn write_tuple(&self, out: &mut String, vars: &[ObjectId], variadic: bool) {
        out.push('(');
        for (i, v) in vars.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let var = self.object(*v);
            if !var.name.is_empty() {
                out.push_str(&var.name);
                out.push(' ');
            }
            match (variadic && i + 1 == vars.len(), self.type_(var.ty)) {
                (true, RawType::Slice { elem }) => {
                    out.push_str("...");
                    self.write_type(out, *elem);
                }
                _ => self.write_type(out, var.ty),
            }
        }
        out.push(')');
    }

    /// Go-style description of an object, e.g. `func a.F(x int) string`
    pub fn object_string(&self, id: ObjectId) -> String {
        let obj = self.object(id);
        let qualified = match obj.package {
            Some(pkg) if obj.parent == Some(self.package(pkg).scope) => {
                format!("{}.{}", self.package(pkg).path, obj.name)
            }
            _ => obj.name.clone(),
        };
        match &obj.kind {
            RawObjectKind::Var => format!("var {} {}", qualified, self.type_string(obj.ty)),
            RawObjectKind::Field { .. } => {
                format!("field {} {}", obj.name, self.type_string(obj.ty))
            }
            RawObjectKind::Const(value) => format!(
                "const {} {} = {}",
                qualified,
                self.type_string(obj.ty),
                value
            ),
            RawObjectKind::Func { .. } => {
                let mut out = String::from("func ");
                if let RawType::Signature { recv: Some(r), .. } = self.type_(obj.ty) {
                    let _ = write!(out, "({}).", self.type_string(self.object(*r).ty));
                    out.push_str(&obj.name);
                } else {
                    out.push_str(&qualified);
                }
                self.write_signature(&mut out, obj.ty);
                out
            }
            RawObjectKind::TypeName { alias: true } => {
                format!("type {} = {}", qualified, self.type_string(obj.ty))
            }
            RawObjectKind::TypeName { alias: false } => {
                let under = self.underlying(obj.ty);
                if under == obj.ty {
                    format!("type {}", qualified)
                } else {
                    format!("type {} {}", qualified, self.type_string(under))
                }
            }
        }
    }
}
