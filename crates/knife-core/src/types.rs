//! Type entities
//!
//! A [`TypeNode`] is the domain view of one raw type node. Its kind is set
//! exactly once, right after the node is registered in the session cache.

use std::fmt;
use std::sync::{Arc, OnceLock};

use knife_graph::{BasicInfo, BasicKind, ChanDir, ObjectId, TypeId};

use crate::names::NameTable;

/// The domain view of one type
pub struct TypeNode {
    id: TypeId,
    kind: OnceLock<TypeKind>,
}

impl TypeNode {
    pub(crate) fn pending(id: TypeId) -> Self {
        Self {
            id,
            kind: OnceLock::new(),
        }
    }

    pub(crate) fn populate(&self, kind: TypeKind) {
        // Only the inserting caller populates, so the cell is always empty here
        let _ = self.kind.set(kind);
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The populated kind, `None` while the node is still being built
    pub fn kind(&self) -> Option<&TypeKind> {
        self.kind.get()
    }

    pub fn is_populated(&self) -> bool {
        self.kind.get().is_some()
    }

    pub fn as_basic(&self) -> Option<Arc<Basic>> {
        match self.kind()? {
            TypeKind::Basic(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<Arc<Array>> {
        match self.kind()? {
            TypeKind::Array(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<Arc<Slice>> {
        match self.kind()? {
            TypeKind::Slice(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<Arc<Struct>> {
        match self.kind()? {
            TypeKind::Struct(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<Arc<Map>> {
        match self.kind()? {
            TypeKind::Map(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<Arc<Pointer>> {
        match self.kind()? {
            TypeKind::Pointer(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_chan(&self) -> Option<Arc<Chan>> {
        match self.kind()? {
            TypeKind::Chan(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<Arc<Interface>> {
        match self.kind()? {
            TypeKind::Interface(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<Arc<Signature>> {
        match self.kind()? {
            TypeKind::Signature(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<Arc<Named>> {
        match self.kind()? {
            TypeKind::Named(t) => Some(t.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("id", &self.id)
            .field("kind", &self.kind().map(TypeKind::name))
            .finish()
    }
}

/// Closed set of type kinds
#[derive(Debug, Clone)]
pub enum TypeKind {
    Basic(Arc<Basic>),
    Array(Arc<Array>),
    Slice(Arc<Slice>),
    Struct(Arc<Struct>),
    Map(Arc<Map>),
    Pointer(Arc<Pointer>),
    Chan(Arc<Chan>),
    Interface(Arc<Interface>),
    Signature(Arc<Signature>),
    Named(Arc<Named>),
}

impl TypeKind {
    /// Kind name as used in template output and logs
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Basic(_) => "Basic",
            TypeKind::Array(_) => "Array",
            TypeKind::Slice(_) => "Slice",
            TypeKind::Struct(_) => "Struct",
            TypeKind::Map(_) => "Map",
            TypeKind::Pointer(_) => "Pointer",
            TypeKind::Chan(_) => "Chan",
            TypeKind::Interface(_) => "Interface",
            TypeKind::Signature(_) => "Signature",
            TypeKind::Named(_) => "Named",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Basic {
    pub kind: BasicKind,
    pub info: BasicInfo,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Array {
    pub elem: TypeId,
    pub len: i64,
}

#[derive(Debug, Clone)]
pub struct Slice {
    pub elem: TypeId,
}

/// Struct fields in declaration order plus a by-name table.
///
/// `list` keeps every field, repeated blank (`_`) names included; the
/// table holds the first field of each name.
#[derive(Debug, Clone)]
pub struct Struct {
    pub fields: NameTable<ObjectId>,
    pub list: Vec<ObjectId>,
}

impl Struct {
    pub fn field(&self, name: &str) -> Option<ObjectId> {
        self.fields.get(name).copied()
    }

    pub fn num_fields(&self) -> usize {
        self.list.len()
    }
}

#[derive(Debug, Clone)]
pub struct Map {
    pub key: TypeId,
    pub elem: TypeId,
}

#[derive(Debug, Clone)]
pub struct Pointer {
    pub elem: TypeId,
}

#[derive(Debug, Clone)]
pub struct Chan {
    pub dir: ChanDir,
    pub elem: TypeId,
}

#[derive(Debug, Clone)]
pub struct Interface {
    /// No methods and no embedded types
    pub empty: bool,
    pub embeddeds: Vec<TypeId>,
    /// Full method set, embedded interfaces included, sorted by name
    pub methods: NameTable<ObjectId>,
    /// Methods declared directly in this interface
    pub explicit_methods: NameTable<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub recv: Option<ObjectId>,
    pub params: Vec<ObjectId>,
    pub results: Vec<ObjectId>,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct Named {
    /// Underlying type; the named type itself while unresolved
    pub underlying: TypeId,
    /// Methods declared on the type, in declaration order
    pub methods: NameTable<ObjectId>,
    /// The declaring `TypeName`
    pub object: ObjectId,
}
