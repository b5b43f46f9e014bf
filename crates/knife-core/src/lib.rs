//! Cycle-safe domain model over a type-checked program
//!
//! [`Session`] turns the raw nodes of a [`knife_graph::TypeGraph`] into
//! shared entities ([`Package`], [`TypeNode`], [`Object`], [`Scope`]), one
//! per node for the lifetime of the session. Entities point at each other
//! through graph ids; resolve an id back into an entity through the session.

pub mod names;
pub mod objects;
pub mod package;
pub mod query;
pub mod scope;
pub mod session;
pub mod types;

pub use names::NameTable;
pub use objects::{Const, Field, Func, Object, ObjectInfo, ObjectKind, TypeName, Var};
pub use package::{Package, PackageData};
pub use query::{remove_vendor, AsType, HasPos};
pub use scope::{Scope, ScopeData, ScopeKind};
pub use session::Session;
pub use types::{
    Array, Basic, Chan, Interface, Map, Named, Pointer, Signature, Slice, Struct, TypeKind,
    TypeNode,
};

pub use knife_graph;
