//! Raw type-checker graph consumed by knife
//!
//! A loader builds one [`TypeGraph`] per session: packages, scopes, objects
//! and types, all addressed by small `Copy` ids. The graph also answers the
//! questions only a type checker can answer (identity, method sets,
//! interface satisfaction), see the methods in [`rules`].

pub mod basic;
pub mod constant;
pub mod error;
pub mod graph;
pub mod ids;
pub mod position;
pub mod rules;

pub use basic::{BasicInfo, BasicKind};
pub use constant::{ConstKind, ConstValue};
pub use error::GraphError;
pub use graph::{
    is_exported, ChanDir, FieldSpec, RawObject, RawObjectKind, RawPackage, RawScope, RawType,
    TypeGraph,
};
pub use ids::{ObjectId, PackageId, ScopeId, TypeId};
pub use position::{CommentGroup, FileSet, Pos, Position};
