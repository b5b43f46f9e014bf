use thiserror::Error;

use crate::ids::{ObjectId, ScopeId, TypeId};

/// Builder misuse that would leave the graph inconsistent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Type {0:?} is not a named type")]
    NotNamed(TypeId),

    #[error("Object {0:?} is not a function")]
    NotFunc(ObjectId),

    #[error("Underlying type of {0:?} is already set")]
    UnderlyingAlreadySet(TypeId),

    #[error("'{name}' redeclared in {scope:?}")]
    Redeclared { name: String, scope: ScopeId },
}
