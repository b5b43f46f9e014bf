//! Stable handles into a [`TypeGraph`](crate::TypeGraph)
//!
//! Every raw node is addressed by a small `Copy` id. The ids double as the
//! identity keys of the domain cache in `knife-core`.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! graph_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Raw index into the owning arena
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).expect(concat!(stringify!($name), " overflow")))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

graph_id!(
    /// Identity of a package node
    PackageId,
    "pkg#"
);
graph_id!(
    /// Identity of a type node
    TypeId,
    "type#"
);
graph_id!(
    /// Identity of an object node (var, const, func, type name, field)
    ObjectId,
    "obj#"
);
graph_id!(
    /// Identity of a lexical scope node
    ScopeId,
    "scope#"
);
