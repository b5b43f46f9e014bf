//! Lexical scope entities

use std::fmt;
use std::sync::OnceLock;

use knife_graph::{ObjectId, Pos, ScopeId};

use crate::names::NameTable;

/// Where a scope sits in the nesting tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    Local,
}

pub struct Scope {
    id: ScopeId,
    data: OnceLock<ScopeData>,
}

#[derive(Debug, Clone)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub pos: Pos,
    pub end: Pos,
    /// Declared objects in name order
    pub objects: NameTable<ObjectId>,
}

impl ScopeData {
    /// Whether `pos` lies in `[pos, end)`; scopes without extent contain everything
    pub fn contains(&self, pos: Pos) -> bool {
        if !self.pos.is_valid() || !self.end.is_valid() {
            return true;
        }
        self.pos <= pos && pos < self.end
    }
}

impl Scope {
    pub(crate) fn pending(id: ScopeId) -> Self {
        Self {
            id,
            data: OnceLock::new(),
        }
    }

    pub(crate) fn populate(&self, data: ScopeData) {
        let _ = self.data.set(data);
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn get(&self) -> Option<&ScopeData> {
        self.data.get()
    }

    /// Object declared directly in this scope
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.get()?.objects.get(name).copied()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("kind", &self.get().map(|d| d.kind))
            .finish()
    }
}
