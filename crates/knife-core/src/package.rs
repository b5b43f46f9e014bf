//! Package entities

use std::fmt;
use std::sync::OnceLock;

use knife_graph::{ObjectId, PackageId, ScopeId};

use crate::names::NameTable;

/// The domain view of one package
pub struct Package {
    id: PackageId,
    data: OnceLock<PackageData>,
}

/// Populated contents of a [`Package`]
#[derive(Debug, Clone)]
pub struct PackageData {
    pub name: String,
    pub path: String,
    /// Imported packages in import order
    pub imports: Vec<PackageId>,
    pub scope: ScopeId,
    pub funcs: NameTable<ObjectId>,
    pub vars: NameTable<ObjectId>,
    pub consts: NameTable<ObjectId>,
    pub types: NameTable<ObjectId>,
}

impl PackageData {
    /// Functions, then variables, then constants, each in name order
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.funcs
            .values()
            .iter()
            .chain(self.vars.values())
            .chain(self.consts.values())
            .copied()
    }
}

impl Package {
    pub(crate) fn pending(id: PackageId) -> Self {
        Self {
            id,
            data: OnceLock::new(),
        }
    }

    pub(crate) fn populate(&self, data: PackageData) {
        let _ = self.data.set(data);
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn get(&self) -> Option<&PackageData> {
        self.data.get()
    }

    pub fn name(&self) -> Option<&str> {
        self.get().map(|d| d.name.as_str())
    }

    pub fn path(&self) -> Option<&str> {
        self.get().map(|d| d.path.as_str())
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}
