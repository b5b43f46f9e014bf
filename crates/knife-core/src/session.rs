//! Identity-keyed entity cache
//!
//! A [`Session`] owns one concurrent map per entity kind. The first request
//! for a node registers an empty wrapper, releases the map shard, and only
//! then populates the wrapper. Population eagerly materializes everything
//! the node refers to, so a cyclic reference finds the registered wrapper
//! and stops there instead of recursing forever.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use knife_graph::{
    ObjectId, PackageId, RawObjectKind, RawType, ScopeId, TypeGraph, TypeId,
};
use tracing::{debug, trace};

use crate::names::NameTable;
use crate::objects::{Const, Field, Func, Object, ObjectInfo, ObjectKind, TypeName, Var};
use crate::package::{Package, PackageData};
use crate::scope::{Scope, ScopeData, ScopeKind};
use crate::types::{
    Array, Basic, Chan, Interface, Map, Named, Pointer, Signature, Slice, Struct, TypeKind,
    TypeNode,
};

/// Domain view over one [`TypeGraph`]
///
/// Sessions are independent: two sessions over the same graph never share
/// wrappers. Everything a session created is released when it is dropped.
pub struct Session {
    graph: Arc<TypeGraph>,
    packages: DashMap<PackageId, Arc<Package>>,
    types: DashMap<TypeId, Arc<TypeNode>>,
    objects: DashMap<ObjectId, Arc<Object>>,
    scopes: DashMap<ScopeId, Arc<Scope>>,
}

/// Fetch the wrapper for `key`, registering `pending()` if absent.
///
/// Returns the wrapper and whether this call registered it. The shard lock is
/// released before returning, so the caller may recurse into the same map.
fn register<K, V>(map: &DashMap<K, Arc<V>>, key: K, pending: impl FnOnce() -> V) -> (Arc<V>, bool)
where
    K: Eq + Hash,
{
    if let Some(existing) = map.get(&key) {
        return (existing.value().clone(), false);
    }
    let mut registered = false;
    let entry = map
        .entry(key)
        .or_insert_with(|| {
            registered = true;
            Arc::new(pending())
        })
        .value()
        .clone();
    (entry, registered)
}

impl Session {
    pub fn new(graph: Arc<TypeGraph>) -> Self {
        Self {
            graph,
            packages: DashMap::new(),
            types: DashMap::new(),
            objects: DashMap::new(),
            scopes: DashMap::new(),
        }
    }

    pub fn graph(&self) -> &Arc<TypeGraph> {
        &self.graph
    }

    /// Number of wrappers created so far, across all kinds
    pub fn cached_entities(&self) -> usize {
        self.packages.len() + self.types.len() + self.objects.len() + self.scopes.len()
    }

    /// Package views for every package in the graph, in graph order
    pub fn packages(&self) -> Vec<Arc<Package>> {
        self.graph
            .package_ids()
            .map(|id| self.package(id))
            .collect()
    }

    pub fn package(&self, id: PackageId) -> Arc<Package> {
        let (pkg, registered) = register(&self.packages, id, || Package::pending(id));
        if registered {
            trace!(?id, "registered package");
            pkg.populate(self.build_package(id));
            debug!(
                path = %self.graph.package(id).path,
                entities = self.cached_entities(),
                "materialized package"
            );
        } else if pkg.get().is_none() {
            trace!(?id, "package lookup hit a pending wrapper");
        }
        pkg
    }

    pub fn type_node(&self, id: TypeId) -> Arc<TypeNode> {
        let (node, registered) = register(&self.types, id, || TypeNode::pending(id));
        if registered {
            trace!(?id, "registered type");
            node.populate(self.build_type(id));
        } else if !node.is_populated() {
            trace!(?id, "type lookup hit a pending wrapper");
        }
        node
    }

    pub fn object(&self, id: ObjectId) -> Arc<Object> {
        let (obj, registered) = register(&self.objects, id, || Object::pending(id));
        if registered {
            trace!(?id, "registered object");
            obj.populate(self.build_object(id));
        } else if obj.kind().is_none() {
            trace!(?id, "object lookup hit a pending wrapper");
        }
        obj
    }

    pub fn scope(&self, id: ScopeId) -> Arc<Scope> {
        let (scope, registered) = register(&self.scopes, id, || Scope::pending(id));
        if registered {
            trace!(?id, "registered scope");
            scope.populate(self.build_scope(id));
        } else if scope.get().is_none() {
            trace!(?id, "scope lookup hit a pending wrapper");
        }
        scope
    }

    /// Lookup without creating
    pub fn cached_type(&self, id: TypeId) -> Option<Arc<TypeNode>> {
        self.types.get(&id).map(|e| e.value().clone())
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    fn build_package(&self, id: PackageId) -> PackageData {
        let raw = self.graph.package(id);
        for import in &raw.imports {
            self.package(*import);
        }

        let mut data = PackageData {
            name: raw.name.clone(),
            path: raw.path.clone(),
            imports: raw.imports.clone(),
            scope: raw.scope,
            funcs: NameTable::new(),
            vars: NameTable::new(),
            consts: NameTable::new(),
            types: NameTable::new(),
        };

        // Scope names are kept sorted by the graph
        for (name, obj) in &self.graph.scope(raw.scope).names {
            self.object(*obj);
            let table = match self.graph.object(*obj).kind {
                RawObjectKind::Func { .. } => &mut data.funcs,
                RawObjectKind::Var | RawObjectKind::Field { .. } => &mut data.vars,
                RawObjectKind::Const(_) => &mut data.consts,
                RawObjectKind::TypeName { .. } => &mut data.types,
            };
            table.push(name.clone(), *obj);
        }
        self.scope(raw.scope);
        data
    }

    fn build_type(&self, id: TypeId) -> TypeKind {
        let graph = &*self.graph;
        match graph.type_(id) {
            RawType::Basic(kind) => TypeKind::Basic(Arc::new(Basic {
                kind: *kind,
                info: kind.info(),
                name: kind.name().to_string(),
            })),
            RawType::Array { elem, len } => {
                self.type_node(*elem);
                TypeKind::Array(Arc::new(Array {
                    elem: *elem,
                    len: *len,
                }))
            }
            RawType::Slice { elem } => {
                self.type_node(*elem);
                TypeKind::Slice(Arc::new(Slice { elem: *elem }))
            }
            RawType::Struct { fields } => {
                let table = fields
                    .iter()
                    .map(|f| {
                        self.object(*f);
                        (graph.object(*f).name.clone(), *f)
                    })
                    .collect();
                TypeKind::Struct(Arc::new(Struct {
                    fields: table,
                    list: fields.clone(),
                }))
            }
            RawType::Map { key, elem } => {
                self.type_node(*key);
                self.type_node(*elem);
                TypeKind::Map(Arc::new(Map {
                    key: *key,
                    elem: *elem,
                }))
            }
            RawType::Pointer { elem } => {
                self.type_node(*elem);
                TypeKind::Pointer(Arc::new(Pointer { elem: *elem }))
            }
            RawType::Chan { dir, elem } => {
                self.type_node(*elem);
                TypeKind::Chan(Arc::new(Chan {
                    dir: *dir,
                    elem: *elem,
                }))
            }
            RawType::Interface { embeddeds, .. } => {
                for e in embeddeds {
                    self.type_node(*e);
                }
                let methods = self.method_table(&graph.interface_methods(id));
                let explicit_methods = self.method_table(&graph.explicit_interface_methods(id));
                TypeKind::Interface(Arc::new(Interface {
                    empty: methods.is_empty() && embeddeds.is_empty(),
                    embeddeds: embeddeds.clone(),
                    methods,
                    explicit_methods,
                }))
            }
            RawType::Signature {
                recv,
                params,
                results,
                variadic,
            } => {
                for var in recv.iter().chain(params).chain(results) {
                    self.object(*var);
                }
                TypeKind::Signature(Arc::new(Signature {
                    recv: *recv,
                    params: params.clone(),
                    results: results.clone(),
                    variadic: *variadic,
                }))
            }
            RawType::Named { obj, methods, .. } => {
                let underlying = graph.underlying(id);
                self.type_node(underlying);
                self.object(*obj);
                TypeKind::Named(Arc::new(Named {
                    underlying,
                    methods: self.method_table(methods),
                    object: *obj,
                }))
            }
        }
    }

    fn method_table(&self, methods: &[ObjectId]) -> NameTable<ObjectId> {
        methods
            .iter()
            .map(|m| {
                self.object(*m);
                (self.graph.object(*m).name.clone(), *m)
            })
            .collect()
    }

    fn build_object(&self, id: ObjectId) -> ObjectKind {
        let raw = self.graph.object(id);
        self.type_node(raw.ty);
        let info = ObjectInfo {
            name: raw.name.clone(),
            exported: raw.is_exported(),
            ty: raw.ty,
            package: raw.package,
            pos: raw.pos,
        };
        match &raw.kind {
            RawObjectKind::Var => ObjectKind::Var(Arc::new(Var { info })),
            RawObjectKind::Field {
                embedded,
                tag,
                owner,
            } => ObjectKind::Field(Arc::new(Field {
                info,
                anonymous: *embedded,
                tag: tag.clone(),
                owner: *owner,
            })),
            RawObjectKind::Const(value) => {
                ObjectKind::Const(Arc::new(Const::new(info, value.clone())))
            }
            RawObjectKind::Func { scope } => {
                if let Some(scope) = scope {
                    self.scope(*scope);
                }
                ObjectKind::Func(Arc::new(Func {
                    signature: raw.ty,
                    scope: *scope,
                    info,
                }))
            }
            RawObjectKind::TypeName { alias } => ObjectKind::TypeName(Arc::new(TypeName {
                info,
                is_alias: *alias,
            })),
        }
    }

    fn build_scope(&self, id: ScopeId) -> ScopeData {
        let raw = self.graph.scope(id);
        let kind = match raw.parent {
            None => ScopeKind::Universe,
            Some(parent) if parent == self.graph.universe() => ScopeKind::Package,
            Some(_) => ScopeKind::Local,
        };
        if let Some(parent) = raw.parent {
            self.scope(parent);
        }
        for child in &raw.children {
            self.scope(*child);
        }
        let objects = raw
            .names
            .iter()
            .map(|(name, obj)| {
                self.object(*obj);
                (name.clone(), *obj)
            })
            .collect();
        ScopeData {
            kind,
            parent: raw.parent,
            children: raw.children.clone(),
            pos: raw.pos,
            end: raw.end,
            objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knife_graph::{BasicKind, FieldSpec, Pos};

    fn linked_list() -> (Arc<TypeGraph>, TypeId) {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("list", "example.com/list");
        let int = graph.basic(BasicKind::Int);
        let (node, _) = graph.new_named(pkg, "Node", Pos::NONE).unwrap();
        let next = graph.pointer_to(node);
        let st = graph.struct_type(
            Some(pkg),
            vec![FieldSpec::new("V", int), FieldSpec::new("Next", next)],
        );
        graph.set_underlying(node, st).unwrap();
        (Arc::new(graph), node)
    }

    #[test]
    fn test_repeated_lookup_same_instance() {
        let (graph, node) = linked_list();
        let session = Session::new(graph);
        let a = session.type_node(node);
        let b = session.type_node(node);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_populated());
    }

    #[test]
    fn test_cycle_terminates() {
        let (graph, node) = linked_list();
        let session = Session::new(graph.clone());
        let named = session.type_node(node).as_named().unwrap();
        let st = session.type_node(named.underlying).as_struct().unwrap();
        let next = session.object(st.field("Next").unwrap());
        let ptr = session
            .type_node(next.info().unwrap().ty)
            .as_pointer()
            .unwrap();
        assert!(Arc::ptr_eq(&session.type_node(ptr.elem), &session.type_node(node)));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (graph, node) = linked_list();
        let first = Session::new(graph.clone());
        let second = Session::new(graph);
        assert!(!Arc::ptr_eq(&first.type_node(node), &second.type_node(node)));
    }

    #[test]
    fn test_dropping_session_releases_entities() {
        let (graph, node) = linked_list();
        let session = Session::new(graph);
        let weak = Arc::downgrade(&session.type_node(node));
        assert!(session.cached_entities() > 1);
        drop(session);
        assert!(weak.upgrade().is_none());
    }
}
