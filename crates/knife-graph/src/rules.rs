//! Type-system rules evaluated over a [`TypeGraph`]
//!
//! These are the answers a type checker gives about its own output:
//! underlying types, type identity, interface and concrete method sets and
//! interface satisfaction. They are total; malformed input yields the most
//! conservative answer instead of an error.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::graph::{RawObjectKind, RawType, TypeGraph};
use crate::ids::{ObjectId, TypeId};

/// Upper bound on named-type chains followed by [`TypeGraph::underlying`]
const MAX_UNDERLYING_DEPTH: usize = 100;

/// One type reached while walking embedded fields
#[derive(Debug, Clone, Copy)]
struct Embedded {
    ty: TypeId,
    /// Reached through at least one pointer
    indirect: bool,
    /// The same type was reached more than once at this depth
    multiples: bool,
}

/// Outcome for one name while collecting a method set
#[derive(Debug, Clone, Copy)]
enum Selection {
    Method { obj: ObjectId, indirect: bool },
    /// Same-depth collision, or a field hiding deeper methods
    Blocked,
}

impl TypeGraph {
    /// Resolve named types to their underlying type.
    ///
    /// A named type whose underlying type was never set resolves to itself.
    pub fn underlying(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_UNDERLYING_DEPTH {
            match self.type_(current) {
                RawType::Named {
                    underlying: Some(next),
                    ..
                } => current = *next,
                _ => return current,
            }
        }
        tracing::warn!(?ty, "named type chain too deep, treating as unresolved");
        ty
    }

    /// Whether `ty` is an interface or a named type defined as one
    pub fn is_interface(&self, ty: TypeId) -> bool {
        matches!(self.type_(self.underlying(ty)), RawType::Interface { .. })
    }

    /// Strip one pointer level; returns the element and whether a pointer was removed
    pub fn deref(&self, ty: TypeId) -> (TypeId, bool) {
        match self.type_(ty) {
            RawType::Pointer { elem } => (*elem, true),
            _ => (ty, false),
        }
    }

    /// Report whether two types are identical
    pub fn identical(&self, x: TypeId, y: TypeId) -> bool {
        self.identical_guarded(x, y, &mut Vec::new())
    }

    fn identical_guarded(&self, x: TypeId, y: TypeId, seen: &mut Vec<(TypeId, TypeId)>) -> bool {
        if x == y {
            return true;
        }
        match (self.type_(x), self.type_(y)) {
            (RawType::Basic(a), RawType::Basic(b)) => a == b,
            (RawType::Array { elem: e1, len: l1 }, RawType::Array { elem: e2, len: l2 }) => {
                l1 == l2 && self.identical_guarded(*e1, *e2, seen)
            }
            (RawType::Slice { elem: e1 }, RawType::Slice { elem: e2 })
            | (RawType::Pointer { elem: e1 }, RawType::Pointer { elem: e2 }) => {
                self.identical_guarded(*e1, *e2, seen)
            }
            (RawType::Map { key: k1, elem: e1 }, RawType::Map { key: k2, elem: e2 }) => {
                self.identical_guarded(*k1, *k2, seen) && self.identical_guarded(*e1, *e2, seen)
            }
            (RawType::Chan { dir: d1, elem: e1 }, RawType::Chan { dir: d2, elem: e2 }) => {
                d1 == d2 && self.identical_guarded(*e1, *e2, seen)
            }
            (RawType::Struct { fields: f1 }, RawType::Struct { fields: f2 }) => {
                f1.len() == f2.len()
                    && f1
                        .iter()
                        .zip(f2)
                        .all(|(a, b)| self.identical_fields(*a, *b, seen))
            }
            (RawType::Signature { .. }, RawType::Signature { .. }) => {
                self.identical_signatures(x, y, seen)
            }
            (RawType::Interface { .. }, RawType::Interface { .. }) => {
                if seen.contains(&(x, y)) || seen.contains(&(y, x)) {
                    return true;
                }
                seen.push((x, y));
                let m1 = self.interface_methods(x);
                let m2 = self.interface_methods(y);
                let same = m1.len() == m2.len()
                    && m1.iter().zip(&m2).all(|(a, b)| {
                        let (a, b) = (self.object(*a), self.object(*b));
                        a.name == b.name
                            && (a.is_exported() || a.package == b.package)
                            && self.identical_guarded(a.ty, b.ty, seen)
                    });
                seen.pop();
                same
            }
            // Named types are identical only to themselves
            _ => false,
        }
    }

    fn identical_fields(&self, a: ObjectId, b: ObjectId, seen: &mut Vec<(TypeId, TypeId)>) -> bool {
        let (fa, fb) = (self.object(a), self.object(b));
        let (
            RawObjectKind::Field {
                embedded: ea,
                tag: ta,
                ..
            },
            RawObjectKind::Field {
                embedded: eb,
                tag: tb,
                ..
            },
        ) = (&fa.kind, &fb.kind)
        else {
            return false;
        };
        fa.name == fb.name
            && ea == eb
            && ta == tb
            && (fa.is_exported() || fa.package == fb.package)
            && self.identical_guarded(fa.ty, fb.ty, seen)
    }

    fn identical_signatures(&self, x: TypeId, y: TypeId, seen: &mut Vec<(TypeId, TypeId)>) -> bool {
        let (
            RawType::Signature {
                params: p1,
                results: r1,
                variadic: v1,
                ..
            },
            RawType::Signature {
                params: p2,
                results: r2,
                variadic: v2,
                ..
            },
        ) = (self.type_(x), self.type_(y))
        else {
            return false;
        };
        let tuple = |a: &[ObjectId], b: &[ObjectId], seen: &mut Vec<(TypeId, TypeId)>| {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(a, b)| self.identical_guarded(self.object(*a).ty, self.object(*b).ty, seen))
        };
        v1 == v2 && tuple(p1.as_slice(), p2.as_slice(), seen) && tuple(r1.as_slice(), r2.as_slice(), seen)
    }

    /// Full method set of an interface, embedded interfaces included, sorted by name.
    ///
    /// Returns an empty list when `ty` is not an interface.
    pub fn interface_methods(&self, ty: TypeId) -> Vec<ObjectId> {
        let mut methods = BTreeMap::new();
        let mut visited = HashSet::new();
        self.collect_interface_methods(ty, &mut methods, &mut visited);
        methods.into_values().collect()
    }

    fn collect_interface_methods(
        &self,
        ty: TypeId,
        methods: &mut BTreeMap<String, ObjectId>,
        visited: &mut HashSet<TypeId>,
    ) {
        let under = self.underlying(ty);
        if !visited.insert(under) {
            return;
        }
        if let RawType::Interface {
            methods: explicit,
            embeddeds,
        } = self.type_(under)
        {
            for m in explicit {
                methods.entry(self.object(*m).name.clone()).or_insert(*m);
            }
            for e in embeddeds {
                self.collect_interface_methods(*e, methods, visited);
            }
        }
    }

    /// Methods explicitly declared by an interface, without embeddeds
    pub fn explicit_interface_methods(&self, ty: TypeId) -> Vec<ObjectId> {
        match self.type_(self.underlying(ty)) {
            RawType::Interface { methods, .. } => methods.clone(),
            _ => Vec::new(),
        }
    }

    /// Method set of `ty`, sorted by name.
    ///
    /// For a pointer `*T` this is the method set of `*T`; for any other type
    /// it is the value method set, which excludes pointer-receiver methods
    /// unless they are promoted through an embedded pointer.
    pub fn method_set(&self, ty: TypeId) -> Vec<ObjectId> {
        let (base, indirect) = self.deref(ty);
        self.method_set_of(base, indirect)
    }

    /// Method set of `*ty`, whether or not the pointer node exists in the graph
    pub fn pointer_method_set(&self, ty: TypeId) -> Vec<ObjectId> {
        if matches!(self.type_(ty), RawType::Pointer { .. }) {
            // **T has no methods
            return Vec::new();
        }
        self.method_set_of(ty, true)
    }

    fn method_set_of(&self, base: TypeId, indirect: bool) -> Vec<ObjectId> {
        if self.is_interface(base) {
            // *I has no methods; I has its interface methods
            return if indirect {
                Vec::new()
            } else {
                self.interface_methods(base)
            };
        }

        let mut selected: BTreeMap<String, Selection> = BTreeMap::new();
        let mut seen_named: HashSet<TypeId> = HashSet::new();
        let mut current = vec![Embedded {
            ty: base,
            indirect,
            multiples: false,
        }];

        while !current.is_empty() {
            let mut level_methods: HashMap<String, Vec<(ObjectId, bool)>> = HashMap::new();
            let mut level_fields: HashSet<String> = HashSet::new();
            let mut next = Vec::new();

            for entry in consolidate(current) {
                let mut ty = entry.ty;
                if let RawType::Named { methods, .. } = self.type_(ty) {
                    if !seen_named.insert(ty) {
                        continue;
                    }
                    for m in methods {
                        let slot = level_methods.entry(self.object(*m).name.clone()).or_default();
                        slot.push((*m, entry.indirect));
                        if entry.multiples {
                            slot.push((*m, entry.indirect));
                        }
                    }
                    ty = self.underlying(ty);
                }

                match self.type_(ty) {
                    RawType::Struct { fields } => {
                        for f in fields {
                            let field = self.object(*f);
                            level_fields.insert(field.name.clone());
                            if let RawObjectKind::Field { embedded: true, .. } = field.kind {
                                let (elem, through_pointer) = self.deref(field.ty);
                                next.push(Embedded {
                                    ty: elem,
                                    indirect: entry.indirect || through_pointer,
                                    multiples: entry.multiples,
                                });
                            }
                        }
                    }
                    RawType::Interface { .. } => {
                        for m in self.interface_methods(ty) {
                            let slot = level_methods.entry(self.object(m).name.clone()).or_default();
                            slot.push((m, true));
                            if entry.multiples {
                                slot.push((m, true));
                            }
                        }
                    }
                    _ => {}
                }
            }

            for (name, found) in level_methods {
                if selected.contains_key(&name) {
                    continue;
                }
                let selection = match found.as_slice() {
                    [(obj, indirect)] if !level_fields.contains(&name) => Selection::Method {
                        obj: *obj,
                        indirect: *indirect,
                    },
                    _ => Selection::Blocked,
                };
                selected.insert(name, selection);
            }
            for name in level_fields {
                selected.entry(name).or_insert(Selection::Blocked);
            }

            current = next;
        }

        selected
            .into_values()
            .filter_map(|s| match s {
                Selection::Method { obj, indirect } if indirect || !self.has_pointer_receiver(obj) => {
                    Some(obj)
                }
                _ => None,
            })
            .collect()
    }

    /// Whether a method is declared with a pointer receiver
    pub fn has_pointer_receiver(&self, method: ObjectId) -> bool {
        match self.type_(self.object(method).ty) {
            RawType::Signature { recv: Some(r), .. } => {
                matches!(self.type_(self.object(*r).ty), RawType::Pointer { .. })
            }
            _ => false,
        }
    }

    /// First method of `iface` that `ty` lacks or declares with a different signature
    pub fn missing_method(&self, ty: TypeId, iface: TypeId) -> Option<ObjectId> {
        let available = if self.is_interface(ty) {
            self.interface_methods(ty)
        } else {
            self.method_set(ty)
        };
        self.missing_from(&available, iface)
    }

    fn missing_from(&self, available: &[ObjectId], iface: TypeId) -> Option<ObjectId> {
        let required = self.interface_methods(iface);
        let by_name: HashMap<&str, ObjectId> = available
            .iter()
            .map(|m| (self.object(*m).name.as_str(), *m))
            .collect();

        required.into_iter().find(|m| {
            let want = self.object(*m);
            match by_name.get(want.name.as_str()) {
                Some(have) => !self.identical(self.object(*have).ty, want.ty),
                None => true,
            }
        })
    }

    /// Report whether the method set of `ty` satisfies the interface `iface`
    pub fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        self.is_interface(iface) && self.missing_method(ty, iface).is_none()
    }

    /// Report whether `*ty` satisfies `iface`, whether or not `*ty` was interned
    pub fn pointer_implements(&self, ty: TypeId, iface: TypeId) -> bool {
        self.is_interface(iface)
            && self
                .missing_from(&self.pointer_method_set(ty), iface)
                .is_none()
    }
}

/// Merge entries of the same type reached more than once at one depth
fn consolidate(entries: Vec<Embedded>) -> Vec<Embedded> {
    let mut out: Vec<Embedded> = Vec::with_capacity(entries.len());
    for entry in entries {
        match out.iter_mut().find(|e| e.ty == entry.ty) {
            Some(existing) => existing.multiples = true,
            None => out.push(entry),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::BasicKind;
    use crate::graph::{ChanDir, FieldSpec};
    use crate::position::Pos;

    fn names(graph: &TypeGraph, ids: &[ObjectId]) -> Vec<String> {
        ids.iter().map(|m| graph.object(*m).name.clone()).collect()
    }

    #[test]
    fn test_underlying_chain() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        let int = graph.basic(BasicKind::Int);
        let (t, _) = graph.new_named(pkg, "T", Pos::NONE).unwrap();
        let (u, _) = graph.new_named(pkg, "U", Pos::NONE).unwrap();
        let (v, _) = graph.new_named(pkg, "V", Pos::NONE).unwrap();
        graph.set_underlying(t, int).unwrap();
        graph.set_underlying(u, t).unwrap();
        assert_eq!(graph.underlying(u), int);
        assert_eq!(graph.underlying(v), v);
    }

    #[test]
    fn test_structural_identity() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int);
        let string = graph.basic(BasicKind::String);
        let s1 = graph.slice(int);
        let s2 = graph.slice(int);
        let s3 = graph.slice(string);
        assert!(graph.identical(s1, s2));
        assert!(!graph.identical(s1, s3));

        let a1 = graph.array(int, 3);
        let a2 = graph.array(int, 4);
        assert!(!graph.identical(a1, a2));

        let c1 = graph.chan(ChanDir::Send, int);
        let c2 = graph.chan(ChanDir::Both, int);
        assert!(!graph.identical(c1, c2));

        let st1 = graph.struct_type(None, vec![FieldSpec::new("A", int).with_tag("x")]);
        let st2 = graph.struct_type(None, vec![FieldSpec::new("A", int).with_tag("x")]);
        let st3 = graph.struct_type(None, vec![FieldSpec::new("A", int)]);
        assert!(graph.identical(st1, st2));
        assert!(!graph.identical(st1, st3));
    }

    #[test]
    fn test_signature_identity_ignores_names() {
        let mut graph = TypeGraph::new();
        let int = graph.basic(BasicKind::Int);
        let p1 = graph.new_param(None, "a", int);
        let p2 = graph.new_param(None, "b", int);
        let sig1 = graph.signature(None, vec![p1], vec![], false);
        let sig2 = graph.signature(None, vec![p2], vec![], false);
        let sig3 = graph.signature(None, vec![p2], vec![], true);
        assert!(graph.identical(sig1, sig2));
        assert!(!graph.identical(sig1, sig3));
    }

    #[test]
    fn test_named_identity_is_nominal() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        let int = graph.basic(BasicKind::Int);
        let (t, _) = graph.new_named(pkg, "T", Pos::NONE).unwrap();
        let (u, _) = graph.new_named(pkg, "U", Pos::NONE).unwrap();
        graph.set_underlying(t, int).unwrap();
        graph.set_underlying(u, int).unwrap();
        assert!(graph.identical(t, t));
        assert!(!graph.identical(t, u));
        assert!(!graph.identical(t, int));
    }

    #[test]
    fn test_interface_methods_include_embedded() {
        let mut graph = TypeGraph::new();
        let string = graph.basic(BasicKind::String);
        let error = graph.error_type();
        let r = graph.new_param(None, "", string);
        let name = graph.new_interface_method(None, "Name", vec![], vec![r]);
        let iface = graph.interface_type(vec![name], vec![error]);
        assert_eq!(names(&graph, &graph.interface_methods(iface)), ["Error", "Name"]);
        assert_eq!(
            names(&graph, &graph.explicit_interface_methods(iface)),
            ["Name"]
        );
    }

    #[test]
    fn test_value_and_pointer_method_sets() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        let (t, _) = graph.new_named(pkg, "T", Pos::NONE).unwrap();
        let empty = graph.struct_type(Some(pkg), vec![]);
        graph.set_underlying(t, empty).unwrap();
        graph.new_method(t, "Get", false, vec![], vec![], Pos::NONE).unwrap();
        graph.new_method(t, "Set", true, vec![], vec![], Pos::NONE).unwrap();

        assert_eq!(names(&graph, &graph.method_set(t)), ["Get"]);
        assert_eq!(names(&graph, &graph.pointer_method_set(t)), ["Get", "Set"]);
        let pt = graph.pointer_to(t);
        assert_eq!(names(&graph, &graph.method_set(pt)), ["Get", "Set"]);
        assert!(graph.pointer_method_set(pt).is_empty());
    }

    #[test]
    fn test_promotion_through_embedding() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        let int = graph.basic(BasicKind::Int);

        let (inner, _) = graph.new_named(pkg, "Inner", Pos::NONE).unwrap();
        let inner_struct = graph.struct_type(Some(pkg), vec![]);
        graph.set_underlying(inner, inner_struct).unwrap();
        graph.new_method(inner, "Read", false, vec![], vec![], Pos::NONE).unwrap();
        graph.new_method(inner, "Close", true, vec![], vec![], Pos::NONE).unwrap();
        graph.new_method(inner, "Len", false, vec![], vec![], Pos::NONE).unwrap();

        // Outer embeds Inner by value and declares a Len field
        let (outer, _) = graph.new_named(pkg, "Outer", Pos::NONE).unwrap();
        let outer_struct = graph.struct_type(
            Some(pkg),
            vec![
                FieldSpec::new("Inner", inner).embedded(),
                FieldSpec::new("Len", int),
            ],
        );
        graph.set_underlying(outer, outer_struct).unwrap();
        assert_eq!(names(&graph, &graph.method_set(outer)), ["Read"]);
        assert_eq!(
            names(&graph, &graph.pointer_method_set(outer)),
            ["Close", "Read"]
        );

        // Embedding *Inner promotes pointer methods into the value set
        let inner_ptr = graph.pointer_to(inner);
        let (wrapper, _) = graph.new_named(pkg, "Wrapper", Pos::NONE).unwrap();
        let wrapper_struct =
            graph.struct_type(Some(pkg), vec![FieldSpec::new("Inner", inner_ptr).embedded()]);
        graph.set_underlying(wrapper, wrapper_struct).unwrap();
        assert_eq!(
            names(&graph, &graph.method_set(wrapper)),
            ["Close", "Len", "Read"]
        );
    }

    #[test]
    fn test_same_depth_collision_cancels() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        let mut embedded = Vec::new();
        for name in ["A", "B"] {
            let (t, _) = graph.new_named(pkg, name, Pos::NONE).unwrap();
            let st = graph.struct_type(Some(pkg), vec![]);
            graph.set_underlying(t, st).unwrap();
            graph.new_method(t, "Close", false, vec![], vec![], Pos::NONE).unwrap();
            graph
                .new_method(t, &format!("Only{}", name), false, vec![], vec![], Pos::NONE)
                .unwrap();
            embedded.push(FieldSpec::new(name, t).embedded());
        }
        let (both, _) = graph.new_named(pkg, "Both", Pos::NONE).unwrap();
        let st = graph.struct_type(Some(pkg), embedded);
        graph.set_underlying(both, st).unwrap();
        assert_eq!(names(&graph, &graph.method_set(both)), ["OnlyA", "OnlyB"]);
    }

    #[test]
    fn test_implements_error() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        let string = graph.basic(BasicKind::String);
        let (t, _) = graph.new_named(pkg, "MyErr", Pos::NONE).unwrap();
        let st = graph.struct_type(Some(pkg), vec![]);
        graph.set_underlying(t, st).unwrap();
        let r = graph.new_param(Some(pkg), "", string);
        graph.new_method(t, "Error", true, vec![], vec![r], Pos::NONE).unwrap();

        let error = graph.error_type();
        let pt = graph.pointer_to(t);
        assert!(!graph.implements(t, error));
        assert!(graph.implements(pt, error));
        assert!(graph.implements(error, error));
        assert!(!graph.implements(pt, t));
        assert!(graph.missing_method(t, error).is_some());
        assert!(graph.pointer_implements(t, error));
    }

    #[test]
    fn test_recursive_interfaces_identical() {
        let mut graph = TypeGraph::new();
        let pkg = graph.new_package("a", "a");
        // type N interface { Next() N } declared twice structurally
        let (n, _) = graph.new_named(pkg, "N", Pos::NONE).unwrap();
        let r1 = graph.new_param(Some(pkg), "", n);
        let next1 = graph.new_interface_method(Some(pkg), "Next", vec![], vec![r1]);
        let i1 = graph.interface_type(vec![next1], vec![]);
        graph.set_underlying(n, i1).unwrap();
        let r2 = graph.new_param(Some(pkg), "", n);
        let next2 = graph.new_interface_method(Some(pkg), "Next", vec![], vec![r2]);
        let i2 = graph.interface_type(vec![next2], vec![]);
        assert!(graph.identical(i1, i2));
    }
}
