//! Derived queries over session entities
//!
//! Every query here is total: inputs that do not denote a type, or that
//! resolve to the wrong kind, produce `None` or `false`.

use std::collections::BTreeMap;
use std::sync::Arc;

use knife_graph::{ObjectId, PackageId, Pos, Position, RawType, ScopeId, TypeId};

use crate::objects::Object;
use crate::scope::{Scope, ScopeKind};
use crate::session::Session;
use crate::types::{
    Array, Basic, Chan, Interface, Map, Named, Pointer, Signature, Slice, Struct, TypeNode,
};

/// Anything that denotes a type: a type itself or an object whose type is examined
pub trait AsType {
    fn type_id(&self, session: &Session) -> Option<TypeId>;
}

impl AsType for TypeId {
    fn type_id(&self, _: &Session) -> Option<TypeId> {
        Some(*self)
    }
}

impl AsType for TypeNode {
    fn type_id(&self, _: &Session) -> Option<TypeId> {
        Some(self.id())
    }
}

impl AsType for ObjectId {
    fn type_id(&self, session: &Session) -> Option<TypeId> {
        Some(session.graph().object(*self).ty)
    }
}

impl AsType for Object {
    fn type_id(&self, session: &Session) -> Option<TypeId> {
        self.id().type_id(session)
    }
}

impl<T: AsType + ?Sized> AsType for Arc<T> {
    fn type_id(&self, session: &Session) -> Option<TypeId> {
        (**self).type_id(session)
    }
}

impl<T: AsType> AsType for Option<T> {
    fn type_id(&self, session: &Session) -> Option<TypeId> {
        self.as_ref()?.type_id(session)
    }
}

/// Anything with a source position
pub trait HasPos {
    fn pos(&self, session: &Session) -> Pos;
}

impl HasPos for ObjectId {
    fn pos(&self, session: &Session) -> Pos {
        session.graph().object(*self).pos
    }
}

impl HasPos for Object {
    fn pos(&self, session: &Session) -> Pos {
        self.id().pos(session)
    }
}

impl HasPos for ScopeId {
    fn pos(&self, session: &Session) -> Pos {
        session.graph().scope(*self).pos
    }
}

impl HasPos for Scope {
    fn pos(&self, session: &Session) -> Pos {
        self.id().pos(session)
    }
}

impl HasPos for TypeNode {
    fn pos(&self, _: &Session) -> Pos {
        Pos::NONE
    }
}

impl<T: HasPos + ?Sized> HasPos for Arc<T> {
    fn pos(&self, session: &Session) -> Pos {
        (**self).pos(session)
    }
}

/// Everything up to and including the last `/vendor/` segment is dropped
pub fn remove_vendor(path: &str) -> &str {
    match path.rfind("/vendor/") {
        Some(i) => &path[i + "/vendor/".len()..],
        None => path.strip_prefix("vendor/").unwrap_or(path),
    }
}

impl Session {
    fn underlying_node<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<TypeNode>> {
        let ty = x.type_id(self)?;
        Some(self.type_node(self.graph().underlying(ty)))
    }

    pub fn to_basic<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Basic>> {
        self.underlying_node(x)?.as_basic()
    }

    pub fn to_array<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Array>> {
        self.underlying_node(x)?.as_array()
    }

    pub fn to_slice<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Slice>> {
        self.underlying_node(x)?.as_slice()
    }

    pub fn to_struct<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Struct>> {
        self.underlying_node(x)?.as_struct()
    }

    pub fn to_map<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Map>> {
        self.underlying_node(x)?.as_map()
    }

    pub fn to_pointer<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Pointer>> {
        self.underlying_node(x)?.as_pointer()
    }

    pub fn to_chan<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Chan>> {
        self.underlying_node(x)?.as_chan()
    }

    pub fn to_interface<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Interface>> {
        self.underlying_node(x)?.as_interface()
    }

    pub fn to_signature<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Signature>> {
        self.underlying_node(x)?.as_signature()
    }

    /// The named type denoted by `x` itself, without unwrapping
    pub fn to_named<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<Named>> {
        self.type_node(x.type_id(self)?).as_named()
    }

    /// Underlying type of `x`
    pub fn under<T: AsType + ?Sized>(&self, x: &T) -> Option<Arc<TypeNode>> {
        self.underlying_node(x)
    }

    /// Methods callable on `x` or on `*x`, value receivers winning collisions
    pub fn methods<T: AsType + ?Sized>(&self, x: &T) -> BTreeMap<String, Arc<Object>> {
        let Some(ty) = x.type_id(self) else {
            return BTreeMap::new();
        };
        let graph = self.graph();

        let mut methods: BTreeMap<String, Arc<Object>> = graph
            .method_set(ty)
            .into_iter()
            .map(|m| (graph.object(m).name.clone(), self.object(m)))
            .collect();
        if !matches!(graph.type_(ty), RawType::Pointer { .. }) {
            for m in graph.pointer_method_set(ty) {
                methods
                    .entry(graph.object(m).name.clone())
                    .or_insert_with(|| self.object(m));
            }
        }
        methods
    }

    /// Whether `x` or `*x` satisfies `iface`
    pub fn implements<T, I>(&self, x: &T, iface: &I) -> bool
    where
        T: AsType + ?Sized,
        I: AsType + ?Sized,
    {
        let (Some(ty), Some(iface)) = (x.type_id(self), iface.type_id(self)) else {
            return false;
        };
        let graph = self.graph();
        graph.implements(ty, iface) || graph.pointer_implements(ty, iface)
    }

    pub fn identical<X, Y>(&self, x: &X, y: &Y) -> bool
    where
        X: AsType + ?Sized,
        Y: AsType + ?Sized,
    {
        match (x.type_id(self), y.type_id(self)) {
            (Some(x), Some(y)) => self.graph().identical(x, y),
            _ => false,
        }
    }

    /// Source position of an object or scope; the zero position otherwise
    pub fn position<T: HasPos + ?Sized>(&self, x: &T) -> Position {
        self.graph().fset().position(x.pos(self))
    }

    /// Comment text attached to the source line of `x`, or empty
    pub fn doc<T: HasPos + ?Sized>(&self, x: &T) -> String {
        self.graph().fset().doc(x.pos(self))
    }

    /// Resolve `"path.Name"` as seen from `pkg`; a bare name is looked up in the universe
    pub fn object_of(&self, pkg: PackageId, qualified: &str) -> Option<Arc<Object>> {
        let graph = self.graph();
        let Some((path, name)) = qualified.rsplit_once('.') else {
            return graph
                .lookup(graph.universe(), qualified)
                .map(|obj| self.object(obj));
        };

        let raw = graph.package(pkg);
        let wanted = remove_vendor(path);
        let imported = raw
            .imports
            .iter()
            .find(|imp| remove_vendor(&graph.package(**imp).path) == wanted)
            .and_then(|imp| graph.lookup(graph.package(*imp).scope, name));
        if let Some(obj) = imported {
            return Some(self.object(obj));
        }

        if remove_vendor(&raw.path) != wanted && remove_vendor(&raw.name) != wanted {
            return None;
        }
        graph.lookup(raw.scope, name).map(|obj| self.object(obj))
    }

    /// Resolve a type expression such as `"*path.Name"` as seen from `pkg`.
    ///
    /// `*Name` works for any type name; deeper pointer chains resolve only
    /// when the graph holds them.
    pub fn type_of(&self, pkg: PackageId, expr: &str) -> Option<Arc<TypeNode>> {
        if expr.is_empty() {
            return None;
        }
        if let Some(rest) = expr.strip_prefix('*') {
            let elem = self.type_of(pkg, rest)?;
            let ptr = self.graph().lookup_pointer(elem.id())?;
            return Some(self.type_node(ptr));
        }
        let obj = self.object_of(pkg, expr)?;
        Some(self.type_node(obj.type_id(self)?))
    }

    /// Deepest scope under `scope` containing `pos`
    pub fn innermost(&self, scope: ScopeId, pos: Pos) -> Option<Arc<Scope>> {
        let outer = self.scope(scope);
        if !outer.get()?.contains(pos) {
            return None;
        }
        let mut current = outer;
        'descend: loop {
            let children = current.get()?.children.clone();
            for child in children {
                let child = self.scope(child);
                let data = child.get()?;
                if data.pos.is_valid() && data.end.is_valid() && data.contains(pos) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Resolve `name` used at `pos` by walking outward from `scope`.
    ///
    /// Objects in local scopes declared after `pos` are not yet visible.
    pub fn lookup_parent(
        &self,
        scope: ScopeId,
        name: &str,
        pos: Pos,
    ) -> Option<(Arc<Scope>, Arc<Object>)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            let data = scope.get()?;
            if let Some(obj) = data.objects.get(name).copied() {
                let declared = self.graph().object(obj).pos;
                let visible = data.kind != ScopeKind::Local
                    || !pos.is_valid()
                    || !declared.is_valid()
                    || declared <= pos;
                if visible {
                    return Some((scope.clone(), self.object(obj)));
                }
            }
            current = data.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_vendor() {
        assert_eq!(
            remove_vendor("example.com/app/vendor/github.com/acme/log"),
            "github.com/acme/log"
        );
        assert_eq!(remove_vendor("vendor/golang.org/x/net"), "golang.org/x/net");
        assert_eq!(remove_vendor("io"), "io");
    }
}
