//! The class-hierarchy contract the CHA builder and points-to solvers are
//! written against. Kept as a trait (rather than baked directly into
//! `Program`) so tests can build minimal hierarchies without going through
//! JSON.

use crate::ir::class::{Class, ClassId, Method, MethodId, Subsignature};

pub trait ClassHierarchy {
    fn class(&self, id: ClassId) -> &Class;
    fn method(&self, id: MethodId) -> &Method;
    fn class_by_name(&self, name: &str) -> Option<ClassId>;

    /// Direct subclasses/implementors of `class`, one hop down.
    fn direct_subtypes(&self, class: ClassId) -> Vec<ClassId>;

    /// Whether `sub` is `sup` or a (possibly transitive) subtype of `sup`.
    fn is_subtype(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup {
            return true;
        }
        let c = self.class(sub);
        if c.superclass.map_or(false, |s| self.is_subtype(s, sup)) {
            return true;
        }
        c.interfaces.iter().any(|i| self.is_subtype(*i, sup))
    }

    /// The method declared or inherited by `class` matching `subsig`,
    /// searching up the superclass chain (not interfaces: interface
    /// methods are resolved through `resolve_interface_method`).
    fn resolve_method(&self, class: ClassId, subsig: &Subsignature) -> Option<MethodId> {
        let c = self.class(class);
        if let Some(m) = c.methods.iter().find(|m| self.method(**m).subsignature == *subsig) {
            return Some(*m);
        }
        c.superclass.and_then(|s| self.resolve_method(s, subsig))
    }

    /// All transitive subtypes of `class`, including itself, computed via
    /// BFS over `direct_subtypes` — the closure CHA dispatch walks when
    /// resolving a virtual or interface call.
    fn subtype_closure(&self, class: ClassId) -> Vec<ClassId> {
        let mut seen = vec![class];
        let mut frontier = vec![class];
        while let Some(next) = frontier.pop() {
            for sub in self.direct_subtypes(next) {
                if !seen.contains(&sub) {
                    seen.push(sub);
                    frontier.push(sub);
                }
            }
        }
        seen
    }
}
