//! Abstract heap objects. Each object is identified by the allocation site
//! (the `NewObject`/`NewArray` statement that created it) plus the context
//! active at that site — so under a context-sensitive analysis the same
//! `new` statement reached from two different call chains yields two
//! distinct objects, while under Andersen (the empty-context selector) it
//! always collapses back to one.

use std::collections::HashMap;

use crate::ir::{ClassId, MethodId};
use crate::newtype_index;
use crate::pta::context::ContextId;
use crate::util::index::Idx;

newtype_index! {
    pub struct ObjId { "obj#{}" }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AllocSite {
    pub method: MethodId,
    pub stmt_index: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Obj {
    pub id: ObjId,
    pub alloc: AllocSite,
    /// The allocated class, or `None` for array objects (which have no
    /// methods and so are never a virtual-dispatch receiver).
    pub class: Option<ClassId>,
    /// The context active at the allocation site, used by object-sensitive
    /// context selection to chain through an object's creator.
    pub heap_ctx: ContextId,
}

#[derive(Default)]
pub struct ObjManager {
    objs: Vec<Obj>,
    index: HashMap<(AllocSite, ContextId), ObjId>,
}

impl ObjManager {
    pub fn new() -> ObjManager {
        ObjManager::default()
    }

    pub fn intern(&mut self, alloc: AllocSite, class: Option<ClassId>, heap_ctx: ContextId) -> ObjId {
        if let Some(id) = self.index.get(&(alloc, heap_ctx)) {
            return *id;
        }
        let id = ObjId::new(self.objs.len());
        self.objs.push(Obj { id, alloc, class, heap_ctx });
        self.index.insert((alloc, heap_ctx), id);
        id
    }

    pub fn get(&self, id: ObjId) -> &Obj {
        &self.objs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_site_same_context_collapses_to_one_object() {
        let mut mgr = ObjManager::new();
        let site = AllocSite { method: MethodId::from_u32(0), stmt_index: 3 };
        let a = mgr.intern(site, Some(ClassId::from_u32(1)), ContextId::from_u32(0));
        let b = mgr.intern(site, Some(ClassId::from_u32(1)), ContextId::from_u32(0));
        assert_eq!(a, b);
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn same_site_different_context_is_distinct() {
        let mut mgr = ObjManager::new();
        let site = AllocSite { method: MethodId::from_u32(0), stmt_index: 3 };
        let a = mgr.intern(site, Some(ClassId::from_u32(1)), ContextId::from_u32(0));
        let b = mgr.intern(site, Some(ClassId::from_u32(1)), ContextId::from_u32(1));
        assert_ne!(a, b);
        assert_eq!(mgr.len(), 2);
    }
}
