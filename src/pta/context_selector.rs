//! Pluggable context abstractions. Context-insensitive ("Andersen")
//! analysis is realized as context-sensitive analysis under
//! `CallStringSelector { k: 0 }`, which always returns the empty context —
//! one engine, no duplicated propagation logic.

use crate::ir::{CallSiteId, MethodId};
use crate::pta::context::{Context, ContextCache, ContextId, CtxElem};
use crate::pta::obj::{ObjId, ObjManager};

pub trait ContextSelector {
    /// The context a callee runs under, given the caller's context, the
    /// call site, the resolved callee and (for instance calls) the
    /// dispatched receiver object.
    fn select_call_context(
        &self,
        caller_ctx: ContextId,
        cache: &mut ContextCache,
        call_site: CallSiteId,
        callee: MethodId,
        receiver_obj: Option<ObjId>,
        objs: &ObjManager,
    ) -> ContextId;

    /// The heap context attached to an object allocated under `alloc_ctx`.
    fn select_heap_context(&self, alloc_ctx: ContextId, cache: &mut ContextCache) -> ContextId;
}

/// k-call-site-sensitivity: the callee's context is the k most recent call
/// sites on the call stack. `k = 0` is context-insensitive Andersen.
pub struct CallStringSelector {
    pub k: usize,
}

impl ContextSelector for CallStringSelector {
    fn select_call_context(
        &self,
        caller_ctx: ContextId,
        cache: &mut ContextCache,
        call_site: CallSiteId,
        _callee: MethodId,
        _receiver_obj: Option<ObjId>,
        _objs: &ObjManager,
    ) -> ContextId {
        if self.k == 0 {
            return cache.empty();
        }
        let extended = Context::extend_k_limited(cache.get(caller_ctx), CtxElem::CallSite(call_site), self.k);
        cache.intern(extended)
    }

    fn select_heap_context(&self, alloc_ctx: ContextId, _cache: &mut ContextCache) -> ContextId {
        alloc_ctx
    }
}

/// k-object-sensitivity: the callee's context is the k most recently
/// allocated receiver objects, chained through each object's own creator
/// context (the object's `heap_ctx`).
pub struct ObjectSelector {
    pub k: usize,
}

impl ContextSelector for ObjectSelector {
    fn select_call_context(
        &self,
        caller_ctx: ContextId,
        cache: &mut ContextCache,
        _call_site: CallSiteId,
        _callee: MethodId,
        receiver_obj: Option<ObjId>,
        objs: &ObjManager,
    ) -> ContextId {
        let Some(obj_id) = receiver_obj else {
            // Static calls have no receiver object to chain through; keep
            // running under the caller's own context.
            return caller_ctx;
        };
        if self.k == 0 {
            return cache.empty();
        }
        let base_ctx = objs.get(obj_id).heap_ctx;
        let extended = Context::extend_k_limited(cache.get(base_ctx), CtxElem::Obj(obj_id), self.k);
        cache.intern(extended)
    }

    fn select_heap_context(&self, alloc_ctx: ContextId, _cache: &mut ContextCache) -> ContextId {
        alloc_ctx
    }
}

/// k-type-sensitivity: like object-sensitivity, but contexts are chains of
/// the receiver's *class* rather than its identity — coarser, and does not
/// need to chain through an object's own heap context.
pub struct TypeSelector {
    pub k: usize,
}

impl ContextSelector for TypeSelector {
    fn select_call_context(
        &self,
        caller_ctx: ContextId,
        cache: &mut ContextCache,
        _call_site: CallSiteId,
        _callee: MethodId,
        receiver_obj: Option<ObjId>,
        objs: &ObjManager,
    ) -> ContextId {
        let Some(obj_id) = receiver_obj else {
            return caller_ctx;
        };
        let Some(class) = objs.get(obj_id).class else {
            return caller_ctx;
        };
        if self.k == 0 {
            return cache.empty();
        }
        let extended = Context::extend_k_limited(cache.get(caller_ctx), CtxElem::Type(class), self.k);
        cache.intern(extended)
    }

    fn select_heap_context(&self, alloc_ctx: ContextId, _cache: &mut ContextCache) -> ContextId {
        alloc_ctx
    }
}
