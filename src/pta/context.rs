//! Interned, k-limited contexts. A context is a short stack of context
//! elements (call sites for call-string sensitivity, heap objects for
//! object sensitivity, classes for type sensitivity); `ContextCache`
//! hash-conses them so context equality is a cheap id comparison and the
//! points-to solver's `Pointer`/`Obj` keys stay small.
//!
//! Adapted from `rupta`'s `mir::context` module, with `rustc_index`'s
//! `IndexVec` replaced by a plain `Vec` + the crate's own `Idx` newtype.

use std::collections::HashMap;

use crate::ir::{CallSiteId, ClassId};
use crate::newtype_index;
use crate::pta::obj::ObjId;
use crate::util::index::Idx;

newtype_index! {
    pub struct ContextId { "ctx#{}" }
}

/// A single frame of context. Different context abstractions push
/// different element kinds; an analysis run uses exactly one kind, chosen
/// by its `ContextSelector`, so contexts never mix element variants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CtxElem {
    CallSite(CallSiteId),
    Obj(ObjId),
    Type(ClassId),
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Context {
    elems: Vec<CtxElem>,
}

impl Context {
    pub fn empty() -> Context {
        Context { elems: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Prepends `elem` to `old`, keeping at most `k` elements (dropping the
    /// oldest/tail element once the limit is exceeded).
    pub fn extend_k_limited(old: &Context, elem: CtxElem, k: usize) -> Context {
        if k == 0 {
            return Context::empty();
        }
        let mut elems = Vec::with_capacity(k);
        elems.push(elem);
        let take = k.saturating_sub(1).min(old.elems.len());
        elems.extend_from_slice(&old.elems[..take]);
        Context { elems }
    }
}

pub struct ContextCache {
    contexts: Vec<Context>,
    index: HashMap<Context, ContextId>,
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextCache {
    pub fn new() -> ContextCache {
        let mut cache = ContextCache { contexts: Vec::new(), index: HashMap::new() };
        cache.intern(Context::empty());
        cache
    }

    pub fn empty(&self) -> ContextId {
        ContextId::new(0)
    }

    pub fn intern(&mut self, ctx: Context) -> ContextId {
        if let Some(id) = self.index.get(&ctx) {
            return *id;
        }
        let id = ContextId::new(self.contexts.len());
        self.index.insert(ctx.clone(), id);
        self.contexts.push(ctx);
        id
    }

    pub fn get(&self, id: ContextId) -> &Context {
        &self.contexts[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_deduplicated() {
        let mut cache = ContextCache::new();
        let a = Context::extend_k_limited(&Context::empty(), CtxElem::CallSite(CallSiteId::from_u32(0)), 1);
        let b = Context::extend_k_limited(&Context::empty(), CtxElem::CallSite(CallSiteId::from_u32(0)), 1);
        assert_eq!(cache.intern(a), cache.intern(b));
    }

    #[test]
    fn k_limiting_drops_oldest() {
        let base = Context::extend_k_limited(&Context::empty(), CtxElem::CallSite(CallSiteId::from_u32(0)), 2);
        let extended = Context::extend_k_limited(&base, CtxElem::CallSite(CallSiteId::from_u32(1)), 2);
        assert_eq!(extended.len(), 2);
        let extended2 = Context::extend_k_limited(&extended, CtxElem::CallSite(CallSiteId::from_u32(2)), 2);
        assert_eq!(extended2.len(), 2);
        assert!(!extended2.elems.contains(&CtxElem::CallSite(CallSiteId::from_u32(0))));
    }
}
