//! The points-to solver: on-the-fly call-graph construction interleaved
//! with Andersen-style constraint propagation over the pointer-flow graph.
//!
//! Grounded in `rupta`'s `pta/propagator/propagator.rs` worklist shape
//! (`process_node` dispatches per constraint kind, `pt_data.flush()` at the
//! end of each node) and in `rta/rta.rs`'s reachable-function loop for
//! on-the-fly reachability, but driven by a single `VecDeque<Pointer>`
//! worklist rather than `ChunkedQueue`: pointers are re-enqueued every time
//! their points-to set grows, which a append-only queue cannot express.

use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, info};

use crate::callgraph::CallGraph;
use crate::error::AnalysisError;
use crate::ir::{CallKind, CallSite, CallSiteId, ClassHierarchy, Exp, MethodId, Program, Stmt, VarId};
use crate::pta::context::{ContextCache, ContextId};
use crate::pta::context_selector::ContextSelector;
use crate::pta::obj::{AllocSite, ObjId, ObjManager};
use crate::pta::pointer::Pointer;
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};
use crate::pts_set::pt_data::DiffPTData;

pub type PtaFunc = (ContextId, MethodId);
pub type PtaCallSite = (ContextId, CallSiteId);
pub type PtaCallGraph = CallGraph<PtaFunc, PtaCallSite>;

pub struct PointsToResult {
    pub call_graph: PtaCallGraph,
    pub ctx_cache: ContextCache,
    pub obj_manager: ObjManager,
    pub pt: DiffPTData<Pointer, ObjId, HybridPointsToSet<ObjId>>,
    pub unresolved: Vec<AnalysisError>,
}

impl PointsToResult {
    /// The resolved points-to set of a variable under a given context,
    /// merging whatever is still in `diff` with what has already flushed
    /// to `propa` (callers should only observe this after the solver has
    /// reached a fixed point).
    pub fn pts_of(&self, ctx: ContextId, method: MethodId, var: VarId) -> Vec<ObjId> {
        let ptr = Pointer::Var(ctx, method, var);
        let mut objs: HashSet<ObjId> = HashSet::new();
        if let Some(ds) = self.pt.get_propa_pts(ptr) {
            objs.extend(ds.iter());
        }
        if let Some(ds) = self.pt.get_diff_pts(ptr) {
            objs.extend(ds.iter());
        }
        objs.into_iter().collect()
    }
}

pub fn solve(program: &Program, entry: MethodId, selector: Box<dyn ContextSelector>) -> PointsToResult {
    info!("points-to solver: starting from {}", program.method(entry).subsignature);
    let mut solver = Solver::new(program, selector);
    let entry_ctx = solver.ctx_cache.empty();
    solver.call_graph.add_node((entry_ctx, entry));

    loop {
        let pending: Vec<PtaFunc> =
            solver.call_graph.reach_funcs_iter().filter(|f| !solver.processed.contains(f)).collect();
        if pending.is_empty() && solver.worklist.is_empty() {
            break;
        }
        for key in pending {
            solver.processed.insert(key);
            solver.generate_constraints(key);
        }
        while let Some(ptr) = solver.worklist.pop_front() {
            solver.process_pointer(ptr);
        }
    }

    info!(
        "points-to solver: completed, {} reachable (ctx, method) pairs, {} heap objects, {} unresolved calls",
        solver.call_graph.num_reach_funcs(),
        solver.obj_manager.len(),
        solver.unresolved.len()
    );

    PointsToResult {
        call_graph: solver.call_graph,
        ctx_cache: solver.ctx_cache,
        obj_manager: solver.obj_manager,
        pt: solver.pt,
        unresolved: solver.unresolved,
    }
}

struct Solver<'p> {
    program: &'p Program,
    selector: Box<dyn ContextSelector>,
    call_graph: PtaCallGraph,
    ctx_cache: ContextCache,
    obj_manager: ObjManager,
    pt: DiffPTData<Pointer, ObjId, HybridPointsToSet<ObjId>>,
    worklist: VecDeque<Pointer>,
    processed: HashSet<PtaFunc>,
    pfg_edges: HashSet<(Pointer, Pointer)>,
    pfg_succs: HashMap<Pointer, Vec<Pointer>>,
    field_loads: HashMap<Pointer, Vec<(crate::ir::FieldId, Pointer)>>,
    field_stores: HashMap<Pointer, Vec<(crate::ir::FieldId, Pointer)>>,
    array_loads: HashMap<Pointer, Vec<Pointer>>,
    array_stores: HashMap<Pointer, Vec<Pointer>>,
    call_constraints: HashMap<Pointer, Vec<CallSiteId>>,
    return_vars: HashMap<PtaFunc, Vec<VarId>>,
    pending_returns: HashMap<PtaFunc, Vec<Pointer>>,
    unresolved: Vec<AnalysisError>,
}

impl<'p> Solver<'p> {
    fn new(program: &'p Program, selector: Box<dyn ContextSelector>) -> Self {
        Solver {
            program,
            selector,
            call_graph: CallGraph::new(),
            ctx_cache: ContextCache::new(),
            obj_manager: ObjManager::new(),
            pt: DiffPTData::new(),
            worklist: VecDeque::new(),
            processed: HashSet::new(),
            pfg_edges: HashSet::new(),
            pfg_succs: HashMap::new(),
            field_loads: HashMap::new(),
            field_stores: HashMap::new(),
            array_loads: HashMap::new(),
            array_stores: HashMap::new(),
            call_constraints: HashMap::new(),
            return_vars: HashMap::new(),
            pending_returns: HashMap::new(),
            unresolved: Vec::new(),
        }
    }

    fn existing_objs(&self, ptr: Pointer) -> Vec<ObjId> {
        let mut objs: Vec<ObjId> = Vec::new();
        if let Some(ds) = self.pt.get_propa_pts(ptr) {
            objs.extend(ds.iter());
        }
        if let Some(ds) = self.pt.get_diff_pts(ptr) {
            objs.extend(ds.iter());
        }
        objs
    }

    /// Adds a copy edge `src -> dst` (pts(dst) D= pts(src)) and, if it is
    /// new, immediately propagates `src`'s current points-to set into
    /// `dst` rather than waiting for `src` to be re-diffed.
    fn add_pfg_edge(&mut self, src: Pointer, dst: Pointer) {
        if src == dst || !self.pfg_edges.insert((src, dst)) {
            return;
        }
        self.pfg_succs.entry(src).or_default().push(dst);
        let existing = self.existing_objs(src);
        if !existing.is_empty() {
            let mut changed = false;
            for obj in existing {
                changed |= self.pt.add_pts(dst, obj);
            }
            if changed {
                self.worklist.push_back(dst);
            }
        }
    }

    fn add_pts_and_enqueue(&mut self, ptr: Pointer, obj: ObjId) {
        if self.pt.add_pts(ptr, obj) {
            self.worklist.push_back(ptr);
        }
    }

    /// Processes every statement of a newly-reachable `(ctx, method)` pair,
    /// generating pointer-flow-graph edges and call/field/array
    /// constraints.
    fn generate_constraints(&mut self, key: PtaFunc) {
        let (ctx, mid) = key;
        let method = self.program.method(mid);
        if !method.is_concrete() {
            return;
        }
        let mut rets = Vec::new();
        for (i, stmt) in method.stmts.iter().enumerate() {
            self.handle_stmt(ctx, mid, i, stmt);
            if let Stmt::Return(Some(v)) = stmt {
                if method.var(*v).ty.is_reference() {
                    rets.push(*v);
                }
            }
        }
        self.return_vars.insert(key, rets.clone());
        if !rets.is_empty() {
            if let Some(targets) = self.pending_returns.get(&key).cloned() {
                for dest in targets {
                    for &rv in &rets {
                        self.add_pfg_edge(Pointer::Var(ctx, mid, rv), dest);
                    }
                }
            }
        }
    }

    fn handle_stmt(&mut self, ctx: ContextId, mid: MethodId, idx: usize, stmt: &Stmt) {
        let method = self.program.method(mid);
        match stmt {
            Stmt::Assign { lhs, rhs } => self.handle_assign(ctx, mid, idx, *lhs, rhs),
            Stmt::LoadField { lhs, base, field } => {
                if method.var(*lhs).ty.is_reference() {
                    self.register_field_load(ctx, mid, *base, *field, Pointer::Var(ctx, mid, *lhs));
                }
            }
            Stmt::StoreField { base, field, rhs } => {
                if method.var(*rhs).ty.is_reference() {
                    self.register_field_store(ctx, mid, *base, *field, Pointer::Var(ctx, mid, *rhs));
                }
            }
            Stmt::LoadStaticField { lhs, field } => {
                if method.var(*lhs).ty.is_reference() {
                    self.add_pfg_edge(Pointer::StaticField(*field), Pointer::Var(ctx, mid, *lhs));
                }
            }
            Stmt::StoreStaticField { field, rhs } => {
                if method.var(*rhs).ty.is_reference() {
                    self.add_pfg_edge(Pointer::Var(ctx, mid, *rhs), Pointer::StaticField(*field));
                }
            }
            Stmt::LoadArray { lhs, base, .. } => {
                if method.var(*lhs).ty.is_reference() {
                    self.register_array_load(ctx, mid, *base, Pointer::Var(ctx, mid, *lhs));
                }
            }
            Stmt::StoreArray { base, rhs, .. } => {
                if method.var(*rhs).ty.is_reference() {
                    self.register_array_store(ctx, mid, *base, Pointer::Var(ctx, mid, *rhs));
                }
            }
            Stmt::Invoke { call_site, dest } => self.handle_call(ctx, mid, *call_site, *dest),
            Stmt::If { .. } | Stmt::Switch { .. } | Stmt::Goto(_) | Stmt::Return(_) | Stmt::Nop => {}
        }
    }

    fn handle_assign(&mut self, ctx: ContextId, mid: MethodId, idx: usize, lhs: VarId, rhs: &Exp) {
        let method = self.program.method(mid);
        if !method.var(lhs).ty.is_reference() {
            return;
        }
        let dst = Pointer::Var(ctx, mid, lhs);
        match rhs {
            Exp::Var(v) => self.add_pfg_edge(Pointer::Var(ctx, mid, *v), dst),
            Exp::This => {
                if let Some(this_var) = method.this_var {
                    self.add_pfg_edge(Pointer::Var(ctx, mid, this_var), dst);
                }
            }
            Exp::Cast(v, _) => self.add_pfg_edge(Pointer::Var(ctx, mid, *v), dst),
            Exp::NewObject(class) => {
                let alloc = AllocSite { method: mid, stmt_index: idx };
                let heap_ctx = self.selector.select_heap_context(ctx, &mut self.ctx_cache);
                let obj = self.obj_manager.intern(alloc, Some(*class), heap_ctx);
                self.add_pts_and_enqueue(dst, obj);
            }
            Exp::NewArray(_) => {
                let alloc = AllocSite { method: mid, stmt_index: idx };
                let heap_ctx = self.selector.select_heap_context(ctx, &mut self.ctx_cache);
                let obj = self.obj_manager.intern(alloc, None, heap_ctx);
                self.add_pts_and_enqueue(dst, obj);
            }
            Exp::InvokeExp(cs) => self.handle_call(ctx, mid, *cs, Some(lhs)),
            Exp::InstanceFieldAccess { base, field } => self.register_field_load(ctx, mid, *base, *field, dst),
            Exp::StaticFieldAccess(field) => self.add_pfg_edge(Pointer::StaticField(*field), dst),
            Exp::ArrayAccess { base, .. } => self.register_array_load(ctx, mid, *base, dst),
            Exp::IntConst(_) | Exp::Binary(..) | Exp::Unary(..) => {}
        }
    }

    fn register_field_load(&mut self, ctx: ContextId, mid: MethodId, base: VarId, field: crate::ir::FieldId, dst: Pointer) {
        let base_ptr = Pointer::Var(ctx, mid, base);
        self.field_loads.entry(base_ptr).or_default().push((field, dst));
        for obj in self.existing_objs(base_ptr) {
            self.add_pfg_edge(Pointer::InstanceField(obj, field), dst);
        }
    }

    fn register_field_store(&mut self, ctx: ContextId, mid: MethodId, base: VarId, field: crate::ir::FieldId, src: Pointer) {
        let base_ptr = Pointer::Var(ctx, mid, base);
        self.field_stores.entry(base_ptr).or_default().push((field, src));
        for obj in self.existing_objs(base_ptr) {
            self.add_pfg_edge(src, Pointer::InstanceField(obj, field));
        }
    }

    fn register_array_load(&mut self, ctx: ContextId, mid: MethodId, base: VarId, dst: Pointer) {
        let base_ptr = Pointer::Var(ctx, mid, base);
        self.array_loads.entry(base_ptr).or_default().push(dst);
        for obj in self.existing_objs(base_ptr) {
            self.add_pfg_edge(Pointer::ArrayElem(obj), dst);
        }
    }

    fn register_array_store(&mut self, ctx: ContextId, mid: MethodId, base: VarId, src: Pointer) {
        let base_ptr = Pointer::Var(ctx, mid, base);
        self.array_stores.entry(base_ptr).or_default().push(src);
        for obj in self.existing_objs(base_ptr) {
            self.add_pfg_edge(src, Pointer::ArrayElem(obj));
        }
    }

    fn handle_call(&mut self, ctx: ContextId, mid: MethodId, cs_id: CallSiteId, dest: Option<VarId>) {
        let call_site = self.program.call_site(cs_id).clone();
        match call_site.kind {
            CallKind::Static => {
                let Some(callee) = self.program.method_by_subsig(call_site.declaring_class, &call_site.subsignature) else {
                    self.record_unresolved(&call_site);
                    return;
                };
                let callee_ctx = self.selector.select_call_context(ctx, &mut self.ctx_cache, cs_id, callee, None, &self.obj_manager);
                self.bind_call(ctx, mid, &call_site, dest, callee_ctx, callee, None);
            }
            CallKind::Special | CallKind::Virtual | CallKind::Interface | CallKind::Dynamic => {
                let Some(recv) = call_site.receiver else {
                    self.record_unresolved(&call_site);
                    return;
                };
                let recv_ptr = Pointer::Var(ctx, mid, recv);
                self.call_constraints.entry(recv_ptr).or_default().push(cs_id);
                for obj in self.existing_objs(recv_ptr) {
                    self.dispatch_for_obj(ctx, mid, cs_id, obj);
                }
            }
        }
    }

    fn dispatch_for_obj(&mut self, ctx: ContextId, mid: MethodId, cs_id: CallSiteId, obj: ObjId) {
        let call_site = self.program.call_site(cs_id).clone();
        let Some(class) = self.obj_manager.get(obj).class else {
            return;
        };
        let target = match call_site.kind {
            CallKind::Special => self.program.method_by_subsig(call_site.declaring_class, &call_site.subsignature),
            _ => self.program.resolve_method(class, &call_site.subsignature),
        };
        let Some(callee) = target else {
            self.record_unresolved(&call_site);
            return;
        };
        let callee_ctx =
            self.selector.select_call_context(ctx, &mut self.ctx_cache, cs_id, callee, Some(obj), &self.obj_manager);
        self.bind_call(ctx, mid, &call_site, call_site.dest, callee_ctx, callee, Some(obj));
    }

    fn bind_call(
        &mut self,
        ctx: ContextId,
        mid: MethodId,
        call_site: &CallSite,
        dest: Option<VarId>,
        callee_ctx: ContextId,
        callee: MethodId,
        receiver_obj: Option<ObjId>,
    ) {
        self.call_graph.add_edge((ctx, call_site.id), (ctx, mid), (callee_ctx, callee));
        debug!(
            "resolved {:?} call at {:?} in {} to {}",
            call_site.kind,
            call_site.id,
            self.program.method(mid).subsignature,
            self.program.method(callee).subsignature
        );

        let callee_method = self.program.method(callee);
        if let (Some(this_var), Some(obj)) = (callee_method.this_var, receiver_obj) {
            self.add_pts_and_enqueue(Pointer::Var(callee_ctx, callee, this_var), obj);
        }
        for (arg, param) in call_site.args.iter().zip(callee_method.params.iter()) {
            if callee_method.var(*param).ty.is_reference() {
                self.add_pfg_edge(Pointer::Var(ctx, mid, *arg), Pointer::Var(callee_ctx, callee, *param));
            }
        }
        if let Some(dest_var) = dest {
            if self.program.method(mid).var(dest_var).ty.is_reference() {
                let dest_ptr = Pointer::Var(ctx, mid, dest_var);
                let key = (callee_ctx, callee);
                if let Some(rets) = self.return_vars.get(&key).cloned() {
                    for rv in rets {
                        self.add_pfg_edge(Pointer::Var(callee_ctx, callee, rv), dest_ptr);
                    }
                } else {
                    self.pending_returns.entry(key).or_default().push(dest_ptr);
                }
            }
        }
    }

    fn record_unresolved(&mut self, call_site: &CallSite) {
        if call_site.kind == CallKind::Dynamic {
            debug!("skipping unresolvable dynamic call at {:?}", call_site.id);
            return;
        }
        debug!("unresolvable {:?} call at {:?}", call_site.kind, call_site.id);
        self.unresolved.push(AnalysisError::UnresolvableCall {
            declaring_class: self.program.class(call_site.declaring_class).name.clone(),
            subsignature: call_site.subsignature.clone(),
        });
    }

    fn process_pointer(&mut self, ptr: Pointer) {
        let diff = self.pt.get_diff_pts(ptr).cloned();
        let Some(diff) = diff else {
            return;
        };
        if diff.is_empty() {
            self.pt.flush(ptr);
            return;
        }

        if let Some(succs) = self.pfg_succs.get(&ptr).cloned() {
            for succ in succs {
                if self.pt.union_pts_to(succ, &diff) {
                    self.worklist.push_back(succ);
                }
            }
        }

        if let Some(loads) = self.field_loads.get(&ptr).cloned() {
            for (field, dst) in loads {
                for obj in diff.iter() {
                    self.add_pfg_edge(Pointer::InstanceField(obj, field), dst);
                }
            }
        }
        if let Some(stores) = self.field_stores.get(&ptr).cloned() {
            for (field, src) in stores {
                for obj in diff.iter() {
                    self.add_pfg_edge(src, Pointer::InstanceField(obj, field));
                }
            }
        }
        if let Some(loads) = self.array_loads.get(&ptr).cloned() {
            for dst in loads {
                for obj in diff.iter() {
                    self.add_pfg_edge(Pointer::ArrayElem(obj), dst);
                }
            }
        }
        if let Some(stores) = self.array_stores.get(&ptr).cloned() {
            for src in stores {
                for obj in diff.iter() {
                    self.add_pfg_edge(src, Pointer::ArrayElem(obj));
                }
            }
        }
        if let Some(css) = self.call_constraints.get(&ptr).cloned() {
            if let Pointer::Var(ctx, mid, _) = ptr {
                for cs_id in css {
                    for obj in diff.iter() {
                        self.dispatch_for_obj(ctx, mid, cs_id, obj);
                    }
                }
            }
        }

        self.pt.flush(ptr);
    }
}
