//! Taint analysis, run as a second fixed-point pass after a points-to run
//! has completed.
//!
//! Rather than threading taint markers through `pta::solver::Solver`'s
//! private worklist (which would mean exposing its internal pointer-flow
//! graph and reopening an already-sealed fixed point), this module derives
//! its own static taint-relevant flow graph from the finalized
//! `PointsToResult` — the same "build once the points-to data is settled"
//! approach `icfg::graph` uses for the interprocedural CFG — and runs a
//! small worklist of its own over it. Since points-to sets are already
//! complete and monotone by the time this runs, replaying them this way
//! yields the same taint objects and flows a fully-interleaved design
//! would have produced.

pub mod config;
pub mod flow;

use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::{ClassHierarchy, Exp, MethodId, Program, Stmt};
use crate::pta::{Pointer, PointsToResult};

pub use config::{Loc, TaintConfig};
pub use flow::{TaintFlow, TaintMarker};

pub fn run(program: &Program, pta: &PointsToResult, config: &TaintConfig) -> Vec<TaintFlow> {
    Engine::new(program, pta, config).run()
}

fn method_key(program: &Program, mid: MethodId) -> String {
    let method = program.method(mid);
    format!("{}.{}", program.class(method.declaring_class).name, method.subsignature)
}

struct Engine<'p> {
    program: &'p Program,
    pta: &'p PointsToResult,
    config: &'p TaintConfig,
    /// Plain flow edges: copies, field/array loads-stores, call
    /// param/return bindings — everything an ordinary object would flow
    /// through, rebuilt statically from the finalized points-to sets.
    succs: HashMap<Pointer, Vec<Pointer>>,
    /// Transfer-configured edges, which relabel the taint type in transit
    /// rather than just copying markers unchanged.
    transfer_edges: HashMap<Pointer, Vec<(Pointer, String)>>,
    taint_pts: HashMap<Pointer, HashSet<TaintMarker>>,
}

impl<'p> Engine<'p> {
    fn new(program: &'p Program, pta: &'p PointsToResult, config: &'p TaintConfig) -> Self {
        Engine { program, pta, config, succs: HashMap::new(), transfer_edges: HashMap::new(), taint_pts: HashMap::new() }
    }

    fn run(mut self) -> Vec<TaintFlow> {
        self.build_flow_graph();
        let mut worklist: VecDeque<Pointer> = VecDeque::new();
        self.seed_sources(&mut worklist);

        while let Some(ptr) = worklist.pop_front() {
            let markers = self.taint_pts.get(&ptr).cloned().unwrap_or_default();
            if markers.is_empty() {
                continue;
            }
            if let Some(succs) = self.succs.get(&ptr).cloned() {
                for succ in succs {
                    if self.union_in(succ, markers.iter().cloned()) {
                        worklist.push_back(succ);
                    }
                }
            }
            if let Some(edges) = self.transfer_edges.get(&ptr).cloned() {
                for (succ, new_type) in edges {
                    let relabeled = markers.iter().cloned().map(|m| TaintMarker { taint_type: new_type.clone(), ..m });
                    if self.union_in(succ, relabeled) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        self.collect_flows()
    }

    fn union_in(&mut self, ptr: Pointer, markers: impl Iterator<Item = TaintMarker>) -> bool {
        let set = self.taint_pts.entry(ptr).or_default();
        let mut changed = false;
        for m in markers {
            changed |= set.insert(m);
        }
        changed
    }

    fn seed_sources(&mut self, worklist: &mut VecDeque<Pointer>) {
        for (ctx, mid) in self.pta.call_graph.reach_funcs_iter() {
            let method = self.program.method(mid);
            if !method.is_concrete() {
                continue;
            }
            for i in method.invoke_stmt_indices() {
                let stmt = &method.stmts[i];
                let Some(cs_id) = stmt.call_site() else { continue };
                for (_, callee) in self.pta.call_graph.get_callees(&(ctx, cs_id)) {
                    let key = method_key(self.program, callee);
                    if let Some(source) = self.config.sources.get(&key) {
                        if let Some(lhs) = stmt.def() {
                            let ptr = Pointer::Var(ctx, mid, lhs);
                            let marker = TaintMarker { source_call_site: cs_id, taint_type: source.taint_type.clone() };
                            if self.union_in(ptr, std::iter::once(marker)) {
                                worklist.push_back(ptr);
                            }
                        }
                    }
                }
            }
        }
    }

    fn collect_flows(&self) -> Vec<TaintFlow> {
        let mut flows = Vec::new();
        for (ctx, mid) in self.pta.call_graph.reach_funcs_iter() {
            let method = self.program.method(mid);
            if !method.is_concrete() {
                continue;
            }
            for i in method.invoke_stmt_indices() {
                let stmt = &method.stmts[i];
                let Some(cs_id) = stmt.call_site() else { continue };
                let call_site = self.program.call_site(cs_id);
                for (_, callee) in self.pta.call_graph.get_callees(&(ctx, cs_id)) {
                    let key = method_key(self.program, callee);
                    let Some(sinks) = self.config.sinks.get(&key) else { continue };
                    for sink in sinks {
                        let Some(&arg) = call_site.args.get(sink.index) else { continue };
                        let ptr = Pointer::Var(ctx, mid, arg);
                        if let Some(markers) = self.taint_pts.get(&ptr) {
                            for m in markers {
                                flows.push(TaintFlow {
                                    source_call_site: m.source_call_site,
                                    sink_call_site: cs_id,
                                    arg_index: sink.index,
                                    taint_type: m.taint_type.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
        flows
    }

    /// Rebuilds the subset of the pointer-flow graph taint needs to ride
    /// along, plus the transfer-configured relabeling edges, from the
    /// finalized IR and points-to sets — mirroring `pta::solver::Solver`'s
    /// edge construction, but as a one-shot static pass rather than an
    /// incrementally-discovered one.
    fn build_flow_graph(&mut self) {
        for (ctx, mid) in self.pta.call_graph.reach_funcs_iter() {
            let method = self.program.method(mid);
            if !method.is_concrete() {
                continue;
            }
            for stmt in &method.stmts {
                match stmt {
                    Stmt::Assign { lhs, rhs } => match rhs {
                        Exp::Var(v) => self.add_edge(Pointer::Var(ctx, mid, *v), Pointer::Var(ctx, mid, *lhs)),
                        Exp::This => {
                            if let Some(this_var) = method.this_var {
                                self.add_edge(Pointer::Var(ctx, mid, this_var), Pointer::Var(ctx, mid, *lhs));
                            }
                        }
                        Exp::Cast(v, _) => self.add_edge(Pointer::Var(ctx, mid, *v), Pointer::Var(ctx, mid, *lhs)),
                        Exp::InstanceFieldAccess { base, field } => {
                            for obj in self.pta.pts_of(ctx, mid, *base) {
                                self.add_edge(Pointer::InstanceField(obj, *field), Pointer::Var(ctx, mid, *lhs));
                            }
                        }
                        Exp::StaticFieldAccess(field) => {
                            self.add_edge(Pointer::StaticField(*field), Pointer::Var(ctx, mid, *lhs));
                        }
                        Exp::ArrayAccess { base, .. } => {
                            for obj in self.pta.pts_of(ctx, mid, *base) {
                                self.add_edge(Pointer::ArrayElem(obj), Pointer::Var(ctx, mid, *lhs));
                            }
                        }
                        Exp::InvokeExp(_) => {} // handled once per statement below, via call_site()
                        _ => {}
                    },
                    Stmt::LoadField { lhs, base, field } => {
                        for obj in self.pta.pts_of(ctx, mid, *base) {
                            self.add_edge(Pointer::InstanceField(obj, *field), Pointer::Var(ctx, mid, *lhs));
                        }
                    }
                    Stmt::StoreField { base, field, rhs } => {
                        for obj in self.pta.pts_of(ctx, mid, *base) {
                            self.add_edge(Pointer::Var(ctx, mid, *rhs), Pointer::InstanceField(obj, *field));
                        }
                    }
                    Stmt::LoadStaticField { lhs, field } => {
                        self.add_edge(Pointer::StaticField(*field), Pointer::Var(ctx, mid, *lhs));
                    }
                    Stmt::StoreStaticField { field, rhs } => {
                        self.add_edge(Pointer::Var(ctx, mid, *rhs), Pointer::StaticField(*field));
                    }
                    Stmt::LoadArray { lhs, base, .. } => {
                        for obj in self.pta.pts_of(ctx, mid, *base) {
                            self.add_edge(Pointer::ArrayElem(obj), Pointer::Var(ctx, mid, *lhs));
                        }
                    }
                    Stmt::StoreArray { base, rhs, .. } => {
                        for obj in self.pta.pts_of(ctx, mid, *base) {
                            self.add_edge(Pointer::Var(ctx, mid, *rhs), Pointer::ArrayElem(obj));
                        }
                    }
                    _ => {}
                }

                if let Some(cs_id) = stmt.call_site() {
                    self.add_call_edges(ctx, mid, cs_id, stmt);
                }
            }
        }
    }

    fn add_call_edges(&mut self, ctx: crate::pta::ContextId, mid: MethodId, cs_id: crate::ir::CallSiteId, stmt: &Stmt) {
        let call_site = self.program.call_site(cs_id).clone();
        let dest = stmt.def();

        for (callee_ctx, callee) in self.pta.call_graph.get_callees(&(ctx, cs_id)) {
            let callee_method = self.program.method(callee);
            for (arg, param) in call_site.args.iter().zip(callee_method.params.iter()) {
                self.add_edge(Pointer::Var(ctx, mid, *arg), Pointer::Var(callee_ctx, callee, *param));
            }
            for stmt in &callee_method.stmts {
                if let Stmt::Return(Some(rv)) = stmt {
                    if let Some(d) = dest {
                        self.add_edge(Pointer::Var(callee_ctx, callee, *rv), Pointer::Var(ctx, mid, d));
                    }
                }
            }

            let callee_key = method_key(self.program, callee);
            if let Some(transfers) = self.config.transfers.get(&callee_key) {
                for t in transfers {
                    let from = resolve_loc(ctx, mid, &call_site, dest, t.from);
                    let to = resolve_loc(ctx, mid, &call_site, dest, t.to);
                    if let (Some(f), Some(to_ptr)) = (from, to) {
                        self.transfer_edges.entry(f).or_default().push((to_ptr, t.taint_type.clone()));
                    }
                }
            }
        }
    }

    fn add_edge(&mut self, src: Pointer, dst: Pointer) {
        if src == dst {
            return;
        }
        self.succs.entry(src).or_default().push(dst);
    }
}

fn resolve_loc(
    ctx: crate::pta::ContextId,
    mid: MethodId,
    call_site: &crate::ir::CallSite,
    dest: Option<crate::ir::VarId>,
    loc: Loc,
) -> Option<Pointer> {
    match loc {
        Loc::Base => call_site.receiver.map(|v| Pointer::Var(ctx, mid, v)),
        Loc::Arg(i) => call_site.args.get(i).map(|&v| Pointer::Var(ctx, mid, v)),
        Loc::Result => dest.map(|v| Pointer::Var(ctx, mid, v)),
    }
}
