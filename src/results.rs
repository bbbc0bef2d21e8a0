//! The external result surface every analysis driver (the CLI binary,
//! integration tests) consumes: typed accessors over the finalized
//! points-to data plus whatever taint flows were found, rather than a
//! type-erased keyed-payload map — the only keyed payload the interfaces
//! this is grounded on ever actually carry is taint flows, so that case
//! gets its own field.

use crate::error::AnalysisError;
use crate::ir::{ClassHierarchy, MethodId, Program, VarId};
use crate::pta::{ContextId, ObjId, PtaCallGraph, PointsToResult};
use crate::taint::TaintFlow;

pub struct PointerAnalysisResult<'p> {
    program: &'p Program,
    pta: PointsToResult,
    taint_flows: Vec<TaintFlow>,
}

impl<'p> PointerAnalysisResult<'p> {
    pub fn new(program: &'p Program, pta: PointsToResult, taint_flows: Vec<TaintFlow>) -> Self {
        PointerAnalysisResult { program, pta, taint_flows }
    }

    pub fn call_graph(&self) -> &PtaCallGraph {
        &self.pta.call_graph
    }

    /// Every contextualized variable (CSVar) reachable under this run.
    pub fn vars(&self) -> impl Iterator<Item = (ContextId, MethodId, VarId)> + '_ {
        self.pta.call_graph.reach_funcs_iter().flat_map(move |(ctx, mid)| {
            let method = self.program.method(mid);
            method.vars.iter().map(move |v| (ctx, mid, v.id)).collect::<Vec<_>>()
        })
    }

    pub fn points_to_set(&self, ctx: ContextId, method: MethodId, var: VarId) -> Vec<ObjId> {
        self.pta.pts_of(ctx, method, var)
    }

    pub fn taint_flows(&self) -> &[TaintFlow] {
        &self.taint_flows
    }

    pub fn unresolved(&self) -> &[AnalysisError] {
        &self.pta.unresolved
    }

    pub fn points_to_result(&self) -> &PointsToResult {
        &self.pta
    }
}
