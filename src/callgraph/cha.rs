//! Class-hierarchy-analysis call-graph construction: a context-insensitive,
//! flow-insensitive over-approximation that resolves virtual/interface
//! calls to every method in the receiver's declared-type subtype closure
//! that overrides the target subsignature, without consulting points-to
//! information. Static and special calls resolve to exactly one method.
//!
//! Follows the reachable-worklist shape used throughout the pack's
//! call-graph builders (enqueue the entry method, process each reachable
//! method's call sites, resolve callees, add edges, enqueue newly
//! discovered methods) rather than a one-shot global fixed point.

use log::{debug, info};

use crate::callgraph::call_graph::CallGraph;
use crate::error::AnalysisError;
use crate::ir::{CallKind, CallSite, ClassHierarchy, MethodId, Program};

pub type CgCallSite = crate::ir::CallSiteId;

pub struct ChaResult {
    pub call_graph: CallGraph<MethodId, CgCallSite>,
    pub unresolved: Vec<AnalysisError>,
}

pub fn build_call_graph(program: &Program, entry: MethodId) -> ChaResult {
    info!("CHA: starting from {}", program.method(entry).subsignature);
    let mut call_graph = CallGraph::new();
    let mut unresolved = Vec::new();
    call_graph.add_node(entry);

    let mut processed = std::collections::HashSet::new();
    loop {
        let pending: Vec<MethodId> = call_graph
            .reach_funcs_iter()
            .filter(|m| !processed.contains(m))
            .collect();
        if pending.is_empty() {
            break;
        }
        for method_id in pending {
            processed.insert(method_id);
            process_method(program, &mut call_graph, method_id, &mut unresolved);
        }
    }

    info!(
        "CHA: completed, {} reachable methods, {} unresolved calls",
        call_graph.num_reach_funcs(),
        unresolved.len()
    );
    ChaResult { call_graph, unresolved }
}

fn process_method(
    program: &Program,
    call_graph: &mut CallGraph<MethodId, CgCallSite>,
    caller: MethodId,
    unresolved: &mut Vec<AnalysisError>,
) {
    let method = program.method(caller);
    if !method.is_concrete() {
        return;
    }
    for idx in method.invoke_stmt_indices() {
        let Some(cs_id) = method.stmts[idx].call_site() else { continue };
        let call_site = program.call_site(cs_id);
        let targets = resolve_targets(program, call_site);
        if targets.is_empty() && call_site.kind != crate::ir::CallKind::Dynamic {
            unresolved.push(AnalysisError::UnresolvableCall {
                declaring_class: program.class(call_site.declaring_class).name.clone(),
                subsignature: call_site.subsignature.clone(),
            });
            continue;
        }
        for callee in targets {
            debug!(
                "CHA: resolved {:?} call at {:?} in {} to {}",
                call_site.kind,
                cs_id,
                method.subsignature,
                program.method(callee).subsignature
            );
            call_graph.add_edge(cs_id, caller, callee);
        }
    }
}

/// The possible callee methods for a call site, resolved purely from
/// declared types — `Dynamic` call sites resolve to nothing here; the
/// points-to solvers refine them on the fly.
pub fn resolve_targets(program: &Program, call_site: &CallSite) -> Vec<MethodId> {
    match call_site.kind {
        CallKind::Static | CallKind::Special => program
            .method_by_subsig(call_site.declaring_class, &call_site.subsignature)
            .into_iter()
            .collect(),
        CallKind::Virtual | CallKind::Interface => program
            .subtype_closure(call_site.declaring_class)
            .into_iter()
            .filter_map(|c| {
                let class = program.class(c);
                if class.is_abstract || class.is_interface {
                    return None;
                }
                program.method_by_subsig(c, &call_site.subsignature)
            })
            .collect(),
        CallKind::Dynamic => vec![],
    }
}
