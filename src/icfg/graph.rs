//! The interprocedural control-flow graph: a union of per-method CFGs
//! joined at call sites by `Call`/`Return` edges, with the intraprocedural
//! fallthrough at a call site carried separately as `CallToReturn` so the
//! two kinds of flow (into the callee, past the call) can be killed and
//! transferred independently (see `interproc_constprop`).
//!
//! Built once, after a (context-sensitive or -insensitive) points-to run
//! has produced a complete on-the-fly call graph — by that point every
//! call edge is known, so the ICFG itself needs no further fixed point to
//! construct, only to analyze.

use std::collections::HashMap;

use crate::cfg::{Cfg, CfgNode};
use crate::ir::{CallSiteId, MethodId, Program};
use crate::pta::{ContextId, PtaCallGraph};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IcfgNode {
    pub ctx: ContextId,
    pub method: MethodId,
    pub cfg: CfgNode,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IcfgEdge {
    Normal,
    /// The intraprocedural edge past a call site, carrying the facts that
    /// survive the call (everything but the call's own lhs).
    CallToReturn { call_site: CallSiteId },
    /// Call-site entry into a resolved callee.
    Call { call_site: CallSiteId },
    /// Callee exit back to the call site's return point.
    Return { call_site: CallSiteId },
}

pub struct Icfg {
    succs: HashMap<IcfgNode, Vec<(IcfgEdge, IcfgNode)>>,
    preds: HashMap<IcfgNode, Vec<(IcfgEdge, IcfgNode)>>,
    nodes: Vec<IcfgNode>,
}

impl Icfg {
    pub fn build(program: &Program, call_graph: &PtaCallGraph) -> Icfg {
        let mut succs: HashMap<IcfgNode, Vec<(IcfgEdge, IcfgNode)>> = HashMap::new();
        let mut preds: HashMap<IcfgNode, Vec<(IcfgEdge, IcfgNode)>> = HashMap::new();
        let mut nodes = Vec::new();

        let mut add_edge = |succs: &mut HashMap<IcfgNode, Vec<(IcfgEdge, IcfgNode)>>,
                             preds: &mut HashMap<IcfgNode, Vec<(IcfgEdge, IcfgNode)>>,
                             from: IcfgNode,
                             edge: IcfgEdge,
                             to: IcfgNode| {
            succs.entry(from).or_default().push((edge, to));
            preds.entry(to).or_default().push((edge, from));
        };

        for (ctx, mid) in call_graph.reach_funcs_iter() {
            let method = program.method(mid);
            if !method.is_concrete() {
                continue;
            }
            let cfg = Cfg::build(method);
            for cfg_node in cfg.nodes() {
                let node = IcfgNode { ctx, method: mid, cfg: cfg_node };
                nodes.push(node);

                let call_site = match cfg_node {
                    CfgNode::Stmt(i) => method.stmts[i].call_site(),
                    _ => None,
                };

                match call_site {
                    None => {
                        for &s in cfg.successors(cfg_node) {
                            add_edge(&mut succs, &mut preds, node, IcfgEdge::Normal, IcfgNode { ctx, method: mid, cfg: s });
                        }
                    }
                    Some(cs_id) => {
                        for &s in cfg.successors(cfg_node) {
                            let ret_node = IcfgNode { ctx, method: mid, cfg: s };
                            add_edge(&mut succs, &mut preds, node, IcfgEdge::CallToReturn { call_site: cs_id }, ret_node);

                            for (callee_ctx, callee) in call_graph.get_callees(&(ctx, cs_id)) {
                                let callee_method = program.method(callee);
                                if !callee_method.is_concrete() {
                                    continue;
                                }
                                let entry = IcfgNode { ctx: callee_ctx, method: callee, cfg: CfgNode::Entry };
                                add_edge(&mut succs, &mut preds, node, IcfgEdge::Call { call_site: cs_id }, entry);
                                let exit = IcfgNode { ctx: callee_ctx, method: callee, cfg: CfgNode::Exit };
                                add_edge(&mut succs, &mut preds, exit, IcfgEdge::Return { call_site: cs_id }, ret_node);
                            }
                        }
                    }
                }
            }
        }

        Icfg { succs, preds, nodes }
    }

    pub fn nodes(&self) -> &[IcfgNode] {
        &self.nodes
    }

    pub fn successors(&self, node: IcfgNode) -> &[(IcfgEdge, IcfgNode)] {
        self.succs.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn predecessors(&self, node: IcfgNode) -> &[(IcfgEdge, IcfgNode)] {
        self.preds.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
