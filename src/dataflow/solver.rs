//! The generic worklist solver: forward analyses meet over predecessors
//! and propagate to successors, backward analyses do the mirror image.
//! Termination follows from the lattice having finite height and every
//! transfer function being monotone (see the lattice tests and the
//! analyses built on this solver).

use std::collections::{HashMap, VecDeque};

use crate::cfg::{Cfg, CfgNode};
use crate::dataflow::analysis::DataflowAnalysis;

pub struct DataflowResult<F> {
    pub in_facts: HashMap<CfgNode, F>,
    pub out_facts: HashMap<CfgNode, F>,
}

impl<F> DataflowResult<F> {
    pub fn in_fact(&self, node: CfgNode) -> &F {
        &self.in_facts[&node]
    }

    pub fn out_fact(&self, node: CfgNode) -> &F {
        &self.out_facts[&node]
    }
}

pub fn solve<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> DataflowResult<A::Fact> {
    if analysis.is_forward() {
        solve_forward(analysis, cfg)
    } else {
        solve_backward(analysis, cfg)
    }
}

fn solve_forward<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> DataflowResult<A::Fact> {
    let nodes = cfg.nodes();
    let mut in_facts: HashMap<CfgNode, A::Fact> = HashMap::new();
    let mut out_facts: HashMap<CfgNode, A::Fact> = HashMap::new();

    for &n in &nodes {
        if n == cfg.entry() {
            out_facts.insert(n, analysis.new_boundary_fact(cfg));
        } else {
            in_facts.insert(n, analysis.new_initial_fact());
            out_facts.insert(n, analysis.new_initial_fact());
        }
    }
    in_facts.insert(cfg.entry(), analysis.new_boundary_fact(cfg));

    let mut worklist: VecDeque<CfgNode> = nodes.iter().filter(|&&n| n != cfg.entry()).copied().collect();

    while let Some(node) = worklist.pop_front() {
        let mut merged = analysis.new_initial_fact();
        for &pred in cfg.predecessors(node) {
            if let Some(pred_out) = out_facts.get(&pred) {
                analysis.meet_into(pred_out, &mut merged);
            }
        }
        in_facts.insert(node, merged.clone());

        let mut out = out_facts.get(&node).cloned().unwrap_or_else(|| analysis.new_initial_fact());
        let changed = analysis.transfer_node(node, &merged, &mut out);
        out_facts.insert(node, out);

        if changed {
            for &succ in cfg.successors(node) {
                if succ != cfg.entry() && !worklist.contains(&succ) {
                    worklist.push_back(succ);
                }
            }
        }
    }

    DataflowResult { in_facts, out_facts }
}

fn solve_backward<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> DataflowResult<A::Fact> {
    let nodes = cfg.nodes();
    let mut in_facts: HashMap<CfgNode, A::Fact> = HashMap::new();
    let mut out_facts: HashMap<CfgNode, A::Fact> = HashMap::new();

    for &n in &nodes {
        if n == cfg.exit() {
            in_facts.insert(n, analysis.new_boundary_fact(cfg));
        } else {
            in_facts.insert(n, analysis.new_initial_fact());
            out_facts.insert(n, analysis.new_initial_fact());
        }
    }
    out_facts.insert(cfg.exit(), analysis.new_boundary_fact(cfg));

    let mut worklist: VecDeque<CfgNode> = nodes.iter().filter(|&&n| n != cfg.exit()).copied().collect();

    while let Some(node) = worklist.pop_front() {
        let mut merged = analysis.new_initial_fact();
        for &succ in cfg.successors(node) {
            if let Some(succ_in) = in_facts.get(&succ) {
                analysis.meet_into(succ_in, &mut merged);
            }
        }
        out_facts.insert(node, merged.clone());

        let mut input = in_facts.get(&node).cloned().unwrap_or_else(|| analysis.new_initial_fact());
        let changed = analysis.transfer_node(node, &merged, &mut input);
        in_facts.insert(node, input);

        if changed {
            for &pred in cfg.predecessors(node) {
                if pred != cfg.exit() && !worklist.contains(&pred) {
                    worklist.push_back(pred);
                }
            }
        }
    }

    DataflowResult { in_facts, out_facts }
}
