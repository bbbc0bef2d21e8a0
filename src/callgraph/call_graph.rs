//! A generic call graph over callers/callees (`F`) and call sites (`S`),
//! backed by `petgraph` and carrying a reachable-function worklist so
//! on-the-fly call-graph construction (CHA, and later the points-to
//! solvers) can drive their own fixed point off it directly.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use petgraph::graph::{DefaultIx, EdgeIndex, NodeIndex};
use petgraph::Graph;

use crate::util::chunked_queue::{self, ChunkedQueue};

pub type CgNodeId = NodeIndex<DefaultIx>;
pub type CgEdgeId = EdgeIndex<DefaultIx>;

pub trait CgFunction: Copy + Clone + PartialEq + Eq + Hash + Debug {}
impl<T: Copy + Clone + PartialEq + Eq + Hash + Debug> CgFunction for T {}

pub trait CgCallSite: Copy + Clone + PartialEq + Eq + Hash + Debug {}
impl<T: Copy + Clone + PartialEq + Eq + Hash + Debug> CgCallSite for T {}

#[derive(Debug)]
struct CallGraphNode<F: CgFunction> {
    func: F,
}

#[derive(Debug)]
struct CallGraphEdge<S: CgCallSite> {
    callsite: S,
}

pub struct CallGraph<F: CgFunction, S: CgCallSite> {
    graph: Graph<CallGraphNode<F>, CallGraphEdge<S>>,
    func_nodes: HashMap<F, CgNodeId>,
    callsite_to_edges: HashMap<S, HashSet<CgEdgeId>>,
    reach_funcs: ChunkedQueue<F>,
}

impl<F: CgFunction, S: CgCallSite> Default for CallGraph<F, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: CgFunction, S: CgCallSite> CallGraph<F, S> {
    pub fn new() -> Self {
        CallGraph {
            graph: Graph::new(),
            func_nodes: HashMap::new(),
            callsite_to_edges: HashMap::new(),
            reach_funcs: ChunkedQueue::new(),
        }
    }

    /// Adds `func` as a node, enqueuing it as newly reachable if it
    /// wasn't already present.
    pub fn add_node(&mut self, func: F) {
        if let Entry::Vacant(e) = self.func_nodes.entry(func) {
            let node_id = self.graph.add_node(CallGraphNode { func });
            e.insert(node_id);
            self.reach_funcs.push(func);
        }
    }

    fn get_or_insert_node(&mut self, func: F) -> CgNodeId {
        match self.func_nodes.entry(func) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                self.reach_funcs.push(func);
                let node_id = self.graph.add_node(CallGraphNode { func });
                *v.insert(node_id)
            }
        }
    }

    pub fn get_callees(&self, callsite: &S) -> HashSet<F> {
        match self.callsite_to_edges.get(callsite) {
            Some(edges) => edges
                .iter()
                .filter_map(|e| self.graph.edge_endpoints(*e))
                .filter_map(|(_, target)| self.graph.node_weight(target))
                .map(|n| n.func)
                .collect(),
            None => HashSet::new(),
        }
    }

    pub fn has_edge(&self, callsite: &S, callee: F) -> bool {
        self.get_callees(callsite).contains(&callee)
    }

    /// Adds an edge from `caller` to `callee` at `callsite`. Returns
    /// `true` if the edge is new.
    pub fn add_edge(&mut self, callsite: S, caller: F, callee: F) -> bool {
        let caller_node = self.get_or_insert_node(caller);
        let callee_node = self.get_or_insert_node(callee);

        if self.has_edge(&callsite, callee) {
            return false;
        }
        let edge_id = self.graph.add_edge(caller_node, callee_node, CallGraphEdge { callsite });
        self.callsite_to_edges.entry(callsite).or_default().insert(edge_id);
        true
    }

    pub fn contains_func(&self, func: F) -> bool {
        self.func_nodes.contains_key(&func)
    }

    pub fn reach_funcs_iter(&self) -> chunked_queue::IterCopied<F> {
        self.reach_funcs.iter_copied()
    }

    pub fn num_reach_funcs(&self) -> usize {
        self.func_nodes.len()
    }

    pub fn callers_of(&self, func: F) -> Vec<F> {
        let Some(&node) = self.func_nodes.get(&func) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|n| n.func)
            .collect()
    }
}
