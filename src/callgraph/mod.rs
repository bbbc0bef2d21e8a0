//! Call-graph representation and class-hierarchy-analysis construction.

pub mod call_graph;
pub mod cha;

pub use call_graph::CallGraph;
pub use cha::{build_call_graph, ChaResult};
