//! Generic CFG dataflow framework plus the two concrete analyses built on
//! it: intra-procedural constant propagation and may-liveness.

pub mod analysis;
pub mod constprop;
pub mod liveness;
pub mod solver;

pub use analysis::DataflowAnalysis;
pub use constprop::ConstantPropagation;
pub use liveness::Liveness;
pub use solver::{solve, DataflowResult};
