//! Whole-program static analysis over a statically-typed, object-oriented
//! bytecode IR: intra-procedural constant propagation, class-hierarchy and
//! points-to-driven call-graph construction, inter-procedural constant
//! propagation, and taint analysis.

pub mod callgraph;
pub mod cfg;
pub mod dataflow;
pub mod deadcode;
pub mod error;
pub mod icfg;
pub mod ir;
pub mod lattice;
pub mod pta;
pub mod pts_set;
pub mod results;
pub mod taint;
pub mod util;

pub use error::AnalysisError;
