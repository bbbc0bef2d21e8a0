//! The capability set a CFG-level dataflow analysis must provide. Modeled
//! after the generic `DataflowProblem` shape used across the pack (a
//! direction flag, boundary/initial facts, a meet, and a transfer
//! function) — see `mokapot`'s `fixed_point.rs` for the closest analogue.

use crate::cfg::{Cfg, CfgNode};

pub trait DataflowAnalysis {
    type Fact: Clone + PartialEq;

    /// `true` for a forward analysis (entry boundary, meet over
    /// predecessors), `false` for a backward one (exit boundary, meet over
    /// successors).
    fn is_forward(&self) -> bool;

    /// The fact installed at the CFG's boundary node (`Entry` for forward,
    /// `Exit` for backward) before the first iteration.
    fn new_boundary_fact(&self, cfg: &Cfg) -> Self::Fact;

    /// The fact every non-boundary node starts iteration with.
    fn new_initial_fact(&self) -> Self::Fact;

    /// `target = target meet fact`, returning whether `target` changed.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) -> bool;

    /// Applies the node's transfer function, writing the result into
    /// `out` and returning whether `out` changed.
    fn transfer_node(&self, node: CfgNode, input: &Self::Fact, out: &mut Self::Fact) -> bool;
}
