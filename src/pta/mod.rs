//! Points-to analysis: context-insensitive ("Andersen") and k-limited
//! context-sensitive pointer analysis over a shared on-the-fly solver.
//! Context-insensitivity is not a separate algorithm here — it is the
//! context-sensitive engine run with a selector that always yields the
//! empty context (see [`context_selector::CallStringSelector`] with
//! `k = 0`).

pub mod context;
pub mod context_selector;
pub mod obj;
pub mod pointer;
pub mod solver;

pub use context::{Context, ContextCache, ContextId, CtxElem};
pub use context_selector::{CallStringSelector, ContextSelector, ObjectSelector, TypeSelector};
pub use obj::{AllocSite, Obj, ObjId, ObjManager};
pub use pointer::Pointer;
pub use solver::{solve, PointsToResult, PtaCallGraph, PtaCallSite, PtaFunc};

use crate::ir::{MethodId, Program};
use crate::util::options::ContextKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PTAType {
    Andersen,
    ContextSensitive,
}

/// Runs context-insensitive Andersen-style pointer analysis.
pub fn run_andersen(program: &Program, entry: MethodId) -> PointsToResult {
    solve(program, entry, Box::new(CallStringSelector { k: 0 }))
}

/// Runs k-limited context-sensitive pointer analysis under the requested
/// context abstraction.
pub fn run_context_sensitive(program: &Program, entry: MethodId, kind: ContextKind, k: u32) -> PointsToResult {
    let k = k as usize;
    let selector: Box<dyn ContextSelector> = match kind {
        ContextKind::CallString => Box::new(CallStringSelector { k }),
        ContextKind::Object => Box::new(ObjectSelector { k }),
        ContextKind::Type => Box::new(TypeSelector { k }),
    };
    solve(program, entry, selector)
}

/// Dispatches on `pta_type`, mirroring the CLI's `--pta-type` flag.
pub fn run(program: &Program, entry: MethodId, pta_type: PTAType, kind: ContextKind, k: u32) -> PointsToResult {
    match pta_type {
        PTAType::Andersen => run_andersen(program, entry),
        PTAType::ContextSensitive => run_context_sensitive(program, entry, kind, k),
    }
}
