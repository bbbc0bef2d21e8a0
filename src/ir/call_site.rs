//! Call sites. The call kind is classified once, at IR construction time
//! (see `Program::from_json`), never inferred mid-analysis: by the time a
//! `CallSite` reaches the CHA builder or a points-to solver its `kind` is
//! one of the five variants below and nothing else.

use crate::ir::class::{ClassId, MethodId, Subsignature};
use crate::ir::var::VarId;
use crate::newtype_index;

newtype_index! {
    pub struct CallSiteId { "callsite#{}" }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Resolved directly to a single method at IR-construction time.
    Static,
    /// Constructor and private-method calls: no dispatch, resolved to the
    /// exact declared method.
    Special,
    /// Resolved via CHA against the receiver's declared (static) type.
    Virtual,
    /// Like `Virtual`, but the declared target is an interface method.
    Interface,
    /// A target that can only be discovered through the points-to analysis
    /// of the receiver (e.g. invocation through an opaque handle supplied
    /// by the front-end); resolved on-the-fly during pointer analysis.
    Dynamic,
}

#[derive(Clone, Debug)]
pub struct CallSite {
    pub id: CallSiteId,
    pub kind: CallKind,
    pub caller: MethodId,
    /// The class and subsignature of the statically-declared target.
    pub declaring_class: ClassId,
    pub subsignature: Subsignature,
    pub receiver: Option<VarId>,
    pub args: Vec<VarId>,
    pub dest: Option<VarId>,
}
