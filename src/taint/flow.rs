use crate::ir::CallSiteId;

/// A taint marker carries the call site that produced it (so a flow can be
/// reported back to its origin) and the configured taint type, which a
/// transfer may relabel in transit.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TaintMarker {
    pub source_call_site: CallSiteId,
    pub taint_type: String,
}

/// A confirmed source-to-sink flow, emitted once at the end of the taint
/// pass for every taint object still present at a sink argument.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaintFlow {
    pub source_call_site: CallSiteId,
    pub sink_call_site: CallSiteId,
    pub arg_index: usize,
    pub taint_type: String,
}
