//! The analysis-wide error taxonomy. `UnresolvableCall` and `MissingIr` are
//! recoverable: callers log and degrade rather than propagate them as
//! `Err`. `ConfigError` and `InternalInvariant` are not — the former
//! surfaces to the CLI via `anyhow`, the latter indicates a bug in this
//! crate, not a malformed input program.

use std::fmt;

#[derive(Debug)]
pub enum AnalysisError {
    /// A call site could not be resolved to any concrete method (e.g. an
    /// interface with no known implementors reachable so far). Recorded
    /// and logged in place; never returned as `Err` to a caller.
    UnresolvableCall { declaring_class: String, subsignature: String },
    /// A method referenced by the program has no body available.
    MissingIr { method: String },
    ConfigError(String),
    /// A state the public IR-construction API should make unreachable.
    InternalInvariant(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnresolvableCall { declaring_class, subsignature } => {
                write!(f, "unresolvable call to {declaring_class}::{subsignature}")
            }
            AnalysisError::MissingIr { method } => write!(f, "missing IR for method {method}"),
            AnalysisError::ConfigError(msg) => write!(f, "configuration error: {msg}"),
            AnalysisError::InternalInvariant(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}
