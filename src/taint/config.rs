//! Taint source/sink/transfer configuration, loaded from the JSON pointed
//! to by `--taint-config`. A malformed file is an `AnalysisError::ConfigError`,
//! fatal at construction per the general configuration-error policy.

use std::collections::HashMap;
use std::convert::TryFrom;

use serde::Deserialize;

use crate::error::AnalysisError;

/// Where a transfer's taint enters or leaves a call, relative to the call
/// site the transfer matches against.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Loc {
    Base,
    Arg(usize),
    Result,
}

impl TryFrom<String> for Loc {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        match s.as_str() {
            "base" => Ok(Loc::Base),
            "result" => Ok(Loc::Result),
            rest => rest
                .strip_prefix("arg")
                .and_then(|n| n.parse::<usize>().ok())
                .map(Loc::Arg)
                .ok_or_else(|| format!("invalid taint location '{s}', expected 'base', 'result' or 'argN'")),
        }
    }
}

impl<'de> Deserialize<'de> for Loc {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Loc::try_from(s).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct SourceEntry {
    pub method: String,
    #[serde(rename = "type")]
    pub taint_type: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct SinkEntry {
    pub method: String,
    pub index: usize,
}

#[derive(Clone, Deserialize, Debug)]
pub struct TransferEntry {
    pub method: String,
    pub from: Loc,
    pub to: Loc,
    #[serde(rename = "type")]
    pub taint_type: String,
}

#[derive(Deserialize, Debug)]
struct TaintConfigJson {
    #[serde(default)]
    sources: Vec<SourceEntry>,
    #[serde(default)]
    sinks: Vec<SinkEntry>,
    #[serde(default)]
    transfers: Vec<TransferEntry>,
}

/// Sources, sinks and transfers indexed by `"{declaring class}.{subsignature}"`
/// for O(1) lookup as the engine walks reachable call sites.
pub struct TaintConfig {
    pub sources: HashMap<String, SourceEntry>,
    pub sinks: HashMap<String, Vec<SinkEntry>>,
    pub transfers: HashMap<String, Vec<TransferEntry>>,
}

impl TaintConfig {
    pub fn empty() -> Self {
        TaintConfig { sources: HashMap::new(), sinks: HashMap::new(), transfers: HashMap::new() }
    }

    pub fn load(text: &str) -> Result<Self, AnalysisError> {
        let parsed: TaintConfigJson =
            serde_json::from_str(text).map_err(|e| AnalysisError::ConfigError(format!("taint config: {e}")))?;

        let mut sources = HashMap::new();
        for entry in parsed.sources {
            sources.insert(entry.method.clone(), entry);
        }
        let mut sinks: HashMap<String, Vec<SinkEntry>> = HashMap::new();
        for entry in parsed.sinks {
            sinks.entry(entry.method.clone()).or_default().push(entry);
        }
        let mut transfers: HashMap<String, Vec<TransferEntry>> = HashMap::new();
        for entry in parsed.transfers {
            transfers.entry(entry.method.clone()).or_default().push(entry);
        }

        Ok(TaintConfig { sources, sinks, transfers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_sources_sinks_and_transfers() {
        let json = r#"{
            "sources": [{"method": "Net.src()Ljava/lang/String;", "type": "tainted"}],
            "sinks": [{"method": "Net.sink(Ljava/lang/String;)V", "index": 0}],
            "transfers": [{"method": "Net.wrap(Ljava/lang/String;)LNet;", "from": "arg0", "to": "result", "type": "tainted"}]
        }"#;
        let cfg = TaintConfig::load(json).unwrap();
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sinks.len(), 1);
        assert_eq!(cfg.transfers["Net.wrap(Ljava/lang/String;)LNet;"][0].from, Loc::Arg(0));
        assert_eq!(cfg.transfers["Net.wrap(Ljava/lang/String;)LNet;"][0].to, Loc::Result);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = TaintConfig::load("{not json").unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
    }
}
