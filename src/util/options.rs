//! Command-line options for the analysis driver.

use clap::{Arg, Command};

use crate::pta::PTAType;

const USAGE: &str = r#"panalyzer [OPTIONS] <PROGRAM.json>"#;

fn make_options_parser() -> Command<'static> {
    Command::new("panalyzer")
        .no_binary_name(true)
        .override_usage(USAGE)
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("entry-func")
                .long("entry-func")
                .takes_value(true)
                .required(true)
                .help("Subsignature of the method from which call-graph construction begins."),
        )
        .arg(
            Arg::new("pta-type")
                .long("pta-type")
                .takes_value(true)
                .value_parser(["andersen", "ander", "context-sensitive", "cs"])
                .default_value("andersen")
                .help("The type of points-to analysis to run."),
        )
        .arg(
            Arg::new("context-kind")
                .long("context-kind")
                .takes_value(true)
                .value_parser(["call-string", "object", "type"])
                .default_value("call-string")
                .help("The context abstraction to use when --pta-type=context-sensitive."),
        )
        .arg(
            Arg::new("context-depth")
                .long("context-depth")
                .takes_value(true)
                .value_parser(clap::value_parser!(u32))
                .default_value("1")
                .help("The k-limit for a context-sensitive points-to analysis."),
        )
        .arg(
            Arg::new("taint-config")
                .long("taint-config")
                .takes_value(true)
                .help("Path to a JSON file describing taint sources, sinks and transfers."),
        )
        .arg(
            Arg::new("dump-stats")
                .long("dump-stats")
                .takes_value(false)
                .help("Log summary statistics of the analysis results."),
        )
        .arg(
            Arg::new("call-graph-output")
                .long("dump-call-graph")
                .takes_value(true)
                .help("Dump the call graph in DOT format to the given file."),
        )
        .arg(
            Arg::new("pts-output")
                .long("dump-pts")
                .takes_value(true)
                .help("Dump points-to sets to the given file."),
        )
        .arg(
            Arg::new("taint-output")
                .long("dump-taint")
                .takes_value(true)
                .help("Dump detected taint flows to the given file."),
        )
        .arg(
            Arg::new("PROGRAM")
                .required(true)
                .help("Path to the JSON-encoded program to analyze."),
        )
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub entry_func: String,
    pub pta_type: PTAType,
    pub context_kind: ContextKind,
    pub context_depth: u32,
    pub taint_config: Option<String>,
    pub dump_stats: bool,
    pub call_graph_output: Option<String>,
    pub pts_output: Option<String>,
    pub taint_output: Option<String>,
    pub program: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    CallString,
    Object,
    Type,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            entry_func: String::new(),
            pta_type: PTAType::Andersen,
            context_kind: ContextKind::CallString,
            context_depth: 1,
            taint_config: None,
            dump_stats: true,
            call_graph_output: None,
            pts_output: None,
            taint_output: None,
            program: String::new(),
        }
    }
}

impl AnalysisOptions {
    /// Parses options from a list of command-line arguments (excluding the
    /// program name).
    pub fn parse_from_args(args: &[String]) -> AnalysisOptions {
        let matches = make_options_parser().get_matches_from(args.iter());

        let mut opts = AnalysisOptions::default();

        if let Some(s) = matches.get_one::<String>("entry-func") {
            opts.entry_func = s.clone();
        }

        opts.pta_type = match matches.get_one::<String>("pta-type").unwrap().as_str() {
            "andersen" | "ander" => PTAType::Andersen,
            "context-sensitive" | "cs" => PTAType::ContextSensitive,
            _ => unreachable!(),
        };

        opts.context_kind = match matches.get_one::<String>("context-kind").unwrap().as_str() {
            "call-string" => ContextKind::CallString,
            "object" => ContextKind::Object,
            "type" => ContextKind::Type,
            _ => unreachable!(),
        };

        if let Some(depth) = matches.get_one::<u32>("context-depth") {
            opts.context_depth = *depth;
        }

        opts.taint_config = matches.get_one::<String>("taint-config").cloned();
        opts.dump_stats = matches.contains_id("dump-stats");
        opts.call_graph_output = matches.get_one::<String>("call-graph-output").cloned();
        opts.pts_output = matches.get_one::<String>("pts-output").cloned();
        opts.taint_output = matches.get_one::<String>("taint-output").cloned();
        opts.program = matches.get_one::<String>("PROGRAM").unwrap().clone();

        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_andersen_with_depth_one() {
        let args: Vec<String> = vec!["--entry-func".into(), "main()".into(), "prog.json".into()];
        let opts = AnalysisOptions::parse_from_args(&args);
        assert_eq!(opts.entry_func, "main()");
        assert_eq!(opts.pta_type, PTAType::Andersen);
        assert_eq!(opts.context_depth, 1);
        assert_eq!(opts.program, "prog.json");
    }

    #[test]
    fn selects_context_sensitive_with_object_kind() {
        let args: Vec<String> = vec![
            "--entry-func".into(),
            "main()".into(),
            "--pta-type".into(),
            "cs".into(),
            "--context-kind".into(),
            "object".into(),
            "--context-depth".into(),
            "2".into(),
            "prog.json".into(),
        ];
        let opts = AnalysisOptions::parse_from_args(&args);
        assert_eq!(opts.pta_type, PTAType::ContextSensitive);
        assert_eq!(opts.context_kind, ContextKind::Object);
        assert_eq!(opts.context_depth, 2);
    }
}
