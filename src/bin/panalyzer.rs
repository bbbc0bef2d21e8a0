//! CLI driver: loads a JSON-encoded program, runs the requested points-to
//! analysis (plus the interprocedural constant propagation and dead-code
//! passes it feeds, and taint if a config was given), and dumps whatever
//! outputs were asked for.

use std::env;
use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use log::info;

use panalyzer::cfg::Cfg;
use panalyzer::dataflow::{solve as solve_intra, ConstantPropagation, Liveness};
use panalyzer::deadcode::find_dead_statements;
use panalyzer::icfg::{solve as solve_icfg, Icfg, IcfgNode};
use panalyzer::ir::{ClassHierarchy, Program};
use panalyzer::pta::{self, ContextId, PtaCallGraph};
use panalyzer::results::PointerAnalysisResult;
use panalyzer::taint::{self, TaintConfig};
use panalyzer::util::options::AnalysisOptions;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let opts = AnalysisOptions::parse_from_args(&args);

    let program_text = fs::read_to_string(&opts.program).with_context(|| format!("reading {}", opts.program))?;
    let program = Program::load_json(&program_text).context("parsing program")?;
    let entry = program.entry_method(&opts.entry_func).context("resolving entry method")?;

    let pta_result = pta::run(&program, entry, opts.pta_type, opts.context_kind, opts.context_depth);
    info!(
        "points-to analysis: {} reachable (ctx, method) pairs, {} unresolved calls",
        pta_result.call_graph.num_reach_funcs(),
        pta_result.unresolved.len()
    );

    let icfg = Icfg::build(&program, &pta_result.call_graph);
    let entry_ctx = pta_result.ctx_cache.empty();
    let entry_node = IcfgNode { ctx: entry_ctx, method: entry, cfg: panalyzer::cfg::CfgNode::Entry };
    let icfg_result = solve_icfg(&program, &icfg, &pta_result, entry_node);
    info!("inter-procedural constant propagation: {} ICFG nodes", icfg.nodes().len());

    let mut dead_total = 0usize;
    for (_, mid) in pta_result.call_graph.reach_funcs_iter() {
        let method = program.method(mid);
        if !method.is_concrete() {
            continue;
        }
        let cfg = Cfg::build(method);
        let cp = solve_intra(&ConstantPropagation::new(method), &cfg);
        let live = solve_intra(&Liveness::new(method), &cfg);
        let dead = find_dead_statements(method, &cfg, &cp, &live);
        dead_total += dead.unreachable.len() + dead.dead_assigns.len();
    }
    info!("dead-code detection: {dead_total} dead statements across reachable methods");

    let taint_flows = match &opts.taint_config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading taint config {path}"))?;
            let config = TaintConfig::load(&text)?;
            taint::run(&program, &pta_result, &config)
        }
        None => Vec::new(),
    };
    info!("taint analysis: {} flows found", taint_flows.len());

    let result = PointerAnalysisResult::new(&program, pta_result, taint_flows);

    let resolved_constants =
        icfg.nodes().iter().filter(|&&n| icfg_result.out_fact(n).iter().any(|(_, v)| v.is_const())).count();

    if opts.dump_stats {
        println!("reachable (ctx, method) pairs: {}", result.call_graph().num_reach_funcs());
        println!("ICFG nodes: {}", icfg.nodes().len());
        println!("ICFG nodes with a resolved constant: {resolved_constants}");
        println!("dead statements: {dead_total}");
        println!("taint flows: {}", result.taint_flows().len());
        println!("unresolved calls: {}", result.unresolved().len());
    }

    if let Some(path) = &opts.call_graph_output {
        let dot = dump_call_graph_dot(&program, result.call_graph());
        fs::write(path, dot).with_context(|| format!("writing call graph to {path}"))?;
    }

    if let Some(path) = &opts.pts_output {
        let mut out = fs::File::create(path).with_context(|| format!("writing points-to sets to {path}"))?;
        for (ctx, mid, var) in result.vars() {
            let objs = result.points_to_set(ctx, mid, var);
            if objs.is_empty() {
                continue;
            }
            writeln!(out, "{} {} {:?} -> {:?}", ctx.as_u32(), mid.as_u32(), var, objs)?;
        }
    }

    if let Some(path) = &opts.taint_output {
        let mut out = fs::File::create(path).with_context(|| format!("writing taint flows to {path}"))?;
        for flow in result.taint_flows() {
            writeln!(out, "{:?} -> {:?} (arg {}, type {})", flow.source_call_site, flow.sink_call_site, flow.arg_index, flow.taint_type)?;
        }
    }

    Ok(())
}

fn dump_call_graph_dot(program: &Program, call_graph: &PtaCallGraph) -> String {
    let mut dot = String::from("digraph callgraph {\n");
    for (ctx, mid) in call_graph.reach_funcs_iter() {
        let method = program.method(mid);
        for i in method.invoke_stmt_indices() {
            let Some(cs_id) = method.stmts[i].call_site() else { continue };
            for (callee_ctx, callee) in call_graph.get_callees(&(ctx, cs_id)) {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    func_label(program, ctx, mid),
                    func_label(program, callee_ctx, callee)
                ));
            }
        }
    }
    dot.push_str("}\n");
    dot
}

fn func_label(program: &Program, ctx: ContextId, mid: panalyzer::ir::MethodId) -> String {
    let method = program.method(mid);
    format!("{}::{}#{}", program.class(method.declaring_class).name, method.subsignature, ctx.as_u32())
}
