//! End-to-end scenarios for intra-procedural constant propagation over a
//! program built from the same JSON format the CLI reads.

use panalyzer::cfg::Cfg;
use panalyzer::dataflow::{solve, ConstantPropagation};
use panalyzer::ir::{ClassHierarchy, Program};
use panalyzer::lattice::Value;

fn method_var(program: &Program, method_subsig: &str, var_name: &str) -> panalyzer::ir::VarId {
    let mid = program.entry_method(method_subsig).unwrap();
    let method = program.method(mid);
    method.vars.iter().find(|v| v.name == var_name).map(|v| v.id).unwrap()
}

#[test]
fn straight_line_then_branch_facts_are_locally_precise() {
    // p0 = 1; p1 = 2; x = p0 + p1;
    // if (x > 2) { y = x; return y; } else { y = 0; return y; }
    let json = r#"{
        "classes": [{
            "name": "Main",
            "methods": [{
                "name": "main",
                "subsignature": "main()V",
                "is_static": true,
                "return_type": { "kind": "Int" },
                "vars": [
                    { "name": "p0", "type": { "kind": "Int" } },
                    { "name": "p1", "type": { "kind": "Int" } },
                    { "name": "x", "type": { "kind": "Int" } },
                    { "name": "two", "type": { "kind": "Int" } },
                    { "name": "cond", "type": { "kind": "Int" } },
                    { "name": "y", "type": { "kind": "Int" } }
                ],
                "stmts": [
                    { "kind": "Assign", "lhs": "p0", "rhs": { "kind": "IntConst", "value": 1 } },
                    { "kind": "Assign", "lhs": "p1", "rhs": { "kind": "IntConst", "value": 2 } },
                    { "kind": "Assign", "lhs": "x", "rhs": { "kind": "Binary", "op": "add", "l": "p0", "r": "p1" } },
                    { "kind": "Assign", "lhs": "two", "rhs": { "kind": "IntConst", "value": 2 } },
                    { "kind": "Assign", "lhs": "cond", "rhs": { "kind": "Binary", "op": "gt", "l": "x", "r": "two" } },
                    { "kind": "If", "cond": "cond", "target": 7 },
                    { "kind": "Assign", "lhs": "y", "rhs": { "kind": "IntConst", "value": 0 } },
                    { "kind": "Assign", "lhs": "y", "rhs": { "kind": "Var", "name": "x" } },
                    { "kind": "Return", "var": "y" }
                ]
            }]
        }]
    }"#;

    let program = Program::load_json(json).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let method = program.method(entry);
    let cfg = Cfg::build(method);
    let result = solve(&ConstantPropagation::new(method), &cfg);

    let x = method_var(&program, "main()V", "x");
    let cond = method_var(&program, "main()V", "cond");
    let y = method_var(&program, "main()V", "y");

    // x = p0 + p1 is computed unconditionally before the branch.
    assert_eq!(result.out_fact(panalyzer::cfg::CfgNode::Stmt(2)).get(x), Value::Const(3));
    assert_eq!(result.out_fact(panalyzer::cfg::CfgNode::Stmt(4)).get(cond), Value::Const(1));

    // Each branch's own assignment is locally exact: this is a flow-merge
    // analysis, not a branch-pruning one (that refinement is deadcode's
    // job), so these are checked per branch rather than at a single
    // post-dominating join.
    assert_eq!(result.out_fact(panalyzer::cfg::CfgNode::Stmt(6)).get(y), Value::Const(0));
    assert_eq!(result.out_fact(panalyzer::cfg::CfgNode::Stmt(7)).get(y), Value::Const(3));
}

#[test]
fn division_by_known_zero_yields_undef() {
    // a = NAC (a parameter); b = 0; c = a / b;
    let json = r#"{
        "classes": [{
            "name": "Main",
            "methods": [{
                "name": "main",
                "subsignature": "main(I)V",
                "is_static": true,
                "return_type": { "kind": "Int" },
                "vars": [
                    { "name": "a", "type": { "kind": "Int" } },
                    { "name": "b", "type": { "kind": "Int" } },
                    { "name": "c", "type": { "kind": "Int" } }
                ],
                "params": ["a"],
                "stmts": [
                    { "kind": "Assign", "lhs": "b", "rhs": { "kind": "IntConst", "value": 0 } },
                    { "kind": "Assign", "lhs": "c", "rhs": { "kind": "Binary", "op": "div", "l": "a", "r": "b" } },
                    { "kind": "Return", "var": "c" }
                ]
            }]
        }]
    }"#;

    let program = Program::load_json(json).unwrap();
    let entry = program.entry_method("main(I)V").unwrap();
    let method = program.method(entry);
    let cfg = Cfg::build(method);
    let result = solve(&ConstantPropagation::new(method), &cfg);

    let c = method_var(&program, "main(I)V", "c");
    assert_eq!(result.out_fact(panalyzer::cfg::CfgNode::Stmt(1)).get(c), Value::Undef);
}
