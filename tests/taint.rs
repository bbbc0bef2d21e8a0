//! End-to-end taint scenario: a configured source feeds a local which then
//! reaches a configured sink argument, producing exactly one flow.

use panalyzer::ir::Program;
use panalyzer::pta;
use panalyzer::taint::{self, TaintConfig};

#[test]
fn source_to_sink_through_a_local_is_reported_once() {
    let json = r#"{
        "classes": [
            {
                "name": "Net",
                "methods": [
                    {
                        "name": "src",
                        "subsignature": "src()LString;",
                        "is_static": true,
                        "return_type": { "kind": "Class", "name": "String" },
                        "stmts": [{ "kind": "Nop" }]
                    },
                    {
                        "name": "sink",
                        "subsignature": "sink(LString;)V",
                        "is_static": true,
                        "return_type": { "kind": "Other" },
                        "vars": [{ "name": "p", "type": { "kind": "Class", "name": "String" } }],
                        "params": ["p"],
                        "stmts": [{ "kind": "Nop" }]
                    }
                ]
            },
            { "name": "String" },
            {
                "name": "Main",
                "methods": [{
                    "name": "main",
                    "subsignature": "main()V",
                    "is_static": true,
                    "return_type": { "kind": "Other" },
                    "vars": [{ "name": "x", "type": { "kind": "Class", "name": "String" } }],
                    "stmts": [
                        { "kind": "Invoke", "call_kind": "static", "declaring_class": "Net", "subsignature": "src()LString;", "args": [], "dest": "x" },
                        { "kind": "Invoke", "call_kind": "static", "declaring_class": "Net", "subsignature": "sink(LString;)V", "args": ["x"], "dest": null },
                        { "kind": "Return", "var": null }
                    ]
                }]
            }
        ]
    }"#;

    let program = Program::load_json(json).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let pta_result = pta::run_andersen(&program, entry);

    let config_json = r#"{
        "sources": [{ "method": "Net.src()LString;", "type": "tainted" }],
        "sinks": [{ "method": "Net.sink(LString;)V", "index": 0 }]
    }"#;
    let config = TaintConfig::load(config_json).unwrap();

    let flows = taint::run(&program, &pta_result, &config);

    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].arg_index, 0);
    assert_eq!(flows[0].taint_type, "tainted");
}

#[test]
fn untainted_argument_reaches_no_flow() {
    let json = r#"{
        "classes": [
            {
                "name": "Net",
                "methods": [{
                    "name": "sink",
                    "subsignature": "sink(LString;)V",
                    "is_static": true,
                    "return_type": { "kind": "Other" },
                    "vars": [{ "name": "p", "type": { "kind": "Class", "name": "String" } }],
                    "params": ["p"],
                    "stmts": [{ "kind": "Nop" }]
                }]
            },
            { "name": "String" },
            {
                "name": "Main",
                "methods": [{
                    "name": "main",
                    "subsignature": "main()V",
                    "is_static": true,
                    "return_type": { "kind": "Other" },
                    "vars": [{ "name": "x", "type": { "kind": "Class", "name": "String" } }],
                    "stmts": [
                        { "kind": "Assign", "lhs": "x", "rhs": { "kind": "NewObject", "class": "String" } },
                        { "kind": "Invoke", "call_kind": "static", "declaring_class": "Net", "subsignature": "sink(LString;)V", "args": ["x"], "dest": null },
                        { "kind": "Return", "var": null }
                    ]
                }]
            }
        ]
    }"#;

    let program = Program::load_json(json).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let pta_result = pta::run_andersen(&program, entry);

    let config_json = r#"{
        "sources": [{ "method": "Net.src()LString;", "type": "tainted" }],
        "sinks": [{ "method": "Net.sink(LString;)V", "index": 0 }]
    }"#;
    let config = TaintConfig::load(config_json).unwrap();

    let flows = taint::run(&program, &pta_result, &config);
    assert!(flows.is_empty());
}
