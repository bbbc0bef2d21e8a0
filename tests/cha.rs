//! Class-hierarchy-analysis call-graph construction over a small diamond:
//! `A` declares `foo`, `B extends A` overrides it, `C extends B` inherits
//! `B`'s override without redeclaring it.

use panalyzer::callgraph::build_call_graph;
use panalyzer::ir::{ClassHierarchy, Program};

#[test]
fn virtual_call_resolves_to_every_declared_and_overriding_method() {
    let json = r#"{
        "classes": [
            {
                "name": "A",
                "methods": [
                    { "name": "foo", "subsignature": "foo()V", "has_this": true, "return_type": { "kind": "Other" }, "stmts": [{ "kind": "Nop" }] },
                    {
                        "name": "main",
                        "subsignature": "main()V",
                        "is_static": true,
                        "return_type": { "kind": "Other" },
                        "vars": [{ "name": "x", "type": { "kind": "Class", "name": "A" } }],
                        "stmts": [
                            {
                                "kind": "Invoke",
                                "call_kind": "virtual",
                                "declaring_class": "A",
                                "subsignature": "foo()V",
                                "receiver": "x",
                                "args": [],
                                "dest": null
                            },
                            { "kind": "Return", "var": null }
                        ]
                    }
                ]
            },
            {
                "name": "B",
                "superclass": "A",
                "methods": [
                    { "name": "foo", "subsignature": "foo()V", "has_this": true, "return_type": { "kind": "Other" }, "stmts": [{ "kind": "Nop" }] }
                ]
            },
            {
                "name": "C",
                "superclass": "B",
                "methods": []
            }
        ]
    }"#;

    let program = Program::load_json(json).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let result = build_call_graph(&program, entry);

    let a = program.class_by_name("A").unwrap();
    let a_foo = program.resolve_method(a, &"foo()V".to_string()).unwrap();
    let b = program.class_by_name("B").unwrap();
    let b_foo = program.resolve_method(b, &"foo()V".to_string()).unwrap();

    let call_site_id = program.method(entry).stmts[0].call_site().unwrap();
    let mut callees: Vec<_> = result.call_graph.get_callees(&call_site_id).into_iter().collect();
    callees.sort_by_key(|m| m.as_u32());
    let mut expected = vec![a_foo, b_foo];
    expected.sort_by_key(|m| m.as_u32());

    assert_eq!(callees, expected);
    assert!(result.unresolved.is_empty());
}
