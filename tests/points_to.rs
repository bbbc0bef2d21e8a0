//! End-to-end points-to scenarios: a context-insensitive field-alias case,
//! and a three-way contrast (0-call-string, 1-call-string, 1-object) over a
//! factory/list program showing the same shape either merging or splitting
//! two factory-created objects depending on the context abstraction.

use panalyzer::ir::{ClassHierarchy, Program, VarId};
use panalyzer::pta::{self, ContextId, ObjId, PointsToResult, PTAType};
use panalyzer::util::options::ContextKind;

fn var_named(program: &Program, mid: panalyzer::ir::MethodId, name: &str) -> VarId {
    program.method(mid).vars.iter().find(|v| v.name == name).map(|v| v.id).unwrap()
}

fn pts(program: &Program, result: &PointsToResult, ctx: ContextId, mid: panalyzer::ir::MethodId, var: &str) -> Vec<ObjId> {
    let mut objs = result.pts_of(ctx, mid, var_named(program, mid, var));
    objs.sort_by_key(|o| o.as_u32());
    objs
}

#[test]
fn context_insensitive_field_store_is_visible_through_an_alias() {
    // a = new X(); b = a; c = b.f; a.f = new Y();
    let json = r#"{
        "classes": [
            { "name": "Y" },
            {
                "name": "X",
                "fields": [{ "name": "f", "type": { "kind": "Class", "name": "Y" } }]
            },
            {
                "name": "Main",
                "methods": [{
                    "name": "main",
                    "subsignature": "main()V",
                    "is_static": true,
                    "return_type": { "kind": "Other" },
                    "vars": [
                        { "name": "a", "type": { "kind": "Class", "name": "X" } },
                        { "name": "b", "type": { "kind": "Class", "name": "X" } },
                        { "name": "c", "type": { "kind": "Class", "name": "Y" } },
                        { "name": "y", "type": { "kind": "Class", "name": "Y" } }
                    ],
                    "stmts": [
                        { "kind": "Assign", "lhs": "a", "rhs": { "kind": "NewObject", "class": "X" } },
                        { "kind": "Assign", "lhs": "b", "rhs": { "kind": "Var", "name": "a" } },
                        { "kind": "LoadField", "lhs": "c", "base": "b", "class": "X", "field": "f" },
                        { "kind": "Assign", "lhs": "y", "rhs": { "kind": "NewObject", "class": "Y" } },
                        { "kind": "StoreField", "base": "a", "class": "X", "field": "f", "rhs": "y" },
                        { "kind": "Return", "var": null }
                    ]
                }]
            }
        ]
    }"#;

    let program = Program::load_json(json).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let result = pta::run_andersen(&program, entry);
    let ctx = result.ctx_cache.empty();

    let y_obj = pts(&program, &result, ctx, entry, "y");
    let c_pts = pts(&program, &result, ctx, entry, "c");
    assert_eq!(y_obj.len(), 1);
    assert!(c_pts.contains(&y_obj[0]));
}

fn factory_program_json() -> &'static str {
    r#"{
        "classes": [
            { "name": "Item" },
            {
                "name": "List",
                "fields": [{ "name": "contents", "type": { "kind": "Class", "name": "Item" } }],
                "methods": [{
                    "name": "add",
                    "subsignature": "add(LItem;)V",
                    "has_this": true,
                    "return_type": { "kind": "Other" },
                    "vars": [{ "name": "p", "type": { "kind": "Class", "name": "Item" } }],
                    "params": ["p"],
                    "stmts": [
                        { "kind": "StoreField", "base": "this", "class": "List", "field": "contents", "rhs": "p" },
                        { "kind": "Return", "var": null }
                    ]
                }]
            },
            {
                "name": "Factory",
                "methods": [{
                    "name": "mk",
                    "subsignature": "mk()LList;",
                    "is_static": true,
                    "return_type": { "kind": "Class", "name": "List" },
                    "vars": [{ "name": "l", "type": { "kind": "Class", "name": "List" } }],
                    "stmts": [
                        { "kind": "Assign", "lhs": "l", "rhs": { "kind": "NewObject", "class": "List" } },
                        { "kind": "Return", "var": "l" }
                    ]
                }]
            },
            {
                "name": "Main",
                "methods": [{
                    "name": "main",
                    "subsignature": "main()V",
                    "is_static": true,
                    "return_type": { "kind": "Other" },
                    "vars": [
                        { "name": "o1", "type": { "kind": "Class", "name": "Item" } },
                        { "name": "o2", "type": { "kind": "Class", "name": "Item" } },
                        { "name": "l1", "type": { "kind": "Class", "name": "List" } },
                        { "name": "l2", "type": { "kind": "Class", "name": "List" } },
                        { "name": "r1", "type": { "kind": "Class", "name": "Item" } },
                        { "name": "r2", "type": { "kind": "Class", "name": "Item" } }
                    ],
                    "stmts": [
                        { "kind": "Assign", "lhs": "o1", "rhs": { "kind": "NewObject", "class": "Item" } },
                        { "kind": "Assign", "lhs": "o2", "rhs": { "kind": "NewObject", "class": "Item" } },
                        {
                            "kind": "Invoke", "call_kind": "static", "declaring_class": "Factory",
                            "subsignature": "mk()LList;", "args": [], "dest": "l1"
                        },
                        {
                            "kind": "Invoke", "call_kind": "static", "declaring_class": "Factory",
                            "subsignature": "mk()LList;", "args": [], "dest": "l2"
                        },
                        {
                            "kind": "Invoke", "call_kind": "virtual", "declaring_class": "List",
                            "subsignature": "add(LItem;)V", "receiver": "l1", "args": ["o1"], "dest": null
                        },
                        {
                            "kind": "Invoke", "call_kind": "virtual", "declaring_class": "List",
                            "subsignature": "add(LItem;)V", "receiver": "l2", "args": ["o2"], "dest": null
                        },
                        { "kind": "LoadField", "lhs": "r1", "base": "l1", "class": "List", "field": "contents" },
                        { "kind": "LoadField", "lhs": "r2", "base": "l2", "class": "List", "field": "contents" },
                        { "kind": "Return", "var": null }
                    ]
                }]
            }
        ]
    }"#
}

#[test]
fn context_insensitive_run_merges_the_two_factory_lists() {
    let program = Program::load_json(factory_program_json()).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let result = pta::run(&program, entry, PTAType::Andersen, ContextKind::CallString, 0);
    let ctx = result.ctx_cache.empty();

    let r1 = pts(&program, &result, ctx, entry, "r1");
    let r2 = pts(&program, &result, ctx, entry, "r2");
    let o1 = pts(&program, &result, ctx, entry, "o1");
    let o2 = pts(&program, &result, ctx, entry, "o2");

    // Both `mk()` calls allocate under the same (empty) context, so they
    // collapse to a single abstract `List` object and its `contents` field
    // sees both `o1` and `o2`.
    assert!(r1.contains(&o1[0]));
    assert!(r1.contains(&o2[0]));
    assert_eq!(r1, r2);
}

#[test]
fn one_call_string_sensitive_run_keeps_the_two_factory_lists_disjoint() {
    let program = Program::load_json(factory_program_json()).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let result = pta::run(&program, entry, PTAType::ContextSensitive, ContextKind::CallString, 1);
    let ctx = result.ctx_cache.empty();

    let r1 = pts(&program, &result, ctx, entry, "r1");
    let r2 = pts(&program, &result, ctx, entry, "r2");
    let o1 = pts(&program, &result, ctx, entry, "o1");
    let o2 = pts(&program, &result, ctx, entry, "o2");

    // The two `mk()` calls sit at distinct call sites, so 1-call-string
    // sensitivity runs `mk()` under two distinct contexts and allocates two
    // distinct `List` objects, keeping their `contents` fields disjoint.
    assert_eq!(r1, o1);
    assert_eq!(r2, o2);
    assert!(r1.iter().all(|o| !r2.contains(o)));
}

/// Unlike `factory_program_json`, `mk()` here is an instance method
/// dispatched on a per-call `Factory` receiver, since `ObjectSelector`
/// (src/pta/context_selector.rs) chains context through the receiver
/// object and falls back to the caller's own context for receiverless
/// (static) calls — a static `Factory.mk()` would run under the same
/// context both times and give object-sensitivity nothing to split on.
fn factory_program_with_receiver_json() -> &'static str {
    r#"{
        "classes": [
            { "name": "Item" },
            {
                "name": "List",
                "fields": [{ "name": "contents", "type": { "kind": "Class", "name": "Item" } }],
                "methods": [{
                    "name": "add",
                    "subsignature": "add(LItem;)V",
                    "has_this": true,
                    "return_type": { "kind": "Other" },
                    "vars": [{ "name": "p", "type": { "kind": "Class", "name": "Item" } }],
                    "params": ["p"],
                    "stmts": [
                        { "kind": "StoreField", "base": "this", "class": "List", "field": "contents", "rhs": "p" },
                        { "kind": "Return", "var": null }
                    ]
                }]
            },
            {
                "name": "Factory",
                "methods": [{
                    "name": "mk",
                    "subsignature": "mk()LList;",
                    "has_this": true,
                    "return_type": { "kind": "Class", "name": "List" },
                    "vars": [{ "name": "l", "type": { "kind": "Class", "name": "List" } }],
                    "stmts": [
                        { "kind": "Assign", "lhs": "l", "rhs": { "kind": "NewObject", "class": "List" } },
                        { "kind": "Return", "var": "l" }
                    ]
                }]
            },
            {
                "name": "Main",
                "methods": [{
                    "name": "main",
                    "subsignature": "main()V",
                    "is_static": true,
                    "return_type": { "kind": "Other" },
                    "vars": [
                        { "name": "f1", "type": { "kind": "Class", "name": "Factory" } },
                        { "name": "f2", "type": { "kind": "Class", "name": "Factory" } },
                        { "name": "o1", "type": { "kind": "Class", "name": "Item" } },
                        { "name": "o2", "type": { "kind": "Class", "name": "Item" } },
                        { "name": "l1", "type": { "kind": "Class", "name": "List" } },
                        { "name": "l2", "type": { "kind": "Class", "name": "List" } },
                        { "name": "r1", "type": { "kind": "Class", "name": "Item" } },
                        { "name": "r2", "type": { "kind": "Class", "name": "Item" } }
                    ],
                    "stmts": [
                        { "kind": "Assign", "lhs": "f1", "rhs": { "kind": "NewObject", "class": "Factory" } },
                        { "kind": "Assign", "lhs": "f2", "rhs": { "kind": "NewObject", "class": "Factory" } },
                        { "kind": "Assign", "lhs": "o1", "rhs": { "kind": "NewObject", "class": "Item" } },
                        { "kind": "Assign", "lhs": "o2", "rhs": { "kind": "NewObject", "class": "Item" } },
                        {
                            "kind": "Invoke", "call_kind": "virtual", "declaring_class": "Factory",
                            "subsignature": "mk()LList;", "receiver": "f1", "args": [], "dest": "l1"
                        },
                        {
                            "kind": "Invoke", "call_kind": "virtual", "declaring_class": "Factory",
                            "subsignature": "mk()LList;", "receiver": "f2", "args": [], "dest": "l2"
                        },
                        {
                            "kind": "Invoke", "call_kind": "virtual", "declaring_class": "List",
                            "subsignature": "add(LItem;)V", "receiver": "l1", "args": ["o1"], "dest": null
                        },
                        {
                            "kind": "Invoke", "call_kind": "virtual", "declaring_class": "List",
                            "subsignature": "add(LItem;)V", "receiver": "l2", "args": ["o2"], "dest": null
                        },
                        { "kind": "LoadField", "lhs": "r1", "base": "l1", "class": "List", "field": "contents" },
                        { "kind": "LoadField", "lhs": "r2", "base": "l2", "class": "List", "field": "contents" },
                        { "kind": "Return", "var": null }
                    ]
                }]
            }
        ]
    }"#
}

#[test]
fn zero_object_sensitive_run_still_merges_the_two_factory_lists() {
    let program = Program::load_json(factory_program_with_receiver_json()).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let result = pta::run(&program, entry, PTAType::ContextSensitive, ContextKind::Object, 0);
    let ctx = result.ctx_cache.empty();

    let r1 = pts(&program, &result, ctx, entry, "r1");
    let r2 = pts(&program, &result, ctx, entry, "r2");

    // k = 0 collapses every call context to the empty one regardless of
    // receiver, same as Andersen.
    assert_eq!(r1, r2);
}

#[test]
fn one_object_sensitive_run_keeps_the_two_factory_lists_disjoint() {
    let program = Program::load_json(factory_program_with_receiver_json()).unwrap();
    let entry = program.entry_method("main()V").unwrap();
    let result = pta::run(&program, entry, PTAType::ContextSensitive, ContextKind::Object, 1);
    let ctx = result.ctx_cache.empty();

    let r1 = pts(&program, &result, ctx, entry, "r1");
    let r2 = pts(&program, &result, ctx, entry, "r2");
    let o1 = pts(&program, &result, ctx, entry, "o1");
    let o2 = pts(&program, &result, ctx, entry, "o2");

    // `f1` and `f2` are distinct `Factory` objects, so `mk()` runs under two
    // distinct 1-object contexts (chained through each receiver) and
    // allocates two distinct `List` objects.
    assert_eq!(r1, o1);
    assert_eq!(r2, o2);
    assert!(r1.iter().all(|o| !r2.contains(o)));
}
