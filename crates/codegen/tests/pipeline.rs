//! End-to-end tests of the backend pipeline.
#![allow(unused_crate_dependencies)]

use jmmc_ast::{Ast, NodeKind, build::*};
use jmmc_codegen::{
    ConstantFolder, InterferenceGraph, Liveness, compile, compile_until, jasmin::JasminInst,
};
use jmmc_config::{CompilerConfig, RegisterAllocation, Stage};
use jmmc_data_structures::map::FxHashMap;
use jmmc_interface::diagnostics::{DiagCtxt, Level};
use serde_json::json;
use snapbox::{assert_data_eq, str};
use std::num::NonZeroU32;

fn config(optimize: bool, registers: i64) -> CompilerConfig {
    CompilerConfig {
        optimize,
        register_allocation: RegisterAllocation::from_raw(registers).unwrap(),
    }
}

fn single_method(method: MethodBuilder) -> Ast {
    AstBuilder::new().class(ClassBuilder::new("Main").method(method)).build().unwrap()
}

fn first_method_stmts(ast: &Ast) -> Vec<String> {
    let method = ast.methods().unwrap()[0];
    ast.stmts(method).iter().map(|&s| ast.to_tree_string(s).trim_end().to_string()).collect()
}

#[test]
fn test_fold_nested_arithmetic() {
    let ast = json!({
        "kind": "Program",
        "children": [{
            "kind": "ClassDecl",
            "attrs": { "name": "Main" },
            "children": [{
                "kind": "MethodDecl",
                "attrs": { "name": "f", "isPublic": true, "isStatic": false },
                "children": [
                    { "kind": "Type", "attrs": { "name": "int", "isArray": false, "isVararg": false } },
                    { "kind": "ReturnStmt", "children": [{
                        "kind": "BinaryExpr",
                        "attrs": { "op": "+" },
                        "children": [
                            { "kind": "IntLiteral", "attrs": { "value": 2 } },
                            { "kind": "BinaryExpr", "attrs": { "op": "*" }, "children": [
                                { "kind": "IntLiteral", "attrs": { "value": 3 } },
                                { "kind": "IntLiteral", "attrs": { "value": 4 } }
                            ] }
                        ]
                    }] }
                ]
            }]
        }]
    });
    let mut ast = Ast::from_json(&ast.to_string()).unwrap();

    let mut folder = ConstantFolder::new(&mut ast);
    assert!(folder.run().unwrap());
    assert_eq!(first_method_stmts(&ast), ["ReturnStmt\n  IntLiteral value=14"]);

    // A second run over folded output finds nothing.
    assert!(!ConstantFolder::new(&mut ast).run().unwrap());
}

#[test]
fn test_propagation_removes_dead_copies() {
    let mut ast = single_method(
        MethodBuilder::new("f", ty("int"))
            .public()
            .local("x", ty("int"))
            .local("y", ty("int"))
            .stmt(assign("x", int(5)))
            .stmt(assign("y", var("x")))
            .stmt(ret(var("y"))),
    );
    let dcx = DiagCtxt::with_silent_emitter();
    let artifacts = compile(&mut ast, &config(true, -1), &dcx).unwrap();

    assert_eq!(first_method_stmts(&ast), ["ReturnStmt\n  IntLiteral value=5"]);
    let stats = artifacts.opt_stats.unwrap();
    assert_eq!(stats.removed, 2);
    assert!(artifacts.jasmin.unwrap().contains("iconst_5\n   ireturn\n"));
}

#[test]
fn test_join_invalidates_bindings() {
    let mut ast = single_method(
        MethodBuilder::new("f", ty("int"))
            .public()
            .param("c", ty("boolean"))
            .local("x", ty("int"))
            .stmt(if_(var("c"), block([assign("x", int(1))]), block([assign("x", int(2))])))
            .stmt(ret(var("x"))),
    );
    let dcx = DiagCtxt::with_silent_emitter();
    compile_until(&mut ast, &config(true, -1), Some(Stage::Optimization), &dcx).unwrap();

    let method = ast.methods().unwrap()[0];
    let stmts = ast.stmts(method);
    let returned = ast.child(*stmts.last().unwrap(), 0).unwrap();
    assert_eq!(ast.kind(returned), NodeKind::VarRef);
    assert_eq!(ast.name(returned).unwrap(), "x");
}

#[test]
fn test_register_budget_shortfall() {
    let mut ast = AstBuilder::new()
        .class(
            ClassBuilder::new("Main")
                .method(MethodBuilder::new("g", ty("void")).public().stmt(ret_void()))
                .method(
                    MethodBuilder::new("f", ty("int"))
                        .public()
                        .local("a", ty("int"))
                        .local("b", ty("int"))
                        .stmt(assign("a", int(1)))
                        .stmt(assign("b", int(2)))
                        .stmt(expr_stmt(call(this(), "g", [])))
                        .stmt(ret(bin("+", var("a"), var("b")))),
                ),
        )
        .build()
        .unwrap();
    let (dcx, buf) = DiagCtxt::with_buffer_emitter();
    let artifacts = compile(&mut ast, &config(false, 1), &dcx).unwrap();
    assert!(dcx.has_errors().is_err());

    let diags = buf.read();
    let errors: Vec<_> = diags.iter().filter(|d| d.level() == Level::Error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].msg, "method `f` needs 2 registers but only 1 is available");
    assert_eq!(errors[0].stage, Some(Stage::Allocation));

    let f = artifacts.allocation.iter().find(|r| r.method == "f").unwrap();
    assert_eq!(f.colors, 2);
    assert_eq!(f.budget, Some(1));
    assert!(!f.applied);
    assert!(artifacts.allocation.iter().find(|r| r.method == "g").unwrap().applied);
}

#[test]
fn test_budget_of_two_fits() {
    let mut ast = single_method(
        MethodBuilder::new("f", ty("int"))
            .public()
            .local("a", ty("int"))
            .local("b", ty("int"))
            .stmt(assign("a", int(1)))
            .stmt(assign("b", int(2)))
            .stmt(ret(bin("+", var("a"), var("b")))),
    );
    let dcx = DiagCtxt::with_silent_emitter();
    let config = CompilerConfig {
        optimize: false,
        register_allocation: RegisterAllocation::Bounded(NonZeroU32::new(2).unwrap()),
    };
    let artifacts = compile(&mut ast, &config, &dcx).unwrap();
    assert_eq!(dcx.err_count(), 0);
    assert!(artifacts.jasmin.unwrap().contains(".limit locals 3\n"));
}

#[test]
fn test_non_overlapping_locals_share_a_register() {
    let mut ast = single_method(
        MethodBuilder::new("f", ty("int"))
            .public()
            .param("a", ty("int"))
            .local("x", ty("int"))
            .local("y", ty("int"))
            .stmt(assign("x", bin("+", var("a"), int(1))))
            .stmt(assign("y", bin("*", var("x"), int(2))))
            .stmt(ret(var("y"))),
    );
    let (dcx, buf) = DiagCtxt::with_buffer_emitter();
    let artifacts = compile(&mut ast, &config(false, 0), &dcx).unwrap();
    assert_eq!(buf.read()[0].msg, "method `f` uses 1 local register");
    assert_data_eq!(
        artifacts.jasmin.unwrap().trim_end(),
        str![[r#"
.class public Main
.super java/lang/Object

.method public <init>()V
   aload_0
   invokespecial java/lang/Object/<init>()V
   return
.end method

.method public f(I)I
   .limit stack 2
   .limit locals 3
   iload_1
   iconst_1
   iadd
   istore_2
   iload_2
   iconst_2
   imul
   istore_2
   iload_2
   ireturn
.end method"#]]
    );
}

#[test]
fn test_constant_encodings() {
    let constant = |name: &str, value: i32| {
        MethodBuilder::new(name, ty("int")).public().stmt(ret(int(value)))
    };
    let mut ast = AstBuilder::new()
        .class(
            ClassBuilder::new("Main")
                .method(constant("tiny", -1))
                .method(constant("byte", 100))
                .method(constant("short", 200))
                .method(constant("wide", 40000)),
        )
        .build()
        .unwrap();
    let dcx = DiagCtxt::with_silent_emitter();
    let jasmin = compile(&mut ast, &config(false, -1), &dcx).unwrap().jasmin.unwrap();
    for expected in ["iconst_m1", "bipush 100", "sipush 200", "ldc 40000"] {
        assert!(jasmin.contains(&format!("   {expected}\n")), "missing `{expected}` in:\n{jasmin}");
    }

    assert_eq!(JasminInst::Const(127).to_string(), "bipush 127");
    assert_eq!(JasminInst::Const(-129).to_string(), "sipush -129");
    assert_eq!(JasminInst::Const(32768).to_string(), "ldc 32768");
}

#[test]
fn test_config_map_drives_pipeline() {
    let entries = [("optimize", "true"), ("registerAllocation", "0"), ("debug", "x")];
    let config = CompilerConfig::from_map(entries).unwrap();
    let mut ast = single_method(
        MethodBuilder::new("f", ty("int"))
            .public()
            .local("x", ty("int"))
            .stmt(assign("x", bin("*", int(6), int(7))))
            .stmt(ret(var("x"))),
    );
    let (dcx, buf) = DiagCtxt::with_buffer_emitter();
    let artifacts = compile(&mut ast, &config, &dcx).unwrap();
    assert!(artifacts.opt_stats.is_some());
    assert_eq!(artifacts.allocation.len(), 1);
    assert!(buf.read().iter().any(|d| d.level() == Level::Note));
    assert!(artifacts.jasmin.unwrap().contains("bipush 42\n   ireturn\n"));
}

#[test]
fn test_stop_after_generation() {
    let mut ast = single_method(MethodBuilder::new("f", ty("int")).public().stmt(ret(int(1))));
    let dcx = DiagCtxt::with_silent_emitter();
    let artifacts =
        compile_until(&mut ast, &config(false, 0), Some(Stage::Generation), &dcx).unwrap();
    assert!(artifacts.unit.is_some());
    assert!(artifacts.allocation.is_empty());
    assert!(artifacts.jasmin.is_none());
}

#[test]
fn test_chained_call_on_imported_result() {
    let mut ast = AstBuilder::new()
        .import("Foo")
        .class(
            ClassBuilder::new("Main").method(
                MethodBuilder::new("f", ty("void"))
                    .public()
                    .local("x", ty("Foo"))
                    .stmt(assign("x", new_object("Foo")))
                    .stmt(expr_stmt(call(call(var("x"), "self_", []), "bar", []))),
            ),
        )
        .build()
        .unwrap();
    let (dcx, buf) = DiagCtxt::with_buffer_emitter();
    let artifacts = compile(&mut ast, &config(false, -1), &dcx).unwrap();
    assert!(buf.read().is_empty());

    let ir = artifacts.unit.unwrap().to_string();
    assert!(ir.contains("invokevirtual(x.Foo, \"self_\").Foo;"), "{ir}");
    assert!(ir.contains(".Foo, \"bar\").V;"), "{ir}");
    let jasmin = artifacts.jasmin.unwrap();
    assert!(jasmin.contains("invokevirtual Foo/self_()LFoo;\n"), "{jasmin}");
    assert!(jasmin.contains("invokevirtual Foo/bar()V\n"), "{jasmin}");
}

#[test]
fn test_chained_call_on_static_result() {
    let mut ast = AstBuilder::new()
        .import("io.Factory")
        .class(
            ClassBuilder::new("Main").method(
                MethodBuilder::new("f", ty("void"))
                    .public()
                    .stmt(expr_stmt(call(call(var("Factory"), "make", []), "run", []))),
            ),
        )
        .build()
        .unwrap();
    let dcx = DiagCtxt::with_silent_emitter();
    let jasmin = compile(&mut ast, &config(false, -1), &dcx).unwrap().jasmin.unwrap();
    assert!(jasmin.contains("invokestatic io/Factory/make()Lio/Factory;\n"), "{jasmin}");
    assert!(jasmin.contains("invokevirtual io/Factory/run()V\n"), "{jasmin}");
}

/// A class that touches most lowering paths: fields, arrays, loops, short-circuit logic, calls
/// and object creation.
fn kitchen_sink() -> Ast {
    AstBuilder::new()
        .import("io")
        .class(
            ClassBuilder::new("Sink")
                .field("total", ty("int"))
                .method(
                    MethodBuilder::new("sum", ty("int"))
                        .public()
                        .param("xs", array_ty("int"))
                        .local("i", ty("int"))
                        .local("acc", ty("int"))
                        .local("done", ty("boolean"))
                        .stmt(assign("i", int(0)))
                        .stmt(assign("acc", int(0)))
                        .stmt(assign("done", bool_lit(false)))
                        .stmt(while_(
                            and(cmp("<", var("i"), length(var("xs"))), not(var("done"))),
                            block([
                                assign("acc", bin("+", var("acc"), index(var("xs"), var("i")))),
                                if_(
                                    or(
                                        cmp(">", var("acc"), int(1000)),
                                        cmp("==", var("i"), int(9)),
                                    ),
                                    block([assign("done", bool_lit(true))]),
                                    block([]),
                                ),
                                assign("i", bin("+", var("i"), int(1))),
                            ]),
                        ))
                        .stmt(assign("total", var("acc")))
                        .stmt(ret(bin("*", var("acc"), bin("-", var("total"), var("i"))))),
                )
                .method(
                    MethodBuilder::new("main", ty("void"))
                        .public()
                        .static_()
                        .param("args", array_ty("String"))
                        .local("s", ty("Sink"))
                        .local("arr", array_ty("int"))
                        .local("k", ty("int"))
                        .stmt(assign("s", new_object("Sink")))
                        .stmt(assign("arr", new_array(int(4))))
                        .stmt(assign("k", int(0)))
                        .stmt(while_(
                            cmp("<", var("k"), length(var("arr"))),
                            block([
                                array_assign("arr", var("k"), bin("*", var("k"), var("k"))),
                                assign("k", bin("+", var("k"), int(1))),
                            ]),
                        ))
                        .stmt(expr_stmt(call(
                            var("io"),
                            "println",
                            [call(var("s"), "sum", [var("arr")])],
                        )))
                        .stmt(ret_void()),
                ),
        )
        .build()
        .unwrap()
}

#[test]
fn test_liveness_use_def_properties() {
    let mut ast = kitchen_sink();
    let dcx = DiagCtxt::with_silent_emitter();
    let unit = compile(&mut ast, &config(false, -1), &dcx).unwrap().unit.unwrap();
    for method in &unit.methods {
        let liveness = Liveness::compute(method).unwrap();
        for inst in liveness.insts() {
            let live_in = liveness.live_in(inst);
            assert!(
                liveness.uses(inst).is_subset(live_in),
                "{}: use not live at {inst:?}",
                method.name
            );
            if let Some(def) = liveness.def(inst) {
                assert!(
                    !live_in.contains(def) || liveness.uses(inst).contains(def),
                    "{}: def live into its own definition at {inst:?}",
                    method.name
                );
            }
        }
    }
}

#[test]
fn test_coloring_is_proper() {
    let mut ast = kitchen_sink();
    let dcx = DiagCtxt::with_silent_emitter();
    let unit = compile(&mut ast, &config(false, -1), &dcx).unwrap().unit.unwrap();
    for method in &unit.methods {
        let liveness = Liveness::compute(method).unwrap();
        for budget in [None, Some(1), Some(3)] {
            let mut graph = InterferenceGraph::build(method, &liveness);
            let used = graph.color(budget);
            assert_eq!(used, graph.colors_used());
            for a in graph.nodes() {
                for b in graph.neighbors(a) {
                    let (ca, cb) = (graph.color_of(a), graph.color_of(b));
                    assert_ne!(ca, cb, "{}: {a:?} {b:?}", method.name);
                }
            }
            assert!(graph.is_properly_colored());
        }
    }
}

#[test]
fn test_stack_limit_covers_simulated_depth() {
    for registers in [-1, 0] {
        let mut ast = kitchen_sink();
        let dcx = DiagCtxt::with_silent_emitter();
        let jasmin = compile(&mut ast, &config(false, registers), &dcx).unwrap().jasmin.unwrap();

        let mut methods = 0;
        for body in jasmin.split(".method ").skip(1) {
            let (declared, simulated) = simulate(body);
            assert!(declared >= simulated, "limit {declared} < depth {simulated} in:\n{body}");
            methods += 1;
        }
        assert_eq!(methods, 3);
    }
}

/// Replays a method body on an abstract operand stack. Returns the declared limit and the
/// deepest height reached.
fn simulate(body: &str) -> (i64, i64) {
    let mut declared = i64::MAX;
    let mut depth = 0i64;
    let mut max = 0i64;
    let mut reachable = true;
    let mut at_label: FxHashMap<&str, i64> = FxHashMap::default();

    for line in body.lines().skip(1).map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(limit) = line.strip_prefix(".limit stack ") {
            declared = limit.parse().unwrap();
            continue;
        }
        if line.starts_with(".limit") || line == ".end method" {
            continue;
        }
        if let Some(label) = line.strip_suffix(':') {
            if !reachable {
                depth = at_label.get(label).copied().unwrap_or(0);
            }
            reachable = true;
            continue;
        }
        assert!(reachable, "unreachable instruction `{line}`");

        let (mnemonic, operand) = line.split_once(' ').unwrap_or((line, ""));
        let (pops, pushes) = match mnemonic {
            "iconst_m1" | "bipush" | "sipush" | "ldc" | "new" => (0, 1),
            m if m.starts_with("iconst_") => (0, 1),
            m if m.starts_with("iload") || m.starts_with("aload") => (0, 1),
            m if m.starts_with("istore") || m.starts_with("astore") => (1, 0),
            "iadd" | "isub" | "imul" | "idiv" | "ixor" | "iaload" => (2, 1),
            "iastore" => (3, 0),
            "arraylength" | "getfield" | "newarray" => (1, 1),
            "putfield" => (2, 0),
            "dup" => (1, 2),
            "pop" | "ireturn" | "areturn" => (1, 0),
            "return" | "iinc" | "goto" => (0, 0),
            m if m.starts_with("if") => (1, 0),
            "invokevirtual" | "invokespecial" | "invokestatic" => {
                let (params, returns) = descriptor_shape(operand);
                let receiver = i64::from(mnemonic != "invokestatic");
                (params + receiver, i64::from(returns))
            }
            other => panic!("unexpected instruction `{other}`"),
        };
        depth -= pops;
        assert!(depth >= 0, "stack underflow at `{line}`");
        depth += pushes;
        max = max.max(depth);

        if mnemonic == "goto" || mnemonic.starts_with("if") {
            at_label.insert(operand, depth);
        }
        if matches!(mnemonic, "goto" | "return" | "ireturn" | "areturn") {
            reachable = false;
        }
    }
    (declared, max)
}

/// Returns the parameter count of `owner/name(params)ret` and whether it returns a value.
fn descriptor_shape(target: &str) -> (i64, bool) {
    let (params, ret) = target.split_once('(').unwrap().1.split_once(')').unwrap();
    let mut count = 0;
    let mut chars = params.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => continue,
            'L' => {
                chars.by_ref().find(|&c| c == ';');
                count += 1;
            }
            _ => count += 1,
        }
    }
    (count, ret != "V")
}
