#![cfg(test)]

use crate::settings::Config;
use crate::ssa_analysis::error_tracer::tests::test_support::{
    PACKAGE, alloc, call, closure, errors_new, external_function, function, function_ref, load,
    make_closure, opaque, ret, rendered, store, trace,
};
use crate::ssa_analysis::error_tracer::{Origin, TraceContext, trace_function};
use crate::ssa_analysis::ssa::ssa_builder::{SsaBuilder, ValueSpec};
use crate::ssa_analysis::ssa::ssa_loader::load_program_from_str;
use crate::ssa_analysis::ssa::ssa_nodes::ValueKind;
use crate::ssa_analysis::string_interning::StringTable;

#[test]
fn deferred_assignment_to_named_result_is_reported() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");

    // func deferReturn() (err error) {
    //     defer func() { err = errors.New("deferred") }()
    //     return
    // }
    let outer = function(&mut builder, "deferReturn", 60);
    let deferred = closure(&mut builder, "deferReturn$1", 61, outer);

    let err = alloc(&mut builder, outer, "err");
    let target = function_ref(&mut builder, deferred, "a.deferReturn$1");
    let bound = make_closure(&mut builder, outer, target, &[err]);
    opaque(&mut builder, outer, "defer", &[bound]);
    let result = load(&mut builder, outer, err, true, None);
    ret(&mut builder, outer, &[result], 62);

    let captured = builder.add_free_var(deferred, "err", None);
    let created = errors_new(&mut builder, deferred, new, "deferred", (61, 23));
    store(&mut builder, deferred, captured, created);
    ret(&mut builder, deferred, &[], 61);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(
        rendered(&report),
        vec!["func deferReturn #0: [modified by [deferReturn$1]]"]
    );
    assert_eq!(report.stats.closures_indexed, 1);
}

#[test]
fn lambda_overwriting_a_local_is_listed_after_the_stores() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");
    let nil_and_errors_new = external_function(&mut builder, "a.nilAndErrorsNew");

    // func modifiedByLambda() error {
    //     err := nilAndErrorsNew()
    //     func() { err = errors.New("lambda") }()
    //     return err
    // }
    let outer = function(&mut builder, "modifiedByLambda", 70);
    let lambda = closure(&mut builder, "modifiedByLambda$1", 72, outer);

    let err = alloc(&mut builder, outer, "err");
    let initial = call(&mut builder, outer, "t0", nil_and_errors_new, &[], (71, 23));
    store(&mut builder, outer, err, initial);
    let target = function_ref(&mut builder, lambda, "a.modifiedByLambda$1");
    let bound = make_closure(&mut builder, outer, target, &[err]);
    builder.add_instruction(outer, ValueSpec::new(ValueKind::Call, "t2").operands([bound]));
    let result = load(&mut builder, outer, err, true, Some((73, 9)));
    ret(&mut builder, outer, &[result], 73);

    let captured = builder.add_free_var(lambda, "err", None);
    let created = errors_new(&mut builder, lambda, new, "lambda", (72, 23));
    store(&mut builder, lambda, captured, created);
    ret(&mut builder, lambda, &[], 72);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(
        rendered(&report),
        vec!["func modifiedByLambda #0: [nilAndErrorsNew#0(), modified by [modifiedByLambda$1]]"]
    );
}

#[test]
fn closure_reading_a_captured_variable_sees_the_enclosing_stores() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");

    // func outer() error {
    //     err := errors.New("outer")
    //     f := func() error { return err }
    //     return f()
    // }
    let outer = function(&mut builder, "outer", 80);
    let reader = closure(&mut builder, "outer$1", 82, outer);

    let err = alloc(&mut builder, outer, "err");
    let created = errors_new(&mut builder, outer, new, "outer", (81, 9));
    store(&mut builder, outer, err, created);
    let target = function_ref(&mut builder, reader, "a.outer$1");
    let bound = make_closure(&mut builder, outer, target, &[err]);
    let called = call(&mut builder, outer, "t3", bound, &[], (83, 10));
    ret(&mut builder, outer, &[called], 83);

    let captured = builder.add_free_var(reader, "err", None);
    let value = load(&mut builder, reader, captured, true, Some((82, 29)));
    ret(&mut builder, reader, &[value], 82);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(
        rendered(&report),
        vec![
            "func outer #0: [outer$1#0()]",
            r#"func outer$1 #0: [errors.New#0("outer")]"#,
        ]
    );
}

#[test]
fn captured_variables_resolve_through_nested_closures() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");

    // func deep() error {
    //     err := errors.New("deep")
    //     return func() error {
    //         return func() error { return err }()
    //     }()
    // }
    let deep = function(&mut builder, "deep", 240);
    let middle = closure(&mut builder, "deep$1", 242, deep);
    let inner = closure(&mut builder, "deep$1$1", 243, middle);

    let err = alloc(&mut builder, deep, "err");
    let created = errors_new(&mut builder, deep, new, "deep", (241, 9));
    store(&mut builder, deep, err, created);
    let middle_ref = function_ref(&mut builder, middle, "a.deep$1");
    let middle_closure = make_closure(&mut builder, deep, middle_ref, &[err]);
    let middle_call = call(&mut builder, deep, "t3", middle_closure, &[], (244, 3));
    ret(&mut builder, deep, &[middle_call], 242);

    let middle_err = builder.add_free_var(middle, "err", None);
    let inner_ref = function_ref(&mut builder, inner, "a.deep$1$1");
    let inner_closure = make_closure(&mut builder, middle, inner_ref, &[middle_err]);
    let inner_call = call(&mut builder, middle, "t1", inner_closure, &[], (243, 38));
    ret(&mut builder, middle, &[inner_call], 243);

    let inner_err = builder.add_free_var(inner, "err", None);
    let value = load(&mut builder, inner, inner_err, true, Some((243, 32)));
    ret(&mut builder, inner, &[value], 243);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(
        rendered(&report),
        vec![
            "func deep #0: [deep$1#0()]",
            "func deep$1 #0: [deep$1$1#0()]",
            r#"func deep$1$1 #0: [errors.New#0("deep")]"#,
        ]
    );
    assert_eq!(report.stats.closures_indexed, 2);
}

#[test]
fn assignment_two_closures_deep_names_the_outermost_closure() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");

    // func nested() (err error) {
    //     func() {
    //         func() { err = errors.New("nested") }()
    //     }()
    //     return
    // }
    let nested = function(&mut builder, "nested", 250);
    let middle = closure(&mut builder, "nested$1", 251, nested);
    let inner = closure(&mut builder, "nested$1$1", 252, middle);

    let err = alloc(&mut builder, nested, "err");
    let middle_ref = function_ref(&mut builder, middle, "a.nested$1");
    let middle_closure = make_closure(&mut builder, nested, middle_ref, &[err]);
    builder.add_instruction(nested, ValueSpec::new(ValueKind::Call, "t1").operands([middle_closure]));
    let result = load(&mut builder, nested, err, true, None);
    ret(&mut builder, nested, &[result], 254);

    let middle_err = builder.add_free_var(middle, "err", None);
    let inner_ref = function_ref(&mut builder, inner, "a.nested$1$1");
    let inner_closure = make_closure(&mut builder, middle, inner_ref, &[middle_err]);
    builder.add_instruction(middle, ValueSpec::new(ValueKind::Call, "t1").operands([inner_closure]));
    ret(&mut builder, middle, &[], 253);

    let inner_err = builder.add_free_var(inner, "err", None);
    let created = errors_new(&mut builder, inner, new, "nested", (252, 24));
    store(&mut builder, inner, inner_err, created);
    ret(&mut builder, inner, &[], 252);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(rendered(&report), vec!["func nested #0: [modified by [nested$1]]"]);
}

#[test]
fn closure_traced_before_its_creation_site_is_unknown() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");

    let outer = function(&mut builder, "outer", 80);
    let reader = closure(&mut builder, "outer$1", 82, outer);

    let err = alloc(&mut builder, outer, "err");
    let created = errors_new(&mut builder, outer, new, "outer", (81, 9));
    store(&mut builder, outer, err, created);
    let target = function_ref(&mut builder, reader, "a.outer$1");
    let bound = make_closure(&mut builder, outer, target, &[err]);
    let called = call(&mut builder, outer, "t3", bound, &[], (83, 10));
    ret(&mut builder, outer, &[called], 83);

    let captured = builder.add_free_var(reader, "err", None);
    let value = load(&mut builder, reader, captured, true, Some((82, 29)));
    ret(&mut builder, reader, &[value], 82);

    let program = builder.finish().expect("program should build");
    let config = Config::default();

    // Nothing has recorded the `MakeClosure` in `outer` yet
    let mut context = TraceContext::new();
    let before = trace_function(&program, &string_table, &mut context, &config, reader);
    assert_eq!(before.slot(0), &[Origin::Unknown]);
    assert!(context.closures.is_empty());

    // Tracing the creator records the binding for later traces
    let mut context = TraceContext::new();
    trace_function(&program, &string_table, &mut context, &config, outer);
    assert_eq!(context.closures.bindings(reader), Some(&[err][..]));

    let after = trace_function(&program, &string_table, &mut context, &config, reader);
    assert_eq!(after.to_string(), r#"func outer$1 #0: [errors.New#0("outer")]"#);
}

#[test]
fn closure_binding_its_own_free_variable_terminates() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);

    // The closure re-creates itself with its captured `err` as the binding, so
    // following the binding leads straight back to the same free variable
    let looping = function(&mut builder, "f$1", 300);
    let captured = builder.add_free_var(looping, "err", None);
    let target = function_ref(&mut builder, looping, "a.f$1");
    make_closure(&mut builder, looping, target, &[captured]);
    let value = load(&mut builder, looping, captured, true, Some((301, 9)));
    ret(&mut builder, looping, &[value], 301);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(rendered(&report), vec!["func f$1 #0: [Unknown]"]);
}

#[test]
fn closure_recapturing_itself_is_not_named_as_a_writer() {
    let mut string_table = StringTable::new();
    let mut builder = SsaBuilder::new(PACKAGE, &mut string_table);
    let new = external_function(&mut builder, "errors.New");

    let outer = function(&mut builder, "recapture", 310);
    let inner = closure(&mut builder, "recapture$1", 312, outer);

    let err = alloc(&mut builder, outer, "err");
    let created = errors_new(&mut builder, outer, new, "outer", (311, 9));
    store(&mut builder, outer, err, created);
    let target = function_ref(&mut builder, inner, "a.recapture$1");
    let bound = make_closure(&mut builder, outer, target, &[err]);
    opaque(&mut builder, outer, "go", &[bound]);
    let result = load(&mut builder, outer, err, true, Some((314, 9)));
    ret(&mut builder, outer, &[result], 314);

    // Captures its own `err` again without ever assigning it
    let captured = builder.add_free_var(inner, "err", None);
    let inner_target = function_ref(&mut builder, inner, "a.recapture$1");
    let rebound = make_closure(&mut builder, inner, inner_target, &[captured]);
    opaque(&mut builder, inner, "go", &[rebound]);
    ret(&mut builder, inner, &[], 312);

    let program = builder.finish().expect("program should build");
    let report = trace(&program, &string_table);

    assert_eq!(
        rendered(&report),
        vec![r#"func recapture #0: [errors.New#0("outer")]"#]
    );
}

#[test]
fn loaded_program_with_a_binding_cycle_terminates() {
    let document = r#"{
      "package": "a",
      "values": [
        { "id": 1, "op": "free_var", "name": "err", "function": "a.f$1" },
        { "id": 2, "op": "function", "name": "a.f$1", "function": "a.f$1" },
        { "id": 3, "op": "make_closure", "name": "t0", "operands": [2, 1] },
        { "id": 4, "op": "deref", "name": "t1", "operands": [1], "error": true,
          "pos": { "file": "a/errors.go", "line": 5, "column": 9 } },
        { "id": 5, "op": "return", "operands": [4], "pos": { "file": "a/errors.go", "line": 5, "column": 2 } }
      ],
      "functions": [
        { "name": "a.f$1", "pos": { "file": "a/errors.go", "line": 4, "column": 6 },
          "free_vars": [1], "blocks": [[3, 4, 5]] }
      ]
    }"#;

    let mut string_table = StringTable::new();
    let program = load_program_from_str(document, &mut string_table).expect("document should load");
    let report = trace(&program, &string_table);

    assert_eq!(rendered(&report), vec!["func f$1 #0: [Unknown]"]);
}
