// ABOUTME: End-to-end tests through load_document + Evaluator covering includes, imports, and errors

use hpl::document;
use hpl::eval::Evaluator;
use hpl::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_path(tag: &str) -> std::path::PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("hpl_integration_{tag}_{}_{n}.hpl.json", std::process::id()))
}

#[test]
fn includes_merge_classes_and_existing_keys_win() {
    let base_dir = std::env::temp_dir();
    let lib_path = base_dir.join(format!("hpl_integration_lib_{}.hpl.json", std::process::id()));
    std::fs::write(
        &lib_path,
        r#"{
            "classes": {"Greeter": {"hello": () => { return "from lib" }}},
            "helper": () => { return "lib helper" }
        }"#,
    )
    .unwrap();

    let main_path = temp_path("main_with_include");
    std::fs::write(
        &main_path,
        format!(
            r#"{{
                "includes": ["{}"],
                "objects": {{"g": "Greeter()"}},
                "main": () => {{ return g.hello() + "/" + helper() }}
            }}"#,
            lib_path.file_name().unwrap().to_string_lossy()
        ),
    )
    .unwrap();

    let env = document::load_document(&main_path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    let result = evaluator.call_named("main", Vec::new()).unwrap();
    assert!(matches!(result, Value::Str(s) if s == "from lib/lib helper"));

    std::fs::remove_file(&lib_path).ok();
    std::fs::remove_file(&main_path).ok();
}

#[test]
fn missing_include_is_a_warning_not_a_fatal_error() {
    let main_path = temp_path("missing_include");
    std::fs::write(
        &main_path,
        r#"{
            "includes": ["does_not_exist_anywhere.hpl.json"],
            "main": () => { return 1 }
        }"#,
    )
    .unwrap();

    let env = document::load_document(&main_path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    let result = evaluator.call_named("main", Vec::new()).unwrap();
    assert!(matches!(result, Value::Int(1)));

    std::fs::remove_file(&main_path).ok();
}

#[test]
fn imports_bind_stdlib_module_under_its_alias() {
    let path = temp_path("import_alias");
    std::fs::write(
        &path,
        r#"{
            "imports": [{"math": "m"}],
            "main": () => { return m.sqrt(16) }
        }"#,
    )
    .unwrap();

    let env = document::load_document(&path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    let result = evaluator.call_named("main", Vec::new()).unwrap();
    assert!(matches!(result, Value::Float(n) if n == 4.0));

    std::fs::remove_file(&path).ok();
}

#[test]
fn import_without_alias_binds_under_its_own_name() {
    let path = temp_path("import_bare");
    std::fs::write(
        &path,
        r#"{
            "imports": ["math"],
            "main": () => { return math.pi > 3 }
        }"#,
    )
    .unwrap();

    let env = document::load_document(&path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    let result = evaluator.call_named("main", Vec::new()).unwrap();
    assert!(matches!(result, Value::Bool(true)));

    std::fs::remove_file(&path).ok();
}

#[test]
fn call_directive_with_positional_args_runs_named_function() {
    let path = temp_path("call_directive");
    std::fs::write(
        &path,
        r#"{
            "add": (a, b) => { echo "Adding " + a + " + " + b + " = " + (a + b) },
            "call": "add(5, 3)"
        }"#,
    )
    .unwrap();

    let env = document::load_document(&path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    assert!(evaluator.run().is_ok());

    std::fs::remove_file(&path).ok();
}

#[test]
fn uncaught_error_surfaces_through_the_public_run_api() {
    let path = temp_path("uncaught");
    std::fs::write(&path, r#"{"main": () => { return undefined_name }, "call": "main()"}"#).unwrap();

    let env = document::load_document(&path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    let err = evaluator.run().unwrap_err();
    assert!(err.to_string().contains("undefined_name"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn class_referencing_undeclared_parent_fails_method_resolution() {
    let path = temp_path("bad_parent");
    std::fs::write(
        &path,
        r#"{
            "classes": {"Orphan": {"parent": "Nonexistent", "greet": () => { return "hi" }}},
            "objects": {"o": "Orphan()"},
            "main": () => { return o.missing_method() }
        }"#,
    )
    .unwrap();

    let env = document::load_document(&path, &[]).unwrap();
    let evaluator = Evaluator::new(env, Vec::new()).unwrap();
    let err = evaluator.call_named("main", Vec::new()).unwrap_err();
    assert!(matches!(err, hpl::error::HplError::Name { .. }));

    std::fs::remove_file(&path).ok();
}
