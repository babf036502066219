// ABOUTME: Property-style tests for the eight testable invariants in spec §8

use hpl::document;
use hpl::eval::Evaluator;
use hpl::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn build(src: &str) -> Evaluator<'static> {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("hpl_prop_{}_{n}.hpl.json", std::process::id()));
    std::fs::write(&path, src).unwrap();
    let env = document::load_document(&path, &[]).unwrap();
    std::fs::remove_file(&path).ok();
    Evaluator::new(env, Vec::new()).unwrap()
}

fn run_main(src: &str) -> Value {
    build(src).call_named("main", Vec::new()).unwrap()
}

/// Property 1: the call stack is empty at successful termination, and
/// again after a caught error, since every frame pops itself on any exit.
#[test]
fn property_1_call_stack_balance() {
    let evaluator = build(
        r#"{
            "classes": {"C": {"m": () => { return 1 / 0 }}},
            "objects": {"c": "C()"},
            "main": () => { try { c.m() } catch (e) { return 0 } }
        }"#,
    );
    evaluator.call_named("main", Vec::new()).unwrap();
    assert!(evaluator.call_stack_labels().is_empty());
}

/// Property 2: `this` is restored to its pre-call value around a nested
/// method call, regardless of what the nested call does to its own `this`.
#[test]
fn property_2_this_integrity_across_nested_calls() {
    let v = run_main(
        r#"{
            "classes": {
                "Inner": {"poke": () => { return "inner" }},
                "Outer": {
                    "init": () => { this.tag = "outer" },
                    "run": () => {
                        before = this.tag;
                        other.poke();
                        after = this.tag;
                        return before + "/" + after;
                    }
                }
            },
            "objects": {"other": "Inner()", "o": "Outer()"},
            "main": () => { return o.run() }
        }"#,
    );
    assert!(matches!(v, Value::Str(s) if s == "outer/outer"));
}

/// Property 3: a local assignment inside a function never leaks into the
/// caller's locals, but a write through an object attribute is visible to
/// the caller after the call returns.
#[test]
fn property_3_scope_locality() {
    let v = run_main(
        r#"{
            "classes": {"Box": {"set": (n) => { this.value = n }}},
            "objects": {"b": "Box()"},
            "helper": () => { leaked = 99; return leaked },
            "main": () => {
                helper();
                b.set(7);
                return b.value;
            }
        }"#,
    );
    assert!(matches!(v, Value::Int(7)));

    let evaluator = build(
        r#"{
            "helper": () => { leaked = 99; return leaked },
            "main": () => { helper(); return leaked }
        }"#,
    );
    let err = evaluator.call_named("main", Vec::new()).unwrap_err();
    assert!(matches!(err, hpl::error::HplError::Name { .. }));
}

/// Property 4: `false && E` never evaluates `E`, and `true || E` never
/// evaluates `E` — probed by an object attribute a side-effecting call
/// would otherwise have incremented.
#[test]
fn property_4_short_circuit_skips_unevaluated_operand() {
    let v = run_main(
        r#"{
            "classes": {"Probe": {"init": () => { this.calls = 0 }, "touch": () => { this.calls = this.calls + 1; return true }}},
            "objects": {"p": "Probe()"},
            "main": () => {
                x = false && p.touch();
                y = true || p.touch();
                return p.calls;
            }
        }"#,
    );
    assert!(matches!(v, Value::Int(0)));
}

/// Property 5: integer division truncates toward zero and satisfies
/// `a == (a/b)*b + (a%b)` for every sampled pair with a non-zero divisor,
/// and both operands integer keeps the result integer.
#[test]
fn property_5_numeric_purity_of_integer_division() {
    for (a, b) in [(7, 2), (-7, 2), (7, -2), (-7, -2), (10, 5), (1, 3)] {
        let v = run_main(&format!(
            r#"{{"main": () => {{ return ({a} / {b}) * {b} + ({a} % {b}) }}}}"#
        ));
        assert!(matches!(v, Value::Int(n) if n == a), "a={a} b={b} got {v:?}");
    }
}

/// Property 6: for any non-numeric `x`, `"" + x == str(x)`.
#[test]
fn property_6_string_plus_matches_str_conversion() {
    let cases = [
        (r#""" + true"#, "true"),
        (r#""" + false"#, "false"),
        (r#""" + null"#, "null"),
        (r#""" + [1, 2, 3]"#, "[1, 2, 3]"),
        (r#""" + "already a string""#, "already a string"),
    ];
    for (expr, expected) in cases {
        let v = run_main(&format!(r#"{{"main": () => {{ return {expr} }}}}"#));
        assert!(matches!(&v, Value::Str(s) if s == expected), "expr={expr} got {v:?}");
    }
}

/// Property 7: `json.parse(json.stringify(a))` is structurally equal to
/// `a` for an array of primitives.
#[test]
fn property_7_json_round_trip_preserves_primitive_arrays() {
    let v = run_main(
        r#"{
            "imports": ["json"],
            "main": () => {
                original = [1, 2.5, "three", true, null];
                decoded = json.decode(json.encode(original));
                return (
                    decoded[0] == original[0] &&
                    decoded[2] == original[2] &&
                    (decoded[3] && original[3])
                );
            }
        }"#,
    );
    assert!(matches!(v, Value::Bool(true)));
}

/// Property 8: rewriting a brace block to the equivalent colon+indent form
/// produces the same evaluator output.
#[test]
fn property_8_brace_and_indent_blocks_are_equivalent() {
    let brace = run_main(
        r#"{
            "main": () => {
                total = 0;
                for (i = 0; i < 5; i++) { if (i % 2 == 0) { total = total + i } else { total = total - 1 } }
                return total;
            }
        }"#,
    );
    let indent = run_main(
        "{\"main\": () => {\n    total = 0\n    for (i = 0; i < 5; i++):\n        if (i % 2 == 0):\n            total = total + i\n        else:\n            total = total - 1\n    return total\n}}",
    );
    assert_eq!(brace.to_string(), indent.to_string());
}
