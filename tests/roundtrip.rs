//! Round-trip tests: canonical source parses and prints back unchanged.

mod common;

use common::{assert_idempotent, mixed_opts, roundtrip};
use gad_syntax::ParserOptions;

// -----------------------------------------------------------
// Assignments and literals.
// -----------------------------------------------------------

#[test]
fn roundtrip_define() {
    roundtrip("a := 1\n");
}

#[test]
fn roundtrip_swap() {
    roundtrip("a, b = b, a\n");
}

#[test]
fn roundtrip_nested_operators() {
    roundtrip("x := ((a + b) * c)\n");
}

#[test]
fn roundtrip_call_with_all_argument_kinds() {
    roundtrip("f(1, 2; a=3, **kw)\n");
}

#[test]
fn roundtrip_array_of_literals() {
    roundtrip("x := [1, \"two\", 'c', 3.5, 2u, 1.5d, nil, true, yes]\n");
}

#[test]
fn roundtrip_dict() {
    roundtrip("d := {a: 1, \"b c\": [2]}\n");
}

#[test]
fn roundtrip_selectors_and_slices() {
    roundtrip("x := a?.b.c[0][1:2]\n");
}

#[test]
fn roundtrip_nil_check() {
    roundtrip("x := ((a == nil) ? b : c)\n");
}

#[test]
fn roundtrip_tuples() {
    roundtrip("t := (1,)\n");
    roundtrip("x := (;a=1, b)\n");
}

#[test]
fn roundtrip_raw_strings() {
    roundtrip("s := `raw`\n");
    roundtrip("h := ```\nline\n```\n");
}

#[test]
fn roundtrip_negation() {
    roundtrip("x := (-1)\n");
}

#[test]
fn roundtrip_import() {
    roundtrip("m := import(\"fmt\")\n");
}

#[test]
fn roundtrip_increment() {
    roundtrip("x++\n");
}

// -----------------------------------------------------------
// Declarations and functions.
// -----------------------------------------------------------

#[test]
fn roundtrip_param_declaration() {
    roundtrip("param (a, *b; c=1, **d)\n");
}

#[test]
fn roundtrip_value_declarations() {
    roundtrip("var (a = 1, b)\n");
    roundtrip("const x = 1\n");
}

#[test]
fn roundtrip_function_literal() {
    roundtrip("f := func(a, *b; c=1, **d) {return (a + c)}\n");
}

#[test]
fn roundtrip_closure() {
    roundtrip("g := func(x) => (x * 2)\n");
}

#[test]
fn roundtrip_pipes() {
    roundtrip("y := x .| f(1) .| g()\n");
}

// -----------------------------------------------------------
// Control flow.
// -----------------------------------------------------------

#[test]
fn roundtrip_if_else() {
    roundtrip("if x {a()} else {b()}\n");
}

#[test]
fn roundtrip_nested_if() {
    roundtrip("if x {if y {a()}}\n");
}

#[test]
fn roundtrip_three_clause_for() {
    roundtrip("for i := 0; (i < 3); i++ {f(i)}\n");
}

#[test]
fn roundtrip_for_in_with_else() {
    roundtrip("for k, v in m {f(k, v)} else {g()}\n");
}

#[test]
fn roundtrip_infinite_loop() {
    roundtrip("for {break}\n");
}

#[test]
fn roundtrip_try_catch_finally() {
    roundtrip("try {f()} catch e {throw e} finally {h()}\n");
}

#[test]
fn roundtrip_block_statement() {
    roundtrip("{a := 1; b := 2}\n");
}

#[test]
fn roundtrip_multiple_statements() {
    roundtrip("a := 1\nb := (a + 1)\nf(a, b)\n");
}

// -----------------------------------------------------------
// Idempotence on non-canonical input.
// -----------------------------------------------------------

#[test]
fn idempotent_on_loose_layout() {
    let src = "
        // comment
        a:=1;b:=a+2*3

        if a>b do
            print(a)
        else
            print(b)
        end
    ";
    assert_idempotent(src, &ParserOptions::default());
}

#[test]
fn idempotent_on_functions_and_calls() {
    let src = "f := func(x, y=2) {\n  return x ?? y\n}\nf(1; y=3) .| g\n";
    assert_idempotent(src, &ParserOptions::default());
}

#[test]
fn idempotent_on_templates() {
    let src = "<ul>\n#{ for x in xs do }  <li>#{= x }</li>\n#{ end }</ul>\n";
    assert_idempotent(src, &mixed_opts());
}

#[test]
fn idempotent_with_pragma() {
    let src = "# gad: mixed\nHello #{= name -}  !\n";
    assert_idempotent(src, &ParserOptions::default());
}
