//! Parser structure tests.

mod common;

use common::{parse, print, print_stmt};
use gad_syntax::ast::Spec;
use gad_syntax::{Expr, Stmt, TokenKind, UnaryOp};
use pretty_assertions::assert_eq;

// -----------------------------------------------------------
// Declarations.
// -----------------------------------------------------------

#[test]
fn param_declaration_with_all_kinds() {
    let file = parse("param (a, *b; c=1, **d)\n");
    let Stmt::Decl(decl) = &file.stmts[0] else {
        panic!("expected declaration, got {:?}", file.stmts[0]);
    };
    assert_eq!(decl.tok, TokenKind::Param);
    assert_eq!(decl.specs.len(), 4);
    assert!(matches!(decl.specs[0], Spec::Param { variadic: false, .. }));
    assert!(matches!(decl.specs[1], Spec::Param { variadic: true, .. }));
    assert!(matches!(
        decl.specs[2],
        Spec::NamedParam {
            value: Some(_),
            variadic: false,
            ..
        }
    ));
    assert!(matches!(
        decl.specs[3],
        Spec::NamedParam {
            value: None,
            variadic: true,
            ..
        }
    ));
    assert_eq!(print_stmt("param (a, *b; c=1, **d)"), "param (a, *b; c=1, **d)");
}

#[test]
fn single_param_without_parens() {
    assert_eq!(print_stmt("param *rest"), "param *rest");
    assert_eq!(print_stmt("param opt=2"), "param opt=2");
}

#[test]
fn value_declarations() {
    assert_eq!(print_stmt("var (\n  a = 1\n  b\n)"), "var (a = 1, b)");
    assert_eq!(print_stmt("const x = 1"), "const x = 1");
    assert_eq!(print_stmt("global (a, b)"), "global (a, b)");
}

#[test]
fn typed_parameters() {
    assert_eq!(
        print_stmt("f := func(a int|str, b:float) {}"),
        "f := func(a int|str, b float) {}"
    );
}

// -----------------------------------------------------------
// Assignments and expressions.
// -----------------------------------------------------------

#[test]
fn compound_assignment_keeps_operator() {
    let file = parse("a ||= 5 + 10\n");
    let Stmt::Assign(assign) = &file.stmts[0] else {
        panic!("expected assignment");
    };
    assert_eq!(assign.op, TokenKind::LOrAssign);
    assert_eq!(assign.rhs[0].to_string(), "(5 + 10)");
}

#[test]
fn nil_comparison_in_ternary() {
    assert_eq!(
        print_stmt("x := a == nil ? b : c"),
        "x := ((a == nil) ? b : c)"
    );
    let file = parse("a != nil\n");
    let Stmt::Expr(Expr::Unary(unary)) = &file.stmts[0] else {
        panic!("expected nil check");
    };
    assert_eq!(unary.op, UnaryOp::NotNull);
}

#[test]
fn operator_precedence() {
    assert_eq!(print_stmt("a + b * c"), "(a + (b * c))");
    assert_eq!(print_stmt("(a + b) * c"), "((a + b) * c)");
    assert_eq!(print_stmt("a || b && c"), "(a || (b && c))");
    assert_eq!(print_stmt("a ?? b || c"), "((a ?? b) || c)");
    assert_eq!(print_stmt("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
    assert_eq!(print_stmt("x := -a + !b"), "x := ((-a) + (!b))");
}

#[test]
fn selectors_and_indexing() {
    assert_eq!(print_stmt("x?.y.z"), "x?.y.z");
    assert_eq!(print_stmt("x.(\"k\")"), "x.k");
    assert_eq!(print_stmt("x.(\"a b\")"), "x.(\"a b\")");
    assert_eq!(print_stmt("a[1:]"), "a[1:]");
    assert_eq!(print_stmt("a[:2]"), "a[:2]");
    assert_eq!(print_stmt("a[i][j]"), "a[i][j]");
}

#[test]
fn dict_and_array_literals() {
    assert_eq!(
        print_stmt("d := {a: 1, \"b c\": 2, if: 3}"),
        "d := {a: 1, \"b c\": 2, if: 3}"
    );
    assert_eq!(print_stmt("l := [\n  1,\n  2,\n]"), "l := [1, 2]");
}

#[test]
fn call_with_named_flag_argument() {
    assert_eq!(print_stmt("f(1; verbose)"), "f(1; verbose=yes)");
    assert_eq!(print_stmt("f(a, b=2)"), "f(a; b=2)");
    assert_eq!(print_stmt("f(*xs; **kw)"), "f(*xs; **kw)");
}

#[test]
fn tuples_and_key_value_arrays() {
    assert_eq!(print_stmt("x := (1,)"), "x := (1,)");
    assert_eq!(print_stmt("x := (1, 2)"), "x := (1, 2)");
    assert_eq!(print_stmt("x := (1)"), "x := (1)");
    assert_eq!(print_stmt("x := (;a=1, b)"), "x := (;a=1, b)");
    let file = parse("x := (1,)\n");
    let Stmt::Assign(assign) = &file.stmts[0] else {
        panic!("expected assignment");
    };
    assert!(matches!(assign.rhs[0], Expr::MultiParen(_)));
}

#[test]
fn closures() {
    assert_eq!(print_stmt("f := x => x + 1"), "f := func(x) => (x + 1)");
    assert_eq!(print_stmt("g := (a, b) => a * b"), "g := func(a, b) => (a * b)");
    assert_eq!(print_stmt("h := func(a) => a"), "h := func(a) => a");
}

#[test]
fn function_literals() {
    assert_eq!(
        print_stmt("f := func(a, *b; c=1, **d) { return a }"),
        "f := func(a, *b; c=1, **d) {return a}"
    );
    assert_eq!(print_stmt("func named() {}"), "func named() {}");
}

#[test]
fn pipe_inserts_first_argument() {
    let file = parse("x .| f(1)\n");
    let Stmt::Expr(Expr::Call(call)) = &file.stmts[0] else {
        panic!("expected call");
    };
    assert!(call.piped);
    assert_eq!(call.args.positional.len(), 2);
    assert_eq!(call.args.positional[0].to_string(), "x");
    assert_eq!(print_stmt("x .| f(1)"), "x .| f(1)");
    assert_eq!(print_stmt("x .| f .| g"), "x .| f() .| g()");
    assert_eq!(print_stmt("x .| m.f"), "x .| m.f()");
}

#[test]
fn import_and_embed() {
    assert_eq!(print_stmt("m := import(\"fmt\")"), "m := import(\"fmt\")");
    assert_eq!(print_stmt("t := embed(`a.txt`)"), "t := embed(\"a.txt\")");
}

#[test]
fn literal_values() {
    let file = parse("x := 0x10\ny := 'c'\nz := \"a\\nb\"\n");
    let values: Vec<String> = file
        .stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::Assign(a) => Some(match &a.rhs[0] {
                Expr::Int(lit) => lit.value.to_string(),
                Expr::Char(lit) => lit.value.to_string(),
                Expr::String(lit) => lit.value.clone(),
                other => panic!("unexpected {other:?}"),
            }),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec!["16", "c", "a\nb"]);
}

// -----------------------------------------------------------
// Statements.
// -----------------------------------------------------------

#[test]
fn if_with_init_and_else_if() {
    assert_eq!(
        print_stmt("if a := f(); a { g() } else if b { h() } else { k() }"),
        "if a := f(); a {g()} else if b {h()} else {k()}"
    );
}

#[test]
fn keyword_blocks() {
    assert_eq!(print_stmt("if x do y() end"), "if x {y()}");
    assert_eq!(print_stmt("for x then y() done"), "for x {y()}");
}

#[test]
fn open_else_shares_closing_keyword() {
    let file = parse("if x do a() else b() end\n");
    let Stmt::If(stmt) = &file.stmts[0] else {
        panic!("expected if");
    };
    assert_eq!(stmt.body.stmts.len(), 1);
    assert!(stmt.else_stmt.is_some());
    assert_eq!(file.stmts[0].to_string(), "if x {a()} else {b()}");
}

#[test]
fn for_in_with_else() {
    let file = parse("for k, v in m { f(k) } else { g() }\n");
    let Stmt::ForIn(stmt) = &file.stmts[0] else {
        panic!("expected for-in");
    };
    assert_eq!(stmt.key.name, "k");
    assert_eq!(stmt.value.as_ref().map(|v| v.name.as_str()), Some("v"));
    assert!(stmt.else_block.is_some());

    let file = parse("for x in xs { f(x) }\n");
    let Stmt::ForIn(stmt) = &file.stmts[0] else {
        panic!("expected for-in");
    };
    assert!(stmt.value.is_none());
    assert!(stmt.else_block.is_none());
}

#[test]
fn for_loop_forms() {
    assert_eq!(
        print_stmt("for i := 0; i < 10; i++ { x += i }"),
        "for i := 0; (i < 10); i++ {x += i}"
    );
    assert_eq!(print_stmt("for x { }"), "for x {}");
    assert_eq!(print_stmt("for { break }"), "for {break}");
}

#[test]
fn try_catch_finally() {
    assert_eq!(
        print_stmt("try { f() } catch e { g(e) } finally { h() }"),
        "try {f()} catch e {g(e)} finally {h()}"
    );
    assert_eq!(print_stmt("try { f() } catch { }"), "try {f()} catch {}");
}

#[test]
fn throw_and_return() {
    assert_eq!(print_stmt("throw err"), "throw err");
    assert_eq!(print_stmt("return"), "return");
    assert_eq!(print_stmt("return a + 1"), "return (a + 1)");
}

#[test]
fn explicit_and_implicit_semicolons_agree() {
    assert_eq!(print("a := 1; b := 2"), print("a := 1\nb := 2\n"));
    let file = parse("a := 1;;\n");
    assert!(file.stmts.iter().any(|s| matches!(
        s,
        Stmt::Empty {
            implicit: false,
            ..
        }
    )));
}

#[test]
fn multi_assignment() {
    assert_eq!(print_stmt("a, b = b, a"), "a, b = b, a");
    assert_eq!(print_stmt("i++"), "i++");
}

#[test]
fn trailing_dot_floats() {
    let file = parse("x := 1.e3\ny := 1.\n");
    let values: Vec<f64> = file
        .stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::Assign(a) => match &a.rhs[0] {
                Expr::Float(lit) => Some(lit.value),
                other => panic!("expected float, got {other:?}"),
            },
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![1000.0, 1.0]);
    assert_eq!(print_stmt("x := 1.e3"), "x := 1.e3");
}

#[test]
fn param_list_split_across_lines() {
    let file = parse("param (\n  a\n  b\n)\n");
    let Stmt::Decl(decl) = &file.stmts[0] else {
        panic!("expected declaration");
    };
    assert_eq!(decl.specs.len(), 2);
    assert_eq!(file.stmts[0].to_string(), "param (a, b)");
    assert_eq!(print_stmt("param (a\n  b; c=1\n  **d)"), "param (a, b; c=1, **d)");
    assert_eq!(
        print_stmt("f := func(a\n  b) {}"),
        "f := func(a, b) {}"
    );
}
