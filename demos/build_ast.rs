//! Build a Gad syntax tree with the builder API and print it.

use gad_syntax::{CallArgs, Expr, File, GenDecl, Stmt, TokenKind, format};

fn main() {
    let params = GenDecl::new(TokenKind::Param)
        .param("items", true)
        .named_param("sep", Some(Expr::string(", ")));

    let body = vec![Stmt::assign(
        Expr::ident("out"),
        TokenKind::AddAssign,
        Expr::binary(Expr::ident("item"), TokenKind::Add, Expr::ident("sep")),
    )];

    let file = File::new(vec![
        Stmt::decl(params),
        Stmt::define("out", Expr::string("")),
        Stmt::for_in("_", Some("item"), Expr::ident("items"), body),
        Stmt::expr(Expr::call(
            Expr::selector(Expr::ident("fmt"), "println"),
            CallArgs::new().arg(Expr::ident("out")),
        )),
        Stmt::ret(Some(Expr::ident("out"))),
    ]);

    println!("{}", format(&file));
}
