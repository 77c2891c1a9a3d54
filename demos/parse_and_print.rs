//! Parse a Gad script and print its canonical form.

use gad_syntax::{ParserOptions, Stmt, format, parse_source};

fn main() {
    let input = "\
param (name; greeting=\"hello\")

msg := greeting + \", \" + name
if len(msg) > 20 do
    msg = msg[:20]
end
for i, c in msg { print(i, c) }
";

    let file = parse_source("greet.gad", input, ParserOptions::default()).expect("parse failed");

    println!("Statements: {}", file.stmts.len());
    for stmt in &file.stmts {
        let kind = match stmt {
            Stmt::Decl(_) => "declaration",
            Stmt::Assign(_) => "assignment",
            Stmt::If(_) => "if",
            Stmt::ForIn(_) => "for-in",
            _ => "other",
        };
        println!("  {kind}: {stmt}");
    }

    println!("\nFormatted output:\n{}", format(&file));
}
