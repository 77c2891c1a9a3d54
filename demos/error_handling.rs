//! Show diagnostics for invalid Gad input.

use gad_syntax::{ParseErrorKind, ParserOptions, SourceFileSet, parse_file};

fn main() {
    let source = "a := 1\nb := )\nc := \"unclosed\nif x {\n";
    let set = SourceFileSet::new();
    let (file, errors) = parse_file(&set, "broken.gad", source, ParserOptions::default());

    println!(
        "Recovered {} statements, {} errors",
        file.stmts.len(),
        errors.len()
    );
    for err in &errors {
        println!();
        println!("{}", err.render_context(source, 1));
        if let ParseErrorKind::Scan(kind) = &err.kind {
            println!("  (scanner: {kind:?})");
        }
        println!("  Location: line {}, column {}", err.pos.line, err.pos.column);
    }
}
