#![allow(dead_code)]

use gad_syntax::{
    ErrorList, File, ParserOptions, Scanner, ScannerOptions, SourceFileSet, TokenKind, format,
    parse_file, parse_source,
};

/// Parse `src` with default options, panicking on any error.
pub fn parse(src: &str) -> File {
    parse_with(src, ParserOptions::default())
}

pub fn parse_with(src: &str, opts: ParserOptions) -> File {
    parse_source("test", src, opts)
        .unwrap_or_else(|e| panic!("parse failed: {e}\n--- source ---\n{src}"))
}

/// Parse `src` in mixed mode with the default delimiters.
pub fn parse_mixed(src: &str) -> File {
    parse_with(src, mixed_opts())
}

pub fn mixed_opts() -> ParserOptions {
    ParserOptions::default().scanner(ScannerOptions::default().mixed(true))
}

/// Errors reported for `src`; the tree is discarded.
pub fn errors(src: &str) -> ErrorList {
    let set = SourceFileSet::new();
    parse_file(&set, "test", src, ParserOptions::default()).1
}

/// Canonical form of `src`.
pub fn print(src: &str) -> String {
    format(&parse(src))
}

/// Canonical form of a single-statement program, without the newline.
pub fn print_stmt(src: &str) -> String {
    let file = parse(src);
    assert_eq!(file.stmts.len(), 1, "expected one statement in {src:?}");
    file.stmts[0].to_string()
}

/// Assert that `input` is already in canonical form.
pub fn roundtrip(input: &str) {
    roundtrip_with(input, ParserOptions::default());
}

pub fn roundtrip_with(input: &str, opts: ParserOptions) {
    let output = format(&parse_with(input, opts));
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Assert that printing is stable: `print(parse(print(parse(src)))) == print(parse(src))`.
pub fn assert_idempotent(src: &str, opts: &ParserOptions) {
    let first = format(&parse_with(src, opts.clone()));
    let reparsed = parse_source("test", &first, opts.clone()).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{first}"
        )
    });
    let second = format(&reparsed);
    assert_eq!(
        first, second,
        "printing is not idempotent\n--- source ---\n{src}"
    );
}

/// Kinds and literals of every token up to, not including, EOF.
pub fn tokens(src: &str, opts: ScannerOptions) -> Vec<(TokenKind, String)> {
    let set = SourceFileSet::new();
    let file = set.add_file("test", None, src.len());
    let mut scanner = Scanner::new(file, src.as_bytes(), opts, None);
    let mut out = Vec::new();
    loop {
        let tok = scanner.scan();
        if tok.kind == TokenKind::Eof {
            break;
        }
        out.push((tok.kind, tok.literal));
    }
    out
}

/// Token kinds only.
pub fn kinds(src: &str, opts: ScannerOptions) -> Vec<TokenKind> {
    tokens(src, opts).into_iter().map(|(kind, _)| kind).collect()
}
