//! Gad scanner, parser, formatter, and builder.
//!
//! The front end of the Gad scripting language: source positions, a
//! scanner with automatic semicolons and a mixed text/code template mode,
//! a recursive-descent parser that recovers from errors, and a canonical
//! printer for the resulting syntax tree.
//!
//! # Quick start
//!
//! ## Parse and print a script
//!
//! ```
//! use gad_syntax::{format, parse_source, ParserOptions};
//!
//! let file = parse_source("main", "a := 1\nb ||= a + 2\n", ParserOptions::default()).unwrap();
//! assert_eq!(format(&file), "a := 1\nb ||= (a + 2)\n");
//! ```
//!
//! ## Mixed text and code
//!
//! ```
//! use gad_syntax::{format, parse_source, ParserOptions, ScannerOptions};
//!
//! let opts = ParserOptions::default().scanner(ScannerOptions::default().mixed(true));
//! let file = parse_source("page", "Hello #{= name }!", opts).unwrap();
//! assert_eq!(format(&file), "Hello #{= name }!");
//! ```
//!
//! ## Build a tree programmatically
//!
//! ```
//! use gad_syntax::{format, CallArgs, Expr, File, Stmt};
//!
//! let file = File::new(vec![Stmt::expr(Expr::call(
//!     Expr::ident("println"),
//!     CallArgs::new().arg(Expr::string("hi")),
//! ))]);
//! assert_eq!(format(&file), "println(\"hi\")\n");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod error;
pub mod formatter;
pub mod options;
pub mod parser;
pub mod scanner;
pub mod source;
pub mod token;

pub use ast::{BlockStmt, CallArgs, Expr, File, GenDecl, Ident, Stmt, UnaryOp};
pub use error::{Error, ErrorList, ParseErrorKind, ScanErrorKind};
pub use formatter::{format, quote};
pub use options::{MixedDelimiter, ParserOptions, ScannerOptions};
pub use parser::Parser;
pub use scanner::Scanner;
pub use source::{Pos, SourceFile, SourceFilePos, SourceFileSet};
pub use token::{Token, TokenFlags, TokenKind};

/// Parse `src` as a new file of `set`, returning the tree together with
/// every error found.
pub fn parse_file(
    set: &SourceFileSet,
    name: &str,
    src: &str,
    opts: ParserOptions,
) -> (File, ErrorList) {
    let file = set.add_file(name, None, src.len());
    Parser::new(file, src.as_bytes(), opts).parse_file()
}

/// Parse `src` in a fresh file set; any error fails the parse.
pub fn parse_source(name: &str, src: &str, opts: ParserOptions) -> Result<File, ErrorList> {
    let set = SourceFileSet::new();
    let (file, errors) = parse_file(&set, name, src, opts);
    if errors.is_empty() {
        Ok(file)
    } else {
        Err(errors)
    }
}
