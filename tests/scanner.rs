//! Token-level tests for the scanner.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{kinds, tokens};
use gad_syntax::scanner::{ErrorHandler, heredoc_value, unquote};
use gad_syntax::{
    ScanErrorKind, Scanner, ScannerOptions, SourceFilePos, SourceFileSet, TokenFlags, TokenKind,
};
use pretty_assertions::assert_eq;

use TokenKind::{
    Add, CodeBegin, CodeEnd, ConfigEnd, ConfigStart, Decimal, Define, Ellipsis, Float, Ident,
    Int, LBrace, Lambda, NullishSelector, Pipe, RBrace, Semicolon, String as Str, Text, Uint,
    ValueBegin, ValueEnd,
};

fn code() -> ScannerOptions {
    ScannerOptions::default()
}

fn mixed() -> ScannerOptions {
    ScannerOptions::default().mixed(true)
}

// -----------------------------------------------------------
// Automatic semicolons.
// -----------------------------------------------------------

#[test]
fn newline_after_operand_becomes_semicolon() {
    assert_eq!(
        tokens("a := 1\nb\n", code()),
        vec![
            (Ident, "a".to_string()),
            (Define, String::new()),
            (Int, "1".to_string()),
            (Semicolon, "\n".to_string()),
            (Ident, "b".to_string()),
            (Semicolon, "\n".to_string()),
        ]
    );
}

#[test]
fn end_of_input_inserts_semicolon() {
    assert_eq!(kinds("x", code()), vec![Ident, Semicolon]);
    assert_eq!(kinds("x\n", code()), vec![Ident, Semicolon]);
}

#[test]
fn newline_after_operator_is_skipped() {
    assert_eq!(kinds("a +\nb", code()), vec![Ident, Add, Ident, Semicolon]);
}

#[test]
fn inserted_semicolon_is_flagged() {
    let set = SourceFileSet::new();
    let src = "a; b\n";
    let file = set.add_file("test", None, src.len());
    let mut scanner = Scanner::new(file, src.as_bytes(), code(), None);
    scanner.scan();
    let explicit = scanner.scan();
    scanner.scan();
    let inserted = scanner.scan();
    assert_eq!(explicit.kind, Semicolon);
    assert!(!explicit.flags.contains(TokenFlags::INSERTED));
    assert_eq!(inserted.kind, Semicolon);
    assert!(inserted.flags.contains(TokenFlags::INSERTED));
}

#[test]
fn trailing_comment_still_ends_line() {
    assert_eq!(
        kinds("a // note\nb", code()),
        vec![Ident, Semicolon, Ident, Semicolon]
    );
    assert_eq!(
        kinds("a /* note */\nb", code()),
        vec![Ident, Semicolon, Ident, Semicolon]
    );
}

#[test]
fn disabled_auto_semicolons() {
    let opts = code().no_auto_semicolons(true);
    assert_eq!(kinds("a\nb\n", opts), vec![Ident, Ident]);
}

// -----------------------------------------------------------
// Operators and literals.
// -----------------------------------------------------------

#[test]
fn operators_use_maximal_munch() {
    use TokenKind::{AndNotAssign, LOrAssign, NullishAssign, PowAssign, ShlAssign};
    assert_eq!(
        kinds("**= <<= ??= ||= ?. .| => &^= ...", code()),
        vec![
            PowAssign,
            ShlAssign,
            NullishAssign,
            LOrAssign,
            NullishSelector,
            Pipe,
            Lambda,
            AndNotAssign,
            Ellipsis,
        ]
    );
}

#[test]
fn block_keywords_scan_as_braces() {
    assert_eq!(
        tokens("do end", code()),
        vec![
            (LBrace, "do".to_string()),
            (RBrace, "end".to_string()),
            (Semicolon, "\n".to_string()),
        ]
    );
}

#[test]
fn numeric_literal_kinds() {
    assert_eq!(
        kinds("1 0x1F 1_000 2u 1.5 1e3 2.5d 7d .5", code()),
        vec![Int, Int, Int, Uint, Float, Float, Decimal, Decimal, Float, Semicolon]
    );
}

#[test]
fn trailing_dot_makes_a_float() {
    assert_eq!(
        tokens("x := 1.", code()),
        vec![
            (Ident, "x".to_string()),
            (Define, String::new()),
            (Float, "1.".to_string()),
            (Semicolon, "\n".to_string()),
        ]
    );
    assert_eq!(
        tokens("1.e3 2.E-1", code()),
        vec![
            (Float, "1.e3".to_string()),
            (Float, "2.E-1".to_string()),
            (Semicolon, "\n".to_string()),
        ]
    );
}

#[test]
fn dot_after_integer_can_still_select() {
    use TokenKind::{Period, RParen};
    assert_eq!(
        kinds("1.len 1 .| f 1.(k)", code()),
        vec![
            Int,
            Period,
            Ident,
            Int,
            Pipe,
            Ident,
            Int,
            Period,
            TokenKind::LParen,
            Ident,
            RParen,
            Semicolon,
        ]
    );
}

#[test]
fn floats_as_decimal() {
    let opts = code().floats_as_decimal(true);
    assert_eq!(
        tokens("1.5", opts),
        vec![(Decimal, "1.5".to_string()), (Semicolon, "\n".to_string())]
    );
}

#[test]
fn string_and_raw_literals() {
    assert_eq!(
        tokens(r#""a\"b" `r` ``"#, code()),
        vec![
            (Str, r#""a\"b""#.to_string()),
            (TokenKind::RawString, "`r`".to_string()),
            (TokenKind::RawString, "``".to_string()),
            (Semicolon, "\n".to_string()),
        ]
    );
}

#[test]
fn heredoc_keeps_shorter_backtick_runs() {
    let src = "```\nline `x` ``\n```";
    let toks = tokens(src, code());
    assert_eq!(toks[0], (TokenKind::RawHeredoc, src.to_string()));
    assert_eq!(heredoc_value(&toks[0].1), "line `x` ``");
}

#[test]
fn char_as_string_option() {
    assert_eq!(kinds("'a'", code()), vec![TokenKind::Char, Semicolon]);
    assert_eq!(
        kinds("'ab'", code().char_as_string(true)),
        vec![Str, Semicolon]
    );
}

#[test]
fn unquote_escapes() {
    assert_eq!(unquote(r#""a\tb\x41é""#).as_deref(), Some("a\tbA\u{e9}"));
    assert_eq!(unquote(r"'\''").as_deref(), Some("'"));
    assert_eq!(unquote("`raw\\n`").as_deref(), Some("raw\\n"));
    assert_eq!(unquote(r#""\q""#), None);
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn errors_reach_the_handler() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let set = SourceFileSet::new();
    let src = "a := \"open\nb := @";
    let file = set.add_file("test", None, src.len());
    let handler: ErrorHandler = Box::new(move |pos: &SourceFilePos, kind: &ScanErrorKind| {
        sink.borrow_mut().push((pos.line, pos.column, kind.clone()));
    });
    let mut scanner = Scanner::new(file, src.as_bytes(), code(), Some(handler));
    while scanner.scan().kind != TokenKind::Eof {}
    assert_eq!(scanner.error_count(), 2);
    assert_eq!(
        *seen.borrow(),
        vec![
            (1, 6, ScanErrorKind::UnterminatedString),
            (2, 6, ScanErrorKind::IllegalCharacter('@')),
        ]
    );
}

#[test]
fn errors_are_buffered_without_handler() {
    let set = SourceFileSet::new();
    let src = "'ab'";
    let file = set.add_file("test", None, src.len());
    let mut scanner = Scanner::new(file, src.as_bytes(), code(), None);
    while scanner.scan().kind != TokenKind::Eof {}
    let errors = scanner.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, ScanErrorKind::IllegalCharLiteral);
    assert!(scanner.take_errors().is_empty());
}

#[test]
fn leading_byte_order_mark_is_skipped() {
    assert_eq!(kinds("\u{FEFF}x", code()), vec![Ident, Semicolon]);
}

// -----------------------------------------------------------
// Mixed mode.
// -----------------------------------------------------------

#[test]
fn text_and_code_blocks() {
    assert_eq!(
        tokens("a #{ x }b", mixed()),
        vec![
            (Text, "a ".to_string()),
            (CodeBegin, "#{".to_string()),
            (Ident, "x".to_string()),
            (CodeEnd, "}".to_string()),
            (Text, "b".to_string()),
        ]
    );
}

#[test]
fn value_blocks() {
    assert_eq!(
        kinds("#{= x }", mixed()),
        vec![ValueBegin, Ident, ValueEnd]
    );
}

#[test]
fn end_delimiter_ignored_inside_nesting() {
    assert_eq!(
        kinds("#{ f({a: 1}) }z", mixed()),
        vec![
            CodeBegin,
            Ident,
            TokenKind::LParen,
            LBrace,
            Ident,
            TokenKind::Colon,
            Int,
            RBrace,
            TokenKind::RParen,
            CodeEnd,
            Text,
        ]
    );
}

#[test]
fn block_keywords_do_not_nest() {
    assert_eq!(
        kinds("#{ if x do }y#{ end }", mixed()),
        vec![
            CodeBegin,
            TokenKind::If,
            Ident,
            LBrace,
            CodeEnd,
            Text,
            CodeBegin,
            RBrace,
            CodeEnd,
        ]
    );
}

#[test]
fn trim_markers() {
    let set = SourceFileSet::new();
    let src = "a  \n#{- x -}\n  b";
    let file = set.add_file("test", None, src.len());
    let mut scanner = Scanner::new(file, src.as_bytes(), mixed(), None);
    let text = scanner.scan();
    let begin = scanner.scan();
    scanner.scan();
    let end = scanner.scan();
    let after = scanner.scan();
    assert_eq!(text.literal, "a");
    assert_eq!(begin.literal, "#{-");
    assert!(begin.flags.contains(TokenFlags::TRIM_RIGHT));
    assert_eq!(end.literal, "-}");
    assert!(end.flags.contains(TokenFlags::TRIM_LEFT));
    assert_eq!(after.literal, "b");
}

#[test]
fn escaped_start_delimiter_stays_text() {
    let toks = tokens(r"a \#{ b", mixed());
    assert_eq!(toks, vec![(Text, r"a \#{ b".to_string())]);
}

#[test]
fn custom_delimiters() {
    let opts = mixed().delimiter("{%", "%}");
    assert_eq!(
        kinds("a{% x %}b", opts),
        vec![Text, CodeBegin, Ident, CodeEnd, Text]
    );
}

#[test]
fn pragma_line_expands_to_config_tokens() {
    assert_eq!(
        tokens("# gad: mixed, mixed_start=\"<%\"\nx", code()),
        vec![
            (ConfigStart, "# gad:".to_string()),
            (Ident, "mixed".to_string()),
            (TokenKind::Comma, String::new()),
            (Ident, "mixed_start".to_string()),
            (TokenKind::Assign, String::new()),
            (Str, "\"<%\"".to_string()),
            (ConfigEnd, String::new()),
            (Ident, "x".to_string()),
            (Semicolon, "\n".to_string()),
        ]
    );
}

#[test]
fn pragma_only_at_line_start() {
    assert_eq!(kinds("x # gad: mixed", code()), vec![Ident, Semicolon]);
    assert_eq!(
        kinds("# gad: mixed", code().no_pragma(true)),
        Vec::<TokenKind>::new()
    );
}
