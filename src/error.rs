//! Positioned diagnostics produced by the scanner and the parser.

use std::fmt;
use std::fmt::Write as _;

use crate::source::SourceFilePos;

/// Classifies a scanner error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Byte sequence that cannot start any token.
    IllegalCharacter(char),
    /// Invalid UTF-8 in the source.
    IllegalEncoding,
    /// Byte order mark anywhere but the file start.
    IllegalByteOrderMark,
    UnterminatedString,
    UnterminatedRawString,
    UnterminatedHeredoc,
    UnterminatedChar,
    UnterminatedComment,
    /// Char literal with zero or several code points.
    IllegalCharLiteral,
    UnknownEscape(char),
    /// Escape naming a surrogate or out-of-range code point.
    InvalidCodePoint,
    /// Malformed escape digits.
    IllegalEscapeDigit(char),
    /// Malformed numeric literal.
    IllegalNumber(String),
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalCharacter(ch) => write!(f, "illegal character {ch:?}"),
            Self::IllegalEncoding => write!(f, "illegal UTF-8 encoding"),
            Self::IllegalByteOrderMark => write!(f, "illegal byte order mark"),
            Self::UnterminatedString => write!(f, "string literal not terminated"),
            Self::UnterminatedRawString => write!(f, "raw string literal not terminated"),
            Self::UnterminatedHeredoc => write!(f, "raw heredoc literal not terminated"),
            Self::UnterminatedChar => write!(f, "char literal not terminated"),
            Self::UnterminatedComment => write!(f, "comment not terminated"),
            Self::IllegalCharLiteral => write!(f, "illegal char literal"),
            Self::UnknownEscape(ch) => write!(f, "unknown escape sequence {ch:?}"),
            Self::InvalidCodePoint => {
                write!(f, "escape sequence is invalid Unicode code point")
            }
            Self::IllegalEscapeDigit(ch) => {
                write!(f, "illegal character {ch:?} in escape sequence")
            }
            Self::IllegalNumber(lit) => write!(f, "illegal number {lit:?}"),
        }
    }
}

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was required.
    Expected { expected: String, found: String },
    ExpectedOperand { found: String },
    ExpectedStatement { found: String },
    /// `}` with no open block at this scope.
    UnmatchedBrace,
    /// End of input with blocks still open.
    UnclosedBrace,
    /// Ternary `:` on a different line than its `?`.
    TernaryLineBreak,
    /// A second `*x` / `**x` in one list.
    DuplicateVariadic,
    /// Positional or named entry following a variadic one.
    VariadicNotLast,
    /// Positional parameter after a defaulted one.
    PositionalAfterNamed,
    /// `try` with neither `catch` nor `finally`.
    TryWithoutHandler,
    /// Left-hand side is not assignable.
    InvalidAssignTarget(String),
    /// Mismatched number of assignment operands.
    AssignArity { op: String },
    /// Literal whose text cannot be converted to a value.
    InvalidLiteral { kind: String, literal: String },
    /// Malformed `# gad:` pragma.
    InvalidPragma(String),
    /// A scanner error surfaced through the parser.
    Scan(ScanErrorKind),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected '{expected}', found '{found}'")
            }
            Self::ExpectedOperand { found } => write!(f, "expected operand, found '{found}'"),
            Self::ExpectedStatement { found } => {
                write!(f, "expected statement, found '{found}'")
            }
            Self::UnmatchedBrace => write!(f, "unexpected '}}' without matching '{{'"),
            Self::UnclosedBrace => write!(f, "expected '}}', found 'EOF'"),
            Self::TernaryLineBreak => {
                write!(f, "ternary ':' must be on the same line as '?'")
            }
            Self::DuplicateVariadic => write!(f, "multiple variadic entries"),
            Self::VariadicNotLast => write!(f, "variadic entry must be last"),
            Self::PositionalAfterNamed => {
                write!(f, "positional entry after named entries")
            }
            Self::TryWithoutHandler => {
                write!(f, "try statement requires catch or finally")
            }
            Self::InvalidAssignTarget(found) => {
                write!(f, "cannot assign to '{found}'")
            }
            Self::AssignArity { op } => {
                write!(f, "mismatched operand count for '{op}'")
            }
            Self::InvalidLiteral { kind, literal } => {
                write!(f, "invalid {kind} literal '{literal}'")
            }
            Self::InvalidPragma(msg) => write!(f, "invalid pragma: {msg}"),
            Self::Scan(kind) => write!(f, "{kind}"),
        }
    }
}

/// A positioned diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse Error: {kind}\n\tat {pos}")]
pub struct Error {
    pub pos: SourceFilePos,
    pub kind: ParseErrorKind,
}

impl Error {
    #[must_use]
    pub const fn new(pos: SourceFilePos, kind: ParseErrorKind) -> Self {
        Self { pos, kind }
    }

    /// Message without the position suffix.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Render the error followed by `around` source lines above and below
    /// the error line, with a caret under the offending column.
    ///
    /// Tabs before the column are kept as tabs in the caret line.
    #[must_use]
    pub fn render_context(&self, source: &str, around: usize) -> String {
        let mut out = self.to_string();
        if !self.pos.is_valid() {
            return out;
        }
        let lines: Vec<&str> = source.split('\n').collect();
        let line_idx = self.pos.line - 1;
        if line_idx >= lines.len() {
            return out;
        }
        let first = line_idx.saturating_sub(around);
        let last = (line_idx + around).min(lines.len() - 1);
        let width = (last + 1).to_string().len();

        out.push_str("\n\n");
        for (idx, line) in lines.iter().enumerate().take(last + 1).skip(first) {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let _ = writeln!(out, "{:>width$} | {line}", idx + 1);
            if idx == line_idx {
                let _ = write!(out, "{:>width$} | ", "");
                // Columns count bytes; pad one space per character before it.
                let byte_col = self.pos.column.saturating_sub(1);
                let prefix = line.char_indices().take_while(|&(i, _)| i < byte_col);
                for (_, c) in prefix {
                    out.push(if c == '\t' { '\t' } else { ' ' });
                }
                out.push_str("^\n");
            }
        }
        out
    }
}

/// Sortable list of errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(pub Vec<Error>);

impl ErrorList {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, pos: SourceFilePos, kind: ParseErrorKind) {
        self.0.push(Error::new(pos, kind));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// The first error, or `None` for an empty list.
    #[must_use]
    pub fn err(&self) -> Option<&Error> {
        self.0.first()
    }

    /// Sort by file name, line, column, then message.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| {
            a.pos
                .filename
                .cmp(&b.pos.filename)
                .then(a.pos.line.cmp(&b.pos.line))
                .then(a.pos.column.cmp(&b.pos.column))
                .then_with(|| a.message().cmp(&b.message()))
        });
    }

    /// Sort and keep only the first error of every line.
    pub fn remove_multiples(&mut self) {
        self.sort();
        self.0
            .dedup_by(|b, a| a.pos.filename == b.pos.filename && a.pos.line == b.pos.line);
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => write!(f, "no errors"),
            1 => write!(f, "{}", self.0[0]),
            n => write!(f, "{} (and {} more errors)", self.0[0], n - 1),
        }
    }
}

impl std::error::Error for ErrorList {}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(file: &str, line: usize, column: usize) -> SourceFilePos {
        SourceFilePos {
            filename: file.to_string(),
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn display_format() {
        let err = Error::new(pos("main", 3, 7), ParseErrorKind::UnmatchedBrace);
        assert_eq!(
            err.to_string(),
            "Parse Error: unexpected '}' without matching '{'\n\tat main:3:7"
        );
    }

    #[test]
    fn list_sorts_by_file_line_column() {
        let mut list = ErrorList::new();
        list.add(pos("b", 1, 1), ParseErrorKind::UnclosedBrace);
        list.add(pos("a", 2, 5), ParseErrorKind::UnclosedBrace);
        list.add(pos("a", 2, 1), ParseErrorKind::UnclosedBrace);
        list.sort();
        let order: Vec<_> = list
            .iter()
            .map(|e| (e.pos.filename.as_str(), e.pos.line, e.pos.column))
            .collect();
        assert_eq!(order, vec![("a", 2, 1), ("a", 2, 5), ("b", 1, 1)]);
    }

    #[test]
    fn summary_counts_remaining() {
        let mut list = ErrorList::new();
        assert!(list.err().is_none());
        list.add(pos("a", 1, 1), ParseErrorKind::UnclosedBrace);
        list.add(pos("a", 2, 1), ParseErrorKind::UnclosedBrace);
        list.add(pos("a", 3, 1), ParseErrorKind::UnclosedBrace);
        assert!(list.to_string().ends_with("(and 2 more errors)"));
        assert_eq!(list.err().map(|e| e.pos.line), Some(1));
    }

    #[test]
    fn remove_multiples_keeps_one_per_line() {
        let mut list = ErrorList::new();
        list.add(pos("a", 1, 4), ParseErrorKind::UnclosedBrace);
        list.add(pos("a", 1, 2), ParseErrorKind::UnmatchedBrace);
        list.add(pos("a", 2, 1), ParseErrorKind::UnclosedBrace);
        list.remove_multiples();
        assert_eq!(list.len(), 2);
        assert_eq!(list.0[0].pos.column, 2);
    }

    #[test]
    fn context_keeps_tabs_under_caret() {
        let err = Error::new(pos("f", 2, 3), ParseErrorKind::UnmatchedBrace);
        let out = err.render_context("a := 1\n\tx }\nb := 2", 1);
        assert!(out.contains("1 | a := 1\n"));
        assert!(out.contains("2 | \tx }\n"));
        assert!(out.contains("  | \t ^\n"));
        assert!(out.contains("3 | b := 2\n"));
    }

    #[test]
    fn context_caret_counts_characters() {
        let err = Error::new(pos("f", 1, 4), ParseErrorKind::UnmatchedBrace);
        let out = err.render_context("\u{e9} }", 0);
        assert!(out.ends_with("1 | \u{e9} }\n  |   ^\n"), "{out}");
    }
}
