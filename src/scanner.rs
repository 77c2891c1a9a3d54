//! Tokenizer for Gad source.
//!
//! The scanner runs in one of two modes. In code mode it produces ordinary
//! tokens and turns line breaks after statement-ending tokens into
//! semicolons. In mixed mode it starts in text mode, collecting raw text
//! until the start delimiter, and switches back to text when it meets the
//! end delimiter outside any `()`, `[]` or `{}` nesting.
//!
//! `# gad:` pragma lines are scanned by a nested code-mode scanner and
//! delivered as a `ConfigStart ... ConfigEnd` run through the token pool.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::error::ScanErrorKind;
use crate::options::ScannerOptions;
use crate::source::{Pos, SourceFile, SourceFilePos};
use crate::token::{Token, TokenFlags, TokenKind, lookup};

const BOM: char = '\u{FEFF}';
const PRAGMA_KEY: &str = "gad:";

/// Callback receiving every scanner error.
pub type ErrorHandler<'a> = Box<dyn FnMut(&SourceFilePos, &ScanErrorKind) + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Code,
}

enum TextStop {
    Eof,
    Delimiter,
    Pragma,
}

/// Converts source bytes of one [`SourceFile`] into tokens.
pub struct Scanner<'a> {
    file: Arc<SourceFile>,
    src: &'a [u8],
    /// Scanning stops here; shorter than `src` for pragma sub-scanners.
    end: usize,
    opts: ScannerOptions,
    handler: Option<ErrorHandler<'a>>,
    pending: Vec<(SourceFilePos, ScanErrorKind)>,
    error_count: usize,

    ch: Option<char>,
    offset: usize,
    read_offset: usize,
    line_offset: usize,
    insert_semi: bool,

    mode: Mode,
    in_value: bool,
    trim_next_text: bool,
    parens: usize,
    bracks: usize,
    braces: usize,

    pool: VecDeque<Token>,
    eof: Option<Token>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over `src`, which must be the content of `file`.
    ///
    /// Without a `handler`, errors are buffered and can be drained with
    /// [`take_errors`](Self::take_errors).
    ///
    /// # Panics
    ///
    /// Panics if the file size does not match `src.len()`.
    pub fn new(
        file: Arc<SourceFile>,
        src: &'a [u8],
        opts: ScannerOptions,
        handler: Option<ErrorHandler<'a>>,
    ) -> Self {
        assert_eq!(
            file.size(),
            src.len(),
            "file size ({}) does not match src len ({})",
            file.size(),
            src.len()
        );
        let mode = if opts.mixed_mode {
            Mode::Text
        } else {
            Mode::Code
        };
        let mut s = Self {
            file,
            src,
            end: src.len(),
            opts,
            handler,
            pending: Vec::new(),
            error_count: 0,
            ch: None,
            offset: 0,
            read_offset: 0,
            line_offset: 0,
            insert_semi: false,
            mode,
            in_value: false,
            trim_next_text: false,
            parens: 0,
            bracks: 0,
            braces: 0,
            pool: VecDeque::new(),
            eof: None,
        };
        s.next();
        if s.ch == Some(BOM) {
            s.next();
            s.line_offset = s.offset;
        }
        s
    }

    #[must_use]
    pub const fn options(&self) -> &ScannerOptions {
        &self.opts
    }

    #[must_use]
    pub const fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    /// Number of errors reported so far.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.error_count
    }

    /// Drain errors buffered because no handler was installed.
    pub fn take_errors(&mut self) -> Vec<(SourceFilePos, ScanErrorKind)> {
        std::mem::take(&mut self.pending)
    }

    /// Switch mixed mode on or off from the current position.
    pub fn set_mixed(&mut self, on: bool) {
        if on == self.opts.mixed_mode {
            return;
        }
        debug!(on, "mixed mode changed");
        self.opts.mixed_mode = on;
        self.mode = if on { Mode::Text } else { Mode::Code };
        self.in_value = false;
        self.insert_semi = false;
        self.reset_nesting();
    }

    /// Replace the mixed-mode delimiters; empty values are ignored.
    pub fn set_delimiter(&mut self, start: Option<&str>, end: Option<&str>) {
        if let Some(start) = start.filter(|s| !s.is_empty()) {
            self.opts.mixed_delimiter.start = start.to_string();
        }
        if let Some(end) = end.filter(|s| !s.is_empty()) {
            self.opts.mixed_delimiter.end = end.to_string();
        }
    }

    pub const fn set_floats_as_decimal(&mut self, on: bool) {
        self.opts.floats_as_decimal = on;
    }

    pub const fn set_char_as_string(&mut self, on: bool) {
        self.opts.char_as_string = on;
    }

    pub const fn set_mixed_value_sugar(&mut self, on: bool) {
        self.opts.mixed_value_sugar = on;
    }

    /// Return the next token.
    ///
    /// Pooled tokens are delivered first. Once the end of input is reached
    /// every further call returns the same `Eof` token.
    pub fn scan(&mut self) -> Token {
        if let Some(tok) = self.pool.pop_front() {
            return tok;
        }
        if let Some(eof) = &self.eof {
            return eof.clone();
        }
        let mut tok = if self.opts.mixed_mode && self.mode == Mode::Text {
            self.scan_text()
        } else {
            self.scan_code()
        };
        if tok.kind == TokenKind::Eof {
            self.eof = Some(tok.clone());
        }
        let mut prepended = std::mem::take(&mut tok.prepended).into_iter();
        match prepended.next() {
            Some(first) => {
                self.pool.extend(prepended);
                self.pool.push_back(tok);
                first
            }
            None => tok,
        }
    }

    fn next(&mut self) {
        if self.ch == Some('\n') {
            self.line_offset = self.read_offset;
            self.file.add_line(self.read_offset);
        }
        if self.read_offset >= self.end {
            self.offset = self.end;
            self.ch = None;
            return;
        }
        self.offset = self.read_offset;
        let (decoded, width) = decode(&self.src[self.read_offset..self.end]);
        self.read_offset += width;
        let ch = match decoded {
            Some(BOM) if self.offset > 0 => {
                self.error(self.offset, ScanErrorKind::IllegalByteOrderMark);
                BOM
            }
            Some(ch) => ch,
            None => {
                self.error(self.offset, ScanErrorKind::IllegalEncoding);
                char::REPLACEMENT_CHARACTER
            }
        };
        self.ch = Some(ch);
    }

    fn error(&mut self, offset: usize, kind: ScanErrorKind) {
        let pos = self.file.position(self.file.file_pos(offset));
        self.report(pos, kind);
    }

    fn report(&mut self, pos: SourceFilePos, kind: ScanErrorKind) {
        self.error_count += 1;
        debug!(%pos, error = %kind, "scan error");
        match self.handler.as_mut() {
            Some(handler) => handler(&pos, &kind),
            None => self.pending.push((pos, kind)),
        }
    }

    fn pos(&self, offset: usize) -> Pos {
        self.file.file_pos(offset)
    }

    fn byte_at(&self, i: usize) -> Option<u8> {
        (i < self.end).then(|| self.src[i])
    }

    fn peek(&self) -> Option<u8> {
        self.byte_at(self.read_offset)
    }

    fn has_prefix(&self, at: usize, s: &str) -> bool {
        !s.is_empty() && at <= self.end && self.src[at..self.end].starts_with(s.as_bytes())
    }

    fn slice(&self, from: usize, to: usize) -> String {
        String::from_utf8_lossy(&self.src[from..to]).into_owned()
    }

    fn advance_to(&mut self, offset: usize) {
        while self.ch.is_some() && self.offset < offset {
            self.next();
        }
    }

    const fn reset_nesting(&mut self) {
        self.parens = 0;
        self.bracks = 0;
        self.braces = 0;
    }

    const fn nested(&self) -> bool {
        self.parens + self.bracks + self.braces > 0
    }

    fn auto_semicolon(&self, offset: usize) -> Token {
        Token::new(TokenKind::Semicolon, "\n".to_string(), self.pos(offset))
            .with_flags(TokenFlags::INSERTED)
    }

    fn at_pragma(&self) -> bool {
        if self.opts.no_pragma || self.offset != self.line_offset || self.ch != Some('#') {
            return false;
        }
        let mut i = self.offset + 1;
        while matches!(self.byte_at(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        self.has_prefix(i, PRAGMA_KEY)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, Some(' ' | '\t' | '\r')) || (self.ch == Some('\n') && !self.insert_semi)
        {
            self.next();
        }
    }

    fn scan_text(&mut self) -> Token {
        let delim = self.opts.mixed_delimiter.start.clone();
        let start = self.offset;
        let mut flags = TokenFlags::empty();
        let stop = loop {
            if self.ch.is_none() {
                break TextStop::Eof;
            }
            if self.at_pragma() {
                break TextStop::Pragma;
            }
            if self.src[self.offset] == b'\\' && self.has_prefix(self.read_offset, &delim) {
                flags |= TokenFlags::ESCAPED;
                self.advance_to(self.read_offset + delim.len());
                continue;
            }
            if self.has_prefix(self.offset, &delim) {
                break TextStop::Delimiter;
            }
            self.next();
        };

        let src = self.src;
        let raw = &src[start..self.offset];
        let mut lo = 0;
        let mut hi = raw.len();
        if self.trim_next_text {
            self.trim_next_text = false;
            lo = raw.iter().take_while(|b| b.is_ascii_whitespace()).count();
        }

        match stop {
            TextStop::Delimiter => {
                let delim_offset = self.offset;
                let mut stop = delim_offset + delim.len();
                let mut delim_flags = TokenFlags::empty();
                if self.byte_at(stop) == Some(b'-') {
                    delim_flags |= TokenFlags::TRIM_RIGHT;
                    stop += 1;
                    hi = lo
                        + raw[lo..]
                            .iter()
                            .rposition(|b| !b.is_ascii_whitespace())
                            .map_or(0, |i| i + 1);
                }
                let value = self.byte_at(stop) == Some(b'=');
                if value {
                    stop += 1;
                }
                let text = self.text_token(start, lo, hi, flags);
                self.advance_to(stop);
                self.mode = Mode::Code;
                self.in_value = value;
                self.insert_semi = false;
                self.reset_nesting();
                debug!(value, "entering code block");
                let kind = if value {
                    TokenKind::ValueBegin
                } else {
                    TokenKind::CodeBegin
                };
                let mut tok = Token::new(kind, self.slice(delim_offset, stop), self.pos(delim_offset))
                    .with_flags(delim_flags);
                tok.prepended.extend(text);
                tok
            }
            TextStop::Pragma => match self.text_token(start, lo, hi, flags) {
                Some(text) => text,
                None => self.scan_pragma(),
            },
            TextStop::Eof => self.text_token(start, lo, hi, flags).unwrap_or_else(|| {
                Token::new(TokenKind::Eof, String::new(), self.pos(self.offset))
            }),
        }
    }

    fn text_token(&self, start: usize, lo: usize, hi: usize, flags: TokenFlags) -> Option<Token> {
        (lo < hi).then(|| {
            Token::new(
                TokenKind::Text,
                self.slice(start + lo, start + hi),
                self.pos(start + lo),
            )
            .with_flags(flags)
        })
    }

    /// End delimiter, optionally preceded by the `-` trim marker.
    fn scan_code_end(&mut self) -> Option<Token> {
        if self.nested() {
            return None;
        }
        let delim = self.opts.mixed_delimiter.end.clone();
        let offset = self.offset;
        let trim = self.ch == Some('-') && self.has_prefix(self.read_offset, &delim);
        if !trim && !self.has_prefix(offset, &delim) {
            return None;
        }
        let stop = if trim {
            self.read_offset + delim.len()
        } else {
            offset + delim.len()
        };
        self.advance_to(stop);
        self.insert_semi = false;
        self.mode = Mode::Text;
        self.trim_next_text = trim;
        let kind = if self.in_value {
            TokenKind::ValueEnd
        } else {
            TokenKind::CodeEnd
        };
        self.in_value = false;
        debug!("leaving code block");
        let flags = if trim {
            TokenFlags::TRIM_LEFT
        } else {
            TokenFlags::empty()
        };
        Some(Token::new(kind, self.slice(offset, stop), self.pos(offset)).with_flags(flags))
    }

    fn sub_scanner(&self, start: usize, end: usize) -> Scanner<'a> {
        let opts = ScannerOptions {
            comments: false,
            no_auto_semicolons: true,
            mixed_mode: false,
            no_pragma: true,
            ..self.opts.clone()
        };
        let mut sub = Scanner {
            file: Arc::clone(&self.file),
            src: self.src,
            end,
            opts,
            handler: None,
            pending: Vec::new(),
            error_count: 0,
            ch: None,
            offset: start,
            read_offset: start,
            line_offset: self.line_offset,
            insert_semi: false,
            mode: Mode::Code,
            in_value: false,
            trim_next_text: false,
            parens: 0,
            bracks: 0,
            braces: 0,
            pool: VecDeque::new(),
            eof: None,
        };
        sub.next();
        sub
    }

    fn scan_pragma(&mut self) -> Token {
        let start = self.offset;
        let mut body_start = start + 1;
        while matches!(self.byte_at(body_start), Some(b' ' | b'\t')) {
            body_start += 1;
        }
        body_start += PRAGMA_KEY.len();
        let mut body_end = body_start;
        while let Some(b) = self.byte_at(body_end) {
            if b == b'\n' || b == b';' {
                break;
            }
            body_end += 1;
        }

        let mut sub = self.sub_scanner(body_start, body_end);
        let mut run = Vec::new();
        loop {
            let tok = sub.scan();
            if tok.kind == TokenKind::Eof {
                break;
            }
            run.push(tok);
        }
        for (pos, kind) in sub.take_errors() {
            self.report(pos, kind);
        }

        self.advance_to(body_end);
        if matches!(self.ch, Some('\n' | ';')) {
            self.next();
        }
        self.insert_semi = false;
        debug!(tokens = run.len(), "scanned pragma");

        let open = Token::new(
            TokenKind::ConfigStart,
            self.slice(start, body_start),
            self.pos(start),
        );
        let mut close = Token::new(TokenKind::ConfigEnd, String::new(), self.pos(body_end));
        close.prepended.push(open);
        close.prepended.extend(run);
        close
    }

    #[allow(clippy::too_many_lines)]
    fn scan_code(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            let offset = self.offset;
            if self.opts.mixed_mode {
                if let Some(tok) = self.scan_code_end() {
                    return tok;
                }
            }
            if self.at_pragma() {
                return self.scan_pragma();
            }
            let Some(ch) = self.ch else {
                if self.insert_semi {
                    self.insert_semi = false;
                    return self.auto_semicolon(offset);
                }
                return Token::new(TokenKind::Eof, String::new(), self.pos(offset));
            };

            if ch == '#' || (ch == '/' && matches!(self.peek(), Some(b'/' | b'*'))) {
                if self.insert_semi && self.comment_ends_line() {
                    self.insert_semi = false;
                    return self.auto_semicolon(offset);
                }
                let text = self.scan_comment();
                if self.opts.comments {
                    return Token::new(TokenKind::Comment, text, self.pos(offset));
                }
                continue;
            }

            let pos = self.pos(offset);
            let mut insert_semi = false;
            let (kind, literal) = if is_letter(ch) {
                let literal = self.scan_identifier();
                let kind = if literal.len() > 1 {
                    lookup(&literal)
                } else {
                    TokenKind::Ident
                };
                insert_semi = kind.ends_statement();
                (kind, literal)
            } else if ch.is_ascii_digit()
                || (ch == '.' && self.peek().is_some_and(|b| b.is_ascii_digit()))
            {
                insert_semi = true;
                self.scan_number()
            } else {
                self.next();
                match ch {
                    '\n' => {
                        self.insert_semi = false;
                        return self.auto_semicolon(offset);
                    }
                    '"' => {
                        insert_semi = true;
                        (TokenKind::String, self.scan_quoted(offset, '"'))
                    }
                    '\'' => {
                        insert_semi = true;
                        self.scan_char(offset)
                    }
                    '`' => {
                        insert_semi = true;
                        self.scan_raw(offset)
                    }
                    ':' => (self.switch2(TokenKind::Colon, TokenKind::Define), String::new()),
                    '.' => {
                        let kind = if self.ch == Some('.') && self.peek() == Some(b'.') {
                            self.next();
                            self.next();
                            TokenKind::Ellipsis
                        } else if self.ch == Some('|') {
                            self.next();
                            TokenKind::Pipe
                        } else {
                            TokenKind::Period
                        };
                        (kind, String::new())
                    }
                    ',' => (TokenKind::Comma, String::new()),
                    ';' => (TokenKind::Semicolon, ";".to_string()),
                    '(' => {
                        self.parens += 1;
                        (TokenKind::LParen, String::new())
                    }
                    ')' => {
                        insert_semi = true;
                        self.parens = self.parens.saturating_sub(1);
                        (TokenKind::RParen, String::new())
                    }
                    '[' => {
                        self.bracks += 1;
                        (TokenKind::LBrack, String::new())
                    }
                    ']' => {
                        insert_semi = true;
                        self.bracks = self.bracks.saturating_sub(1);
                        (TokenKind::RBrack, String::new())
                    }
                    '{' => {
                        self.braces += 1;
                        (TokenKind::LBrace, String::new())
                    }
                    '}' => {
                        insert_semi = true;
                        self.braces = self.braces.saturating_sub(1);
                        (TokenKind::RBrace, String::new())
                    }
                    '+' => {
                        let kind = self.switch4(
                            TokenKind::Add,
                            TokenKind::AddAssign,
                            '+',
                            TokenKind::Inc,
                            TokenKind::IncAssign,
                        );
                        insert_semi = kind == TokenKind::Inc;
                        (kind, String::new())
                    }
                    '-' => {
                        let kind = self.switch4(
                            TokenKind::Sub,
                            TokenKind::SubAssign,
                            '-',
                            TokenKind::Dec,
                            TokenKind::DecAssign,
                        );
                        insert_semi = kind == TokenKind::Dec;
                        (kind, String::new())
                    }
                    '*' => (
                        self.switch4(
                            TokenKind::Mul,
                            TokenKind::MulAssign,
                            '*',
                            TokenKind::Pow,
                            TokenKind::PowAssign,
                        ),
                        String::new(),
                    ),
                    '/' => (self.switch2(TokenKind::Quo, TokenKind::QuoAssign), String::new()),
                    '%' => (self.switch2(TokenKind::Rem, TokenKind::RemAssign), String::new()),
                    '^' => (self.switch2(TokenKind::Xor, TokenKind::XorAssign), String::new()),
                    '<' => (
                        self.switch4(
                            TokenKind::Less,
                            TokenKind::LessEq,
                            '<',
                            TokenKind::Shl,
                            TokenKind::ShlAssign,
                        ),
                        String::new(),
                    ),
                    '>' => (
                        self.switch4(
                            TokenKind::Greater,
                            TokenKind::GreaterEq,
                            '>',
                            TokenKind::Shr,
                            TokenKind::ShrAssign,
                        ),
                        String::new(),
                    ),
                    '=' => {
                        let kind = match self.ch {
                            Some('=') => {
                                self.next();
                                TokenKind::Equal
                            }
                            Some('>') => {
                                self.next();
                                TokenKind::Lambda
                            }
                            _ => TokenKind::Assign,
                        };
                        (kind, String::new())
                    }
                    '!' => (self.switch2(TokenKind::Not, TokenKind::NotEqual), String::new()),
                    '&' => {
                        let kind = if self.ch == Some('^') {
                            self.next();
                            self.switch2(TokenKind::AndNot, TokenKind::AndNotAssign)
                        } else {
                            self.switch3(
                                TokenKind::And,
                                TokenKind::AndAssign,
                                '&',
                                TokenKind::LAnd,
                            )
                        };
                        (kind, String::new())
                    }
                    '|' => {
                        let kind = if self.ch == Some('|') {
                            self.next();
                            self.switch2(TokenKind::LOr, TokenKind::LOrAssign)
                        } else {
                            self.switch2(TokenKind::Or, TokenKind::OrAssign)
                        };
                        (kind, String::new())
                    }
                    '?' => {
                        let kind = match self.ch {
                            Some('.') if !self.peek().is_some_and(|b| b.is_ascii_digit()) => {
                                self.next();
                                TokenKind::NullishSelector
                            }
                            Some('?') => {
                                self.next();
                                self.switch2(TokenKind::Nullish, TokenKind::NullishAssign)
                            }
                            _ => TokenKind::Question,
                        };
                        (kind, String::new())
                    }
                    _ => {
                        self.error(offset, ScanErrorKind::IllegalCharacter(ch));
                        insert_semi = self.insert_semi;
                        (TokenKind::Illegal, ch.to_string())
                    }
                }
            };
            self.insert_semi = insert_semi && !self.opts.no_auto_semicolons;
            return Token::new(kind, literal, pos);
        }
    }

    fn switch2(&mut self, tok0: TokenKind, tok1: TokenKind) -> TokenKind {
        if self.ch == Some('=') {
            self.next();
            return tok1;
        }
        tok0
    }

    fn switch3(&mut self, tok0: TokenKind, tok1: TokenKind, ch2: char, tok2: TokenKind) -> TokenKind {
        if self.ch == Some('=') {
            self.next();
            return tok1;
        }
        if self.ch == Some(ch2) {
            self.next();
            return tok2;
        }
        tok0
    }

    fn switch4(
        &mut self,
        tok0: TokenKind,
        tok1: TokenKind,
        ch2: char,
        tok2: TokenKind,
        tok3: TokenKind,
    ) -> TokenKind {
        if self.ch == Some('=') {
            self.next();
            return tok1;
        }
        if self.ch == Some(ch2) {
            self.next();
            if self.ch == Some('=') {
                self.next();
                return tok3;
            }
            return tok2;
        }
        tok0
    }

    /// Whether the comment at the current position runs to the end of the
    /// line, so a pending semicolon must be emitted before it.
    fn comment_ends_line(&self) -> bool {
        let rest = &self.src[self.offset..self.end];
        if rest.starts_with(b"#") || rest.starts_with(b"//") {
            return true;
        }
        let body = &rest[2..];
        let Some(close) = body.windows(2).position(|w| w == b"*/") else {
            return true;
        };
        if body[..close].contains(&b'\n') {
            return true;
        }
        let after: Vec<u8> = body[close + 2..]
            .iter()
            .copied()
            .skip_while(|b| matches!(b, b' ' | b'\t' | b'\r'))
            .take(2)
            .collect();
        after.is_empty() || after[0] == b'\n' || after[0] == b'#' || after.starts_with(b"//")
    }

    fn scan_comment(&mut self) -> String {
        let start = self.offset;
        if self.ch == Some('#') || self.peek() == Some(b'/') {
            let end_delim = (self.opts.mixed_mode && !self.nested())
                .then(|| self.opts.mixed_delimiter.end.clone());
            while let Some(ch) = self.ch {
                if ch == '\n'
                    || end_delim
                        .as_deref()
                        .is_some_and(|d| self.has_prefix(self.offset, d))
                {
                    break;
                }
                self.next();
            }
            let text = self.slice(start, self.offset);
            return text.strip_suffix('\r').map_or(text.clone(), str::to_string);
        }
        self.next();
        self.next();
        loop {
            match self.ch {
                None => {
                    self.error(start, ScanErrorKind::UnterminatedComment);
                    break;
                }
                Some('*') if self.peek() == Some(b'/') => {
                    self.next();
                    self.next();
                    break;
                }
                Some(_) => self.next(),
            }
        }
        self.slice(start, self.offset)
    }

    fn scan_identifier(&mut self) -> String {
        let start = self.offset;
        while self.ch.is_some_and(|c| is_letter(c) || is_digit(c)) {
            self.next();
        }
        self.slice(start, self.offset)
    }

    fn scan_digits(&mut self, radix: u32) -> usize {
        let mut n = 0;
        while let Some(ch) = self.ch {
            if ch == '_' {
                self.next();
                continue;
            }
            if !ch.is_digit(radix) {
                break;
            }
            n += 1;
            self.next();
        }
        n
    }

    /// Whether the `.` after a digit run is a decimal point rather than a
    /// selector, pipe or ellipsis.
    fn dot_starts_fraction(&self) -> bool {
        let digit_at = |i: usize| self.byte_at(i).is_some_and(|b| b.is_ascii_digit());
        match self.peek() {
            None => true,
            Some(b) if b.is_ascii_digit() => true,
            Some(b'e' | b'E') => match self.byte_at(self.read_offset + 1) {
                Some(b'+' | b'-') => digit_at(self.read_offset + 2),
                _ => digit_at(self.read_offset + 1),
            },
            Some(b'|' | b'.' | b'(' | b'_') => false,
            Some(b) => b.is_ascii() && !b.is_ascii_alphabetic(),
        }
    }

    fn scan_number(&mut self) -> (TokenKind, String) {
        let start = self.offset;
        let mut kind = TokenKind::Int;
        let prefix = self.peek().map(|b| b.to_ascii_lowercase());
        if self.ch == Some('0') && matches!(prefix, Some(b'x' | b'o' | b'b')) {
            let radix = match prefix {
                Some(b'x') => 16,
                Some(b'o') => 8,
                _ => 2,
            };
            self.next();
            self.next();
            if self.scan_digits(radix) == 0 {
                let literal = self.slice(start, self.offset);
                self.error(start, ScanErrorKind::IllegalNumber(literal));
            }
            if self.ch == Some('u') {
                self.next();
                kind = TokenKind::Uint;
            }
        } else {
            let mut float = false;
            let leading_dot = self.ch == Some('.');
            if !leading_dot {
                self.scan_digits(10);
            }
            if self.ch == Some('.') && (leading_dot || self.dot_starts_fraction()) {
                float = true;
                self.next();
                self.scan_digits(10);
            }
            if matches!(self.ch, Some('e' | 'E')) {
                let exponent = match self.peek() {
                    Some(b'+' | b'-') => self
                        .byte_at(self.read_offset + 1)
                        .is_some_and(|b| b.is_ascii_digit()),
                    Some(b) => b.is_ascii_digit(),
                    None => false,
                };
                if exponent {
                    float = true;
                    self.next();
                    if matches!(self.ch, Some('+' | '-')) {
                        self.next();
                    }
                    self.scan_digits(10);
                }
            }
            if self.ch == Some('d') {
                self.next();
                kind = TokenKind::Decimal;
            } else if float {
                kind = if self.opts.floats_as_decimal {
                    TokenKind::Decimal
                } else {
                    TokenKind::Float
                };
            } else if self.ch == Some('u') {
                self.next();
                kind = TokenKind::Uint;
            }
        }
        if self.ch.is_some_and(|c| is_letter(c) || is_digit(c)) {
            while self.ch.is_some_and(|c| is_letter(c) || is_digit(c)) {
                self.next();
            }
            let literal = self.slice(start, self.offset);
            self.error(start, ScanErrorKind::IllegalNumber(literal.clone()));
            return (TokenKind::Illegal, literal);
        }
        (kind, self.slice(start, self.offset))
    }

    /// Validate one escape sequence after the backslash.
    fn scan_escape(&mut self, quote: char) -> bool {
        let offset = self.offset;
        let (n, radix, max) = match self.ch {
            Some(c) if c == quote || matches!(c, 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\') => {
                self.next();
                return true;
            }
            Some('0'..='7') => (3, 8, 255),
            Some('x') => {
                self.next();
                (2, 16, 255)
            }
            Some('u') => {
                self.next();
                (4, 16, 0x0010_FFFF)
            }
            Some('U') => {
                self.next();
                (8, 16, 0x0010_FFFF)
            }
            Some(c) => {
                self.error(offset, ScanErrorKind::UnknownEscape(c));
                return false;
            }
            None => {
                self.error(offset, ScanErrorKind::UnterminatedString);
                return false;
            }
        };
        let mut value: u32 = 0;
        for _ in 0..n {
            let Some(ch) = self.ch else {
                self.error(offset, ScanErrorKind::UnterminatedString);
                return false;
            };
            let Some(digit) = ch.to_digit(radix) else {
                self.error(self.offset, ScanErrorKind::IllegalEscapeDigit(ch));
                return false;
            };
            value = value * radix + digit;
            self.next();
        }
        if value > max || (0xD800..0xE000).contains(&value) {
            self.error(offset, ScanErrorKind::InvalidCodePoint);
            return false;
        }
        true
    }

    fn scan_quoted(&mut self, start: usize, quote: char) -> String {
        loop {
            match self.ch {
                None | Some('\n') => {
                    self.error(start, ScanErrorKind::UnterminatedString);
                    break;
                }
                Some('\\') => {
                    self.next();
                    self.scan_escape(quote);
                }
                Some(c) => {
                    self.next();
                    if c == quote {
                        break;
                    }
                }
            }
        }
        self.slice(start, self.offset)
    }

    fn scan_char(&mut self, start: usize) -> (TokenKind, String) {
        if self.opts.char_as_string {
            return (TokenKind::String, self.scan_quoted(start, '\''));
        }
        let mut n = 0;
        let mut valid = true;
        loop {
            match self.ch {
                None | Some('\n') => {
                    self.error(start, ScanErrorKind::UnterminatedChar);
                    valid = false;
                    break;
                }
                Some('\'') => {
                    self.next();
                    break;
                }
                Some('\\') => {
                    self.next();
                    if !self.scan_escape('\'') {
                        valid = false;
                    }
                    n += 1;
                }
                Some(_) => {
                    self.next();
                    n += 1;
                }
            }
        }
        if valid && n != 1 {
            self.error(start, ScanErrorKind::IllegalCharLiteral);
        }
        (TokenKind::Char, self.slice(start, self.offset))
    }

    /// Raw string, or heredoc when opened by three or more backticks.
    fn scan_raw(&mut self, start: usize) -> (TokenKind, String) {
        let mut fence = 1;
        while self.ch == Some('`') {
            fence += 1;
            self.next();
        }
        if fence == 2 {
            return (TokenKind::RawString, self.slice(start, self.offset));
        }
        if fence == 1 {
            loop {
                match self.ch {
                    None => {
                        self.error(start, ScanErrorKind::UnterminatedRawString);
                        break;
                    }
                    Some('`') => {
                        self.next();
                        break;
                    }
                    Some(_) => self.next(),
                }
            }
            return (TokenKind::RawString, self.slice(start, self.offset));
        }
        loop {
            match self.ch {
                None => {
                    self.error(start, ScanErrorKind::UnterminatedHeredoc);
                    break;
                }
                Some('`') => {
                    let mut run = 0;
                    while self.ch == Some('`') && run < fence {
                        run += 1;
                        self.next();
                    }
                    if run == fence {
                        break;
                    }
                }
                Some(_) => self.next(),
            }
        }
        (TokenKind::RawHeredoc, self.slice(start, self.offset))
    }
}

fn decode(bytes: &[u8]) -> (Option<char>, usize) {
    let width = match bytes[0] {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return (None, 1),
    };
    if bytes.len() < width {
        return (None, 1);
    }
    match std::str::from_utf8(&bytes[..width]) {
        Ok(s) => (s.chars().next(), width),
        Err(_) => (None, 1),
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (!c.is_ascii() && c.is_alphabetic())
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || (!c.is_ascii() && c.is_numeric())
}

fn take_digits(chars: &mut std::str::Chars<'_>, n: usize, radix: u32) -> Option<u32> {
    let mut value = 0;
    for _ in 0..n {
        value = value * radix + chars.next()?.to_digit(radix)?;
    }
    Some(value)
}

/// Value of a quoted or raw string (or char) literal, `None` if malformed.
#[must_use]
pub fn unquote(literal: &str) -> Option<String> {
    let quote = literal.chars().next()?;
    if quote == '`' {
        let body = literal.strip_prefix('`')?.strip_suffix('`')?;
        return Some(body.replace('\r', ""));
    }
    if literal.len() < 2 {
        return None;
    }
    let body = literal.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0C',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0B',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            d @ '0'..='7' => {
                let high = d.to_digit(8)?;
                let low = take_digits(&mut chars, 2, 8)?;
                char::from_u32(high * 64 + low)?
            }
            'x' => char::from_u32(take_digits(&mut chars, 2, 16)?)?,
            'u' => char::from_u32(take_digits(&mut chars, 4, 16)?)?,
            'U' => char::from_u32(take_digits(&mut chars, 8, 16)?)?,
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

/// Content of a heredoc literal: fences removed, plus the line break right
/// after the opening fence and the one right before the closing fence.
#[must_use]
pub fn heredoc_value(literal: &str) -> String {
    let fence = literal.bytes().take_while(|&b| b == b'`').count();
    let body = literal.get(fence..literal.len().saturating_sub(fence)).unwrap_or("");
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    let body = body
        .strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body);
    body.to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::source::SourceFileSet;

    fn scan_all(src: &str, opts: ScannerOptions) -> Vec<Token> {
        let set = SourceFileSet::new();
        let file = set.add_file("test", None, src.len());
        let mut s = Scanner::new(file, src.as_bytes(), opts, None);
        let mut out = Vec::new();
        loop {
            let tok = s.scan();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    fn kinds(src: &str, opts: ScannerOptions) -> Vec<TokenKind> {
        scan_all(src, opts).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn operators_use_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds("a ||= b ?? c **= d ?. e .| f => ...", ScannerOptions::default()),
            vec![
                Ident, LOrAssign, Ident, Nullish, Ident, PowAssign, Ident, NullishSelector,
                Ident, Pipe, Ident, Lambda, Ellipsis, Eof
            ]
        );
    }

    #[test]
    fn newline_after_operand_becomes_semicolon() {
        let toks = scan_all("a\nb", ScannerOptions::default());
        assert_eq!(toks[1].kind, TokenKind::Semicolon);
        assert_eq!(toks[1].literal, "\n");
        assert!(toks[1].flags.contains(TokenFlags::INSERTED));
        assert_eq!(toks[3].kind, TokenKind::Semicolon);
        assert_eq!(toks[4].kind, TokenKind::Eof);
    }

    #[test]
    fn no_semicolon_after_operator() {
        use TokenKind::*;
        assert_eq!(
            kinds("a +\nb", ScannerOptions::default()),
            vec![Ident, Add, Ident, Semicolon, Eof]
        );
        assert_eq!(
            kinds("a\nb", ScannerOptions::default().no_auto_semicolons(true)),
            vec![Ident, Ident, Eof]
        );
    }

    #[test]
    fn eof_is_sticky() {
        let set = SourceFileSet::new();
        let file = set.add_file("test", None, 1);
        let mut s = Scanner::new(file, b"1", ScannerOptions::default(), None);
        let _ = s.scan();
        let _ = s.scan();
        let first = s.scan();
        let second = s.scan();
        assert_eq!(first.kind, TokenKind::Eof);
        assert_eq!(first, second);
    }

    #[test]
    fn number_kinds() {
        use TokenKind::*;
        assert_eq!(
            kinds("1 2u 1.5 2d 0x1F 1e3 1_000", ScannerOptions::default()),
            vec![Int, Uint, Float, Decimal, Int, Float, Int, Semicolon, Eof]
        );
        assert_eq!(
            kinds("1.5", ScannerOptions::default().floats_as_decimal(true)),
            vec![Decimal, Semicolon, Eof]
        );
    }

    #[test]
    fn comments_are_skipped_or_emitted() {
        use TokenKind::*;
        assert_eq!(
            kinds("a // x\n# y\nb", ScannerOptions::default()),
            vec![Ident, Semicolon, Ident, Semicolon, Eof]
        );
        assert_eq!(
            kinds("a /* x */ b", ScannerOptions::default().comments(true)),
            vec![Ident, Comment, Ident, Semicolon, Eof]
        );
    }

    #[test]
    fn mixed_text_and_code() {
        use TokenKind::*;
        let toks = scan_all("a#{ x }b", ScannerOptions::default().mixed(true));
        let got: Vec<_> = toks.iter().map(|t| (t.kind, t.literal.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (Text, "a"),
                (CodeBegin, "#{"),
                (Ident, "x"),
                (CodeEnd, "}"),
                (Text, "b"),
                (Eof, "")
            ]
        );
    }

    #[test]
    fn end_delimiter_ignored_inside_nesting() {
        use TokenKind::*;
        assert_eq!(
            kinds("#{ f({a: 1}) }", ScannerOptions::default().mixed(true)),
            vec![
                CodeBegin, Ident, LParen, LBrace, Ident, Colon, Int, RBrace, RParen, CodeEnd,
                Eof
            ]
        );
    }

    #[test]
    fn value_block_and_trim_markers() {
        let toks = scan_all("a  #{-= x -}  b", ScannerOptions::default().mixed(true));
        assert_eq!(toks[0].literal, "a");
        assert_eq!(toks[1].kind, TokenKind::ValueBegin);
        assert!(toks[1].flags.contains(TokenFlags::TRIM_RIGHT));
        assert_eq!(toks[3].kind, TokenKind::ValueEnd);
        assert!(toks[3].flags.contains(TokenFlags::TRIM_LEFT));
        assert_eq!(toks[4].literal, "b");
    }

    #[test]
    fn escaped_start_delimiter_stays_text() {
        let toks = scan_all(r"a \#{ b", ScannerOptions::default().mixed(true));
        assert_eq!(toks[0].kind, TokenKind::Text);
        assert_eq!(toks[0].literal, r"a \#{ b");
        assert!(toks[0].flags.contains(TokenFlags::ESCAPED));
        assert_eq!(toks[1].kind, TokenKind::Eof);
    }

    #[test]
    fn pragma_line_becomes_config_run() {
        use TokenKind::*;
        assert_eq!(
            kinds("# gad: mixed, mixed_start=\"[[\"\nx", ScannerOptions::default()),
            vec![
                ConfigStart, Ident, Comma, Ident, Assign, String, ConfigEnd, Ident, Semicolon,
                Eof
            ]
        );
        assert_eq!(
            kinds("# gad: mixed\n", ScannerOptions::default().no_pragma(true)),
            vec![Eof]
        );
    }

    #[test]
    fn heredoc_and_raw_strings() {
        let toks = scan_all("```\nhi `x`\n``` `raw`", ScannerOptions::default());
        assert_eq!(toks[0].kind, TokenKind::RawHeredoc);
        assert_eq!(heredoc_value(&toks[0].literal), "hi `x`");
        assert_eq!(toks[1].kind, TokenKind::RawString);
        assert_eq!(toks[1].literal, "`raw`");
    }

    #[test]
    fn errors_reach_the_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let src = "\"abc\nx";
        let set = SourceFileSet::new();
        let file = set.add_file("test", None, src.len());
        let mut s = Scanner::new(
            file,
            src.as_bytes(),
            ScannerOptions::default(),
            Some(Box::new(move |pos: &SourceFilePos, kind: &ScanErrorKind| {
                sink.borrow_mut().push((pos.line, pos.column, kind.clone()));
            })),
        );
        while s.scan().kind != TokenKind::Eof {}
        assert_eq!(
            *seen.borrow(),
            vec![(1, 1, ScanErrorKind::UnterminatedString)]
        );
        assert_eq!(s.error_count(), 1);
    }

    #[test]
    fn char_literals() {
        let toks = scan_all("'a' '\\n' 'ab'", ScannerOptions::default());
        assert_eq!(toks[0].kind, TokenKind::Char);
        assert_eq!(unquote(&toks[1].literal).as_deref(), Some("\n"));
        let set = SourceFileSet::new();
        let file = set.add_file("test", None, 4);
        let mut s = Scanner::new(file, b"'ab'", ScannerOptions::default(), None);
        let _ = s.scan();
        assert_eq!(s.take_errors()[0].1, ScanErrorKind::IllegalCharLiteral);
    }

    #[test]
    fn unquote_escapes() {
        assert_eq!(unquote(r#""a\tbé\x41""#).as_deref(), Some("a\tbéA"));
        assert_eq!(unquote("`a\\n`").as_deref(), Some("a\\n"));
        assert_eq!(unquote(r#""\q""#), None);
    }
}
