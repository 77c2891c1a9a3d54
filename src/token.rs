use std::fmt;

use bitflags::bitflags;

use crate::source::Pos;

/// Token kinds produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,
    Comment,
    /// Start of a `# gad:` pragma line.
    ConfigStart,
    /// End of a `# gad:` pragma line.
    ConfigEnd,
    /// Raw text run in mixed mode.
    Text,
    /// Mixed-mode start delimiter opening a code block.
    CodeBegin,
    /// Mixed-mode end delimiter closing a code block.
    CodeEnd,
    /// Start delimiter followed by `=`, emitting the value as text.
    ValueBegin,
    /// End delimiter closing a value block.
    ValueEnd,

    Ident,
    Int,
    Uint,
    Float,
    Decimal,
    Char,
    String,
    RawString,
    RawHeredoc,

    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    Pow,

    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    PowAssign,
    LOrAssign,
    NullishAssign,
    IncAssign,
    DecAssign,

    LAnd,
    LOr,
    Nullish,
    Inc,
    Dec,
    Equal,
    Less,
    Greater,
    Assign,
    Not,
    NotEqual,
    LessEq,
    GreaterEq,
    Define,
    Ellipsis,
    LParen,
    LBrack,
    LBrace,
    Comma,
    Period,
    RParen,
    RBrack,
    RBrace,
    Semicolon,
    Colon,
    Question,
    NullishSelector,
    Pipe,
    Lambda,

    Break,
    Continue,
    Else,
    For,
    Func,
    If,
    Return,
    True,
    False,
    Yes,
    No,
    In,
    Nil,
    Import,
    Embed,
    Param,
    Global,
    Var,
    Const,
    Try,
    Catch,
    Finally,
    Throw,
    Callee,
    Args,
    NamedArgs,
}

/// Lowest binary precedence.
pub const LOWEST_PREC: u8 = 0;

impl TokenKind {
    /// Canonical source text of operators and keywords, or a descriptive
    /// name for the other kinds.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Illegal => "ILLEGAL",
            Self::Eof => "EOF",
            Self::Comment => "COMMENT",
            Self::ConfigStart => "CONFIG",
            Self::ConfigEnd => "CONFIG_END",
            Self::Text => "TEXT",
            Self::CodeBegin => "CODE_BEGIN",
            Self::CodeEnd => "CODE_END",
            Self::ValueBegin => "VALUE_BEGIN",
            Self::ValueEnd => "VALUE_END",
            Self::Ident => "IDENT",
            Self::Int => "INT",
            Self::Uint => "UINT",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::String => "STRING",
            Self::RawString => "RAW_STRING",
            Self::RawHeredoc => "RAW_HEREDOC",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Quo => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::AndNot => "&^",
            Self::Pow => "**",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::QuoAssign => "/=",
            Self::RemAssign => "%=",
            Self::AndAssign => "&=",
            Self::OrAssign => "|=",
            Self::XorAssign => "^=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::AndNotAssign => "&^=",
            Self::PowAssign => "**=",
            Self::LOrAssign => "||=",
            Self::NullishAssign => "??=",
            Self::IncAssign => "++=",
            Self::DecAssign => "--=",
            Self::LAnd => "&&",
            Self::LOr => "||",
            Self::Nullish => "??",
            Self::Inc => "++",
            Self::Dec => "--",
            Self::Equal => "==",
            Self::Less => "<",
            Self::Greater => ">",
            Self::Assign => "=",
            Self::Not => "!",
            Self::NotEqual => "!=",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::Define => ":=",
            Self::Ellipsis => "...",
            Self::LParen => "(",
            Self::LBrack => "[",
            Self::LBrace => "{",
            Self::Comma => ",",
            Self::Period => ".",
            Self::RParen => ")",
            Self::RBrack => "]",
            Self::RBrace => "}",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Question => "?",
            Self::NullishSelector => "?.",
            Self::Pipe => ".|",
            Self::Lambda => "=>",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Else => "else",
            Self::For => "for",
            Self::Func => "func",
            Self::If => "if",
            Self::Return => "return",
            Self::True => "true",
            Self::False => "false",
            Self::Yes => "yes",
            Self::No => "no",
            Self::In => "in",
            Self::Nil => "nil",
            Self::Import => "import",
            Self::Embed => "embed",
            Self::Param => "param",
            Self::Global => "global",
            Self::Var => "var",
            Self::Const => "const",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Throw => "throw",
            Self::Callee => "__callee__",
            Self::Args => "__args__",
            Self::NamedArgs => "__named_args__",
        }
    }

    /// Binary operator precedence, `LOWEST_PREC` for non-operators.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::LOr | Self::Nullish => 1,
            Self::LAnd => 2,
            Self::Equal | Self::NotEqual => 3,
            Self::Less | Self::LessEq | Self::Greater | Self::GreaterEq => 4,
            Self::Or | Self::Xor | Self::And | Self::AndNot => 5,
            Self::Shl | Self::Shr => 6,
            Self::Add | Self::Sub => 7,
            Self::Mul | Self::Quo | Self::Rem => 8,
            Self::Pow => 9,
            _ => LOWEST_PREC,
        }
    }

    /// Whether a binary operator groups to the right.
    #[must_use]
    pub const fn is_right_assoc(self) -> bool {
        matches!(self, Self::Pow)
    }

    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Break
                | Self::Continue
                | Self::Else
                | Self::For
                | Self::Func
                | Self::If
                | Self::Return
                | Self::True
                | Self::False
                | Self::Yes
                | Self::No
                | Self::In
                | Self::Nil
                | Self::Import
                | Self::Embed
                | Self::Param
                | Self::Global
                | Self::Var
                | Self::Const
                | Self::Try
                | Self::Catch
                | Self::Finally
                | Self::Throw
                | Self::Callee
                | Self::Args
                | Self::NamedArgs
        )
    }

    /// Compound assignment operators, including `=` and `:=`.
    #[must_use]
    pub const fn is_assign(self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::Define
                | Self::AddAssign
                | Self::SubAssign
                | Self::MulAssign
                | Self::QuoAssign
                | Self::RemAssign
                | Self::AndAssign
                | Self::OrAssign
                | Self::XorAssign
                | Self::ShlAssign
                | Self::ShrAssign
                | Self::AndNotAssign
                | Self::PowAssign
                | Self::LOrAssign
                | Self::NullishAssign
                | Self::IncAssign
                | Self::DecAssign
        )
    }

    /// Whether a token of this kind may end a statement, so that a
    /// following newline becomes a semicolon.
    #[must_use]
    pub const fn ends_statement(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Int
                | Self::Uint
                | Self::Float
                | Self::Decimal
                | Self::Char
                | Self::String
                | Self::RawString
                | Self::RawHeredoc
                | Self::Break
                | Self::Continue
                | Self::Return
                | Self::True
                | Self::False
                | Self::Yes
                | Self::No
                | Self::Nil
                | Self::Callee
                | Self::Args
                | Self::NamedArgs
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBrack
                | Self::RBrace
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword lookup for an identifier.
///
/// Block keywords map onto brace kinds so `do ... end` and `{ ... }`
/// share one grammar path.
#[must_use]
pub fn lookup(ident: &str) -> TokenKind {
    match ident {
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "func" => TokenKind::Func,
        "if" => TokenKind::If,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "yes" => TokenKind::Yes,
        "no" => TokenKind::No,
        "in" => TokenKind::In,
        "nil" => TokenKind::Nil,
        "import" => TokenKind::Import,
        "embed" => TokenKind::Embed,
        "param" => TokenKind::Param,
        "global" => TokenKind::Global,
        "var" => TokenKind::Var,
        "const" => TokenKind::Const,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "throw" => TokenKind::Throw,
        "__callee__" => TokenKind::Callee,
        "__args__" => TokenKind::Args,
        "__named_args__" => TokenKind::NamedArgs,
        "do" | "then" | "begin" => TokenKind::LBrace,
        "end" | "done" => TokenKind::RBrace,
        _ => TokenKind::Ident,
    }
}

bitflags! {
    /// Side flags attached to a scanned token.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// Semicolon synthesized from a newline or end of file.
        const INSERTED = 1 << 0;
        /// Strip leading whitespace of the following text.
        const TRIM_LEFT = 1 << 1;
        /// Strip trailing whitespace of the preceding text.
        const TRIM_RIGHT = 1 << 2;
        /// Text contained an escaped start delimiter.
        const ESCAPED = 1 << 3;
    }
}

/// A single token with its kind, literal text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub pos: Pos,
    pub flags: TokenFlags,
    /// Tokens that must be delivered, in order, before this one.
    pub prepended: Vec<Self>,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, literal: String, pos: Pos) -> Self {
        Self {
            kind,
            literal,
            pos,
            flags: TokenFlags::empty(),
            prepended: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Literal text for display; falls back to the kind's spelling.
    #[must_use]
    pub fn text(&self) -> &str {
        if self.literal.is_empty() {
            self.kind.as_str()
        } else {
            &self.literal
        }
    }
}
