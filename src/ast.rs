//! Syntax tree produced by the parser.
//!
//! Two closed families, [`Expr`] and [`Stmt`], each variant carrying only
//! the fields it needs. Every node reports a start and end [`Pos`];
//! canonical printing lives in [`formatter`](crate::formatter).

use std::sync::Arc;

use crate::source::{Pos, SourceFile};
use crate::token::{TokenFlags, TokenKind};

/// Parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    pub input_file: Arc<SourceFile>,
    pub stmts: Vec<Stmt>,
    pub comments: Vec<CommentGroup>,
}

/// A single `//`, `/* */` or `#` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub pos: Pos,
    pub text: String,
}

/// Comments on adjacent lines with nothing in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub list: Vec<Comment>,
}

impl CommentGroup {
    /// Comment text without markers, one line per comment.
    #[must_use]
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for c in &self.list {
            let t = c.text.as_str();
            let t = if let Some(rest) = t.strip_prefix("//") {
                rest
            } else if let Some(rest) = t.strip_prefix('#') {
                rest
            } else if let Some(rest) = t.strip_prefix("/*") {
                rest.strip_suffix("*/").unwrap_or(rest)
            } else {
                t
            };
            lines.push(t.trim().to_string());
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    #[must_use]
    pub fn end(&self) -> Pos {
        self.pos.add(self.name.len())
    }
}

/// Literal value with the source text it was scanned from.
#[derive(Debug, Clone, PartialEq)]
pub struct Lit<T> {
    pub value: T,
    pub literal: String,
    pub pos: Pos,
}

impl<T> Lit<T> {
    #[must_use]
    pub fn end(&self) -> Pos {
        self.pos.add(self.literal.len())
    }
}

/// Prefix operator, plus the nil checks folded from `x == nil` / `x != nil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Null,
    NotNull,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "^",
            Self::Null => "== nil",
            Self::NotNull => "!= nil",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLit {
    pub lbrack: Pos,
    pub elements: Vec<Expr>,
    pub rbrack: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictElement {
    pub key: String,
    pub key_pos: Pos,
    pub value: Expr,
}

/// `{key: value, ...}`; duplicate keys are kept, later ones win at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct DictLit {
    pub lbrace: Pos,
    pub elements: Vec<DictElement>,
    pub rbrace: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub lhs: Box<Expr>,
    pub op: TokenKind,
    pub op_pos: Pos,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub op_pos: Pos,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondExpr {
    pub cond: Box<Expr>,
    pub question: Pos,
    pub if_true: Box<Expr>,
    pub colon: Pos,
    pub if_false: Box<Expr>,
}

/// One `name=value` entry of a call or tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArg {
    /// Identifier or string literal.
    pub name: Expr,
    pub value: Expr,
}

/// Arguments of a call or a multi-paren tuple.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallArgs {
    pub positional: Vec<Expr>,
    /// `*expr`
    pub var: Option<Box<Expr>>,
    pub named: Vec<NamedArg>,
    /// `**expr`
    pub var_named: Option<Box<Expr>>,
}

impl CallArgs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
            && self.var.is_none()
            && self.named.is_empty()
            && self.var_named.is_none()
    }

    #[must_use]
    pub fn has_named(&self) -> bool {
        !self.named.is_empty() || self.var_named.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub func: Box<Expr>,
    pub lparen: Pos,
    pub args: CallArgs,
    pub rparen: Pos,
    /// Written as `x .| f(...)`; `x` is the first positional argument.
    pub piped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub expr: Box<Expr>,
    pub lbrack: Pos,
    pub index: Box<Expr>,
    pub rbrack: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub expr: Box<Expr>,
    pub lbrack: Pos,
    pub low: Option<Box<Expr>>,
    pub high: Option<Box<Expr>>,
    pub rbrack: Pos,
}

/// `x.name`, `x.(expr)` and their `?.` forms.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorExpr {
    pub expr: Box<Expr>,
    /// `.name` is stored as a string literal.
    pub sel: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub lparen: Pos,
    pub expr: Box<Expr>,
    pub rparen: Pos,
}

/// `(a, *b; c=1, **d)`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiParenExpr {
    pub lparen: Pos,
    pub args: CallArgs,
    pub rparen: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    /// Identifier or string literal.
    pub key: Expr,
    pub value: Option<Expr>,
}

/// `(;a=1, b=2)`
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueArrayLit {
    pub lparen: Pos,
    pub elements: Vec<KeyValue>,
    pub rparen: Pos,
}

/// Identifier with an optional union type annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedIdent {
    pub ident: Ident,
    pub types: Vec<Ident>,
}

impl TypedIdent {
    #[must_use]
    pub fn end(&self) -> Pos {
        self.types.last().map_or_else(|| self.ident.end(), Ident::end)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgsList {
    pub values: Vec<TypedIdent>,
    pub var: Option<TypedIdent>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedArgsList {
    pub names: Vec<TypedIdent>,
    pub values: Vec<Expr>,
    pub var: Option<TypedIdent>,
}

impl NamedArgsList {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.var.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncParams {
    pub lparen: Pos,
    pub args: ArgsList,
    pub named: NamedArgsList,
    pub rparen: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub func_pos: Pos,
    pub name: Option<Ident>,
    pub params: FuncParams,
    pub body: BlockStmt,
}

/// Function whose body is a single expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureLit {
    pub pos: Pos,
    pub params: FuncParams,
    pub lambda: Pos,
    pub body: Box<Expr>,
}

/// `import("name")`; the name is resolved elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportExpr {
    pub pos: Pos,
    pub module_name: String,
    pub rparen: Pos,
}

/// `embed("path")`; the resource is loaded elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedExpr {
    pub pos: Pos,
    pub path: String,
    pub rparen: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnExpr {
    pub pos: Pos,
    pub result: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Int(Lit<i64>),
    Uint(Lit<u64>),
    Float(Lit<f64>),
    /// Exact base-10 value kept as its canonical text.
    Decimal(Lit<String>),
    Char(Lit<char>),
    String(Lit<String>),
    RawString(Lit<String>),
    RawHeredoc(Lit<String>),
    Bool(Lit<bool>),
    /// `yes` / `no`
    Flag(Lit<bool>),
    Nil(Pos),
    Array(ArrayLit),
    Dict(DictLit),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Cond(CondExpr),
    Call(CallExpr),
    Index(IndexExpr),
    Slice(SliceExpr),
    Selector(SelectorExpr),
    NullishSelector(SelectorExpr),
    Paren(ParenExpr),
    MultiParen(MultiParenExpr),
    KeyValueArray(KeyValueArrayLit),
    Func(FuncLit),
    Closure(ClosureLit),
    Import(ImportExpr),
    Embed(EmbedExpr),
    Callee(Pos),
    Args(Pos),
    NamedArgs(Pos),
    Return(ReturnExpr),
    /// Placeholder for an expression that failed to parse.
    Bad { from: Pos, to: Pos },
}

impl Expr {
    #[must_use]
    pub fn pos(&self) -> Pos {
        match self {
            Self::Ident(id) => id.pos,
            Self::Int(l) => l.pos,
            Self::Uint(l) => l.pos,
            Self::Float(l) => l.pos,
            Self::Decimal(l) | Self::String(l) | Self::RawString(l) | Self::RawHeredoc(l) => {
                l.pos
            }
            Self::Char(l) => l.pos,
            Self::Bool(l) | Self::Flag(l) => l.pos,
            Self::Nil(p) | Self::Callee(p) | Self::Args(p) | Self::NamedArgs(p) => *p,
            Self::Array(a) => a.lbrack,
            Self::Dict(d) => d.lbrace,
            Self::Binary(b) => b.lhs.pos(),
            Self::Unary(u) => match u.op {
                UnaryOp::Null | UnaryOp::NotNull => u.expr.pos(),
                _ => u.op_pos,
            },
            Self::Cond(c) => c.cond.pos(),
            Self::Call(c) => {
                if c.piped {
                    c.args.positional.first().map_or_else(|| c.func.pos(), Self::pos)
                } else {
                    c.func.pos()
                }
            }
            Self::Index(i) => i.expr.pos(),
            Self::Slice(s) => s.expr.pos(),
            Self::Selector(s) | Self::NullishSelector(s) => s.expr.pos(),
            Self::Paren(p) => p.lparen,
            Self::MultiParen(m) => m.lparen,
            Self::KeyValueArray(k) => k.lparen,
            Self::Func(f) => f.func_pos,
            Self::Closure(c) => c.pos,
            Self::Import(i) => i.pos,
            Self::Embed(e) => e.pos,
            Self::Return(r) => r.pos,
            Self::Bad { from, .. } => *from,
        }
    }

    #[must_use]
    pub fn end(&self) -> Pos {
        match self {
            Self::Ident(id) => id.end(),
            Self::Int(l) => l.end(),
            Self::Uint(l) => l.end(),
            Self::Float(l) => l.end(),
            Self::Decimal(l) | Self::String(l) | Self::RawString(l) | Self::RawHeredoc(l) => {
                l.end()
            }
            Self::Char(l) => l.end(),
            Self::Bool(l) | Self::Flag(l) => l.end(),
            Self::Nil(p) => p.add(3),
            Self::Callee(p) => p.add("__callee__".len()),
            Self::Args(p) => p.add("__args__".len()),
            Self::NamedArgs(p) => p.add("__named_args__".len()),
            Self::Array(a) => a.rbrack.add(1),
            Self::Dict(d) => d.rbrace.add(1),
            Self::Binary(b) => b.rhs.end(),
            Self::Unary(u) => match u.op {
                UnaryOp::Null | UnaryOp::NotNull => u.op_pos.add(u.op.as_str().len()),
                _ => u.expr.end(),
            },
            Self::Cond(c) => c.if_false.end(),
            Self::Call(c) => c.rparen.add(1),
            Self::Index(i) => i.rbrack.add(1),
            Self::Slice(s) => s.rbrack.add(1),
            Self::Selector(s) | Self::NullishSelector(s) => s.sel.end(),
            Self::Paren(p) => p.rparen.add(1),
            Self::MultiParen(m) => m.rparen.add(1),
            Self::KeyValueArray(k) => k.rparen.add(1),
            Self::Func(f) => f.body.end(),
            Self::Closure(c) => c.body.end(),
            Self::Import(i) => i.rparen.add(1),
            Self::Embed(e) => e.rparen.add(1),
            Self::Return(r) => r
                .result
                .as_ref()
                .map_or_else(|| r.pos.add("return".len()), |e| e.end()),
            Self::Bad { to, .. } => *to,
        }
    }

    /// Whether this expression can appear on the left of an assignment.
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        matches!(
            self,
            Self::Ident(_) | Self::Index(_) | Self::Selector(_) | Self::NullishSelector(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub lbrace: Pos,
    pub stmts: Vec<Stmt>,
    pub rbrace: Pos,
}

impl BlockStmt {
    #[must_use]
    pub const fn end(&self) -> Pos {
        self.rbrace.add(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub op: TokenKind,
    pub op_pos: Pos,
    pub rhs: Vec<Expr>,
}

/// One entry of a `param`, `global`, `var` or `const` declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    /// `a` or `*a`
    Param { ident: TypedIdent, variadic: bool },
    /// `a=default` or `**a`
    NamedParam {
        ident: TypedIdent,
        value: Option<Expr>,
        variadic: bool,
    },
    /// `a` or `a = value`
    Value { ident: Ident, value: Option<Expr> },
}

impl Spec {
    #[must_use]
    pub const fn pos(&self) -> Pos {
        match self {
            Self::Param { ident, .. } | Self::NamedParam { ident, .. } => ident.ident.pos,
            Self::Value { ident, .. } => ident.pos,
        }
    }

    #[must_use]
    pub fn end(&self) -> Pos {
        match self {
            Self::Param { ident, .. } => ident.end(),
            Self::NamedParam { ident, value, .. } => {
                value.as_ref().map_or_else(|| ident.end(), Expr::end)
            }
            Self::Value { ident, value } => value.as_ref().map_or_else(|| ident.end(), Expr::end),
        }
    }
}

/// `param`, `global`, `var` or `const` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
    pub tok: TokenKind,
    pub tok_pos: Pos,
    pub lparen: Option<Pos>,
    pub specs: Vec<Spec>,
    pub rparen: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub if_pos: Pos,
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub body: BlockStmt,
    /// `else if ...` or `else { ... }`
    pub else_stmt: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub for_pos: Pos,
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: BlockStmt,
    /// Runs when the loop ends without `break`.
    pub else_block: Option<BlockStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInStmt {
    pub for_pos: Pos,
    pub key: Ident,
    pub value: Option<Ident>,
    pub iterable: Expr,
    pub body: BlockStmt,
    /// Runs when the loop ends without `break`.
    pub else_block: Option<BlockStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub catch_pos: Pos,
    pub ident: Option<Ident>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinallyClause {
    pub finally_pos: Pos,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub try_pos: Pos,
    pub body: BlockStmt,
    pub catch: Option<CatchClause>,
    pub finally: Option<FinallyClause>,
}

/// Raw text between code blocks in mixed mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedTextStmt {
    pub pos: Pos,
    /// Source text after trimming.
    pub literal: String,
    /// Text with escaped delimiters resolved.
    pub value: String,
    pub flags: TokenFlags,
}

/// A start or end delimiter in mixed mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterStmt {
    pub pos: Pos,
    pub literal: String,
    pub flags: TokenFlags,
}

/// `#{= expr }`: the value is appended to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedValueStmt {
    pub start: DelimiterStmt,
    pub expr: Expr,
    pub end: DelimiterStmt,
}

/// Options understood by a `# gad:` pragma.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    pub mixed: Option<bool>,
    pub mixed_start: Option<String>,
    pub mixed_end: Option<String>,
    pub floats_as_decimal: Option<bool>,
    pub char_as_string: Option<bool>,
    pub mixed_value_sugar: Option<bool>,
}

/// `# gad: key[=value], ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStmt {
    pub pos: Pos,
    pub elements: Vec<KeyValue>,
    pub options: ConfigOptions,
    pub end: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `;`; `implicit` when synthesized from a newline.
    Empty { pos: Pos, implicit: bool },
    Block(BlockStmt),
    Assign(AssignStmt),
    Decl(GenDecl),
    If(IfStmt),
    For(ForStmt),
    ForIn(ForInStmt),
    /// `break` or `continue`
    Branch { tok: TokenKind, pos: Pos },
    Return { pos: Pos, result: Option<Expr> },
    IncDec { expr: Expr, tok: TokenKind, tok_pos: Pos },
    Try(TryStmt),
    Throw { pos: Pos, expr: Expr },
    MixedText(MixedTextStmt),
    CodeBegin(DelimiterStmt),
    CodeEnd(DelimiterStmt),
    MixedValue(MixedValueStmt),
    Config(ConfigStmt),
    /// Placeholder for a statement that failed to parse.
    Bad { from: Pos, to: Pos },
}

impl Stmt {
    #[must_use]
    pub fn pos(&self) -> Pos {
        match self {
            Self::Expr(e) => e.pos(),
            Self::Empty { pos, .. }
            | Self::Branch { pos, .. }
            | Self::Return { pos, .. }
            | Self::Throw { pos, .. } => *pos,
            Self::Block(b) => b.lbrace,
            Self::Assign(a) => a.lhs.first().map_or(a.op_pos, Expr::pos),
            Self::Decl(d) => d.tok_pos,
            Self::If(s) => s.if_pos,
            Self::For(s) => s.for_pos,
            Self::ForIn(s) => s.for_pos,
            Self::IncDec { expr, .. } => expr.pos(),
            Self::Try(t) => t.try_pos,
            Self::MixedText(t) => t.pos,
            Self::CodeBegin(d) | Self::CodeEnd(d) => d.pos,
            Self::MixedValue(v) => v.start.pos,
            Self::Config(c) => c.pos,
            Self::Bad { from, .. } => *from,
        }
    }

    #[must_use]
    pub fn end(&self) -> Pos {
        match self {
            Self::Expr(e) => e.end(),
            Self::Empty { pos, implicit } => {
                if *implicit {
                    *pos
                } else {
                    pos.add(1)
                }
            }
            Self::Block(b) => b.end(),
            Self::Assign(a) => a.rhs.last().map_or(a.op_pos, Expr::end),
            Self::Decl(d) => d
                .rparen
                .map(|p| p.add(1))
                .or_else(|| d.specs.last().map(Spec::end))
                .unwrap_or(d.tok_pos),
            Self::If(s) => s.else_stmt.as_ref().map_or_else(|| s.body.end(), |e| e.end()),
            Self::For(s) => s.else_block.as_ref().unwrap_or(&s.body).end(),
            Self::ForIn(s) => s.else_block.as_ref().unwrap_or(&s.body).end(),
            Self::Branch { tok, pos } => pos.add(tok.as_str().len()),
            Self::Return { pos, result } => result
                .as_ref()
                .map_or_else(|| pos.add("return".len()), Expr::end),
            Self::IncDec { tok_pos, .. } => tok_pos.add(2),
            Self::Try(t) => t.finally.as_ref().map_or_else(
                || t.catch.as_ref().map_or_else(|| t.body.end(), |c| c.body.end()),
                |f| f.body.end(),
            ),
            Self::Throw { expr, .. } => expr.end(),
            Self::MixedText(t) => t.pos.add(t.literal.len()),
            Self::CodeBegin(d) | Self::CodeEnd(d) => d.pos.add(d.literal.len()),
            Self::MixedValue(v) => v.end.pos.add(v.end.literal.len()),
            Self::Config(c) => c.end,
            Self::Bad { to, .. } => *to,
        }
    }

    /// Statements that sit on a mixed-mode text/code boundary.
    #[must_use]
    pub const fn is_mixed_boundary(&self) -> bool {
        matches!(
            self,
            Self::MixedText(_)
                | Self::CodeBegin(_)
                | Self::CodeEnd(_)
                | Self::MixedValue(_)
                | Self::Config(_)
        )
    }
}
