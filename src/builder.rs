//! Programmatic construction of syntax trees.
//!
//! Nodes built here carry no source positions and generate the literal text
//! the formatter prints, so a built tree formats to parseable source.

use crate::ast::{
    ArrayLit, AssignStmt, BinaryExpr, BlockStmt, CallArgs, CallExpr, CondExpr, DictElement,
    DictLit, Expr, File, ForInStmt, GenDecl, Ident, IfStmt, IndexExpr, KeyValue,
    KeyValueArrayLit, Lit, MultiParenExpr, NamedArg, ParenExpr, SelectorExpr, Spec, Stmt,
    TypedIdent, UnaryExpr, UnaryOp,
};
use crate::formatter::quote;
use crate::source::{Pos, SourceFileSet};
use crate::token::TokenKind;

const fn lit<T>(value: T, literal: String) -> Lit<T> {
    Lit {
        value,
        literal,
        pos: Pos::NONE,
    }
}

impl Ident {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pos: Pos::NONE,
        }
    }
}

impl Expr {
    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::Ident(Ident::new(name))
    }

    /// Integer literal. Negative values are written with [`Expr::unary`].
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Int(lit(value, value.to_string()))
    }

    #[must_use]
    pub fn uint(value: u64) -> Self {
        Self::Uint(lit(value, format!("{value}u")))
    }

    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::Float(lit(value, format!("{value:?}")))
    }

    /// Decimal literal from its base-10 text, e.g. `"1.25"`.
    #[must_use]
    pub fn decimal(text: &str) -> Self {
        Self::Decimal(lit(text.to_string(), format!("{text}d")))
    }

    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::String(lit(value.to_string(), quote(value)))
    }

    #[must_use]
    pub fn char(value: char) -> Self {
        let quoted = quote(&value.to_string());
        let inner = match value {
            '"' => "\"",
            '\'' => "\\'",
            _ => &quoted[1..quoted.len() - 1],
        };
        Self::Char(lit(value, format!("'{inner}'")))
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::Bool(lit(value, value.to_string()))
    }

    /// `yes` or `no`.
    #[must_use]
    pub fn flag(value: bool) -> Self {
        let literal = if value { "yes" } else { "no" };
        Self::Flag(lit(value, literal.to_string()))
    }

    #[must_use]
    pub const fn nil() -> Self {
        Self::Nil(Pos::NONE)
    }

    #[must_use]
    pub const fn array(elements: Vec<Self>) -> Self {
        Self::Array(ArrayLit {
            lbrack: Pos::NONE,
            elements,
            rbrack: Pos::NONE,
        })
    }

    #[must_use]
    pub fn dict(elements: Vec<(&str, Self)>) -> Self {
        Self::Dict(DictLit {
            lbrace: Pos::NONE,
            elements: elements
                .into_iter()
                .map(|(key, value)| DictElement {
                    key: key.to_string(),
                    key_pos: Pos::NONE,
                    value,
                })
                .collect(),
            rbrace: Pos::NONE,
        })
    }

    /// Binary expression; `op` must be a binary operator token.
    #[must_use]
    pub fn binary(lhs: Self, op: TokenKind, rhs: Self) -> Self {
        Self::Binary(BinaryExpr {
            lhs: Box::new(lhs),
            op,
            op_pos: Pos::NONE,
            rhs: Box::new(rhs),
        })
    }

    #[must_use]
    pub fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary(UnaryExpr {
            op,
            op_pos: Pos::NONE,
            expr: Box::new(expr),
        })
    }

    #[must_use]
    pub fn cond(cond: Self, if_true: Self, if_false: Self) -> Self {
        Self::Cond(CondExpr {
            cond: Box::new(cond),
            question: Pos::NONE,
            if_true: Box::new(if_true),
            colon: Pos::NONE,
            if_false: Box::new(if_false),
        })
    }

    #[must_use]
    pub fn call(func: Self, args: CallArgs) -> Self {
        Self::Call(CallExpr {
            func: Box::new(func),
            lparen: Pos::NONE,
            args,
            rparen: Pos::NONE,
            piped: false,
        })
    }

    /// `first .| func(args...)`
    #[must_use]
    pub fn pipe(first: Self, func: Self, mut args: CallArgs) -> Self {
        args.positional.insert(0, first);
        Self::Call(CallExpr {
            func: Box::new(func),
            lparen: Pos::NONE,
            args,
            rparen: Pos::NONE,
            piped: true,
        })
    }

    #[must_use]
    pub fn index(expr: Self, index: Self) -> Self {
        Self::Index(IndexExpr {
            expr: Box::new(expr),
            lbrack: Pos::NONE,
            index: Box::new(index),
            rbrack: Pos::NONE,
        })
    }

    /// `expr.name`
    #[must_use]
    pub fn selector(expr: Self, name: &str) -> Self {
        Self::Selector(SelectorExpr {
            expr: Box::new(expr),
            sel: Box::new(Self::string(name)),
        })
    }

    /// `expr?.name`
    #[must_use]
    pub fn nullish_selector(expr: Self, name: &str) -> Self {
        Self::NullishSelector(SelectorExpr {
            expr: Box::new(expr),
            sel: Box::new(Self::string(name)),
        })
    }

    #[must_use]
    pub fn paren(expr: Self) -> Self {
        Self::Paren(ParenExpr {
            lparen: Pos::NONE,
            expr: Box::new(expr),
            rparen: Pos::NONE,
        })
    }

    #[must_use]
    pub const fn tuple(args: CallArgs) -> Self {
        Self::MultiParen(MultiParenExpr {
            lparen: Pos::NONE,
            args,
            rparen: Pos::NONE,
        })
    }

    /// `(;key=value, ...)`; a `None` value prints the bare key.
    #[must_use]
    pub fn key_values(elements: Vec<(&str, Option<Self>)>) -> Self {
        Self::KeyValueArray(KeyValueArrayLit {
            lparen: Pos::NONE,
            elements: elements
                .into_iter()
                .map(|(key, value)| KeyValue {
                    key: Self::ident(key),
                    value,
                })
                .collect(),
            rparen: Pos::NONE,
        })
    }
}

impl CallArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a positional argument.
    #[must_use]
    pub fn arg(mut self, expr: Expr) -> Self {
        self.positional.push(expr);
        self
    }

    /// Set the `*expr` spread argument.
    #[must_use]
    pub fn spread(mut self, expr: Expr) -> Self {
        self.var = Some(Box::new(expr));
        self
    }

    /// Add a `name=value` argument.
    #[must_use]
    pub fn named(mut self, name: &str, value: Expr) -> Self {
        self.named.push(NamedArg {
            name: Expr::ident(name),
            value,
        });
        self
    }

    /// Set the `**expr` spread argument.
    #[must_use]
    pub fn spread_named(mut self, expr: Expr) -> Self {
        self.var_named = Some(Box::new(expr));
        self
    }
}

impl BlockStmt {
    #[must_use]
    pub const fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            lbrace: Pos::NONE,
            stmts,
            rbrace: Pos::NONE,
        }
    }
}

impl Stmt {
    #[must_use]
    pub const fn expr(expr: Expr) -> Self {
        Self::Expr(expr)
    }

    /// `lhs op rhs` with a single target and value.
    #[must_use]
    pub fn assign(lhs: Expr, op: TokenKind, rhs: Expr) -> Self {
        Self::Assign(AssignStmt {
            lhs: vec![lhs],
            op,
            op_pos: Pos::NONE,
            rhs: vec![rhs],
        })
    }

    /// `name := value`
    #[must_use]
    pub fn define(name: &str, value: Expr) -> Self {
        Self::assign(Expr::ident(name), TokenKind::Define, value)
    }

    #[must_use]
    pub fn if_else(cond: Expr, body: Vec<Self>, else_body: Option<Vec<Self>>) -> Self {
        Self::If(IfStmt {
            if_pos: Pos::NONE,
            init: None,
            cond,
            body: BlockStmt::new(body),
            else_stmt: else_body.map(|stmts| Box::new(Self::Block(BlockStmt::new(stmts)))),
        })
    }

    /// `for key[, value] in iterable { body }`
    #[must_use]
    pub fn for_in(key: &str, value: Option<&str>, iterable: Expr, body: Vec<Self>) -> Self {
        Self::ForIn(ForInStmt {
            for_pos: Pos::NONE,
            key: Ident::new(key),
            value: value.map(Ident::new),
            iterable,
            body: BlockStmt::new(body),
            else_block: None,
        })
    }

    #[must_use]
    pub const fn ret(result: Option<Expr>) -> Self {
        Self::Return {
            pos: Pos::NONE,
            result,
        }
    }

    #[must_use]
    pub const fn decl(decl: GenDecl) -> Self {
        Self::Decl(decl)
    }
}

impl GenDecl {
    /// Empty declaration; `tok` is `param`, `global`, `var` or `const`.
    #[must_use]
    pub const fn new(tok: TokenKind) -> Self {
        Self {
            tok,
            tok_pos: Pos::NONE,
            lparen: None,
            specs: Vec::new(),
            rparen: None,
        }
    }

    /// Add `name` or `name = value`.
    #[must_use]
    pub fn value(mut self, name: &str, value: Option<Expr>) -> Self {
        self.specs.push(Spec::Value {
            ident: Ident::new(name),
            value,
        });
        self
    }

    /// Add a positional parameter, `*name` when `variadic`.
    #[must_use]
    pub fn param(mut self, name: &str, variadic: bool) -> Self {
        self.specs.push(Spec::Param {
            ident: TypedIdent {
                ident: Ident::new(name),
                types: Vec::new(),
            },
            variadic,
        });
        self
    }

    /// Add `name=default`, or `**name` when `default` is `None`.
    #[must_use]
    pub fn named_param(mut self, name: &str, default: Option<Expr>) -> Self {
        let variadic = default.is_none();
        self.specs.push(Spec::NamedParam {
            ident: TypedIdent {
                ident: Ident::new(name),
                types: Vec::new(),
            },
            value: default,
            variadic,
        });
        self
    }
}

impl File {
    /// File of built statements backed by an empty source file.
    #[must_use]
    pub fn new(stmts: Vec<Stmt>) -> Self {
        let set = SourceFileSet::new();
        Self {
            input_file: set.add_file("<built>", None, 0),
            stmts,
            comments: Vec::new(),
        }
    }
}
