//! Expression grammar.

use crate::ast::{
    ArgsList, ArrayLit, BinaryExpr, CallArgs, CallExpr, ClosureLit, CondExpr, DictElement,
    DictLit, EmbedExpr, Expr, FuncLit, FuncParams, Ident, ImportExpr, IndexExpr, KeyValue,
    KeyValueArrayLit, Lit, MultiParenExpr, NamedArg, NamedArgsList, ParenExpr, ReturnExpr,
    SelectorExpr, SliceExpr, TypedIdent, UnaryExpr, UnaryOp,
};
use crate::error::ParseErrorKind;
use crate::scanner::{heredoc_value, unquote};
use crate::source::Pos;
use crate::token::{TokenFlags, TokenKind};

use super::{describe, PResult, Parser};

impl Parser<'_> {
    pub(super) fn parse_expr_list(&mut self) -> PResult<Vec<Expr>> {
        let mut list = vec![self.parse_expr()?];
        while self.tok.kind == TokenKind::Comma {
            self.next();
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    /// Whether the current token cannot start an operand.
    pub(super) const fn at_expr_end(&self) -> bool {
        matches!(
            self.tok.kind,
            TokenKind::Semicolon
                | TokenKind::RParen
                | TokenKind::RBrack
                | TokenKind::RBrace
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Else
                | TokenKind::Eof
                | TokenKind::Text
                | TokenKind::CodeBegin
                | TokenKind::CodeEnd
                | TokenKind::ValueEnd
        )
    }

    pub(super) fn parse_expr(&mut self) -> PResult<Expr> {
        let cond = self.parse_binary(1)?;
        if self.tok.kind != TokenKind::Question {
            return Ok(cond);
        }
        let question = self.tok.pos;
        self.next();
        let if_true = self.parse_expr()?;
        let colon = self.tok.pos;
        if self.tok.kind == TokenKind::Semicolon && self.tok.flags.contains(TokenFlags::INSERTED)
        {
            return Err(self.error_at(colon, ParseErrorKind::TernaryLineBreak));
        }
        if self.tok.kind != TokenKind::Colon {
            return Err(self.error_expected(":"));
        }
        if self.line(colon) != self.line(question) {
            return Err(self.error_at(colon, ParseErrorKind::TernaryLineBreak));
        }
        self.next();
        let if_false = self.parse_expr()?;
        Ok(Expr::Cond(CondExpr {
            cond: Box::new(cond),
            question,
            if_true: Box::new(if_true),
            colon,
            if_false: Box::new(if_false),
        }))
    }

    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = self.tok.kind;
            let prec = op.precedence();
            if prec < min_prec || prec == 0 {
                return Ok(lhs);
            }
            let op_pos = self.tok.pos;
            self.next();
            let next_prec = if op.is_right_assoc() { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_prec)?;
            lhs = make_binary(lhs, op, op_pos, rhs);
        }
    }

    pub(super) fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.tok.kind {
            TokenKind::Add => UnaryOp::Plus,
            TokenKind::Sub => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Xor => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        let op_pos = self.tok.pos;
        self.next();
        let expr = self.parse_unary()?;
        Ok(Expr::Unary(UnaryExpr {
            op,
            op_pos,
            expr: Box::new(expr),
        }))
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let mut x = self.parse_operand()?;
        loop {
            x = match self.tok.kind {
                TokenKind::Period | TokenKind::NullishSelector => self.parse_selector(x)?,
                TokenKind::LBrack => self.parse_index(x)?,
                TokenKind::LParen => {
                    let lparen = self.tok.pos;
                    self.next();
                    let (args, _) = self.parse_call_args()?;
                    let rparen = self.expect(TokenKind::RParen)?;
                    Expr::Call(CallExpr {
                        func: Box::new(x),
                        lparen,
                        args,
                        rparen,
                        piped: false,
                    })
                }
                TokenKind::Pipe => self.parse_pipe(x)?,
                _ => return Ok(x),
            };
        }
    }

    fn parse_selector(&mut self, x: Expr) -> PResult<Expr> {
        let nullish = self.tok.kind == TokenKind::NullishSelector;
        self.next();
        let sel = if self.tok.kind == TokenKind::LParen {
            self.next();
            let sel = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            sel
        } else if self.tok.kind == TokenKind::Ident || self.tok.kind.is_keyword() {
            let name = self.tok.text().to_string();
            let sel = Expr::String(Lit {
                literal: format!("\"{name}\""),
                value: name,
                pos: self.tok.pos,
            });
            self.next();
            sel
        } else {
            return Err(self.error_expected("selector"));
        };
        let sel = SelectorExpr {
            expr: Box::new(x),
            sel: Box::new(sel),
        };
        Ok(if nullish {
            Expr::NullishSelector(sel)
        } else {
            Expr::Selector(sel)
        })
    }

    fn parse_index(&mut self, x: Expr) -> PResult<Expr> {
        let lbrack = self.expect(TokenKind::LBrack)?;
        let low = if self.tok.kind == TokenKind::Colon {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        if self.tok.kind == TokenKind::Colon {
            self.next();
            let high = if self.tok.kind == TokenKind::RBrack {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            let rbrack = self.expect(TokenKind::RBrack)?;
            return Ok(Expr::Slice(SliceExpr {
                expr: Box::new(x),
                lbrack,
                low,
                high,
                rbrack,
            }));
        }
        let rbrack = self.expect(TokenKind::RBrack)?;
        let Some(index) = low else {
            return Err(self.error_expected("index"));
        };
        Ok(Expr::Index(IndexExpr {
            expr: Box::new(x),
            lbrack,
            index,
            rbrack,
        }))
    }

    /// `x .| f(args)`: `x` becomes the first positional argument of `f`.
    fn parse_pipe(&mut self, x: Expr) -> PResult<Expr> {
        self.next();
        let mut func = self.parse_operand()?;
        while matches!(
            self.tok.kind,
            TokenKind::Period | TokenKind::NullishSelector
        ) {
            func = self.parse_selector(func)?;
        }
        let (lparen, mut args, rparen) = if self.tok.kind == TokenKind::LParen {
            let lparen = self.tok.pos;
            self.next();
            let (args, _) = self.parse_call_args()?;
            let rparen = self.expect(TokenKind::RParen)?;
            (lparen, args, rparen)
        } else {
            let end = Pos(func.end().0.saturating_sub(1));
            (end, CallArgs::default(), end)
        };
        args.positional.insert(0, x);
        Ok(Expr::Call(CallExpr {
            func: Box::new(func),
            lparen,
            args,
            rparen,
            piped: true,
        }))
    }

    #[allow(clippy::too_many_lines)]
    fn parse_operand(&mut self) -> PResult<Expr> {
        let pos = self.tok.pos;
        let expr = match self.tok.kind {
            TokenKind::Ident => {
                let ident = Ident {
                    name: self.tok.literal.clone(),
                    pos,
                };
                self.next();
                if self.tok.kind == TokenKind::Lambda {
                    let params = FuncParams {
                        lparen: pos,
                        args: ArgsList {
                            values: vec![TypedIdent {
                                ident: ident.clone(),
                                types: Vec::new(),
                            }],
                            var: None,
                        },
                        named: NamedArgsList::default(),
                        rparen: ident.end(),
                    };
                    return self.parse_closure_body(pos, params);
                }
                return Ok(Expr::Ident(ident));
            }
            TokenKind::Int
            | TokenKind::Uint
            | TokenKind::Float
            | TokenKind::Decimal
            | TokenKind::Char
            | TokenKind::String
            | TokenKind::RawString
            | TokenKind::RawHeredoc => return Ok(self.parse_basic_lit()),
            TokenKind::True | TokenKind::False => Expr::Bool(Lit {
                value: self.tok.kind == TokenKind::True,
                literal: self.tok.text().to_string(),
                pos,
            }),
            TokenKind::Yes | TokenKind::No => Expr::Flag(Lit {
                value: self.tok.kind == TokenKind::Yes,
                literal: self.tok.text().to_string(),
                pos,
            }),
            TokenKind::Nil => Expr::Nil(pos),
            TokenKind::Callee => Expr::Callee(pos),
            TokenKind::Args => Expr::Args(pos),
            TokenKind::NamedArgs => Expr::NamedArgs(pos),
            TokenKind::LBrack => return self.parse_array(),
            TokenKind::LBrace => return self.parse_dict(),
            TokenKind::LParen => return self.parse_paren(),
            TokenKind::Func => return self.parse_func(),
            TokenKind::Import | TokenKind::Embed => return self.parse_import(),
            TokenKind::Return => {
                self.next();
                let result = if self.at_expr_end() {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                return Ok(Expr::Return(ReturnExpr { pos, result }));
            }
            _ => {
                let found = describe(&self.tok);
                return Err(self.error_at(pos, ParseErrorKind::ExpectedOperand { found }));
            }
        };
        self.next();
        Ok(expr)
    }

    /// Literal token converted to its value; conversion failures are
    /// recorded and yield [`Expr::Bad`].
    fn parse_basic_lit(&mut self) -> Expr {
        let pos = self.tok.pos;
        let kind = self.tok.kind;
        let literal = self.tok.literal.clone();
        self.next();
        let to = pos.add(literal.len());
        let expr = match kind {
            TokenKind::Int => parse_int(&literal)
                .and_then(|v| i64::try_from(v).ok())
                .map(|value| Expr::Int(Lit { value, literal: literal.clone(), pos })),
            TokenKind::Uint => parse_int(literal.strip_suffix('u').unwrap_or(&literal))
                .map(|value| Expr::Uint(Lit { value, literal: literal.clone(), pos })),
            TokenKind::Float => literal
                .replace('_', "")
                .parse::<f64>()
                .ok()
                .map(|value| Expr::Float(Lit { value, literal: literal.clone(), pos })),
            TokenKind::Decimal => {
                let text = literal.strip_suffix('d').unwrap_or(&literal).replace('_', "");
                text.parse::<f64>().ok().map(|_| {
                    Expr::Decimal(Lit {
                        value: text.clone(),
                        literal: literal.clone(),
                        pos,
                    })
                })
            }
            TokenKind::Char => unquote(&literal).and_then(|s| {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(value), None) => Some(Expr::Char(Lit {
                        value,
                        literal: literal.clone(),
                        pos,
                    })),
                    _ => None,
                }
            }),
            TokenKind::String | TokenKind::RawString => unquote(&literal).map(|value| {
                let lit = Lit {
                    value,
                    literal: literal.clone(),
                    pos,
                };
                if kind == TokenKind::String {
                    Expr::String(lit)
                } else {
                    Expr::RawString(lit)
                }
            }),
            _ => Some(Expr::RawHeredoc(Lit {
                value: heredoc_value(&literal),
                literal: literal.clone(),
                pos,
            })),
        };
        expr.unwrap_or_else(|| {
            let kind = kind.as_str().to_lowercase();
            self.error_at(pos, ParseErrorKind::InvalidLiteral { kind, literal });
            Expr::Bad { from: pos, to }
        })
    }

    fn parse_array(&mut self) -> PResult<Expr> {
        let lbrack = self.expect(TokenKind::LBrack)?;
        let mut elements = Vec::new();
        self.skip_inserted_semis();
        while self.tok.kind != TokenKind::RBrack {
            elements.push(self.parse_expr()?);
            self.skip_inserted_semis();
            if self.tok.kind != TokenKind::Comma {
                break;
            }
            self.next();
            self.skip_inserted_semis();
        }
        let rbrack = self.expect(TokenKind::RBrack)?;
        Ok(Expr::Array(ArrayLit {
            lbrack,
            elements,
            rbrack,
        }))
    }

    fn parse_dict(&mut self) -> PResult<Expr> {
        let lbrace = self.expect(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        self.skip_inserted_semis();
        while self.tok.kind != TokenKind::RBrace {
            let key_pos = self.tok.pos;
            let key = match self.tok.kind {
                TokenKind::Ident => self.tok.literal.clone(),
                TokenKind::String | TokenKind::RawString => match unquote(&self.tok.literal) {
                    Some(key) => key,
                    None => return Err(self.error_expected("dict key")),
                },
                kind if kind.is_keyword() => self.tok.text().to_string(),
                _ => return Err(self.error_expected("dict key")),
            };
            self.next();
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            elements.push(DictElement {
                key,
                key_pos,
                value,
            });
            self.skip_inserted_semis();
            if self.tok.kind != TokenKind::Comma {
                break;
            }
            self.next();
            self.skip_inserted_semis();
        }
        let rbrace = self.expect(TokenKind::RBrace)?;
        Ok(Expr::Dict(DictLit {
            lbrace,
            elements,
            rbrace,
        }))
    }

    /// `(x)`, `(a, *b; c=1)`, `(;k=v)` or a closure `(a, b) => x`.
    fn parse_paren(&mut self) -> PResult<Expr> {
        let lparen = self.expect(TokenKind::LParen)?;
        if self.is_explicit_semi() {
            self.next();
            return self.parse_key_value_array(lparen);
        }
        let (args, separated) = self.parse_call_args()?;
        let rparen = self.expect(TokenKind::RParen)?;
        if self.tok.kind == TokenKind::Lambda {
            let params = self.args_to_params(lparen, args, rparen)?;
            return self.parse_closure_body(lparen, params);
        }
        if !separated && args.positional.len() == 1 && args.var.is_none() && !args.has_named() {
            let mut positional = args.positional;
            if let Some(expr) = positional.pop() {
                return Ok(Expr::Paren(ParenExpr {
                    lparen,
                    expr: Box::new(expr),
                    rparen,
                }));
            }
            return Err(self.error_at(lparen, ParseErrorKind::ExpectedOperand {
                found: ")".to_string(),
            }));
        }
        Ok(Expr::MultiParen(MultiParenExpr {
            lparen,
            args,
            rparen,
        }))
    }

    fn parse_key_value_array(&mut self, lparen: Pos) -> PResult<Expr> {
        let mut elements = Vec::new();
        self.skip_inserted_semis();
        while self.tok.kind != TokenKind::RParen {
            let key = self.parse_arg_name()?;
            let value = if self.tok.kind == TokenKind::Assign {
                self.next();
                Some(self.parse_expr()?)
            } else {
                None
            };
            elements.push(KeyValue { key, value });
            self.skip_inserted_semis();
            if self.tok.kind != TokenKind::Comma {
                break;
            }
            self.next();
            self.skip_inserted_semis();
        }
        let rparen = self.expect(TokenKind::RParen)?;
        Ok(Expr::KeyValueArray(KeyValueArrayLit {
            lparen,
            elements,
            rparen,
        }))
    }

    /// Identifier or string literal naming an argument.
    fn parse_arg_name(&mut self) -> PResult<Expr> {
        match self.tok.kind {
            TokenKind::Ident => Ok(Expr::Ident(self.expect_ident()?)),
            TokenKind::String | TokenKind::RawString => Ok(self.parse_basic_lit()),
            _ => Err(self.error_expected("identifier")),
        }
    }

    /// Arguments up to, not including, the closing `)`.
    ///
    /// The flag reports whether a `,` or `;` separator was seen, which
    /// tells `(x,)` apart from `(x)`.
    #[allow(clippy::too_many_lines)]
    fn parse_call_args(&mut self) -> PResult<(CallArgs, bool)> {
        let mut args = CallArgs::default();
        let mut separated = false;
        let mut in_named = false;
        loop {
            self.skip_inserted_semis();
            if self.tok.kind == TokenKind::RParen {
                break;
            }
            if self.is_explicit_semi() {
                if in_named {
                    return Err(self.error_expected(")"));
                }
                in_named = true;
                separated = true;
                self.next();
                continue;
            }
            let pos = self.tok.pos;
            match self.tok.kind {
                TokenKind::Mul => {
                    if in_named {
                        return Err(self.error_at(pos, ParseErrorKind::PositionalAfterNamed));
                    }
                    if args.var.is_some() {
                        return Err(self.error_at(pos, ParseErrorKind::DuplicateVariadic));
                    }
                    self.next();
                    args.var = Some(Box::new(self.parse_expr()?));
                }
                TokenKind::Pow => {
                    if args.var_named.is_some() {
                        return Err(self.error_at(pos, ParseErrorKind::DuplicateVariadic));
                    }
                    in_named = true;
                    self.next();
                    args.var_named = Some(Box::new(self.parse_expr()?));
                }
                _ if in_named => {
                    if args.var_named.is_some() {
                        return Err(self.error_at(pos, ParseErrorKind::VariadicNotLast));
                    }
                    let name = self.parse_arg_name()?;
                    let value = if self.tok.kind == TokenKind::Assign {
                        self.next();
                        self.parse_expr()?
                    } else {
                        Expr::Flag(Lit {
                            value: true,
                            literal: "yes".to_string(),
                            pos,
                        })
                    };
                    args.named.push(NamedArg { name, value });
                }
                _ => {
                    let expr = self.parse_expr()?;
                    if self.tok.kind == TokenKind::Assign
                        && matches!(expr, Expr::Ident(_) | Expr::String(_) | Expr::RawString(_))
                    {
                        in_named = true;
                        self.next();
                        let value = self.parse_expr()?;
                        args.named.push(NamedArg { name: expr, value });
                    } else if args.var.is_some() {
                        return Err(self.error_at(pos, ParseErrorKind::VariadicNotLast));
                    } else {
                        args.positional.push(expr);
                    }
                }
            }
            self.skip_inserted_semis();
            match self.tok.kind {
                TokenKind::Comma => {
                    separated = true;
                    self.next();
                }
                TokenKind::Semicolon => {}
                _ => break,
            }
        }
        Ok((args, separated))
    }

    /// Reinterpret parsed call arguments as closure parameters.
    fn args_to_params(&mut self, lparen: Pos, args: CallArgs, rparen: Pos) -> PResult<FuncParams> {
        let mut params = FuncParams {
            lparen,
            args: ArgsList::default(),
            named: NamedArgsList::default(),
            rparen,
        };
        for expr in args.positional {
            params.args.values.push(self.param_ident(expr)?);
        }
        if let Some(var) = args.var {
            params.args.var = Some(self.param_ident(*var)?);
        }
        for arg in args.named {
            params.named.names.push(self.param_ident(arg.name)?);
            params.named.values.push(arg.value);
        }
        if let Some(var) = args.var_named {
            params.named.var = Some(self.param_ident(*var)?);
        }
        Ok(params)
    }

    fn param_ident(&mut self, expr: Expr) -> PResult<TypedIdent> {
        match expr {
            Expr::Ident(ident) => Ok(TypedIdent {
                ident,
                types: Vec::new(),
            }),
            other => Err(self.error_at(
                other.pos(),
                ParseErrorKind::Expected {
                    expected: "identifier".to_string(),
                    found: other.to_string(),
                },
            )),
        }
    }

    fn parse_closure_body(&mut self, pos: Pos, params: FuncParams) -> PResult<Expr> {
        let lambda = self.expect(TokenKind::Lambda)?;
        let body = self.parse_expr()?;
        Ok(Expr::Closure(ClosureLit {
            pos,
            params,
            lambda,
            body: Box::new(body),
        }))
    }

    /// `func [name](params) { ... }` or `func(params) => expr`.
    fn parse_func(&mut self) -> PResult<Expr> {
        let func_pos = self.expect(TokenKind::Func)?;
        let name = if self.tok.kind == TokenKind::Ident {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let lparen = self.expect(TokenKind::LParen)?;
        let (args, named) = self.parse_param_list()?;
        let rparen = self.expect(TokenKind::RParen)?;
        let params = FuncParams {
            lparen,
            args,
            named,
            rparen,
        };
        if self.tok.kind == TokenKind::Lambda {
            return self.parse_closure_body(func_pos, params);
        }
        let (body, _) = self.parse_block(false)?;
        Ok(Expr::Func(FuncLit {
            func_pos,
            name,
            params,
            body,
        }))
    }

    /// `import("module")` or `embed("path")`.
    fn parse_import(&mut self) -> PResult<Expr> {
        let pos = self.tok.pos;
        let kind = self.tok.kind;
        self.next();
        self.expect(TokenKind::LParen)?;
        if !matches!(self.tok.kind, TokenKind::String | TokenKind::RawString) {
            return Err(self.error_expected("string literal"));
        }
        let Some(value) = unquote(&self.tok.literal) else {
            return Err(self.error_expected("string literal"));
        };
        self.next();
        let rparen = self.expect(TokenKind::RParen)?;
        Ok(if kind == TokenKind::Import {
            Expr::Import(ImportExpr {
                pos,
                module_name: value,
                rparen,
            })
        } else {
            Expr::Embed(EmbedExpr {
                pos,
                path: value,
                rparen,
            })
        })
    }
}

/// Build a binary node, folding `x == nil` and `x != nil` into nil checks.
fn make_binary(lhs: Expr, op: TokenKind, op_pos: Pos, rhs: Expr) -> Expr {
    let null_op = match op {
        TokenKind::Equal => Some(UnaryOp::Null),
        TokenKind::NotEqual => Some(UnaryOp::NotNull),
        _ => None,
    };
    if let (Some(op), Expr::Nil(_)) = (null_op, &rhs) {
        return Expr::Unary(UnaryExpr {
            op,
            op_pos,
            expr: Box::new(lhs),
        });
    }
    Expr::Binary(BinaryExpr {
        lhs: Box::new(lhs),
        op,
        op_pos,
        rhs: Box::new(rhs),
    })
}

/// Integer literal value with `0x`, `0o`, `0b` prefixes and `_` separators.
fn parse_int(literal: &str) -> Option<u64> {
    let digits = literal.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else {
        (10, lower.as_str())
    };
    u64::from_str_radix(body, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_prefixes() {
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("99999999999999999999"), None);
    }

    #[test]
    fn nil_comparison_folds() {
        let a = Expr::Ident(Ident {
            name: "a".to_string(),
            pos: Pos(1),
        });
        let folded = make_binary(a, TokenKind::NotEqual, Pos(3), Expr::Nil(Pos(6)));
        assert!(matches!(
            folded,
            Expr::Unary(UnaryExpr {
                op: UnaryOp::NotNull,
                ..
            })
        ));
    }
}
