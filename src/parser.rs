//! Recursive-descent parser producing a [`File`].
//!
//! Errors never stop the parse early unless the configured error cap is
//! reached: a failing statement is replaced by [`Stmt::Bad`] and the parser
//! resynchronizes at the next `;`, the `}` closing the current block, or a
//! statement keyword.

mod expr;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::{
    ArgsList, AssignStmt, BlockStmt, CatchClause, Comment, CommentGroup, ConfigOptions,
    ConfigStmt, DelimiterStmt, Expr, File, FinallyClause, ForInStmt, ForStmt, GenDecl, Ident,
    IfStmt, KeyValue, MixedTextStmt, MixedValueStmt, NamedArgsList, Spec, Stmt, TryStmt,
    TypedIdent,
};
use crate::error::{ErrorList, ParseErrorKind};
use crate::options::ParserOptions;
use crate::scanner::Scanner;
use crate::source::{Pos, SourceFile, SourceFilePos};
use crate::token::{Token, TokenFlags, TokenKind};

/// Marker returned once an error has been recorded; the caller
/// resynchronizes.
#[derive(Debug)]
struct Bail;

type PResult<T> = Result<T, Bail>;

/// Parser over one source file.
pub struct Parser<'a> {
    file: Arc<SourceFile>,
    scanner: Scanner<'a>,
    errors: ErrorList,
    max_errors: usize,
    last_error_line: Option<usize>,
    aborted: bool,
    tok: Token,
    comments: Vec<CommentGroup>,
    last_comment_line: usize,
    comment_break: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over `src`, which must be the content of `file`.
    ///
    /// # Panics
    ///
    /// Panics if the file size does not match `src.len()`.
    pub fn new(file: Arc<SourceFile>, src: &'a [u8], opts: ParserOptions) -> Self {
        let scanner = Scanner::new(Arc::clone(&file), src, opts.scanner, None);
        let mut p = Self {
            file,
            scanner,
            errors: ErrorList::new(),
            max_errors: opts.max_errors,
            last_error_line: None,
            aborted: false,
            tok: Token::new(TokenKind::Eof, String::new(), Pos::NONE),
            comments: Vec::new(),
            last_comment_line: 0,
            comment_break: true,
        };
        p.next();
        p
    }

    /// Parse the whole file.
    ///
    /// The returned tree is complete even when errors were found; failed
    /// statements appear as [`Stmt::Bad`].
    pub fn parse_file(mut self) -> (File, ErrorList) {
        debug!(file = self.file.name(), "parsing file");
        let mut stmts = Vec::new();
        loop {
            stmts.extend(self.parse_stmt_list(false));
            if self.aborted || self.tok.kind != TokenKind::RBrace {
                break;
            }
            self.error_at(self.tok.pos, ParseErrorKind::UnmatchedBrace);
            self.next();
            if self.tok.kind == TokenKind::Semicolon {
                self.next();
            }
        }
        self.errors.sort();
        debug!(
            file = self.file.name(),
            stmts = stmts.len(),
            errors = self.errors.len(),
            "parsed file"
        );
        let file = File {
            input_file: self.file,
            stmts,
            comments: self.comments,
        };
        (file, self.errors)
    }

    // ----- token handling -------------------------------------------------

    fn next(&mut self) {
        loop {
            let tok = self.scanner.scan();
            for (pos, kind) in self.scanner.take_errors() {
                self.push_error(pos, ParseErrorKind::Scan(kind));
            }
            if tok.kind == TokenKind::Comment {
                self.add_comment(tok);
                continue;
            }
            self.comment_break = true;
            self.tok = tok;
            return;
        }
    }

    fn add_comment(&mut self, tok: Token) {
        let line = self.line(tok.pos);
        let end_line = self.line(tok.pos.add(tok.literal.len()));
        let comment = Comment {
            pos: tok.pos,
            text: tok.literal,
        };
        match self.comments.last_mut() {
            Some(group) if !self.comment_break && line <= self.last_comment_line + 1 => {
                group.list.push(comment);
            }
            _ => self.comments.push(CommentGroup {
                list: vec![comment],
            }),
        }
        self.last_comment_line = end_line;
        self.comment_break = false;
    }

    fn line(&self, pos: Pos) -> usize {
        self.file.position(pos).line
    }

    fn is_explicit_semi(&self) -> bool {
        self.tok.kind == TokenKind::Semicolon && !self.tok.flags.contains(TokenFlags::INSERTED)
    }

    /// Skip automatic semicolons; true when at least one line ended.
    fn skip_inserted_semis(&mut self) -> bool {
        let mut skipped = false;
        while self.tok.kind == TokenKind::Semicolon
            && self.tok.flags.contains(TokenFlags::INSERTED)
        {
            self.next();
            skipped = true;
        }
        skipped
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Pos> {
        let pos = self.tok.pos;
        if self.tok.kind != kind {
            return Err(self.error_expected(kind.as_str()));
        }
        self.next();
        Ok(pos)
    }

    fn expect_ident(&mut self) -> PResult<Ident> {
        if self.tok.kind != TokenKind::Ident {
            return Err(self.error_expected("identifier"));
        }
        let ident = Ident {
            name: self.tok.literal.clone(),
            pos: self.tok.pos,
        };
        self.next();
        Ok(ident)
    }

    /// Statement terminator; closing tokens and mixed-mode boundaries
    /// terminate implicitly.
    fn expect_semi(&mut self) -> PResult<()> {
        match self.tok.kind {
            TokenKind::Semicolon => {
                self.next();
                Ok(())
            }
            TokenKind::RParen
            | TokenKind::RBrace
            | TokenKind::Eof
            | TokenKind::Else
            | TokenKind::Text
            | TokenKind::CodeBegin
            | TokenKind::CodeEnd
            | TokenKind::ValueBegin
            | TokenKind::ValueEnd
            | TokenKind::ConfigStart => Ok(()),
            _ => Err(self.error_expected(";")),
        }
    }

    // ----- errors ---------------------------------------------------------

    fn push_error(&mut self, pos: SourceFilePos, kind: ParseErrorKind) {
        if self.aborted || self.last_error_line == Some(pos.line) {
            return;
        }
        debug!(%pos, error = %kind, "parse error");
        self.last_error_line = Some(pos.line);
        self.errors.add(pos, kind);
        if self.max_errors > 0 && self.errors.len() >= self.max_errors {
            debug!(limit = self.max_errors, "error limit reached");
            self.aborted = true;
        }
    }

    fn error_at(&mut self, pos: Pos, kind: ParseErrorKind) -> Bail {
        let pos = self.file.position(pos);
        self.push_error(pos, kind);
        Bail
    }

    fn error_expected(&mut self, expected: &str) -> Bail {
        let kind = ParseErrorKind::Expected {
            expected: expected.to_string(),
            found: describe(&self.tok),
        };
        self.error_at(self.tok.pos, kind)
    }

    /// Skip to a point where statement parsing can resume.
    fn sync_stmt(&mut self) {
        let start = self.tok.pos;
        trace!(?start, "resynchronizing");
        let mut depth = 0usize;
        while !self.aborted {
            match self.tok.kind {
                TokenKind::Eof
                | TokenKind::Text
                | TokenKind::CodeBegin
                | TokenKind::CodeEnd
                | TokenKind::ConfigStart => return,
                TokenKind::Semicolon if depth == 0 => {
                    self.next();
                    return;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                kind if depth == 0 && self.tok.pos != start && starts_statement(kind) => return,
                _ => {}
            }
            self.next();
        }
    }

    // ----- statements -----------------------------------------------------

    fn parse_stmt_list(&mut self, in_block: bool) -> Vec<Stmt> {
        let mut list = Vec::new();
        while !self.aborted
            && !matches!(self.tok.kind, TokenKind::RBrace | TokenKind::Eof)
            && !(in_block && self.tok.kind == TokenKind::Else)
        {
            let from = self.tok.pos;
            let kind = self.tok.kind;
            match self.parse_stmt() {
                Ok(stmt) => {
                    let closes_code = matches!(stmt, Stmt::CodeEnd(_));
                    list.push(stmt);
                    // The sugar in force when a block closes decides its shape.
                    if closes_code && self.scanner.options().mixed_value_sugar {
                        fold_value_block(&mut list);
                    }
                }
                Err(Bail) => {
                    self.sync_stmt();
                    if self.tok.pos == from && self.tok.kind == kind && kind != TokenKind::RBrace {
                        self.next();
                    }
                    list.push(Stmt::Bad {
                        from,
                        to: self.tok.pos,
                    });
                }
            }
        }
        list
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        let pos = self.tok.pos;
        match self.tok.kind {
            TokenKind::Semicolon => {
                let implicit = self.tok.flags.contains(TokenFlags::INSERTED);
                self.next();
                Ok(Stmt::Empty { pos, implicit })
            }
            TokenKind::LBrace => {
                let (block, _) = self.parse_block(false)?;
                self.expect_semi()?;
                Ok(Stmt::Block(block))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                self.next();
                let expr = self.parse_expr()?;
                self.expect_semi()?;
                Ok(Stmt::Throw { pos, expr })
            }
            TokenKind::Return => {
                self.next();
                let result = if self.at_expr_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_semi()?;
                Ok(Stmt::Return { pos, result })
            }
            TokenKind::Break | TokenKind::Continue => {
                let tok = self.tok.kind;
                self.next();
                self.expect_semi()?;
                Ok(Stmt::Branch { tok, pos })
            }
            TokenKind::Param | TokenKind::Global | TokenKind::Var | TokenKind::Const => {
                self.parse_decl()
            }
            TokenKind::Text => Ok(self.parse_text()),
            TokenKind::CodeBegin => Ok(Stmt::CodeBegin(self.delimiter())),
            TokenKind::CodeEnd => Ok(Stmt::CodeEnd(self.delimiter())),
            TokenKind::ValueBegin => self.parse_mixed_value(),
            TokenKind::ConfigStart => self.parse_config(),
            TokenKind::Else | TokenKind::Catch | TokenKind::Finally => {
                let found = describe(&self.tok);
                Err(self.error_at(pos, ParseErrorKind::ExpectedStatement { found }))
            }
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.expect_semi()?;
                Ok(stmt)
            }
        }
    }

    /// Block opened by `{` or a block keyword.
    ///
    /// With `allow_else`, an `else` may close the block instead of `}`; the
    /// second value reports that case, and the else branch then shares the
    /// closing `}`.
    fn parse_block(&mut self, allow_else: bool) -> PResult<(BlockStmt, bool)> {
        let lbrace = self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmt_list(true);
        if allow_else && self.tok.kind == TokenKind::Else {
            let block = BlockStmt {
                lbrace,
                stmts,
                rbrace: self.tok.pos,
            };
            return Ok((block, true));
        }
        let rbrace = self.close_block()?;
        Ok((
            BlockStmt {
                lbrace,
                stmts,
                rbrace,
            },
            false,
        ))
    }

    /// Else branch of a block closed by `else`: statements up to the shared `}`.
    fn parse_open_else(&mut self) -> PResult<BlockStmt> {
        let lbrace = self.tok.pos;
        let stmts = self.parse_stmt_list(true);
        let rbrace = self.close_block()?;
        Ok(BlockStmt {
            lbrace,
            stmts,
            rbrace,
        })
    }

    fn close_block(&mut self) -> PResult<Pos> {
        let pos = self.tok.pos;
        if self.aborted {
            return Ok(pos);
        }
        match self.tok.kind {
            TokenKind::RBrace => {
                self.next();
                Ok(pos)
            }
            TokenKind::Eof => {
                self.error_at(pos, ParseErrorKind::UnclosedBrace);
                Ok(pos)
            }
            _ => Err(self.error_expected("}")),
        }
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let if_pos = self.expect(TokenKind::If)?;
        let (init, cond) = self.parse_if_header()?;
        let (body, open) = self.parse_block(true)?;
        let mut else_stmt = None;
        if self.tok.kind == TokenKind::Else {
            self.next();
            let stmt = match self.tok.kind {
                TokenKind::If => self.parse_if()?,
                TokenKind::LBrace => {
                    let (block, _) = self.parse_block(false)?;
                    self.expect_semi()?;
                    Stmt::Block(block)
                }
                _ if open => {
                    let block = self.parse_open_else()?;
                    self.expect_semi()?;
                    Stmt::Block(block)
                }
                _ => return Err(self.error_expected("if statement or block")),
            };
            else_stmt = Some(Box::new(stmt));
        } else {
            self.expect_semi()?;
        }
        Ok(Stmt::If(IfStmt {
            if_pos,
            init,
            cond,
            body,
            else_stmt,
        }))
    }

    fn parse_if_header(&mut self) -> PResult<(Option<Box<Stmt>>, Expr)> {
        if self.tok.kind == TokenKind::LBrace {
            return Err(self.error_expected("condition"));
        }
        let first = if self.tok.kind == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_simple_stmt()?)
        };
        if self.tok.kind == TokenKind::Semicolon {
            self.next();
            let cond = self.parse_expr()?;
            return Ok((first.map(Box::new), cond));
        }
        match first {
            Some(Stmt::Expr(cond)) => Ok((None, cond)),
            Some(stmt) => Err(self.error_at(
                stmt.pos(),
                ParseErrorKind::Expected {
                    expected: "condition".to_string(),
                    found: stmt.to_string(),
                },
            )),
            None => Err(self.error_expected("condition")),
        }
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let for_pos = self.expect(TokenKind::For)?;
        let mut init = None;
        let mut cond = None;
        let mut post = None;
        if self.tok.kind != TokenKind::LBrace {
            if self.tok.kind != TokenKind::Semicolon {
                let lhs = self.parse_expr_list()?;
                if self.tok.kind == TokenKind::In {
                    return self.parse_for_in(for_pos, lhs);
                }
                init = Some(self.finish_simple_stmt(lhs)?);
            }
            if self.tok.kind == TokenKind::Semicolon {
                self.next();
                if self.tok.kind != TokenKind::Semicolon {
                    cond = Some(self.parse_expr()?);
                }
                self.expect(TokenKind::Semicolon)?;
                if self.tok.kind != TokenKind::LBrace {
                    post = Some(Box::new(self.parse_simple_stmt()?));
                }
            } else {
                cond = match init.take() {
                    Some(Stmt::Expr(e)) => Some(e),
                    Some(stmt) => {
                        return Err(self.error_at(
                            stmt.pos(),
                            ParseErrorKind::Expected {
                                expected: "for loop condition".to_string(),
                                found: stmt.to_string(),
                            },
                        ));
                    }
                    None => None,
                };
            }
        }
        let (body, open) = self.parse_block(true)?;
        let else_block = self.parse_loop_else(open)?;
        self.expect_semi()?;
        Ok(Stmt::For(ForStmt {
            for_pos,
            init: init.map(Box::new),
            cond,
            post,
            body,
            else_block,
        }))
    }

    fn parse_for_in(&mut self, for_pos: Pos, lhs: Vec<Expr>) -> PResult<Stmt> {
        let in_pos = self.tok.pos;
        let mut idents = Vec::with_capacity(lhs.len());
        for e in lhs {
            match e {
                Expr::Ident(id) => idents.push(id),
                other => {
                    return Err(self.error_at(
                        other.pos(),
                        ParseErrorKind::Expected {
                            expected: "identifier".to_string(),
                            found: other.to_string(),
                        },
                    ));
                }
            }
        }
        if idents.len() > 2 {
            return Err(self.error_at(
                in_pos,
                ParseErrorKind::Expected {
                    expected: "at most 2 loop variables".to_string(),
                    found: idents.len().to_string(),
                },
            ));
        }
        let mut idents = idents.into_iter();
        let Some(key) = idents.next() else {
            return Err(self.error_expected("identifier"));
        };
        let value = idents.next();
        self.next();
        let iterable = self.parse_expr()?;
        let (body, open) = self.parse_block(true)?;
        let else_block = self.parse_loop_else(open)?;
        self.expect_semi()?;
        Ok(Stmt::ForIn(ForInStmt {
            for_pos,
            key,
            value,
            iterable,
            body,
            else_block,
        }))
    }

    fn parse_loop_else(&mut self, open: bool) -> PResult<Option<BlockStmt>> {
        if self.tok.kind != TokenKind::Else {
            return Ok(None);
        }
        self.next();
        if self.tok.kind == TokenKind::LBrace {
            return Ok(Some(self.parse_block(false)?.0));
        }
        if open {
            return Ok(Some(self.parse_open_else()?));
        }
        Err(self.error_expected("{"))
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        let try_pos = self.expect(TokenKind::Try)?;
        let (body, _) = self.parse_block(false)?;
        let mut catch = None;
        if self.tok.kind == TokenKind::Catch {
            let catch_pos = self.tok.pos;
            self.next();
            let ident = if self.tok.kind == TokenKind::Ident {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let (body, _) = self.parse_block(false)?;
            catch = Some(CatchClause {
                catch_pos,
                ident,
                body,
            });
        }
        let mut finally = None;
        if self.tok.kind == TokenKind::Finally {
            let finally_pos = self.tok.pos;
            self.next();
            let (body, _) = self.parse_block(false)?;
            finally = Some(FinallyClause { finally_pos, body });
        }
        if catch.is_none() && finally.is_none() {
            self.error_at(try_pos, ParseErrorKind::TryWithoutHandler);
        }
        self.expect_semi()?;
        Ok(Stmt::Try(TryStmt {
            try_pos,
            body,
            catch,
            finally,
        }))
    }

    fn parse_simple_stmt(&mut self) -> PResult<Stmt> {
        let lhs = self.parse_expr_list()?;
        self.finish_simple_stmt(lhs)
    }

    /// Assignment, increment or expression statement after its left side.
    fn finish_simple_stmt(&mut self, lhs: Vec<Expr>) -> PResult<Stmt> {
        let op = self.tok.kind;
        let op_pos = self.tok.pos;
        if op.is_assign() {
            self.next();
            for e in &lhs {
                let valid = if op == TokenKind::Define {
                    matches!(e, Expr::Ident(_))
                } else {
                    e.is_assignable()
                };
                if !valid {
                    self.error_at(e.pos(), ParseErrorKind::InvalidAssignTarget(e.to_string()));
                }
            }
            let rhs = self.parse_expr_list()?;
            let simple = matches!(op, TokenKind::Assign | TokenKind::Define);
            if (!simple && (lhs.len() != 1 || rhs.len() != 1))
                || (lhs.len() != rhs.len() && rhs.len() != 1)
            {
                self.error_at(
                    op_pos,
                    ParseErrorKind::AssignArity {
                        op: op.as_str().to_string(),
                    },
                );
            }
            return Ok(Stmt::Assign(AssignStmt {
                lhs,
                op,
                op_pos,
                rhs,
            }));
        }
        let count = lhs.len();
        let mut lhs = lhs.into_iter();
        let (Some(expr), None) = (lhs.next(), lhs.next()) else {
            return Err(self.error_expected(if count > 1 { ":= or =" } else { "expression" }));
        };
        if matches!(op, TokenKind::Inc | TokenKind::Dec) {
            if !expr.is_assignable() {
                self.error_at(expr.pos(), ParseErrorKind::InvalidAssignTarget(expr.to_string()));
            }
            self.next();
            return Ok(Stmt::IncDec {
                expr,
                tok: op,
                tok_pos: op_pos,
            });
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_decl(&mut self) -> PResult<Stmt> {
        let tok = self.tok.kind;
        let tok_pos = self.tok.pos;
        self.next();
        let decl = if self.tok.kind == TokenKind::LParen {
            let lparen = self.tok.pos;
            self.next();
            let specs = if tok == TokenKind::Param {
                let (args, named) = self.parse_param_list()?;
                param_specs(args, named)
            } else {
                self.parse_value_specs(tok)?
            };
            let rparen = self.expect(TokenKind::RParen)?;
            GenDecl {
                tok,
                tok_pos,
                lparen: Some(lparen),
                specs,
                rparen: Some(rparen),
            }
        } else {
            let spec = if tok == TokenKind::Param {
                self.parse_param_spec()?
            } else {
                self.parse_value_spec(tok)?
            };
            GenDecl {
                tok,
                tok_pos,
                lparen: None,
                specs: vec![spec],
                rparen: None,
            }
        };
        self.expect_semi()?;
        Ok(Stmt::Decl(decl))
    }

    fn parse_param_spec(&mut self) -> PResult<Spec> {
        match self.tok.kind {
            TokenKind::Mul => {
                self.next();
                Ok(Spec::Param {
                    ident: self.parse_typed_ident()?,
                    variadic: true,
                })
            }
            TokenKind::Pow => {
                self.next();
                Ok(Spec::NamedParam {
                    ident: self.parse_typed_ident()?,
                    value: None,
                    variadic: true,
                })
            }
            _ => {
                let ident = self.parse_typed_ident()?;
                if self.tok.kind != TokenKind::Assign {
                    return Ok(Spec::Param {
                        ident,
                        variadic: false,
                    });
                }
                self.next();
                Ok(Spec::NamedParam {
                    ident,
                    value: Some(self.parse_expr()?),
                    variadic: false,
                })
            }
        }
    }

    fn parse_value_specs(&mut self, tok: TokenKind) -> PResult<Vec<Spec>> {
        let mut specs = Vec::new();
        loop {
            while self.tok.kind == TokenKind::Semicolon {
                self.next();
            }
            if self.tok.kind == TokenKind::RParen {
                break;
            }
            specs.push(self.parse_value_spec(tok)?);
            match self.tok.kind {
                TokenKind::Comma | TokenKind::Semicolon => self.next(),
                TokenKind::RParen => break,
                _ => return Err(self.error_expected(")")),
            }
        }
        Ok(specs)
    }

    fn parse_value_spec(&mut self, tok: TokenKind) -> PResult<Spec> {
        let ident = self.expect_ident()?;
        let value = if tok != TokenKind::Global && self.tok.kind == TokenKind::Assign {
            self.next();
            Some(self.parse_expr()?)
        } else {
            None
        };
        if tok == TokenKind::Const && value.is_none() {
            return Err(self.error_expected("="));
        }
        Ok(Spec::Value { ident, value })
    }

    /// `name`, `name type|type` or `name:type`.
    fn parse_typed_ident(&mut self) -> PResult<TypedIdent> {
        let ident = self.expect_ident()?;
        let mut types = Vec::new();
        if self.tok.kind == TokenKind::Colon {
            self.next();
            types.push(self.expect_ident()?);
        } else if self.tok.kind == TokenKind::Ident {
            types.push(self.expect_ident()?);
        }
        if !types.is_empty() {
            while self.tok.kind == TokenKind::Or {
                self.next();
                types.push(self.expect_ident()?);
            }
        }
        Ok(TypedIdent { ident, types })
    }

    /// Parameters up to, not including, the closing `)`.
    fn parse_param_list(&mut self) -> PResult<(ArgsList, NamedArgsList)> {
        let mut args = ArgsList::default();
        let mut named = NamedArgsList::default();
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
                    args.var = Some(self.parse_typed_ident()?);
                }
                TokenKind::Pow => {
                    in_named = true;
                    if named.var.is_some() {
                        return Err(self.error_at(pos, ParseErrorKind::DuplicateVariadic));
                    }
                    self.next();
                    named.var = Some(self.parse_typed_ident()?);
                }
                _ => {
                    let ident = self.parse_typed_ident()?;
                    if self.tok.kind == TokenKind::Assign {
                        in_named = true;
                        if named.var.is_some() {
                            return Err(self.error_at(pos, ParseErrorKind::VariadicNotLast));
                        }
                        self.next();
                        let value = self.parse_expr()?;
                        named.names.push(ident);
                        named.values.push(value);
                    } else if in_named {
                        return Err(self.error_at(pos, ParseErrorKind::PositionalAfterNamed));
                    } else if args.var.is_some() {
                        return Err(self.error_at(pos, ParseErrorKind::VariadicNotLast));
                    } else {
                        args.values.push(ident);
                    }
                }
            }
            let line_ended = self.skip_inserted_semis();
            match self.tok.kind {
                TokenKind::Comma => self.next(),
                TokenKind::Semicolon => {}
                _ if line_ended => {}
                _ => break,
            }
        }
        Ok((args, named))
    }

    // ----- mixed mode -----------------------------------------------------

    fn delimiter(&mut self) -> DelimiterStmt {
        let stmt = DelimiterStmt {
            pos: self.tok.pos,
            literal: self.tok.literal.clone(),
            flags: self.tok.flags,
        };
        self.next();
        stmt
    }

    fn parse_text(&mut self) -> Stmt {
        let literal = self.tok.literal.clone();
        let value = if self.tok.flags.contains(TokenFlags::ESCAPED) {
            let start = &self.scanner.options().mixed_delimiter.start;
            literal.replace(&format!("\\{start}"), start)
        } else {
            literal.clone()
        };
        let stmt = Stmt::MixedText(MixedTextStmt {
            pos: self.tok.pos,
            literal,
            value,
            flags: self.tok.flags,
        });
        self.next();
        stmt
    }

    fn parse_mixed_value(&mut self) -> PResult<Stmt> {
        let start = self.delimiter();
        let expr = self.parse_expr()?;
        while self.tok.kind == TokenKind::Semicolon {
            self.next();
        }
        if self.tok.kind != TokenKind::ValueEnd {
            let end = self.scanner.options().mixed_delimiter.end.clone();
            return Err(self.error_expected(&end));
        }
        let end = self.delimiter();
        Ok(Stmt::MixedValue(MixedValueStmt { start, expr, end }))
    }

    fn parse_config(&mut self) -> PResult<Stmt> {
        let pos = self.tok.pos;
        self.next();
        let mut elements = Vec::new();
        let mut options = ConfigOptions::default();
        while !matches!(self.tok.kind, TokenKind::ConfigEnd | TokenKind::Eof) {
            if self.tok.kind != TokenKind::Ident && !self.tok.kind.is_keyword() {
                let bail = self.error_expected("pragma option");
                self.skip_to_config_end();
                return Err(bail);
            }
            let key = Ident {
                name: self.tok.text().to_string(),
                pos: self.tok.pos,
            };
            self.next();
            let value = if self.tok.kind == TokenKind::Assign {
                self.next();
                match self.parse_unary() {
                    Ok(v) => Some(v),
                    Err(bail) => {
                        self.skip_to_config_end();
                        return Err(bail);
                    }
                }
            } else {
                None
            };
            self.set_config_option(&mut options, &key, value.as_ref());
            elements.push(KeyValue {
                key: Expr::Ident(key),
                value,
            });
            if self.tok.kind != TokenKind::Comma {
                break;
            }
            self.next();
        }
        let end = self.tok.pos;
        if self.tok.kind != TokenKind::ConfigEnd {
            let bail = self.error_expected("end of pragma");
            self.skip_to_config_end();
            return Err(bail);
        }
        self.apply_config(&options);
        self.next();
        Ok(Stmt::Config(ConfigStmt {
            pos,
            elements,
            options,
            end,
        }))
    }

    fn skip_to_config_end(&mut self) {
        while !matches!(self.tok.kind, TokenKind::ConfigEnd | TokenKind::Eof) {
            self.next();
        }
        if self.tok.kind == TokenKind::ConfigEnd {
            self.next();
        }
    }

    fn set_config_option(&mut self, options: &mut ConfigOptions, key: &Ident, value: Option<&Expr>) {
        let flag = |value: Option<&Expr>| match value {
            None => Some(true),
            Some(Expr::Bool(lit) | Expr::Flag(lit)) => Some(lit.value),
            Some(_) => None,
        };
        let text = |value: Option<&Expr>| match value {
            Some(Expr::String(lit) | Expr::RawString(lit)) => Some(lit.value.clone()),
            _ => None,
        };
        let ok = match key.name.as_str() {
            "mixed" => store(&mut options.mixed, flag(value)),
            "no_mixed" => store(&mut options.mixed, flag(value).map(|v| !v)),
            "mixed_start" => store(&mut options.mixed_start, text(value)),
            "mixed_end" => store(&mut options.mixed_end, text(value)),
            "float_as_decimal" => store(&mut options.floats_as_decimal, flag(value)),
            "char_as_string" => store(&mut options.char_as_string, flag(value)),
            "mixed_expr_as_value" => store(&mut options.mixed_value_sugar, flag(value)),
            other => {
                debug!(option = other, "ignoring unknown pragma option");
                return;
            }
        };
        if !ok {
            self.error_at(
                key.pos,
                ParseErrorKind::InvalidPragma(format!("bad value for '{}'", key.name)),
            );
        }
    }

    fn apply_config(&mut self, options: &ConfigOptions) {
        debug!(?options, "applying pragma");
        self.scanner
            .set_delimiter(options.mixed_start.as_deref(), options.mixed_end.as_deref());
        if let Some(on) = options.mixed {
            self.scanner.set_mixed(on);
        }
        if let Some(on) = options.floats_as_decimal {
            self.scanner.set_floats_as_decimal(on);
        }
        if let Some(on) = options.char_as_string {
            self.scanner.set_char_as_string(on);
        }
        if let Some(on) = options.mixed_value_sugar {
            self.scanner.set_mixed_value_sugar(on);
        }
    }
}

fn store<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

/// Human-readable token text for diagnostics.
fn describe(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Semicolon if tok.flags.contains(TokenFlags::INSERTED) => "newline".to_string(),
        TokenKind::Eof => "EOF".to_string(),
        _ => tok.text().to_string(),
    }
}

const fn starts_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::If
            | TokenKind::For
            | TokenKind::Return
            | TokenKind::Try
            | TokenKind::Throw
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Param
            | TokenKind::Global
            | TokenKind::Var
            | TokenKind::Const
    )
}

fn param_specs(args: ArgsList, named: NamedArgsList) -> Vec<Spec> {
    let mut specs: Vec<Spec> = args
        .values
        .into_iter()
        .map(|ident| Spec::Param {
            ident,
            variadic: false,
        })
        .collect();
    if let Some(ident) = args.var {
        specs.push(Spec::Param {
            ident,
            variadic: true,
        });
    }
    specs.extend(
        named
            .names
            .into_iter()
            .zip(named.values)
            .map(|(ident, value)| Spec::NamedParam {
                ident,
                value: Some(value),
                variadic: false,
            }),
    );
    if let Some(ident) = named.var {
        specs.push(Spec::NamedParam {
            ident,
            value: None,
            variadic: true,
        });
    }
    specs
}

/// Rewrite a just-closed code block holding one bare expression into a
/// value block.
fn fold_value_block(list: &mut Vec<Stmt>) {
    if !matches!(
        list.as_slice(),
        [.., Stmt::CodeBegin(_), Stmt::Expr(_), Stmt::CodeEnd(_)]
    ) {
        return;
    }
    let mut tail = list.split_off(list.len() - 3).into_iter();
    if let (Some(Stmt::CodeBegin(start)), Some(Stmt::Expr(expr)), Some(Stmt::CodeEnd(end))) =
        (tail.next(), tail.next(), tail.next())
    {
        list.push(Stmt::MixedValue(MixedValueStmt { start, expr, end }));
    }
}
