//! Canonical printer that serializes an AST back into Gad source.
//!
//! Binary, unary and conditional expressions are fully parenthesized, so the
//! output of a printed tree parses back to a tree that prints identically.
//! Mixed-mode text is emitted verbatim between its delimiters.

use std::fmt;

use crate::ast::{
    BlockStmt, CallArgs, ConfigStmt, DelimiterStmt, Expr, File, FuncParams, GenDecl, KeyValue,
    MixedValueStmt, Spec, Stmt, TypedIdent, UnaryOp,
};
use crate::token::{TokenKind, lookup};

/// Format a parsed file into canonical source text.
///
/// Code statements go on separate lines; a trailing newline is added unless
/// the file ends inside mixed-mode text.
#[must_use]
pub fn format(file: &File) -> String {
    let mut out = String::new();
    format_stmt_list(&mut out, &file.stmts, "\n");
    if file
        .stmts
        .iter()
        .rev()
        .find(|s| !matches!(s, Stmt::Empty { .. }))
        .is_some_and(|s| !s.is_mixed_boundary())
    {
        out.push('\n');
    }
    out
}

/// Quote `s` as a double-quoted string literal.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let code = u32::from(c);
                if code <= 0xFFFF {
                    out.push_str(&format!("\\u{code:04x}"));
                } else {
                    out.push_str(&format!("\\U{code:08x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `name` can be written bare as a selector or dict key.
fn is_bare_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts = chars.next().is_some_and(|c| c == '_' || c.is_alphabetic());
    if !starts || !chars.all(|c| c == '_' || c.is_alphanumeric()) {
        return false;
    }
    let kind = lookup(name);
    kind == TokenKind::Ident || kind.is_keyword()
}

fn format_name(out: &mut String, name: &str) {
    if is_bare_name(name) {
        out.push_str(name);
    } else {
        out.push_str(&quote(name));
    }
}

// ----- statements ---------------------------------------------------------

/// Text placed between two printed statements.
///
/// Nothing may be inserted next to mixed-mode text, and a pragma always
/// starts on its own line.
fn separator<'s>(out: &str, prev: &Stmt, cur: &Stmt, sep: &'s str) -> &'s str {
    if matches!(cur, Stmt::Config(_)) {
        return if out.ends_with('\n') { "" } else { "\n" };
    }
    match (prev, cur) {
        (Stmt::MixedText(_) | Stmt::MixedValue(_) | Stmt::CodeEnd(_) | Stmt::Config(_), _)
        | (_, Stmt::MixedText(_) | Stmt::MixedValue(_) | Stmt::CodeBegin(_)) => "",
        (Stmt::CodeBegin(_), _) | (_, Stmt::CodeEnd(_)) => " ",
        _ => sep,
    }
}

fn format_stmt_list(out: &mut String, stmts: &[Stmt], sep: &str) {
    let mut prev: Option<&Stmt> = None;
    for stmt in stmts {
        if matches!(stmt, Stmt::Empty { .. }) {
            continue;
        }
        if let Some(prev) = prev {
            let s = separator(out, prev, stmt, sep);
            out.push_str(s);
        }
        format_stmt(out, stmt);
        prev = Some(stmt);
    }
}

fn format_block(out: &mut String, block: &BlockStmt) {
    if !block.stmts.iter().any(Stmt::is_mixed_boundary) {
        out.push('{');
        format_stmt_list(out, &block.stmts, "; ");
        out.push('}');
        return;
    }
    // `{` counts as nesting in code mode, so text blocks use keywords.
    out.push_str("do");
    match block.stmts.iter().find(|s| !matches!(s, Stmt::Empty { .. })) {
        Some(Stmt::Config(_)) => out.push('\n'),
        _ => out.push(' '),
    }
    format_stmt_list(out, &block.stmts, "; ");
    if !out.ends_with(' ') && !out.ends_with('\n') {
        out.push(' ');
    }
    out.push_str("end");
}

#[allow(clippy::too_many_lines)]
fn format_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Expr(e) => format_expr(out, e),
        Stmt::Empty { .. } => {}
        Stmt::Block(b) => format_block(out, b),
        Stmt::Assign(a) => {
            format_expr_list(out, &a.lhs);
            out.push(' ');
            out.push_str(a.op.as_str());
            out.push(' ');
            format_expr_list(out, &a.rhs);
        }
        Stmt::Decl(d) => format_decl(out, d),
        Stmt::If(s) => {
            out.push_str("if ");
            if let Some(init) = &s.init {
                format_stmt(out, init);
                out.push_str("; ");
            }
            format_expr(out, &s.cond);
            out.push(' ');
            format_block(out, &s.body);
            if let Some(else_stmt) = &s.else_stmt {
                out.push_str(" else ");
                format_stmt(out, else_stmt);
            }
        }
        Stmt::For(s) => {
            out.push_str("for ");
            if s.init.is_some() || s.post.is_some() {
                if let Some(init) = &s.init {
                    format_stmt(out, init);
                }
                out.push_str("; ");
                if let Some(cond) = &s.cond {
                    format_expr(out, cond);
                }
                out.push_str("; ");
                if let Some(post) = &s.post {
                    format_stmt(out, post);
                    out.push(' ');
                }
            } else if let Some(cond) = &s.cond {
                format_expr(out, cond);
                out.push(' ');
            }
            format_block(out, &s.body);
            if let Some(else_block) = &s.else_block {
                out.push_str(" else ");
                format_block(out, else_block);
            }
        }
        Stmt::ForIn(s) => {
            out.push_str("for ");
            out.push_str(&s.key.name);
            if let Some(value) = &s.value {
                out.push_str(", ");
                out.push_str(&value.name);
            }
            out.push_str(" in ");
            format_expr(out, &s.iterable);
            out.push(' ');
            format_block(out, &s.body);
            if let Some(else_block) = &s.else_block {
                out.push_str(" else ");
                format_block(out, else_block);
            }
        }
        Stmt::Branch { tok, .. } => out.push_str(tok.as_str()),
        Stmt::Return { result, .. } => {
            out.push_str("return");
            if let Some(result) = result {
                out.push(' ');
                format_expr(out, result);
            }
        }
        Stmt::IncDec { expr, tok, .. } => {
            format_expr(out, expr);
            out.push_str(tok.as_str());
        }
        Stmt::Try(t) => {
            out.push_str("try ");
            format_block(out, &t.body);
            if let Some(catch) = &t.catch {
                out.push_str(" catch ");
                if let Some(ident) = &catch.ident {
                    out.push_str(&ident.name);
                    out.push(' ');
                }
                format_block(out, &catch.body);
            }
            if let Some(finally) = &t.finally {
                out.push_str(" finally ");
                format_block(out, &finally.body);
            }
        }
        Stmt::Throw { expr, .. } => {
            out.push_str("throw ");
            format_expr(out, expr);
        }
        Stmt::MixedText(t) => out.push_str(&t.literal),
        Stmt::CodeBegin(d) | Stmt::CodeEnd(d) => format_delimiter(out, d),
        Stmt::MixedValue(v) => format_mixed_value(out, v),
        Stmt::Config(c) => format_config(out, c),
        Stmt::Bad { .. } => out.push_str("<bad statement>"),
    }
}

fn format_delimiter(out: &mut String, d: &DelimiterStmt) {
    out.push_str(&d.literal);
}

fn format_mixed_value(out: &mut String, v: &MixedValueStmt) {
    format_delimiter(out, &v.start);
    out.push(' ');
    format_expr(out, &v.expr);
    out.push(' ');
    format_delimiter(out, &v.end);
}

fn format_config(out: &mut String, c: &ConfigStmt) {
    out.push_str("# gad: ");
    format_key_values(out, &c.elements);
    out.push('\n');
}

fn format_key_values(out: &mut String, elements: &[KeyValue]) {
    for (i, kv) in elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_expr(out, &kv.key);
        if let Some(value) = &kv.value {
            out.push('=');
            format_expr(out, value);
        }
    }
}

fn format_decl(out: &mut String, d: &GenDecl) {
    out.push_str(d.tok.as_str());
    out.push(' ');
    let parens = d.lparen.is_some() || d.specs.len() > 1;
    if parens {
        out.push('(');
    }
    let (positional, named): (Vec<&Spec>, Vec<&Spec>) = d
        .specs
        .iter()
        .partition(|s| matches!(s, Spec::Param { .. }));
    for (i, spec) in positional.iter().chain(&named).enumerate() {
        if i > 0 {
            out.push_str(if i == positional.len() { "; " } else { ", " });
        }
        format_spec(out, spec);
    }
    if parens {
        out.push(')');
    }
}

fn format_spec(out: &mut String, spec: &Spec) {
    match spec {
        Spec::Param { ident, variadic } => {
            if *variadic {
                out.push('*');
            }
            format_typed_ident(out, ident);
        }
        Spec::NamedParam {
            ident,
            value,
            variadic,
        } => {
            if *variadic {
                out.push_str("**");
            }
            format_typed_ident(out, ident);
            if let Some(value) = value {
                out.push('=');
                format_expr(out, value);
            }
        }
        Spec::Value { ident, value } => {
            out.push_str(&ident.name);
            if let Some(value) = value {
                out.push_str(" = ");
                format_expr(out, value);
            }
        }
    }
}

fn format_typed_ident(out: &mut String, t: &TypedIdent) {
    out.push_str(&t.ident.name);
    for (i, ty) in t.types.iter().enumerate() {
        out.push(if i == 0 { ' ' } else { '|' });
        out.push_str(&ty.name);
    }
}

fn format_params(out: &mut String, p: &FuncParams) {
    out.push('(');
    let mut parts = 0;
    for ident in &p.args.values {
        if parts > 0 {
            out.push_str(", ");
        }
        format_typed_ident(out, ident);
        parts += 1;
    }
    if let Some(var) = &p.args.var {
        if parts > 0 {
            out.push_str(", ");
        }
        out.push('*');
        format_typed_ident(out, var);
        parts += 1;
    }
    let positional = parts;
    for (name, value) in p.named.names.iter().zip(&p.named.values) {
        if parts > 0 {
            out.push_str(if parts == positional { "; " } else { ", " });
        }
        format_typed_ident(out, name);
        out.push('=');
        format_expr(out, value);
        parts += 1;
    }
    if let Some(var) = &p.named.var {
        if parts > 0 {
            out.push_str(if parts == positional { "; " } else { ", " });
        }
        out.push_str("**");
        format_typed_ident(out, var);
    }
    out.push(')');
}

// ----- expressions --------------------------------------------------------

fn format_expr_list(out: &mut String, list: &[Expr]) {
    for (i, e) in list.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_expr(out, e);
    }
}

fn format_call_args(out: &mut String, args: &CallArgs) {
    format_expr_list(out, &args.positional);
    let mut parts = args.positional.len();
    if let Some(var) = &args.var {
        if parts > 0 {
            out.push_str(", ");
        }
        out.push('*');
        format_expr(out, var);
        parts += 1;
    }
    let positional = parts;
    for arg in &args.named {
        if parts > 0 {
            out.push_str(if parts == positional { "; " } else { ", " });
        }
        format_expr(out, &arg.name);
        out.push('=');
        format_expr(out, &arg.value);
        parts += 1;
    }
    if let Some(var) = &args.var_named {
        if parts > 0 {
            out.push_str(if parts == positional { "; " } else { ", " });
        }
        out.push_str("**");
        format_expr(out, var);
    }
}

fn format_selector(out: &mut String, sel: &Expr) {
    match sel {
        Expr::String(lit) if is_bare_name(&lit.value) => out.push_str(&lit.value),
        other => {
            out.push('(');
            format_expr(out, other);
            out.push(')');
        }
    }
}

#[allow(clippy::too_many_lines)]
fn format_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Ident(id) => out.push_str(&id.name),
        Expr::Int(l) => out.push_str(&l.literal),
        Expr::Uint(l) => out.push_str(&l.literal),
        Expr::Float(l) => out.push_str(&l.literal),
        Expr::Char(l) => out.push_str(&l.literal),
        Expr::Decimal(l) | Expr::String(l) | Expr::RawString(l) | Expr::RawHeredoc(l) => {
            out.push_str(&l.literal);
        }
        Expr::Bool(l) | Expr::Flag(l) => out.push_str(&l.literal),
        Expr::Nil(_) => out.push_str("nil"),
        Expr::Callee(_) => out.push_str(TokenKind::Callee.as_str()),
        Expr::Args(_) => out.push_str(TokenKind::Args.as_str()),
        Expr::NamedArgs(_) => out.push_str(TokenKind::NamedArgs.as_str()),
        Expr::Array(a) => {
            out.push('[');
            format_expr_list(out, &a.elements);
            out.push(']');
        }
        Expr::Dict(d) => {
            out.push('{');
            for (i, el) in d.elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_name(out, &el.key);
                out.push_str(": ");
                format_expr(out, &el.value);
            }
            out.push('}');
        }
        Expr::Binary(b) => {
            out.push('(');
            format_expr(out, &b.lhs);
            out.push(' ');
            out.push_str(b.op.as_str());
            out.push(' ');
            format_expr(out, &b.rhs);
            out.push(')');
        }
        Expr::Unary(u) => {
            out.push('(');
            match u.op {
                UnaryOp::Null | UnaryOp::NotNull => {
                    format_expr(out, &u.expr);
                    out.push(' ');
                    out.push_str(u.op.as_str());
                }
                op => {
                    out.push_str(op.as_str());
                    format_expr(out, &u.expr);
                }
            }
            out.push(')');
        }
        Expr::Cond(c) => {
            out.push('(');
            format_expr(out, &c.cond);
            out.push_str(" ? ");
            format_expr(out, &c.if_true);
            out.push_str(" : ");
            format_expr(out, &c.if_false);
            out.push(')');
        }
        Expr::Call(c) => {
            if c.piped {
                let (first, rest) = c.args.positional.split_first().map_or(
                    (None, &[][..]),
                    |(first, rest)| (Some(first), rest),
                );
                if let Some(first) = first {
                    format_expr(out, first);
                    out.push_str(" .| ");
                }
                format_expr(out, &c.func);
                out.push('(');
                let args = CallArgs {
                    positional: rest.to_vec(),
                    ..c.args.clone()
                };
                format_call_args(out, &args);
                out.push(')');
            } else {
                format_expr(out, &c.func);
                out.push('(');
                format_call_args(out, &c.args);
                out.push(')');
            }
        }
        Expr::Index(i) => {
            format_expr(out, &i.expr);
            out.push('[');
            format_expr(out, &i.index);
            out.push(']');
        }
        Expr::Slice(s) => {
            format_expr(out, &s.expr);
            out.push('[');
            if let Some(low) = &s.low {
                format_expr(out, low);
            }
            out.push(':');
            if let Some(high) = &s.high {
                format_expr(out, high);
            }
            out.push(']');
        }
        Expr::Selector(s) => {
            format_expr(out, &s.expr);
            out.push('.');
            format_selector(out, &s.sel);
        }
        Expr::NullishSelector(s) => {
            format_expr(out, &s.expr);
            out.push_str("?.");
            format_selector(out, &s.sel);
        }
        Expr::Paren(p) => match p.expr.as_ref() {
            inner @ (Expr::Binary(_) | Expr::Unary(_) | Expr::Cond(_)) => format_expr(out, inner),
            inner => {
                out.push('(');
                format_expr(out, inner);
                out.push(')');
            }
        },
        Expr::MultiParen(m) => {
            out.push('(');
            format_call_args(out, &m.args);
            if m.args.positional.len() == 1 && m.args.var.is_none() && !m.args.has_named() {
                out.push(',');
            }
            out.push(')');
        }
        Expr::KeyValueArray(k) => {
            out.push_str("(;");
            format_key_values(out, &k.elements);
            out.push(')');
        }
        Expr::Func(f) => {
            out.push_str("func");
            if let Some(name) = &f.name {
                out.push(' ');
                out.push_str(&name.name);
            }
            format_params(out, &f.params);
            out.push(' ');
            format_block(out, &f.body);
        }
        Expr::Closure(c) => {
            out.push_str("func");
            format_params(out, &c.params);
            out.push_str(" => ");
            format_expr(out, &c.body);
        }
        Expr::Import(i) => {
            out.push_str("import(");
            out.push_str(&quote(&i.module_name));
            out.push(')');
        }
        Expr::Embed(e) => {
            out.push_str("embed(");
            out.push_str(&quote(&e.path));
            out.push(')');
        }
        Expr::Return(r) => {
            out.push_str("return");
            if let Some(result) = &r.result {
                out.push(' ');
                format_expr(out, result);
            }
        }
        Expr::Bad { .. } => out.push_str("<bad expression>"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        format_expr(&mut out, self);
        f.write_str(&out)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        format_stmt(&mut out, self);
        f.write_str(&out)
    }
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        format_block(&mut out, self);
        f.write_str(&out)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(quote("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn bare_names() {
        assert!(is_bare_name("foo_1"));
        assert!(is_bare_name("if"));
        assert!(!is_bare_name("do"));
        assert!(!is_bare_name("a b"));
        assert!(!is_bare_name("1a"));
        assert!(!is_bare_name(""));
    }
}
