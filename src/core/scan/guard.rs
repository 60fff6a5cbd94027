//! Expression guardrails: decide whether a literal-bearing expression can be
//! rewritten safely, and in which shape.
//!
//! Markup expressions are inspected on the swc AST. Template expressions are
//! plain strings, so they go through a small JavaScript-ish tokenizer first.

use std::{ops::Range, sync::LazyLock};

use regex::Regex;
use swc_ecma_ast::{BinaryOp, Expr, Lit, MemberProp};

use crate::core::candidate::InterpolationParam;
use crate::core::error::UnsafePattern;
use crate::utils::contains_alphabetic;

static SIMPLE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap()
});

/// Placeholder names for a full-wrap rewrite. The same expression reuses its
/// name; different expressions with the same name get a numeric suffix.
#[derive(Debug, Default)]
pub struct ParamSet {
    params: Vec<InterpolationParam>,
}

impl ParamSet {
    pub fn bind(&mut self, name: &str, expr: &str) -> String {
        if let Some(existing) = self.params.iter().find(|p| p.expr == expr) {
            return existing.name.clone();
        }
        let mut candidate = name.to_string();
        let mut n = 2;
        while self.params.iter().any(|p| p.name == candidate) {
            candidate = format!("{}{}", name, n);
            n += 1;
        }
        self.params.push(InterpolationParam {
            name: candidate.clone(),
            expr: expr.to_string(),
        });
        candidate
    }

    pub fn into_params(self) -> Vec<InterpolationParam> {
        self.params
    }
}

// ============================================================
// Markup (swc AST)
// ============================================================

pub fn unwrap_parens(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

fn is_logical(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
    )
}

fn contains_conditional(expr: &Expr) -> bool {
    match unwrap_parens(expr) {
        Expr::Cond(_) => true,
        Expr::Bin(bin) if is_logical(bin.op) => true,
        Expr::Bin(bin) => contains_conditional(&bin.left) || contains_conditional(&bin.right),
        Expr::Tpl(tpl) => tpl.exprs.iter().any(|e| contains_conditional(e)),
        _ => false,
    }
}

/// Operands of a `+` chain, left to right.
pub fn concat_operands(expr: &Expr) -> Vec<&Expr> {
    match unwrap_parens(expr) {
        Expr::Bin(bin) if bin.op == BinaryOp::Add => {
            let mut operands = concat_operands(&bin.left);
            operands.extend(concat_operands(&bin.right));
            operands
        }
        other => vec![other],
    }
}

/// Unsafe shape of a markup expression, if any.
pub fn check_markup_expr(expr: &Expr) -> Option<UnsafePattern> {
    match unwrap_parens(expr) {
        Expr::Cond(_) => Some(UnsafePattern::TopLevelTernary),
        Expr::Bin(bin) if bin.op == BinaryOp::Add => concat_operands(expr)
            .iter()
            .any(|operand| contains_conditional(operand))
            .then_some(UnsafePattern::ConditionalConcatenation),
        Expr::Tpl(tpl) => tpl
            .exprs
            .iter()
            .any(|e| contains_conditional(e))
            .then_some(UnsafePattern::ConditionalInterpolation),
        _ => None,
    }
}

/// Whether the expression carries a literal worth translating somewhere in
/// its rendered output.
pub fn has_translatable_literal(expr: &Expr) -> bool {
    match unwrap_parens(expr) {
        Expr::Lit(Lit::Str(s)) => s.value.as_str().is_some_and(contains_alphabetic),
        Expr::Tpl(tpl) => {
            tpl.quasis.iter().any(|q| {
                q.cooked
                    .as_ref()
                    .and_then(|c| c.as_str())
                    .is_some_and(contains_alphabetic)
            }) || tpl.exprs.iter().any(|e| has_translatable_literal(e))
        }
        Expr::Cond(cond) => has_translatable_literal(&cond.cons) || has_translatable_literal(&cond.alt),
        Expr::Bin(bin) if is_logical(bin.op) => has_translatable_literal(&bin.right),
        Expr::Bin(bin) if bin.op == BinaryOp::Add => {
            has_translatable_literal(&bin.left) || has_translatable_literal(&bin.right)
        }
        _ => false,
    }
}

fn is_simple_object(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::This(_) => true,
        Expr::Member(member) => {
            matches!(member.prop, MemberProp::Ident(_)) && is_simple_object(&member.obj)
        }
        _ => false,
    }
}

/// Placeholder name for an identifier or plain member path.
pub fn simple_param_name(expr: &Expr) -> Option<String> {
    match unwrap_parens(expr) {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) if is_simple_object(&member.obj) => match &member.prop {
            MemberProp::Ident(prop) => Some(prop.sym.to_string()),
            _ => None,
        },
        _ => None,
    }
}

// ============================================================
// Template expressions (string tokenizer)
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Str { value: String, quote: char },
    Template { quasis: Vec<String>, exprs: Vec<String> },
    Ident(String),
    Number,
    Punct(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    range: Range<usize>,
}

impl Token {
    fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.kind, TokenKind::Punct(p) if p == punct)
    }

    fn is_logical(&self) -> bool {
        self.is_punct("&&") || self.is_punct("||") || self.is_punct("??")
    }

    fn translatable(&self) -> bool {
        match &self.kind {
            TokenKind::Str { value, .. } => contains_alphabetic(value),
            TokenKind::Template { quasis, .. } => quasis.iter().any(|q| contains_alphabetic(q)),
            _ => false,
        }
    }
}

const MULTI_PUNCT: &[&str] = &[
    "===", "!==", "?.", "??", "&&", "||", "==", "!=", ">=", "<=", "=>",
];

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn tokenize(expr: &str) -> Vec<Token> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
        } else if b == b'"' || b == b'\'' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b {
                j += if bytes[j] == b'\\' { 2 } else { 1 };
            }
            let close = j.min(bytes.len());
            tokens.push(Token {
                kind: TokenKind::Str {
                    value: unescape(&expr[i + 1..close]),
                    quote: b as char,
                },
                range: i..(close + 1).min(bytes.len()),
            });
            i = close + 1;
        } else if b == b'`' {
            let (kind, end) = template_literal(expr, i);
            tokens.push(Token { kind, range: i..end });
            i = end;
        } else if is_ident_byte(b) && !b.is_ascii_digit() {
            let mut j = i;
            while j < bytes.len() && is_ident_byte(bytes[j]) {
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(expr[i..j].to_string()),
                range: i..j,
            });
            i = j;
        } else if b.is_ascii_digit() {
            let mut j = i;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'.') {
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                range: i..j,
            });
            i = j;
        } else {
            let len = MULTI_PUNCT
                .iter()
                .find(|p| expr[i..].starts_with(**p))
                .map_or(1, |p| p.len());
            tokens.push(Token {
                kind: TokenKind::Punct(expr[i..i + len].to_string()),
                range: i..i + len,
            });
            i += len;
        }
    }
    tokens
}

/// Read a backtick literal starting at `start`; returns the token and the
/// offset just past the closing backtick.
fn template_literal(expr: &str, start: usize) -> (TokenKind, usize) {
    let bytes = expr.as_bytes();
    let mut quasis = Vec::new();
    let mut exprs = Vec::new();
    let mut j = start + 1;
    let mut quasi_start = j;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'`' => break,
            b'$' if bytes.get(j + 1) == Some(&b'{') => {
                quasis.push(unescape(&expr[quasi_start..j]));
                let inner_start = j + 2;
                let mut depth = 1;
                let mut k = inner_start;
                while k < bytes.len() {
                    match bytes[k] {
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    k += 1;
                }
                exprs.push(expr[inner_start..k.min(bytes.len())].to_string());
                j = k + 1;
                quasi_start = j.min(bytes.len());
            }
            _ => j += 1,
        }
    }
    let close = j.min(bytes.len());
    quasis.push(unescape(&expr[quasi_start.min(close)..close]));
    (TokenKind::Template { quasis, exprs }, (close + 1).min(bytes.len()))
}

/// What a template expression contributes, with ranges relative to the
/// expression string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateFinding {
    /// A quoted literal; `range` excludes the quotes.
    Literal {
        value: String,
        quote: char,
        range: Range<usize>,
    },
    /// An interpolating literal or concatenation. For backtick literals
    /// `range` excludes the backticks and `quote` is set; for concatenations
    /// it covers the whole chain.
    Interpolated {
        text: String,
        params: Vec<InterpolationParam>,
        range: Range<usize>,
        quote: Option<char>,
    },
    /// Literal first argument of a translation call; `range` excludes the quotes.
    CallArgument {
        value: String,
        quote: char,
        range: Range<usize>,
    },
    Rejected {
        pattern: UnsafePattern,
        range: Range<usize>,
    },
}

fn inner(range: &Range<usize>) -> Range<usize> {
    range.start + 1..range.end.saturating_sub(1).max(range.start + 1)
}

fn trimmed_range(expr: &str) -> Range<usize> {
    let start = expr.len() - expr.trim_start().len();
    start..expr.trim_end().len().max(start)
}

fn matching_paren(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                return idx;
            }
        }
    }
    tokens.len().saturating_sub(1)
}

fn has_conditional(expr: &str) -> bool {
    tokenize(expr)
        .iter()
        .any(|t| t.is_punct("?") || t.is_logical())
}

/// Analyze a template expression (interpolation or bound attribute value).
///
/// `call_names` are the translation calls whose first literal argument is
/// reported as a call argument when `scan_calls` is set; everything inside
/// such calls is otherwise left alone.
pub fn analyze_template_expr(expr: &str, call_names: &[&str], scan_calls: bool) -> Vec<TemplateFinding> {
    let tokens = tokenize(expr);
    let mut findings = Vec::new();
    let mut consumed = vec![false; tokens.len()];

    let mut i = 0;
    while i < tokens.len() {
        let is_call = matches!(&tokens[i].kind, TokenKind::Ident(name) if call_names.contains(&name.as_str()))
            && tokens.get(i + 1).is_some_and(|t| t.is_punct("("));
        if !is_call {
            i += 1;
            continue;
        }
        let close = matching_paren(&tokens, i + 1);
        consumed[i..=close].iter_mut().for_each(|c| *c = true);
        if let Some(Token {
            kind: TokenKind::Str { value, quote },
            range,
        }) = tokens.get(i + 2)
            && tokens
                .get(i + 3)
                .is_some_and(|t| t.is_punct(",") || t.is_punct(")"))
            && scan_calls
            && contains_alphabetic(value)
        {
            findings.push(TemplateFinding::CallArgument {
                value: value.clone(),
                quote: *quote,
                range: inner(range),
            });
        }
        i = close + 1;
    }

    let live: Vec<&Token> = tokens
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(t, _)| t)
        .collect();
    if !live.iter().any(|t| t.translatable()) {
        return findings;
    }

    let has_plus = live.iter().any(|t| t.is_punct("+"));
    let has_ternary = live.iter().any(|t| t.is_punct("?"));
    let has_logical = live.iter().any(|t| t.is_logical());
    let reject = |pattern| TemplateFinding::Rejected {
        pattern,
        range: trimmed_range(expr),
    };

    if has_plus && (has_ternary || has_logical) {
        findings.push(reject(UnsafePattern::ConditionalConcatenation));
        return findings;
    }
    if has_ternary {
        findings.push(reject(UnsafePattern::TopLevelTernary));
        return findings;
    }
    let conditional_interpolation = live.iter().any(|t| {
        matches!(&t.kind, TokenKind::Template { exprs, .. } if exprs.iter().any(|e| has_conditional(e)))
    });
    if conditional_interpolation {
        findings.push(reject(UnsafePattern::ConditionalInterpolation));
        return findings;
    }

    if has_logical {
        // `ok && 'Shown'`: only a trailing literal is rendered text
        if let [.., op, last] = live.as_slice()
            && op.is_logical()
            && let TokenKind::Str { value, quote } = &last.kind
            && last.translatable()
        {
            findings.push(TemplateFinding::Literal {
                value: value.clone(),
                quote: *quote,
                range: inner(&last.range),
            });
        }
        return findings;
    }

    match live.as_slice() {
        [token] => match &token.kind {
            TokenKind::Str { value, quote } => findings.push(TemplateFinding::Literal {
                value: value.clone(),
                quote: *quote,
                range: inner(&token.range),
            }),
            TokenKind::Template { quasis, exprs } if exprs.is_empty() => {
                findings.push(TemplateFinding::Literal {
                    value: quasis.concat(),
                    quote: '`',
                    range: inner(&token.range),
                })
            }
            TokenKind::Template { quasis, exprs } => match interpolate(quasis, exprs) {
                Some((text, params)) => findings.push(TemplateFinding::Interpolated {
                    text,
                    params,
                    range: inner(&token.range),
                    quote: Some('`'),
                }),
                None => findings.push(reject(UnsafePattern::ComplexInterpolation)),
            },
            _ => {}
        },
        _ if has_plus => {
            if let Some((text, params)) = concatenation(expr, &live) {
                let start = live[0].range.start;
                let end = live[live.len() - 1].range.end;
                findings.push(TemplateFinding::Interpolated {
                    text,
                    params,
                    range: start..end,
                    quote: None,
                });
            }
        }
        _ => {}
    }
    findings
}

fn param_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn interpolate(quasis: &[String], exprs: &[String]) -> Option<(String, Vec<InterpolationParam>)> {
    let mut params = ParamSet::default();
    let mut text = String::new();
    for (idx, quasi) in quasis.iter().enumerate() {
        text.push_str(quasi);
        if let Some(expr) = exprs.get(idx) {
            let path = expr.trim();
            if !SIMPLE_PATH.is_match(path) {
                return None;
            }
            let name = params.bind(param_name(path), path);
            text.push('{');
            text.push_str(&name);
            text.push('}');
        }
    }
    Some((text, params.into_params()))
}

/// `'Hello ' + user.name + '!'`: literals and plain paths joined by `+`.
fn concatenation(expr: &str, tokens: &[&Token]) -> Option<(String, Vec<InterpolationParam>)> {
    let mut params = ParamSet::default();
    let mut text = String::new();
    for operand in tokens.split(|t| t.is_punct("+")) {
        match operand {
            [] => return None,
            [token] if matches!(token.kind, TokenKind::Str { .. }) => {
                if let TokenKind::Str { value, .. } = &token.kind {
                    text.push_str(value);
                }
            }
            path_tokens => {
                let start = path_tokens[0].range.start;
                let end = path_tokens[path_tokens.len() - 1].range.end;
                let path = &expr[start..end];
                if !SIMPLE_PATH.is_match(path) {
                    return None;
                }
                let name = params.bind(param_name(path), path);
                text.push('{');
                text.push_str(&name);
                text.push('}');
            }
        }
    }
    Some((text, params.into_params()))
}
