//! JSX/TSX scanner.
//!
//! Walks the swc AST and records text nodes, allow-listed attribute values,
//! literal-bearing expression containers and (in migration mode) literal
//! arguments of translation calls. Every candidate carries its exact byte
//! span and the function scope where a hook binding would go.

use std::ops::Range;

use anyhow::Result;
use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{
    ArrowExpr, BinaryOp, BlockStmt, BlockStmtOrExpr, CallExpr, Callee, Decl, DefaultDecl, Expr,
    ExportDefaultDecl, ExportDefaultExpr, FnDecl, Function, JSXAttr, JSXAttrName, JSXAttrValue,
    JSXElement, JSXElementName, JSXExpr, JSXExprContainer, JSXFragment, JSXText, Lit, Module,
    ModuleItem, ObjectPatProp, Pat, Stmt, Str, Tpl, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::ScanOptions;
use super::guard::{self, ParamSet};
use crate::core::adapter::hook_names;
use crate::core::candidate::{
    Candidate, CandidateContext, CandidateKind, Dialect, Position, ReplaceMode, ScopeBody,
    ScopeSite,
};
use crate::core::error::UnsafePattern;
use crate::core::parsers::jsx::{ParsedJSX, parse_jsx};
use crate::utils::{char_column, collapse_whitespace, decode_entities, line_indent};

pub fn scan(
    source: &str,
    file_path: &str,
    path_hint: Option<&str>,
    options: &ScanOptions,
) -> Result<Vec<Candidate>> {
    let parsed = parse_jsx(source, file_path)?;
    Ok(MarkupScanner::new(&parsed, file_path, path_hint, options).collect())
}

/// Where the walker currently is relative to JSX.
#[derive(Debug, Clone, Copy, Default)]
struct JsxState {
    /// Inside element or fragment children.
    in_context: bool,
    /// Inside an attribute value.
    in_attr: bool,
    /// The current attribute is allow-listed.
    allowed_attr: bool,
}

impl JsxState {
    fn for_children(self) -> Self {
        Self {
            in_context: true,
            in_attr: false,
            allowed_attr: false,
        }
    }
}

struct Scope {
    id: usize,
    body: ScopeBody,
    /// Named like a component or hook, so a hook call is legal here.
    component: bool,
    has_binding: bool,
}

struct Found {
    kind: CandidateKind,
    text: String,
    raw: String,
    span: Range<usize>,
    replace: ReplaceMode,
    quote: Option<char>,
    rejection: Option<UnsafePattern>,
}

pub struct MarkupScanner<'a> {
    parsed: &'a ParsedJSX,
    file_path: &'a str,
    path_hint: Option<&'a str>,
    options: &'a ScanOptions,
    hooks: Vec<&'a str>,
    jsx_state: JsxState,
    attribute: Option<String>,
    scopes: Vec<Scope>,
    /// Name of the declaration whose function is visited next.
    pending_name: Option<String>,
    module_binding: bool,
    candidates: Vec<Candidate>,
}

fn is_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    let hook = name
        .strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase());
    first_upper || hook || name == "default"
}

fn is_function_like(expr: &Expr) -> bool {
    match guard::unwrap_parens(expr) {
        Expr::Arrow(_) | Expr::Fn(_) => true,
        // memo(() => ...), forwardRef(function ...)
        Expr::Call(call) => call
            .args
            .first()
            .is_some_and(|arg| matches!(guard::unwrap_parens(&arg.expr), Expr::Arrow(_) | Expr::Fn(_))),
        _ => false,
    }
}

impl<'a> MarkupScanner<'a> {
    pub fn new(
        parsed: &'a ParsedJSX,
        file_path: &'a str,
        path_hint: Option<&'a str>,
        options: &'a ScanOptions,
    ) -> Self {
        Self {
            parsed,
            file_path,
            path_hint,
            options,
            hooks: hook_names(&options.adapter),
            jsx_state: JsxState::default(),
            attribute: None,
            scopes: Vec::new(),
            pending_name: None,
            module_binding: false,
            candidates: Vec::new(),
        }
    }

    pub fn collect(mut self) -> Vec<Candidate> {
        let parsed = self.parsed;
        self.visit_module(&parsed.module);
        self.candidates
    }

    fn source(&self) -> &'a str {
        self.parsed.source()
    }

    // ---- bindings and scopes ----

    fn pattern_binds(&self, pat: &Pat) -> bool {
        let call = self.options.adapter.call_name.as_str();
        match pat {
            Pat::Ident(binding) => binding.id.sym.as_str() == call,
            Pat::Object(object) => object.props.iter().any(|prop| match prop {
                ObjectPatProp::Assign(assign) => assign.key.sym.as_str() == call,
                ObjectPatProp::KeyValue(kv) => self.pattern_binds(&kv.value),
                ObjectPatProp::Rest(_) => false,
            }),
            Pat::Assign(assign) => self.pattern_binds(&assign.left),
            _ => false,
        }
    }

    fn is_hook_call(&self, expr: &Expr) -> bool {
        let expr = match guard::unwrap_parens(expr) {
            Expr::Await(awaited) => guard::unwrap_parens(&awaited.arg),
            other => other,
        };
        if let Expr::Call(call) = expr
            && let Callee::Expr(callee) = &call.callee
            && let Expr::Ident(ident) = &**callee
        {
            return self.hooks.iter().any(|hook| *hook == ident.sym.as_str());
        }
        false
    }

    fn declares_binding(&self, stmt: &Stmt) -> bool {
        let Stmt::Decl(Decl::Var(var)) = stmt else {
            return false;
        };
        var.decls.iter().any(|decl| {
            self.pattern_binds(&decl.name)
                && decl.init.as_deref().is_some_and(|init| self.is_hook_call(init))
        })
    }

    fn block_body(&self, block: &BlockStmt) -> ScopeBody {
        let source = self.source();
        let brace = self.parsed.offset(block.span.lo);
        let indent = match block.stmts.first() {
            Some(first) => {
                let first_offset = self.parsed.offset(first.span().lo);
                if source[brace..first_offset].contains('\n') {
                    line_indent(source, first_offset).to_string()
                } else {
                    format!("{}  ", line_indent(source, brace))
                }
            }
            None => format!("{}  ", line_indent(source, brace)),
        };
        ScopeBody::Block {
            insert_at: brace + 1,
            indent,
        }
    }

    fn expr_body(&self, arrow_start: BytePos, expr: &Expr) -> ScopeBody {
        let base_indent = line_indent(self.source(), self.parsed.offset(arrow_start)).to_string();
        ScopeBody::Expr {
            range: self.parsed.range(expr.span()),
            indent: format!("{}  ", base_indent),
            base_indent,
        }
    }

    fn enter_scope(&mut self, start: BytePos, body: ScopeBody, params_bind: bool, stmts: &[Stmt]) {
        let component = self
            .pending_name
            .take()
            .is_some_and(|name| is_component_name(&name));
        let outer = self
            .scopes
            .last()
            .map_or(self.module_binding, |scope| scope.has_binding);
        let has_binding = outer || params_bind || stmts.iter().any(|s| self.declares_binding(s));
        self.scopes.push(Scope {
            id: self.parsed.offset(start),
            body,
            component,
            has_binding,
        });
    }

    /// Binding site for a new candidate: the innermost component-like
    /// function, else the innermost function.
    fn scope_site(&self) -> Option<ScopeSite> {
        let Some(innermost) = self.scopes.last() else {
            return self.module_binding.then(|| ScopeSite {
                id: 0,
                body: ScopeBody::Module,
                has_binding: true,
            });
        };
        let target = self
            .scopes
            .iter()
            .rev()
            .find(|scope| scope.component)
            .unwrap_or(innermost);
        Some(ScopeSite {
            id: target.id,
            body: target.body.clone(),
            has_binding: innermost.has_binding,
        })
    }

    // ---- candidates ----

    fn push(&mut self, found: Found, pos: BytePos) {
        let loc = self.parsed.lookup(pos);
        let attribute = if self.jsx_state.in_attr {
            self.attribute.clone()
        } else {
            None
        };
        let scope = if found.replace.needs_binding() && found.rejection.is_none() {
            self.scope_site()
        } else {
            None
        };
        self.candidates.push(Candidate {
            id: format!(
                "{}#{}@{}-{}",
                self.file_path, found.kind, found.span.start, found.span.end
            ),
            file_path: self.file_path.to_string(),
            kind: found.kind,
            text: found.text,
            position: Position::new(loc.line, char_column(self.source(), self.parsed.offset(pos))),
            context: CandidateContext {
                dialect: Dialect::Markup,
                attribute,
                path_hint: self.path_hint.map(str::to_string),
                raw: found.raw,
                replace: found.replace,
                quote: found.quote,
                span: Some(found.span),
                scope,
                rejection: found.rejection,
            },
        });
    }

    fn reject(&mut self, span: Span, pattern: UnsafePattern) {
        let range = self.parsed.range(span);
        let raw = self.source()[range.clone()].to_string();
        self.push(
            Found {
                kind: CandidateKind::Expression,
                text: collapse_whitespace(&raw),
                raw,
                span: range,
                replace: ReplaceMode::InnerLiteral,
                quote: None,
                rejection: Some(pattern),
            },
            span.lo,
        );
    }

    /// Quoted literal: (range including quotes, quote, inner spelling).
    fn quoted(&self, span: Span) -> (Range<usize>, Option<char>, String) {
        let range = self.parsed.range(span);
        let quoted = &self.source()[range.clone()];
        let quote = quoted.chars().next();
        let raw = quoted
            .get(1..quoted.len().saturating_sub(1))
            .unwrap_or_default()
            .to_string();
        (range, quote, raw)
    }

    fn string_literal(&mut self, s: &Str, kind: CandidateKind, replace: ReplaceMode) {
        let Some(value) = s.value.as_str() else {
            return;
        };
        if !self.options.accepts(value) {
            return;
        }
        let (span, quote, raw) = self.quoted(s.span);
        self.push(
            Found {
                kind,
                text: value.to_string(),
                raw,
                span,
                replace,
                quote,
                rejection: None,
            },
            s.span.lo,
        );
    }

    fn template_literal(&mut self, tpl: &Tpl) {
        let cooked: Vec<&str> = tpl
            .quasis
            .iter()
            .filter_map(|q| q.cooked.as_ref().and_then(|c| c.as_str()))
            .collect();
        if cooked.len() != tpl.quasis.len() || !self.options.accepts(&cooked.concat()) {
            return;
        }
        let span = self.parsed.range(tpl.span);
        let source = self.source();

        if tpl.exprs.is_empty() {
            self.push(
                Found {
                    kind: CandidateKind::Expression,
                    text: cooked.concat(),
                    raw: source[span.start + 1..span.end - 1].to_string(),
                    span,
                    replace: ReplaceMode::InnerLiteral,
                    quote: Some('`'),
                    rejection: None,
                },
                tpl.span.lo,
            );
            return;
        }

        let mut params = ParamSet::default();
        let mut text = String::new();
        for (idx, quasi) in cooked.iter().enumerate() {
            text.push_str(quasi);
            let Some(expr) = tpl.exprs.get(idx) else {
                continue;
            };
            let Some(name) = guard::simple_param_name(expr) else {
                self.reject(tpl.span, UnsafePattern::ComplexInterpolation);
                return;
            };
            let bound = params.bind(&name, &source[self.parsed.range(expr.span())]);
            text.push('{');
            text.push_str(&bound);
            text.push('}');
        }
        self.push(
            Found {
                kind: CandidateKind::Expression,
                text,
                raw: source[span.clone()].to_string(),
                span,
                replace: ReplaceMode::FullWrap {
                    params: params.into_params(),
                },
                quote: None,
                rejection: None,
            },
            tpl.span.lo,
        );
    }

    fn concatenation(&mut self, expr: &Expr) {
        if !guard::has_translatable_literal(expr) {
            return;
        }
        let source = self.source();
        let mut params = ParamSet::default();
        let mut text = String::new();
        for operand in guard::concat_operands(expr) {
            match operand {
                Expr::Lit(Lit::Str(s)) => text.push_str(s.value.as_str().unwrap_or_default()),
                Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
                    for quasi in &tpl.quasis {
                        text.push_str(quasi.cooked.as_ref().and_then(|c| c.as_str()).unwrap_or_default());
                    }
                }
                other => {
                    let Some(name) = guard::simple_param_name(other) else {
                        self.reject(expr.span(), UnsafePattern::ComplexInterpolation);
                        return;
                    };
                    let bound = params.bind(&name, &source[self.parsed.range(other.span())]);
                    text.push('{');
                    text.push_str(&bound);
                    text.push('}');
                }
            }
        }
        if self.options.ignore_texts.contains(text.trim()) {
            return;
        }
        let span = self.parsed.range(expr.span());
        self.push(
            Found {
                kind: CandidateKind::Expression,
                text,
                raw: source[span.clone()].to_string(),
                span,
                replace: ReplaceMode::FullWrap {
                    params: params.into_params(),
                },
                quote: None,
                rejection: None,
            },
            expr.span().lo,
        );
    }

    fn analyze_expr(&mut self, expr: &Expr) {
        let expr = guard::unwrap_parens(expr);
        if let Some(pattern) = guard::check_markup_expr(expr) {
            if guard::has_translatable_literal(expr) {
                self.reject(expr.span(), pattern);
            }
            return;
        }
        match expr {
            Expr::Lit(Lit::Str(s)) => {
                self.string_literal(s, CandidateKind::Expression, ReplaceMode::InnerLiteral)
            }
            Expr::Tpl(tpl) => self.template_literal(tpl),
            Expr::Bin(bin) if bin.op == BinaryOp::Add => self.concatenation(expr),
            Expr::Bin(bin)
                if matches!(
                    bin.op,
                    BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
                ) =>
            {
                self.analyze_expr(&bin.right)
            }
            _ => {}
        }
    }

    fn is_translation_call(&self, node: &CallExpr) -> bool {
        matches!(
            &node.callee,
            Callee::Expr(callee)
                if matches!(&**callee, Expr::Ident(ident) if ident.sym.as_str() == self.options.adapter.call_name)
        )
    }
}

impl<'a> Visit for MarkupScanner<'a> {
    fn visit_module(&mut self, node: &Module) {
        let binding = node.body.iter().any(|item| match item {
            ModuleItem::Stmt(stmt) => self.declares_binding(stmt),
            ModuleItem::ModuleDecl(_) => false,
        });
        self.module_binding = binding;
        node.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.pending_name = Some(node.ident.sym.to_string());
        node.function.visit_with(self);
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        node.name.visit_with(self);
        if let Some(init) = &node.init {
            if let Pat::Ident(binding) = &node.name
                && is_function_like(init)
            {
                self.pending_name = Some(binding.id.sym.to_string());
            }
            init.visit_with(self);
            self.pending_name = None;
        }
    }

    fn visit_export_default_decl(&mut self, node: &ExportDefaultDecl) {
        if matches!(node.decl, DefaultDecl::Fn(_)) {
            self.pending_name = Some("default".to_string());
        }
        node.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, node: &ExportDefaultExpr) {
        if is_function_like(&node.expr) {
            self.pending_name = Some("default".to_string());
        }
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, node: &Function) {
        let params_bind = node.params.iter().any(|p| self.pattern_binds(&p.pat));
        let Some(body) = &node.body else {
            self.pending_name = None;
            node.visit_children_with(self);
            return;
        };
        let scope_body = self.block_body(body);
        self.enter_scope(node.span.lo, scope_body, params_bind, &body.stmts);
        node.visit_children_with(self);
        self.scopes.pop();
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        let params_bind = node.params.iter().any(|p| self.pattern_binds(p));
        match &*node.body {
            BlockStmtOrExpr::BlockStmt(block) => {
                let scope_body = self.block_body(block);
                self.enter_scope(node.span.lo, scope_body, params_bind, &block.stmts);
            }
            BlockStmtOrExpr::Expr(expr) => {
                let scope_body = self.expr_body(node.span.lo, expr);
                self.enter_scope(node.span.lo, scope_body, params_bind, &[]);
            }
        }
        node.visit_children_with(self);
        self.scopes.pop();
    }

    fn visit_jsx_element(&mut self, node: &JSXElement) {
        node.opening.visit_with(self);

        let raw_text_element = matches!(
            &node.opening.name,
            JSXElementName::Ident(ident) if ident.sym == "style" || ident.sym == "script"
        );
        if !raw_text_element {
            let prev_state = self.jsx_state;
            self.jsx_state = prev_state.for_children();
            for child in &node.children {
                child.visit_with(self);
            }
            self.jsx_state = prev_state;
        }

        if let Some(closing) = &node.closing {
            closing.visit_with(self);
        }
    }

    fn visit_jsx_fragment(&mut self, node: &JSXFragment) {
        node.opening.visit_with(self);

        let prev_state = self.jsx_state;
        self.jsx_state = prev_state.for_children();
        for child in &node.children {
            child.visit_with(self);
        }
        self.jsx_state = prev_state;

        node.closing.visit_with(self);
    }

    fn visit_jsx_text(&mut self, node: &JSXText) {
        let range = self.parsed.range(node.span);
        let raw = &self.source()[range.clone()];
        let trimmed = raw.trim();
        let text = decode_entities(&collapse_whitespace(trimmed));
        if !self.options.accepts(&text) {
            return;
        }

        let lead = raw.len() - raw.trim_start().len();
        let start = range.start + lead;
        self.push(
            Found {
                kind: CandidateKind::TextNode,
                text,
                raw: trimmed.to_string(),
                span: start..start + trimmed.len(),
                replace: ReplaceMode::WrapChild,
                quote: None,
                rejection: None,
            },
            node.span.lo + BytePos(lead as u32),
        );
    }

    fn visit_jsx_expr_container(&mut self, node: &JSXExprContainer) {
        let state = self.jsx_state;
        let translatable = if state.in_attr {
            state.allowed_attr
        } else {
            state.in_context
        };
        if translatable && let JSXExpr::Expr(expr) = &node.expr {
            self.analyze_expr(expr);
        }
        node.visit_children_with(self);
    }

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        let name = match &node.name {
            JSXAttrName::Ident(ident) => ident.sym.to_string(),
            JSXAttrName::JSXNamespacedName(ns) => format!("{}:{}", ns.ns.sym, ns.name.sym),
        };
        let allowed = self.options.is_translatable_attribute(&name);

        let prev_state = self.jsx_state;
        let prev_attr = self.attribute.replace(name);
        self.jsx_state.in_attr = true;
        self.jsx_state.allowed_attr = allowed;

        if allowed && let Some(JSXAttrValue::Str(s)) = &node.value {
            self.string_literal(s, CandidateKind::Attribute, ReplaceMode::BindAttribute);
        }
        if let Some(value) = &node.value {
            value.visit_with(self);
        }

        self.jsx_state = prev_state;
        self.attribute = prev_attr;
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        if self.options.scan_translation_calls
            && self.is_translation_call(node)
            && let Some(first) = node.args.first()
            && first.spread.is_none()
            && let Expr::Lit(Lit::Str(s)) = guard::unwrap_parens(&first.expr)
        {
            // Literal arguments are not attribute values even inside one
            let prev_state = self.jsx_state;
            self.jsx_state.in_attr = false;
            self.string_literal(s, CandidateKind::CallArgument, ReplaceMode::SwapArgument);
            self.jsx_state = prev_state;
        }
        node.visit_children_with(self);
    }
}
