//! Span-edit writer for JSX/TSX files.
//!
//! The file is parsed again and every candidate is located by id, so a file
//! that changed since the scan never receives stale edits.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use swc_common::Spanned;
use swc_ecma_ast::{Expr, ImportSpecifier, Lit, ModuleDecl, ModuleItem, Stmt};

use super::{FileRewrite, WriteContext, Writer, render_call};
use crate::core::adapter::{binding_statement, import_statement, is_translation_module};
use crate::core::candidate::{
    Candidate, Dialect, ReplaceMode, ScopeBody, ScopeSite, TransformCandidate,
};
use crate::core::error::SkipReason;
use crate::core::parsers::jsx::{ParsedJSX, parse_jsx};
use crate::core::scan::{dialect_for, markup::MarkupScanner, path_hint};
use crate::core::transform::splice::{Edit, apply_edits, fold_into};
use crate::utils::relative_path;

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupWriter;

impl Writer for MarkupWriter {
    fn can_handle(&self, path: &str) -> bool {
        dialect_for(path) == Some(Dialect::Markup)
    }

    fn apply(
        &self,
        source: &str,
        batch: &[&TransformCandidate],
        ctx: &WriteContext<'_>,
    ) -> Result<FileRewrite> {
        let display = relative_path(&ctx.options.root, ctx.file_path);
        let parsed = parse_jsx(source, &display)?;
        let hint = path_hint(ctx.options, ctx.file_path);
        let fresh: HashMap<String, Candidate> =
            MarkupScanner::new(&parsed, &display, hint.as_deref(), ctx.options)
                .collect()
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect();

        let call = ctx.options.adapter.call_name.as_str();
        let mut edits = Vec::new();
        let mut skipped = Vec::new();
        // Scopes that need a binding, by id.
        let mut bindings: BTreeMap<usize, ScopeSite> = BTreeMap::new();

        for (idx, tc) in batch.iter().enumerate() {
            let Some(current) = fresh.get(&tc.candidate.id) else {
                skipped.push((idx, SkipReason::NotLocated));
                continue;
            };
            let Some(span) = current.context.span.clone() else {
                skipped.push((idx, SkipReason::NotLocated));
                continue;
            };
            let replace = &current.context.replace;
            if replace.needs_binding() {
                match &current.context.scope {
                    Some(scope) if scope.has_binding => {}
                    Some(scope) => {
                        bindings.entry(scope.id).or_insert_with(|| scope.clone());
                    }
                    None => {
                        skipped.push((idx, SkipReason::NoEnclosingScope));
                        continue;
                    }
                }
            }
            edits.push(Edit::replace(
                span,
                replacement(replace, call, &tc.suggested_key, current.context.quote),
            ));
        }

        if !bindings.is_empty() {
            insert_bindings(source, &mut edits, bindings.into_values(), ctx)?;
            if !has_hook_import(&parsed, ctx) {
                edits.push(Edit::insert(
                    import_offset(&parsed),
                    import_text(&parsed, &import_statement(&ctx.options.adapter)),
                ));
            }
        }

        Ok(FileRewrite {
            content: apply_edits(source, edits)?,
            skipped,
        })
    }
}

fn replacement(replace: &ReplaceMode, call: &str, key: &str, quote: Option<char>) -> String {
    match replace {
        ReplaceMode::WrapChild | ReplaceMode::BindAttribute => {
            format!("{{{}}}", render_call(call, key, '"', &[]))
        }
        ReplaceMode::InnerLiteral => render_call(call, key, '"', &[]),
        ReplaceMode::FullWrap { params } => render_call(call, key, '"', params),
        ReplaceMode::SwapArgument => {
            let quote = quote.unwrap_or('"');
            format!("{quote}{key}{quote}")
        }
    }
}

/// Add the hook binding to each scope. Concise arrow bodies are turned into
/// blocks, innermost first, with the edits inside them folded in.
fn insert_bindings(
    source: &str,
    edits: &mut Vec<Edit>,
    scopes: impl Iterator<Item = ScopeSite>,
    ctx: &WriteContext<'_>,
) -> Result<()> {
    let statement = binding_statement(&ctx.options.adapter);
    let mut concise = Vec::new();
    for scope in scopes {
        match scope.body {
            ScopeBody::Block { insert_at, indent } => {
                edits.push(Edit::insert(insert_at, format!("\n{indent}{statement}")));
            }
            ScopeBody::Expr {
                range,
                indent,
                base_indent,
            } => concise.push((range, indent, base_indent)),
            ScopeBody::Module => {}
        }
    }

    concise.sort_by_key(|(range, ..)| range.len());
    for (range, indent, base_indent) in concise {
        fold_into(source, edits, range, |body| {
            format!("{{\n{indent}{statement}\n{indent}return {body};\n{base_indent}}}")
        })?;
    }
    Ok(())
}

fn has_hook_import(parsed: &ParsedJSX, ctx: &WriteContext<'_>) -> bool {
    let adapter = &ctx.options.adapter;
    parsed.module.body.iter().any(|item| {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
            return false;
        };
        let Some(src) = import.src.value.as_str() else {
            return false;
        };
        is_translation_module(src, adapter)
            && import.specifiers.iter().any(|spec| match spec {
                ImportSpecifier::Named(named) => named.local.sym.as_str() == adapter.hook_name,
                ImportSpecifier::Default(default) => default.local.sym.as_str() == adapter.hook_name,
                ImportSpecifier::Namespace(_) => false,
            })
    })
}

/// Where the import goes: after the last import, else after the leading
/// directives (`"use client"`), else at the top.
fn import_offset(parsed: &ParsedJSX) -> usize {
    let last_import = parsed
        .module
        .body
        .iter()
        .filter(|item| matches!(item, ModuleItem::ModuleDecl(ModuleDecl::Import(_))))
        .last();
    if let Some(import) = last_import {
        return parsed.offset(import.span().hi);
    }
    parsed
        .module
        .body
        .iter()
        .take_while(|item| is_directive(item))
        .last()
        .map_or(0, |directive| parsed.offset(directive.span().hi))
}

fn import_text(parsed: &ParsedJSX, statement: &str) -> String {
    if import_offset(parsed) == 0 {
        format!("{statement}\n")
    } else {
        format!("\n{statement}")
    }
}

fn is_directive(item: &ModuleItem) -> bool {
    matches!(
        item,
        ModuleItem::Stmt(Stmt::Expr(stmt)) if matches!(&*stmt.expr, Expr::Lit(Lit::Str(_)))
    )
}
