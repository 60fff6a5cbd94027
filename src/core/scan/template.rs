//! `<template>` block scanner for single-file components.
//!
//! Candidates carry only the (line, column) where the literal started and
//! its raw spelling; the writer finds them again with the reconciler.

use anyhow::Result;

use super::ScanOptions;
use super::guard::{TemplateFinding, analyze_template_expr};
use crate::core::candidate::{
    Candidate, CandidateContext, CandidateKind, Dialect, Position, ReplaceMode,
};
use crate::core::error::UnsafePattern;
use crate::core::parsers::template::{TemplateNode, parse_template};
use crate::utils::{collapse_whitespace, decode_entities, line_starts, offset_to_line_col};

/// Attribute names that hold expressions rather than text.
fn is_directive(name: &str) -> bool {
    name.starts_with("v-") || name.starts_with('@') || name.starts_with('#')
}

/// Bound attribute name: `:title` and `v-bind:title` give `title`.
fn bound_name(name: &str) -> Option<&str> {
    name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:"))
}

struct TemplateScanner<'a> {
    source: &'a str,
    starts: Vec<usize>,
    file_path: &'a str,
    path_hint: Option<&'a str>,
    options: &'a ScanOptions,
    candidates: Vec<Candidate>,
}

struct Found {
    kind: CandidateKind,
    text: String,
    offset: usize,
    raw: String,
    replace: ReplaceMode,
    quote: Option<char>,
    attribute: Option<String>,
    rejection: Option<UnsafePattern>,
}

pub fn scan(
    source: &str,
    file_path: &str,
    path_hint: Option<&str>,
    options: &ScanOptions,
) -> Result<Vec<Candidate>> {
    let nodes = parse_template(source)?;
    let mut scanner = TemplateScanner {
        source,
        starts: line_starts(source),
        file_path,
        path_hint,
        options,
        candidates: Vec::new(),
    };
    for node in nodes {
        scanner.node(node);
    }
    Ok(scanner.candidates)
}

impl<'a> TemplateScanner<'a> {
    fn push(&mut self, found: Found) {
        let (line, column) = offset_to_line_col(self.source, &self.starts, found.offset);
        self.candidates.push(Candidate {
            id: format!("{}#{}@{}:{}", self.file_path, found.kind, line, column),
            file_path: self.file_path.to_string(),
            kind: found.kind,
            text: found.text,
            position: Position::new(line, column),
            context: CandidateContext {
                dialect: Dialect::Template,
                attribute: found.attribute,
                path_hint: self.path_hint.map(str::to_string),
                raw: found.raw,
                replace: found.replace,
                quote: found.quote,
                span: None,
                scope: None,
                rejection: found.rejection,
            },
        });
    }

    fn node(&mut self, node: TemplateNode) {
        match node {
            TemplateNode::Text { raw, offset } => {
                let trimmed = raw.trim();
                let text = decode_entities(&collapse_whitespace(trimmed));
                if !self.options.accepts(&text) {
                    return;
                }
                let lead = raw.len() - raw.trim_start().len();
                self.push(Found {
                    kind: CandidateKind::TextNode,
                    text,
                    offset: offset + lead,
                    raw: trimmed.to_string(),
                    replace: ReplaceMode::WrapChild,
                    quote: None,
                    attribute: None,
                    rejection: None,
                });
            }
            TemplateNode::Interpolation { expr, offset } => self.expression(&expr, offset, None, true),
            TemplateNode::Attribute {
                name,
                value,
                quote,
                offset,
                ..
            } => {
                if let Some(bound) = bound_name(&name) {
                    let allowed = self.options.is_translatable_attribute(bound);
                    self.expression(&value, offset, Some(bound.to_string()), allowed);
                } else if is_directive(&name) {
                    self.expression(&value, offset, None, false);
                } else if self.options.is_translatable_attribute(&name) {
                    let text = decode_entities(&value);
                    if self.options.accepts(&text) {
                        self.push(Found {
                            kind: CandidateKind::Attribute,
                            text,
                            offset,
                            raw: value,
                            replace: ReplaceMode::BindAttribute,
                            quote,
                            attribute: Some(name),
                            rejection: None,
                        });
                    }
                }
            }
        }
    }

    /// Findings of one expression. `translatable` is false for directives and
    /// non-allow-listed bindings, where only translation-call arguments count.
    fn expression(&mut self, expr: &str, offset: usize, attribute: Option<String>, translatable: bool) {
        let adapter = &self.options.adapter;
        let calls = [adapter.template_call_name.as_str(), adapter.call_name.as_str()];
        let findings = analyze_template_expr(expr, &calls, self.options.scan_translation_calls);

        for finding in findings {
            let found = match finding {
                TemplateFinding::CallArgument { value, quote, range } => Found {
                    kind: CandidateKind::CallArgument,
                    text: value,
                    offset: offset + range.start,
                    raw: expr[range].to_string(),
                    replace: ReplaceMode::SwapArgument,
                    quote: Some(quote),
                    attribute: None,
                    rejection: None,
                },
                _ if !translatable => continue,
                TemplateFinding::Literal { value, quote, range } => {
                    if !self.options.accepts(&value) {
                        continue;
                    }
                    Found {
                        kind: CandidateKind::Expression,
                        text: value,
                        offset: offset + range.start,
                        raw: expr[range].to_string(),
                        replace: ReplaceMode::InnerLiteral,
                        quote: Some(quote),
                        attribute: attribute.clone(),
                        rejection: None,
                    }
                }
                TemplateFinding::Interpolated {
                    text,
                    params,
                    range,
                    quote,
                } => {
                    if self.options.ignore_texts.contains(text.trim()) {
                        continue;
                    }
                    Found {
                        kind: CandidateKind::Expression,
                        text,
                        offset: offset + range.start,
                        raw: expr[range].to_string(),
                        replace: ReplaceMode::FullWrap { params },
                        quote,
                        attribute: attribute.clone(),
                        rejection: None,
                    }
                }
                TemplateFinding::Rejected { pattern, range } => Found {
                    kind: CandidateKind::Expression,
                    text: collapse_whitespace(&expr[range.clone()]),
                    offset: offset + range.start,
                    raw: expr[range].to_string(),
                    replace: ReplaceMode::InnerLiteral,
                    quote: None,
                    attribute: attribute.clone(),
                    rejection: Some(pattern),
                },
            };
            self.push(found);
        }
    }
}
