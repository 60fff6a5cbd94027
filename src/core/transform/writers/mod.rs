//! Source writers: turn prepared candidates into edits of one file.
//!
//! A writer is picked once per file from [`registry`], first match wins.

pub mod markup;
pub mod template;

use std::path::Path;

use anyhow::Result;
use enum_dispatch::enum_dispatch;

pub use markup::MarkupWriter;
pub use template::TemplateWriter;

use crate::core::candidate::{InterpolationParam, TransformCandidate};
use crate::core::error::SkipReason;
use crate::core::scan::ScanOptions;

pub struct WriteContext<'a> {
    /// Absolute path of the file being rewritten.
    pub file_path: &'a Path,
    pub options: &'a ScanOptions,
}

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRewrite {
    pub content: String,
    /// Batch indices that could not be rewritten.
    pub skipped: Vec<(usize, SkipReason)>,
}

#[enum_dispatch]
pub trait Writer {
    fn can_handle(&self, path: &str) -> bool;

    /// Rewrite `source` for every candidate of the batch. Each candidate's
    /// `suggested_key` is the key it is rewritten to.
    fn apply(
        &self,
        source: &str,
        batch: &[&TransformCandidate],
        ctx: &WriteContext<'_>,
    ) -> Result<FileRewrite>;
}

#[enum_dispatch(Writer)]
#[derive(Debug, Clone)]
pub enum SourceWriter {
    Markup(MarkupWriter),
    Template(TemplateWriter),
}

/// Writers in match order.
pub fn registry() -> Vec<SourceWriter> {
    vec![
        SourceWriter::Template(TemplateWriter),
        SourceWriter::Markup(MarkupWriter),
    ]
}

pub fn writer_for<'a>(writers: &'a [SourceWriter], path: &str) -> Option<&'a SourceWriter> {
    writers.iter().find(|writer| writer.can_handle(path))
}

/// Render a translation call such as `t("key")` or
/// `t("key", { name, count: items.length })`.
pub fn render_call(call: &str, key: &str, quote: char, params: &[InterpolationParam]) -> String {
    if params.is_empty() {
        return format!("{call}({quote}{key}{quote})");
    }
    let values: Vec<String> = params
        .iter()
        .map(|param| {
            if param.name == param.expr {
                param.name.clone()
            } else {
                format!("{}: {}", param.name, param.expr)
            }
        })
        .collect();
    format!("{call}({quote}{key}{quote}, {{ {} }})", values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, expr: &str) -> InterpolationParam {
        InterpolationParam {
            name: name.to_string(),
            expr: expr.to_string(),
        }
    }

    #[test]
    fn test_render_call() {
        assert_eq!(render_call("t", "home.title", '"', &[]), r#"t("home.title")"#);
        assert_eq!(
            render_call("$t", "card.hi", '\'', &[param("name", "user.name"), param("count", "count")]),
            "$t('card.hi', { name: user.name, count })"
        );
    }

    #[test]
    fn test_registry_picks_by_extension() {
        let writers = registry();
        assert!(matches!(
            writer_for(&writers, "src/Card.vue"),
            Some(SourceWriter::Template(_))
        ));
        assert!(matches!(
            writer_for(&writers, "src/App.tsx"),
            Some(SourceWriter::Markup(_))
        ));
        assert!(writer_for(&writers, "styles.css").is_none());
    }
}
