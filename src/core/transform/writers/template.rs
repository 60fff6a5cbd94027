//! Text-offset writer for `<template>` blocks.
//!
//! Candidates are found again through the position reconciler, then every
//! splice is applied in one pass. Template calls need no import or binding.

use std::ops::Range;

use anyhow::Result;

use super::{FileRewrite, WriteContext, Writer, render_call};
use crate::core::candidate::{Dialect, ReplaceMode, TransformCandidate};
use crate::core::error::SkipReason;
use crate::core::reconcile::{PositionHint, reconcile};
use crate::core::scan::dialect_for;
use crate::core::transform::splice::{Edit, apply_edits};

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateWriter;

impl Writer for TemplateWriter {
    fn can_handle(&self, path: &str) -> bool {
        dialect_for(path) == Some(Dialect::Template)
    }

    fn apply(
        &self,
        source: &str,
        batch: &[&TransformCandidate],
        ctx: &WriteContext<'_>,
    ) -> Result<FileRewrite> {
        let call = ctx.options.adapter.template_call_name.as_str();
        let mut edits: Vec<Edit> = Vec::new();
        let mut skipped = Vec::new();

        for (idx, tc) in batch.iter().enumerate() {
            let edit = locate(source, tc).and_then(|range| splice(source, range, tc, call));
            match edit {
                Some(edit) if !edits.iter().any(|e| overlaps(&e.range, &edit.range)) => {
                    edits.push(edit)
                }
                _ => {
                    tracing::debug!(
                        event = "candidate_not_located",
                        id = %tc.candidate.id,
                        text = %tc.candidate.text
                    );
                    skipped.push((idx, SkipReason::NotLocated));
                }
            }
        }

        Ok(FileRewrite {
            content: apply_edits(source, edits)?,
            skipped,
        })
    }
}

fn locate(source: &str, tc: &TransformCandidate) -> Option<Range<usize>> {
    let hint = PositionHint {
        line: tc.candidate.position.line,
        column: tc.candidate.position.column,
    };
    reconcile(source, hint, &tc.candidate.context.raw).map(|found| found.range)
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Widen `range` by the surrounding quote pair, if it is really there.
fn with_quotes(source: &str, range: Range<usize>, quote: char) -> Option<Range<usize>> {
    let width = quote.len_utf8();
    let start = range.start.checked_sub(width)?;
    let opens = source[start..].starts_with(quote);
    let closes = source[range.end..].starts_with(quote);
    (opens && closes).then(|| start..range.end + width)
}

/// Quote for the key inside a call that replaces a literal quoted with `quote`.
fn call_quote(quote: Option<char>) -> char {
    match quote {
        Some('"') => '"',
        _ => '\'',
    }
}

fn splice(source: &str, range: Range<usize>, tc: &TransformCandidate, call: &str) -> Option<Edit> {
    let context = &tc.candidate.context;
    let key = tc.suggested_key.as_str();
    match &context.replace {
        ReplaceMode::WrapChild => Some(Edit::replace(
            range,
            format!("{{{{ {} }}}}", render_call(call, key, '\'', &[])),
        )),
        ReplaceMode::BindAttribute => {
            let name = context.attribute.as_deref()?;
            bind_attribute(source, range, name, context.quote, call, key)
        }
        ReplaceMode::InnerLiteral => {
            let range = with_quotes(source, range, context.quote?)?;
            Some(Edit::replace(range, render_call(call, key, call_quote(context.quote), &[])))
        }
        ReplaceMode::FullWrap { params } => {
            let range = match context.quote {
                Some(quote) => with_quotes(source, range, quote)?,
                None => range,
            };
            Some(Edit::replace(range, render_call(call, key, '\'', params)))
        }
        ReplaceMode::SwapArgument => Some(Edit::replace(range, key.to_string())),
    }
}

/// `alt="Logo"` becomes `:alt="$t('key')"`.
fn bind_attribute(
    source: &str,
    value: Range<usize>,
    name: &str,
    quote: Option<char>,
    call: &str,
    key: &str,
) -> Option<Edit> {
    let (value, quote) = match quote {
        Some(quote) => (with_quotes(source, value, quote)?, quote),
        None => (value, '"'),
    };
    let before = source[..value.start].trim_end().strip_suffix('=')?.trim_end();
    let start = before.strip_suffix(name).map(str::len)?;
    let inner = if quote == '"' { '\'' } else { '"' };
    Some(Edit::replace(
        start..value.end,
        format!(":{name}={quote}{}{quote}", render_call(call, key, inner, &[])),
    ))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::config::Config;
    use crate::core::scan::{ScanOptions, scan_source};
    use pretty_assertions::assert_eq;

    fn candidates(source: &str, config: &Config) -> (ScanOptions, PathBuf, Vec<TransformCandidate>) {
        let options = ScanOptions::from_config(config, Path::new("/project"));
        let file = PathBuf::from("/project/src/Card.vue");
        let found = scan_source(&file, source, &options)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, c)| TransformCandidate::new(c, format!("card.k{i}"), String::new()))
            .collect();
        (options, file, found)
    }

    fn rewrite(scanned: &str, current: &str, config: &Config) -> FileRewrite {
        let (options, file, found) = candidates(scanned, config);
        let batch: Vec<&TransformCandidate> = found.iter().filter(|c| c.candidate.context.rejection.is_none()).collect();
        let ctx = WriteContext {
            file_path: &file,
            options: &options,
        };
        TemplateWriter.apply(current, &batch, &ctx).unwrap()
    }

    #[test]
    fn test_rewrites_every_shape() {
        let source = r#"<template>
  <div>
    <h2>Card title</h2>
    <img alt="Company logo">
    <button :title="'Close dialog'">{{ "Close" }}</button>
    <p>{{ `Signed in as ${user.name}` }}</p>
  </div>
</template>
"#;
        let result = rewrite(source, source, &Config::default());
        assert!(result.skipped.is_empty());
        assert_eq!(
            result.content,
            r#"<template>
  <div>
    <h2>{{ $t('card.k0') }}</h2>
    <img :alt="$t('card.k1')">
    <button :title="$t('card.k2')">{{ $t("card.k3") }}</button>
    <p>{{ $t('card.k4', { name: user.name }) }}</p>
  </div>
</template>
"#
        );
    }

    #[test]
    fn test_reformatted_buffer_is_reconciled() {
        let scanned = "<template>\n  <p>Hello there</p>\n</template>\n";
        let current = "<template>\n\n  <section>\n    <p>Hello there</p>\n  </section>\n</template>\n";
        let result = rewrite(scanned, current, &Config::default());
        assert!(result.skipped.is_empty());
        assert!(result.content.contains("<p>{{ $t('card.k0') }}</p>"));
    }

    #[test]
    fn test_vanished_text_is_not_located() {
        let scanned = "<template>\n  <p>Hello there</p>\n</template>\n";
        let current = "<template>\n  <p>Goodbye</p>\n</template>\n";
        let result = rewrite(scanned, current, &Config::default());
        assert_eq!(result.skipped, vec![(0, SkipReason::NotLocated)]);
        assert_eq!(result.content, current);
    }

    #[test]
    fn test_migration_swaps_call_argument() {
        let config = Config {
            migrate_legacy_keys: true,
            ..Default::default()
        };
        let source = "<template>\n  <p>{{ $t('Welcome back') }}</p>\n</template>\n";
        let result = rewrite(source, source, &config);
        assert_eq!(
            result.content,
            "<template>\n  <p>{{ $t('card.k0') }}</p>\n</template>\n"
        );
    }
}
