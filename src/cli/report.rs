//! Report formatting and printing utilities.
//!
//! Skipped candidates are shown in cargo style; diffs and summaries follow.
//! Kept apart from the core so keysmith can be used as a library.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::commands::{CommandResult, CommandSummary, ExtractSummary, InitSummary, ReshapeSummary};
use crate::config::CONFIG_FILE_NAME;
use crate::core::candidate::{CandidateStatus, Position, TransformCandidate};
use crate::core::locale::Shape;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

pub fn print(result: &CommandResult, verbose: bool) {
    if result.json {
        print_json(result);
        return;
    }
    let mut out = io::stdout().lock();
    match &result.summary {
        CommandSummary::Extract(summary) => print_extract(summary, verbose, &mut out),
        CommandSummary::Reshape(summary) => print_reshape(summary, &mut out),
        CommandSummary::Init(summary) => print_init(summary),
    }
}

fn print_json(result: &CommandResult) {
    let CommandSummary::Extract(summary) = &result.summary else {
        return;
    };
    match serde_json::to_string_pretty(&summary.summary) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Error: {}", err),
    }
}

// ============================================================
// extract
// ============================================================

pub fn print_extract<W: Write>(extract: &ExtractSummary, verbose: bool, writer: &mut W) {
    let summary = &extract.summary;
    let skipped: Vec<&TransformCandidate> = summary
        .candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Skipped)
        .collect();

    if !skipped.is_empty() {
        print_skipped(&skipped, &extract.root, writer);
    }

    if !summary.write || verbose {
        for entry in &summary.source_diffs {
            print_diff(&entry.diff, writer);
        }
        for entry in &summary.diffs {
            print_diff(&entry.diff, writer);
        }
    }

    print_extract_summary(extract, writer);
    print_skipped_files(extract, verbose);
}

fn print_skipped<W: Write>(skipped: &[&TransformCandidate], root: &Path, writer: &mut W) {
    let max_line_width = skipped
        .iter()
        .map(|c| c.candidate.position.line)
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1);
    let mut sources: HashMap<&str, Option<String>> = HashMap::new();

    for tc in skipped {
        let candidate = &tc.candidate;
        let Position { line, column } = candidate.position;
        let reason = tc
            .reason
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let _ = writeln!(
            writer,
            "{}: \"{}\"  {}",
            "warning".bold().yellow(),
            candidate.text,
            reason.dimmed().cyan()
        );
        let _ = writeln!(
            writer,
            "  {} {}:{}:{}",
            "-->".blue(),
            candidate.file_path,
            line,
            column
        );

        let source = sources
            .entry(candidate.file_path.as_str())
            .or_insert_with(|| fs::read_to_string(root.join(&candidate.file_path)).ok());
        if let Some(source_line) = source
            .as_deref()
            .and_then(|s| s.lines().nth(line.saturating_sub(1)))
        {
            let _ = writeln!(writer, "{:>width$} {}", "", "|".blue(), width = max_line_width);
            let _ = writeln!(
                writer,
                "{:>width$} {} {}",
                line.to_string().blue(),
                "|".blue(),
                source_line,
                width = max_line_width
            );
            let prefix: String = source_line.chars().take(column.saturating_sub(1)).collect();
            let caret_padding = UnicodeWidthStr::width(prefix.as_str());
            let _ = writeln!(
                writer,
                "{:>width$} {} {:>padding$}{}",
                "",
                "|".blue(),
                "",
                "^".yellow(),
                width = max_line_width,
                padding = caret_padding
            );
        }
        let _ = writeln!(writer);
    }
}

fn print_diff<W: Write>(diff: &str, writer: &mut W) {
    for line in diff.lines() {
        let colored = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        let _ = writeln!(writer, "{}", colored);
    }
    let _ = writeln!(writer);
}

fn print_extract_summary<W: Write>(extract: &ExtractSummary, writer: &mut W) {
    let summary = &extract.summary;
    let stats = &summary.candidate_stats;
    let rewritten = stats.applied + stats.duplicate;
    let files = summary.files_changed.len();
    let locales = summary.locale_stats.len();

    if rewritten == 0 && locales == 0 {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Scanned {} source {} - nothing to extract",
                summary.files_scanned,
                plural(summary.files_scanned, "file", "files")
            )
            .green()
        );
    } else if summary.write {
        let _ = writeln!(
            writer,
            "{} {} {} text(s) in {} {}, updated {} locale {}",
            SUCCESS_MARK.green(),
            "Extracted".green().bold(),
            rewritten,
            files,
            plural(files, "file", "files"),
            locales,
            plural(locales, "file", "files")
        );
    } else {
        let _ = writeln!(
            writer,
            "{} {} text(s) in {} {}, {} locale {}",
            "Would extract".yellow().bold(),
            rewritten,
            files,
            plural(files, "file", "files"),
            locales,
            plural(locales, "file", "files")
        );
        let _ = writeln!(writer, "Run with {} to apply these changes.", "--apply".cyan());
    }

    if stats.existing > 0 {
        let _ = writeln!(writer, "  - existing: {} already translated", stats.existing);
    }
    if stats.duplicate > 0 {
        let _ = writeln!(writer, "  - duplicate: {} reuse an earlier key", stats.duplicate);
    }
    if stats.skipped > 0 {
        let reasons: Vec<String> = summary
            .skipped_reasons
            .iter()
            .map(|(reason, count)| format!("{} {}", count, reason))
            .collect();
        let _ = writeln!(
            writer,
            "  - {}: {} ({})",
            "skipped".yellow(),
            stats.skipped,
            reasons.join(", ")
        );
    }
}

fn print_skipped_files(extract: &ExtractSummary, verbose: bool) {
    let skipped = &extract.summary.skipped_files;
    if skipped.is_empty() {
        return;
    }
    let mut err = io::stderr().lock();
    if verbose {
        for file in skipped {
            let _ = writeln!(err, "{} {}: {}", "warning:".bold().yellow(), file.path, file.reason);
        }
    } else {
        let _ = writeln!(
            err,
            "{} {} file(s) could not be processed (use {} for details)",
            "warning:".bold().yellow(),
            skipped.len(),
            "-v".cyan()
        );
    }
}

// ============================================================
// reshape / init
// ============================================================

fn print_reshape<W: Write>(summary: &ReshapeSummary, writer: &mut W) {
    let shape = match summary.shape {
        Shape::Flat => "flat",
        Shape::Nested => "nested",
    };
    if summary.stats.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "{} locale {} already {}",
                summary.locale_count,
                plural(summary.locale_count, "file", "files"),
                shape
            )
            .green()
        );
        return;
    }
    for stats in &summary.stats {
        let _ = writeln!(writer, "  {} ({} keys)", stats.path, stats.total_keys);
    }
    let _ = writeln!(
        writer,
        "{} {} {} locale {} to {}",
        SUCCESS_MARK.green(),
        "Rewrote".green().bold(),
        summary.stats.len(),
        plural(summary.stats.len(), "file", "files"),
        shape
    );
}

fn print_init(summary: &InitSummary) {
    if summary.created {
        println!("{} Created {}", SUCCESS_MARK.green(), CONFIG_FILE_NAME);
    } else {
        println!("{} {} already exists", FAILURE_MARK.red(), CONFIG_FILE_NAME);
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
