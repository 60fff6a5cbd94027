//! Scanner: find hardcoded user-facing literals in source files.
//!
//! Each file is scanned independently (in parallel) by the scanner for its
//! dialect. Results are ordered by file path, then by position.

pub mod guard;
pub mod markup;
pub mod template;

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{Config, TranslationAdapter};
use crate::core::candidate::{Candidate, Dialect};
use crate::utils::relative_path;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Project root; file paths in candidates are relative to it.
    pub root: PathBuf,
    /// Base for path hints fed to key generation.
    pub source_root: PathBuf,
    pub translatable_attributes: Vec<String>,
    pub ignore_texts: HashSet<String>,
    pub adapter: TranslationAdapter,
    /// Report literal arguments of existing translation calls.
    pub scan_translation_calls: bool,
}

impl ScanOptions {
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            source_root: root.join(&config.source_root),
            translatable_attributes: config.translatable_attributes.clone(),
            ignore_texts: config.ignore_texts.iter().cloned().collect(),
            adapter: config.translation_adapter.clone(),
            scan_translation_calls: config.scan_translation_calls && config.migrate_legacy_keys,
        }
    }

    pub fn is_translatable_attribute(&self, name: &str) -> bool {
        self.translatable_attributes.iter().any(|a| a == name)
    }

    /// Text worth extracting: has letters and is not explicitly ignored.
    pub fn accepts(&self, text: &str) -> bool {
        let trimmed = text.trim();
        crate::utils::contains_alphabetic(trimmed) && !self.ignore_texts.contains(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanError {
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub files_scanned: usize,
    pub candidates: Vec<Candidate>,
    pub errors: Vec<ScanError>,
}

pub fn dialect_for(path: &str) -> Option<Dialect> {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("vue") => Some(Dialect::Template),
        Some("tsx" | "ts" | "jsx" | "js" | "mts" | "mjs") => Some(Dialect::Markup),
        _ => None,
    }
}

/// Relative path (without extension) used as the key scope hint.
pub fn path_hint(options: &ScanOptions, path: &Path) -> Option<String> {
    let relative = relative_path(&options.source_root, path);
    let hint = match relative.rfind('.') {
        Some(dot) if dot > relative.rfind('/').map_or(0, |s| s + 1) => &relative[..dot],
        _ => relative.as_str(),
    };
    (!hint.is_empty()).then(|| hint.to_string())
}

/// Scan one file's content. `file_path` is the absolute path.
pub fn scan_source(file_path: &Path, source: &str, options: &ScanOptions) -> Result<Vec<Candidate>> {
    let display = relative_path(&options.root, file_path);
    let hint = path_hint(options, file_path);
    let mut candidates = match dialect_for(&display) {
        Some(Dialect::Markup) => markup::scan(source, &display, hint.as_deref(), options)?,
        Some(Dialect::Template) => template::scan(source, &display, hint.as_deref(), options)?,
        None => Vec::new(),
    };
    candidates.sort_by_key(|c| c.position);
    Ok(candidates)
}

pub fn scan_file(file_path: &Path, options: &ScanOptions) -> Result<Vec<Candidate>> {
    let source = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;
    scan_source(file_path, &source, options)
}

/// Scan every file; unreadable or unparsable files are reported, not fatal.
pub fn scan(files: &[String], options: &ScanOptions) -> ScanResult {
    let outcomes: Vec<(String, Result<Vec<Candidate>>)> = files
        .par_iter()
        .map(|file| {
            let path = Path::new(file);
            (relative_path(&options.root, path), scan_file(path, options))
        })
        .collect();

    let mut result = ScanResult {
        files_scanned: files.len(),
        ..Default::default()
    };
    let mut outcomes = outcomes;
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    for (file_path, outcome) in outcomes {
        match outcome {
            Ok(candidates) => result.candidates.extend(candidates),
            Err(err) => {
                tracing::warn!(file = %file_path, error = %err, "scan failed");
                result.errors.push(ScanError {
                    file_path,
                    message: format!("{:#}", err),
                });
            }
        }
    }
    tracing::debug!(
        event = "scan_completed",
        files = result.files_scanned,
        candidates = result.candidates.len(),
        errors = result.errors.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use crate::core::candidate::CandidateKind;

    #[test]
    fn test_dialect_for() {
        assert_eq!(dialect_for("a/App.tsx"), Some(Dialect::Markup));
        assert_eq!(dialect_for("a/Card.vue"), Some(Dialect::Template));
        assert_eq!(dialect_for("a/data.json"), None);
    }

    #[test]
    fn test_path_hint_strips_extension() {
        let options = ScanOptions::from_config(&Config::default(), Path::new("/p"));
        assert_eq!(
            path_hint(&options, Path::new("/p/src/components/LoginForm.tsx")).as_deref(),
            Some("src/components/LoginForm")
        );
        assert_eq!(
            path_hint(&options, Path::new("/p/app/[locale]/page.tsx")).as_deref(),
            Some("app/[locale]/page")
        );
    }

    #[test]
    fn test_scan_orders_by_file_and_reports_errors() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.tsx"), "export const B = () => <p>Bee</p>;\n").unwrap();
        fs::write(root.join("a.tsx"), "export const A = () => <p>Ay</p>;\n").unwrap();
        fs::write(root.join("broken.tsx"), "export const = ;\n").unwrap();
        let options = ScanOptions::from_config(&Config::default(), root);

        let files: Vec<String> = ["b.tsx", "broken.tsx", "a.tsx"]
            .iter()
            .map(|f| root.join(f).to_string_lossy().into_owned())
            .collect();
        let result = scan(&files, &options);

        assert_eq!(result.files_scanned, 3);
        let seen: Vec<(&str, &str)> = result
            .candidates
            .iter()
            .map(|c| (c.file_path.as_str(), c.text.as_str()))
            .collect();
        assert_eq!(seen, vec![("a.tsx", "Ay"), ("b.tsx", "Bee")]);
        assert!(result.candidates.iter().all(|c| c.kind == CandidateKind::TextNode));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file_path, "broken.tsx");
    }
}
