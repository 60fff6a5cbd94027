//! Source file discovery under the configured include roots.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use walkdir::WalkDir;

use crate::config::TEST_FILE_PATTERNS;

/// Patterns without `*` or `?` are literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

#[derive(Debug, Default)]
pub struct FileScan {
    /// Absolute paths, sorted and deduplicated.
    pub files: Vec<String>,
    /// Entries that could not be read while walking.
    pub skipped_count: usize,
}

/// Ignore rules split into literal path prefixes and glob patterns.
struct IgnoreRules {
    prefixes: Vec<PathBuf>,
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    fn new(base_dir: &Path, ignores: &[String], ignore_test_files: bool) -> Self {
        let mut prefixes = Vec::new();
        let mut patterns = Vec::new();
        for raw in ignores {
            if !is_glob_pattern(raw) {
                prefixes.push(base_dir.join(raw));
                continue;
            }
            match Pattern::new(raw) {
                Ok(pattern) => patterns.push(pattern),
                Err(err) => tracing::warn!(pattern = %raw, error = %err, "invalid ignore pattern"),
            }
        }
        if ignore_test_files {
            patterns.extend(TEST_FILE_PATTERNS.iter().filter_map(|p| Pattern::new(p).ok()));
        }
        Self { prefixes, patterns }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
            || self.patterns.iter().any(|p| p.matches(&path_str))
    }
}

fn include_roots(base_dir: &Path, includes: &[String]) -> Vec<PathBuf> {
    if includes.is_empty() {
        return vec![base_dir.to_path_buf()];
    }
    let mut roots = Vec::new();
    for include in includes {
        let joined = base_dir.join(include);
        if !is_glob_pattern(include) {
            if joined.exists() {
                roots.push(joined);
            } else {
                tracing::debug!(path = %joined.display(), "include path does not exist");
            }
            continue;
        }
        match glob(&joined.to_string_lossy()) {
            Ok(entries) => roots.extend(entries.flatten().filter(|entry| entry.is_dir())),
            Err(err) => tracing::warn!(pattern = %include, error = %err, "invalid include pattern"),
        }
    }
    roots
}

pub fn scan_files(
    base_dir: &Path,
    includes: &[String],
    ignores: &[String],
    ignore_test_files: bool,
) -> FileScan {
    let rules = IgnoreRules::new(base_dir, ignores, ignore_test_files);
    let mut files = BTreeSet::new();
    let mut skipped_count = 0;

    for root in include_roots(base_dir, includes) {
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !rules.is_ignored(entry.path()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skipped_count += 1;
                    tracing::warn!(error = %err, "cannot access path");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && is_scannable_file(path) {
                files.insert(path.to_string_lossy().into_owned());
            }
        }
    }

    tracing::debug!(event = "files_discovered", count = files.len(), skipped = skipped_count);
    FileScan {
        files: files.into_iter().collect(),
        skipped_count,
    }
}

fn is_scannable_file(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if name.ends_with(".d.ts") {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "ts" | "jsx" | "js" | "mts" | "mjs" | "vue")
    )
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn names(scan: &FileScan, root: &Path) -> Vec<String> {
        scan.files
            .iter()
            .map(|f| crate::utils::relative_path(root, Path::new(f)))
            .collect()
    }

    #[test]
    fn test_scan_source_and_template_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "app.tsx");
        touch(dir.path(), "Card.vue");
        touch(dir.path(), "types.d.ts");
        touch(dir.path(), "style.css");

        let scan = scan_files(dir.path(), &[], &[], false);
        assert_eq!(names(&scan, dir.path()), vec!["Card.vue", "app.tsx"]);
    }

    #[test]
    fn test_scan_with_includes_and_dedup() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/components/Button.tsx");
        touch(dir.path(), "lib/utils.ts");

        let scan = scan_files(
            dir.path(),
            &["src".to_owned(), "src/components".to_owned(), "missing".to_owned()],
            &[],
            false,
        );
        assert_eq!(names(&scan, dir.path()), vec!["src/components/Button.tsx"]);
    }

    #[test]
    fn test_scan_with_glob_include() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/app/page.tsx");
        touch(dir.path(), "src/components/Button.tsx");
        touch(dir.path(), "lib/utils.ts");

        let scan = scan_files(dir.path(), &["src/*".to_owned()], &[], false);
        assert_eq!(
            names(&scan, dir.path()),
            vec!["src/app/page.tsx", "src/components/Button.tsx"]
        );
    }

    #[test]
    fn test_literal_bracket_paths() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "app/[locale]/page.tsx");
        touch(dir.path(), "app/[locale]/admin/page.tsx");
        touch(dir.path(), "app/other/other.tsx");

        let scan = scan_files(
            dir.path(),
            &["app/[locale]".to_owned()],
            &["app/[locale]/admin".to_owned()],
            false,
        );
        assert_eq!(names(&scan, dir.path()), vec!["app/[locale]/page.tsx"]);
    }

    #[test]
    fn test_ignores_globs_and_test_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/Button.tsx");
        touch(dir.path(), "src/Button.stories.tsx");
        touch(dir.path(), "src/Button.test.tsx");
        touch(dir.path(), "src/__tests__/helper.ts");
        touch(dir.path(), "node_modules/lib/index.js");

        let scan = scan_files(
            dir.path(),
            &[],
            &["**/*.stories.tsx".to_owned(), "**/node_modules/**".to_owned()],
            true,
        );
        assert_eq!(names(&scan, dir.path()), vec!["src/Button.tsx"]);

        let scan = scan_files(dir.path(), &["src".to_owned()], &[], false);
        assert_eq!(scan.files.len(), 4);
    }

    #[test]
    fn test_is_glob_pattern() {
        assert!(is_glob_pattern("src/*"));
        assert!(is_glob_pattern("file?.ts"));
        assert!(!is_glob_pattern("app/[locale]"));
    }
}
