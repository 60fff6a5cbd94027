//! Deterministic key generation from literal text and its location.
//!
//! A key is `[namespace] <delim> scope <delim> slug[_hash]`. The scope comes
//! from the path hint (or the file stem; `index`/`page`-like files use their
//! parent directory), the slug from the first words of the text. The content
//! hash covers namespace, scope and normalized text, so the same text in the
//! same scope always hashes the same regardless of kind or position.

use std::{path::Path, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use super::candidate::CandidateKind;
use super::error::Collision;
use crate::config::KeyGeneration;
use crate::utils::collapse_whitespace;

/// File stems that say nothing about the component; the parent directory is used instead.
const GENERIC_STEMS: &[&str] = &["index", "page", "layout", "route", "template", "default"];

/// Hash length used when the slug carries no readable words.
const FALLBACK_HASH_LENGTH: usize = 8;

const FALLBACK_SLUG: &str = "text";

/// Longest key segment that still reads as a key.
const MAX_SEGMENT_LEN: usize = 60;
/// Most underscore-separated words a single segment may have.
const MAX_SEGMENT_WORDS: usize = 8;

static KEY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    pub file_path: &'a str,
    pub kind: CandidateKind,
    pub path_hint: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKey {
    pub key: String,
    pub content_hash: String,
}

#[derive(Debug, Clone)]
pub struct KeyGenerator {
    namespace: String,
    hash_length: usize,
    max_words: usize,
    delimiter: String,
}

impl KeyGenerator {
    pub fn new(settings: &KeyGeneration, delimiter: &str) -> Self {
        Self {
            namespace: settings.namespace.clone(),
            hash_length: settings.hash_length,
            max_words: settings.max_words.max(1),
            delimiter: delimiter.to_string(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn generate(&self, text: &str, ctx: &KeyContext<'_>) -> GeneratedKey {
        let normalized = collapse_whitespace(text);
        let scope = self.scope_for(ctx);
        let content_hash = content_hash(&self.namespace, &scope, &normalized);

        let slug = slugify(&normalized, self.max_words);
        let (slug, hash_length) = if slug.is_empty() {
            (
                FALLBACK_SLUG.to_string(),
                self.hash_length.max(FALLBACK_HASH_LENGTH),
            )
        } else {
            (slug, self.hash_length)
        };
        let leaf = if hash_length > 0 {
            format!("{}_{}", slug, &content_hash[..hash_length.min(content_hash.len())])
        } else {
            slug
        };

        let mut segments = Vec::with_capacity(3);
        if !self.namespace.is_empty() {
            segments.push(self.namespace.clone());
        }
        if !scope.is_empty() {
            segments.push(scope);
        }
        segments.push(leaf);

        GeneratedKey {
            key: segments.join(&self.delimiter),
            content_hash,
        }
    }

    /// Scope segment for a candidate location.
    pub fn scope_for(&self, ctx: &KeyContext<'_>) -> String {
        let source = ctx.path_hint.unwrap_or(ctx.file_path);
        let path = Path::new(source);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        // `Button.stories` style double extensions
        let stem = stem.split('.').next().unwrap_or_default().to_string();

        let name = if stem.is_empty() || GENERIC_STEMS.contains(&stem.to_lowercase().as_str()) {
            path.parent()
                .into_iter()
                .flat_map(|p| p.components().rev())
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .find(|c| !is_route_segment(c) && !snake_case(c).is_empty())
                .unwrap_or(stem)
        } else {
            stem
        };
        snake_case(&name)
    }
}

/// Route-only directory names such as `[locale]` or `(marketing)`.
fn is_route_segment(segment: &str) -> bool {
    (segment.starts_with('[') && segment.ends_with(']'))
        || (segment.starts_with('(') && segment.ends_with(')'))
        || segment == "."
        || segment == ".."
}

/// Hex blake3 digest of namespace, scope and normalized text.
pub fn content_hash(namespace: &str, scope: &str, normalized_text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(namespace.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(scope.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(normalized_text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Lowercase ASCII words of `text` joined by `_`, at most `max_words` of them.
pub fn slugify(text: &str, max_words: usize) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(max_words)
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// `LoginForm` / `login-form` / `login form` -> `login_form`.
pub fn snake_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase()
                && let Some(p) = prev
                && (p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
        prev = Some(c);
    }
    out.trim_matches('_').to_string()
}

/// Keys that would read as text rather than as an identifier.
pub fn is_suspicious_key(key: &str, delimiter: &str) -> bool {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return true;
    }
    key.split(delimiter).any(|segment| {
        segment.is_empty()
            || segment.len() > MAX_SEGMENT_LEN
            || !KEY_SEGMENT.is_match(segment)
            || segment.split('_').filter(|w| !w.is_empty()).count() > MAX_SEGMENT_WORDS
    })
}

/// A string that already looks like a translation key rather than prose.
pub fn looks_like_key(text: &str, delimiter: &str) -> bool {
    text.contains(delimiter) && !is_suspicious_key(text, delimiter)
}

/// Replacement keys to try, in order, after `key` collided.
///
/// A key under an existing leaf first gets its last segment folded into the
/// parent (`a.b.c` -> `a.b_c`); every other clash starts with `_text`. Numeric
/// suffixes follow. At most `attempts` variants are returned.
pub fn key_variants(key: &str, collision: Collision, delimiter: &str, attempts: usize) -> Vec<String> {
    let base = match (collision, key.rfind(delimiter)) {
        (Collision::ParentIsLeaf, Some(at)) => {
            format!("{}_{}", &key[..at], &key[at + delimiter.len()..])
        }
        _ => key.to_string(),
    };
    let mut variants = Vec::with_capacity(attempts);
    if base != key {
        variants.push(base.clone());
    }
    variants.push(format!("{base}_text"));
    variants.extend((2..).map(|n| format!("{base}_{n}")).take(attempts));
    variants.truncate(attempts);
    variants
}
