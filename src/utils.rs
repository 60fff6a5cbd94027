//! Common utility functions shared across the codebase.

use std::path::Path;

/// Checks if the text contains at least one Unicode alphabetic character.
///
/// Returns false for empty strings, pure numbers, or pure symbols.
///
/// # Examples
///
/// ```
/// use keysmith::utils::contains_alphabetic;
///
/// assert!(contains_alphabetic("Hello"));
/// assert!(contains_alphabetic("你好"));
/// assert!(!contains_alphabetic("123"));
/// assert!(!contains_alphabetic("$100"));
/// ```
pub fn contains_alphabetic(text: &str) -> bool {
    text.chars().any(|c| c.is_alphabetic())
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Named character references that show up in UI copy.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '©'),
    ("reg", '®'),
    ("trade", '™'),
    ("hellip", '…'),
    ("mdash", '—'),
    ("ndash", '–'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("middot", '·'),
    ("bull", '•'),
    ("euro", '€'),
    ("times", '×'),
];

/// Longest reference body worth scanning for a terminating `;`.
const MAX_ENTITY_LEN: usize = 10;

/// Decode HTML character references (`&amp;`, `&#169;`, `&#xA9;`).
///
/// Unknown or unterminated references are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        let decoded = rest[1..]
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|&(_, c)| c == ';')
            .and_then(|(end, _)| decode_entity(&rest[1..1 + end]).map(|c| (c, end + 2)));
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(name, _)| *name == body)
        .map(|&(_, c)| c)
}

/// Byte offsets at which each line of `content` starts.
pub fn line_starts(content: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Convert a byte offset into a 1-based line and 1-based character column.
pub fn offset_to_line_col(content: &str, starts: &[usize], offset: usize) -> (usize, usize) {
    let line_idx = match starts.binary_search(&offset) {
        Ok(idx) => idx,
        Err(idx) => idx.saturating_sub(1),
    };
    let line_start = starts.get(line_idx).copied().unwrap_or(0);
    let end = offset.min(content.len());
    let column = content
        .get(line_start..end)
        .map(|s| s.chars().count())
        .unwrap_or(0);
    (line_idx + 1, column + 1)
}

/// 1-based character column of a byte offset.
pub fn char_column(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    let head = content.get(..offset).unwrap_or(content);
    let line_start = head.rfind('\n').map(|i| i + 1).unwrap_or(0);
    head[line_start..].chars().count() + 1
}

/// Leading whitespace of the line containing `offset`.
pub fn line_indent(content: &str, offset: usize) -> &str {
    let offset = offset.min(content.len());
    let line_start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &content[line_start..];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Display `path` relative to `root` with forward slashes, falling back to
/// the path itself when it lives elsewhere.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use crate::utils::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contains_alphabetic() {
        assert!(contains_alphabetic("Hello"));
        assert!(contains_alphabetic("你好"));
        assert!(contains_alphabetic("Hello123"));
        assert!(contains_alphabetic("  abc  "));

        assert!(!contains_alphabetic("123"));
        assert!(!contains_alphabetic("---"));
        assert!(!contains_alphabetic("!@#$%"));
        assert!(!contains_alphabetic("   "));
        assert!(!contains_alphabetic(""));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello\n      world  "), "Hello world");
        assert_eq!(collapse_whitespace("one"), "one");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Terms &amp; conditions"), "Terms & conditions");
        assert_eq!(decode_entities("&copy; 2024 &#8212; &#x41;BC"), "© 2024 — ABC");
        assert_eq!(decode_entities("Wait&hellip;"), "Wait…");
        // unknown and unterminated references stay as written
        assert_eq!(decode_entities("Fish &chips; & more"), "Fish &chips; & more");
        assert_eq!(decode_entities("a &amp b"), "a &amp b");
        assert_eq!(decode_entities("&#xZZ; &"), "&#xZZ; &");
        assert_eq!(decode_entities("plain"), "plain");
    }

    #[test]
    fn test_offset_to_line_col() {
        let content = "ab\ncdé\nf";
        let starts = line_starts(content);
        assert_eq!(starts, vec![0, 3, 8]);
        assert_eq!(offset_to_line_col(content, &starts, 0), (1, 1));
        assert_eq!(offset_to_line_col(content, &starts, 4), (2, 2));
        // `é` is two bytes but one column
        assert_eq!(offset_to_line_col(content, &starts, 8), (3, 1));
        assert_eq!(offset_to_line_col(content, &starts, 7), (2, 4));
    }

    #[test]
    fn test_char_column() {
        let content = "ab\n中文 x";
        assert_eq!(char_column(content, 0), 1);
        assert_eq!(char_column(content, 3), 1);
        // two wide characters and a space before `x`
        assert_eq!(char_column(content, 10), 4);
        assert_eq!(char_column(content, 100), 5);
    }

    #[test]
    fn test_line_indent() {
        let content = "fn a() {\n    let x = 1;\n\tb\n";
        assert_eq!(line_indent(content, 0), "");
        assert_eq!(line_indent(content, 15), "    ");
        assert_eq!(line_indent(content, 25), "\t");
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/project");
        assert_eq!(
            relative_path(root, Path::new("/project/src/App.tsx")),
            "src/App.tsx"
        );
        assert_eq!(relative_path(root, Path::new("/other/x.ts")), "/other/x.ts");
    }
}
