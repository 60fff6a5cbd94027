//! Byte-range edits applied to a source buffer in one pass.

use std::ops::Range;

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }

    fn contains(&self, other: &Edit) -> bool {
        self.range.start <= other.range.start && other.range.end <= self.range.end
    }
}

/// Apply edits back to front. Overlapping replacements are an error;
/// insertions at the same offset keep their relative order.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String> {
    // Stable sort so equal-offset inserts stay in push order.
    edits.sort_by_key(|edit| (edit.range.start, edit.range.end));
    for pair in edits.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            bail!(
                "overlapping edits at {}..{} and {}..{}",
                pair[0].range.start,
                pair[0].range.end,
                pair[1].range.start,
                pair[1].range.end
            );
        }
    }

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in &edits {
        if !source.is_char_boundary(edit.range.start) || !source.is_char_boundary(edit.range.end) {
            bail!("edit {}..{} is outside the buffer", edit.range.start, edit.range.end);
        }
        output.push_str(&source[cursor..edit.range.start]);
        output.push_str(&edit.text);
        cursor = edit.range.end;
    }
    output.push_str(&source[cursor..]);
    Ok(output)
}

/// Fold every edit that lies inside `range` into a single replacement of
/// `range`, rendered by `wrap` from the edited slice.
pub fn fold_into(
    source: &str,
    edits: &mut Vec<Edit>,
    range: Range<usize>,
    wrap: impl FnOnce(&str) -> String,
) -> Result<()> {
    let outer = Edit::replace(range.clone(), String::new());
    let (inner, rest): (Vec<Edit>, Vec<Edit>) = edits.drain(..).partition(|e| outer.contains(e));
    *edits = rest;

    let shifted = inner
        .into_iter()
        .map(|e| Edit::replace(e.range.start - range.start..e.range.end - range.start, e.text))
        .collect();
    let body = apply_edits(&source[range.clone()], shifted)?;
    edits.push(Edit::replace(range, wrap(&body)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edits_in_any_order() {
        let source = "<p>Hello</p><b>World</b>";
        let edits = vec![
            Edit::replace(15..20, "{t(\"b\")}"),
            Edit::replace(3..8, "{t(\"a\")}"),
            Edit::insert(0, "A"),
            Edit::insert(0, "B"),
        ];
        assert_eq!(
            apply_edits(source, edits).unwrap(),
            "AB<p>{t(\"a\")}</p><b>{t(\"b\")}</b>"
        );
    }

    #[test]
    fn test_overlapping_edits_are_rejected() {
        let edits = vec![Edit::replace(0..5, "x"), Edit::replace(3..8, "y")];
        let err = apply_edits("0123456789", edits).unwrap_err();
        assert!(err.to_string().contains("overlapping"));
    }

    #[test]
    fn test_fold_into_wraps_inner_edits() {
        let source = "const A = () => <p>Hi</p>;";
        let body = source.find('<').unwrap()..source.len() - 1;
        let mut edits = vec![Edit::replace(19..21, "{t(\"hi\")}"), Edit::insert(0, "// x\n")];
        fold_into(source, &mut edits, body, |inner| format!("{{ return {}; }}", inner)).unwrap();
        assert_eq!(
            apply_edits(source, edits).unwrap(),
            "// x\nconst A = () => { return <p>{t(\"hi\")}</p>; };"
        );
    }
}
