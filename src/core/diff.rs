//! Line-based unified diffs for source and locale snapshots.

use std::fmt::Write;

const CONTEXT_LINES: usize = 3;

/// Largest LCS table built; bigger changed regions become one replace block.
const MAX_LCS_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Unified diff between `old` and `new`, empty when they are equal.
pub fn unified_diff(old: &str, new: &str, label: &str) -> String {
    if old == new {
        return String::new();
    }
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let ops = diff_ops(&old_lines, &new_lines);

    let mut out = String::new();
    let _ = writeln!(out, "--- a/{}", label);
    let _ = writeln!(out, "+++ b/{}", label);

    // Lines consumed from each side before op `k`.
    let mut old_pos = Vec::with_capacity(ops.len() + 1);
    let mut new_pos = Vec::with_capacity(ops.len() + 1);
    let (mut o, mut n) = (0, 0);
    for op in &ops {
        old_pos.push(o);
        new_pos.push(n);
        match op {
            Op::Equal(..) => {
                o += 1;
                n += 1;
            }
            Op::Delete(_) => o += 1,
            Op::Insert(_) => n += 1,
        }
    }

    for (start, end) in hunk_ranges(&ops) {
        let hunk = &ops[start..end];
        let old_len = hunk.iter().filter(|op| !matches!(op, Op::Insert(_))).count();
        let new_len = hunk.iter().filter(|op| !matches!(op, Op::Delete(_))).count();
        let old_start = if old_len == 0 { old_pos[start] } else { old_pos[start] + 1 };
        let new_start = if new_len == 0 { new_pos[start] } else { new_pos[start] + 1 };
        let _ = writeln!(
            out,
            "@@ -{},{} +{},{} @@",
            old_start, old_len, new_start, new_len
        );
        for op in hunk {
            let _ = match *op {
                Op::Equal(i, _) => writeln!(out, " {}", old_lines[i]),
                Op::Delete(i) => writeln!(out, "-{}", old_lines[i]),
                Op::Insert(j) => writeln!(out, "+{}", new_lines[j]),
            };
        }
    }
    out
}

/// Number of added plus removed lines in a unified diff.
pub fn count_changes(diff: &str) -> usize {
    diff.lines()
        .filter(|line| {
            (line.starts_with('+') && !line.starts_with("+++"))
                || (line.starts_with('-') && !line.starts_with("---"))
        })
        .count()
}

fn diff_ops(a: &[&str], b: &[&str]) -> Vec<Op> {
    let (n, m) = (a.len(), b.len());
    let mut prefix = 0;
    while prefix < n && prefix < m && a[prefix] == b[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < n - prefix && suffix < m - prefix && a[n - 1 - suffix] == b[m - 1 - suffix] {
        suffix += 1;
    }

    let a_mid = &a[prefix..n - suffix];
    let b_mid = &b[prefix..m - suffix];
    let (p, q) = (a_mid.len(), b_mid.len());

    let mut ops: Vec<Op> = (0..prefix).map(|i| Op::Equal(i, i)).collect();
    let width = q + 1;
    if (p + 1).saturating_mul(width) > MAX_LCS_CELLS {
        ops.extend((0..p).map(|i| Op::Delete(prefix + i)));
        ops.extend((0..q).map(|j| Op::Insert(prefix + j)));
    } else {
        // lcs[i * width + j] = LCS length of a_mid[i..] and b_mid[j..]
        let mut lcs = vec![0u32; (p + 1) * width];
        for i in (0..p).rev() {
            for j in (0..q).rev() {
                lcs[i * width + j] = if a_mid[i] == b_mid[j] {
                    lcs[(i + 1) * width + j + 1] + 1
                } else {
                    lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
                };
            }
        }

        let (mut i, mut j) = (0, 0);
        while i < p || j < q {
            if i < p && j < q && a_mid[i] == b_mid[j] {
                ops.push(Op::Equal(prefix + i, prefix + j));
                i += 1;
                j += 1;
            } else if i < p && (j == q || lcs[(i + 1) * width + j] >= lcs[i * width + j + 1]) {
                ops.push(Op::Delete(prefix + i));
                i += 1;
            } else {
                ops.push(Op::Insert(prefix + j));
                j += 1;
            }
        }
    }
    ops.extend((0..suffix).map(|k| Op::Equal(n - suffix + k, m - suffix + k)));
    ops
}

/// Op index ranges of each hunk, changes closer than twice the context merge.
fn hunk_ranges(ops: &[Op]) -> Vec<(usize, usize)> {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, Op::Equal(..)))
        .map(|(k, _)| k)
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for k in changes {
        let start = k.saturating_sub(CONTEXT_LINES);
        let end = (k + CONTEXT_LINES + 1).min(ops.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }
    ranges
}
