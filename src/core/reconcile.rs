//! Map a remembered (line, column, text) hint to a byte range in a buffer
//! that may have been reformatted since the hint was taken.
//!
//! Strategies run in a fixed order and the first hit wins.

use std::ops::Range;

use regex::Regex;

use crate::utils::line_starts;

/// Lines searched on each side of the hint by the quote-bounded window.
const QUOTE_WINDOW: usize = 2;
/// Lines searched on each side of the hint by the neighbour strategy.
const NEIGHBOR_RADIUS: usize = 3;

const QUOTES: [char; 3] = ['"', '\'', '`'];

/// Line is 1-based. Column is a character index whose base (0 or 1) is not
/// known in advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionHint {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ZeroBasedColumn,
    OneBasedColumn,
    QuoteBoundedWindow,
    SameLine,
    NeighborLines,
    WhitespaceTolerant,
}

pub const STRATEGIES: [Strategy; 6] = [
    Strategy::ZeroBasedColumn,
    Strategy::OneBasedColumn,
    Strategy::QuoteBoundedWindow,
    Strategy::SameLine,
    Strategy::NeighborLines,
    Strategy::WhitespaceTolerant,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub range: Range<usize>,
    pub strategy: Strategy,
}

pub fn reconcile(buffer: &str, hint: PositionHint, text: &str) -> Option<Reconciled> {
    if text.is_empty() {
        return None;
    }
    let lines = Lines::new(buffer);
    STRATEGIES.iter().find_map(|&strategy| {
        let range = match strategy {
            Strategy::ZeroBasedColumn => at_column(&lines, hint.line, hint.column, text),
            Strategy::OneBasedColumn => hint
                .column
                .checked_sub(1)
                .and_then(|column| at_column(&lines, hint.line, column, text)),
            Strategy::QuoteBoundedWindow => quote_bounded(&lines, hint, text),
            Strategy::SameLine => closest_on_line(&lines, hint, hint.line, text),
            Strategy::NeighborLines => neighbor_lines(&lines, hint, text),
            Strategy::WhitespaceTolerant => whitespace_tolerant(&lines, hint, text),
        }?;
        Some(Reconciled { range, strategy })
    })
}

struct Lines<'a> {
    buffer: &'a str,
    starts: Vec<usize>,
}

impl<'a> Lines<'a> {
    fn new(buffer: &'a str) -> Self {
        Self {
            buffer,
            starts: line_starts(buffer),
        }
    }

    /// Byte range of a 1-based line, without its newline.
    fn range(&self, line: usize) -> Option<Range<usize>> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.buffer.len());
        Some(start..end)
    }

    /// Byte offset of a character column within a line, clamped to the line end.
    fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let range = self.range(line)?;
        let text = &self.buffer[range.clone()];
        Some(
            text.char_indices()
                .nth(column)
                .map(|(i, _)| range.start + i)
                .unwrap_or(range.end),
        )
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    fn count(&self) -> usize {
        self.starts.len()
    }
}

fn at_column(lines: &Lines<'_>, line: usize, column: usize, text: &str) -> Option<Range<usize>> {
    let range = lines.range(line)?;
    let text_chars = &lines.buffer[range.clone()];
    // Columns past the end of the line cannot hold the text.
    let (start, _) = text_chars.char_indices().nth(column)?;
    let start = range.start + start;
    lines.buffer[start..]
        .starts_with(text)
        .then(|| start..start + text.len())
}

/// Occurrences of `text` inside `window`, as absolute byte ranges.
fn occurrences(buffer: &str, window: Range<usize>, text: &str) -> Vec<Range<usize>> {
    buffer[window.clone()]
        .match_indices(text)
        .map(|(i, _)| window.start + i..window.start + i + text.len())
        .collect()
}

fn closest(candidates: Vec<Range<usize>>, target: usize) -> Option<Range<usize>> {
    candidates
        .into_iter()
        .min_by_key(|r| r.start.abs_diff(target))
}

fn hint_offset(lines: &Lines<'_>, hint: PositionHint) -> usize {
    lines
        .offset(hint.line.clamp(1, lines.count()), hint.column)
        .unwrap_or(0)
}

fn quote_bounded(lines: &Lines<'_>, hint: PositionHint, text: &str) -> Option<Range<usize>> {
    let first = hint.line.saturating_sub(QUOTE_WINDOW).max(1);
    let last = (hint.line + QUOTE_WINDOW).min(lines.count());
    if first > last {
        return None;
    }
    let window = lines.range(first)?.start..lines.range(last)?.end;
    let buffer = lines.buffer;
    let quoted: Vec<Range<usize>> = occurrences(buffer, window, text)
        .into_iter()
        .filter(|r| {
            let before = buffer[..r.start].chars().next_back();
            let after = buffer[r.end..].chars().next();
            matches!((before, after), (Some(b), Some(a)) if b == a && QUOTES.contains(&b))
        })
        .collect();
    closest(quoted, hint_offset(lines, hint))
}

fn closest_on_line(lines: &Lines<'_>, hint: PositionHint, line: usize, text: &str) -> Option<Range<usize>> {
    let range = lines.range(line)?;
    let target = lines.offset(line, hint.column).unwrap_or(range.start);
    closest(occurrences(lines.buffer, range, text), target)
}

fn neighbor_lines(lines: &Lines<'_>, hint: PositionHint, text: &str) -> Option<Range<usize>> {
    (1..=NEIGHBOR_RADIUS).find_map(|distance| {
        let above = hint
            .line
            .checked_sub(distance)
            .filter(|line| *line >= 1)
            .and_then(|line| closest_on_line(lines, hint, line, text));
        above.or_else(|| closest_on_line(lines, hint, hint.line + distance, text))
    })
}

/// Match the words of `text` separated by any whitespace, to survive
/// reflowing. Matches must start within the neighbour radius of the hint.
fn whitespace_tolerant(lines: &Lines<'_>, hint: PositionHint, text: &str) -> Option<Range<usize>> {
    let words: Vec<String> = text.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let pattern = Regex::new(&words.join(r"\s+")).ok()?;
    let line = hint.line.clamp(1, lines.count());
    let first = line.saturating_sub(NEIGHBOR_RADIUS).max(1);
    let last = line + NEIGHBOR_RADIUS;
    let start = lines.range(first)?.start;
    pattern
        .find_iter(&lines.buffer[start..])
        .map(|m| start + m.start()..start + m.end())
        .take_while(|r| lines.line_of(r.start) <= last)
        .min_by_key(|r| lines.line_of(r.start).abs_diff(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hint(line: usize, column: usize) -> PositionHint {
        PositionHint { line, column }
    }

    #[test]
    fn test_zero_based_column() {
        let buffer = "<p>\n  Hello world\n</p>";
        let found = reconcile(buffer, hint(2, 2), "Hello world").unwrap();
        assert_eq!(found.strategy, Strategy::ZeroBasedColumn);
        assert_eq!(&buffer[found.range], "Hello world");
    }

    #[test]
    fn test_one_based_column() {
        let buffer = "<p>\n  Hello world\n</p>";
        let found = reconcile(buffer, hint(2, 3), "Hello world").unwrap();
        assert_eq!(found.strategy, Strategy::OneBasedColumn);
        assert_eq!(found.range, 6..17);
    }

    #[test]
    fn test_quote_bounded_window_after_shift() {
        // Two lines were inserted above since the scan
        let buffer = "<template>\n<!-- a -->\n<!-- b -->\n  <input placeholder=\"Your name\">\n</template>";
        let found = reconcile(buffer, hint(2, 21), "Your name").unwrap();
        assert_eq!(found.strategy, Strategy::QuoteBoundedWindow);
        assert_eq!(&buffer[found.range.start - 1..found.range.end + 1], "\"Your name\"");
    }

    #[test]
    fn test_same_line_picks_closest_occurrence() {
        let buffer = "Save or Save";
        let found = reconcile(buffer, hint(1, 10), "Save").unwrap();
        assert_eq!(found.strategy, Strategy::SameLine);
        assert_eq!(found.range, 8..12);
    }

    #[test]
    fn test_neighbor_lines() {
        let buffer = "a\nb\nc\n  Welcome back\n";
        let found = reconcile(buffer, hint(1, 0), "Welcome back").unwrap();
        assert_eq!(found.strategy, Strategy::NeighborLines);
        assert_eq!(&buffer[found.range], "Welcome back");
    }

    #[test]
    fn test_whitespace_tolerant_after_reflow() {
        let buffer = "<p>\n  Welcome to\n  the app\n</p>\n";
        let found = reconcile(buffer, hint(2, 2), "Welcome to the app").unwrap();
        assert_eq!(found.strategy, Strategy::WhitespaceTolerant);
        assert_eq!(&buffer[found.range], "Welcome to\n  the app");
    }

    #[test]
    fn test_whitespace_tolerant_stays_near_the_hint() {
        let filler = "<!-- -->\n".repeat(8);
        let buffer = format!(
            "<template>\n  <p>Other</p>\n</template>\n{filler}<script>\nconst label = 'Submit   form'\n</script>\n"
        );
        assert_eq!(reconcile(&buffer, hint(2, 5), "Submit form"), None);

        let found = reconcile(&buffer, hint(14, 0), "Submit form").unwrap();
        assert_eq!(found.strategy, Strategy::WhitespaceTolerant);
        assert_eq!(&buffer[found.range], "Submit   form");
    }

    #[test]
    fn test_not_located() {
        assert_eq!(reconcile("<p>Other</p>", hint(1, 3), "Missing"), None);
        assert_eq!(reconcile("<p>Other</p>", hint(1, 3), ""), None);
    }

    #[test]
    fn test_multibyte_columns() {
        let buffer = "<p title=\"Café\">Déjà vu</p>";
        let found = reconcile(buffer, hint(1, 16), "Déjà vu").unwrap();
        assert_eq!(found.strategy, Strategy::ZeroBasedColumn);
        assert_eq!(&buffer[found.range], "Déjà vu");
    }

    #[test]
    fn test_hint_past_end_of_buffer() {
        let buffer = "one\n\"two\"\n";
        let found = reconcile(buffer, hint(40, 0), "two").unwrap();
        assert_eq!(&buffer[found.range], "two");
        assert_eq!(found.strategy, Strategy::WhitespaceTolerant);
    }
}
