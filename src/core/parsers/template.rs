//! Tokenizer for the `<template>` block of single-file components.
//!
//! Produces a flat list of text runs, `{{ }}` interpolations and attributes
//! with their byte offsets. Comments are dropped and `<script>`/`<style>`
//! bodies are skipped. The tokenizer is forgiving: unterminated constructs
//! run to the end of the block instead of failing.

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Text between tags, untrimmed.
    Text { raw: String, offset: usize },
    /// Expression inside `{{ }}`; `offset` points at the expression start.
    Interpolation { expr: String, offset: usize },
    /// Attribute with a value; `offset` points at the first value byte.
    Attribute {
        element: String,
        name: String,
        value: String,
        quote: Option<char>,
        offset: usize,
    },
}

/// Byte range of the root `<template>` content, if the file has one.
pub fn template_bounds(source: &str) -> Result<Option<(usize, usize)>> {
    let bytes = source.as_bytes();
    let mut search = 0;
    let open = loop {
        let Some(found) = source[search..].find("<template") else {
            return Ok(None);
        };
        let at = search + found;
        match bytes.get(at + "<template".len()) {
            Some(b'>' | b' ' | b'\n' | b'\t' | b'\r') => break at,
            _ => search = at + 1,
        }
    };
    let Some(tag_end) = source[open..].find('>') else {
        bail!("unterminated <template> tag");
    };
    let content_start = open + tag_end + 1;
    let Some(close) = source.rfind("</template>") else {
        bail!("missing closing </template>");
    };
    if close < content_start {
        bail!("missing closing </template>");
    }
    Ok(Some((content_start, close)))
}

pub fn parse_template(source: &str) -> Result<Vec<TemplateNode>> {
    let Some((start, end)) = template_bounds(source)? else {
        return Ok(Vec::new());
    };
    Ok(Tokenizer::new(source, end).run(start))
}

struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    end: usize,
    nodes: Vec<TemplateNode>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str, end: usize) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            end,
            nodes: Vec::new(),
        }
    }

    fn starts_with(&self, at: usize, pattern: &[u8]) -> bool {
        self.bytes[at..self.end].starts_with(pattern)
    }

    fn find(&self, from: usize, pattern: &str) -> Option<usize> {
        self.source[from..self.end].find(pattern).map(|i| from + i)
    }

    fn push_text(&mut self, from: usize, to: usize) {
        if from < to {
            self.nodes.push(TemplateNode::Text {
                raw: self.source[from..to].to_string(),
                offset: from,
            });
        }
    }

    fn run(mut self, start: usize) -> Vec<TemplateNode> {
        let mut i = start;
        let mut text_start = start;
        while i < self.end {
            if self.starts_with(i, b"<!--") {
                self.push_text(text_start, i);
                i = self.find(i + 4, "-->").map_or(self.end, |close| close + 3);
                text_start = i;
            } else if self.starts_with(i, b"{{") {
                self.push_text(text_start, i);
                let expr_start = i + 2;
                let close = self.find(expr_start, "}}").unwrap_or(self.end);
                self.nodes.push(TemplateNode::Interpolation {
                    expr: self.source[expr_start..close].to_string(),
                    offset: expr_start,
                });
                i = (close + 2).min(self.end);
                text_start = i;
            } else if self.starts_with(i, b"</") {
                self.push_text(text_start, i);
                i = self.find(i, ">").map_or(self.end, |close| close + 1);
                text_start = i;
            } else if self.bytes[i] == b'<'
                && self.bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic)
            {
                self.push_text(text_start, i);
                i = self.tag(i);
                text_start = i;
            } else {
                i += 1;
            }
        }
        self.push_text(text_start, self.end);
        self.nodes
    }

    /// Parse an opening tag at `at`, returning the offset just past it (and
    /// past the body for raw-text elements).
    fn tag(&mut self, at: usize) -> usize {
        let mut j = at + 1;
        while j < self.end
            && (self.bytes[j].is_ascii_alphanumeric() || matches!(self.bytes[j], b'-' | b'_' | b':' | b'.'))
        {
            j += 1;
        }
        let element = self.source[at + 1..j].to_string();
        let mut self_closing = false;

        loop {
            while j < self.end && self.bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= self.end {
                break;
            }
            if self.bytes[j] == b'>' {
                j += 1;
                break;
            }
            if self.starts_with(j, b"/>") {
                self_closing = true;
                j += 2;
                break;
            }

            let name_start = j;
            while j < self.end
                && !self.bytes[j].is_ascii_whitespace()
                && !matches!(self.bytes[j], b'=' | b'>' | b'"' | b'\'')
                && !self.starts_with(j, b"/>")
            {
                j += 1;
            }
            if j == name_start {
                // Stray quote or slash
                j += 1;
                continue;
            }
            let name = self.source[name_start..j].to_string();

            let mut k = j;
            while k < self.end && self.bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= self.end || self.bytes[k] != b'=' {
                continue;
            }
            k += 1;
            while k < self.end && self.bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= self.end {
                j = k;
                break;
            }

            let (value_start, value_end, quote, next) = match self.bytes[k] {
                q @ (b'"' | b'\'') => {
                    let close = self.find(k + 1, if q == b'"' { "\"" } else { "'" }).unwrap_or(self.end);
                    (k + 1, close, Some(q as char), (close + 1).min(self.end))
                }
                _ => {
                    let mut e = k;
                    while e < self.end && !self.bytes[e].is_ascii_whitespace() && self.bytes[e] != b'>' {
                        e += 1;
                    }
                    (k, e, None, e)
                }
            };
            self.nodes.push(TemplateNode::Attribute {
                element: element.clone(),
                name,
                value: self.source[value_start..value_end].to_string(),
                quote,
                offset: value_start,
            });
            j = next;
        }

        let lower = element.to_ascii_lowercase();
        if !self_closing && (lower == "script" || lower == "style") {
            let closing = format!("</{}", lower);
            let body_end = self.source[j..self.end]
                .to_ascii_lowercase()
                .find(&closing)
                .map_or(self.end, |i| j + i);
            return self.find(body_end, ">").map_or(self.end, |close| close + 1);
        }
        j
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(nodes: &[TemplateNode]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(|n| match n {
                TemplateNode::Text { raw, .. } if !raw.trim().is_empty() => Some(raw.trim()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_no_template_block() {
        assert!(parse_template("<script>export default {}</script>").unwrap().is_empty());
    }

    #[test]
    fn test_text_interpolation_and_attributes() {
        let source = r#"<template>
  <div class="box">
    <h1>Welcome back</h1>
    <input placeholder='Your name' :title="label" disabled>
    <p>{{ count }} items</p>
  </div>
</template>
<script setup>
const label = 'x'
</script>
"#;
        let nodes = parse_template(source).unwrap();
        assert_eq!(texts(&nodes), vec!["Welcome back", "items"]);

        let attrs: Vec<(&str, &str, Option<char>)> = nodes
            .iter()
            .filter_map(|n| match n {
                TemplateNode::Attribute { name, value, quote, .. } => {
                    Some((name.as_str(), value.as_str(), *quote))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            attrs,
            vec![
                ("class", "box", Some('"')),
                ("placeholder", "Your name", Some('\'')),
                (":title", "label", Some('"')),
            ]
        );

        let interpolation = nodes
            .iter()
            .find_map(|n| match n {
                TemplateNode::Interpolation { expr, offset } => Some((expr.clone(), *offset)),
                _ => None,
            })
            .unwrap();
        assert_eq!(interpolation.0, " count ");
        assert_eq!(&source[interpolation.1..interpolation.1 + 7], " count ");
    }

    #[test]
    fn test_attribute_offsets_point_at_value() {
        let source = "<template><img alt=\"Logo\"></template>";
        let nodes = parse_template(source).unwrap();
        let TemplateNode::Attribute { offset, .. } = &nodes[0] else {
            panic!("expected attribute, got {:?}", nodes);
        };
        assert_eq!(&source[*offset..*offset + 4], "Logo");
    }

    #[test]
    fn test_comments_style_and_nested_templates() {
        let source = r#"<template>
  <!-- Hidden text -->
  <style>.a { content: "Nope"; }</style>
  <template v-if="ok"><span>Shown</span></template>
</template>"#;
        let nodes = parse_template(source).unwrap();
        assert_eq!(texts(&nodes), vec!["Shown"]);
    }

    #[test]
    fn test_missing_close_is_an_error() {
        assert!(parse_template("<template><p>Hi</p>").is_err());
    }
}
