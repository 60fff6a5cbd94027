//! Candidate data model and the candidate status state machine.

use std::{fmt, ops::Range};

use serde::Serialize;

use super::error::{InvalidTransition, SkipReason, UnsafePattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    TextNode,
    Attribute,
    Expression,
    CallArgument,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::TextNode => "text-node",
            CandidateKind::Attribute => "attribute",
            CandidateKind::Expression => "expression",
            CandidateKind::CallArgument => "call-argument",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source dialect a candidate was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// JSX/TSX component markup.
    Markup,
    /// `<template>` block of a single-file component.
    Template,
}

/// 1-based line and 1-based character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// One named value passed to the translation call of a full-wrap rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterpolationParam {
    /// Placeholder name used inside the stored message (`{name}`).
    pub name: String,
    /// Source expression bound to the placeholder.
    pub expr: String,
}

/// How the literal is replaced once its key is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum ReplaceMode {
    /// Text between tags becomes an interpolated call.
    WrapChild,
    /// A static attribute value becomes a bound call.
    BindAttribute,
    /// A string literal inside an expression becomes a call.
    InnerLiteral,
    /// A whole interpolating expression becomes a call with named values.
    FullWrap { params: Vec<InterpolationParam> },
    /// The literal argument of an existing translation call is swapped for the key.
    SwapArgument,
}

impl ReplaceMode {
    /// Whether the rewrite introduces a translation call that needs a bound hook.
    pub fn needs_binding(&self) -> bool {
        !matches!(self, ReplaceMode::SwapArgument)
    }
}

/// Enclosing function of a markup candidate, used to place the hook binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSite {
    /// Byte offset of the function start; identifies the scope within a file.
    pub id: usize,
    pub body: ScopeBody,
    /// A translation binding is already visible from this scope.
    pub has_binding: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeBody {
    /// `{ ... }` body; the binding goes right after the opening brace.
    Block { insert_at: usize, indent: String },
    /// Concise arrow body that must be turned into a block first.
    Expr {
        range: Range<usize>,
        indent: String,
        base_indent: String,
    },
    /// Bound at module level; nothing is ever inserted.
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateContext {
    pub dialect: Dialect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_hint: Option<String>,
    /// Source spelling of the literal, without surrounding quotes.
    pub raw: String,
    pub replace: ReplaceMode,
    /// Quote character around the literal, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<char>,
    /// Exact byte range to replace (markup dialect only).
    #[serde(skip)]
    pub span: Option<Range<usize>>,
    #[serde(skip)]
    pub scope: Option<ScopeSite>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_rejection")]
    pub rejection: Option<UnsafePattern>,
}

fn serialize_rejection<S: serde::Serializer>(
    value: &Option<UnsafePattern>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(pattern) => serializer.collect_str(pattern),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub file_path: String,
    pub kind: CandidateKind,
    pub text: String,
    pub position: Position,
    pub context: CandidateContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Existing,
    Duplicate,
    Applied,
    Skipped,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Existing => "existing",
            CandidateStatus::Duplicate => "duplicate",
            CandidateStatus::Applied => "applied",
            CandidateStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CandidateStatus::Applied | CandidateStatus::Skipped | CandidateStatus::Duplicate
        )
    }

    pub fn can_transition_to(&self, next: CandidateStatus) -> bool {
        use CandidateStatus::*;
        matches!(
            (self, next),
            (Pending, Applied | Skipped | Duplicate | Existing) | (Existing, Applied | Skipped)
        )
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub suggested_key: String,
    pub hash: String,
    pub status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    /// The key already existed in the source locale before this run.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub existing_key: bool,
    /// The literal is already a key; nothing needs rewriting.
    #[serde(skip)]
    pub keyed: bool,
}

impl TransformCandidate {
    pub fn new(candidate: Candidate, suggested_key: String, hash: String) -> Self {
        Self {
            candidate,
            suggested_key,
            hash,
            status: CandidateStatus::Pending,
            reason: None,
            existing_key: false,
            keyed: false,
        }
    }

    pub fn transition(&mut self, next: CandidateStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == CandidateStatus::Existing {
            self.existing_key = true;
        }
        self.status = next;
        Ok(())
    }

    pub fn skip(&mut self, reason: SkipReason) -> Result<(), InvalidTransition> {
        self.transition(CandidateStatus::Skipped)?;
        self.reason = Some(reason);
        Ok(())
    }

    /// Still waiting for the apply phase to rewrite it.
    pub fn awaiting_apply(&self) -> bool {
        matches!(
            self.status,
            CandidateStatus::Pending | CandidateStatus::Existing
        ) && !self.keyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL: [CandidateStatus; 5] = [
        CandidateStatus::Pending,
        CandidateStatus::Existing,
        CandidateStatus::Duplicate,
        CandidateStatus::Applied,
        CandidateStatus::Skipped,
    ];

    fn sample() -> TransformCandidate {
        let candidate = Candidate {
            id: "app.tsx#text-node@10-21".to_string(),
            file_path: "app.tsx".to_string(),
            kind: CandidateKind::TextNode,
            text: "Hello world".to_string(),
            position: Position::new(3, 5),
            context: CandidateContext {
                dialect: Dialect::Markup,
                attribute: None,
                path_hint: None,
                raw: "Hello world".to_string(),
                replace: ReplaceMode::WrapChild,
                quote: None,
                span: Some(10..21),
                scope: None,
                rejection: None,
            },
        };
        TransformCandidate::new(candidate, "app.hello_world".to_string(), "abc".to_string())
    }

    #[test]
    fn test_transition_table() {
        use CandidateStatus::*;
        let allowed = [
            (Pending, Existing),
            (Pending, Duplicate),
            (Pending, Applied),
            (Pending, Skipped),
            (Existing, Applied),
            (Existing, Skipped),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(CandidateStatus::is_terminal) {
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
        assert!(!CandidateStatus::Pending.is_terminal());
        assert!(!CandidateStatus::Existing.is_terminal());
    }

    #[test]
    fn test_transition_rejects_invalid_move() {
        let mut candidate = sample();
        candidate.transition(CandidateStatus::Applied).unwrap();
        let err = candidate.transition(CandidateStatus::Pending).unwrap_err();
        assert_eq!(err.from, CandidateStatus::Applied);
        assert_eq!(err.to, CandidateStatus::Pending);
        assert_eq!(candidate.status, CandidateStatus::Applied);
    }

    #[test]
    fn test_existing_then_applied_keeps_flag() {
        let mut candidate = sample();
        candidate.transition(CandidateStatus::Existing).unwrap();
        assert!(candidate.awaiting_apply());
        candidate.transition(CandidateStatus::Applied).unwrap();
        assert!(candidate.existing_key);
        assert!(!candidate.awaiting_apply());
    }

    #[test]
    fn test_skip_records_reason() {
        let mut candidate = sample();
        candidate.skip(SkipReason::NotLocated).unwrap();
        assert_eq!(candidate.status, CandidateStatus::Skipped);
        assert_eq!(candidate.reason, Some(SkipReason::NotLocated));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["kind"], "text-node");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["suggestedKey"], "app.hello_world");
        assert_eq!(value["position"]["line"], 3);
        assert_eq!(value["context"]["replace"]["mode"], "wrap-child");
        assert!(value.get("reason").is_none());
    }
}
