//! Typed errors of the extraction core.
//!
//! Per-candidate problems are [`SkipReason`]s: they downgrade one candidate
//! (or one file) and the run continues. [`StoreError`] is the only error that
//! aborts a run, and only when it happens during a flush.

use std::{io, path::PathBuf};

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::candidate::CandidateStatus;

/// Expression shapes that are never rewritten because splitting them into
/// one message would break pluralization or concatenation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum UnsafePattern {
    #[error("string concatenation over conditional logic")]
    ConditionalConcatenation,
    #[error("top-level ternary")]
    TopLevelTernary,
    #[error("template literal with conditional logic")]
    ConditionalInterpolation,
    #[error("interpolation too complex to name")]
    ComplexInterpolation,
}

/// How a key clashes with the existing key hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Collision {
    /// An ancestor of the key is already a leaf (`a.b` exists, `a.b.c` wanted).
    #[error("parent-is-leaf")]
    ParentIsLeaf,
    /// The key is already an ancestor of existing leaves (`a.b.c` exists, `a.b` wanted).
    #[error("child-is-parent")]
    ChildIsParent,
    /// The exact key is taken by a different text.
    #[error("key-taken")]
    KeyTaken,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("collision-unresolved: `{key}` ({collision})")]
    CollisionUnresolved { key: String, collision: Collision },
    #[error("suspicious-key: `{0}`")]
    SuspiciousKey(String),
    #[error("unsafe-expression: {0}")]
    UnsafeExpression(UnsafePattern),
    #[error("no-enclosing-scope-found")]
    NoEnclosingScope,
    #[error("not-located")]
    NotLocated,
    #[error("file-processing-exception: {0}")]
    FileError(String),
}

impl SkipReason {
    /// Stable category name used when aggregating skip counts.
    pub fn category(&self) -> &'static str {
        match self {
            SkipReason::CollisionUnresolved { .. } => "collision-unresolved",
            SkipReason::SuspiciousKey(_) => "suspicious-key",
            SkipReason::UnsafeExpression(_) => "unsafe-expression",
            SkipReason::NoEnclosingScope => "no-enclosing-scope-found",
            SkipReason::NotLocated => "not-located",
            SkipReason::FileError(_) => "file-processing-exception",
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid candidate transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: CandidateStatus,
    pub to: CandidateStatus,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read locale file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse locale file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("locale file {path} must contain a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("failed to write locale file {path}")]
    LocaleWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize locale `{locale}`")]
    Serialize {
        locale: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("key `{key}` cannot be nested with delimiter `{delimiter}`: it conflicts with `{conflict}`")]
    ShapeConflict {
        key: String,
        conflict: String,
        delimiter: String,
    },
    #[error("rename target `{to}` already exists in locale `{locale}` (renaming `{from}`)")]
    RenameDuplicateTarget {
        locale: String,
        from: String,
        to: String,
    },
    #[error("locale `{0}` has unflushed changes")]
    UnflushedChanges(String),
    #[error("failed to list locale directory {path}")]
    ListLocales {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_display_and_category() {
        let reason = SkipReason::CollisionUnresolved {
            key: "a.b".to_string(),
            collision: Collision::ParentIsLeaf,
        };
        assert_eq!(reason.to_string(), "collision-unresolved: `a.b` (parent-is-leaf)");
        assert_eq!(reason.category(), "collision-unresolved");

        let reason = SkipReason::UnsafeExpression(UnsafePattern::TopLevelTernary);
        assert_eq!(reason.to_string(), "unsafe-expression: top-level ternary");
        assert_eq!(reason.category(), "unsafe-expression");
    }

    #[test]
    fn test_skip_reason_serializes_as_string() {
        let json = serde_json::to_string(&SkipReason::NotLocated).unwrap();
        assert_eq!(json, "\"not-located\"");
    }
}
