//! Crate-wide error taxonomy.
//!
//! Three variants, matching the error model: malformed input text,
//! semantically invalid (but well-formed) input, and violated internal
//! invariants. Nothing in this crate panics outside of tests; any condition
//! that would otherwise `unwrap()` is surfaced through one of these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtpgError {
    #[error("{path}: syntax error: {detail}")]
    InputSyntax { path: String, detail: String },

    #[error("{path}: {detail}")]
    InputSemantic { path: String, detail: String },

    #[error("internal invariant violated: {detail}")]
    InternalInvariant { detail: String },
}

impl AtpgError {
    pub fn syntax(path: impl Into<String>, detail: impl Into<String>) -> Self {
        AtpgError::InputSyntax { path: path.into(), detail: detail.into() }
    }

    pub fn semantic(path: impl Into<String>, detail: impl Into<String>) -> Self {
        AtpgError::InputSemantic { path: path.into(), detail: detail.into() }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        AtpgError::InternalInvariant { detail: detail.into() }
    }

    /// Exit code this error should map to at a CLI boundary (see the external
    /// interfaces section: 1 = internal error, 2 = usage/input error).
    pub fn exit_code(&self) -> i32 {
        match self {
            AtpgError::InputSyntax { .. } | AtpgError::InputSemantic { .. } => 2,
            AtpgError::InternalInvariant { .. } => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AtpgError>;
