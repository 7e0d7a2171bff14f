//! Error taxonomy for the patch algebra and rebase loop.

use thiserror::Error;

/// Failure of a single handler's `apply`, `invert`, `transform`, or `compose` step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OpError {
    #[error("malformed JSON pointer: {0}")]
    InvalidPath(String),
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("invalid array index at {0}")]
    InvalidArrayIndex(String),
    #[error("invalid operation value at {0}: {1}")]
    InvalidOpValue(String, String),
    #[error("test failed at {path}: expected {expected}, found {found}")]
    TestFailed {
        path: String,
        expected: String,
        found: String,
    },
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("change exceeds size budget and cannot be split further")]
    BudgetExceeded,
}

/// `applyPatch` failure: which op in the patch failed, and why.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("op {index} failed: {source}")]
pub struct PatchApplyError {
    pub index: usize,
    #[source]
    pub source: OpError,
}

/// `invertPatch` failure — the precondition (a captured pre-value) was missing.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("patch mismatch while inverting op {index}: {reason}")]
pub struct InvertError {
    pub index: usize,
    pub reason: String,
}

/// Malformed compact or verbose wire-form payloads.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("unknown opcode")]
    UnknownOpcode,
    #[error("malformed op")]
    Malformed,
}

/// Errors surfaced across the `ChangeStore` boundary in the rebase loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RebaseError {
    #[error("document not found: {0}")]
    DocNotFound(String),
    #[error("store operation failed: {0}")]
    Store(String),
    #[error(transparent)]
    Apply(#[from] PatchApplyError),
    #[error("change exceeds size budget and cannot be split further")]
    BudgetExceeded,
}
