//! Error types for interaction graph operations.
//!
//! [`GraphError`] covers building, validating and mutating the graph.
//! [`PathError`] covers path-style queries.

use thiserror::Error;

use trellis_core::notation::NotationError;

/// The main error type for interaction graph operations.
///
/// No variant is ever repaired heuristically: a failed build produces no
/// graph, and a rejected mutation leaves both the graph and the notation
/// untouched.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The semantic model, the notation and the layout cannot be reconciled.
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// The model uses a construct that has no resolution rule.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A mutation would violate an ordering invariant.
    #[error("Mutation rejected: {0}")]
    MutationRejected(String),

    #[error("Notation error: {0}")]
    Notation(#[from] NotationError),

    #[error("Query error: {0}")]
    Query(#[from] PathError),
}

impl GraphError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::StructuralInconsistency(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self::MutationRejected(message.into())
    }
}

/// Errors raised while parsing or resolving a path query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path `{path}` at offset {offset}")]
    Syntax { path: String, offset: usize },

    #[error("Unknown step `{0}`")]
    UnknownStep(String),

    #[error("Index must be 1 or greater in step `{0}`")]
    ZeroIndex(String),

    #[error("Step `{step}[{index}]` is out of range")]
    OutOfRange { step: String, index: usize },

    #[error("Step `{0}` is not applicable here")]
    NotApplicable(String),
}
