//! Error type of the Trellis CLI.

use std::{io, ops::Range};

use thiserror::Error;

use trellis::GraphError;

/// Errors raised while running the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The snapshot file is not a valid snapshot document.
    #[error("Invalid snapshot: {message}")]
    Snapshot {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error("Failed to write snapshot: {0}")]
    Serialize(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl CliError {
    pub(crate) fn snapshot(err: &toml::de::Error, src: &str) -> Self {
        Self::Snapshot {
            message: err.message().to_string(),
            span: err.span(),
            src: src.to_string(),
        }
    }
}
