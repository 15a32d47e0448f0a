//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = TextBatchError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, IO, or corpus streaming.
#[derive(Debug, Error)]
pub enum TextBatchError {
    /// Loader configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// A full corpus traversal produced no complete sentences.
    #[error("empty corpus: {0}")]
    EmptyCorpus(String),
}

impl TextBatchError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
