//! Configuration builders controlling corpus streaming and batch assembly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextBatchError};

/// Default upper bound, in bytes, on the lines read per streaming pass.
pub const DEFAULT_CHUNK_BYTES: usize = 4_096_000;

/// Default number of sentences per emitted batch.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Configuration for a [`crate::DataLoader`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum number of sentences per emitted batch.
    pub batch_size: usize,
    /// Upper bound on the bytes of whole lines read per streaming pass.
    pub chunk_bytes: usize,
    /// Optional cap on tokens per sentence; longer sentences are truncated.
    pub max_len: Option<usize>,
    /// Optional seed for the shuffle RNG; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            max_len: None,
            seed: None,
        }
    }
}

impl LoaderConfig {
    /// Returns a builder initialised with [`LoaderConfig::default`].
    #[must_use]
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    /// Validates the invariants required for streaming.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(TextBatchError::InvalidConfig(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.chunk_bytes == 0 {
            return Err(TextBatchError::InvalidConfig(
                "chunk_bytes must be greater than zero".into(),
            ));
        }
        if self.max_len == Some(0) {
            return Err(TextBatchError::InvalidConfig(
                "max_len must be greater than zero when set".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`LoaderConfig`].
#[derive(Debug, Default, Clone)]
pub struct LoaderBuilder {
    cfg: LoaderConfig,
}

impl LoaderBuilder {
    /// Creates a builder with [`LoaderConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of sentences per batch.
    #[must_use]
    pub fn batch_size(mut self, value: usize) -> Self {
        self.cfg.batch_size = value;
        self
    }

    /// Sets the per-pass read bound in bytes.
    #[must_use]
    pub fn chunk_bytes(mut self, value: usize) -> Self {
        self.cfg.chunk_bytes = value;
        self
    }

    /// Caps sentences at `value` tokens; longer sentences are truncated.
    #[must_use]
    pub fn max_len(mut self, value: Option<usize>) -> Self {
        self.cfg.max_len = value;
        self
    }

    /// Seeds the shuffle RNG for reproducible batch order.
    #[must_use]
    pub fn seed(mut self, value: Option<u64>) -> Self {
        self.cfg.seed = value;
        self
    }

    /// Finalises the builder, returning a validated [`LoaderConfig`].
    pub fn build(self) -> Result<LoaderConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
