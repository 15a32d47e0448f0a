//! Streaming text-corpus batching library and CLI.
//!
//! The crate exposes both a library API and a `textbatch` command line
//! interface for turning a whitespace-tokenized corpus into padded,
//! time-major `(target, input, mask)` batches for sequence-model training.
//! Typical usage builds a `Vocab` from a token-counts file, opens a
//! `DataLoader` over the corpus, and pulls batches until a step budget runs
//! out; the loader cycles over the file endlessly, bumping its epoch counter
//! each time the stream is exhausted.
//!
//! ```no_run
//! use std::sync::Arc;
//! use textbatch::{DataLoader, LoaderConfig, Vocab};
//!
//! # fn main() -> textbatch::Result<()> {
//! let vocab = Arc::new(Vocab::from_counts_file("counts.txt", 2, &[])?);
//! let cfg = LoaderConfig::builder()
//!     .batch_size(16)
//!     .seed(Some(42))
//!     .build()?;
//! let mut loader = DataLoader::new(vocab, "corpus.txt", cfg)?;
//! for _ in 0..1000 {
//!     let batch = loader.next_batch()?;
//!     // feed batch.input / batch.target / batch.mask to the training step
//!     let _ = (batch.steps(), batch.width());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting
//! the library portion only can disable default features to avoid the CLI
//! dependencies: `textbatch = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod batch;
pub mod config;
pub mod error;
pub mod loader;
pub mod special_tokens;
pub mod vocab;

pub use batch::{batchify, Batch};
pub use config::{LoaderBuilder, LoaderConfig};
pub use error::{Result, TextBatchError};
pub use loader::DataLoader;
pub use vocab::Vocab;
