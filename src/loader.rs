//! Streaming corpus reader producing an endless sequence of training batches.
//!
//! The loader reads bounded chunks of whole lines from a single corpus file,
//! tokenizes and shuffles them, and slices the result into batches. When the
//! stream runs dry it reopens the file from the start and bumps the epoch
//! counter, so iteration never terminates on its own.
//!
//! For corpora larger than `chunk_bytes` the epoch counter is keyed to
//! buffer exhaustion rather than true end-of-file. That approximation is
//! part of the contract: ports that count true per-file epochs instead
//! change training dynamics against existing checkpoints.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::batch::{batchify, Batch};
use crate::config::LoaderConfig;
use crate::error::{Result, TextBatchError};
use crate::vocab::Vocab;

/// Pull-based reader cycling endlessly over a whitespace-tokenized corpus.
///
/// Owns the file handle and the epoch counter exclusively; callers observe
/// only emitted batches and the [`DataLoader::epoch`] accessor.
#[must_use]
#[derive(Debug)]
pub struct DataLoader {
    vocab: Arc<Vocab>,
    path: PathBuf,
    cfg: LoaderConfig,
    reader: BufReader<File>,
    epoch: u64,
    rng: StdRng,
    pending: VecDeque<Vec<Vec<String>>>,
}

impl DataLoader {
    /// Opens `path` for streaming. Open failure is fatal and propagated.
    pub fn new<P: AsRef<Path>>(vocab: Arc<Vocab>, path: P, cfg: LoaderConfig) -> Result<Self> {
        cfg.validate()?;
        let path = path.as_ref().to_path_buf();
        let reader = open_corpus(&path)?;
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            vocab,
            path,
            cfg,
            reader,
            epoch: 0,
            rng,
            pending: VecDeque::new(),
        })
    }

    /// Number of times the stream has been exhausted and reopened.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The vocabulary batches are mapped through.
    #[must_use]
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// The configuration this loader was constructed with.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.cfg
    }

    /// Produces the next batch, running a new streaming pass when the
    /// buffered groups are drained.
    ///
    /// Returns [`TextBatchError::EmptyCorpus`] when a full traversal of the
    /// file yields no complete sentences, which would otherwise spin forever.
    pub fn next_batch(&mut self) -> Result<Batch> {
        let mut rollovers = 0u32;
        loop {
            if let Some(group) = self.pending.pop_front() {
                return Ok(batchify(&group, &self.vocab));
            }
            let epoch_before = self.epoch;
            self.refill()?;
            if self.epoch > epoch_before {
                rollovers += 1;
            }
            if self.pending.is_empty() && rollovers >= 2 {
                return Err(TextBatchError::EmptyCorpus(format!(
                    "{} yielded no complete sentences in a full traversal",
                    self.path.display()
                )));
            }
        }
    }

    /// Runs one streaming pass: read a bounded chunk (reopening on
    /// exhaustion), tokenize, shuffle, and buffer batch-sized groups.
    fn refill(&mut self) -> Result<()> {
        let mut lines = self.read_chunk()?;
        if lines.is_empty() {
            self.epoch += 1;
            info!(
                "corpus {} exhausted, reopening (epoch {})",
                self.path.display(),
                self.epoch
            );
            self.reader = open_corpus(&self.path)?;
            lines = self.read_chunk()?;
        }

        let read_count = lines.len();
        // The byte-bounded read may have cut the tail mid-line, so the last
        // parsed line is always discarded, even when it happens to be
        // complete. Dropping it unconditionally keeps the emitted sentence
        // distribution identical across chunk boundaries.
        lines.pop();

        let mut sentences: Vec<Vec<String>> = lines
            .iter()
            .map(|line| line.split_whitespace().map(str::to_owned).collect())
            .filter(|tokens: &Vec<String>| !tokens.is_empty())
            .collect();
        if let Some(max_len) = self.cfg.max_len {
            for sentence in &mut sentences {
                sentence.truncate(max_len);
            }
        }
        sentences.shuffle(&mut self.rng);
        debug!(
            "pass read {read_count} lines, kept {} sentences",
            sentences.len()
        );

        for group in sentences.chunks(self.cfg.batch_size) {
            self.pending.push_back(group.to_vec());
        }
        Ok(())
    }

    /// Reads whole lines until the accumulated byte count reaches
    /// `chunk_bytes` or the stream is exhausted.
    fn read_chunk(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut bytes = 0usize;
        while bytes < self.cfg.chunk_bytes {
            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|err| TextBatchError::io(err, Some(self.path.clone())))?;
            if read == 0 {
                break;
            }
            bytes += read;
            lines.push(line);
        }
        Ok(lines)
    }
}

impl Iterator for DataLoader {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}

fn open_corpus(path: &Path) -> Result<BufReader<File>> {
    let file =
        File::open(path).map_err(|err| TextBatchError::io(err, Some(path.to_path_buf())))?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    use tempfile::tempdir;

    fn test_vocab() -> Arc<Vocab> {
        let counts = "aa 9\nbb 9\ncc 9\ndd 9\nee 9\nff 9\n";
        Arc::new(Vocab::from_counts_reader(Cursor::new(counts), 1, &[]).expect("vocab"))
    }

    fn write_corpus(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("corpus.txt");
        fs::write(&path, contents).expect("write corpus");
        (dir, path)
    }

    fn loader(path: &Path, cfg: LoaderConfig) -> DataLoader {
        DataLoader::new(test_vocab(), path, cfg).expect("loader")
    }

    #[test]
    fn open_failure_is_propagated() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("missing.txt");
        let err = DataLoader::new(test_vocab(), &missing, LoaderConfig::default())
            .expect_err("open should fail");
        assert!(matches!(err, TextBatchError::Io { .. }));
    }

    #[test]
    fn last_line_of_each_chunk_is_dropped() {
        // Four lines fit in one chunk; only the first three survive the
        // incomplete-tail heuristic, and that also holds at true EOF.
        let (_dir, path) = write_corpus("aa bb\ncc dd\nee ff\naa cc\n");
        let cfg = LoaderConfig::builder()
            .batch_size(16)
            .seed(Some(3))
            .build()
            .expect("config");
        let mut loader = loader(&path, cfg);
        let batch = loader.next_batch().expect("batch");
        assert_eq!(batch.width(), 3);
        assert_eq!(loader.epoch(), 0);
    }

    #[test]
    fn epoch_increments_on_every_full_pass() {
        let (_dir, path) = write_corpus("aa bb\ncc dd\nee ff\n");
        let cfg = LoaderConfig::builder()
            .batch_size(16)
            .seed(Some(11))
            .build()
            .expect("config");
        let mut loader = loader(&path, cfg);

        // First pass reads the whole file without a reopen.
        let first = loader.next_batch().expect("batch");
        assert_eq!(first.width(), 2);
        assert_eq!(loader.epoch(), 0);

        // Each subsequent pass over this small corpus triggers one reopen.
        for pass in 1u64..=4 {
            let batch = loader.next_batch().expect("batch");
            assert_eq!(batch.width(), 2);
            assert_eq!(loader.epoch(), pass);
        }
    }

    #[test]
    fn large_corpus_spans_multiple_passes_before_rollover() {
        // Each line is 6 bytes; a 13-byte chunk holds 3 lines, of which the
        // last is dropped, so two passes consume the file before any reopen.
        let (_dir, path) = write_corpus("aa bb\ncc dd\nee ff\naa cc\nbb dd\ncc ee\n");
        let cfg = LoaderConfig::builder()
            .batch_size(16)
            .chunk_bytes(13)
            .seed(Some(5))
            .build()
            .expect("config");
        let mut loader = loader(&path, cfg);

        let first = loader.next_batch().expect("batch");
        assert_eq!(first.width(), 2);
        assert_eq!(loader.epoch(), 0);

        let second = loader.next_batch().expect("batch");
        assert_eq!(second.width(), 2);
        assert_eq!(loader.epoch(), 0);

        // Third pass finds the stream exhausted and rolls the epoch.
        let third = loader.next_batch().expect("batch");
        assert_eq!(third.width(), 2);
        assert_eq!(loader.epoch(), 1);
    }

    #[test]
    fn batches_are_sliced_to_batch_size() {
        let (_dir, path) = write_corpus("aa bb\ncc dd\nee ff\naa cc\nbb dd\ncc ee\n");
        let cfg = LoaderConfig::builder()
            .batch_size(2)
            .seed(Some(23))
            .build()
            .expect("config");
        let mut loader = loader(&path, cfg);
        // Five sentences survive; groups of two leave a final group of one.
        let widths: Vec<usize> = (0..3)
            .map(|_| loader.next_batch().expect("batch").width())
            .collect();
        assert_eq!(widths, vec![2, 2, 1]);
        assert_eq!(loader.epoch(), 0);
    }

    #[test]
    fn seeded_loaders_emit_identical_batches() {
        let (_dir, path) = write_corpus("aa bb cc\ndd ee\nff aa bb cc\ncc dd ee\nee ff\n");
        let cfg = LoaderConfig::builder()
            .batch_size(2)
            .seed(Some(99))
            .build()
            .expect("config");
        let mut first = loader(&path, cfg.clone());
        let mut second = loader(&path, cfg);
        for _ in 0..6 {
            let a = first.next_batch().expect("batch");
            let b = second.next_batch().expect("batch");
            assert_eq!(a.input, b.input);
            assert_eq!(a.target, b.target);
            assert_eq!(a.mask, b.mask);
        }
    }

    #[test]
    fn max_len_truncates_sentences() {
        let (_dir, path) = write_corpus("aa bb cc dd ee ff\naa bb\n");
        let cfg = LoaderConfig::builder()
            .batch_size(4)
            .max_len(Some(3))
            .seed(Some(1))
            .build()
            .expect("config");
        let mut loader = loader(&path, cfg);
        let batch = loader.next_batch().expect("batch");
        // The surviving six-token sentence is cut to three tokens.
        assert_eq!(batch.steps(), 2);
    }

    #[test]
    fn corpus_without_complete_sentences_is_an_error() {
        let (_dir, path) = write_corpus("aa bb cc\n");
        let mut loader = loader(&path, LoaderConfig::default());
        let err = loader.next_batch().expect_err("should not spin forever");
        assert!(matches!(err, TextBatchError::EmptyCorpus(_)));
    }

    #[test]
    fn iterator_yields_endlessly() {
        let (_dir, path) = write_corpus("aa bb\ncc dd\nee ff\n");
        let cfg = LoaderConfig::builder()
            .batch_size(1)
            .seed(Some(42))
            .build()
            .expect("config");
        let loader = loader(&path, cfg);
        let batches: Vec<Batch> = loader
            .take(10)
            .collect::<Result<Vec<_>>>()
            .expect("batches");
        assert_eq!(batches.len(), 10);
    }
}
