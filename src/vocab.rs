//! Token vocabulary built once from a frequency-counts file.
//!
//! The index assignment is the compatibility contract with externally trained
//! checkpoints: the four reserved tokens come first in fixed order, then any
//! caller-supplied extras, then surviving corpus tokens in file order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::error::{Result, TextBatchError};
use crate::special_tokens;

/// Immutable bidirectional mapping between token strings and dense indices.
#[must_use]
#[derive(Debug, Clone)]
pub struct Vocab {
    idx2token: Vec<String>,
    token2idx: FxHashMap<String, usize>,
    padding_idx: usize,
    unk_idx: usize,
    bos_idx: usize,
    eos_idx: usize,
}

impl Vocab {
    /// Builds a vocabulary from a counts file at `path`.
    ///
    /// Each line is expected to hold a token and an integer count separated by
    /// whitespace; a token is kept when its count is at least `min_occur_cnt`.
    /// Lines of any other shape are skipped without error.
    pub fn from_counts_file<P: AsRef<Path>>(
        path: P,
        min_occur_cnt: i64,
        extra_specials: &[String],
    ) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|err| TextBatchError::io(err, Some(path.to_path_buf())))?;
        Self::from_counts_reader(BufReader::new(file), min_occur_cnt, extra_specials)
    }

    /// Builds a vocabulary from any buffered counts source.
    pub fn from_counts_reader<R: BufRead>(
        reader: R,
        min_occur_cnt: i64,
        extra_specials: &[String],
    ) -> Result<Self> {
        let mut idx2token = special_tokens::assemble(extra_specials);
        let mut skipped = 0usize;
        for line in reader.lines() {
            let line = line.map_err(|err| TextBatchError::io(err, None))?;
            let mut fields = line.split_whitespace();
            let (token, count) = match (fields.next(), fields.next(), fields.next()) {
                (Some(token), Some(count), None) => (token, count),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let count: i64 = match count.parse() {
                Ok(count) => count,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            if count >= min_occur_cnt {
                idx2token.push(token.to_string());
            }
        }
        if skipped > 0 {
            debug!("skipped {skipped} malformed counts lines");
        }

        let token2idx: FxHashMap<String, usize> = idx2token
            .iter()
            .enumerate()
            .map(|(idx, token)| (token.clone(), idx))
            .collect();
        let padding_idx = token2idx[special_tokens::PAD];
        let unk_idx = token2idx[special_tokens::UNK];
        let bos_idx = token2idx[special_tokens::BOS];
        let eos_idx = token2idx[special_tokens::EOS];
        debug!("built vocabulary of {} tokens", idx2token.len());

        Ok(Self {
            idx2token,
            token2idx,
            padding_idx,
            unk_idx,
            bos_idx,
            eos_idx,
        })
    }

    /// Number of distinct tokens, reserved specials included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.idx2token.len()
    }

    /// Index of the padding token.
    #[must_use]
    pub fn padding_idx(&self) -> usize {
        self.padding_idx
    }

    /// Index of the unknown-token placeholder.
    #[must_use]
    pub fn unk_idx(&self) -> usize {
        self.unk_idx
    }

    /// Index of the begin-of-sequence marker.
    #[must_use]
    pub fn bos_idx(&self) -> usize {
        self.bos_idx
    }

    /// Index of the end-of-sequence marker.
    #[must_use]
    pub fn eos_idx(&self) -> usize {
        self.eos_idx
    }

    /// Returns the index of `token`, or the unknown index when out of vocabulary.
    #[must_use]
    pub fn index_of(&self, token: &str) -> usize {
        self.token2idx.get(token).copied().unwrap_or(self.unk_idx)
    }

    /// Maps a token sequence to indices, sending unknown tokens to the unknown index.
    #[must_use]
    pub fn indices_of<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<i64> {
        tokens
            .iter()
            .map(|token| self.index_of(token.as_ref()) as i64)
            .collect()
    }

    /// Returns the token at `idx`.
    ///
    /// Panics when `idx` is outside `[0, size)`; an out-of-range lookup is a
    /// programming error, not a recoverable condition.
    #[must_use]
    pub fn token_at(&self, idx: usize) -> &str {
        &self.idx2token[idx]
    }

    /// Maps an index sequence back to tokens. Panics on any out-of-range index.
    #[must_use]
    pub fn tokens_at(&self, indices: &[i64]) -> Vec<&str> {
        indices
            .iter()
            .map(|&idx| self.token_at(idx as usize))
            .collect()
    }

    /// Draws a uniformly random token index from `[1, size)`.
    ///
    /// The padding slot occupies index 0 and is excluded by construction,
    /// which is what negative-sampling callers rely on.
    pub fn random_token<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(1..self.size())
    }
}
