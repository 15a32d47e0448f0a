//! Padding and next-token batch assembly.
//!
//! Batches are laid out time-major: the leading axis is the sequence
//! position and the trailing axis is the batch index, matching what a
//! recurrent or transformer training step consumes directly.

use ndarray::Array2;

use crate::vocab::Vocab;

/// One padded training batch.
///
/// All three arrays share the shape `(L - 1) x B`, where `L` is the longest
/// sentence in the batch and `B` the number of sentences. Field order keeps
/// the `(target, input, mask)` convention consumers must match.
#[must_use]
#[derive(Debug, Clone)]
pub struct Batch {
    /// Next-token targets: tokens `1..len` of each sentence, padding-filled.
    pub target: Array2<i64>,
    /// Model inputs: tokens `0..len-1` of each sentence, padding-filled.
    pub input: Array2<i64>,
    /// 1.0 at real positions, 0.0 at padding.
    pub mask: Array2<f32>,
}

impl Batch {
    /// Number of time steps (`L - 1`).
    #[must_use]
    pub fn steps(&self) -> usize {
        self.input.nrows()
    }

    /// Number of sentences in the batch.
    #[must_use]
    pub fn width(&self) -> usize {
        self.input.ncols()
    }
}

/// Right-pads index rows into a batch-major `B x L_max` rectangle filled with `fill`.
#[must_use]
pub fn pad_indices(rows: &[Vec<i64>], fill: i64) -> Array2<i64> {
    let max_len = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut padded = Array2::from_elem((rows.len(), max_len), fill);
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            padded[[i, j]] = value;
        }
    }
    padded
}

/// Builds a batch-major 0/1 mask rectangle from per-row real lengths.
#[must_use]
pub fn pad_mask(lengths: &[usize]) -> Array2<f32> {
    let max_len = lengths.iter().copied().max().unwrap_or(0);
    let mut mask = Array2::zeros((lengths.len(), max_len));
    for (i, &len) in lengths.iter().enumerate() {
        for j in 0..len {
            mask[[i, j]] = 1.0;
        }
    }
    mask
}

/// Converts tokenized sentences into a padded `(target, input, mask)` batch.
///
/// Each sentence is split one token apart for next-token prediction: input is
/// `tokens[..len-1]`, target is `tokens[1..]`. Sentences shorter than two
/// tokens contribute an all-padding row. The three rectangles are padded
/// independently (vocabulary padding index for target/input, literal zero for
/// the mask) and transposed into the time-major layout.
pub fn batchify(sentences: &[Vec<String>], vocab: &Vocab) -> Batch {
    let mut target_rows = Vec::with_capacity(sentences.len());
    let mut input_rows = Vec::with_capacity(sentences.len());
    let mut mask_lengths = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let indices = vocab.indices_of(sentence);
        let len = indices.len();
        input_rows.push(indices[..len.saturating_sub(1)].to_vec());
        target_rows.push(if len > 1 {
            indices[1..].to_vec()
        } else {
            Vec::new()
        });
        mask_lengths.push(len.saturating_sub(1));
    }

    let fill = vocab.padding_idx() as i64;
    Batch {
        target: pad_indices(&target_rows, fill).reversed_axes(),
        input: pad_indices(&input_rows, fill).reversed_axes(),
        mask: pad_mask(&mask_lengths).reversed_axes(),
    }
}

/// Renders each batch column of the input array back to whitespace-joined
/// tokens, padding included. Debugging aid for eyeballing streamed batches.
#[must_use]
pub fn batch_to_text(batch: &Batch, vocab: &Vocab) -> Vec<String> {
    (0..batch.width())
        .map(|b| {
            (0..batch.steps())
                .map(|t| vocab.token_at(batch.input[[t, b]] as usize))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
