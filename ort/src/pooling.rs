//! Reducing per-token hidden states to one sentence vector.

use ndarray::{ArrayView2, Axis};

/// How token hidden states become a single embedding.
///
/// Sentence-transformer encoders such as `all-MiniLM-L6-v2` are trained with
/// [`Mean`](PoolingStrategy::Mean) pooling, which is the default. Decoder-style
/// embedding models use [`LastToken`](PoolingStrategy::LastToken).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// Average of the non-padding tokens.
    #[default]
    Mean,
    /// Hidden state of the first token (`[CLS]`).
    Cls,
    /// Hidden state of the last non-padding token.
    LastToken,
}

impl PoolingStrategy {
    /// Pools one sequence.
    ///
    /// `hidden_states` is `[seq_len, hidden_dim]`; `attention_mask` marks real tokens
    /// with 1 and padding with 0. A sequence with no real tokens pools to zeros.
    #[must_use]
    pub fn apply(self, hidden_states: &ArrayView2<'_, f32>, attention_mask: &[u32]) -> Vec<f32> {
        let hidden_dim = hidden_states.len_of(Axis(1));
        let real = |position: usize| attention_mask.get(position).is_some_and(|&m| m != 0);

        match self {
            Self::Mean => {
                let mut sum = vec![0.0f32; hidden_dim];
                let mut count = 0u32;
                for (position, row) in hidden_states.axis_iter(Axis(0)).enumerate() {
                    if real(position) {
                        count += 1;
                        for (acc, value) in sum.iter_mut().zip(row) {
                            *acc += value;
                        }
                    }
                }
                if count > 0 {
                    #[allow(clippy::cast_precision_loss)]
                    let count = count as f32;
                    sum.iter_mut().for_each(|value| *value /= count);
                }
                sum
            }
            Self::Cls => row_or_zeros(hidden_states, Some(0), hidden_dim),
            Self::LastToken => {
                let last = (0..hidden_states.len_of(Axis(0))).rev().find(|&p| real(p));
                row_or_zeros(hidden_states, last, hidden_dim)
            }
        }
    }
}

fn row_or_zeros(hidden_states: &ArrayView2<'_, f32>, row: Option<usize>, dim: usize) -> Vec<f32> {
    row.filter(|&r| r < hidden_states.len_of(Axis(0)))
        .map_or_else(|| vec![0.0; dim], |r| hidden_states.row(r).to_vec())
}

/// Scales `vector` to unit length. Zero vectors are left alone.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|value| *value /= norm);
    }
}
