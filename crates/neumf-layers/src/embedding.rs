//! Dense embedding table.
//!
//! An [`EmbeddingTable`] maps a row index in `[0, count)` to a learned vector.
//! Unlike a hash-backed lookup there is no default row: an index outside the
//! table is an error.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// A `[count, dim]` matrix of embedding rows.
///
/// # Example
///
/// ```
/// use neumf_layers::embedding::EmbeddingTable;
/// use neumf_layers::initializer::Initializer;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let table = EmbeddingTable::new(10, 4, Initializer::LecunUniform, &mut StdRng::seed_from_u64(0));
/// let rows = table.lookup(&[3, 0, 3]).unwrap();
/// assert_eq!(rows.shape(), &[3, 4]);
/// assert!(table.lookup(&[10]).is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingTable {
    /// Row-major weights of shape [count, dim]
    weights: Tensor,
}

impl EmbeddingTable {
    /// Creates a table with `count` rows of width `dim`.
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        dim: usize,
        initializer: Initializer,
        rng: &mut R,
    ) -> Self {
        Self {
            weights: initializer.initialize(&[count, dim], rng),
        }
    }

    /// Wraps an existing `[count, dim]` weight matrix.
    pub fn from_weights(weights: Tensor) -> LayerResult<Self> {
        if weights.ndim() != 2 {
            return Err(LayerError::ConfigError {
                message: format!("Embedding weights must be 2D, got {}D", weights.ndim()),
            });
        }
        Ok(Self { weights })
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.weights.shape()[0]
    }

    /// Embedding width.
    pub fn dim(&self) -> usize {
        self.weights.shape()[1]
    }

    /// Returns the weight matrix.
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    /// Replaces the weight matrix; the shape must match exactly.
    pub fn set_weights(&mut self, weights: Tensor) -> LayerResult<()> {
        if weights.shape() != self.weights.shape() {
            return Err(LayerError::ShapeMismatch {
                expected: self.weights.shape().to_vec(),
                actual: weights.shape().to_vec(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Converts external indices to row offsets, failing on the first one
    /// outside `[0, count)`.
    pub fn check_indices(&self, indices: &[i64]) -> LayerResult<Vec<usize>> {
        let count = self.count();
        indices
            .iter()
            .map(|&index| {
                usize::try_from(index)
                    .ok()
                    .filter(|&i| i < count)
                    .ok_or(LayerError::IndexOutOfRange { index, count })
            })
            .collect()
    }

    /// Looks up one row per index, preserving order.
    pub fn lookup(&self, indices: &[i64]) -> LayerResult<Tensor> {
        let rows = self.check_indices(indices)?;
        Ok(self.weights.gather_rows(&rows))
    }
}

impl Layer for EmbeddingTable {
    /// Treats each element of `input` as a row index.
    ///
    /// Fractional and non-finite values are rejected rather than truncated.
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        let indices = input
            .data()
            .iter()
            .map(|&value| {
                if value.is_finite() && value.fract() == 0.0 {
                    Ok(value as i64)
                } else {
                    Err(LayerError::InvalidIndex { value })
                }
            })
            .collect::<LayerResult<Vec<i64>>>()?;
        self.lookup(&indices)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weights]
    }

    fn name(&self) -> &str {
        "EmbeddingTable"
    }
}
