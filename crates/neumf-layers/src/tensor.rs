//! Row-major `f32` tensor.
//!
//! The NeuMF forward pass only ever works on `[batch, features]` matrices and
//! `[features]` bias vectors, so the operations here are the handful it needs:
//! matrix product, row-broadcast bias, elementwise product, column concat and
//! row gather.

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};

/// An owned tensor of `f32` values laid out row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

fn volume(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Element count of `shape`, or `None` if it does not fit in `usize`.
pub fn checked_volume(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |n, &d| n.checked_mul(d))
}

impl Tensor {
    /// A tensor of `shape` with every element set to `value`.
    ///
    /// ```
    /// use neumf_layers::tensor::Tensor;
    ///
    /// let t = Tensor::filled(&[2, 3], 0.5);
    /// assert_eq!(t.numel(), 6);
    /// assert!(t.data().iter().all(|&v| v == 0.5));
    /// ```
    pub fn filled(shape: &[usize], value: f32) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![value; volume(shape)],
        }
    }

    /// All zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, 0.0)
    }

    /// All ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::filled(shape, 1.0)
    }

    /// Wraps `data` as a tensor of `shape`.
    ///
    /// # Panics
    ///
    /// If `data.len()` differs from the volume of `shape`. Data read from disk
    /// goes through [`Tensor::try_from_data`] instead.
    pub fn from_data(shape: &[usize], data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            volume(shape),
            "{} values cannot fill shape {:?}",
            data.len(),
            shape
        );
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Like [`Tensor::from_data`] but reports a length mismatch as an error.
    pub fn try_from_data(shape: &[usize], data: Vec<f32>) -> LayerResult<Self> {
        if checked_volume(shape) != Some(data.len()) {
            return Err(LayerError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: vec![data.len()],
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Dimensions.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of scalars.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Flat row-major view.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the tensor, returning the flat values.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    fn cols(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(0)
    }

    fn require_matrix(&self) -> LayerResult<()> {
        if self.ndim() == 2 {
            Ok(())
        } else {
            Err(LayerError::ShapeMismatch {
                expected: vec![self.shape.first().copied().unwrap_or(0), self.cols()],
                actual: self.shape.clone(),
            })
        }
    }

    /// Row `i` of a matrix.
    ///
    /// # Panics
    ///
    /// If the tensor is not 2D or `i` is past the last row.
    pub fn row(&self, i: usize) -> &[f32] {
        assert_eq!(self.ndim(), 2, "row() on a {}D tensor", self.ndim());
        let width = self.cols();
        &self.data[i * width..(i + 1) * width]
    }

    /// Matrix product `self @ rhs` of `[m, k]` and `[k, n]` matrices.
    pub fn matmul(&self, rhs: &Tensor) -> LayerResult<Tensor> {
        self.require_matrix()?;
        rhs.require_matrix()?;
        let (m, k, n) = (self.shape[0], self.shape[1], rhs.shape[1]);
        if rhs.shape[0] != k {
            return Err(LayerError::ShapeMismatch {
                expected: vec![k, n],
                actual: rhs.shape.clone(),
            });
        }

        // Zero-width chunks are not allowed; an empty side yields an empty loop.
        let mut out = vec![0.0f32; m * n];
        let out_rows = out.chunks_exact_mut(n.max(1));
        for (lhs_row, out_row) in self.data.chunks_exact(k.max(1)).zip(out_rows) {
            for (&a, rhs_row) in lhs_row.iter().zip(rhs.data.chunks_exact(n.max(1))) {
                for (o, &b) in out_row.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }
        Ok(Tensor::from_data(&[m, n], out))
    }

    /// Adds a `[n]` vector to every row of an `[m, n]` matrix.
    pub fn add_row_bias(&self, bias: &Tensor) -> LayerResult<Tensor> {
        self.require_matrix()?;
        if bias.shape != [self.cols()] {
            return Err(LayerError::ShapeMismatch {
                expected: vec![self.cols()],
                actual: bias.shape.clone(),
            });
        }
        let mut data = self.data.clone();
        for row in data.chunks_exact_mut(self.cols().max(1)) {
            for (v, &b) in row.iter_mut().zip(&bias.data) {
                *v += b;
            }
        }
        Ok(Tensor::from_data(&self.shape, data))
    }

    /// Elementwise (Hadamard) product of two tensors of equal shape.
    pub fn mul(&self, other: &Tensor) -> LayerResult<Tensor> {
        if self.shape != other.shape {
            return Err(LayerError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a * b).collect();
        Ok(Tensor::from_data(&self.shape, data))
    }

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor::from_data(&self.shape, self.data.iter().map(|&x| f(x)).collect())
    }

    /// Joins matrices side by side; all must have the same row count.
    ///
    /// ```
    /// use neumf_layers::tensor::Tensor;
    ///
    /// let a = Tensor::from_data(&[2, 1], vec![1.0, 2.0]);
    /// let b = Tensor::from_data(&[2, 2], vec![3.0, 4.0, 5.0, 6.0]);
    /// let c = Tensor::concat_cols(&[&a, &b]).unwrap();
    /// assert_eq!(c.data(), &[1.0, 3.0, 4.0, 2.0, 5.0, 6.0]);
    /// ```
    pub fn concat_cols(parts: &[&Tensor]) -> LayerResult<Tensor> {
        let Some(first) = parts.first() else {
            return Err(LayerError::ConfigError {
                message: "nothing to concatenate".to_string(),
            });
        };
        let rows = first.shape.first().copied().unwrap_or(0);
        for part in parts {
            part.require_matrix()?;
            if part.shape[0] != rows {
                return Err(LayerError::ShapeMismatch {
                    expected: vec![rows, part.cols()],
                    actual: part.shape.clone(),
                });
            }
        }

        let width: usize = parts.iter().map(|p| p.cols()).sum();
        let mut data = Vec::with_capacity(rows * width);
        for i in 0..rows {
            for part in parts {
                data.extend_from_slice(part.row(i));
            }
        }
        Ok(Tensor::from_data(&[rows, width], data))
    }

    /// Copies the listed rows, in order, into a `[indices.len(), cols]` matrix.
    ///
    /// # Panics
    ///
    /// On an index past the last row; callers check indices first.
    pub fn gather_rows(&self, indices: &[usize]) -> Tensor {
        let width = self.cols();
        let mut data = Vec::with_capacity(indices.len() * width);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Tensor::from_data(&[indices.len(), width], data)
    }
}
