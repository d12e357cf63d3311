//! Fully connected layer `y = x W + b`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Affine map from `in_features` to `out_features`.
///
/// `weights` is `[in_features, out_features]` and `bias` is `[out_features]`;
/// both shapes are fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    weights: Tensor,
    bias: Tensor,
}

impl Dense {
    /// Glorot-uniform weights and a zero bias.
    ///
    /// ```
    /// use neumf_layers::dense::Dense;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let layer = Dense::new(6, 1, &mut StdRng::seed_from_u64(0));
    /// assert_eq!(layer.weights().shape(), &[6, 1]);
    /// assert!(layer.bias().data().iter().all(|&b| b == 0.0));
    /// ```
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        Self::with_initializers(
            in_features,
            out_features,
            Initializer::GlorotUniform,
            Initializer::Zeros,
            rng,
        )
    }

    /// Draws weights and bias from the given schemes.
    pub fn with_initializers<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        weight_init: Initializer,
        bias_init: Initializer,
        rng: &mut R,
    ) -> Self {
        Self {
            weights: weight_init.initialize(&[in_features, out_features], rng),
            bias: bias_init.initialize(&[out_features], rng),
        }
    }

    /// Wraps existing `[in, out]` weights and an `[out]` bias.
    pub fn from_parameters(weights: Tensor, bias: Tensor) -> LayerResult<Self> {
        let [_, out] = weights.shape() else {
            return Err(LayerError::ConfigError {
                message: format!("dense weights must be 2D, got shape {:?}", weights.shape()),
            });
        };
        if bias.shape() != [*out] {
            return Err(LayerError::ShapeMismatch {
                expected: vec![*out],
                actual: bias.shape().to_vec(),
            });
        }
        Ok(Self { weights, bias })
    }

    /// Fan-in.
    pub fn in_features(&self) -> usize {
        self.weights.shape()[0]
    }

    /// Fan-out.
    pub fn out_features(&self) -> usize {
        self.weights.shape()[1]
    }

    /// `[in_features, out_features]` weight matrix.
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    /// `[out_features]` bias.
    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    /// Swaps in new weights and bias of the same shapes as the current ones.
    ///
    /// Nothing is replaced unless both shapes match.
    pub fn set_parameters(&mut self, weights: Tensor, bias: Tensor) -> LayerResult<()> {
        for (new, old) in [(&weights, &self.weights), (&bias, &self.bias)] {
            if new.shape() != old.shape() {
                return Err(LayerError::ShapeMismatch {
                    expected: old.shape().to_vec(),
                    actual: new.shape().to_vec(),
                });
            }
        }
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }
}

impl Layer for Dense {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        if input.ndim() == 2 && input.shape()[1] != self.in_features() {
            return Err(LayerError::InvalidInputDimension {
                expected: self.in_features(),
                actual: input.shape()[1],
            });
        }
        input.matmul(&self.weights)?.add_row_bias(&self.bias)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weights, &self.bias]
    }

    fn name(&self) -> &str {
        "Dense"
    }
}
