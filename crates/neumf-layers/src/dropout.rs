//! Inverted dropout.
//!
//! In inference the layer is the identity. In training each element is zeroed
//! with probability `p` and survivors are scaled by `1 / (1 - p)`, so the
//! expected activation is unchanged. The RNG is supplied per call; the layer
//! itself holds no mutable state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Dropout regularization layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    /// Probability of an element being zeroed
    p: f32,
}

impl Dropout {
    /// Creates a dropout layer with drop probability `p`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::ConfigError`] unless `p` is in `[0, 1)`.
    pub fn new(p: f32) -> LayerResult<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(LayerError::ConfigError {
                message: format!("Dropout probability must be in [0, 1), got {p}"),
            });
        }
        Ok(Self { p })
    }

    /// Returns the drop probability.
    pub fn probability(&self) -> f32 {
        self.p
    }

    /// Applies training-mode dropout using `rng`.
    pub fn forward_train<R: Rng + ?Sized>(&self, input: &Tensor, rng: &mut R) -> Tensor {
        if self.p == 0.0 {
            return input.clone();
        }
        let scale = 1.0 / (1.0 - self.p);
        let data: Vec<f32> = input
            .data()
            .iter()
            .map(|&x| {
                if rng.gen::<f32>() < self.p {
                    0.0
                } else {
                    x * scale
                }
            })
            .collect();
        Tensor::from_data(input.shape(), data)
    }
}

impl Layer for Dropout {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        Ok(input.clone())
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![]
    }

    fn name(&self) -> &str {
        "Dropout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_invalid_probability() {
        assert!(Dropout::new(1.0).is_err());
        assert!(Dropout::new(-0.1).is_err());
        assert!(Dropout::new(0.0).is_ok());
    }

    #[test]
    fn test_inference_is_identity() {
        let dropout = Dropout::new(0.5).unwrap();
        let x = Tensor::ones(&[4, 4]);
        assert_eq!(dropout.forward(&x).unwrap(), x);
    }

    #[test]
    fn test_training_zeroes_and_scales() {
        let dropout = Dropout::new(0.5).unwrap();
        let x = Tensor::ones(&[32, 32]);
        let y = dropout.forward_train(&x, &mut StdRng::seed_from_u64(11));

        assert!(y.data().iter().all(|&v| v == 0.0 || v == 2.0));
        let zeros = y.data().iter().filter(|&&v| v == 0.0).count();
        assert!(zeros > 0 && zeros < y.numel());
    }

    #[test]
    fn test_training_is_seed_deterministic() {
        let dropout = Dropout::new(0.3).unwrap();
        let x = Tensor::ones(&[8, 8]);
        let a = dropout.forward_train(&x, &mut StdRng::seed_from_u64(5));
        let b = dropout.forward_train(&x, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
