//! The [`Layer`] trait.

use crate::error::LayerResult;
use crate::tensor::Tensor;

/// A building block with an inference-mode forward pass.
///
/// `forward` borrows the layer immutably, and every layer is `Send + Sync`,
/// so a built network can be scored from many threads at once.
///
/// ```
/// use neumf_layers::dense::Dense;
/// use neumf_layers::layer::Layer;
/// use neumf_layers::tensor::Tensor;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let dense = Dense::new(12, 3, &mut StdRng::seed_from_u64(7));
/// let y = dense.forward(&Tensor::zeros(&[5, 12])).unwrap();
/// assert_eq!(y.shape(), &[5, 3]);
/// assert_eq!(dense.num_parameters(), 12 * 3 + 3);
/// ```
pub trait Layer: Send + Sync {
    /// Maps a `[batch, in]` input to the layer's output.
    ///
    /// # Errors
    ///
    /// Fails when the input shape does not fit the layer.
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor>;

    /// Learnable tensors, in a stable order.
    fn parameters(&self) -> Vec<&Tensor>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "Layer"
    }

    /// Scalar count across [`Layer::parameters`].
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.numel()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler {
        scale: Tensor,
    }

    impl Layer for Doubler {
        fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
            Ok(input.map(|x| x * 2.0))
        }

        fn parameters(&self) -> Vec<&Tensor> {
            vec![&self.scale]
        }
    }

    #[test]
    fn test_default_methods() {
        let layer = Doubler {
            scale: Tensor::zeros(&[3, 4]),
        };
        let y = layer.forward(&Tensor::ones(&[1, 2])).unwrap();
        assert_eq!(y.data(), &[2.0, 2.0]);
        assert_eq!(layer.name(), "Layer");
        assert_eq!(layer.num_parameters(), 12);
    }
}
