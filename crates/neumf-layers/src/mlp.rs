//! Feed-forward tower of dense layers.
//!
//! Each step of the tower is `dense -> ReLU -> dropout`. Dropout only acts in
//! [`MLP::forward_train`]; the [`Layer`] forward is the inference path.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::ReLU;
use crate::dense::Dense;
use crate::dropout::Dropout;
use crate::error::{LayerError, LayerResult};
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Shape and regularization of an [`MLP`].
///
/// ```
/// use neumf_layers::mlp::MLPConfig;
///
/// let config = MLPConfig::new(16).add_layer(8).add_layer(4).with_dropout(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLPConfig {
    /// Width of the tower input.
    pub input_dim: usize,
    /// Output width of each step, in order.
    pub widths: Vec<usize>,
    /// Drop probability after every step in training mode.
    pub dropout: f32,
}

impl MLPConfig {
    /// A tower with no steps yet.
    pub fn new(input_dim: usize) -> Self {
        Self {
            input_dim,
            widths: Vec::new(),
            dropout: 0.0,
        }
    }

    /// Appends a step producing `width` features.
    pub fn add_layer(mut self, width: usize) -> Self {
        self.widths.push(width);
        self
    }

    /// Drop probability applied after every step.
    pub fn with_dropout(mut self, p: f32) -> Self {
        self.dropout = p;
        self
    }

    /// Rejects zero widths and a drop probability outside `[0, 1)`.
    pub fn validate(&self) -> LayerResult<()> {
        let bad = |message: String| Err(LayerError::ConfigError { message });
        if self.input_dim == 0 {
            return bad("tower input width is zero".to_string());
        }
        if let Some(i) = self.widths.iter().position(|&w| w == 0) {
            return bad(format!("step {i} has zero width"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return bad(format!("dropout {} is outside [0, 1)", self.dropout));
        }
        Ok(())
    }

    /// Shorthand for [`MLP::from_config`].
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> LayerResult<MLP> {
        MLP::from_config(self, rng)
    }
}

/// Stack of dense layers with activations and shared dropout.
///
/// A config without steps builds the identity, which is how a NeuMF tower
/// listing a single width is represented.
///
/// ```
/// use neumf_layers::mlp::MLPConfig;
/// use neumf_layers::layer::Layer;
/// use neumf_layers::tensor::Tensor;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mlp = MLPConfig::new(8)
///     .add_layer(4)
///     .build(&mut StdRng::seed_from_u64(1))
///     .unwrap();
/// assert_eq!(mlp.forward(&Tensor::ones(&[2, 8])).unwrap().shape(), &[2, 4]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLP {
    layers: Vec<Dense>,
    config: MLPConfig,
    dropout: Dropout,
}

impl MLP {
    /// Validates `config` and draws every layer's weights from `rng` in order.
    pub fn from_config<R: Rng + ?Sized>(config: MLPConfig, rng: &mut R) -> LayerResult<Self> {
        config.validate()?;
        let dropout = Dropout::new(config.dropout)?;

        let mut layers = Vec::with_capacity(config.widths.len());
        let mut fan_in = config.input_dim;
        for &fan_out in &config.widths {
            layers.push(Dense::new(fan_in, fan_out, rng));
            fan_in = fan_out;
        }

        tracing::debug!(
            input_dim = config.input_dim,
            steps = layers.len(),
            dropout = config.dropout,
            "Built MLP"
        );
        Ok(Self {
            layers,
            config,
            dropout,
        })
    }

    /// Wraps already-built dense layers, e.g. ones restored from a checkpoint.
    ///
    /// Layer `i` must map `config` width `i - 1` (or `input_dim`) to width `i`.
    pub fn from_layers(config: MLPConfig, layers: Vec<Dense>) -> LayerResult<Self> {
        config.validate()?;
        let dropout = Dropout::new(config.dropout)?;
        if layers.len() != config.widths.len() {
            return Err(LayerError::ConfigError {
                message: format!(
                    "{} dense layers given for {} tower steps",
                    layers.len(),
                    config.widths.len()
                ),
            });
        }
        let fan_ins = std::iter::once(config.input_dim).chain(config.widths.iter().copied());
        for ((dense, fan_in), &fan_out) in layers.iter().zip(fan_ins).zip(&config.widths) {
            let shape = dense.weights().shape();
            if shape != [fan_in, fan_out] {
                return Err(LayerError::ShapeMismatch {
                    expected: vec![fan_in, fan_out],
                    actual: shape.to_vec(),
                });
            }
        }
        Ok(Self {
            layers,
            config,
            dropout,
        })
    }

    /// Number of dense layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Dense layers in forward order.
    pub fn dense_layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Mutable dense layers, for loading saved parameters.
    pub fn dense_layers_mut(&mut self) -> &mut [Dense] {
        &mut self.layers
    }

    /// The config this tower was built from.
    pub fn config(&self) -> &MLPConfig {
        &self.config
    }

    /// Width of the tower output; the input width when there are no steps.
    pub fn output_dim(&self) -> usize {
        self.layers
            .last()
            .map_or(self.config.input_dim, Dense::out_features)
    }

    fn run(
        &self,
        input: &Tensor,
        mut after_step: impl FnMut(Tensor) -> Tensor,
    ) -> LayerResult<Tensor> {
        self.layers.iter().try_fold(input.clone(), |x, dense| {
            Ok(after_step(ReLU.forward(&dense.forward(&x)?)?))
        })
    }

    /// Training-mode pass: inverted dropout after each step, masks drawn from `rng`.
    pub fn forward_train<R: Rng + ?Sized>(
        &self,
        input: &Tensor,
        rng: &mut R,
    ) -> LayerResult<Tensor> {
        self.run(input, |x| self.dropout.forward_train(&x, rng))
    }
}

impl Layer for MLP {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        self.run(input, |x| x)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        self.layers.iter().flat_map(|d| d.parameters()).collect()
    }

    fn name(&self) -> &str {
        "MLP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        assert!(MLPConfig::new(0).validate().is_err());
        assert!(MLPConfig::new(16).add_layer(0).validate().is_err());
        assert!(MLPConfig::new(8).with_dropout(1.0).validate().is_err());
    }

    #[test]
    fn test_relu_tower_shapes() {
        let mlp = MLPConfig::new(8)
            .add_layer(8)
            .add_layer(4)
            .add_layer(2)
            .build(&mut rng())
            .unwrap();

        assert_eq!(mlp.num_layers(), 3);
        assert_eq!(mlp.output_dim(), 2);
        let out = mlp.forward(&Tensor::ones(&[5, 8])).unwrap();
        assert_eq!(out.shape(), &[5, 2]);
        assert!(out.data().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_no_steps_is_identity() {
        let mlp = MLPConfig::new(6).build(&mut rng()).unwrap();
        let x = Tensor::ones(&[2, 6]);
        assert_eq!(mlp.forward(&x).unwrap(), x);
        assert_eq!(mlp.output_dim(), 6);
        assert_eq!(mlp.num_parameters(), 0);
    }

    #[test]
    fn test_train_without_dropout_matches_inference() {
        let mlp = MLPConfig::new(4).add_layer(3).build(&mut rng())
            .unwrap();
        let x = Tensor::from_data(&[1, 4], vec![0.1, -0.2, 0.3, 0.4]);
        assert_eq!(
            mlp.forward(&x).unwrap(),
            mlp.forward_train(&x, &mut StdRng::seed_from_u64(0)).unwrap()
        );
    }

    #[test]
    fn test_parameter_count() {
        let mlp = MLPConfig::new(8)
            .add_layer(4)
            .add_layer(2)
            .build(&mut rng())
            .unwrap();
        assert_eq!(mlp.num_parameters(), 8 * 4 + 4 + 4 * 2 + 2);
    }

    #[test]
    fn test_from_layers_reuses_weights() {
        let built = MLPConfig::new(4).add_layer(3).add_layer(2).build(&mut rng()).unwrap();
        let config = built.config().clone();
        let rebuilt = MLP::from_layers(config.clone(), built.dense_layers().to_vec()).unwrap();
        let x = Tensor::from_data(&[1, 4], vec![0.3, -0.1, 0.7, 0.2]);
        assert_eq!(built.forward(&x).unwrap(), rebuilt.forward(&x).unwrap());

        let mut swapped = built.dense_layers().to_vec();
        swapped.reverse();
        assert!(matches!(
            MLP::from_layers(config.clone(), swapped),
            Err(LayerError::ShapeMismatch { .. })
        ));
        assert!(MLP::from_layers(config, Vec::new()).is_err());
    }
}
