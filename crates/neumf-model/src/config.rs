//! NeuMF hyperparameters.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Hyperparameters of a NeuMF model.
///
/// The first entry of `mlp_layer_sizes` is the width of the concatenated MLP
/// embedding, so each of the user and item MLP tables gets half of it. Every
/// later entry adds one hidden layer.
///
/// ```
/// use neumf_model::NeuMFConfig;
///
/// let config = NeuMFConfig::new(10, 20, 4, vec![8, 8, 4, 2]).with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.mlp_embedding_dim(), 4);
/// assert_eq!(config.fusion_input_dim(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuMFConfig {
    /// Number of rows in each user embedding table.
    pub user_count: usize,
    /// Number of rows in each item embedding table.
    pub item_count: usize,
    /// Width of the matrix factorization embeddings.
    pub mf_dim: usize,
    /// Widths of the MLP tower, starting with the concatenated embedding width.
    pub mlp_layer_sizes: Vec<usize>,
    /// Drop probability applied after each hidden layer in training mode.
    #[serde(default)]
    pub dropout_probability: f32,
    /// Seed for parameter initialization; `None` draws from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl NeuMFConfig {
    /// Creates a config without dropout or a fixed seed.
    pub fn new(
        user_count: usize,
        item_count: usize,
        mf_dim: usize,
        mlp_layer_sizes: Vec<usize>,
    ) -> Self {
        Self {
            user_count,
            item_count,
            mf_dim,
            mlp_layer_sizes,
            dropout_probability: 0.0,
            seed: None,
        }
    }

    /// Sets the dropout probability.
    pub fn with_dropout(mut self, probability: f32) -> Self {
        self.dropout_probability = probability;
        self
    }

    /// Fixes the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that the hyperparameters describe a buildable model.
    pub fn validate(&self) -> ModelResult<()> {
        if self.user_count == 0 {
            return Err(ModelError::invalid_config("user_count must be positive"));
        }
        if self.item_count == 0 {
            return Err(ModelError::invalid_config("item_count must be positive"));
        }
        if self.mf_dim == 0 {
            return Err(ModelError::invalid_config("mf_dim must be positive"));
        }
        let first = match self.mlp_layer_sizes.first() {
            Some(&first) => first,
            None => {
                return Err(ModelError::invalid_config(
                    "mlp_layer_sizes must not be empty",
                ))
            }
        };
        if let Some(i) = self.mlp_layer_sizes.iter().position(|&w| w == 0) {
            return Err(ModelError::invalid_config(format!(
                "mlp_layer_sizes[{i}] must be positive"
            )));
        }
        if first % 2 != 0 {
            return Err(ModelError::invalid_config(format!(
                "mlp_layer_sizes[0] must be even to split between user and item, got {first}"
            )));
        }
        if !(0.0..1.0).contains(&self.dropout_probability) {
            return Err(ModelError::invalid_config(format!(
                "dropout_probability must be in [0, 1), got {}",
                self.dropout_probability
            )));
        }
        if self.checked_num_parameters().is_none() {
            return Err(ModelError::invalid_config(
                "parameter count does not fit in usize",
            ));
        }
        Ok(())
    }

    /// Scalar parameter count implied by the config, or `None` on overflow.
    pub fn checked_num_parameters(&self) -> Option<usize> {
        let row = self.mf_dim.checked_add(self.mlp_embedding_dim())?;
        let users = self.user_count.checked_mul(row)?;
        let items = self.item_count.checked_mul(row)?;
        let hidden = self.mlp_layer_sizes.windows(2).try_fold(0usize, |n, w| {
            n.checked_add(w[0].checked_mul(w[1])?.checked_add(w[1])?)
        })?;
        let fusion = self
            .mlp_output_dim()
            .checked_add(self.mf_dim)?
            .checked_add(1)?;
        users.checked_add(items)?.checked_add(hidden)?.checked_add(fusion)
    }

    /// Width of each of the user and item MLP embedding tables.
    pub fn mlp_embedding_dim(&self) -> usize {
        self.mlp_layer_sizes.first().map_or(0, |w| w / 2)
    }

    /// Width of the final MLP layer.
    pub fn mlp_output_dim(&self) -> usize {
        self.mlp_layer_sizes.last().copied().unwrap_or(0)
    }

    /// Width of the vector fed to the fusion layer.
    pub fn fusion_input_dim(&self) -> usize {
        self.mlp_output_dim() + self.mf_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NeuMFConfig {
        NeuMFConfig::new(10, 20, 4, vec![8, 8, 4, 2])
    }

    fn assert_invalid(config: NeuMFConfig) {
        assert!(
            matches!(
                config.validate(),
                Err(ModelError::InvalidConfiguration { .. })
            ),
            "expected {config:?} to be rejected"
        );
    }

    #[test]
    fn test_valid_config() {
        assert!(base().validate().is_ok());
        assert!(base().with_dropout(0.5).validate().is_ok());
        assert!(NeuMFConfig::new(1, 1, 1, vec![2]).validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert_invalid(NeuMFConfig::new(10, 20, 4, vec![7, 4]));
        assert_invalid(NeuMFConfig::new(10, 20, 4, vec![]));
        assert_invalid(NeuMFConfig::new(10, 20, 4, vec![8, 0, 2]));
        assert_invalid(NeuMFConfig::new(0, 20, 4, vec![8]));
        assert_invalid(NeuMFConfig::new(10, 0, 4, vec![8]));
        assert_invalid(NeuMFConfig::new(10, 20, 0, vec![8]));
        assert_invalid(base().with_dropout(1.0));
        assert_invalid(base().with_dropout(-0.1));
    }

    #[test]
    fn test_parameter_count_overflow() {
        assert_eq!(base().checked_num_parameters(), Some(240 + 118 + 7));
        assert_invalid(NeuMFConfig::new(usize::MAX / 2, 20, 4, vec![8]));
        assert_invalid(NeuMFConfig::new(10, 20, usize::MAX, vec![8]));
        assert_invalid(NeuMFConfig::new(10, 20, 4, vec![8, usize::MAX - 1]));
    }

    #[test]
    fn test_derived_dims() {
        let config = base();
        assert_eq!(config.mlp_embedding_dim(), 4);
        assert_eq!(config.mlp_output_dim(), 2);
        assert_eq!(config.fusion_input_dim(), 6);
    }

    #[test]
    fn test_json_defaults() {
        let config: NeuMFConfig = serde_json::from_str(
            r#"{"user_count": 3, "item_count": 4, "mf_dim": 2, "mlp_layer_sizes": [4, 2]}"#,
        )
        .unwrap();
        assert_eq!(config.dropout_probability, 0.0);
        assert_eq!(config.seed, None);

        let negative = serde_json::from_str::<NeuMFConfig>(
            r#"{"user_count": -3, "item_count": 4, "mf_dim": 2, "mlp_layer_sizes": [4]}"#,
        );
        assert!(negative.is_err());
    }
}
