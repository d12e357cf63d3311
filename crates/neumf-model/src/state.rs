//! Export and import of model parameters as checkpoint state.
//!
//! Tensors are stored under fixed names (`mf_user_embedding`, `mlp.{i}.weight`,
//! `fusion.bias`, ...) and the config is stored as JSON in the metadata so a
//! model can be rebuilt from a checkpoint alone.

use neumf_checkpoint::{CheckpointError, ModelState, TensorState};
use neumf_layers::{Dense, EmbeddingTable, Tensor, MLP};

use crate::config::NeuMFConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::{tower_config, NeuMF, MF_ITEM, MF_USER, MLP_ITEM, MLP_USER};

/// Metadata key holding the JSON-encoded [`NeuMFConfig`].
pub const CONFIG_METADATA_KEY: &str = "neumf.config";

fn to_tensor_state(tensor: &Tensor) -> ModelResult<TensorState> {
    Ok(TensorState::new(
        tensor.shape().to_vec(),
        tensor.data().to_vec(),
    )?)
}

/// Copies the tensor stored under `name`, which must have shape `expected`.
fn stored(state: &ModelState, name: &str, expected: &[usize]) -> ModelResult<Tensor> {
    let Some(saved) = state.tensor(name) else {
        return Err(ModelError::ShapeMismatch {
            what: format!("missing tensor '{name}'"),
            expected: expected.to_vec(),
            actual: Vec::new(),
        });
    };
    if saved.shape != expected {
        return Err(ModelError::ShapeMismatch {
            what: format!("tensor '{name}'"),
            expected: expected.to_vec(),
            actual: saved.shape.clone(),
        });
    }
    Ok(Tensor::try_from_data(&saved.shape, saved.data.clone())?)
}

impl NeuMF {
    /// Every parameter tensor with its checkpoint name, in construction order.
    pub fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = vec![
            (MF_USER.to_string(), self.mf_user.weights()),
            (MF_ITEM.to_string(), self.mf_item.weights()),
            (MLP_USER.to_string(), self.mlp_user.weights()),
            (MLP_ITEM.to_string(), self.mlp_item.weights()),
        ];
        for (i, dense) in self.mlp.dense_layers().iter().enumerate() {
            params.push((format!("mlp.{i}.weight"), dense.weights()));
            params.push((format!("mlp.{i}.bias"), dense.bias()));
        }
        params.push(("fusion.weight".to_string(), self.fusion.weights()));
        params.push(("fusion.bias".to_string(), self.fusion.bias()));
        params
    }

    /// Captures all parameters and the config.
    pub fn to_state(&self, global_step: u64) -> ModelResult<ModelState> {
        let mut state = ModelState::new(global_step);
        for (name, tensor) in self.named_parameters() {
            state.insert_tensor(name, to_tensor_state(tensor)?);
        }
        let config =
            serde_json::to_string(&self.config).map_err(CheckpointError::Serialization)?;
        state.set_metadata(CONFIG_METADATA_KEY, config);
        Ok(state)
    }

    /// Replaces all parameters with the tensors in `state`.
    ///
    /// Every expected tensor is checked for presence and shape before any is
    /// replaced, so a failed load leaves the model untouched. Extra tensors in
    /// `state` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] naming the first missing or
    /// misshapen tensor.
    pub fn load_state(&mut self, state: &ModelState) -> ModelResult<()> {
        let staged = self
            .named_parameters()
            .into_iter()
            .map(|(name, current)| stored(state, &name, current.shape()))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut staged = staged.into_iter();
        let mut next = || {
            staged.next().ok_or_else(|| {
                ModelError::invalid_config("parameter count changed during load")
            })
        };
        self.mf_user.set_weights(next()?)?;
        self.mf_item.set_weights(next()?)?;
        self.mlp_user.set_weights(next()?)?;
        self.mlp_item.set_weights(next()?)?;
        for dense in self.mlp.dense_layers_mut() {
            let weights = next()?;
            let bias = next()?;
            dense.set_parameters(weights, bias)?;
        }
        let weights = next()?;
        let bias = next()?;
        self.fusion.set_parameters(weights, bias)?;

        tracing::info!(
            step = state.global_step,
            parameters = self.num_parameters(),
            "Loaded NeuMF parameters"
        );
        Ok(())
    }

    /// Rebuilds a model from the config stored in `state` and its tensors.
    ///
    /// Every table and layer is taken from `state` after its shape is checked
    /// against the config; nothing is randomly initialized, so a config that
    /// disagrees with the stored tensors fails without allocating for it.
    pub fn from_state(state: &ModelState) -> ModelResult<Self> {
        let raw = state.metadata.get(CONFIG_METADATA_KEY).ok_or_else(|| {
            CheckpointError::Corrupted(format!("missing metadata key '{CONFIG_METADATA_KEY}'"))
        })?;
        let config: NeuMFConfig =
            serde_json::from_str(raw).map_err(CheckpointError::Deserialization)?;
        config.validate()?;

        let (users, items) = (config.user_count, config.item_count);
        let (mf_dim, mlp_dim) = (config.mf_dim, config.mlp_embedding_dim());
        let table = |name: &str, rows: usize, dim: usize| -> ModelResult<EmbeddingTable> {
            Ok(EmbeddingTable::from_weights(stored(state, name, &[rows, dim])?)?)
        };
        let dense = |prefix: &str, fan_in: usize, fan_out: usize| -> ModelResult<Dense> {
            let weights = stored(state, &format!("{prefix}.weight"), &[fan_in, fan_out])?;
            let bias = stored(state, &format!("{prefix}.bias"), &[fan_out])?;
            Ok(Dense::from_parameters(weights, bias)?)
        };

        let mf_user = table(MF_USER, users, mf_dim)?;
        let mf_item = table(MF_ITEM, items, mf_dim)?;
        let mlp_user = table(MLP_USER, users, mlp_dim)?;
        let mlp_item = table(MLP_ITEM, items, mlp_dim)?;
        let hidden = config
            .mlp_layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, w)| dense(&format!("mlp.{i}"), w[0], w[1]))
            .collect::<ModelResult<Vec<_>>>()?;
        let mlp = MLP::from_layers(tower_config(&config), hidden)?;
        let fusion = dense("fusion", config.fusion_input_dim(), 1)?;

        let model = Self {
            config,
            mf_user,
            mf_item,
            mlp_user,
            mlp_item,
            mlp,
            fusion,
        };
        tracing::info!(
            step = state.global_step,
            parameters = model.num_parameters(),
            "Restored NeuMF model"
        );
        Ok(model)
    }
}
