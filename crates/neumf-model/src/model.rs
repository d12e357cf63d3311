//! The NeuMF model: construction and forward inference.
//!
//! A NeuMF model scores a (user, item) pair with two branches that share no
//! parameters:
//!
//! - the matrix factorization branch multiplies the user and item MF
//!   embeddings elementwise;
//! - the MLP branch concatenates the user and item MLP embeddings and runs
//!   them through a ReLU tower.
//!
//! The two branch outputs are concatenated (MLP first) and projected to one
//! logit by the fusion layer.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use neumf_layers::{
    sigmoid, Dense, EmbeddingTable, Initializer, Layer, LayerError, MLPConfig, Tensor, MLP,
};

use crate::config::NeuMFConfig;
use crate::error::{ModelError, ModelResult};

pub(crate) const MF_USER: &str = "mf_user_embedding";
pub(crate) const MF_ITEM: &str = "mf_item_embedding";
pub(crate) const MLP_USER: &str = "mlp_user_embedding";
pub(crate) const MLP_ITEM: &str = "mlp_item_embedding";

/// How dropout behaves during a forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardMode {
    /// Dropout is the identity.
    #[default]
    Inference,
    /// Inverted dropout driven by an RNG seeded from `seed`.
    Training {
        /// Seed for the dropout mask
        seed: u64,
    },
}

/// Neural matrix factorization model.
///
/// Parameters are fixed after construction; the only mutation path is
/// [`NeuMF::load_state`]. Forward calls take `&self`, so one model can be
/// shared across threads.
///
/// # Example
///
/// ```
/// use neumf_model::{NeuMF, NeuMFConfig};
///
/// let model = NeuMF::new(NeuMFConfig::new(10, 20, 4, vec![8, 8, 4, 2]).with_seed(0)).unwrap();
/// let scores = model.predict(&[0, 1, 2], &[5, 6, 7]).unwrap();
/// assert_eq!(scores.len(), 3);
/// assert!(scores.iter().all(|&s| s > 0.0 && s < 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct NeuMF {
    pub(crate) config: NeuMFConfig,
    pub(crate) mf_user: EmbeddingTable,
    pub(crate) mf_item: EmbeddingTable,
    pub(crate) mlp_user: EmbeddingTable,
    pub(crate) mlp_item: EmbeddingTable,
    pub(crate) mlp: MLP,
    pub(crate) fusion: Dense,
}

impl NeuMF {
    /// Builds a model with freshly initialized parameters.
    ///
    /// Parameters are drawn from one RNG in a fixed order: MF user, MF item,
    /// MLP user, MLP item, hidden layers, fusion layer. With `config.seed` set
    /// the result is reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] if `config` fails validation.
    pub fn new(config: NeuMFConfig) -> ModelResult<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let embed = Initializer::LecunUniform;
        let mlp_dim = config.mlp_embedding_dim();
        let mf_user = EmbeddingTable::new(config.user_count, config.mf_dim, embed, &mut rng);
        let mf_item = EmbeddingTable::new(config.item_count, config.mf_dim, embed, &mut rng);
        let mlp_user = EmbeddingTable::new(config.user_count, mlp_dim, embed, &mut rng);
        let mlp_item = EmbeddingTable::new(config.item_count, mlp_dim, embed, &mut rng);

        let mlp = tower_config(&config)
            .build(&mut rng)
            .map_err(|e| ModelError::invalid_config(e.to_string()))?;

        let fusion = Dense::new(config.fusion_input_dim(), 1, &mut rng);

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
            users = model.config.user_count,
            items = model.config.item_count,
            mf_dim = model.config.mf_dim,
            mlp_layers = ?model.config.mlp_layer_sizes,
            parameters = model.num_parameters(),
            "Built NeuMF model"
        );
        Ok(model)
    }

    /// Returns the configuration the model was built from.
    pub fn config(&self) -> &NeuMFConfig {
        &self.config
    }

    /// Width of the concatenated `[mlp_output, mf_vector]` fusion input.
    pub fn fusion_input_dim(&self) -> usize {
        self.fusion.in_features()
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        [&self.mf_user, &self.mf_item, &self.mlp_user, &self.mlp_item]
            .iter()
            .map(|t| t.weights().numel())
            .sum::<usize>()
            + self.mlp.num_parameters()
            + self.fusion.num_parameters()
    }

    /// Scores each `(users[i], items[i])` pair.
    ///
    /// Returns one value per pair in input order: a probability when
    /// `apply_sigmoid` is set, otherwise the raw logit. All inputs are
    /// validated before any computation.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ShapeMismatch`] if the two slices differ in length.
    /// - [`ModelError::OutOfRange`] for an index outside its table.
    pub fn forward(
        &self,
        users: &[i64],
        items: &[i64],
        apply_sigmoid: bool,
        mode: ForwardMode,
    ) -> ModelResult<Vec<f32>> {
        let _span = tracing::info_span!("neumf_forward", batch = users.len(), ?mode).entered();

        let (user_rows, item_rows) = self.check_batch(users, items)?;
        if user_rows.is_empty() {
            return Ok(Vec::new());
        }

        let mf_vector = self
            .mf_user
            .weights()
            .gather_rows(&user_rows)
            .mul(&self.mf_item.weights().gather_rows(&item_rows))?;

        let mlp_vector = Tensor::concat_cols(&[
            &self.mlp_user.weights().gather_rows(&user_rows),
            &self.mlp_item.weights().gather_rows(&item_rows),
        ])?;

        let mlp_output = match mode {
            ForwardMode::Inference => self.mlp.forward(&mlp_vector)?,
            ForwardMode::Training { seed } => self
                .mlp
                .forward_train(&mlp_vector, &mut StdRng::seed_from_u64(seed))?,
        };

        let fusion_vector = Tensor::concat_cols(&[&mlp_output, &mf_vector])?;
        let logits = self.fusion.forward(&fusion_vector)?.into_data();

        tracing::debug!(batch = logits.len(), apply_sigmoid, "Scored batch");
        Ok(if apply_sigmoid {
            logits.into_iter().map(sigmoid).collect()
        } else {
            logits
        })
    }

    /// Inference-mode forward with sigmoid.
    pub fn predict(&self, users: &[i64], items: &[i64]) -> ModelResult<Vec<f32>> {
        self.forward(users, items, true, ForwardMode::Inference)
    }

    /// Same result as [`NeuMF::predict`], scoring `chunk_size` pairs per rayon task.
    pub fn predict_parallel(
        &self,
        users: &[i64],
        items: &[i64],
        chunk_size: usize,
    ) -> ModelResult<Vec<f32>> {
        self.forward_parallel(users, items, true, chunk_size)
    }

    /// Inference-mode [`NeuMF::forward`] over `chunk_size`-pair rayon tasks.
    ///
    /// The whole batch is validated before any chunk is scored, and results
    /// are concatenated in input order.
    pub fn forward_parallel(
        &self,
        users: &[i64],
        items: &[i64],
        apply_sigmoid: bool,
        chunk_size: usize,
    ) -> ModelResult<Vec<f32>> {
        if chunk_size == 0 {
            return Err(ModelError::invalid_config("chunk_size must be positive"));
        }
        self.check_batch(users, items)?;

        let chunks = users
            .par_chunks(chunk_size)
            .zip(items.par_chunks(chunk_size))
            .map(|(u, i)| self.forward(u, i, apply_sigmoid, ForwardMode::Inference))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(chunks.into_iter().flatten().collect())
    }

    /// Validates batch lengths and indices, returning row offsets for both sides.
    fn check_batch(&self, users: &[i64], items: &[i64]) -> ModelResult<(Vec<usize>, Vec<usize>)> {
        if users.len() != items.len() {
            return Err(ModelError::ShapeMismatch {
                what: "item indices".to_string(),
                expected: vec![users.len()],
                actual: vec![items.len()],
            });
        }
        // MF and MLP tables on the same side always have equal row counts.
        let user_rows = rows_for(&self.mf_user, "user embedding", users)?;
        let item_rows = rows_for(&self.mf_item, "item embedding", items)?;
        Ok((user_rows, item_rows))
    }
}

/// ReLU tower over the concatenated MLP embeddings.
pub(crate) fn tower_config(config: &NeuMFConfig) -> MLPConfig {
    config.mlp_layer_sizes[1..]
        .iter()
        .fold(MLPConfig::new(config.mlp_layer_sizes[0]), |mlp, &width| {
            mlp.add_layer(width)
        })
        .with_dropout(config.dropout_probability)
}

fn rows_for(
    table: &EmbeddingTable,
    name: &'static str,
    indices: &[i64],
) -> ModelResult<Vec<usize>> {
    table.check_indices(indices).map_err(|e| match e {
        LayerError::IndexOutOfRange { index, count } => ModelError::OutOfRange {
            table: name,
            index,
            count,
        },
        other => ModelError::Layer(other),
    })
}
