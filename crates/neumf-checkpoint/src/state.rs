//! In-memory form of a checkpoint.
//!
//! A checkpoint is a flat map of named dense tensors plus string metadata.
//! This crate knows nothing about the model that produced it; the model names
//! its parameters and checks shapes on load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{CheckpointError, Result};

/// Format version written by [`ModelState::new`].
pub const FORMAT_VERSION: u32 = 1;

/// One named parameter: its dimensions and row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorState {
    /// Dimensions.
    pub shape: Vec<usize>,
    /// Row-major values.
    pub data: Vec<f32>,
}

fn check_len(shape: &[usize], len: usize, what: &str) -> Result<()> {
    let want = shape.iter().try_fold(1usize, |n, &d| n.checked_mul(d));
    match want {
        Some(want) if want == len => Ok(()),
        Some(want) => Err(CheckpointError::Corrupted(format!(
            "{what}: shape {shape:?} holds {want} values but {len} were stored"
        ))),
        None => Err(CheckpointError::Corrupted(format!(
            "{what}: shape {shape:?} is too large"
        ))),
    }
}

impl TensorState {
    /// Pairs `shape` with `data`, which must fill it exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        check_len(&shape, data.len(), "tensor")?;
        Ok(Self { shape, data })
    }

    /// Scalar count.
    pub fn numel(&self) -> usize {
        self.data.len()
    }
}

/// Everything persisted for one model snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    /// [`FORMAT_VERSION`] at write time.
    pub version: u32,
    /// Step the snapshot belongs to; also the number in the file name.
    pub global_step: u64,
    /// Seconds since the Unix epoch when the state was created.
    pub timestamp: u64,
    /// Parameters by name; ordered so files are stable across runs.
    pub tensors: BTreeMap<String, TensorState>,
    /// Free-form annotations such as the serialized model config.
    pub metadata: HashMap<String, String>,
}

impl ModelState {
    /// An empty snapshot for `global_step`, stamped with the current time.
    pub fn new(global_step: u64) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self {
            version: FORMAT_VERSION,
            global_step,
            timestamp,
            tensors: BTreeMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Stores `tensor` under `name`, replacing any previous entry.
    pub fn insert_tensor(&mut self, name: impl Into<String>, tensor: TensorState) {
        self.tensors.insert(name.into(), tensor);
    }

    /// The tensor stored under `name`.
    pub fn tensor(&self, name: &str) -> Option<&TensorState> {
        self.tensors.get(name)
    }

    /// Stores a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Scalar count over all tensors.
    pub fn num_parameters(&self) -> usize {
        self.tensors.values().map(TensorState::numel).sum()
    }

    /// Checks the format version and that every tensor's data fills its shape.
    ///
    /// Deserialized states bypass [`TensorState::new`], so checkpointers call
    /// this after every read.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: self.version,
            });
        }
        self.tensors
            .iter()
            .try_for_each(|(name, t)| check_len(&t.shape, t.data.len(), name))
    }
}
