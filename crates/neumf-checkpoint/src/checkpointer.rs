//! Writing and reading checkpoint files.
//!
//! Files are named `checkpoint-{step}.{ext}`, so a directory can hold a
//! history of snapshots and [`Checkpointer::latest`] finds the newest one.
//! JSON is readable by hand; bincode is compact and may be gzipped. Every
//! restore validates the decoded state before returning it.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::state::ModelState;
use crate::{CheckpointError, Result};

/// A file format for [`ModelState`].
///
/// ```no_run
/// use neumf_checkpoint::{Checkpointer, JsonCheckpointer, ModelState};
/// use std::path::Path;
///
/// fn main() -> neumf_checkpoint::Result<()> {
///     let json = JsonCheckpointer::pretty();
///     let path = json.checkpoint_path(Path::new("/tmp/neumf"), 12);
///     json.save(&path, &ModelState::new(12))?;
///     assert_eq!(json.restore(&path)?.global_step, 12);
///     Ok(())
/// }
/// ```
pub trait Checkpointer: Send + Sync {
    /// Suffix of the files this format writes, without the leading dot.
    fn extension(&self) -> &'static str;

    /// Writes `state` to `path`, creating parent directories.
    fn save(&self, path: &Path, state: &ModelState) -> Result<()>;

    /// Reads and validates the state at `path`.
    ///
    /// A missing file is [`CheckpointError::NotFound`].
    fn restore(&self, path: &Path) -> Result<ModelState>;

    /// `dir/checkpoint-{step}.{ext}`.
    fn checkpoint_path(&self, dir: &Path, step: u64) -> PathBuf {
        dir.join(format!("checkpoint-{step}.{}", self.extension()))
    }

    /// The file in `dir` with this format's extension and the largest step.
    fn latest(&self, dir: &Path) -> Option<PathBuf> {
        let ext = self.extension();
        std::fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                let step = parse_step(path.file_name()?.to_str()?, ext)?;
                Some((step, path))
            })
            .max_by_key(|&(step, _)| step)
            .map(|(_, path)| path)
    }
}

/// Step number of a `checkpoint-{step}.{extension}` file name.
///
/// ```
/// use neumf_checkpoint::parse_step;
///
/// assert_eq!(parse_step("checkpoint-30.bin.gz", "bin.gz"), Some(30));
/// assert_eq!(parse_step("checkpoint-30.bin.gz", "bin"), None);
/// ```
pub fn parse_step(filename: &str, extension: &str) -> Option<u64> {
    let rest = filename.strip_prefix("checkpoint-")?;
    let digits = rest.strip_suffix(extension)?.strip_suffix('.')?;
    digits.parse().ok()
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(io_at(dir))?;
    }
    std::fs::write(path, bytes).map_err(io_at(path))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote checkpoint file");
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CheckpointError::NotFound(path.to_path_buf()))
        }
        other => other.map_err(io_at(path)),
    }
}

fn accept(path: &Path, state: ModelState) -> Result<ModelState> {
    state.validate()?;
    tracing::info!(
        path = %path.display(),
        step = state.global_step,
        tensors = state.tensors.len(),
        "Restored checkpoint"
    );
    Ok(state)
}

/// Human-readable checkpoints.
#[derive(Debug, Clone, Default)]
pub struct JsonCheckpointer {
    /// Indent the output.
    pub pretty: bool,
}

impl JsonCheckpointer {
    /// Compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Checkpointer for JsonCheckpointer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn save(&self, path: &Path, state: &ModelState) -> Result<()> {
        tracing::info!(path = %path.display(), step = state.global_step, "Saving JSON checkpoint");
        let encode: fn(&ModelState) -> serde_json::Result<Vec<u8>> = if self.pretty {
            serde_json::to_vec_pretty
        } else {
            serde_json::to_vec
        };
        let bytes = encode(state).map_err(CheckpointError::Serialization)?;
        write_file(path, &bytes)
    }

    fn restore(&self, path: &Path) -> Result<ModelState> {
        let bytes = read_file(path)?;
        let state = serde_json::from_slice(&bytes).map_err(CheckpointError::Deserialization)?;
        accept(path, state)
    }
}

/// Gzip setting for [`BincodeCheckpointer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    /// Raw bincode.
    #[default]
    None,
    /// Gzip at the default level.
    Gzip,
    /// Gzip at an explicit level, 0 to 9.
    GzipLevel(u32),
}

impl CompressionType {
    fn level(self) -> Option<Compression> {
        match self {
            Self::None => None,
            Self::Gzip => Some(Compression::default()),
            Self::GzipLevel(level) => Some(Compression::new(level.min(9))),
        }
    }

    /// Whether output is gzipped.
    pub fn is_compressed(&self) -> bool {
        self.level().is_some()
    }
}

/// Compact binary checkpoints.
///
/// Compressed files use the `bin.gz` extension and are only readable by a
/// compressing checkpointer; [`checkpointer_for_path`] picks the right one.
#[derive(Debug, Clone, Default)]
pub struct BincodeCheckpointer {
    compression: CompressionType,
}

impl BincodeCheckpointer {
    /// Uncompressed output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the gzip setting.
    pub fn with_compression(self, compression: CompressionType) -> Self {
        Self { compression }
    }

    /// The gzip setting.
    pub fn compression(&self) -> CompressionType {
        self.compression
    }
}

impl Checkpointer for BincodeCheckpointer {
    fn extension(&self) -> &'static str {
        match self.compression {
            CompressionType::None => "bin",
            _ => "bin.gz",
        }
    }

    fn save(&self, path: &Path, state: &ModelState) -> Result<()> {
        tracing::info!(
            path = %path.display(),
            step = state.global_step,
            compression = ?self.compression,
            "Saving bincode checkpoint"
        );
        let raw = bincode::serialize(state)
            .map_err(|e| CheckpointError::Corrupted(format!("bincode encode: {e}")))?;
        let bytes = match self.compression.level() {
            None => raw,
            Some(level) => {
                let mut gz = GzEncoder::new(Vec::with_capacity(raw.len() / 2), level);
                gz.write_all(&raw).map_err(io_at(path))?;
                gz.finish().map_err(io_at(path))?
            }
        };
        write_file(path, &bytes)
    }

    fn restore(&self, path: &Path) -> Result<ModelState> {
        let mut bytes = read_file(path)?;
        if self.compression.is_compressed() {
            let mut inflated = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut inflated)
                .map_err(io_at(path))?;
            bytes = inflated;
        }
        let state = bincode::deserialize(&bytes)
            .map_err(|e| CheckpointError::Corrupted(format!("bincode decode: {e}")))?;
        accept(path, state)
    }
}

/// The checkpointer matching a file's extension, or `None` if unrecognised.
pub fn checkpointer_for_path(path: &Path) -> Option<Box<dyn Checkpointer>> {
    let name = path.file_name()?.to_str()?;
    let boxed: Box<dyn Checkpointer> = if name.ends_with(".json") {
        Box::new(JsonCheckpointer::new())
    } else if name.ends_with(".bin.gz") {
        Box::new(BincodeCheckpointer::new().with_compression(CompressionType::Gzip))
    } else if name.ends_with(".bin") {
        Box::new(BincodeCheckpointer::new())
    } else {
        return None;
    };
    Some(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TensorState;
    use tempfile::tempdir;

    fn table_state(step: u64) -> ModelState {
        let mut state = ModelState::new(step);
        state.insert_tensor(
            "mf_user_embedding",
            TensorState::new(vec![3, 2], vec![0.5, -0.5, 1.5, -1.5, 2.5, -2.5]).unwrap(),
        );
        state.set_metadata("source", "unit");
        state
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("checkpoint-3.json");

        JsonCheckpointer::new().save(&path, &table_state(3)).unwrap();
        let back = JsonCheckpointer::new().restore(&path).unwrap();

        assert_eq!(back.global_step, 3);
        assert_eq!(back.tensors, table_state(3).tensors);
        assert_eq!(back.metadata["source"], "unit");
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint-0.json");
        JsonCheckpointer::pretty()
            .save(&path, &ModelState::new(0))
            .unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\n  "));
    }

    #[test]
    fn test_unreadable_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint-1.json");
        std::fs::write(&path, b"[1, 2").unwrap();
        assert!(matches!(
            JsonCheckpointer::new().restore(&path),
            Err(CheckpointError::Deserialization(_))
        ));
    }

    #[test]
    fn test_truncated_bincode_is_corrupted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint-1.bin");
        std::fs::write(&path, [1u8, 0, 0]).unwrap();
        assert!(matches!(
            BincodeCheckpointer::new().restore(&path),
            Err(CheckpointError::Corrupted(_))
        ));
    }

    #[test]
    fn test_latest_ignores_other_formats() {
        let dir = tempdir().unwrap();
        let json = JsonCheckpointer::new();
        for step in [20, 5, 60, 35] {
            json.save(&json.checkpoint_path(dir.path(), step), &ModelState::new(step))
                .unwrap();
        }
        BincodeCheckpointer::new()
            .save(&dir.path().join("checkpoint-99.bin"), &ModelState::new(99))
            .unwrap();
        std::fs::write(dir.path().join("checkpoint-x.json"), b"{}").unwrap();

        let latest = json.latest(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap(), "checkpoint-60.json");
    }

    #[test]
    fn test_latest_without_candidates() {
        let dir = tempdir().unwrap();
        assert!(JsonCheckpointer::new().latest(dir.path()).is_none());
        assert!(BincodeCheckpointer::new()
            .latest(&dir.path().join("absent"))
            .is_none());
    }

    #[test]
    fn test_gzip_round_trip_and_naming() {
        let dir = tempdir().unwrap();
        let gz = BincodeCheckpointer::new().with_compression(CompressionType::GzipLevel(9));
        let path = gz.checkpoint_path(dir.path(), 8);
        assert_eq!(path.file_name().unwrap(), "checkpoint-8.bin.gz");

        gz.save(&path, &table_state(8)).unwrap();
        assert_eq!(gz.restore(&path).unwrap().tensors, table_state(8).tensors);
        assert_eq!(gz.latest(dir.path()), Some(path.clone()));

        // Raw bincode reader cannot decode gzip bytes.
        assert!(BincodeCheckpointer::new().restore(&path).is_err());
    }

    #[test]
    fn test_parse_step_variants() {
        assert_eq!(parse_step("checkpoint-0.json", "json"), Some(0));
        assert_eq!(parse_step("checkpoint-12.bin", "bin"), Some(12));
        assert_eq!(parse_step("checkpoint-12.bin", "json"), None);
        assert_eq!(parse_step("ckpt-12.json", "json"), None);
        assert_eq!(parse_step("checkpoint-.json", "json"), None);
    }

    #[test]
    fn test_format_from_extension() {
        let ext = |name: &str| checkpointer_for_path(Path::new(name)).map(|c| c.extension());
        assert_eq!(ext("runs/checkpoint-1.json"), Some("json"));
        assert_eq!(ext("checkpoint-1.bin.gz"), Some("bin.gz"));
        assert_eq!(ext("checkpoint-1.bin"), Some("bin"));
        assert_eq!(ext("notes.txt"), None);
    }
}
