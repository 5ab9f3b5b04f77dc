use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Record, Recorder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CheckpointError;

/// Policy network parameters.
pub const POLICY_FILE: &str = "model.mdl";
/// Optimizer state for the policy network.
pub const OPTIMIZER_FILE: &str = "opt_model.mdl";
pub const METADATA_FILE: &str = "metadata.json";
pub const TRAINING_STATE_FILE: &str = "training_state.json";
pub const REWARD_HISTORY_FILE: &str = "reward_history.json";

/// Named MessagePack, the encoding of burn's default file recorder, kept in
/// memory so every write goes through the tmp-and-rename path.
type FileRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Reads and writes one agent's checkpoint files under an explicit base
/// directory.
///
/// Every write goes to a `.tmp` sibling first and is renamed into place, so
/// an interrupted save never leaves a truncated file behind.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CheckpointStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn exists(&self, file: &str) -> bool {
        self.path(file).is_file()
    }

    /// Fail early when the base directory itself is absent.
    pub fn require_dir(&self) -> Result<(), CheckpointError> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(CheckpointError::DirNotFound(self.dir.clone()))
        }
    }

    /// Decode a burn record from `file`.
    pub fn load_record<B, R>(&self, file: &str, device: &B::Device) -> Result<R, CheckpointError>
    where
        B: Backend,
        R: Record<B>,
    {
        let path = self.path(file);
        if !path.is_file() {
            return Err(CheckpointError::MissingFile(path));
        }
        let bytes = fs::read(&path)?;
        <FileRecorder as Recorder<B>>::load(&FileRecorder::default(), bytes, device).map_err(|e| {
            CheckpointError::RecordDecode {
                path,
                reason: e.to_string(),
            }
        })
    }

    /// Encode a burn record into `file`.
    pub fn save_record<B, R>(&self, file: &str, record: R) -> Result<PathBuf, CheckpointError>
    where
        B: Backend,
        R: Record<B>,
    {
        let path = self.path(file);
        let bytes = <FileRecorder as Recorder<B>>::record(&FileRecorder::default(), record, ())
            .map_err(|e| CheckpointError::RecordEncode {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        self.write_atomic(&path, &bytes)?;
        Ok(path)
    }

    pub fn load_json<T: DeserializeOwned>(&self, file: &str) -> Result<T, CheckpointError> {
        let path = self.path(file);
        let json = fs::read_to_string(&path).map_err(|e| CheckpointError::MetadataRead {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse { path, source: e })
    }

    pub fn save_json<T: Serialize>(&self, file: &str, value: &T) -> Result<PathBuf, CheckpointError> {
        let path = self.path(file);
        let json = serde_json::to_string_pretty(value)?;
        self.write_atomic(&path, json.as_bytes())?;
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::networks::{ActorCriticNetwork, ActorCriticNetworkConfig};
    use burn::backend::NdArray;
    use burn::module::Module;

    type TestBackend = NdArray<f32>;

    fn network() -> ActorCriticNetwork<TestBackend> {
        ActorCriticNetworkConfig::new(6)
            .with_hidden_dim(4)
            .init(&Default::default())
    }

    #[test]
    fn test_record_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let original = network();

        let path = store
            .save_record::<TestBackend, _>(POLICY_FILE, original.clone().into_record())
            .unwrap();
        assert!(path.ends_with(POLICY_FILE));
        assert!(!store.exists("model.mdl.tmp"));

        let record = store
            .load_record::<TestBackend, _>(POLICY_FILE, &Default::default())
            .unwrap();
        let restored = network().load_record(record);
        assert_eq!(original.parameter_snapshot(), restored.parameter_snapshot());
    }

    type PolicyRecord = <ActorCriticNetwork<TestBackend> as Module<TestBackend>>::Record;

    /// Records are not `Debug`, so `unwrap_err` is unavailable.
    fn load_err(store: &CheckpointStore, file: &str) -> CheckpointError {
        match store.load_record::<TestBackend, PolicyRecord>(file, &Default::default()) {
            Ok(_) => panic!("expected {file} to fail to load"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let err = load_err(&store, POLICY_FILE);
        assert!(matches!(err, CheckpointError::MissingFile(_)), "got: {err}");
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(POLICY_FILE), b"not a record").unwrap();
        let store = CheckpointStore::new(dir.path());
        let err = load_err(&store, POLICY_FILE);
        assert!(matches!(err, CheckpointError::RecordDecode { .. }), "got: {err}");
    }

    #[test]
    fn test_truncated_record_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let path = store
            .save_record::<TestBackend, _>(POLICY_FILE, network().into_record())
            .unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = load_err(&store, POLICY_FILE);
        assert!(matches!(err, CheckpointError::RecordDecode { .. }), "got: {err}");
    }

    #[test]
    fn test_json_roundtrip_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested"));
        assert!(store.require_dir().is_err());

        store.save_json(REWARD_HISTORY_FILE, &vec![1.0f32, -10.0]).unwrap();
        store.require_dir().unwrap();
        let loaded: Vec<f32> = store.load_json(REWARD_HISTORY_FILE).unwrap();
        assert_eq!(loaded, vec![1.0, -10.0]);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "{").unwrap();
        let store = CheckpointStore::new(dir.path());
        let err = store.load_json::<Vec<f32>>(METADATA_FILE).unwrap_err();
        assert!(matches!(err, CheckpointError::MetadataParse { .. }));
    }
}
