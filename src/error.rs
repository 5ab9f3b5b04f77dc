use std::path::PathBuf;

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("checkpoint file not found: {0}")]
    MissingFile(PathBuf),

    #[error("failed to decode record {path}: {reason}")]
    RecordDecode { path: PathBuf, reason: String },

    #[error("failed to encode record for {path}: {reason}")]
    RecordEncode { path: PathBuf, reason: String },

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by an agent while choosing an action.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent '{0}' has no loaded model")]
    NotLoaded(String),

    #[error("failed to read tensor data: {0}")]
    TensorRead(String),

    #[error("observation has {actual} features, network expects {expected}")]
    InputSize { expected: usize, actual: usize },

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("episode ended with an empty trajectory")]
    EmptyEpisode,

    #[error("returns of {len} steps have no spread (std = {std}); cannot standardize")]
    DegenerateReturns { len: usize, std: f32 },

    #[error(
        "trajectory sequences disagree: {log_probs} log-probs, {entropies} entropies, \
         {rewards} rewards, {values} values"
    )]
    TrajectoryMismatch {
        log_probs: usize,
        entropies: usize,
        rewards: usize,
        values: usize,
    },

    #[error("failed to read tensor data: {0}")]
    TensorRead(String),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl TrainingError {
    /// Whether the episode can be skipped and training continued.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            TrainingError::EmptyEpisode | TrainingError::DegenerateReturns { .. }
        )
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
