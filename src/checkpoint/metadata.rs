use serde::{Deserialize, Serialize};

/// Hyperparameters recorded alongside a saved policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcHyperparameters {
    pub learning_rate: f64,
    pub gamma: f32,
    pub actor_coeff: f32,
    pub critic_coeff: f32,
    pub entropy_coeff: f32,
    pub hidden_dim: usize,
    pub input_dim: usize,
}

/// Metrics snapshot at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub episodes: usize,
    pub average_reward: f32,
    pub last_loss: Option<f32>,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub timestamp: u64,
    pub algorithm: String,
    pub policy_input: String,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: AcHyperparameters,
}

/// Counters restored on `--resume`, written to training_state.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcTrainingState {
    pub episode_count: usize,
    pub update_count: usize,
    #[serde(default)]
    pub skipped_updates: usize,
}
