mod metadata;
mod store;

pub use metadata::{AcHyperparameters, AcTrainingState, CheckpointMetadata, CheckpointMetrics};
pub use store::{
    CheckpointStore, METADATA_FILE, OPTIMIZER_FILE, POLICY_FILE, REWARD_HISTORY_FILE,
    TRAINING_STATE_FILE,
};
