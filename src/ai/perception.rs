use burn::prelude::*;
use tracing::debug;

use super::backend::InferBackend;
use super::networks::{PerceptionNetwork, PerceptionNetworkConfig};
use super::preprocess::features_to_tensor;
use crate::checkpoint::CheckpointStore;
use crate::error::{AgentError, CheckpointError};
use crate::game::GroundTruth;

/// The four scalars the perception stack regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerceptionTarget {
    BallX,
    BallY,
    MyY,
    OpponentY,
}

impl PerceptionTarget {
    pub const ALL: [PerceptionTarget; 4] = [
        PerceptionTarget::BallX,
        PerceptionTarget::BallY,
        PerceptionTarget::MyY,
        PerceptionTarget::OpponentY,
    ];

    pub fn index(self) -> usize {
        match self {
            PerceptionTarget::BallX => 0,
            PerceptionTarget::BallY => 1,
            PerceptionTarget::MyY => 2,
            PerceptionTarget::OpponentY => 3,
        }
    }

    /// Checkpoint file holding this regressor's weights.
    pub fn file_name(self) -> &'static str {
        match self {
            PerceptionTarget::BallX => "weights_XNN.mdl",
            PerceptionTarget::BallY => "weights_YNN.mdl",
            PerceptionTarget::MyY => "weights_myYNN.mdl",
            PerceptionTarget::OpponentY => "weights_oppYNN.mdl",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PerceptionTarget::BallX => "ball_x",
            PerceptionTarget::BallY => "ball_y",
            PerceptionTarget::MyY => "my_y",
            PerceptionTarget::OpponentY => "opponent_y",
        }
    }

    /// The supervision value for this target.
    pub fn select(self, truth: &GroundTruth) -> f32 {
        match self {
            PerceptionTarget::BallX => truth.ball_x,
            PerceptionTarget::BallY => truth.ball_y,
            PerceptionTarget::MyY => truth.my_y,
            PerceptionTarget::OpponentY => truth.opponent_y,
        }
    }
}

/// One frame's regressed positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub ball_x: f32,
    pub ball_y: f32,
    pub my_y: f32,
    pub opponent_y: f32,
}

/// Four frozen regressors evaluated together on the same features.
#[derive(Debug)]
pub struct PerceptionStack {
    networks: [PerceptionNetwork<InferBackend>; 4],
    device: <InferBackend as Backend>::Device,
}

impl PerceptionStack {
    /// Freshly initialized regressors.
    pub fn new(config: &PerceptionNetworkConfig, device: &<InferBackend as Backend>::Device) -> Self {
        Self::from_networks(PerceptionTarget::ALL.map(|_| config.init(device)), device)
    }

    /// Networks ordered like [`PerceptionTarget::ALL`].
    pub fn from_networks(
        networks: [PerceptionNetwork<InferBackend>; 4],
        device: &<InferBackend as Backend>::Device,
    ) -> Self {
        PerceptionStack {
            networks,
            device: device.clone(),
        }
    }

    /// Load all four regressors. Any missing, undecodable or wrongly shaped
    /// file is an error.
    pub fn load(
        store: &CheckpointStore,
        config: &PerceptionNetworkConfig,
        device: &<InferBackend as Backend>::Device,
    ) -> Result<Self, CheckpointError> {
        store.require_dir()?;
        let networks = [
            Self::load_one(store, config, device, PerceptionTarget::BallX)?,
            Self::load_one(store, config, device, PerceptionTarget::BallY)?,
            Self::load_one(store, config, device, PerceptionTarget::MyY)?,
            Self::load_one(store, config, device, PerceptionTarget::OpponentY)?,
        ];
        Ok(Self::from_networks(networks, device))
    }

    fn load_one(
        store: &CheckpointStore,
        config: &PerceptionNetworkConfig,
        device: &<InferBackend as Backend>::Device,
        target: PerceptionTarget,
    ) -> Result<PerceptionNetwork<InferBackend>, CheckpointError> {
        let record = store.load_record::<InferBackend, _>(target.file_name(), device)?;
        let network = config.init::<InferBackend>(device).load_record(record);
        if network.input_dim() != config.input_dim {
            return Err(CheckpointError::RecordDecode {
                path: store.path(target.file_name()),
                reason: format!(
                    "network expects {} input features, record has {}",
                    config.input_dim,
                    network.input_dim()
                ),
            });
        }
        debug!(file = target.file_name(), "loaded perception network");
        Ok(network)
    }

    pub fn save(&self, store: &CheckpointStore) -> Result<(), CheckpointError> {
        for (target, network) in PerceptionTarget::ALL.iter().zip(&self.networks) {
            store.save_record::<InferBackend, _>(target.file_name(), network.clone().into_record())?;
        }
        Ok(())
    }

    pub fn network(&self, target: PerceptionTarget) -> &PerceptionNetwork<InferBackend> {
        &self.networks[target.index()]
    }

    pub fn input_dim(&self) -> usize {
        self.networks[0].input_dim()
    }

    /// Regress the four positions from preprocessed features.
    pub fn estimate(&self, features: &[f32]) -> Result<Estimate, AgentError> {
        let expected = self.input_dim();
        if features.len() != expected {
            return Err(AgentError::InputSize {
                expected,
                actual: features.len(),
            });
        }
        let input = features_to_tensor::<InferBackend>(features, 1, &self.device);
        let outputs: Vec<Tensor<InferBackend, 2>> = self
            .networks
            .iter()
            .map(|net| net.forward(input.clone()))
            .collect();
        let values: Vec<f32> = Tensor::cat(outputs, 1)
            .into_data()
            .to_vec()
            .map_err(|e| AgentError::TensorRead(format!("{e:?}")))?;
        Ok(Estimate {
            ball_x: values[0],
            ball_y: values[1],
            my_y: values[2],
            opponent_y: values[3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backend::default_device;

    fn config() -> PerceptionNetworkConfig {
        PerceptionNetworkConfig::new(20).with_hidden_dim(8)
    }

    #[test]
    fn test_file_names() {
        let names: Vec<&str> = PerceptionTarget::ALL.iter().map(|t| t.file_name()).collect();
        assert_eq!(
            names,
            vec!["weights_XNN.mdl", "weights_YNN.mdl", "weights_myYNN.mdl", "weights_oppYNN.mdl"]
        );
    }

    #[test]
    fn test_estimate_rejects_wrong_length() {
        let stack = PerceptionStack::new(&config(), &default_device());
        let err = stack.estimate(&[0.0; 19]).unwrap_err();
        assert!(matches!(err, AgentError::InputSize { expected: 20, actual: 19 }));
    }

    #[test]
    fn test_save_then_load_gives_same_estimates() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = default_device();
        let stack = PerceptionStack::new(&config(), &device);
        stack.save(&store).unwrap();

        let loaded = PerceptionStack::load(&store, &config(), &device).unwrap();
        let features: Vec<f32> = (0..20).map(|i| (i % 3) as f32 / 2.0).collect();
        let a = stack.estimate(&features).unwrap();
        let b = loaded.estimate(&features).unwrap();
        assert!((a.ball_x - b.ball_x).abs() < 1e-6);
        assert!((a.opponent_y - b.opponent_y).abs() < 1e-6);
    }

    #[test]
    fn test_missing_weights_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = default_device();
        PerceptionStack::new(&config(), &device).save(&store).unwrap();
        std::fs::remove_file(store.path("weights_myYNN.mdl")).unwrap();

        let err = PerceptionStack::load(&store, &config(), &device).unwrap_err();
        assert!(matches!(err, CheckpointError::MissingFile(_)), "got: {err}");
    }

    #[test]
    fn test_truncated_weights_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = default_device();
        PerceptionStack::new(&config(), &device).save(&store).unwrap();
        std::fs::write(store.path(PerceptionTarget::BallY.file_name()), b"truncated").unwrap();

        let err = PerceptionStack::load(&store, &config(), &device).unwrap_err();
        assert!(matches!(err, CheckpointError::RecordDecode { .. }), "got: {err}");
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("absent"));
        let err = PerceptionStack::load(&store, &config(), &default_device()).unwrap_err();
        assert!(matches!(err, CheckpointError::DirNotFound(_)));
    }
}
