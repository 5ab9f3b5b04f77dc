use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{GradientsParams, Optimizer, RmsProp, RmsPropConfig};
use burn::prelude::*;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::ai::agent::{PongAgent, UpdateMetrics};
use crate::ai::backend::{default_device, InferBackend, TrainBackend};
use crate::ai::distribution::{ActionSelection, PolicyStep};
use crate::ai::networks::{ActorCriticNetwork, ActorCriticNetworkConfig, PerceptionNetworkConfig};
use crate::ai::perception::PerceptionStack;
use crate::ai::preprocess::preprocess_frame;
use crate::ai::state::{StateBuilder, StateVector, STATE_DIM};
use crate::checkpoint::{
    AcHyperparameters, AcTrainingState, CheckpointMetadata, CheckpointMetrics, CheckpointStore,
    METADATA_FILE, OPTIMIZER_FILE, POLICY_FILE, TRAINING_STATE_FILE,
};
use crate::error::{AgentError, CheckpointError, TrainingError};
use crate::game::{Action, Frame};
use crate::training::returns::{advantages, discount_returns, normalize_returns};
use crate::training::trajectory::Trajectory;

/// What the policy network sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyInput {
    /// The six regressed positions.
    #[default]
    Positions,
    /// The preprocessed frame itself; the perception networks are unused.
    Pixels,
}

/// Actor-critic hyperparameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ActorCriticConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub actor_coeff: f32,
    pub critic_coeff: f32,
    /// Signed: positive values penalize entropy, negative values reward it.
    pub entropy_coeff: f32,
    pub hidden_dim: usize,
    pub rmsprop_alpha: f32,
    pub rmsprop_epsilon: f32,
    pub action_selection: ActionSelection,
    pub policy_input: PolicyInput,
    /// When false, an undecodable policy record keeps the fresh weights.
    pub strict_load: bool,
    pub seed: Option<u64>,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        ActorCriticConfig {
            learning_rate: 5e-4,
            gamma: 0.98,
            actor_coeff: 1.0,
            critic_coeff: 1.0,
            entropy_coeff: 0.05,
            hidden_dim: 64,
            rmsprop_alpha: 0.99,
            rmsprop_epsilon: 1e-8,
            action_selection: ActionSelection::Greedy,
            policy_input: PolicyInput::Positions,
            strict_load: true,
            seed: None,
        }
    }
}

type PolicyNetwork = ActorCriticNetwork<TrainBackend>;
type PolicyOptimizer = OptimizerAdaptor<RmsProp, PolicyNetwork, TrainBackend>;

/// Monte-Carlo actor-critic agent acting on regressed positions (or raw
/// features), updated once per finished episode.
pub struct ActorCriticAgent {
    network: PolicyNetwork,
    optimizer: PolicyOptimizer,
    perception: Option<PerceptionStack>,
    perception_config: PerceptionNetworkConfig,
    state_builder: StateBuilder,
    last_state: Option<StateVector>,
    checkpoint: Option<CheckpointStore>,
    config: ActorCriticConfig,
    device: <TrainBackend as Backend>::Device,
    name: String,
    episode_count: usize,
    update_count: usize,
    skipped_updates: usize,
    rng: StdRng,
}

impl ActorCriticAgent {
    /// A freshly initialized policy. `perception_config.input_dim` is the
    /// preprocessed frame length.
    pub fn new(config: ActorCriticConfig, perception_config: PerceptionNetworkConfig) -> Self {
        let device = default_device();
        let network = Self::network_config(&config, &perception_config).init(&device);
        let optimizer = Self::optimizer_config(&config).init();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        ActorCriticAgent {
            network,
            optimizer,
            perception: None,
            perception_config,
            state_builder: StateBuilder::new(),
            last_state: None,
            checkpoint: None,
            config,
            device,
            name: "ActorCritic".to_string(),
            episode_count: 0,
            update_count: 0,
            skipped_updates: 0,
            rng,
        }
    }

    pub fn with_perception(mut self, perception: PerceptionStack) -> Self {
        self.perception = Some(perception);
        self
    }

    /// Directory `load_model` reads from.
    pub fn with_checkpoint(mut self, store: CheckpointStore) -> Self {
        self.name = format!("ActorCritic({})", store.dir().display());
        self.checkpoint = Some(store);
        self
    }

    fn network_config(
        config: &ActorCriticConfig,
        perception_config: &PerceptionNetworkConfig,
    ) -> ActorCriticNetworkConfig {
        let input_dim = match config.policy_input {
            PolicyInput::Positions => STATE_DIM,
            PolicyInput::Pixels => perception_config.input_dim,
        };
        ActorCriticNetworkConfig::new(input_dim).with_hidden_dim(config.hidden_dim)
    }

    fn optimizer_config(config: &ActorCriticConfig) -> RmsPropConfig {
        RmsPropConfig::new()
            .with_alpha(config.rmsprop_alpha)
            .with_epsilon(config.rmsprop_epsilon)
    }

    pub fn config(&self) -> &ActorCriticConfig {
        &self.config
    }

    pub fn network(&self) -> &ActorCriticNetwork<TrainBackend> {
        &self.network
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn update_count(&self) -> usize {
        self.update_count
    }

    pub fn skipped_updates(&self) -> usize {
        self.skipped_updates
    }

    /// State vector built on the most recent step, if any.
    pub fn last_state(&self) -> Option<StateVector> {
        self.last_state
    }

    fn require_checkpoint(&self) -> Result<&CheckpointStore, AgentError> {
        self.checkpoint
            .as_ref()
            .ok_or_else(|| AgentError::NotLoaded(self.name.clone()))
    }

    /// Load the four perception regressors from the checkpoint directory.
    pub fn load_perception(&mut self) -> Result<(), AgentError> {
        let store = self.require_checkpoint()?;
        let stack = PerceptionStack::load(store, &self.perception_config, &self.device)?;
        self.perception = Some(stack);
        Ok(())
    }

    /// Restore policy weights, optimizer state and counters.
    ///
    /// Returns whether the saved policy was adopted. Missing files are always
    /// errors; an incompatible record is an error only with `strict_load`.
    pub fn load_policy(&mut self) -> Result<bool, AgentError> {
        let store = self.require_checkpoint()?.clone();
        let expected = Self::network_config(&self.config, &self.perception_config).input_dim;

        let record = match store.load_record::<TrainBackend, _>(POLICY_FILE, &self.device) {
            Ok(record) => record,
            Err(err @ CheckpointError::RecordDecode { .. }) if !self.config.strict_load => {
                warn!(error = %err, "policy record incompatible, keeping fresh weights");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };
        let fresh = Self::network_config(&self.config, &self.perception_config).init(&self.device);
        let network = fresh.load_record(record);
        if network.input_dim() != expected {
            let err = CheckpointError::RecordDecode {
                path: store.path(POLICY_FILE),
                reason: format!(
                    "policy expects {expected} inputs, record has {}",
                    network.input_dim()
                ),
            };
            if self.config.strict_load {
                return Err(err.into());
            }
            warn!(error = %err, "policy record incompatible, keeping fresh weights");
            return Ok(false);
        }

        let opt_record = store.load_record::<TrainBackend, _>(OPTIMIZER_FILE, &self.device)?;
        self.optimizer = Self::optimizer_config(&self.config).init().load_record(opt_record);
        self.network = network;

        if store.exists(TRAINING_STATE_FILE) {
            let state: AcTrainingState = store.load_json(TRAINING_STATE_FILE)?;
            self.episode_count = state.episode_count;
            self.update_count = state.update_count;
            self.skipped_updates = state.skipped_updates;
        }
        debug!(dir = %store.dir().display(), episodes = self.episode_count, "loaded policy");
        Ok(true)
    }

    /// Write policy, optimizer, counters and metadata into `store`.
    pub fn save(
        &self,
        store: &CheckpointStore,
        metrics: CheckpointMetrics,
    ) -> Result<PathBuf, CheckpointError> {
        store.save_record::<TrainBackend, _>(POLICY_FILE, self.network.clone().into_record())?;
        store.save_record::<TrainBackend, _>(OPTIMIZER_FILE, self.optimizer.to_record())?;
        store.save_json(
            TRAINING_STATE_FILE,
            &AcTrainingState {
                episode_count: self.episode_count,
                update_count: self.update_count,
                skipped_updates: self.skipped_updates,
            },
        )?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let metadata = CheckpointMetadata {
            timestamp,
            algorithm: "actor-critic".to_string(),
            policy_input: match self.config.policy_input {
                PolicyInput::Positions => "positions".to_string(),
                PolicyInput::Pixels => "pixels".to_string(),
            },
            metrics,
            hyperparameters: AcHyperparameters {
                learning_rate: self.config.learning_rate,
                gamma: self.config.gamma,
                actor_coeff: self.config.actor_coeff,
                critic_coeff: self.config.critic_coeff,
                entropy_coeff: self.config.entropy_coeff,
                hidden_dim: self.config.hidden_dim,
                input_dim: self.network.input_dim(),
            },
        };
        store.save_json(METADATA_FILE, &metadata)?;
        Ok(store.dir().to_path_buf())
    }

    /// Turn an observation into the policy's input vector.
    fn policy_input(&mut self, frame: &Frame) -> Result<Vec<f32>, AgentError> {
        let features = preprocess_frame(frame);
        match self.config.policy_input {
            PolicyInput::Pixels => {
                let expected = self.network.input_dim();
                if features.len() != expected {
                    return Err(AgentError::InputSize {
                        expected,
                        actual: features.len(),
                    });
                }
                Ok(features)
            }
            PolicyInput::Positions => {
                let perception = self
                    .perception
                    .as_ref()
                    .ok_or_else(|| AgentError::NotLoaded(self.name.clone()))?;
                let estimate = perception.estimate(&features)?;
                let state = self.state_builder.build(estimate);
                self.last_state = Some(state);
                Ok(state.to_array().to_vec())
            }
        }
    }

    /// Act during training: one forward pass on the autodiff backend, with
    /// log-prob, entropy and value recorded into `trajectory`.
    pub fn act_train(
        &mut self,
        frame: &Frame,
        trajectory: &mut Trajectory<TrainBackend>,
    ) -> Result<Action, AgentError> {
        let input = self.policy_input(frame)?;
        let n = input.len();
        let input = Tensor::<TrainBackend, 1>::from_data(TensorData::from(input.as_slice()), &self.device)
            .reshape([1, n]);
        let (logits, value) = self.network.forward(input);
        let step = PolicyStep::new(logits, value);

        let action = step.select(self.config.action_selection, &mut self.rng)?;
        trajectory.push_step(step.log_prob(action), step.entropy(), step.value());
        Ok(action)
    }

    /// One Monte-Carlo update from a finished episode.
    ///
    /// Empty episodes and episodes whose returns cannot be standardized leave
    /// the parameters untouched and return a skippable error.
    pub fn update(&mut self, trajectory: Trajectory<TrainBackend>) -> Result<UpdateMetrics, TrainingError> {
        let len = trajectory.check_aligned()?;
        self.episode_count += 1;
        if len == 0 {
            self.skipped_updates += 1;
            return Err(TrainingError::EmptyEpisode);
        }

        let (log_probs, entropies, values, rewards) = trajectory.into_parts();
        let returns = discount_returns(&rewards, self.config.gamma);
        let normalized = match normalize_returns(&returns) {
            Ok(normalized) => normalized,
            Err(err) => {
                self.skipped_updates += 1;
                return Err(err);
            }
        };

        let log_probs = Tensor::cat(log_probs, 0);
        let entropies = Tensor::cat(entropies, 0);
        let values = Tensor::cat(values, 0);
        let value_estimates: Vec<f32> = values
            .clone()
            .into_data()
            .to_vec()
            .map_err(|e| TrainingError::TensorRead(format!("{e:?}")))?;

        // The actor is weighted by a constant advantage; only the critic
        // term carries gradient through the value head.
        let actor_weight = advantages(&normalized, &value_estimates);
        let actor_weight =
            Tensor::<TrainBackend, 1>::from_data(TensorData::from(actor_weight.as_slice()), &self.device);
        let returns = Tensor::<TrainBackend, 1>::from_data(TensorData::from(normalized.as_slice()), &self.device);
        let advantage = returns - values;

        let actor_loss = (log_probs.neg() * actor_weight).mean();
        let critic_loss = (advantage.clone() * advantage).mean();
        let entropy = entropies.mean();

        let total_loss = actor_loss.clone() * self.config.actor_coeff
            + critic_loss.clone() * self.config.critic_coeff
            + entropy.clone() * self.config.entropy_coeff;

        let metrics = UpdateMetrics {
            loss: read_scalar(total_loss.clone())?,
            actor_loss: read_scalar(actor_loss)?,
            critic_loss: read_scalar(critic_loss)?,
            entropy: read_scalar(entropy)?,
            episode_length: len,
        };

        let grads = total_loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optimizer
            .step(self.config.learning_rate, self.network.clone(), grads);
        self.update_count += 1;

        Ok(metrics)
    }
}

fn read_scalar(tensor: Tensor<TrainBackend, 1>) -> Result<f32, TrainingError> {
    let values: Vec<f32> = tensor
        .into_data()
        .to_vec()
        .map_err(|e| TrainingError::TensorRead(format!("{e:?}")))?;
    values
        .first()
        .copied()
        .ok_or_else(|| TrainingError::TensorRead("empty loss tensor".to_string()))
}

impl PongAgent for ActorCriticAgent {
    /// Greedy action on the inference backend.
    fn get_action(&mut self, observation: &Frame) -> Result<Action, AgentError> {
        let input = self.policy_input(observation)?;
        let n = input.len();
        let device = <InferBackend as Backend>::Device::default();
        let input = Tensor::<InferBackend, 1>::from_data(TensorData::from(input.as_slice()), &device)
            .reshape([1, n]);
        let (logits, value) = self.network.valid().forward(input);
        PolicyStep::new(logits, value).greedy()
    }

    fn load_model(&mut self) -> Result<(), AgentError> {
        if self.config.policy_input == PolicyInput::Positions {
            self.load_perception()?;
        }
        self.load_policy()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.state_builder.reset();
        self.last_state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::preprocess::feature_len;
    use crate::game::{PongConfig, PongGame, Side};

    fn small_agent(config: ActorCriticConfig) -> (ActorCriticAgent, PongGame) {
        let game = PongGame::new(PongConfig::small());
        let dim = feature_len(game.config().height, game.config().width);
        let perception_config = PerceptionNetworkConfig::new(dim).with_hidden_dim(8);
        let perception = PerceptionStack::new(&perception_config, &default_device());
        let agent = ActorCriticAgent::new(
            ActorCriticConfig {
                hidden_dim: 16,
                seed: Some(1),
                ..config
            },
            perception_config,
        )
        .with_perception(perception);
        (agent, game)
    }

    fn run_episode(agent: &mut ActorCriticAgent, game: &PongGame, rewards: &[f32]) -> Trajectory<TrainBackend> {
        let mut trajectory = Trajectory::new();
        agent.reset();
        for &reward in rewards {
            agent.act_train(&game.observation(Side::Left), &mut trajectory).unwrap();
            trajectory.push_reward(reward);
        }
        trajectory
    }

    #[test]
    fn test_defaults() {
        let config = ActorCriticConfig::default();
        assert!((config.learning_rate - 5e-4).abs() < 1e-12);
        assert!((config.gamma - 0.98).abs() < 1e-6);
        assert!((config.entropy_coeff - 0.05).abs() < 1e-6);
        assert_eq!(config.action_selection, ActionSelection::Greedy);
        assert_eq!(config.policy_input, PolicyInput::Positions);
    }

    #[test]
    fn test_trajectory_length_matches_steps() {
        let (mut agent, game) = small_agent(ActorCriticConfig::default());
        let trajectory = run_episode(&mut agent, &game, &[0.0; 7]);
        assert_eq!(trajectory.check_aligned().unwrap(), 7);
    }

    #[test]
    fn test_first_state_after_reset_has_prev_equal_current() {
        let (mut agent, game) = small_agent(ActorCriticConfig::default());
        run_episode(&mut agent, &game, &[0.0; 3]);
        agent.reset();
        let mut trajectory = Trajectory::new();
        agent.act_train(&game.observation(Side::Left), &mut trajectory).unwrap();
        let state = agent.last_state().unwrap();
        assert_eq!(state.prev_ball_x, state.ball_x);
        assert_eq!(state.prev_ball_y, state.ball_y);
    }

    #[test]
    fn test_update_changes_parameters() {
        let (mut agent, game) = small_agent(ActorCriticConfig::default());
        let before = agent.network().parameter_snapshot();
        let trajectory = run_episode(&mut agent, &game, &[0.0, 0.0, 0.0, 0.0, 1.0]);
        let metrics = agent.update(trajectory).unwrap();
        assert_eq!(metrics.episode_length, 5);
        assert!(metrics.loss.is_finite());
        assert_ne!(before, agent.network().parameter_snapshot());
        assert_eq!(agent.update_count(), 1);
    }

    #[test]
    fn test_constant_returns_skip_update() {
        let (mut agent, game) = small_agent(ActorCriticConfig::default());
        let before = agent.network().parameter_snapshot();
        let trajectory = run_episode(&mut agent, &game, &[10.0]);
        let err = agent.update(trajectory).unwrap_err();
        assert!(err.is_skippable());
        assert_eq!(before, agent.network().parameter_snapshot());
        assert_eq!(agent.skipped_updates(), 1);
        assert_eq!(agent.update_count(), 0);
    }

    #[test]
    fn test_empty_episode_is_skipped() {
        let (mut agent, _) = small_agent(ActorCriticConfig::default());
        let err = agent.update(Trajectory::new()).unwrap_err();
        assert!(matches!(err, TrainingError::EmptyEpisode));
    }

    #[test]
    fn test_positions_without_perception_is_not_loaded() {
        let agent_config = ActorCriticConfig::default();
        let mut agent = ActorCriticAgent::new(agent_config, PerceptionNetworkConfig::new(300));
        let frame = PongGame::new(PongConfig::small()).render();
        let err = agent.get_action(&frame).unwrap_err();
        assert!(matches!(err, AgentError::NotLoaded(_)));
    }

    #[test]
    fn test_pixels_mode_skips_perception() {
        let game = PongGame::new(PongConfig::small());
        let dim = feature_len(game.config().height, game.config().width);
        let mut agent = ActorCriticAgent::new(
            ActorCriticConfig {
                policy_input: PolicyInput::Pixels,
                hidden_dim: 8,
                ..Default::default()
            },
            PerceptionNetworkConfig::new(dim),
        );
        assert_eq!(agent.network().input_dim(), dim);
        let mut trajectory = Trajectory::new();
        agent.act_train(&game.render(), &mut trajectory).unwrap();
        assert!(agent.last_state().is_none());
    }

    #[test]
    fn test_save_then_load_restores_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let (mut agent, game) = small_agent(ActorCriticConfig::default());
        let trajectory = run_episode(&mut agent, &game, &[0.0, 0.0, 1.0]);
        agent.update(trajectory).unwrap();
        agent
            .save(
                &store,
                CheckpointMetrics {
                    episodes: 1,
                    average_reward: 1.0,
                    last_loss: None,
                },
            )
            .unwrap();
        assert!(store.exists(POLICY_FILE));
        assert!(store.exists(OPTIMIZER_FILE));
        assert!(store.exists(METADATA_FILE));

        let (fresh, _) = small_agent(ActorCriticConfig::default());
        let mut restored = fresh.with_checkpoint(store);
        assert!(restored.load_policy().unwrap());
        assert_eq!(restored.network().parameter_snapshot(), agent.network().parameter_snapshot());
        assert_eq!(restored.episode_count(), 1);
        assert_eq!(restored.update_count(), 1);
    }

    #[test]
    fn test_lenient_load_keeps_fresh_weights() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(POLICY_FILE), b"garbage").unwrap();
        let store = CheckpointStore::new(dir.path());

        let (agent, _) = small_agent(ActorCriticConfig {
            strict_load: false,
            ..Default::default()
        });
        let before = agent.network().parameter_snapshot();
        let mut agent = agent.with_checkpoint(store.clone());
        assert!(!agent.load_policy().unwrap());
        assert_eq!(before, agent.network().parameter_snapshot());

        let (strict, _) = small_agent(ActorCriticConfig::default());
        let mut strict = strict.with_checkpoint(store);
        assert!(strict.load_policy().is_err());
    }

    #[test]
    fn test_lenient_load_ignores_reshaped_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let (positions, _) = small_agent(ActorCriticConfig::default());
        assert_eq!(positions.network().input_dim(), 6);
        positions
            .save(
                &store,
                CheckpointMetrics {
                    episodes: 0,
                    average_reward: 0.0,
                    last_loss: None,
                },
            )
            .unwrap();

        let config = PongConfig::small();
        let dim = feature_len(config.height, config.width);
        let pixels = |strict_load| {
            ActorCriticAgent::new(
                ActorCriticConfig {
                    policy_input: PolicyInput::Pixels,
                    hidden_dim: 16,
                    seed: Some(2),
                    strict_load,
                    ..Default::default()
                },
                PerceptionNetworkConfig::new(dim).with_hidden_dim(8),
            )
            .with_checkpoint(store.clone())
        };

        let mut lenient = pixels(false);
        let before = lenient.network().parameter_snapshot();
        assert!(!lenient.load_policy().unwrap());
        assert_eq!(lenient.network().input_dim(), dim);
        assert_eq!(before, lenient.network().parameter_snapshot());

        let mut strict = pixels(true);
        let err = strict.load_policy().unwrap_err();
        assert!(matches!(err, AgentError::Checkpoint(CheckpointError::RecordDecode { .. })));
    }

    #[test]
    fn test_misaligned_trajectory_is_not_counted() {
        let (mut agent, game) = small_agent(ActorCriticConfig::default());
        let mut trajectory = run_episode(&mut agent, &game, &[0.0, 1.0]);
        agent.act_train(&game.observation(Side::Left), &mut trajectory).unwrap();
        let err = agent.update(trajectory).unwrap_err();
        assert!(matches!(err, TrainingError::TrajectoryMismatch { .. }));
        assert!(!err.is_skippable());
        assert_eq!(agent.episode_count(), 0);
        assert_eq!(agent.skipped_updates(), 0);
    }

    #[test]
    fn test_missing_policy_file_is_error_even_when_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let (agent, _) = small_agent(ActorCriticConfig {
            strict_load: false,
            ..Default::default()
        });
        let mut agent = agent.with_checkpoint(CheckpointStore::new(dir.path()));
        let err = agent.load_policy().unwrap_err();
        assert!(matches!(err, AgentError::Checkpoint(CheckpointError::MissingFile(_))));
    }
}
