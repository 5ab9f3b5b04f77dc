use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai::backend::{default_device, TrainBackend};
use crate::ai::networks::{PerceptionNetwork, PerceptionNetworkConfig};
use crate::ai::preprocess::{feature_len, features_to_tensor, preprocess_frame};
use crate::ai::{PerceptionStack, PerceptionTarget, PongAgent, SimpleAi};
use crate::error::TrainingError;
use crate::game::{PongConfig, PongGame, Side};

/// Supervised training of the four position regressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub hidden_dim: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub steps: usize,
    pub log_interval: usize,
    /// Probability that a data-collecting player moves at random.
    pub action_noise: f64,
    pub seed: Option<u64>,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        PerceptionConfig {
            hidden_dim: 64,
            learning_rate: 1e-3,
            batch_size: 32,
            steps: 2000,
            log_interval: 100,
            action_noise: 0.3,
            seed: None,
        }
    }
}

impl PerceptionConfig {
    /// Network config for frames of the given environment.
    pub fn network_config(&self, environment: &PongConfig) -> PerceptionNetworkConfig {
        PerceptionNetworkConfig::new(feature_len(environment.height, environment.width))
            .with_hidden_dim(self.hidden_dim)
    }
}

/// Mean squared error of each regressor over the last batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerceptionLosses {
    pub ball_x: f32,
    pub ball_y: f32,
    pub my_y: f32,
    pub opponent_y: f32,
}

impl PerceptionLosses {
    fn set(&mut self, target: PerceptionTarget, loss: f32) {
        match target {
            PerceptionTarget::BallX => self.ball_x = loss,
            PerceptionTarget::BallY => self.ball_y = loss,
            PerceptionTarget::MyY => self.my_y = loss,
            PerceptionTarget::OpponentY => self.opponent_y = loss,
        }
    }

    pub fn mean(&self) -> f32 {
        (self.ball_x + self.ball_y + self.my_y + self.opponent_y) / 4.0
    }
}

type Regressor = PerceptionNetwork<TrainBackend>;

/// Collects frames from simulator self-play between two noisy scripted
/// players and fits each regressor to the observing player's ground truth.
pub struct PerceptionTrainer {
    config: PerceptionConfig,
    network_config: PerceptionNetworkConfig,
    game: PongGame,
    players: (SimpleAi, SimpleAi),
    rng: StdRng,
}

impl PerceptionTrainer {
    pub fn new(config: PerceptionConfig, environment: PongConfig) -> Self {
        let network_config = config.network_config(&environment);
        let seed = config.seed;
        let players = (
            SimpleAi::new(&environment).with_noise(config.action_noise, seed),
            SimpleAi::new(&environment).with_noise(config.action_noise, seed.map(|s| s + 1)),
        );
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        PerceptionTrainer {
            config,
            network_config,
            game: PongGame::new(environment),
            players,
            rng,
        }
    }

    /// Advance the simulator one tick and capture one (features, truth)
    /// sample from a randomly chosen player's point of view.
    fn next_sample(&mut self) -> Result<(Vec<f32>, [f32; 4]), TrainingError> {
        let left = self.players.0.get_action(&self.game.observation(Side::Left))?;
        let right = self.players.1.get_action(&self.game.observation(Side::Right))?;
        if self.game.step(left, right).done {
            self.game.reset();
        }

        let side = if self.rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        let features = preprocess_frame(&self.game.observation(side));
        let truth = self.game.ground_truth(side);
        Ok((features, PerceptionTarget::ALL.map(|t| t.select(&truth))))
    }

    /// Run the configured number of steps and return the frozen regressors
    /// with the final batch losses.
    pub fn train(&mut self) -> Result<(PerceptionStack, PerceptionLosses), TrainingError> {
        let device = default_device();
        let batch = self.config.batch_size;
        let mut networks: [Regressor; 4] =
            PerceptionTarget::ALL.map(|_| self.network_config.init(&device));
        let mut optimizers: [OptimizerAdaptor<Adam, Regressor, TrainBackend>; 4] =
            PerceptionTarget::ALL.map(|_| AdamConfig::new().init());
        let mut losses = PerceptionLosses::default();

        info!(
            steps = self.config.steps,
            batch_size = batch,
            input_dim = self.network_config.input_dim,
            "training perception networks"
        );

        for step in 1..=self.config.steps {
            let mut features = Vec::with_capacity(batch * self.network_config.input_dim);
            let mut targets: [Vec<f32>; 4] = Default::default();
            for _ in 0..batch {
                let (sample, truth) = self.next_sample()?;
                features.extend_from_slice(&sample);
                for (column, value) in targets.iter_mut().zip(truth) {
                    column.push(value);
                }
            }
            let input = features_to_tensor::<TrainBackend>(&features, batch, &device);

            for (i, target) in PerceptionTarget::ALL.into_iter().enumerate() {
                let expected = Tensor::<TrainBackend, 1>::from_data(TensorData::from(targets[i].as_slice()), &device)
                    .reshape([batch, 1]);
                let diff = networks[i].forward(input.clone()) - expected;
                let loss = (diff.clone() * diff).mean();
                let value: Vec<f32> = loss
                    .clone()
                    .into_data()
                    .to_vec()
                    .map_err(|e| TrainingError::TensorRead(format!("{e:?}")))?;
                losses.set(target, value.first().copied().unwrap_or_default());

                let grads = GradientsParams::from_grads(loss.backward(), &networks[i]);
                networks[i] = optimizers[i].step(self.config.learning_rate, networks[i].clone(), grads);
            }

            if step % self.config.log_interval.max(1) == 0 {
                info!(
                    step,
                    ball_x = losses.ball_x,
                    ball_y = losses.ball_y,
                    my_y = losses.my_y,
                    opponent_y = losses.opponent_y,
                    "perception loss"
                );
            }
        }

        let frozen = networks.map(|network| network.valid());
        Ok((PerceptionStack::from_networks(frozen, &device), losses))
    }
}
