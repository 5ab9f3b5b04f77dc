use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai::{ActorCriticAgent, PongAgent, UpdateMetrics};
use crate::error::TrainingError;
use crate::game::Side;
use crate::training::dashboard_msg::{LiveFrame, MetricsSnapshot, TrainingUpdate};
use crate::training::environment::Environment;
use crate::training::metrics::{EpisodeResult, RewardHistory, TrainingMetrics, AVERAGE_WINDOW};
use crate::training::trajectory::Trajectory;

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    /// Log every N episodes.
    pub log_interval: usize,
    /// In render mode, send every Nth frame to the UI.
    pub live_frame_interval: usize,
    /// In render mode, pause this long after each sent frame.
    pub render_delay_ms: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 100,
            log_interval: 1,
            live_frame_interval: 1,
            render_delay_ms: 10,
        }
    }
}

/// What one episode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub reward: f32,
    pub length: usize,
    pub winner: Option<Side>,
    /// `None` when the update was skipped.
    pub update: Option<UpdateMetrics>,
    /// Why the update was skipped.
    pub skip_reason: Option<String>,
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub history: RewardHistory,
    pub episodes: usize,
    pub last_loss: Option<f32>,
    pub skipped_updates: usize,
    pub interrupted: bool,
}

/// Runs actor-critic episodes against a fixed opponent.
pub struct Trainer<E: Environment> {
    config: TrainerConfig,
    env: E,
    opponent: Box<dyn PongAgent + Send>,
    metrics: TrainingMetrics,
    history: RewardHistory,
}

impl<E: Environment> Trainer<E> {
    pub fn new(config: TrainerConfig, env: E, opponent: Box<dyn PongAgent + Send>) -> Self {
        Trainer {
            config,
            env,
            opponent,
            metrics: TrainingMetrics::new(),
            history: RewardHistory::new(),
        }
    }

    /// Continue an earlier run's reward history.
    pub fn with_history(mut self, history: RewardHistory) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Play one episode and apply the Monte-Carlo update.
    ///
    /// `on_step` runs after every environment step with the step count.
    /// A skipped update is logged and reported as `update: None`.
    pub fn run_episode<F>(
        &mut self,
        agent: &mut ActorCriticAgent,
        mut on_step: F,
    ) -> Result<EpisodeReport, TrainingError>
    where
        F: FnMut(&E, usize),
    {
        agent.reset();
        self.opponent.reset();
        let (mut own_view, mut opponent_view) = self.env.reset();
        let mut trajectory = Trajectory::new();

        let winner = loop {
            let action = agent.act_train(&own_view, &mut trajectory)?;
            let opponent_action = self.opponent.get_action(&opponent_view)?;
            let outcome = self.env.step((action, opponent_action));
            trajectory.push_reward(outcome.rewards.0);
            on_step(&self.env, trajectory.len());

            (own_view, opponent_view) = outcome.observations;
            if outcome.done {
                break outcome.info.winner;
            }
        };

        let reward = trajectory.total_reward();
        let length = trajectory.len();
        let (update, skip_reason) = match agent.update(trajectory) {
            Ok(metrics) => (Some(metrics), None),
            Err(err) if err.is_skippable() => {
                warn!(episode = agent.episode_count(), error = %err, "skipping update");
                (None, Some(err.to_string()))
            }
            Err(err) => return Err(err),
        };

        Ok(EpisodeReport {
            reward,
            length,
            winner,
            update,
            skip_reason,
        })
    }

    fn record(&mut self, episode: usize, report: &EpisodeReport) {
        self.history.push(report.reward);
        self.metrics.record_episode(EpisodeResult {
            winner: report.winner,
            length: report.length,
            reward: report.reward,
        });
        match report.update {
            Some(update) => self.metrics.record_update(update.loss),
            None => self.metrics.record_skipped(),
        }

        if episode % self.config.log_interval.max(1) == 0 {
            info!(
                average = self.history.average(),
                loss = report.update.map(|u| u.loss),
                "Episode {} finished. Total reward: {:.3} ({} timesteps)",
                episode,
                report.reward,
                report.length
            );
        }
    }

    fn summary(&self, episodes: usize, interrupted: bool) -> TrainingSummary {
        TrainingSummary {
            history: self.history.clone(),
            episodes,
            last_loss: self.metrics.last_loss(),
            skipped_updates: self.metrics.skipped_updates(),
            interrupted,
        }
    }

    /// Run the configured number of episodes.
    pub fn train(&mut self, agent: &mut ActorCriticAgent) -> Result<TrainingSummary, TrainingError> {
        info!(
            episodes = self.config.num_episodes,
            opponent = self.opponent.name(),
            "starting training"
        );
        for episode in 1..=self.config.num_episodes {
            let report = self.run_episode(agent, |_, _| {})?;
            self.record(episode, &report);
        }
        info!(
            episodes = self.config.num_episodes,
            average = self.history.average(),
            average_loss = self.metrics.average_loss(AVERAGE_WINDOW),
            average_length = self.metrics.average_length(AVERAGE_WINDOW),
            "training complete"
        );
        Ok(self.summary(self.config.num_episodes, false))
    }

    /// Training loop for the live dashboard. Sends frames and metrics to the
    /// UI, honors pause, and stops between episodes once `quit` is set.
    pub fn train_with_dashboard(
        &mut self,
        agent: &mut ActorCriticAgent,
        update_tx: Sender<TrainingUpdate>,
        pause: Arc<AtomicBool>,
        quit: Arc<AtomicBool>,
    ) -> Result<TrainingSummary, TrainingError> {
        let total = self.config.num_episodes;
        let frame_interval = self.config.live_frame_interval.max(1);
        let delay = Duration::from_millis(self.config.render_delay_ms);
        let mut completed = 0;

        for episode in 1..=total {
            while pause.load(Ordering::Relaxed) && !quit.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(50));
            }
            if quit.load(Ordering::Relaxed) {
                break;
            }

            let tx = update_tx.clone();
            let quit_flag = quit.clone();
            let report = self.run_episode(agent, move |env, step| {
                if step % frame_interval != 0 || quit_flag.load(Ordering::Relaxed) {
                    return;
                }
                if let Some(frame) = env.render() {
                    let _ = tx.send(TrainingUpdate::Live(LiveFrame { frame, step }));
                }
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            });
            let report = match report {
                Ok(report) => report,
                Err(err) => {
                    let _ = update_tx.send(TrainingUpdate::Failed(err.to_string()));
                    return Err(err);
                }
            };
            self.record(episode, &report);
            completed = episode;

            if let Some(reason) = report.skip_reason.clone() {
                let _ = update_tx.send(TrainingUpdate::Skipped { episode, reason });
            }
            let _ = update_tx.send(TrainingUpdate::Metrics(MetricsSnapshot {
                episode,
                total_episodes: total,
                reward: report.reward,
                average_reward: self.history.average(),
                loss: report.update.map(|u| u.loss),
                entropy: report.update.map(|u| u.entropy),
                episode_length: report.length,
                win_rate: self.metrics.win_rate(AVERAGE_WINDOW),
                episodes_per_sec: self.metrics.episodes_per_sec(),
            }));
        }

        let _ = update_tx.send(TrainingUpdate::Finished);
        Ok(self.summary(completed, completed < total))
    }
}
