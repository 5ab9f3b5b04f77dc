use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::game::Side;

/// Trailing window for the reported average reward.
pub const AVERAGE_WINDOW: usize = 100;

/// Total reward of every finished episode, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardHistory {
    rewards: Vec<f32>,
}

impl RewardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reward: f32) {
        self.rewards.push(reward);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Mean of the last [`AVERAGE_WINDOW`] rewards, or of all of them while
    /// fewer have been recorded.
    pub fn average(&self) -> f32 {
        trailing_mean(&self.rewards, self.rewards.len())
    }

    /// The trailing average after each episode, for plotting.
    pub fn moving_average(&self) -> Vec<f32> {
        (1..=self.rewards.len())
            .map(|end| trailing_mean(&self.rewards, end))
            .collect()
    }
}

fn trailing_mean(rewards: &[f32], end: usize) -> f32 {
    let start = end.saturating_sub(AVERAGE_WINDOW);
    let window = &rewards[start..end];
    if window.is_empty() {
        return 0.0;
    }
    window.iter().sum::<f32>() / window.len() as f32
}

/// Result of a single episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    pub winner: Option<Side>,
    pub length: usize,
    pub reward: f32,
}

/// Rolling-window training statistics.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize,
    skipped_updates: usize,
    started: Instant,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            skipped_updates: 0,
            started: Instant::now(),
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(AVERAGE_WINDOW)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    pub fn record_skipped(&mut self) {
        self.skipped_updates += 1;
    }

    /// Fraction of the last N episodes won by player 1.
    pub fn win_rate(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| r.winner == Some(Side::Left))
            .count();
        wins as f32 / n as f32
    }

    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.update_losses.back().copied()
    }

    pub fn average_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.length)
            .sum();
        total as f32 / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn skipped_updates(&self) -> usize {
        self.skipped_updates
    }

    /// Episodes per second since these metrics were created.
    pub fn episodes_per_sec(&self) -> f32 {
        let elapsed = self.started.elapsed();
        if elapsed == Duration::ZERO {
            return 0.0;
        }
        self.total_episodes as f32 / elapsed.as_secs_f32()
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
