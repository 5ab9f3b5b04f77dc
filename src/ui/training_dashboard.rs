use std::collections::VecDeque;

use crate::game::Frame;
use crate::training::dashboard_msg::{LiveFrame, MetricsSnapshot};

const MAX_HISTORY: usize = 500;

/// Status of the training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    Running,
    Paused,
    Finished,
    Failed,
}

/// Dashboard state holding history buffers and current values.
pub struct DashboardState {
    // History buffers: (episode, value)
    pub reward_history: VecDeque<(f64, f64)>,
    pub average_history: VecDeque<(f64, f64)>,
    pub loss_history: VecDeque<(f64, f64)>,
    pub length_history: VecDeque<u64>,

    pub episode: usize,
    pub total_episodes: usize,
    pub reward: f32,
    pub average_reward: f32,
    pub loss: Option<f32>,
    pub entropy: Option<f32>,
    pub episode_length: usize,
    pub win_rate: f32,
    pub episodes_per_sec: f32,
    pub skipped_updates: usize,

    pub live_frame: Option<Frame>,
    pub live_step: usize,

    pub status: TrainingStatus,
    pub last_skip: Option<String>,
    pub failure: Option<String>,
}

impl DashboardState {
    pub fn new(total_episodes: usize) -> Self {
        DashboardState {
            reward_history: VecDeque::new(),
            average_history: VecDeque::new(),
            loss_history: VecDeque::new(),
            length_history: VecDeque::new(),

            episode: 0,
            total_episodes,
            reward: 0.0,
            average_reward: 0.0,
            loss: None,
            entropy: None,
            episode_length: 0,
            win_rate: 0.0,
            episodes_per_sec: 0.0,
            skipped_updates: 0,

            live_frame: None,
            live_step: 0,

            status: TrainingStatus::Running,
            last_skip: None,
            failure: None,
        }
    }

    /// Apply a metrics snapshot from the training thread.
    pub fn apply_metrics(&mut self, snap: &MetricsSnapshot) {
        self.episode = snap.episode;
        self.total_episodes = snap.total_episodes;
        self.reward = snap.reward;
        self.average_reward = snap.average_reward;
        self.entropy = snap.entropy.or(self.entropy);
        self.episode_length = snap.episode_length;
        self.win_rate = snap.win_rate;
        self.episodes_per_sec = snap.episodes_per_sec;

        let ep = snap.episode as f64;
        push_capped(&mut self.reward_history, (ep, snap.reward as f64));
        push_capped(&mut self.average_history, (ep, snap.average_reward as f64));
        push_capped(&mut self.length_history, snap.episode_length as u64);

        // Skipped updates carry no loss; keep the last known value on screen.
        if let Some(loss) = snap.loss {
            self.loss = Some(loss);
            push_capped(&mut self.loss_history, (ep, loss as f64));
        }
    }

    pub fn apply_live(&mut self, live: LiveFrame) {
        self.live_step = live.step;
        self.live_frame = Some(live.frame);
    }

    pub fn apply_skip(&mut self, episode: usize, reason: String) {
        self.skipped_updates += 1;
        self.last_skip = Some(format!("ep {}: {}", episode, reason));
    }

    pub fn fail(&mut self, message: String) {
        self.status = TrainingStatus::Failed;
        self.failure = Some(message);
    }

    /// Progress ratio [0.0, 1.0].
    pub fn progress(&self) -> f64 {
        if self.total_episodes == 0 {
            return 0.0;
        }
        self.episode as f64 / self.total_episodes as f64
    }
}

fn push_capped<T>(buffer: &mut VecDeque<T>, value: T) {
    buffer.push_back(value);
    if buffer.len() > MAX_HISTORY {
        buffer.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::BACKGROUND;

    fn snapshot(episode: usize, loss: Option<f32>) -> MetricsSnapshot {
        MetricsSnapshot {
            episode,
            total_episodes: 1000,
            reward: 0.5,
            average_reward: 0.25,
            loss,
            entropy: Some(1.05),
            episode_length: 120,
            win_rate: 0.4,
            episodes_per_sec: 3.0,
        }
    }

    #[test]
    fn test_apply_metrics_updates_fields() {
        let mut state = DashboardState::new(1000);
        state.apply_metrics(&snapshot(100, Some(0.05)));

        assert_eq!(state.episode, 100);
        assert_eq!(state.total_episodes, 1000);
        assert!((state.reward - 0.5).abs() < 1e-6);
        assert!((state.average_reward - 0.25).abs() < 1e-6);
        assert_eq!(state.loss, Some(0.05));
        assert_eq!(state.entropy, Some(1.05));
        assert_eq!(state.episode_length, 120);
        assert!((state.win_rate - 0.4).abs() < 1e-6);
        assert_eq!(state.reward_history.len(), 1);
        assert_eq!(state.average_history.len(), 1);
        assert_eq!(state.loss_history.len(), 1);
        assert_eq!(state.length_history.len(), 1);
    }

    #[test]
    fn test_skipped_update_keeps_last_loss() {
        let mut state = DashboardState::new(1000);
        state.apply_metrics(&snapshot(1, Some(0.3)));
        state.apply_metrics(&snapshot(2, None));
        state.apply_skip(2, "degenerate returns".into());

        assert_eq!(state.loss, Some(0.3));
        assert_eq!(state.loss_history.len(), 1);
        assert_eq!(state.reward_history.len(), 2);
        assert_eq!(state.skipped_updates, 1);
        assert!(state.last_skip.as_deref().unwrap().contains("ep 2"));
    }

    #[test]
    fn test_history_caps_at_500() {
        let mut state = DashboardState::new(10_000);
        for i in 0..600 {
            state.apply_metrics(&snapshot(i, Some(0.1)));
        }

        assert_eq!(state.reward_history.len(), 500);
        assert_eq!(state.average_history.len(), 500);
        assert_eq!(state.loss_history.len(), 500);
        assert_eq!(state.length_history.len(), 500);
        assert_eq!(state.reward_history.front().unwrap().0, 100.0);
    }

    #[test]
    fn test_apply_live_stores_frame() {
        let mut state = DashboardState::new(10);
        state.apply_live(LiveFrame {
            frame: Frame::filled(4, 4, BACKGROUND),
            step: 7,
        });
        assert_eq!(state.live_step, 7);
        assert!(state.live_frame.is_some());
    }

    #[test]
    fn test_fail_sets_status() {
        let mut state = DashboardState::new(10);
        state.fail("boom".into());
        assert_eq!(state.status, TrainingStatus::Failed);
        assert_eq!(state.failure.as_deref(), Some("boom"));
    }

    #[test]
    fn test_progress() {
        let mut state = DashboardState::new(1000);
        assert!((state.progress() - 0.0).abs() < 1e-6);

        state.episode = 500;
        assert!((state.progress() - 0.5).abs() < 1e-6);

        state.episode = 1000;
        assert!((state.progress() - 1.0).abs() < 1e-6);
    }
}
