use crate::game::Frame;

/// Per-episode metrics sent from the training thread to the dashboard.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub episode: usize,
    pub total_episodes: usize,
    pub reward: f32,
    pub average_reward: f32,
    pub loss: Option<f32>,
    pub entropy: Option<f32>,
    pub episode_length: usize,
    pub win_rate: f32,
    pub episodes_per_sec: f32,
}

/// Spectator frame of the episode in progress.
#[derive(Debug, Clone)]
pub struct LiveFrame {
    pub frame: Frame,
    pub step: usize,
}

/// Updates sent from the training thread to the UI.
#[derive(Debug, Clone)]
pub enum TrainingUpdate {
    Metrics(MetricsSnapshot),
    Live(LiveFrame),
    Skipped { episode: usize, reason: String },
    Finished,
    Failed(String),
}
