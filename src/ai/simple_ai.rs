use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::PongAgent;
use crate::error::AgentError;
use crate::game::{Action, Frame, PongConfig};

/// Scripted baseline that reads its own observation and chases the ball.
///
/// The observation is assumed to be in the player's own frame: its paddle is
/// the one on the left.
pub struct SimpleAi {
    paddle_cols: (usize, usize),
    field_cols: (usize, usize),
    dead_zone: f32,
    noise: f64,
    rng: StdRng,
}

impl SimpleAi {
    pub fn new(config: &PongConfig) -> Self {
        let left = config.left_paddle_x();
        SimpleAi {
            paddle_cols: (left, left + config.paddle_width),
            field_cols: (left + config.paddle_width, config.right_paddle_x()),
            dead_zone: config.paddle_height as f32 / 4.0,
            noise: 0.0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the chosen action with a uniformly random one with
    /// probability `noise`.
    pub fn with_noise(mut self, noise: f64, seed: Option<u64>) -> Self {
        self.noise = noise.clamp(0.0, 1.0);
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self
    }

    /// Mean row of foreground pixels within `cols`.
    fn mean_row(frame: &Frame, cols: (usize, usize)) -> Option<f32> {
        let (start, end) = (cols.0.min(frame.width()), cols.1.min(frame.width()));
        let mut sum = 0usize;
        let mut count = 0usize;
        for row in 0..frame.height() {
            for col in start..end {
                if !frame.is_background(row, col) {
                    sum += row;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum as f32 / count as f32)
    }

    fn chase(&self, frame: &Frame) -> Action {
        let (Some(paddle), Some(ball)) = (
            Self::mean_row(frame, self.paddle_cols),
            Self::mean_row(frame, self.field_cols),
        ) else {
            return Action::Stay;
        };
        if ball < paddle - self.dead_zone {
            Action::Up
        } else if ball > paddle + self.dead_zone {
            Action::Down
        } else {
            Action::Stay
        }
    }
}

impl PongAgent for SimpleAi {
    fn get_action(&mut self, observation: &Frame) -> Result<Action, AgentError> {
        if self.noise > 0.0 && self.rng.random_bool(self.noise) {
            let idx = self.rng.random_range(0..Action::COUNT);
            return Ok(Action::from_index(idx).unwrap_or_default());
        }
        Ok(self.chase(observation))
    }

    fn name(&self) -> &str {
        "SimpleAI"
    }
}
