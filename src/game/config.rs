use serde::{Deserialize, Serialize};

/// Court geometry and physics for the Pong simulator.
///
/// All lengths are in pixels of the rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PongConfig {
    pub width: usize,
    pub height: usize,
    pub paddle_width: usize,
    pub paddle_height: usize,
    /// Distance from the court edge to the paddle's outer side.
    pub paddle_margin: usize,
    pub paddle_speed: f32,
    pub ball_size: usize,
    pub ball_speed: f32,
    pub max_ball_dy: f32,
    /// Reward for winning a point; the loser receives the negation.
    pub score_reward: f32,
    /// A rally longer than this ends the episode with zero rewards.
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl Default for PongConfig {
    fn default() -> Self {
        PongConfig {
            width: 200,
            height: 200,
            paddle_width: 4,
            paddle_height: 20,
            paddle_margin: 10,
            paddle_speed: 3.0,
            ball_size: 4,
            ball_speed: 3.0,
            max_ball_dy: 4.0,
            score_reward: 10.0,
            max_steps: 1000,
            seed: None,
        }
    }
}

impl PongConfig {
    /// A small court for fast tests.
    pub fn small() -> Self {
        PongConfig {
            width: 40,
            height: 30,
            paddle_width: 2,
            paddle_height: 6,
            paddle_margin: 2,
            paddle_speed: 2.0,
            ball_size: 2,
            ball_speed: 2.0,
            max_ball_dy: 2.0,
            score_reward: 10.0,
            max_steps: 200,
            seed: Some(7),
        }
    }

    /// Column of the left paddle's leftmost pixel.
    pub fn left_paddle_x(&self) -> usize {
        self.paddle_margin
    }

    /// Column of the right paddle's leftmost pixel.
    pub fn right_paddle_x(&self) -> usize {
        self.width - self.paddle_margin - self.paddle_width
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width < 8 || self.height < 8 {
            return Err("environment court must be at least 8x8".into());
        }
        if self.paddle_height == 0 || self.paddle_height >= self.height {
            return Err("environment.paddle_height must be in (0, height)".into());
        }
        if self.paddle_width == 0 || self.ball_size == 0 {
            return Err("environment paddle_width and ball_size must be > 0".into());
        }
        if 2 * (self.paddle_margin + self.paddle_width) + self.ball_size >= self.width {
            return Err("environment paddles leave no room for the ball".into());
        }
        if self.paddle_speed <= 0.0 || self.ball_speed <= 0.0 {
            return Err("environment speeds must be > 0".into());
        }
        if self.max_steps == 0 {
            return Err("environment.max_steps must be > 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        PongConfig::default().validate().unwrap();
        PongConfig::small().validate().unwrap();
    }

    #[test]
    fn test_paddle_columns_are_symmetric() {
        let config = PongConfig::default();
        assert_eq!(config.left_paddle_x(), 10);
        assert_eq!(
            config.right_paddle_x() + config.paddle_width,
            config.width - config.paddle_margin
        );
    }

    #[test]
    fn test_rejects_tall_paddle() {
        let config = PongConfig {
            paddle_height: 200,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
