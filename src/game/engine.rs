use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::action::Action;
use super::config::PongConfig;
use super::frame::{Frame, BACKGROUND, FOREGROUND};

/// Spin added to the ball's vertical speed by a hit at the paddle's tip.
const PADDLE_SPIN: f32 = 1.5;

/// Which paddle a player controls. Player 1 is always on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Continuous game state. Coordinates are object centers in frame pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PongState {
    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_dx: f32,
    pub ball_dy: f32,
    pub left_y: f32,
    pub right_y: f32,
    pub steps: usize,
}

/// Positions seen from one player's side, normalized to `[0, 1]`.
///
/// `ball_x` grows away from the observing player's own paddle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruth {
    pub ball_x: f32,
    pub ball_y: f32,
    pub my_y: f32,
    pub opponent_y: f32,
}

/// Result of advancing the simulation by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// (left reward, right reward)
    pub rewards: (f32, f32),
    pub done: bool,
    pub winner: Option<Side>,
}

/// Two-player Pong simulation. One episode is one point.
pub struct PongGame {
    config: PongConfig,
    state: PongState,
    rng: StdRng,
}

impl PongGame {
    pub fn new(config: PongConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let state = Self::serve_state(&config, &mut rng);
        PongGame { config, state, rng }
    }

    pub fn config(&self) -> &PongConfig {
        &self.config
    }

    pub fn state(&self) -> &PongState {
        &self.state
    }

    /// Overwrite the state, e.g. to set up a scripted situation.
    pub fn set_state(&mut self, state: PongState) {
        self.state = state;
    }

    /// Start a new point with the ball in the middle of the court.
    pub fn reset(&mut self) {
        self.state = Self::serve_state(&self.config, &mut self.rng);
    }

    fn serve_state(config: &PongConfig, rng: &mut StdRng) -> PongState {
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let dy = rng.random_range(-0.5..=0.5) * config.max_ball_dy;
        PongState {
            ball_x: config.width as f32 / 2.0,
            ball_y: config.height as f32 / 2.0,
            ball_dx: direction * config.ball_speed,
            ball_dy: dy,
            left_y: config.height as f32 / 2.0,
            right_y: config.height as f32 / 2.0,
            steps: 0,
        }
    }

    /// Advance one tick with both players' actions.
    pub fn step(&mut self, left: Action, right: Action) -> StepResult {
        let cfg = &self.config;
        let half_paddle = cfg.paddle_height as f32 / 2.0;
        let half_ball = cfg.ball_size as f32 / 2.0;
        let height = cfg.height as f32;
        let width = cfg.width as f32;

        let s = &mut self.state;
        s.left_y = (s.left_y + left.dy() * cfg.paddle_speed).clamp(half_paddle, height - half_paddle);
        s.right_y =
            (s.right_y + right.dy() * cfg.paddle_speed).clamp(half_paddle, height - half_paddle);

        s.ball_x += s.ball_dx;
        s.ball_y += s.ball_dy;

        if s.ball_y - half_ball < 0.0 {
            s.ball_y = half_ball;
            s.ball_dy = s.ball_dy.abs();
        } else if s.ball_y + half_ball > height {
            s.ball_y = height - half_ball;
            s.ball_dy = -s.ball_dy.abs();
        }

        let left_face = (cfg.left_paddle_x() + cfg.paddle_width) as f32;
        let left_back = cfg.left_paddle_x() as f32;
        if s.ball_dx < 0.0
            && s.ball_x - half_ball <= left_face
            && s.ball_x + half_ball >= left_back
            && (s.ball_y - s.left_y).abs() <= half_paddle + half_ball
        {
            s.ball_x = left_face + half_ball;
            s.ball_dx = s.ball_dx.abs();
            let offset = (s.ball_y - s.left_y) / (half_paddle + half_ball);
            s.ball_dy = (s.ball_dy + offset * PADDLE_SPIN).clamp(-cfg.max_ball_dy, cfg.max_ball_dy);
        }

        let right_face = cfg.right_paddle_x() as f32;
        let right_back = (cfg.right_paddle_x() + cfg.paddle_width) as f32;
        if s.ball_dx > 0.0
            && s.ball_x + half_ball >= right_face
            && s.ball_x - half_ball <= right_back
            && (s.ball_y - s.right_y).abs() <= half_paddle + half_ball
        {
            s.ball_x = right_face - half_ball;
            s.ball_dx = -s.ball_dx.abs();
            let offset = (s.ball_y - s.right_y) / (half_paddle + half_ball);
            s.ball_dy = (s.ball_dy + offset * PADDLE_SPIN).clamp(-cfg.max_ball_dy, cfg.max_ball_dy);
        }

        s.steps += 1;

        let reward = cfg.score_reward;
        if s.ball_x + half_ball < 0.0 {
            StepResult {
                rewards: (-reward, reward),
                done: true,
                winner: Some(Side::Right),
            }
        } else if s.ball_x - half_ball > width {
            StepResult {
                rewards: (reward, -reward),
                done: true,
                winner: Some(Side::Left),
            }
        } else if s.steps >= cfg.max_steps {
            StepResult {
                rewards: (0.0, 0.0),
                done: true,
                winner: None,
            }
        } else {
            StepResult {
                rewards: (0.0, 0.0),
                done: false,
                winner: None,
            }
        }
    }

    /// Render the court as seen by a spectator (left player on the left).
    pub fn render(&self) -> Frame {
        let cfg = &self.config;
        let s = &self.state;
        let mut frame = Frame::filled(cfg.height, cfg.width, BACKGROUND);

        let half_paddle = cfg.paddle_height as f32 / 2.0;
        for (x, y) in [
            (cfg.left_paddle_x(), s.left_y),
            (cfg.right_paddle_x(), s.right_y),
        ] {
            frame.fill_rect(
                (y - half_paddle).round() as isize,
                x as isize,
                cfg.paddle_height,
                cfg.paddle_width,
                FOREGROUND,
            );
        }

        let half_ball = cfg.ball_size as f32 / 2.0;
        frame.fill_rect(
            (s.ball_y - half_ball).round() as isize,
            (s.ball_x - half_ball).round() as isize,
            cfg.ball_size,
            cfg.ball_size,
            FOREGROUND,
        );
        frame
    }

    /// The frame from one player's point of view; the right player's view is
    /// mirrored so that every player sees its own paddle on the left.
    pub fn observation(&self, side: Side) -> Frame {
        let frame = self.render();
        match side {
            Side::Left => frame,
            Side::Right => frame.mirrored(),
        }
    }

    /// Normalized positions from one player's point of view.
    pub fn ground_truth(&self, side: Side) -> GroundTruth {
        let width = self.config.width as f32;
        let height = self.config.height as f32;
        let s = &self.state;
        let (ball_x, my_y, opponent_y) = match side {
            Side::Left => (s.ball_x, s.left_y, s.right_y),
            Side::Right => (width - s.ball_x, s.right_y, s.left_y),
        };
        GroundTruth {
            ball_x: ball_x / width,
            ball_y: s.ball_y / height,
            my_y: my_y / height,
            opponent_y: opponent_y / height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> PongGame {
        PongGame::new(PongConfig::small())
    }

    #[test]
    fn test_reset_centers_ball() {
        let g = game();
        let cfg = g.config();
        assert_eq!(g.state().ball_x, cfg.width as f32 / 2.0);
        assert_eq!(g.state().ball_y, cfg.height as f32 / 2.0);
        assert_eq!(g.state().ball_dx.abs(), cfg.ball_speed);
    }

    #[test]
    fn test_paddle_clamped_to_court() {
        let mut g = game();
        for _ in 0..100 {
            let mut state = g.state().clone();
            state.ball_x = g.config().width as f32 / 2.0;
            state.ball_dx = 0.0;
            g.set_state(state);
            g.step(Action::Up, Action::Down);
        }
        let half = g.config().paddle_height as f32 / 2.0;
        assert_eq!(g.state().left_y, half);
        assert_eq!(g.state().right_y, g.config().height as f32 - half);
    }

    #[test]
    fn test_ball_passing_left_edge_scores_for_right() {
        let mut g = game();
        let mut state = g.state().clone();
        state.ball_x = 0.5;
        state.ball_y = 2.0;
        state.ball_dx = -2.0;
        state.ball_dy = 0.0;
        state.left_y = g.config().height as f32 - 3.0;
        g.set_state(state);

        let result = g.step(Action::Stay, Action::Stay);
        assert!(result.done);
        assert_eq!(result.winner, Some(Side::Right));
        assert_eq!(result.rewards, (-10.0, 10.0));
    }

    #[test]
    fn test_paddle_returns_ball() {
        let mut g = game();
        let cfg = g.config().clone();
        let mut state = g.state().clone();
        state.ball_x = (cfg.left_paddle_x() + cfg.paddle_width) as f32 + 2.0;
        state.ball_y = 15.0;
        state.left_y = 15.0;
        state.ball_dx = -2.0;
        state.ball_dy = 0.0;
        g.set_state(state);

        let result = g.step(Action::Stay, Action::Stay);
        assert!(!result.done);
        assert!(g.state().ball_dx > 0.0);
    }

    #[test]
    fn test_max_steps_ends_without_reward() {
        let mut config = PongConfig::small();
        config.max_steps = 1;
        let mut g = PongGame::new(config);
        let result = g.step(Action::Stay, Action::Stay);
        assert!(result.done);
        assert_eq!(result.winner, None);
        assert_eq!(result.rewards, (0.0, 0.0));
    }

    #[test]
    fn test_render_draws_objects() {
        let g = game();
        let frame = g.render();
        let cfg = g.config();
        let foreground = (0..cfg.height)
            .flat_map(|r| (0..cfg.width).map(move |c| (r, c)))
            .filter(|&(r, c)| !frame.is_background(r, c))
            .count();
        let expected = 2 * cfg.paddle_height * cfg.paddle_width + cfg.ball_size * cfg.ball_size;
        assert_eq!(foreground, expected);
    }

    #[test]
    fn test_ground_truth_is_mirrored_for_right() {
        let mut g = game();
        let mut state = g.state().clone();
        state.ball_x = 10.0;
        state.left_y = 5.0;
        state.right_y = 20.0;
        g.set_state(state);

        let left = g.ground_truth(Side::Left);
        let right = g.ground_truth(Side::Right);
        assert!((left.ball_x + right.ball_x - 1.0).abs() < 1e-6);
        assert_eq!(left.my_y, right.opponent_y);
        assert_eq!(left.opponent_y, right.my_y);
        assert_eq!(left.ball_y, right.ball_y);
    }
}
