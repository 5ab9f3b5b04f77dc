use crate::game::{Action, Frame, PongConfig, PongGame, Side, CHANNELS};

/// Shape of one player's observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationSpace {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

/// Number of discrete actions per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpace {
    pub n: usize,
}

/// Diagnostic information attached to a step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInfo {
    pub winner: Option<Side>,
    pub steps: usize,
}

/// Result of stepping a two-player environment.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// (player 1 view, player 2 view)
    pub observations: (Frame, Frame),
    /// (player 1 reward, player 2 reward)
    pub rewards: (f32, f32),
    pub done: bool,
    pub info: StepInfo,
}

/// Gym-style two-player environment.
pub trait Environment {
    /// Start a new episode and return both players' observations.
    fn reset(&mut self) -> (Frame, Frame);

    fn step(&mut self, actions: (Action, Action)) -> StepOutcome;

    fn observation_space(&self) -> ObservationSpace;

    fn action_space(&self) -> ActionSpace {
        ActionSpace { n: Action::COUNT }
    }

    /// Spectator view for live display, if the environment can draw one.
    fn render(&self) -> Option<Frame> {
        None
    }
}

/// [`Environment`] backed by the built-in simulator. Player 2's observation
/// is mirrored.
pub struct PongEnvironment {
    game: PongGame,
}

impl PongEnvironment {
    pub fn new(config: PongConfig) -> Self {
        PongEnvironment {
            game: PongGame::new(config),
        }
    }

    pub fn game(&self) -> &PongGame {
        &self.game
    }

    fn observations(&self) -> (Frame, Frame) {
        (
            self.game.observation(Side::Left),
            self.game.observation(Side::Right),
        )
    }
}

impl Environment for PongEnvironment {
    fn reset(&mut self) -> (Frame, Frame) {
        self.game.reset();
        self.observations()
    }

    fn step(&mut self, actions: (Action, Action)) -> StepOutcome {
        let result = self.game.step(actions.0, actions.1);
        StepOutcome {
            observations: self.observations(),
            rewards: result.rewards,
            done: result.done,
            info: StepInfo {
                winner: result.winner,
                steps: self.game.state().steps,
            },
        }
    }

    fn observation_space(&self) -> ObservationSpace {
        let config = self.game.config();
        ObservationSpace {
            height: config.height,
            width: config.width,
            channels: CHANNELS,
        }
    }

    fn render(&self) -> Option<Frame> {
        Some(self.game.render())
    }
}
