use crate::error::AgentError;
use crate::game::{Action, Frame};

/// Metrics returned from one policy update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateMetrics {
    pub loss: f32,
    pub actor_loss: f32,
    pub critic_loss: f32,
    pub entropy: f32,
    pub episode_length: usize,
}

/// Interface shared by every Pong player: the agent under training, a frozen
/// opponent checkpoint, or a scripted baseline.
///
/// Each player sees its own observation, mirrored so that its paddle is on
/// the left.
pub trait PongAgent {
    /// Choose an action for the current observation.
    fn get_action(&mut self, observation: &Frame) -> Result<Action, AgentError>;

    /// Load whatever model the agent needs before it can act.
    fn load_model(&mut self) -> Result<(), AgentError> {
        Ok(())
    }

    /// Display name.
    fn name(&self) -> &str;

    /// Clear per-episode memory. Called before every episode.
    fn reset(&mut self) {}
}
