//! Two-player Pong simulation: court physics, actions, and RGB frame
//! rendering with per-player mirrored observations.

mod action;
mod config;
mod engine;
mod frame;

pub use action::Action;
pub use config::PongConfig;
pub use engine::{GroundTruth, PongGame, PongState, Side, StepResult};
pub use frame::{Frame, BACKGROUND, CHANNELS, FOREGROUND};
