//! Training infrastructure: the environment interface, episode trajectories,
//! return estimation, the actor-critic and perception trainers, metrics, and
//! dashboard message types for live TUI updates.

pub mod dashboard_msg;
pub mod environment;
pub mod metrics;
pub mod perception_trainer;
pub mod returns;
pub mod trainer;
pub mod trajectory;
