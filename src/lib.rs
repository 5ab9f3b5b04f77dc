//! # Pong Actor-Critic
//!
//! A reinforcement-learning agent for two-player Pong. Perception networks
//! regress ball and paddle positions from raw frames; an actor-critic policy
//! trained with once-per-episode Monte-Carlo updates acts on them. Networks,
//! autodiff and optimizers come from the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`]: Pong simulator, actions, RGB frames
//! - [`ai`]: preprocessing, perception and policy networks, agents, opponents
//! - [`training`]: environment interface, trajectories, returns, trainers, metrics
//! - [`checkpoint`]: model and optimizer persistence
//! - [`ui`]: live training view and the final reward chart
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
pub mod ui;
