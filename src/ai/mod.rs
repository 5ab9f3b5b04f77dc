//! Agents: frame preprocessing, perception regressors, the actor-critic
//! policy, and the opponents it trains against.

mod agent;
pub mod algorithms;
pub mod backend;
pub mod distribution;
pub mod networks;
pub mod perception;
pub mod preprocess;
mod registry;
mod simple_ai;
pub mod state;

pub use agent::{PongAgent, UpdateMetrics};
pub use algorithms::{ActorCriticAgent, ActorCriticConfig, PolicyInput};
pub use distribution::{ActionSelection, PolicyStep};
pub use networks::{
    ActorCriticNetwork, ActorCriticNetworkConfig, PerceptionNetwork, PerceptionNetworkConfig,
};
pub use perception::{Estimate, PerceptionStack, PerceptionTarget};
pub use registry::AgentSpec;
pub use simple_ai::SimpleAi;
pub use state::{StateBuilder, StateVector};
