mod actor_critic;
mod perception;

pub use actor_critic::{ActorCriticNetwork, ActorCriticNetworkConfig};
pub use perception::{PerceptionNetwork, PerceptionNetworkConfig};
