mod actor_critic;

pub use actor_critic::{ActorCriticAgent, ActorCriticConfig, PolicyInput};
