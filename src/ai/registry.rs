use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use super::agent::PongAgent;
use super::algorithms::{ActorCriticAgent, ActorCriticConfig};
use super::networks::PerceptionNetworkConfig;
use super::simple_ai::SimpleAi;
use crate::checkpoint::CheckpointStore;
use crate::error::AgentError;
use crate::game::PongConfig;

/// Which player to put on the other side of the court.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentSpec {
    /// The scripted ball chaser.
    Simple,
    /// A frozen actor-critic agent loaded from a checkpoint directory.
    ActorCritic(PathBuf),
}

impl AgentSpec {
    /// `None` means the scripted baseline.
    pub fn from_dir(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => AgentSpec::ActorCritic(dir),
            None => AgentSpec::Simple,
        }
    }

    /// Construct the agent and load its model.
    pub fn build(
        &self,
        agent_config: &ActorCriticConfig,
        perception_config: &PerceptionNetworkConfig,
        environment: &PongConfig,
    ) -> Result<Box<dyn PongAgent + Send>, AgentError> {
        let mut agent: Box<dyn PongAgent + Send> = match self {
            AgentSpec::Simple => Box::new(SimpleAi::new(environment)),
            AgentSpec::ActorCritic(dir) => Box::new(
                ActorCriticAgent::new(agent_config.clone(), perception_config.clone())
                    .with_checkpoint(CheckpointStore::new(dir)),
            ),
        };
        agent.load_model()?;
        info!(opponent = agent.name(), "opponent ready");
        Ok(agent)
    }
}

impl fmt::Display for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentSpec::Simple => write!(f, "simple"),
            AgentSpec::ActorCritic(dir) => write!(f, "actor-critic:{}", dir.display()),
        }
    }
}

impl FromStr for AgentSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "simple" {
            return Ok(AgentSpec::Simple);
        }
        match s.strip_prefix("actor-critic:") {
            Some(dir) if !dir.is_empty() => Ok(AgentSpec::ActorCritic(PathBuf::from(dir))),
            _ => Err(format!(
                "unknown agent '{s}', expected 'simple' or 'actor-critic:<dir>'"
            )),
        }
    }
}
