use std::path::Path;

use tracing::warn;

use crate::ai::ActorCriticConfig;
use crate::error::ConfigError;
use crate::game::PongConfig;
use crate::training::perception_trainer::PerceptionConfig;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: ActorCriticConfig,
    pub perception: PerceptionConfig,
    pub training: TrainerConfig,
    pub environment: PongConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if agent.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "agent.learning_rate must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.gamma) {
            return Err(ConfigError::Validation(
                "agent.gamma must be in [0, 1]".into(),
            ));
        }
        if agent.actor_coeff < 0.0 {
            return Err(ConfigError::Validation(
                "agent.actor_coeff must be >= 0".into(),
            ));
        }
        if agent.critic_coeff < 0.0 {
            return Err(ConfigError::Validation(
                "agent.critic_coeff must be >= 0".into(),
            ));
        }
        if !agent.entropy_coeff.is_finite() {
            return Err(ConfigError::Validation(
                "agent.entropy_coeff must be finite".into(),
            ));
        }
        if agent.hidden_dim == 0 {
            return Err(ConfigError::Validation(
                "agent.hidden_dim must be > 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&agent.rmsprop_alpha) {
            return Err(ConfigError::Validation(
                "agent.rmsprop_alpha must be in [0, 1)".into(),
            ));
        }
        if agent.rmsprop_epsilon <= 0.0 {
            return Err(ConfigError::Validation(
                "agent.rmsprop_epsilon must be > 0".into(),
            ));
        }

        let perception = &self.perception;
        if perception.hidden_dim == 0 {
            return Err(ConfigError::Validation(
                "perception.hidden_dim must be > 0".into(),
            ));
        }
        if perception.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "perception.learning_rate must be > 0".into(),
            ));
        }
        if perception.batch_size == 0 {
            return Err(ConfigError::Validation(
                "perception.batch_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&perception.action_noise) {
            return Err(ConfigError::Validation(
                "perception.action_noise must be in [0, 1]".into(),
            ));
        }

        if self.training.num_episodes == 0 {
            return Err(ConfigError::Validation(
                "training.num_episodes must be > 0".into(),
            ));
        }
        if self.training.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }
        if self.training.live_frame_interval == 0 {
            return Err(ConfigError::Validation(
                "training.live_frame_interval must be > 0".into(),
            ));
        }

        self.environment.validate().map_err(ConfigError::Validation)?;

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).unwrap_or_default()
    }
}
