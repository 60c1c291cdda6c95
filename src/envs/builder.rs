use super::{ActionSpace, CartPoleConfig, EnvStructure, Environment, WithStepLimit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Build an environment instance.
pub trait BuildEnv {
    type Environment: Environment + Send;

    /// Build an environment instance.
    ///
    /// # Args
    /// * `seed` - Seed for pseudo-randomness used by the environment dynamics.
    fn build_env(&self, seed: u64) -> Result<Self::Environment, BuildEnvError>;
}

/// Error building an environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildEnvError {
    #[error("unknown environment \"{0}\"")]
    UnknownEnvironment(String),
    #[error("unsupported action space {0}; only discrete action spaces are supported")]
    UnsupportedActionSpace(ActionSpace),
    #[error("action space is empty")]
    EmptyActionSpace,
    #[error("observation space is empty")]
    EmptyObservation,
}

impl BuildEnvError {
    /// Check that an environment structure can be trained on.
    ///
    /// # Returns
    /// The number of discrete actions on success.
    pub fn check_structure(structure: &EnvStructure) -> Result<usize, Self> {
        let num_actions = match &structure.action_space {
            ActionSpace::Discrete { n } => *n,
            space => return Err(Self::UnsupportedActionSpace(space.clone())),
        };
        if num_actions == 0 {
            return Err(Self::EmptyActionSpace);
        }
        if structure.observation_dim() == 0 {
            return Err(Self::EmptyObservation);
        }
        Ok(num_actions)
    }
}

/// Environment selected by name, as in the Gym registry.
///
/// | Name          | Environment  | Default step limit |
/// |---------------|--------------|--------------------|
/// | `CartPole-v0` | [`CartPole`] | 200                |
/// | `CartPole-v1` | [`CartPole`] | 500                |
///
/// [`CartPole`]: super::CartPole
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Registered environment name.
    pub name: String,
    /// Overrides the registered per-episode step limit.
    pub max_episode_steps: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new("CartPole-v1")
    }
}

impl EnvConfig {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            max_episode_steps: None,
        }
    }
}

impl BuildEnv for EnvConfig {
    type Environment = Box<dyn Environment + Send>;

    fn build_env(&self, seed: u64) -> Result<Self::Environment, BuildEnvError> {
        let (inner, default_steps) = match self.name.as_str() {
            "CartPole-v0" => (CartPoleConfig::default().build_env(seed)?, 200),
            "CartPole-v1" => (CartPoleConfig::default().build_env(seed)?, 500),
            _ => return Err(BuildEnvError::UnknownEnvironment(self.name.clone())),
        };
        let max_steps = self.max_episode_steps.unwrap_or(default_steps);
        Ok(Box::new(WithStepLimit::new(inner, max_steps)))
    }
}
