//! Reinforcement learning environments
mod builder;
mod cartpole;
mod step_limit;
#[cfg(test)]
pub mod testing;

pub use builder::{BuildEnv, BuildEnvError, EnvConfig};
pub use cartpole::{CartPole, CartPoleConfig, EnvironmentParams, PhysicalConstants, Push};
pub use step_limit::WithStepLimit;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Action space of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionSpace {
    /// A finite set of `n` actions indexed `0 .. n`.
    Discrete { n: usize },
    /// Real-valued action vectors with the given shape.
    Continuous { shape: Vec<usize> },
}

impl fmt::Display for ActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Discrete { n } => write!(f, "Discrete({})", n),
            Self::Continuous { shape } => write!(f, "Continuous({:?})", shape),
        }
    }
}

/// The external structure of a reinforcement learning environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvStructure {
    /// Shape of each observation.
    ///
    /// Observations are passed around flattened in row-major order.
    pub observation_shape: Vec<usize>,
    /// The space of all possible actions.
    pub action_space: ActionSpace,
    /// A lower and upper bound on possible reward values.
    ///
    /// These bounds are not required to be tight.
    pub reward_range: (f64, f64),
}

impl EnvStructure {
    /// Number of scalar features in a flattened observation.
    pub fn observation_dim(&self) -> usize {
        self.observation_shape.iter().product()
    }

    /// Number of actions if the action space is discrete.
    pub const fn num_actions(&self) -> Option<usize> {
        match self.action_space {
            ActionSpace::Discrete { n } => Some(n),
            ActionSpace::Continuous { .. } => None,
        }
    }
}

/// The result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Observation of the resulting state.
    pub observation: Vec<f32>,
    /// Reward for this transition.
    pub reward: f64,
    /// The resulting state is terminal: all future rewards are zero.
    pub terminal: bool,
    /// The episode was cut short (for example by a step limit) in a non-terminal state.
    pub truncated: bool,
}

impl Step {
    /// Whether this step ends the episode.
    pub const fn episode_done(&self) -> bool {
        self.terminal || self.truncated
    }
}

/// Error produced while interacting with an environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("step called without an active episode; call reset first")]
    NoActiveEpisode,
    #[error("invalid action {action} for an action space of size {num_actions}")]
    InvalidAction { action: usize, num_actions: usize },
    #[error("simulator failure: {0}")]
    Simulator(String),
}

/// A reinforcement learning environment with internal state.
///
/// Follows the usual reset / step protocol: [`Environment::reset`] starts an episode and
/// [`Environment::step`] advances it until the returned step reports that the episode is done.
pub trait Environment {
    /// The observation and action structure of this environment.
    fn structure(&self) -> EnvStructure;

    /// Reset the environment to a new initial state.
    ///
    /// Must be called before each new episode.
    ///
    /// # Returns
    /// An observation of the initial state.
    fn reset(&mut self) -> Result<Vec<f32>, EnvError>;

    /// Take a step in the environment.
    ///
    /// Returns [`EnvError::NoActiveEpisode`] if the previous step ended the episode
    /// and `reset` has not been called since.
    fn step(&mut self, action: usize) -> Result<Step, EnvError>;

    /// Display the current state. Best effort; the default does nothing.
    fn render(&self) {}
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn structure(&self) -> EnvStructure {
        E::structure(self)
    }
    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        E::reset(self)
    }
    fn step(&mut self, action: usize) -> Result<Step, EnvError> {
        E::step(self, action)
    }
    fn render(&self) {
        E::render(self)
    }
}

/// Check that `action` is a valid index into a discrete space of size `num_actions`.
pub(crate) const fn check_action(action: usize, num_actions: usize) -> Result<(), EnvError> {
    if action < num_actions {
        Ok(())
    } else {
        Err(EnvError::InvalidAction {
            action,
            num_actions,
        })
    }
}
