//! Per-episode experience buffer
use thiserror::Error;

/// One episode of experience.
///
/// Stores flattened states, one-hot actions and rewards, index-aligned by step.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    observation_dim: usize,
    num_actions: usize,
    /// `[len * observation_dim]`, row-major
    states: Vec<f32>,
    /// `[len * num_actions]`, row-major one-hot
    actions: Vec<f32>,
    rewards: Vec<f32>,
    total_reward: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrajectoryError {
    #[error("state has {actual} features; expected {expected}")]
    StateSize { expected: usize, actual: usize },
    #[error("action {action} out of range for {num_actions} actions")]
    InvalidAction { action: usize, num_actions: usize },
}

impl Trajectory {
    pub fn new(observation_dim: usize, num_actions: usize) -> Self {
        Self {
            observation_dim,
            num_actions,
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
            total_reward: 0.0,
        }
    }

    /// Append a step: the state acted from, the action taken and the reward received.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push(&mut self, state: &[f32], action: usize, reward: f64) -> Result<(), TrajectoryError> {
        if state.len() != self.observation_dim {
            return Err(TrajectoryError::StateSize {
                expected: self.observation_dim,
                actual: state.len(),
            });
        }
        if action >= self.num_actions {
            return Err(TrajectoryError::InvalidAction {
                action,
                num_actions: self.num_actions,
            });
        }
        self.states.extend_from_slice(state);
        self.actions
            .extend((0..self.num_actions).map(|i| if i == action { 1.0 } else { 0.0 }));
        self.rewards.push(reward as f32);
        self.total_reward += reward;
        Ok(())
    }

    /// Remove all steps, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.total_reward = 0.0;
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub const fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Flattened states, `len() * observation_dim()` values.
    pub fn states(&self) -> &[f32] {
        &self.states
    }

    /// Flattened one-hot actions, `len() * num_actions()` values.
    pub fn actions_one_hot(&self) -> &[f32] {
        &self.actions
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Sum of all rewards, accumulated at full precision.
    pub const fn total_reward(&self) -> f64 {
        self.total_reward
    }
}
