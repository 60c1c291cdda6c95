//! Environment testing utilities
use super::{
    check_action, ActionSpace, BuildEnv, BuildEnvError, EnvError, EnvStructure, Environment, Step,
};
use crate::Prng;
use rand::{Rng, SeedableRng};

/// Run an environment with uniform random actions and check that invariants are satisfied.
pub fn check_env_invariants<E: Environment + ?Sized>(env: &mut E, num_steps: u64, seed: u64) {
    let structure = env.structure();
    let (min_reward, max_reward) = structure.reward_range;
    let num_actions = structure
        .num_actions()
        .expect("discrete action space required");
    let observation_dim = structure.observation_dim();
    let mut rng = Prng::seed_from_u64(seed);

    assert_eq!(env.reset().unwrap().len(), observation_dim);
    for _ in 0..num_steps {
        let step = env.step(rng.gen_range(0..num_actions)).unwrap();
        assert!(step.reward >= min_reward);
        assert!(step.reward <= max_reward);
        assert_eq!(step.observation.len(), observation_dim);
        assert!(step.observation.iter().all(|x| x.is_finite()));
        if step.episode_done() {
            assert_eq!(env.reset().unwrap().len(), observation_dim);
        }
    }
}

/// Deterministic environment with episodes of a fixed length and a constant reward.
///
/// The observation is `[t / len, 1.0]` where `t` is the number of steps taken this episode.
/// Any valid action is accepted and has no effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEpisodeEnv {
    pub episode_len: usize,
    pub num_actions: usize,
    pub reward: f64,
    /// Steps taken in the current episode. `None` if no episode is active.
    t: Option<usize>,
}

impl FixedEpisodeEnv {
    pub const fn new(episode_len: usize, num_actions: usize, reward: f64) -> Self {
        Self {
            episode_len,
            num_actions,
            reward,
            t: None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn observation(&self, t: usize) -> Vec<f32> {
        vec![t as f32 / self.episode_len as f32, 1.0]
    }
}

impl BuildEnv for FixedEpisodeEnv {
    type Environment = Self;

    fn build_env(&self, _: u64) -> Result<Self::Environment, BuildEnvError> {
        Ok(*self)
    }
}

impl Environment for FixedEpisodeEnv {
    fn structure(&self) -> EnvStructure {
        EnvStructure {
            observation_shape: vec![2],
            action_space: ActionSpace::Discrete {
                n: self.num_actions,
            },
            reward_range: (self.reward.min(0.0), self.reward.max(0.0)),
        }
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        self.t = Some(0);
        Ok(self.observation(0))
    }

    fn step(&mut self, action: usize) -> Result<Step, EnvError> {
        check_action(action, self.num_actions)?;
        let t = self.t.ok_or(EnvError::NoActiveEpisode)? + 1;
        let terminal = t >= self.episode_len;
        self.t = if terminal { None } else { Some(t) };
        Ok(Step {
            observation: self.observation(t),
            reward: self.reward,
            terminal,
            truncated: false,
        })
    }
}

/// Environment configuration whose instances fail on a given step of their first episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailingEnvConfig {
    /// Index of the step that fails.
    pub fail_at_step: usize,
}

/// Environment that fails after a set number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailingEnv {
    fail_at_step: usize,
    steps: usize,
}

impl BuildEnv for FailingEnvConfig {
    type Environment = FailingEnv;

    fn build_env(&self, _: u64) -> Result<Self::Environment, BuildEnvError> {
        Ok(FailingEnv {
            fail_at_step: self.fail_at_step,
            steps: 0,
        })
    }
}

impl Environment for FailingEnv {
    fn structure(&self) -> EnvStructure {
        EnvStructure {
            observation_shape: vec![1],
            action_space: ActionSpace::Discrete { n: 2 },
            reward_range: (0.0, 0.0),
        }
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        Ok(vec![0.0])
    }

    fn step(&mut self, _: usize) -> Result<Step, EnvError> {
        if self.steps >= self.fail_at_step {
            return Err(EnvError::Simulator("connection lost".into()));
        }
        self.steps += 1;
        Ok(Step {
            observation: vec![0.0],
            reward: 0.0,
            terminal: false,
            truncated: false,
        })
    }
}

/// Environment configuration with a continuous action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuousEnvConfig;

impl BuildEnv for ContinuousEnvConfig {
    type Environment = ContinuousEnv;

    fn build_env(&self, _: u64) -> Result<Self::Environment, BuildEnvError> {
        Ok(ContinuousEnv)
    }
}

/// Environment with a continuous action space. Every step is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuousEnv;

impl Environment for ContinuousEnv {
    fn structure(&self) -> EnvStructure {
        EnvStructure {
            observation_shape: vec![3],
            action_space: ActionSpace::Continuous { shape: vec![1] },
            reward_range: (-16.0, 0.0),
        }
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        Ok(vec![0.0; 3])
    }

    fn step(&mut self, _: usize) -> Result<Step, EnvError> {
        Ok(Step {
            observation: vec![0.0; 3],
            reward: 0.0,
            terminal: true,
            truncated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_episode_env_invariants() {
        let mut env = FixedEpisodeEnv::new(3, 2, 1.0);
        check_env_invariants(&mut env, 100, 0);
    }

    #[test]
    fn fixed_episode_env_terminates_on_last_step() {
        let mut env = FixedEpisodeEnv::new(3, 2, 1.0);
        env.reset().unwrap();
        assert!(!env.step(0).unwrap().terminal);
        assert!(!env.step(1).unwrap().terminal);
        assert!(env.step(0).unwrap().terminal);
        assert_eq!(env.step(0), Err(EnvError::NoActiveEpisode));
    }
}
