use super::{EnvError, EnvStructure, Environment, Step};

/// Environment wrapper that cuts off episodes after a set number of steps.
///
/// An episode cut off by the limit ends with `truncated` set and `terminal` unset
/// so that learners bootstrap from the final state instead of treating it as terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct WithStepLimit<E> {
    inner: E,
    max_steps_per_episode: u64,
    current_steps: u64,
}

impl<E> WithStepLimit<E> {
    pub const fn new(inner: E, max_steps_per_episode: u64) -> Self {
        Self {
            inner,
            max_steps_per_episode,
            current_steps: 0,
        }
    }
}

impl<E: Environment> Environment for WithStepLimit<E> {
    fn structure(&self) -> EnvStructure {
        self.inner.structure()
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        self.current_steps = 0;
        self.inner.reset()
    }

    fn step(&mut self, action: usize) -> Result<Step, EnvError> {
        let mut step = self.inner.step(action)?;
        self.current_steps += 1;
        if !step.terminal && self.current_steps >= self.max_steps_per_episode {
            step.truncated = true;
        }
        Ok(step)
    }

    fn render(&self) {
        self.inner.render()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::FixedEpisodeEnv;
    use super::*;

    #[test]
    fn truncates_long_episode() {
        let mut env = WithStepLimit::new(FixedEpisodeEnv::new(10, 2, 1.0), 4);
        env.reset().unwrap();
        for _ in 0..3 {
            assert!(!env.step(0).unwrap().episode_done());
        }
        let step = env.step(0).unwrap();
        assert!(step.truncated);
        assert!(!step.terminal);
    }

    #[test]
    fn terminal_before_limit_is_not_truncated() {
        let mut env = WithStepLimit::new(FixedEpisodeEnv::new(3, 2, 1.0), 3);
        env.reset().unwrap();
        env.step(0).unwrap();
        env.step(1).unwrap();
        let step = env.step(0).unwrap();
        assert!(step.terminal);
        assert!(!step.truncated);
    }

    #[test]
    fn reset_restarts_count() {
        let mut env = WithStepLimit::new(FixedEpisodeEnv::new(10, 2, 1.0), 2);
        env.reset().unwrap();
        env.step(0).unwrap();
        env.reset().unwrap();
        assert!(!env.step(0).unwrap().episode_done());
        assert!(env.step(0).unwrap().truncated);
    }

    #[test]
    fn limit_of_one_truncates_every_episode() {
        let mut env = WithStepLimit::new(FixedEpisodeEnv::new(10, 2, 1.0), 1);
        for _ in 0..3 {
            env.reset().unwrap();
            let step = env.step(1).unwrap();
            assert!(step.truncated);
            assert!(!step.terminal);
        }
    }
}
