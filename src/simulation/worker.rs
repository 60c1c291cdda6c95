//! Rollout worker
use super::{EpisodeCounter, WorkerReport};
use crate::envs::{EnvError, Environment};
use crate::logging::MetricsSink;
use crate::torch::agents::{ModelError, SharedActorCritic, UpdateOutcome};
use crate::trajectory::{Trajectory, TrajectoryError};
use crate::Prng;
use std::sync::{Mutex, PoisonError};
use std::thread;
use thiserror::Error;
use tracing::info;

/// Error that ends a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

/// Outcome of one episode, after its training update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    /// Cumulative reward
    pub score: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether the episode ended in a terminal state (rather than being truncated)
    pub terminal: bool,
    pub update: UpdateOutcome,
}

/// Collects full episodes from its own environment and trains the shared model on each.
pub struct RolloutWorker<'a, E, S> {
    id: usize,
    env: E,
    model: &'a SharedActorCritic,
    counter: &'a EpisodeCounter,
    sink: &'a Mutex<S>,
    rng: Prng,
    trajectory: Trajectory,
}

impl<'a, E, S> RolloutWorker<'a, E, S>
where
    E: Environment,
    S: MetricsSink,
{
    pub fn new(
        id: usize,
        env: E,
        model: &'a SharedActorCritic,
        counter: &'a EpisodeCounter,
        sink: &'a Mutex<S>,
        rng: Prng,
    ) -> Self {
        let trajectory = Trajectory::new(model.observation_dim(), model.num_actions());
        Self {
            id,
            env,
            model,
            counter,
            sink,
            rng,
            trajectory,
        }
    }

    /// Run episodes until the shared budget is exhausted.
    ///
    /// On error the counter is aborted so that the other workers stop at their next episode.
    pub fn run(mut self) -> Result<WorkerReport, WorkerError> {
        let _guard = AbortOnPanic(self.counter);
        let mut report = WorkerReport::new(self.id);
        while self.counter.try_start() {
            let episode = match self.run_episode() {
                Ok(episode) => episode,
                Err(err) => {
                    self.counter.abort();
                    return Err(err);
                }
            };
            let index = self.counter.complete();
            self.emit(index, episode.score);

            report.episodes += 1;
            if !episode.update.is_applied() {
                report.skipped_updates += 1;
            }
            report.scores.push(episode.score);
            #[allow(clippy::cast_precision_loss)]
            let steps = episode.steps as f64;
            report.lengths.push(steps);
        }
        Ok(report)
    }

    /// Run one full episode then train the model on it.
    pub fn run_episode(&mut self) -> Result<EpisodeResult, WorkerError> {
        self.trajectory.clear();
        let mut observation = self.env.reset()?;
        let terminal = loop {
            let action = self.model.policy_action(&observation, &mut self.rng)?;
            let step = self.env.step(action)?;
            self.trajectory.push(&observation, action, step.reward)?;
            if step.episode_done() {
                break step.terminal;
            }
            observation = step.observation;
        };
        let update = self.model.train(&self.trajectory, terminal)?;
        Ok(EpisodeResult {
            score: self.trajectory.total_reward(),
            steps: self.trajectory.len(),
            terminal,
            update,
        })
    }

    fn emit(&self, index: usize, score: f64) {
        {
            // Each write is a single call so a poisoned sink is still consistent.
            let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            sink.add_scalar("score", score, index);
            sink.flush();
        }
        info!(worker = self.id, "Episode {} score {}", index, score);
    }
}

/// Aborts the episode counter if the thread unwinds while this is alive.
struct AbortOnPanic<'a>(&'a EpisodeCounter);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}
