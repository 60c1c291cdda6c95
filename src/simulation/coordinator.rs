//! Training coordinator
use super::{render, EpisodeCounter, RolloutWorker, TrainingSummary, WorkerError};
use crate::envs::{BuildEnv, BuildEnvError, Environment};
use crate::error::A3cError;
use crate::logging::{BuildMetricsSink, MetricsSink};
use crate::torch::agents::{A3cConfig, SharedActorCritic};
use crate::Prng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Run-level settings for [`TrainingCoordinator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Seed for environments, action sampling and parameter initialization.
    pub seed: u64,
    /// Render the shared policy in a separate environment while training.
    pub render: bool,
}

/// Trains one shared actor-critic model with several concurrent rollout workers.
#[derive(Debug, Clone)]
pub struct TrainingCoordinator<EC, SC> {
    pub env_config: EC,
    pub model_config: A3cConfig,
    pub sink_config: SC,
    pub config: CoordinatorConfig,
}

impl<EC, SC> TrainingCoordinator<EC, SC>
where
    EC: BuildEnv,
    SC: BuildMetricsSink,
{
    pub const fn new(
        env_config: EC,
        model_config: A3cConfig,
        sink_config: SC,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            env_config,
            model_config,
            sink_config,
            config,
        }
    }

    /// Train for `nb_episodes` episodes split among `nb_workers` concurrent workers.
    ///
    /// All environments are built and checked before any worker starts.
    /// If a worker fails the others stop at their next episode boundary and the first error
    /// (in worker order) is returned.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn run(&self, nb_episodes: usize, nb_workers: usize) -> Result<TrainingSummary, A3cError> {
        if nb_workers == 0 {
            return Err(A3cError::NoWorkers);
        }
        let seed = self.config.seed;
        let envs = (0..nb_workers)
            .map(|i| self.env_config.build_env(seed.wrapping_add(i as u64)))
            .collect::<Result<Vec<_>, _>>()?;
        let structure = envs[0].structure();
        let num_actions = BuildEnvError::check_structure(&structure)?;
        let mut render_env = if self.config.render {
            Some(
                self.env_config
                    .build_env(seed.wrapping_add(nb_workers as u64))?,
            )
        } else {
            None
        };

        tch::manual_seed(seed as i64);
        let model = SharedActorCritic::new(
            structure.observation_dim(),
            num_actions,
            &self.model_config,
        )?;
        let counter = EpisodeCounter::new(nb_episodes);
        let sink = Mutex::new(self.sink_config.build_sink()?);
        let mut seeds = Prng::seed_from_u64(seed);
        info!(
            nb_episodes,
            nb_workers,
            observation_dim = structure.observation_dim(),
            num_actions,
            "starting training"
        );

        let results = crossbeam::scope(|scope| {
            let handles: Vec<_> = envs
                .into_iter()
                .enumerate()
                .map(|(i, env)| {
                    let worker = RolloutWorker::new(
                        i,
                        env,
                        &model,
                        &counter,
                        &sink,
                        Prng::seed_from_u64(seeds.gen()),
                    );
                    scope.spawn(move |_| worker.run())
                })
                .collect();

            if let Some(env) = render_env.as_mut() {
                let mut rng = Prng::seed_from_u64(seeds.gen());
                render::render_loop(env, &model, &counter, &mut rng);
            }

            handles
                .into_iter()
                .enumerate()
                .map(|(i, handle)| handle.join().map_err(|_| A3cError::WorkerPanic(i)))
                .collect::<Vec<_>>()
        })
        .map_err(|_| A3cError::Panic)?;

        sink.into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();

        let mut reports = Vec::with_capacity(nb_workers);
        for (worker, result) in results.into_iter().enumerate() {
            match result? {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(worker, %err, "worker failed");
                    return Err(worker_error(worker, err));
                }
            }
        }
        let summary = TrainingSummary::from_reports(reports);
        info!(
            episodes = summary.episodes,
            skipped_updates = summary.skipped_updates,
            score_mean = summary.scores.mean(),
            "training finished"
        );
        Ok(summary)
    }
}

fn worker_error(worker: usize, err: WorkerError) -> A3cError {
    match err {
        WorkerError::Env(source) => A3cError::Env { worker, source },
        WorkerError::Model(source) => A3cError::Training { worker, source },
        WorkerError::Trajectory(source) => A3cError::Trajectory { worker, source },
    }
}
