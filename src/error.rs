//! Error type
use crate::envs::{BuildEnvError, EnvError};
use crate::torch::agents::ModelError;
use crate::trajectory::TrajectoryError;
use std::io;
use thiserror::Error;

/// Error from an A3C training run.
#[derive(Error, Debug)]
pub enum A3cError {
    #[error("error building environment")]
    BuildEnv(#[from] BuildEnvError),
    #[error("error building model")]
    Model(#[from] ModelError),
    #[error("worker {worker} environment failure")]
    Env {
        worker: usize,
        #[source]
        source: EnvError,
    },
    #[error("worker {worker} model failure")]
    Training {
        worker: usize,
        #[source]
        source: ModelError,
    },
    #[error("worker {worker} recorded an invalid step")]
    Trajectory {
        worker: usize,
        #[source]
        source: TrajectoryError,
    },
    #[error("error opening metrics sink")]
    Metrics(#[from] io::Error),
    #[error("at least one worker is required")]
    NoWorkers,
    #[error("worker {0} panicked")]
    WorkerPanic(usize),
    #[error("a training thread panicked")]
    Panic,
}
