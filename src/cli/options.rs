//! Command-line options
use super::OptimizerType;
use crate::envs::EnvConfig;
use crate::logging::TensorBoardConfig;
use crate::simulation::CoordinatorConfig;
use crate::torch::agents::A3cConfig;
use clap::Parser;
use std::path::PathBuf;
use tch::{Cuda, Device};
use tracing::warn;

#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(version, author, about)]
pub struct Options {
    // Environment options
    #[clap(long, default_value = "CartPole-v1", help_heading = "ENVIRONMENT OPTIONS")]
    /// Registered environment name
    pub env: String,

    #[clap(long = "max_episode_steps", help_heading = "ENVIRONMENT OPTIONS")]
    /// Override the environment's per-episode step limit
    pub max_episode_steps: Option<u64>,

    #[clap(long, help_heading = "ENVIRONMENT OPTIONS")]
    /// Render a separate environment instance with the shared policy during training
    pub render: bool,

    // Training options
    #[clap(long = "nb_episodes", default_value_t = 5000, help_heading = "TRAINING OPTIONS")]
    /// Total number of training episodes across all workers
    pub nb_episodes: usize,

    #[clap(long = "n_threads", help_heading = "TRAINING OPTIONS")]
    /// Number of rollout workers [default: number of CPUs]
    pub n_threads: Option<usize>,

    #[clap(long, default_value_t = 0, help_heading = "TRAINING OPTIONS")]
    /// Random seed
    pub seed: u64,

    #[clap(long, help_heading = "TRAINING OPTIONS")]
    /// CUDA device id. Falls back to the CPU if CUDA is unavailable.
    pub gpu: Option<usize>,

    // Model options
    #[clap(long, default_value_t = 0.99, help_heading = "MODEL OPTIONS")]
    /// Discount factor
    pub gamma: f64,

    #[clap(long, default_value_t = 1e-4, help_heading = "MODEL OPTIONS")]
    /// Learning rate
    pub lr: f64,

    #[clap(long, arg_enum, default_value = "rms-prop", help_heading = "MODEL OPTIONS")]
    /// Optimizer type
    pub optimizer: OptimizerType,

    // Logging options
    #[clap(long = "log_dir", help_heading = "LOGGING OPTIONS")]
    /// Tensorboard log directory [default: tensorboard_<env>]
    pub log_dir: Option<PathBuf>,
}

impl Options {
    pub fn env_config(&self) -> EnvConfig {
        EnvConfig {
            name: self.env.clone(),
            max_episode_steps: self.max_episode_steps,
        }
    }

    pub fn model_config(&self) -> A3cConfig {
        A3cConfig {
            gamma: self.gamma,
            optimizer: self.optimizer.config(self.lr),
            device: self.device(),
            ..A3cConfig::default()
        }
    }

    pub const fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            seed: self.seed,
            render: self.render,
        }
    }

    pub fn sink_config(&self) -> TensorBoardConfig {
        TensorBoardConfig::new(self.log_dir())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("tensorboard_{}", self.env)))
    }

    pub fn num_workers(&self) -> usize {
        self.n_threads.unwrap_or_else(num_cpus::get)
    }

    /// Torch device for the shared model.
    pub fn device(&self) -> Device {
        match self.gpu {
            Some(id) if Cuda::is_available() => Device::Cuda(id),
            Some(id) => {
                warn!(gpu = id, "CUDA is not available; using the CPU");
                Device::Cpu
            }
            None => Device::Cpu,
        }
    }
}
