//! Asynchronous Advantage Actor-Critic (A3C) training.
//!
//! Several rollout workers, each with its own environment instance, share one policy-value
//! model. Workers collect full episodes, estimate discounted returns and advantages, and apply
//! their updates to the shared parameters as soon as each episode ends.
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)] // also triggered by macro expansions
pub mod cli;
pub mod critic;
pub mod envs;
mod error;
pub mod logging;
pub mod simulation;
pub mod torch;
pub mod trajectory;
pub mod utils;

pub use envs::{BuildEnv, EnvConfig, EnvStructure, Environment, Step};
pub use error::A3cError;
pub use simulation::{CoordinatorConfig, TrainingCoordinator, TrainingSummary};
pub use torch::agents::{A3cConfig, SharedActorCritic};
pub use trajectory::Trajectory;

/// Pseudo-random number generator type used by workers and environments.
pub type Prng = rand_chacha::ChaCha8Rng;
