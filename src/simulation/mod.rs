//! Concurrent A3C training: workers, episode accounting and the run coordinator
mod coordinator;
mod counter;
pub mod render;
mod summary;
mod worker;

pub use coordinator::{CoordinatorConfig, TrainingCoordinator};
pub use counter::EpisodeCounter;
pub use summary::{TrainingSummary, WorkerReport};
pub use worker::{EpisodeResult, RolloutWorker, WorkerError};
