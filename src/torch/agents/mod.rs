//! Torch agents
mod a3c;

pub use a3c::{A3cConfig, ModelError, SharedActorCritic, UpdateOutcome};
