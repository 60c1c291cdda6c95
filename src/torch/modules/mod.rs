//! Torch modules
mod activations;
mod mlp;

pub use activations::Activation;
pub use mlp::{Mlp, MlpConfig};
