//! Torch components
pub mod agents;
pub mod distributions;
pub mod modules;
pub mod optimizers;
pub mod policy_value;

pub use modules::{Activation, MlpConfig};
pub use optimizers::OptimizerConfig;
pub use policy_value::PolicyValueConfig;
