//! Torch statistical distributions
mod categorical;

pub use categorical::Categorical;
