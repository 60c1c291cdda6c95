//! Command-line interface
mod optimizer;
mod options;

pub use optimizer::OptimizerType;
pub use options::Options;
