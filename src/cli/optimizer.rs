use crate::torch::optimizers::OptimizerConfig;
use clap::ArgEnum;

/// Optimizer name
#[derive(ArgEnum, Debug, PartialEq, Eq, Clone, Copy)]
pub enum OptimizerType {
    Sgd,
    RmsProp,
    Adam,
}

impl OptimizerType {
    /// Default configuration of this optimizer with the given learning rate.
    pub const fn config(self, learning_rate: f64) -> OptimizerConfig {
        match self {
            Self::Sgd => OptimizerConfig::sgd(learning_rate),
            Self::RmsProp => OptimizerConfig::rms_prop(learning_rate),
            Self::Adam => OptimizerConfig::adam(learning_rate),
        }
    }
}
