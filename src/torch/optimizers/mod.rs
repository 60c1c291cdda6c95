//! Optimizers
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;
use tch::{nn::VarStore, COptimizer, TchError};

/// Optimizer configuration.
#[allow(clippy::doc_markdown)] // false positive on RMSProp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizerConfig {
    /// Stochastic gradient descent with optional momentum
    Sgd { learning_rate: f64, momentum: f64 },
    /// RMSProp; `alpha` is the smoothing factor and `eps` is added to the denominator
    RmsProp {
        learning_rate: f64,
        alpha: f64,
        eps: f64,
    },
    /// Adam with running-average coefficients `beta1` and `beta2`
    Adam {
        learning_rate: f64,
        beta1: f64,
        beta2: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::rms_prop(1e-4)
    }
}

impl OptimizerConfig {
    /// Plain SGD without momentum.
    pub const fn sgd(learning_rate: f64) -> Self {
        Self::Sgd {
            learning_rate,
            momentum: 0.0,
        }
    }

    /// RMSProp with a large epsilon, which keeps early actor-critic updates small.
    pub const fn rms_prop(learning_rate: f64) -> Self {
        Self::RmsProp {
            learning_rate,
            alpha: 0.99,
            eps: 0.1,
        }
    }

    /// Adam with the usual running-average coefficients.
    pub const fn adam(learning_rate: f64) -> Self {
        Self::Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
        }
    }

    pub const fn learning_rate(&self) -> f64 {
        match self {
            Self::Sgd { learning_rate, .. }
            | Self::RmsProp { learning_rate, .. }
            | Self::Adam { learning_rate, .. } => *learning_rate,
        }
    }

    /// Replace the learning rate.
    pub fn with_learning_rate(mut self, new_rate: f64) -> Self {
        match &mut self {
            Self::Sgd { learning_rate, .. }
            | Self::RmsProp { learning_rate, .. }
            | Self::Adam { learning_rate, .. } => *learning_rate = new_rate,
        }
        self
    }

    /// Build an optimizer over all trainable variables of `vs`.
    pub fn build_optimizer(&self, vs: &VarStore) -> Result<COptimizer, TchError> {
        let mut optimizer = match *self {
            Self::Sgd {
                learning_rate,
                momentum,
            } => COptimizer::sgd(learning_rate, momentum, 0.0, 0.0, false)?,
            Self::RmsProp {
                learning_rate,
                alpha,
                eps,
            } => COptimizer::rms_prop(learning_rate, alpha, eps, 0.0, 0.0, false)?,
            Self::Adam {
                learning_rate,
                beta1,
                beta2,
            } => COptimizer::adam(learning_rate, beta1, beta2, 0.0)?,
        };
        let variables = vs
            .variables_
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for var in &variables.trainable_variables {
            optimizer.add_parameters(&var.tensor, var.group)?;
        }
        Ok(optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tch::{nn, Device, Kind, Tensor};

    #[rstest]
    #[case(OptimizerConfig::sgd(0.1))]
    #[case(OptimizerConfig::rms_prop(0.1))]
    #[case(OptimizerConfig::adam(0.1))]
    fn minimizes_quadratic(#[case] config: OptimizerConfig) {
        let vs = nn::VarStore::new(Device::Cpu);
        let x = vs.root().zeros("x", &[2]);
        let optimizer = config.build_optimizer(&vs).unwrap();

        let target = Tensor::of_slice(&[-2.0_f32, 3.0]);
        let loss_fn = || (&x - &target).square().sum(Kind::Float);
        let initial_loss = f64::from(loss_fn());
        for _ in 0..200 {
            optimizer.zero_grad().unwrap();
            loss_fn().backward();
            optimizer.step().unwrap();
        }
        assert!(f64::from(loss_fn()) < initial_loss * 0.5);
    }

    #[test]
    fn default_is_rms_prop() {
        let config = OptimizerConfig::default();
        assert_eq!(
            config,
            OptimizerConfig::RmsProp {
                learning_rate: 1e-4,
                alpha: 0.99,
                eps: 0.1
            }
        );
    }

    #[rstest]
    #[case(OptimizerConfig::sgd(1.0))]
    #[case(OptimizerConfig::rms_prop(1.0))]
    #[case(OptimizerConfig::adam(1.0))]
    fn with_learning_rate_keeps_other_fields(#[case] config: OptimizerConfig) {
        let updated = config.clone().with_learning_rate(0.25);
        assert!((updated.learning_rate() - 0.25).abs() < 1e-12);
        assert_eq!(updated.with_learning_rate(1.0), config);
    }
}
