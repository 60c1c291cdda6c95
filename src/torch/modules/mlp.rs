//! Multi-layer perceptron
use super::Activation;
use serde::{Deserialize, Serialize};
use std::iter;
use tch::{
    nn::{self, Linear, Module, Path},
    Tensor,
};

/// Configuration for the [`Mlp`] module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Sizes of the hidden layers
    pub hidden_sizes: Vec<usize>,
    /// Activation function between hidden layers.
    pub activation: Activation,
    /// Activation function on the output.
    pub output_activation: Activation,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![128],
            activation: Activation::Relu,
            output_activation: Activation::Identity,
        }
    }
}

impl MlpConfig {
    pub fn build(&self, vs: &Path, in_dim: usize, out_dim: usize) -> Mlp {
        Mlp::new(vs, in_dim, out_dim, self)
    }
}

/// Multi-layer perceptron
#[derive(Debug)]
pub struct Mlp {
    /// Never empty
    layers: Vec<Linear>,
    activation: Activation,
    output_activation: Activation,
}

impl Mlp {
    #[allow(clippy::cast_possible_wrap)]
    pub fn new(vs: &Path, in_dim: usize, out_dim: usize, config: &MlpConfig) -> Self {
        let in_dims = iter::once(&in_dim).chain(&config.hidden_sizes);
        let out_dims = config.hidden_sizes.iter().chain(iter::once(&out_dim));

        let layers = in_dims
            .zip(out_dims)
            .enumerate()
            .map(|(i, (in_, out_))| {
                nn::linear(
                    vs / format!("layer_{}", i),
                    *in_ as i64,
                    *out_ as i64,
                    nn::LinearConfig::default(),
                )
            })
            .collect();

        Self {
            layers,
            activation: config.activation,
            output_activation: config.output_activation,
        }
    }

    /// Apply the network to a batch of inputs of shape `[BATCH, in_dim]`.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        let (first, rest) = self
            .layers
            .split_first()
            .expect("mlp has at least one layer by construction");
        let mut hidden = first.forward(input);
        for layer in rest {
            hidden = layer.forward(&self.activation.apply(hidden));
        }
        self.output_activation.apply(hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn forward_batch_shape() {
        let vs = nn::VarStore::new(Device::Cpu);
        let mlp = MlpConfig::default().build(&vs.root(), 3, 2);
        let input = Tensor::ones(&[4, 3], (Kind::Float, Device::Cpu));
        assert_eq!(mlp.forward(&input).size(), vec![4, 2]);
    }

    #[test]
    fn layer_count_and_parameters() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = MlpConfig {
            hidden_sizes: vec![64, 128],
            ..MlpConfig::default()
        };
        let mlp = config.build(&vs.root(), 4, 2);
        assert_eq!(mlp.layers.len(), 3);
        // weight and bias per layer
        assert_eq!(vs.trainable_variables().len(), 6);
    }

    #[test]
    fn output_activation_applied() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = MlpConfig {
            output_activation: Activation::Relu,
            ..MlpConfig::default()
        };
        let mlp = config.build(&vs.root(), 3, 5);
        let input = Tensor::randn(&[10, 3], (Kind::Float, Device::Cpu));
        let output = mlp.forward(&input);
        assert!(bool::from(output.greater_equal(0.0).all()));
    }
}
