//! Policy-value network with a shared trunk
use super::modules::{Activation, Mlp, MlpConfig};
use serde::{Deserialize, Serialize};
use tch::{nn::Path, Tensor};

/// Configuration for [`PolicyValueNet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyValueConfig {
    /// Shared feature extractor. Its output width is `trunk_out_dim`.
    pub trunk: MlpConfig,
    pub trunk_out_dim: usize,
    /// Maps trunk features to action logits.
    pub policy_head: MlpConfig,
    /// Maps trunk features to a scalar state value.
    pub value_head: MlpConfig,
}

impl Default for PolicyValueConfig {
    fn default() -> Self {
        Self {
            trunk: MlpConfig {
                hidden_sizes: vec![64],
                activation: Activation::Relu,
                output_activation: Activation::Relu,
            },
            trunk_out_dim: 128,
            policy_head: MlpConfig {
                hidden_sizes: vec![128],
                activation: Activation::Relu,
                output_activation: Activation::Identity,
            },
            value_head: MlpConfig {
                hidden_sizes: vec![128],
                activation: Activation::Relu,
                output_activation: Activation::Identity,
            },
        }
    }
}

impl PolicyValueConfig {
    pub fn build(&self, vs: &Path, observation_dim: usize, num_actions: usize) -> PolicyValueNet {
        PolicyValueNet {
            trunk: self.trunk.build(&(vs / "trunk"), observation_dim, self.trunk_out_dim),
            policy_head: self
                .policy_head
                .build(&(vs / "policy"), self.trunk_out_dim, num_actions),
            value_head: self.value_head.build(&(vs / "value"), self.trunk_out_dim, 1),
        }
    }
}

/// Actor and critic sharing a feature trunk.
#[derive(Debug)]
pub struct PolicyValueNet {
    trunk: Mlp,
    policy_head: Mlp,
    value_head: Mlp,
}

impl PolicyValueNet {
    /// Evaluate a batch of observations.
    ///
    /// # Args
    /// * `observations` - Tensor of shape `[BATCH, observation_dim]`.
    ///
    /// # Returns
    /// * Action logits, shape `[BATCH, num_actions]`.
    /// * State values, shape `[BATCH]`.
    pub fn forward(&self, observations: &Tensor) -> (Tensor, Tensor) {
        let features = self.trunk.forward(observations);
        let logits = self.policy_head.forward(&features);
        let values = self.value_head.forward(&features).squeeze_dim(-1);
        (logits, values)
    }
}
