//! Activation functions
use serde::{Deserialize, Serialize};
use tch::Tensor;

/// Activation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    /// No transformation
    Identity,
    /// Rectified linear
    Relu,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Identity
    }
}

impl Activation {
    /// The function pointer for this activation function.
    pub fn function(self) -> fn(&Tensor) -> Tensor {
        use Activation::*;
        match self {
            Identity => Tensor::shallow_clone,
            Relu => Tensor::relu,
        }
    }

    /// The function pointer for this activation function if not the identity function.
    #[inline]
    pub fn maybe_function(self) -> Option<fn(&Tensor) -> Tensor> {
        match self {
            Self::Identity => None,
            _ => Some(self.function()),
        }
    }

    /// Apply this activation function to a tensor.
    #[inline]
    pub fn apply(self, input: Tensor) -> Tensor {
        match self.maybe_function() {
            Some(f) => f(&input),
            None => input,
        }
    }
}
