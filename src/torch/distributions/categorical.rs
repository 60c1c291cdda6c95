//! Categorical distribution
use tch::{Kind, Tensor};

/// A batch of categorical distributions over actions.
#[derive(Debug)]
pub struct Categorical {
    /// Normalized log probability of each event.
    ///
    /// A tensor of shape `[BATCH, NUM_EVENTS]`.
    logits: Tensor,
}

impl Categorical {
    /// Initialize from possibly unnormalized log probabilities.
    pub fn new(logits: &Tensor) -> Self {
        Self {
            logits: logits.log_softmax(-1, Kind::Float),
        }
    }

    /// Probability of each event. Shape `[BATCH, NUM_EVENTS]`.
    pub fn probs(&self) -> Tensor {
        self.logits.exp()
    }

    /// Log probability of the events selected by one-hot vectors of shape `[BATCH, NUM_EVENTS]`.
    pub fn log_probs_one_hot(&self, one_hot: &Tensor) -> Tensor {
        (clamp_float_min(&self.logits) * one_hot).sum_dim_intlist(&[-1], false, Kind::Float)
    }

    /// Entropy of each distribution. Shape `[BATCH]`.
    pub fn entropy(&self) -> Tensor {
        -(clamp_float_min(&self.logits) * self.probs()).sum_dim_intlist(&[-1], false, Kind::Float)
    }
}

/// Clamp float values to be >= the smallest finite value so that `0 * log(0) = 0`.
fn clamp_float_min(x: &Tensor) -> Tensor {
    match x.kind() {
        Kind::Float => x.clamp_min(f64::from(f32::MIN)),
        Kind::Double => x.clamp_min(f64::MIN),
        _ => x.shallow_clone(),
    }
}
