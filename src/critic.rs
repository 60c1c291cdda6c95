//! Discounted returns and advantage estimates.
//!
//! All functions here are pure: they see one finished trajectory and produce per-step values
//! index-aligned with its steps.

/// Per-step discounted returns and advantages of a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimates {
    /// Discounted return `R_t` of each step.
    pub returns: Vec<f32>,
    /// Advantage `R_t - V(s_t)` of each step.
    pub advantages: Vec<f32>,
}

/// Discounted returns computed backward from the end of a trajectory.
///
/// `R_T = bootstrap` and `R_t = r_t + gamma * R_{t+1}`.
/// Pass `bootstrap = 0` for a trajectory that ended in a terminal state.
///
/// # Returns
/// `R_0 .. R_{T-1}`, one per reward.
pub fn discounted_returns(rewards: &[f32], gamma: f32, bootstrap: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut cumulative = bootstrap;
    for (ret, reward) in returns.iter_mut().zip(rewards).rev() {
        cumulative = reward + gamma * cumulative;
        *ret = cumulative;
    }
    returns
}

/// Advantages `R_t - V(s_t)` relative to a value baseline.
///
/// # Panics
/// If `returns` and `values` have different lengths.
pub fn advantages(returns: &[f32], values: &[f32]) -> Vec<f32> {
    assert_eq!(
        returns.len(),
        values.len(),
        "returns and values must be index-aligned"
    );
    returns.iter().zip(values).map(|(r, v)| r - v).collect()
}

/// Estimate returns and advantages for one trajectory.
///
/// # Args
/// * `rewards` - Reward of each step.
/// * `values` - Critic value estimate `V(s_t)` of the state each step started from.
/// * `terminal` - Whether the trajectory ended in a terminal state.
///     If not, the return past the final step is bootstrapped from the value of the last observed
///     state, `values[T-1]`.
/// * `gamma` - Discount factor.
///
/// # Panics
/// If `rewards` and `values` have different lengths.
pub fn estimate(rewards: &[f32], values: &[f32], terminal: bool, gamma: f32) -> Estimates {
    let bootstrap = if terminal {
        0.0
    } else {
        values.last().copied().unwrap_or(0.0)
    };
    let returns = discounted_returns(rewards, gamma, bootstrap);
    let advantages = advantages(&returns, values);
    Estimates {
        returns,
        advantages,
    }
}
