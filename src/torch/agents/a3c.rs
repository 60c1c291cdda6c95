//! Asynchronous advantage actor-critic model
use crate::critic;
use crate::torch::distributions::Categorical;
use crate::torch::optimizers::OptimizerConfig;
use crate::torch::policy_value::{PolicyValueConfig, PolicyValueNet};
use crate::trajectory::Trajectory;
use rand::Rng;
use rand_distr::{Distribution, WeightedAliasIndex};
use std::sync::Mutex;
use tch::{nn::VarStore, COptimizer, Device, Kind, Reduction, TchError, Tensor};
use thiserror::Error;
use tracing::warn;

/// Configuration for [`SharedActorCritic`].
#[derive(Debug, Clone, PartialEq)]
pub struct A3cConfig {
    /// Discount factor
    pub gamma: f64,
    /// Weight of the policy entropy bonus in the actor loss
    pub entropy_coef: f64,
    /// Weight of the critic loss in the total loss
    pub value_coef: f64,
    pub network: PolicyValueConfig,
    pub optimizer: OptimizerConfig,
    pub device: Device,
}

impl Default for A3cConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            entropy_coef: 0.001,
            value_coef: 1.0,
            network: PolicyValueConfig::default(),
            optimizer: OptimizerConfig::default(),
            device: Device::Cpu,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Tch(#[from] TchError),
    #[error("cannot train on an empty trajectory")]
    EmptyTrajectory,
    #[error("observation has {actual} features; expected {expected}")]
    ObservationSize { expected: usize, actual: usize },
    #[error(
        "trajectory has {num_actions} actions and {observation_dim}-feature states; \
        model expects {expected_num_actions} and {expected_observation_dim}"
    )]
    TrajectoryShape {
        observation_dim: usize,
        num_actions: usize,
        expected_observation_dim: usize,
        expected_num_actions: usize,
    },
    #[error("model lock poisoned by a panicked worker")]
    Poisoned,
}

/// Result of a call to [`SharedActorCritic::train`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// The parameters were updated.
    Applied {
        actor_loss: f64,
        critic_loss: f64,
        grad_norm: f64,
    },
    /// The gradient was not finite; the parameters are unchanged.
    Skipped { grad_norm: f64 },
}

impl UpdateOutcome {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Actor-critic model shared by concurrent rollout workers.
///
/// Every forward pass holds the network mutex, so inference calls from different workers are
/// serialized. Updates are serialized by the optimizer mutex and take the network mutex around
/// the forward/backward pass and again around the optimizer step, so inference never sees a
/// partial update.
pub struct SharedActorCritic {
    /// Owns the network parameters
    vs: VarStore,
    net: Mutex<PolicyValueNet>,
    optimizer: Mutex<COptimizer>,

    observation_dim: usize,
    num_actions: usize,
    gamma: f32,
    entropy_coef: f64,
    value_coef: f64,
    device: Device,
}

impl SharedActorCritic {
    /// Initialize a model with random parameters.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        observation_dim: usize,
        num_actions: usize,
        config: &A3cConfig,
    ) -> Result<Self, ModelError> {
        let vs = VarStore::new(config.device);
        let net = config
            .network
            .build(&vs.root(), observation_dim, num_actions);
        let optimizer = config.optimizer.build_optimizer(&vs)?;
        Ok(Self {
            vs,
            net: Mutex::new(net),
            optimizer: Mutex::new(optimizer),
            observation_dim,
            num_actions,
            gamma: config.gamma as f32,
            entropy_coef: config.entropy_coef,
            value_coef: config.value_coef,
            device: config.device,
        })
    }

    pub const fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Sample an action from the current policy.
    ///
    /// If the policy probabilities are unusable (e.g. NaN) a uniform random action is returned
    /// instead, so the result is always in `0..num_actions()`.
    pub fn policy_action<R: Rng + ?Sized>(
        &self,
        observation: &[f32],
        rng: &mut R,
    ) -> Result<usize, ModelError> {
        let probs = self.action_probs(observation)?;
        match WeightedAliasIndex::new(probs) {
            Ok(distribution) => Ok(distribution.sample(rng)),
            Err(err) => {
                warn!(%err, "unusable action probabilities; sampling uniformly");
                Ok(rng.gen_range(0..self.num_actions))
            }
        }
    }

    /// Action probabilities of the current policy for one observation.
    pub fn action_probs(&self, observation: &[f32]) -> Result<Vec<f32>, ModelError> {
        let input = self.observation_tensor(observation)?;
        let net = self.net.lock().map_err(|_| ModelError::Poisoned)?;
        let probs = tch::no_grad(|| {
            let (logits, _) = net.forward(&input);
            Categorical::new(&logits).probs()
        });
        Ok(Vec::<f32>::from(&probs.squeeze_dim(0).to_device(Device::Cpu)))
    }

    /// Critic estimate of the value of one observation.
    pub fn value(&self, observation: &[f32]) -> Result<f32, ModelError> {
        let input = self.observation_tensor(observation)?;
        let net = self.net.lock().map_err(|_| ModelError::Poisoned)?;
        let value = tch::no_grad(|| net.forward(&input).1);
        #[allow(clippy::cast_possible_truncation)]
        Ok(value.double_value(&[0]) as f32)
    }

    /// Update the shared parameters from one trajectory.
    ///
    /// # Args
    /// * `trajectory` - The steps of one episode, or a prefix of one.
    /// * `done` - Whether the trajectory ended in a terminal state.
    ///     If not, the return past the final step is bootstrapped from the critic.
    #[allow(clippy::cast_possible_wrap)]
    pub fn train(&self, trajectory: &Trajectory, done: bool) -> Result<UpdateOutcome, ModelError> {
        self.check_trajectory(trajectory)?;
        let len = trajectory.len() as i64;
        let states = Tensor::of_slice(trajectory.states())
            .reshape(&[len, self.observation_dim as i64])
            .to_device(self.device);
        let actions = Tensor::of_slice(trajectory.actions_one_hot())
            .reshape(&[len, self.num_actions as i64])
            .to_device(self.device);

        let optimizer = self.optimizer.lock().map_err(|_| ModelError::Poisoned)?;
        let (actor_loss, critic_loss) = {
            let net = self.net.lock().map_err(|_| ModelError::Poisoned)?;
            let (logits, values) = net.forward(&states);

            let baseline = Vec::<f32>::from(&values.detach().to_device(Device::Cpu));
            let estimates = critic::estimate(trajectory.rewards(), &baseline, done, self.gamma);
            let returns = Tensor::of_slice(&estimates.returns).to_device(self.device);
            let advantages = Tensor::of_slice(&estimates.advantages).to_device(self.device);

            let policy = Categorical::new(&logits);
            let policy_loss = -(policy.log_probs_one_hot(&actions) * &advantages).sum(Kind::Float);
            let entropy = policy.entropy().sum(Kind::Float);
            let actor_loss = policy_loss - entropy * self.entropy_coef;
            let critic_loss = values.mse_loss(&returns, Reduction::Mean);
            let loss = &actor_loss + &critic_loss * self.value_coef;

            optimizer.zero_grad()?;
            loss.backward();
            (actor_loss.double_value(&[]), critic_loss.double_value(&[]))
        };

        let grad_norm = self.grad_norm();
        if !grad_norm.is_finite() {
            optimizer.zero_grad()?;
            warn!(
                grad_norm,
                steps = trajectory.len(),
                "skipping update with non-finite gradient"
            );
            return Ok(UpdateOutcome::Skipped { grad_norm });
        }

        {
            let _net = self.net.lock().map_err(|_| ModelError::Poisoned)?;
            optimizer.step()?;
        }
        Ok(UpdateOutcome::Applied {
            actor_loss,
            critic_loss,
            grad_norm,
        })
    }

    /// Euclidean norm of the gradient over all trainable parameters.
    fn grad_norm(&self) -> f64 {
        tch::no_grad(|| {
            self.vs
                .trainable_variables()
                .iter()
                .map(|var| {
                    let grad = var.grad();
                    if grad.defined() {
                        (&grad * &grad).sum(Kind::Double).double_value(&[])
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
                .sqrt()
        })
    }

    fn observation_tensor(&self, observation: &[f32]) -> Result<Tensor, ModelError> {
        if observation.len() != self.observation_dim {
            return Err(ModelError::ObservationSize {
                expected: self.observation_dim,
                actual: observation.len(),
            });
        }
        Ok(Tensor::of_slice(observation)
            .unsqueeze(0)
            .to_device(self.device))
    }

    fn check_trajectory(&self, trajectory: &Trajectory) -> Result<(), ModelError> {
        if trajectory.observation_dim() != self.observation_dim
            || trajectory.num_actions() != self.num_actions
        {
            return Err(ModelError::TrajectoryShape {
                observation_dim: trajectory.observation_dim(),
                num_actions: trajectory.num_actions(),
                expected_observation_dim: self.observation_dim,
                expected_num_actions: self.num_actions,
            });
        }
        if trajectory.is_empty() {
            return Err(ModelError::EmptyTrajectory);
        }
        Ok(())
    }

    /// Detached copies of all trainable parameters.
    #[cfg(test)]
    fn parameters_snapshot(&self) -> Vec<Tensor> {
        self.vs
            .trainable_variables()
            .iter()
            .map(|var| var.detach().copy())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prng;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn model() -> SharedActorCritic {
        SharedActorCritic::new(4, 2, &A3cConfig::default()).unwrap()
    }

    fn fast_config() -> A3cConfig {
        A3cConfig {
            optimizer: OptimizerConfig::adam(1e-2),
            ..A3cConfig::default()
        }
    }

    fn trajectory(len: usize, reward: f64) -> Trajectory {
        let mut trajectory = Trajectory::new(4, 2);
        for i in 0..len {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * 0.1;
            trajectory.push(&[x, -x, 0.5, 1.0], i % 2, reward).unwrap();
        }
        trajectory
    }

    fn params_equal(a: &[Tensor], b: &[Tensor]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equal(y))
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    fn policy_action_in_range(#[case] num_actions: usize) {
        let model = SharedActorCritic::new(3, num_actions, &A3cConfig::default()).unwrap();
        let mut rng = Prng::seed_from_u64(0);
        for i in 0..200 {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32;
            let action = model.policy_action(&[x, -x, 1.0], &mut rng).unwrap();
            assert!(action < num_actions);
        }
    }

    #[rstest]
    fn action_probs_sum_to_one(model: SharedActorCritic) {
        let probs = model.action_probs(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[rstest]
    fn value_is_finite(model: SharedActorCritic) {
        assert!(model.value(&[0.1, 0.2, 0.3, 0.4]).unwrap().is_finite());
    }

    #[rstest]
    fn wrong_observation_size(model: SharedActorCritic) {
        let mut rng = Prng::seed_from_u64(0);
        assert!(matches!(
            model.policy_action(&[0.0; 3], &mut rng),
            Err(ModelError::ObservationSize {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[rstest]
    fn train_empty_trajectory(model: SharedActorCritic) {
        assert!(matches!(
            model.train(&Trajectory::new(4, 2), true),
            Err(ModelError::EmptyTrajectory)
        ));
    }

    #[rstest]
    fn train_mismatched_trajectory(model: SharedActorCritic) {
        let mut trajectory = Trajectory::new(3, 2);
        trajectory.push(&[0.0; 3], 0, 1.0).unwrap();
        assert!(matches!(
            model.train(&trajectory, true),
            Err(ModelError::TrajectoryShape { .. })
        ));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn train_updates_parameters(model: SharedActorCritic, #[case] done: bool) {
        let before = model.parameters_snapshot();
        let outcome = model.train(&trajectory(5, 1.0), done).unwrap();
        assert!(outcome.is_applied());
        assert!(!params_equal(&before, &model.parameters_snapshot()));
    }

    #[rstest]
    fn non_finite_update_skipped(model: SharedActorCritic) {
        let before = model.parameters_snapshot();
        let outcome = model.train(&trajectory(3, f64::NAN), true).unwrap();
        assert!(matches!(outcome, UpdateOutcome::Skipped { .. }));
        assert!(params_equal(&before, &model.parameters_snapshot()));

        // The model remains usable afterwards
        let outcome = model.train(&trajectory(3, 1.0), true).unwrap();
        assert!(outcome.is_applied());
    }

    #[test]
    fn rewarded_action_becomes_more_likely() {
        let model = SharedActorCritic::new(4, 2, &fast_config()).unwrap();
        let state = [0.5, -0.5, 0.25, 1.0];
        let mut trajectory = Trajectory::new(4, 2);
        trajectory.push(&state, 0, 1.0).unwrap();

        let initial = model.action_probs(&state).unwrap()[0];
        for _ in 0..50 {
            model.train(&trajectory, true).unwrap();
        }
        let trained = model.action_probs(&state).unwrap()[0];
        assert!(trained > initial, "{} <= {}", trained, initial);
    }

    #[test]
    fn shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedActorCritic>();
    }

    #[test]
    fn concurrent_inference_and_training() {
        let model = SharedActorCritic::new(4, 2, &fast_config()).unwrap();
        crossbeam::scope(|scope| {
            for seed in 0..4 {
                let model = &model;
                scope.spawn(move |_| {
                    let mut rng = Prng::seed_from_u64(seed);
                    for _ in 0..100 {
                        let action = model.policy_action(&[0.1, 0.2, 0.3, 0.4], &mut rng).unwrap();
                        assert!(action < 2);
                    }
                });
            }
            for _ in 0..2 {
                let model = &model;
                scope.spawn(move |_| {
                    for _ in 0..10 {
                        model.train(&trajectory(4, 1.0), false).unwrap();
                    }
                });
            }
        })
        .unwrap();
    }
}
