use super::{
    check_action, ActionSpace, BuildEnv, BuildEnvError, EnvError, EnvStructure, Environment, Step,
};
use crate::Prng;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for the [`CartPole`] environment.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleConfig {
    /// Physics configuration
    pub physics_config: PhysicalConstants,
    /// Environment environment configuration
    pub env_config: EnvironmentParams,
}

impl BuildEnv for CartPoleConfig {
    type Environment = CartPole;

    fn build_env(&self, seed: u64) -> Result<Self::Environment, BuildEnvError> {
        Ok(CartPole::new(self.physics_config, self.env_config, seed))
    }
}

/// Cart-Pole environment
///
/// Consists of a simulated cart on a track with a vertical pole attached by a hinge on the top.
/// The goal is to keep the pole upright by applying left and right forces to the cart.
///
/// The environment is based on [Barto et al. (1983)][barto1983] with updated dynamics equations
/// from [Florian (2005)][florian2005], who corrects the friction term.
/// The default dynamics constants and episode parameters are based on the
/// [OpenAI Gym][gym_cartpole] [CartPole-v1 environment][cartpole_source].
///
/// Observations are `[cart_position, cart_velocity, pole_angle, pole_angular_velocity]`.
/// Action `0` pushes the cart left and action `1` pushes it right.
///
/// [barto1983]: https://ieeexplore.ieee.org/document/6313077
/// [florian2005]: https://coneural.org/florian/papers/05_cart_pole.pdf
/// [gym_cartpole]: https://gym.openai.com/envs/CartPole-v1/
/// [cartpole_source]: https://github.com/openai/gym/blob/master/gym/envs/classic_control/cartpole.py
#[derive(Debug, Clone)]
pub struct CartPole {
    phys: InternalPhysicalConstants,
    env: EnvironmentParams,
    rng: Prng,
    /// Current state. `None` if no episode is active.
    state: Option<CartPoleInternalState>,
}

impl CartPole {
    pub fn new(phys: PhysicalConstants, env: EnvironmentParams, seed: u64) -> Self {
        Self {
            phys: phys.into(),
            env,
            rng: Prng::seed_from_u64(seed),
            state: None,
        }
    }
}

/// Cart-pole action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Push {
    Left,
    Right,
}

impl Push {
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }
}

impl Environment for CartPole {
    fn structure(&self) -> EnvStructure {
        EnvStructure {
            observation_shape: vec![4],
            action_space: ActionSpace::Discrete { n: 2 },
            reward_range: (0.0, 1.0),
        }
    }

    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        // All parameters are sampled from the same range of values
        let dist = Uniform::new_inclusive(-0.05, 0.05);
        let state = CartPoleInternalState {
            physical: CartPolePhysicalState {
                cart_position: dist.sample(&mut self.rng),
                cart_velocity: dist.sample(&mut self.rng),
                pole_angle: dist.sample(&mut self.rng),
                pole_angular_velocity: dist.sample(&mut self.rng),
            },
            cached_normal_velocity_is_positive: true,
        };
        self.state = Some(state);
        Ok(state.physical.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step, EnvError> {
        check_action(action, 2)?;
        let state = self.state.take().ok_or(EnvError::NoActiveEpisode)?;
        let applied_force = match Push::from_index(action) {
            Some(Push::Left) => -self.env.action_force,
            _ => self.env.action_force,
        };
        let next_state = self.phys.next_state(&state, applied_force);
        // Gym gives a reward of 1 on every step, including the one that ends the episode.
        let terminal = next_state.physical.cart_position.abs() > self.env.max_pos
            || next_state.physical.pole_angle.abs() > self.env.max_angle;
        if !terminal {
            self.state = Some(next_state);
        }
        Ok(Step {
            observation: next_state.physical.observation(),
            reward: 1.0,
            terminal,
            truncated: false,
        })
    }

    fn render(&self) {
        const TRACK_WIDTH: usize = 41;
        let state = match &self.state {
            Some(state) => state.physical,
            None => return,
        };
        let fraction = (state.cart_position + self.env.max_pos) / (2.0 * self.env.max_pos);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cart = ((fraction * (TRACK_WIDTH - 1) as f64).round().max(0.0) as usize)
            .min(TRACK_WIDTH - 1);
        let track: String = (0..TRACK_WIDTH)
            .map(|i| if i == cart { '#' } else { '-' })
            .collect();
        println!(
            "|{}| angle {:+6.2}°  velocity {:+6.3}",
            track,
            state.pole_angle.to_degrees(),
            state.cart_velocity
        );
    }
}

/// Physical constants for the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Downward force of gravity (m/s^2)
    pub gravity: f64,
    /// Mass of the cart (kg)
    pub mass_cart: f64,
    /// Mass of the pole (kg)
    pub mass_pole: f64,
    /// Half the length of the pole (m)
    pub length_half_pole: f64,
    /// Coefficient of friction between the cart and the track (unitless).
    ///
    /// The track is assumed to fully confine the cart in the vertical direction and this same
    /// friction coefficient applies whether the normal force of the cart is up or down.
    pub friction_cart: f64,
    /// Coefficient of friction between the pole and the cart at the hinge (unitless).
    pub friction_pole: f64,
    /// Simulation time step (s)
    pub time_step: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        // Defaults from the OpenAI CartPole-v1 environment, which has no friction
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length_half_pole: 0.5,
            friction_cart: 0.0,
            friction_pole: 0.0,
            time_step: 0.02,
        }
    }
}

/// Parameters for [`CartPole`] as a reinforcement learning environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParams {
    /// Magnitude of the force (N) applied by actions.
    pub action_force: f64,
    /// Maximum absolute position (meters) before the episode is ended.
    pub max_pos: f64,
    /// Maximum absolute pole angle from vertical (radians) before the episode is ended.
    pub max_angle: f64,
}

impl Default for EnvironmentParams {
    fn default() -> Self {
        // Defaults from the OpenAI CartPole-v1 environment
        Self {
            action_force: 10.0,
            max_pos: 2.4,
            max_angle: 12.0f64.to_radians(), // 12 degrees
        }
    }
}

/// Internal cart-pole constants with pre-computed common values.
#[derive(Debug, Copy, Clone, PartialEq)]
struct InternalPhysicalConstants {
    /// Fundamental constants
    c: PhysicalConstants,
    /// Gravitational weight of the combined system (N): `gravity * (mass_cart + mass_pole)`.
    total_weight: f64,
    /// `1 / (mass_cart + mass_pole)`,
    inv_total_mass: f64,
    /// `mass_pole * length_half_pole`
    mass_length_pole: f64,
}

impl From<PhysicalConstants> for InternalPhysicalConstants {
    fn from(c: PhysicalConstants) -> Self {
        let total_mass = c.mass_cart + c.mass_pole;
        Self {
            c,
            total_weight: c.gravity * total_mass,
            inv_total_mass: total_mass.recip(),
            mass_length_pole: c.mass_pole * c.length_half_pole,
        }
    }
}

/// Physical state of the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq)]
struct CartPolePhysicalState {
    /// Cart position from the track midpoint (m).
    cart_position: f64,
    /// Cart velocity (m/s).
    cart_velocity: f64,
    /// Angle of the pole from vertical (radians).
    pole_angle: f64,
    /// Pole angular velocity about the hinge (radians / s).
    pole_angular_velocity: f64,
}

impl CartPolePhysicalState {
    #[allow(clippy::cast_possible_truncation)]
    fn observation(&self) -> Vec<f32> {
        vec![
            self.cart_position as f32,
            self.cart_velocity as f32,
            self.pole_angle as f32,
            self.pole_angular_velocity as f32,
        ]
    }
}

/// State of the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq)]
struct CartPoleInternalState {
    /// Physical state.
    physical: CartPolePhysicalState,

    /// Cached sign of normal_force * cart_velocity.
    ///
    /// This is an intermediate term in the dynamics equations.
    /// The equations are slightly circular and the calculation for this term depends on its own
    /// value. Fortunately there are only two possible values and the value is likely to stay the
    /// same from one time step to the next.
    ///
    /// Therefore, the value from the previous time step is used and if the result is
    /// self-inconsistent then the negated value is used.
    cached_normal_velocity_is_positive: bool,
}

impl InternalPhysicalConstants {
    /// Simulate the state for one time step with an applied force on the cart (in N).
    fn next_state(
        &self,
        state: &CartPoleInternalState,
        applied_force: f64,
    ) -> CartPoleInternalState {
        // Reference:
        // "Correct equations for the dynamics of the cart-pole system" by Florian (2005)
        let phys = &state.physical;

        let mut signed_cart_friction = if state.cached_normal_velocity_is_positive {
            self.c.friction_cart
        } else {
            -self.c.friction_cart
        };
        let (sin_angle, cos_angle) = phys.pole_angle.sin_cos();
        let angular_velocity_squared = phys.pole_angular_velocity * phys.pole_angular_velocity;

        let mut angular_acceleration = self.angular_acceleration(
            phys,
            applied_force,
            signed_cart_friction,
            angular_velocity_squared,
            sin_angle,
            cos_angle,
        );
        let mut normal_force = self.normal_force(
            angular_acceleration,
            angular_velocity_squared,
            sin_angle,
            cos_angle,
        );
        let normal_velocity_is_positive = (normal_force * phys.cart_velocity).is_sign_positive();

        if normal_velocity_is_positive != state.cached_normal_velocity_is_positive {
            // Re-calculate with the new signed friction
            signed_cart_friction = -signed_cart_friction;
            angular_acceleration = self.angular_acceleration(
                phys,
                applied_force,
                signed_cart_friction,
                angular_velocity_squared,
                sin_angle,
                cos_angle,
            );
            normal_force = self.normal_force(
                angular_acceleration,
                angular_velocity_squared,
                sin_angle,
                cos_angle,
            );
        }

        // Horizontal forces on the cart
        let force_pole = self.mass_length_pole
            * (angular_velocity_squared * sin_angle - angular_acceleration * cos_angle);
        let force_friction = -signed_cart_friction * normal_force;
        let cart_acceleration =
            (applied_force + force_pole + force_friction) * self.inv_total_mass;

        // Explicit euler integration, as in Gym
        let cart_velocity = phys.cart_velocity + self.c.time_step * cart_acceleration;
        let cart_position = phys.cart_position + self.c.time_step * phys.cart_velocity;
        let pole_angular_velocity =
            phys.pole_angular_velocity + self.c.time_step * angular_acceleration;
        let pole_angle = phys.pole_angle + self.c.time_step * phys.pole_angular_velocity;

        CartPoleInternalState {
            physical: CartPolePhysicalState {
                cart_position,
                cart_velocity,
                pole_angle,
                pole_angular_velocity,
            },
            cached_normal_velocity_is_positive: normal_velocity_is_positive,
        }
    }

    /// The pole angular acceleration
    ///
    /// # Args
    /// * `applied_force`            - Applied horizontal force on the cart (N).
    /// * `signed_cart_friction`     - `friction_cart * sign(normal_force * cart_velocity)`
    /// * `angular_velocity_squared` - `pole_angular_velocity ** 2`
    /// * `sin_angle`                - `sin(pole_angle)`.
    /// * `cos_angle`                - `cos(pole_angle)`.
    fn angular_acceleration(
        &self,
        state: &CartPolePhysicalState,
        applied_force: f64,
        signed_cart_friction: f64,
        angular_velocity_squared: f64,
        sin_angle: f64,
        cos_angle: f64,
    ) -> f64 {
        // Equation (21) of Florian (2005) as numerator / denominator
        let alpha = (-applied_force
            - self.mass_length_pole
                * angular_velocity_squared
                * (sin_angle + signed_cart_friction * cos_angle))
            * self.inv_total_mass;
        let beta = self.c.friction_pole * state.pole_angular_velocity / self.mass_length_pole;
        let numerator = self.c.gravity * sin_angle
            + cos_angle * (alpha + self.c.gravity * signed_cart_friction)
            - beta;

        let denominator = self.c.length_half_pole
            * (4.0 / 3.0
                - self.c.mass_pole
                    * cos_angle
                    * self.inv_total_mass
                    * (cos_angle - signed_cart_friction));
        numerator / denominator
    }

    /// Normal force of the cart against the track (N).
    ///
    /// Positive for downward normal force and negative for upward.
    fn normal_force(
        &self,
        angular_acceleration: f64,
        angular_velocity_squared: f64,
        sin_angle: f64,
        cos_angle: f64,
    ) -> f64 {
        self.total_weight
            - self.mass_length_pole
                * (angular_acceleration * sin_angle + angular_velocity_squared * cos_angle)
    }
}
