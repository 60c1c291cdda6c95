//! Diagnostic rendering alongside training
use super::EpisodeCounter;
use crate::envs::Environment;
use crate::torch::agents::SharedActorCritic;
use crate::Prng;
use tracing::{debug, warn};

/// Run the shared policy in `env`, rendering every step, until training finishes.
///
/// Render episodes are not trained on and do not count toward the episode budget.
/// Errors end the loop with a warning.
///
/// # Returns
/// The number of render episodes completed.
pub fn render_loop<E: Environment + ?Sized>(
    env: &mut E,
    model: &SharedActorCritic,
    counter: &EpisodeCounter,
    rng: &mut Prng,
) -> usize {
    let mut episodes = 0;
    while !counter.is_finished() {
        match render_episode(env, model, counter, rng) {
            Ok(Some(score)) => {
                episodes += 1;
                debug!(episode = episodes, score, "render episode");
            }
            Ok(None) => break,
            Err(err) => {
                warn!(%err, "render loop stopped");
                break;
            }
        }
    }
    episodes
}

/// Run one rendered episode. Returns `None` if training finished first.
fn render_episode<E: Environment + ?Sized>(
    env: &mut E,
    model: &SharedActorCritic,
    counter: &EpisodeCounter,
    rng: &mut Prng,
) -> Result<Option<f64>, Box<dyn std::error::Error>> {
    let mut observation = env.reset()?;
    env.render();
    let mut score = 0.0;
    loop {
        if counter.is_finished() {
            return Ok(None);
        }
        let action = model.policy_action(&observation, rng)?;
        let step = env.step(action)?;
        env.render();
        score += step.reward;
        if step.episode_done() {
            return Ok(Some(score));
        }
        observation = step.observation;
    }
}
