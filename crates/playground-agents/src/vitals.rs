//! Energy accounting applied to agents each tick.
//!
//! An agent pays for what it does after the action is applied:
//!
//! - movement: `|thrust| * dt * move_cost`
//! - idling: `idle_rate * dt`, paid every tick regardless of activity
//! - the cost the behavior declared on its action
//! - a flat `consume_cost` when it tried to eat
//!
//! Energy never goes below zero or above the kind's cap. An agent whose
//! energy reaches zero is dead and is removed by the engine in the same tick.

use playground_types::Action;

use crate::agent::Agent;
use crate::config::KindProfile;
use crate::error::AgentError;

/// Energy spent moving with `thrust_magnitude` for `dt` seconds.
pub fn movement_cost(profile: &KindProfile, thrust_magnitude: f64, dt: f64) -> f64 {
    thrust_magnitude * dt * profile.move_cost
}

/// Energy spent simply existing for `dt` seconds.
pub fn idle_cost(profile: &KindProfile, dt: f64) -> f64 {
    profile.idle_rate * dt
}

/// Total energy owed for one applied action.
pub fn tick_cost(profile: &KindProfile, action: &Action, dt: f64, consume_cost: f64) -> f64 {
    let consume = if action.consume.is_some() { consume_cost } else { 0.0 };
    movement_cost(profile, action.thrust.length(), dt) + idle_cost(profile, dt) + action.energy_cost + consume
}

/// Deduct `cost` from the agent's energy, flooring at zero.
///
/// Returns `true` if the agent is now depleted.
///
/// # Errors
///
/// Returns [`AgentError::NonFiniteEnergy`] if the cost is not finite.
pub fn spend(agent: &mut Agent, cost: f64) -> Result<bool, AgentError> {
    if !cost.is_finite() {
        return Err(AgentError::NonFiniteEnergy { agent: agent.id });
    }
    agent.energy = (agent.energy - cost.max(0.0)).max(0.0);
    Ok(agent.energy <= 0.0)
}

/// Room left under the energy cap.
pub fn headroom(agent: &Agent) -> f64 {
    (agent.max_energy - agent.energy).max(0.0)
}

/// Add up to `amount` energy without exceeding the cap.
///
/// Returns how much was actually accepted.
pub fn absorb(agent: &mut Agent, amount: f64) -> f64 {
    let accepted = amount.max(0.0).min(headroom(agent));
    agent.energy += accepted;
    accepted
}
