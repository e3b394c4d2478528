//! The action an agent's behavior returns for one tick.

use serde::{Deserialize, Serialize};

use crate::Vec2;
use crate::enums::ActionIntent;
use crate::ids::ResourceId;

/// A decided action, applied by the physics resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Requested acceleration in world units per second squared.
    pub thrust: Vec2,
    /// Extra energy the behavior declares for this action (flee bursts).
    pub energy_cost: f64,
    /// Resource node the agent tries to consume from this tick.
    pub consume: Option<ResourceId>,
    /// What the agent meant to do.
    pub intent: ActionIntent,
}

impl Action {
    /// The no-op action: no thrust, no declared cost, no consumption.
    pub const fn idle() -> Self {
        Self {
            thrust: Vec2::ZERO,
            energy_cost: 0.0,
            consume: None,
            intent: ActionIntent::Hold,
        }
    }

    /// Accelerate along `thrust`.
    pub const fn moving(thrust: Vec2, intent: ActionIntent) -> Self {
        Self {
            thrust,
            energy_cost: 0.0,
            consume: None,
            intent,
        }
    }

    /// Attach a declared energy cost.
    #[must_use]
    pub const fn with_cost(mut self, energy_cost: f64) -> Self {
        self.energy_cost = energy_cost;
        self
    }

    /// Attempt to consume from `resource` this tick.
    #[must_use]
    pub const fn consuming(mut self, resource: ResourceId) -> Self {
        self.consume = Some(resource);
        self
    }

    /// Whether the action can be applied: finite thrust and a finite,
    /// non-negative declared cost.
    pub fn is_well_formed(&self) -> bool {
        self.thrust.is_finite() && self.energy_cost.is_finite() && self.energy_cost >= 0.0
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_well_formed() {
        assert!(Action::idle().is_well_formed());
    }

    #[test]
    fn negative_cost_is_malformed() {
        let action = Action::moving(Vec2::X, ActionIntent::Seek).with_cost(-1.0);
        assert!(!action.is_well_formed());
    }

    #[test]
    fn non_finite_thrust_is_malformed() {
        let action = Action::moving(Vec2::new(f64::NAN, 0.0), ActionIntent::Wander);
        assert!(!action.is_well_formed());
    }
}
