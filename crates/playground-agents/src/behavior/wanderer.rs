//! Random-walk policy for wanderers.
//!
//! The heading turns by at most `max_turn` radians per tick. Near a wall the
//! random turn is replaced by a turn toward the world center, still limited
//! to `max_turn`. Thrust is drawn between `min_thrust` and the kind's
//! `max_thrust`, scaled by curiosity.

use core::f64::consts::{PI, TAU};

use playground_types::{Action, ActionIntent, AgentId, Observation, Vec2};
use rand::Rng;

use crate::config::{KindProfile, WandererTuning};

/// Golden angle in radians, spreads initial headings of consecutive ids.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Policy state of one wanderer.
#[derive(Debug, Clone, PartialEq)]
pub struct WandererState {
    /// Tuning copied from configuration at spawn.
    tuning: WandererTuning,
    /// Current heading in radians, `[0, 2π)`.
    heading: f64,
}

impl WandererState {
    /// New state. The heading follows `velocity` when it is non-zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(tuning: WandererTuning, id: AgentId, velocity: Vec2) -> Self {
        let heading = if velocity.length_squared() > 0.0 && velocity.is_finite() {
            velocity.y.atan2(velocity.x)
        } else {
            (id.into_inner() as f64) * GOLDEN_ANGLE
        };
        Self {
            tuning,
            heading: heading.rem_euclid(TAU),
        }
    }

    /// Current heading.
    pub const fn heading(&self) -> f64 {
        self.heading
    }

    /// Turn and push along the heading.
    pub(crate) fn decide<R: Rng + ?Sized>(&mut self, obs: &Observation, profile: &KindProfile, rng: &mut R) -> Action {
        let own = obs.own.position;
        let margin = self.tuning.wall_margin;
        let near_wall = own.x < margin
            || own.y < margin
            || own.x > obs.world_width - margin
            || own.y > obs.world_height - margin;

        let max_turn = self.tuning.max_turn.abs();
        self.heading = if near_wall {
            let inward = Vec2::new(obs.world_width * 0.5, obs.world_height * 0.5) - own;
            steer_toward(self.heading, inward.y.atan2(inward.x), max_turn)
        } else {
            self.heading + rng.random_range(-max_turn..=max_turn)
        }
        .rem_euclid(TAU);

        let low = self.tuning.min_thrust.max(0.0);
        let high = profile.max_thrust.max(low);
        let magnitude = rng.random_range(low..=high) * self.tuning.curiosity;
        Action::moving(Vec2::from_angle(self.heading) * magnitude, ActionIntent::Wander)
    }
}

/// Turn `heading` toward `target` by at most `max_turn` radians.
fn steer_toward(heading: f64, target: f64, max_turn: f64) -> f64 {
    // Signed difference in [-π, π).
    let diff = (target - heading + PI).rem_euclid(TAU) - PI;
    heading + diff.clamp(-max_turn, max_turn)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_types::AgentKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::behavior::tests::observation;
    use crate::config::AgentsConfig;

    /// Smallest absolute angle between two headings.
    fn angle_between(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn heading_follows_initial_velocity() {
        let s = WandererState::new(WandererTuning::default(), AgentId(1), Vec2::new(0.0, 2.0));
        assert!((s.heading() - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn turn_rate_is_bounded() {
        let tuning = WandererTuning::default();
        let mut s = WandererState::new(tuning, AgentId(3), Vec2::ZERO);
        let obs = observation(AgentKind::Wanderer, Vec2::new(50.0, 50.0));
        let profile = AgentsConfig::default().wanderer;
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..200 {
            let before = s.heading();
            let action = s.decide(&obs, &profile, &mut rng);
            assert!(angle_between(before, s.heading()) <= tuning.max_turn + 1e-9);
            assert_eq!(action.intent, ActionIntent::Wander);
            assert!(action.thrust.length() >= tuning.min_thrust - 1e-9);
            assert!(action.thrust.length() <= profile.max_thrust + 1e-9);
        }
    }

    #[test]
    fn turns_inward_near_wall() {
        let mut s = WandererState::new(WandererTuning::default(), AgentId(1), Vec2::new(-1.0, 0.0));
        let obs = observation(AgentKind::Wanderer, Vec2::new(1.0, 50.0));
        let profile = AgentsConfig::default().wanderer;
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..20 {
            s.decide(&obs, &profile, &mut rng);
        }
        let action = s.decide(&obs, &profile, &mut rng);
        assert!(s.heading() < 1e-9 || s.heading() > TAU - 1e-9);
        assert!(action.thrust.x > 0.0);
    }

    #[test]
    fn wall_turn_respects_max_turn() {
        let tuning = WandererTuning::default();
        let mut s = WandererState::new(tuning, AgentId(1), Vec2::new(0.0, 1.0));
        let obs = observation(AgentKind::Wanderer, Vec2::new(1.0, 95.0));
        let profile = AgentsConfig::default().wanderer;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..10 {
            let before = s.heading();
            s.decide(&obs, &profile, &mut rng);
            assert!(angle_between(before, s.heading()) <= tuning.max_turn + 1e-9);
        }
    }

    #[test]
    fn steering_takes_the_short_way_round() {
        let turned = steer_toward(0.1, TAU - 0.1, 0.5);
        assert!((turned - -0.1).abs() < 1e-12);
        let capped = steer_toward(0.0, 2.0, 0.5);
        assert!((capped - 0.5).abs() < 1e-12);
    }
}
