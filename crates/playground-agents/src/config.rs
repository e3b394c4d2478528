//! Per-kind profiles and behavior tuning.
//!
//! [`AgentsConfig`] is embedded in the engine configuration under the
//! `agents` key. Every section has defaults, so an empty YAML mapping is a
//! valid configuration. A kind profile given in YAML must be complete.

use playground_types::AgentKind;
use serde::Deserialize;

/// Physical and metabolic parameters shared by all agents of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct KindProfile {
    /// Energy cap; agents spawn at this level unless told otherwise.
    pub max_energy: f64,
    /// Radius within which neighbors and features are observed.
    pub perception_radius: f64,
    /// Speed limit enforced after integration.
    pub max_speed: f64,
    /// Largest thrust magnitude a behavior may request.
    pub max_thrust: f64,
    /// Energy per unit of thrust magnitude per second.
    pub move_cost: f64,
    /// Energy spent per second regardless of activity.
    pub idle_rate: f64,
}

/// Relative importance of the three concerns an autonomous agent balances.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UtilityWeights {
    /// Preference for cheap actions.
    #[serde(default = "default_energy_weight")]
    pub energy: f64,
    /// Preference for progress toward a goal or food.
    #[serde(default = "default_goal_weight")]
    pub goal: f64,
    /// Preference for staying clear of approaching agents.
    #[serde(default = "default_threat_weight")]
    pub threat: f64,
}

impl Default for UtilityWeights {
    fn default() -> Self {
        Self {
            energy: default_energy_weight(),
            goal: default_goal_weight(),
            threat: default_threat_weight(),
        }
    }
}

/// Tuning for [`AgentKind::Autonomous`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AutonomousTuning {
    /// Approaching neighbors closer than this are threats.
    #[serde(default = "default_autonomous_threat_radius")]
    pub threat_radius: f64,
    /// Ticks between weight adaptations (0 disables adaptation).
    #[serde(default = "default_adapt_interval")]
    pub adapt_interval: u64,
    /// Weight shift applied per adaptation.
    #[serde(default = "default_adapt_step")]
    pub adapt_step: f64,
    /// Below this energy fraction the agent forages.
    #[serde(default = "default_low_energy_fraction")]
    pub low_energy_fraction: f64,
    /// Distance at which a goal counts as reached.
    #[serde(default = "default_goal_tolerance")]
    pub goal_tolerance: f64,
    /// Thrust used when seeking, as a fraction of the kind's `max_thrust`.
    #[serde(default = "default_cruise_fraction")]
    pub cruise_fraction: f64,
    /// Starting utility weights.
    #[serde(default)]
    pub weights: UtilityWeights,
}

impl Default for AutonomousTuning {
    fn default() -> Self {
        Self {
            threat_radius: default_autonomous_threat_radius(),
            adapt_interval: default_adapt_interval(),
            adapt_step: default_adapt_step(),
            low_energy_fraction: default_low_energy_fraction(),
            goal_tolerance: default_goal_tolerance(),
            cruise_fraction: default_cruise_fraction(),
            weights: UtilityWeights::default(),
        }
    }
}

/// Tuning for [`AgentKind::Reactive`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReactiveTuning {
    /// Threat range before sensitivity is added.
    #[serde(default = "default_base_threat_range")]
    pub base_threat_range: f64,
    /// Adds `sensitivity * 10` to the threat range.
    #[serde(default = "default_half")]
    pub sensitivity: f64,
    /// Scales flee thrust by `1 + reaction_speed`.
    #[serde(default = "default_half")]
    pub reaction_speed: f64,
    /// Flee thrust before the reaction bonus.
    #[serde(default = "default_flee_thrust")]
    pub flee_thrust: f64,
    /// Energy declared for every flee action.
    #[serde(default = "default_flee_cost")]
    pub flee_cost: f64,
    /// Thrust of the idle drift when nothing is near.
    #[serde(default = "default_drift_thrust")]
    pub drift_thrust: f64,
    /// Alert level lost per calm tick.
    #[serde(default = "default_alert_decay")]
    pub alert_decay: f64,
}

impl ReactiveTuning {
    /// Effective threat range.
    pub fn threat_range(&self) -> f64 {
        self.sensitivity.mul_add(10.0, self.base_threat_range)
    }
}

impl Default for ReactiveTuning {
    fn default() -> Self {
        Self {
            base_threat_range: default_base_threat_range(),
            sensitivity: default_half(),
            reaction_speed: default_half(),
            flee_thrust: default_flee_thrust(),
            flee_cost: default_flee_cost(),
            drift_thrust: default_drift_thrust(),
            alert_decay: default_alert_decay(),
        }
    }
}

/// Tuning for [`AgentKind::Wanderer`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WandererTuning {
    /// Lowest thrust drawn per tick.
    #[serde(default = "default_min_wander_thrust")]
    pub min_thrust: f64,
    /// Largest heading change per tick (radians).
    #[serde(default = "default_max_turn")]
    pub max_turn: f64,
    /// Multiplier on the drawn thrust.
    #[serde(default = "default_curiosity")]
    pub curiosity: f64,
    /// Distance from a wall at which the wanderer turns back inward.
    #[serde(default = "default_wall_margin")]
    pub wall_margin: f64,
}

impl Default for WandererTuning {
    fn default() -> Self {
        Self {
            min_thrust: default_min_wander_thrust(),
            max_turn: default_max_turn(),
            curiosity: default_curiosity(),
            wall_margin: default_wall_margin(),
        }
    }
}

/// Agent configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AgentsConfig {
    /// Memory ring capacity per agent.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    /// Energy drawn per successful consumption, before caps.
    #[serde(default = "default_bite")]
    pub bite: f64,
    /// Fixed energy spent on any consumption attempt.
    #[serde(default = "default_consume_cost")]
    pub consume_cost: f64,
    /// Profile for autonomous agents.
    #[serde(default = "default_autonomous_profile")]
    pub autonomous: KindProfile,
    /// Profile for reactive agents.
    #[serde(default = "default_reactive_profile")]
    pub reactive: KindProfile,
    /// Profile for wanderers.
    #[serde(default = "default_wanderer_profile")]
    pub wanderer: KindProfile,
    /// Autonomous policy tuning.
    #[serde(default)]
    pub autonomous_tuning: AutonomousTuning,
    /// Reactive policy tuning.
    #[serde(default)]
    pub reactive_tuning: ReactiveTuning,
    /// Wanderer policy tuning.
    #[serde(default)]
    pub wanderer_tuning: WandererTuning,
}

impl AgentsConfig {
    /// The profile for `kind`.
    pub const fn profile(&self, kind: AgentKind) -> &KindProfile {
        match kind {
            AgentKind::Autonomous => &self.autonomous,
            AgentKind::Reactive => &self.reactive,
            AgentKind::Wanderer => &self.wanderer,
        }
    }

    /// Largest perception radius over all kinds.
    pub fn max_perception_radius(&self) -> f64 {
        AgentKind::ALL
            .iter()
            .map(|kind| self.profile(*kind).perception_radius)
            .fold(0.0, f64::max)
    }

    /// Check every profile for usable values.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.memory_capacity == 0 {
            return Err("agents.memory_capacity must be at least 1".to_owned());
        }
        if !self.bite.is_finite() || self.bite < 0.0 {
            return Err(format!("agents.bite must be non-negative, got {}", self.bite));
        }
        if !self.consume_cost.is_finite() || self.consume_cost < 0.0 {
            return Err(format!(
                "agents.consume_cost must be non-negative, got {}",
                self.consume_cost
            ));
        }
        for kind in AgentKind::ALL {
            let p = self.profile(kind);
            let positive = [p.max_energy, p.perception_radius, p.max_speed, p.max_thrust];
            if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(format!("agents.{kind}: energy, radius, speed and thrust must be positive"));
            }
            let rates = [p.move_cost, p.idle_rate];
            if rates.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(format!("agents.{kind}: costs must be non-negative"));
            }
        }
        Ok(())
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            memory_capacity: default_memory_capacity(),
            bite: default_bite(),
            consume_cost: default_consume_cost(),
            autonomous: default_autonomous_profile(),
            reactive: default_reactive_profile(),
            wanderer: default_wanderer_profile(),
            autonomous_tuning: AutonomousTuning::default(),
            reactive_tuning: ReactiveTuning::default(),
            wanderer_tuning: WandererTuning::default(),
        }
    }
}

const fn default_memory_capacity() -> usize {
    1000
}

const fn default_bite() -> f64 {
    5.0
}

const fn default_consume_cost() -> f64 {
    0.05
}

const fn default_autonomous_profile() -> KindProfile {
    KindProfile {
        max_energy: 120.0,
        perception_radius: 30.0,
        max_speed: 8.0,
        max_thrust: 6.0,
        move_cost: 0.05,
        idle_rate: 0.1,
    }
}

const fn default_reactive_profile() -> KindProfile {
    KindProfile {
        max_energy: 80.0,
        perception_radius: 50.0,
        max_speed: 12.0,
        max_thrust: 10.0,
        move_cost: 0.08,
        idle_rate: 0.08,
    }
}

const fn default_wanderer_profile() -> KindProfile {
    KindProfile {
        max_energy: 100.0,
        perception_radius: 20.0,
        max_speed: 6.0,
        max_thrust: 4.0,
        move_cost: 0.03,
        idle_rate: 0.1,
    }
}

const fn default_energy_weight() -> f64 {
    0.4
}

const fn default_goal_weight() -> f64 {
    0.35
}

const fn default_threat_weight() -> f64 {
    0.25
}

const fn default_autonomous_threat_radius() -> f64 {
    10.0
}

const fn default_adapt_interval() -> u64 {
    25
}

const fn default_adapt_step() -> f64 {
    0.05
}

const fn default_low_energy_fraction() -> f64 {
    0.3
}

const fn default_goal_tolerance() -> f64 {
    1.0
}

const fn default_cruise_fraction() -> f64 {
    0.75
}

const fn default_base_threat_range() -> f64 {
    15.0
}

const fn default_half() -> f64 {
    0.5
}

const fn default_flee_thrust() -> f64 {
    4.0
}

const fn default_flee_cost() -> f64 {
    0.3
}

const fn default_drift_thrust() -> f64 {
    0.5
}

const fn default_alert_decay() -> f64 {
    0.1
}

const fn default_min_wander_thrust() -> f64 {
    0.5
}

const fn default_max_turn() -> f64 {
    0.5
}

const fn default_curiosity() -> f64 {
    1.0
}

const fn default_wall_margin() -> f64 {
    5.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_per_kind() {
        let config = AgentsConfig::default();
        assert!((config.profile(AgentKind::Autonomous).max_energy - 120.0).abs() < f64::EPSILON);
        assert!((config.profile(AgentKind::Reactive).max_energy - 80.0).abs() < f64::EPSILON);
        assert!((config.profile(AgentKind::Wanderer).max_energy - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reactive_sees_furthest() {
        let config = AgentsConfig::default();
        let reactive = config.profile(AgentKind::Reactive).perception_radius;
        assert!(reactive > config.profile(AgentKind::Autonomous).perception_radius);
        assert!(reactive > config.profile(AgentKind::Wanderer).perception_radius);
        assert!((config.max_perception_radius() - reactive).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AgentsConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_memory_is_invalid() {
        let config = AgentsConfig {
            memory_capacity: 0,
            ..AgentsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn threat_range_includes_sensitivity() {
        let tuning = ReactiveTuning::default();
        assert!((tuning.threat_range() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "memory_capacity: 50\nreactive_tuning:\n  sensitivity: 1.0\n";
        let config: AgentsConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.memory_capacity, 50);
        assert!((config.reactive_tuning.threat_range() - 25.0).abs() < 1e-12);
        assert!((config.wanderer.max_energy - 100.0).abs() < f64::EPSILON);
    }
}
