//! Environment data: weather, obstacles and resource nodes.
//!
//! These are plain data. The rules that mutate them (weather drift,
//! regeneration, harvesting) live in `playground-world`.

use serde::{Deserialize, Serialize};

use crate::Vec2;
use crate::ids::{ObstacleId, ResourceId};

/// Global weather conditions, read-only to agents during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in `[0, 1]`.
    pub humidity: f64,
    /// Wind speed in world units per second.
    pub wind_speed: f64,
    /// Wind heading in radians, `[0, 2π)`.
    pub wind_direction: f64,
}

impl Weather {
    /// Wind as a vector (`speed` along `direction`).
    pub fn wind(&self) -> Vec2 {
        Vec2::from_angle(self.wind_direction) * self.wind_speed
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            humidity: 0.5,
            wind_speed: 0.0,
            wind_direction: 0.0,
        }
    }
}

/// A static circular obstacle that blocks movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Obstacle identifier.
    pub id: ObstacleId,
    /// Center of the obstacle.
    pub position: Vec2,
    /// Radius of the obstacle.
    pub radius: f64,
    /// Fraction of inbound normal velocity reflected on contact, `[0, 1]`.
    pub hardness: f64,
}

/// A circular patch of consumable energy that regenerates over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource identifier.
    pub id: ResourceId,
    /// Center of the patch.
    pub position: Vec2,
    /// Radius of the patch; agents inside it (plus pickup reach) can consume.
    pub radius: f64,
    /// Energy currently available.
    pub energy: f64,
    /// Maximum energy the node can hold.
    pub capacity: f64,
    /// Energy regained per second of simulated time.
    pub regen_rate: f64,
}

impl ResourceNode {
    /// Whether the node has anything left to give.
    pub fn is_depleted(&self) -> bool {
        self.energy <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_vector_follows_heading() {
        let weather = Weather {
            wind_speed: 2.0,
            wind_direction: core::f64::consts::FRAC_PI_2,
            ..Weather::default()
        };
        let wind = weather.wind();
        assert!(wind.x.abs() < 1e-9);
        assert!((wind.y - 2.0).abs() < 1e-9);
    }
}
