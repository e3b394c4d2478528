//! Random feature placement for a fresh world.
//!
//! Obstacle count scales with area (one per 50 000 square units at density
//! 1.0); resource patches are a fixed ratio of that. Sizes and amounts are
//! drawn uniformly from the configured ranges using the caller's seeded
//! RNG, so the same seed always produces the same layout.

use playground_types::{ObstacleId, ResourceId, Vec2};
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use crate::error::WorldError;
use crate::world::World;

/// Square world units per obstacle at density 1.0.
const AREA_PER_OBSTACLE: f64 = 50_000.0;

/// Feature generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LayoutParams {
    /// Multiplier on the area-derived obstacle count.
    #[serde(default = "default_obstacle_density")]
    pub obstacle_density: f64,
    /// Resource patches per obstacle.
    #[serde(default = "default_resource_ratio")]
    pub resource_ratio: f64,
    /// Obstacle radius range `[min, max]`.
    #[serde(default = "default_obstacle_radius")]
    pub obstacle_radius: (f64, f64),
    /// Obstacle hardness range `[min, max]`.
    #[serde(default = "default_obstacle_hardness")]
    pub obstacle_hardness: (f64, f64),
    /// Resource patch radius range `[min, max]`.
    #[serde(default = "default_resource_radius")]
    pub resource_radius: (f64, f64),
    /// Resource starting energy (and capacity) range `[min, max]`.
    #[serde(default = "default_resource_energy")]
    pub resource_energy: (f64, f64),
    /// Resource regeneration rate range `[min, max]`, per second.
    #[serde(default = "default_resource_regen")]
    pub resource_regen: (f64, f64),
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            obstacle_density: default_obstacle_density(),
            resource_ratio: default_resource_ratio(),
            obstacle_radius: default_obstacle_radius(),
            obstacle_hardness: default_obstacle_hardness(),
            resource_radius: default_resource_radius(),
            resource_energy: default_resource_energy(),
            resource_regen: default_resource_regen(),
        }
    }
}

impl LayoutParams {
    /// Number of obstacles for a world of `area`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn obstacle_count(&self, area: f64) -> u32 {
        let raw = (area / AREA_PER_OBSTACLE * self.obstacle_density).floor();
        if raw.is_finite() && raw > 0.0 {
            // Saturating cast.
            raw as u32
        } else {
            0
        }
    }

    /// Number of resource patches for `obstacles` obstacles.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resource_count(&self, obstacles: u32) -> u32 {
        let raw = (f64::from(obstacles) * self.resource_ratio).floor();
        if raw.is_finite() && raw > 0.0 { raw as u32 } else { 0 }
    }
}

/// What [`scatter_features`] placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// Obstacles placed, ascending.
    pub obstacles: Vec<ObstacleId>,
    /// Resource nodes placed, ascending.
    pub resources: Vec<ResourceId>,
}

/// Populate `world` with randomly placed obstacles and resource patches.
///
/// Obstacles go anywhere inside the world; resource patches are centered on
/// positions not covered by an obstacle.
///
/// # Errors
///
/// Returns [`WorldError::InvalidFeature`] if a configured range is empty or
/// non-positive where a positive value is required.
pub fn scatter_features<R: Rng + ?Sized>(
    world: &mut World,
    params: &LayoutParams,
    rng: &mut R,
) -> Result<Layout, WorldError> {
    let obstacle_count = params.obstacle_count(world.area());
    let resource_count = params.resource_count(obstacle_count);
    let mut layout = Layout::default();

    for _ in 0..obstacle_count {
        let position = Vec2::new(
            rng.random_range(0.0..=world.width()),
            rng.random_range(0.0..=world.height()),
        );
        let radius = sample(rng, params.obstacle_radius, "obstacle_radius")?;
        let hardness = sample(rng, params.obstacle_hardness, "obstacle_hardness")?;
        layout.obstacles.push(world.add_obstacle(position, radius, hardness)?);
    }

    for _ in 0..resource_count {
        let position = world.random_valid_position(rng, 0.0);
        let radius = sample(rng, params.resource_radius, "resource_radius")?;
        let energy = sample(rng, params.resource_energy, "resource_energy")?;
        let regen = sample(rng, params.resource_regen, "resource_regen")?;
        layout
            .resources
            .push(world.add_resource(position, radius, energy, energy, regen)?);
    }

    info!(
        obstacles = layout.obstacles.len(),
        resources = layout.resources.len(),
        "World features scattered"
    );
    Ok(layout)
}

/// Draw uniformly from `[low, high]`.
fn sample<R: Rng + ?Sized>(rng: &mut R, (low, high): (f64, f64), name: &str) -> Result<f64, WorldError> {
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(WorldError::InvalidFeature {
            reason: format!("{name} range [{low}, {high}] is empty"),
        });
    }
    Ok(rng.random_range(low..=high))
}

const fn default_obstacle_density() -> f64 {
    1.0
}

const fn default_resource_ratio() -> f64 {
    0.5
}

const fn default_obstacle_radius() -> (f64, f64) {
    (10.0, 30.0)
}

const fn default_obstacle_hardness() -> (f64, f64) {
    (0.5, 1.0)
}

const fn default_resource_radius() -> (f64, f64) {
    (15.0, 40.0)
}

const fn default_resource_energy() -> (f64, f64) {
    (10.0, 50.0)
}

const fn default_resource_regen() -> (f64, f64) {
    (0.1, 0.5)
}
