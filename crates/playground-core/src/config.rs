//! Configuration loading and typed config structures for the playground.
//!
//! The launcher reads `playground-config.yaml` from the working directory
//! when it exists. Every section and field has a default, so a partial file
//! (or none at all) is valid. `PLAYGROUND_SEED` and `PLAYGROUND_MAX_STEPS`
//! override the file.

use std::path::Path;

use playground_agents::AgentsConfig;
use playground_world::{LayoutParams, WeatherParams, validate_extent};
use serde::Deserialize;

/// File name the launcher looks for in the working directory.
pub const CONFIG_FILE_NAME: &str = "playground-config.yaml";

/// Environment variable overriding [`EngineConfig::seed`].
pub const SEED_ENV: &str = "PLAYGROUND_SEED";

/// Environment variable overriding [`EngineConfig::max_steps`].
pub const MAX_STEPS_ENV: &str = "PLAYGROUND_MAX_STEPS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Parsed, but the values cannot be simulated.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// The first problem found.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Stepping, limits and seed.
    #[serde(default)]
    pub engine: EngineConfig,

    /// World extent and feature layout.
    #[serde(default)]
    pub world: WorldConfig,

    /// Weather drift bounds.
    #[serde(default)]
    pub weather: WeatherParams,

    /// Motion and collision constants.
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Agent profiles and behavior tuning.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Initial population, used by the launcher.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Logging setup, used by the launcher.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override the seed and step limit from the environment when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but is not an
    /// unsigned integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var(SEED_ENV) {
            self.engine.seed = parse_override(SEED_ENV, &val)?;
        }
        if let Ok(val) = std::env::var(MAX_STEPS_ENV) {
            self.engine.max_steps = parse_override(MAX_STEPS_ENV, &val)?;
        }
        Ok(())
    }

    /// Check that the configuration can be simulated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { reason };

        let e = &self.engine;
        if !e.time_step.is_finite() || e.time_step <= 0.0 {
            return Err(invalid(format!("engine.time_step must be positive, got {}", e.time_step)));
        }

        validate_extent(self.world.width, self.world.height, self.world.cell_size)
            .map_err(|err| invalid(err.to_string()))?;

        let p = &self.physics;
        if !(p.friction > 0.0 && p.friction <= 1.0) {
            return Err(invalid(format!("physics.friction must be in (0, 1], got {}", p.friction)));
        }
        if !(0.0..=1.0).contains(&p.restitution) {
            return Err(invalid(format!(
                "physics.restitution must be in [0, 1], got {}",
                p.restitution
            )));
        }
        let lengths = [p.collision_radius, p.pickup_radius, p.obstacle_padding, p.wind_coupling];
        if lengths.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid(
                "physics radii, padding and wind coupling must be non-negative".to_owned(),
            ));
        }

        let w = &self.weather;
        if w.min_temperature > w.max_temperature {
            return Err(invalid(format!(
                "weather temperature range [{}, {}] is empty",
                w.min_temperature, w.max_temperature
            )));
        }

        self.agents.validate().map_err(invalid)?;
        Ok(())
    }
}

/// Parse an unsigned override value.
fn parse_override(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|err| ConfigError::Invalid {
        reason: format!("{name}={value:?} is not an unsigned integer: {err}"),
    })
}

/// Stepping and run limits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Simulated seconds per tick.
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// Ticks to run before completing (0 = unlimited).
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Largest live population `add_agent` accepts.
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Resolve agent-agent collisions.
    #[serde(default = "default_true")]
    pub enable_physics: bool,

    /// Complete the run when the last agent dies.
    #[serde(default = "default_true")]
    pub stop_on_extinction: bool,

    /// Pace the async runner to one tick per `time_step` of wall time.
    #[serde(default)]
    pub real_time: bool,

    /// Master seed for all randomness.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Run the decide phase in parallel (needs the `parallel` feature).
    #[serde(default)]
    pub run_parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            max_steps: default_max_steps(),
            max_agents: default_max_agents(),
            enable_physics: default_true(),
            stop_on_extinction: default_true(),
            real_time: false,
            seed: default_seed(),
            run_parallel: false,
        }
    }
}

/// World extent and layout.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Extent along x.
    #[serde(default = "default_world_extent")]
    pub width: f64,

    /// Extent along y.
    #[serde(default = "default_world_extent")]
    pub height: f64,

    /// Spatial index cell size.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,

    /// Refill resource nodes each tick.
    #[serde(default = "default_true")]
    pub resource_regeneration: bool,

    /// Obstacle and resource scatter parameters.
    #[serde(flatten)]
    pub layout: LayoutParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_extent(),
            height: default_world_extent(),
            cell_size: default_cell_size(),
            resource_regeneration: default_true(),
            layout: LayoutParams::default(),
        }
    }
}

/// Motion and collision constants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PhysicsConfig {
    /// Velocity multiplier applied every tick, `(0, 1]`.
    #[serde(default = "default_friction")]
    pub friction: f64,

    /// Fraction of normal velocity kept on bounces, `[0, 1]`.
    #[serde(default = "default_restitution")]
    pub restitution: f64,

    /// Agents closer than this collide.
    #[serde(default = "default_collision_radius")]
    pub collision_radius: f64,

    /// Reach beyond a resource's radius within which it can be eaten.
    #[serde(default = "default_pickup_radius")]
    pub pickup_radius: f64,

    /// Clearance kept between agents and obstacle surfaces.
    #[serde(default = "default_obstacle_padding")]
    pub obstacle_padding: f64,

    /// Fraction of the wind vector applied as acceleration (0 = no wind).
    #[serde(default)]
    pub wind_coupling: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: default_friction(),
            restitution: default_restitution(),
            collision_radius: default_collision_radius(),
            pickup_radius: default_pickup_radius(),
            obstacle_padding: default_obstacle_padding(),
            wind_coupling: 0.0,
        }
    }
}

/// Initial agent counts per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Autonomous agents.
    #[serde(default = "default_autonomous_count")]
    pub autonomous: u32,

    /// Reactive agents.
    #[serde(default = "default_reactive_count")]
    pub reactive: u32,

    /// Wanderers.
    #[serde(default = "default_wanderer_count")]
    pub wanderer: u32,
}

impl PopulationConfig {
    /// Total agents requested.
    pub const fn total(&self) -> u32 {
        self.autonomous
            .saturating_add(self.reactive)
            .saturating_add(self.wanderer)
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            autonomous: default_autonomous_count(),
            reactive: default_reactive_count(),
            wanderer: default_wanderer_count(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Metrics summary every N ticks (0 disables).
    #[serde(default = "default_log_every")]
    pub log_every: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_every: default_log_every(),
        }
    }
}

const fn default_time_step() -> f64 {
    0.1
}

const fn default_max_steps() -> u64 {
    1000
}

const fn default_max_agents() -> usize {
    1000
}

const fn default_true() -> bool {
    true
}

const fn default_seed() -> u64 {
    42
}

const fn default_world_extent() -> f64 {
    1000.0
}

const fn default_cell_size() -> f64 {
    50.0
}

const fn default_friction() -> f64 {
    0.95
}

const fn default_restitution() -> f64 {
    1.0
}

const fn default_collision_radius() -> f64 {
    2.0
}

const fn default_pickup_radius() -> f64 {
    1.0
}

const fn default_obstacle_padding() -> f64 {
    1.0
}

const fn default_autonomous_count() -> u32 {
    30
}

const fn default_reactive_count() -> u32 {
    15
}

const fn default_wanderer_count() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_log_every() -> u64 {
    100
}
