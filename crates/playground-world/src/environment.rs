//! Weather drift for the playground world.
//!
//! Weather is a bounded random walk over four quantities: temperature,
//! humidity, wind speed and wind direction. It changes only between ticks
//! and is read-only to agents while a tick runs.
//!
//! # Determinism
//!
//! Each step is drawn from a `splitmix64`-style hash of
//! `(world_seed, tick, channel)`. The same seed and tick always produce the
//! same drift, independent of how many other random draws the simulation
//! made, so weather can be replayed without replaying agents.

use core::f64::consts::TAU;

use playground_types::Weather;
use serde::Deserialize;

/// Tunable bounds and step sizes for weather drift.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeatherParams {
    /// Whether weather changes at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lowest reachable temperature (°C).
    #[serde(default = "default_min_temperature")]
    pub min_temperature: f64,
    /// Highest reachable temperature (°C).
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f64,
    /// Largest temperature change per tick.
    #[serde(default = "default_temperature_step")]
    pub temperature_step: f64,
    /// Largest humidity change per tick.
    #[serde(default = "default_humidity_step")]
    pub humidity_step: f64,
    /// Highest reachable wind speed.
    #[serde(default = "default_max_wind_speed")]
    pub max_wind_speed: f64,
    /// Largest wind speed change per tick.
    #[serde(default = "default_wind_speed_step")]
    pub wind_speed_step: f64,
    /// Largest wind heading change per tick (radians).
    #[serde(default = "default_wind_turn_step")]
    pub wind_turn_step: f64,
}

impl Default for WeatherParams {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            min_temperature: default_min_temperature(),
            max_temperature: default_max_temperature(),
            temperature_step: default_temperature_step(),
            humidity_step: default_humidity_step(),
            max_wind_speed: default_max_wind_speed(),
            wind_speed_step: default_wind_speed_step(),
            wind_turn_step: default_wind_turn_step(),
        }
    }
}

/// Independent random channels so the four quantities do not move in
/// lockstep.
#[derive(Debug, Clone, Copy)]
enum Channel {
    Temperature = 1,
    Humidity = 2,
    WindSpeed = 3,
    WindDirection = 4,
}

/// Deterministic weather generator for the simulation.
#[derive(Debug, Clone)]
pub struct WeatherSystem {
    /// The world seed used to derive per-tick randomness.
    world_seed: u64,
    /// Drift bounds and step sizes.
    params: WeatherParams,
    /// Current conditions.
    current: Weather,
}

impl WeatherSystem {
    /// Create a weather system starting from mild default conditions,
    /// clamped into the configured bounds.
    pub fn new(world_seed: u64, params: WeatherParams) -> Self {
        let mut system = Self {
            world_seed,
            params,
            current: Weather::default(),
        };
        system.clamp();
        system
    }

    /// Return the current weather.
    pub const fn current(&self) -> Weather {
        self.current
    }

    /// Return the drift parameters.
    pub const fn params(&self) -> &WeatherParams {
        &self.params
    }

    /// Override the current weather (clamped into bounds).
    pub fn set_current(&mut self, weather: Weather) {
        self.current = weather;
        self.clamp();
    }

    /// Advance the weather by one step for `tick` and return the result.
    ///
    /// When drift is disabled the weather is returned unchanged.
    pub fn drift(&mut self, tick: u64) -> Weather {
        if !self.params.enabled {
            return self.current;
        }
        let p = self.params;
        let seed = self.world_seed;

        self.current.temperature += p.temperature_step * unit(seed, tick, Channel::Temperature);
        self.current.humidity += p.humidity_step * unit(seed, tick, Channel::Humidity);
        self.current.wind_speed += p.wind_speed_step * unit(seed, tick, Channel::WindSpeed);
        self.current.wind_direction += p.wind_turn_step * unit(seed, tick, Channel::WindDirection);
        self.clamp();
        self.current
    }

    /// Pull every quantity back into its range.
    fn clamp(&mut self) {
        let p = &self.params;
        let (low, high) = if p.min_temperature <= p.max_temperature {
            (p.min_temperature, p.max_temperature)
        } else {
            (p.max_temperature, p.min_temperature)
        };
        self.current.temperature = self.current.temperature.clamp(low, high);
        self.current.humidity = self.current.humidity.clamp(0.0, 1.0);
        self.current.wind_speed = self.current.wind_speed.clamp(0.0, p.max_wind_speed.max(0.0));
        let heading = self.current.wind_direction.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs.
        self.current.wind_direction = if heading >= TAU { 0.0 } else { heading };
    }
}

/// Hash `(seed, tick, channel)` into a value in `[-1, 1)`.
#[allow(clippy::cast_precision_loss)]
fn unit(world_seed: u64, tick: u64, channel: Channel) -> f64 {
    let bits = deterministic_random(world_seed, tick, channel as u64) >> 11;
    // 53 significant bits fit an f64 exactly.
    let fraction = bits as f64 / (1_u64 << 53) as f64;
    fraction.mul_add(2.0, -1.0)
}

/// `splitmix64` finalizer over the combined inputs.
const fn deterministic_random(world_seed: u64, tick: u64, channel: u64) -> u64 {
    let mut z = world_seed
        .wrapping_add(tick.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add(channel.wrapping_mul(0xbf58_476d_1ce4_e5b9));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

const fn default_true() -> bool {
    true
}

const fn default_min_temperature() -> f64 {
    -20.0
}

const fn default_max_temperature() -> f64 {
    40.0
}

const fn default_temperature_step() -> f64 {
    0.5
}

const fn default_humidity_step() -> f64 {
    0.02
}

const fn default_max_wind_speed() -> f64 {
    10.0
}

const fn default_wind_speed_step() -> f64 {
    0.25
}

const fn default_wind_turn_step() -> f64 {
    0.1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn drift_is_reproducible() {
        let mut a = WeatherSystem::new(42, WeatherParams::default());
        let mut b = WeatherSystem::new(42, WeatherParams::default());
        for tick in 0..100 {
            assert_eq!(a.drift(tick), b.drift(tick));
        }
    }

    #[test]
    fn drift_varies_by_seed() {
        let mut a = WeatherSystem::new(1, WeatherParams::default());
        let mut b = WeatherSystem::new(2, WeatherParams::default());
        assert_ne!(a.drift(0), b.drift(0));
    }

    #[test]
    fn drift_stays_in_bounds() {
        let params = WeatherParams {
            temperature_step: 25.0,
            humidity_step: 0.9,
            wind_speed_step: 8.0,
            ..WeatherParams::default()
        };
        let mut system = WeatherSystem::new(9, params);
        for tick in 0..5_000 {
            let w = system.drift(tick);
            assert!((-20.0..=40.0).contains(&w.temperature));
            assert!((0.0..=1.0).contains(&w.humidity));
            assert!((0.0..=10.0).contains(&w.wind_speed));
            assert!((0.0..TAU).contains(&w.wind_direction));
        }
    }

    #[test]
    fn disabled_weather_is_frozen() {
        let params = WeatherParams {
            enabled: false,
            ..WeatherParams::default()
        };
        let mut system = WeatherSystem::new(3, params);
        let before = system.current();
        for tick in 0..10 {
            assert_eq!(system.drift(tick), before);
        }
    }

    #[test]
    fn unit_values_are_in_range() {
        for tick in 0..1_000 {
            let v = unit(5, tick, Channel::Humidity);
            assert!((-1.0..1.0).contains(&v));
        }
    }

    #[test]
    fn params_parse_with_defaults() {
        let params: WeatherParams = serde_yml::from_str("max_wind_speed: 3.0").unwrap();
        assert!((params.max_wind_speed - 3.0).abs() < f64::EPSILON);
        assert!(params.enabled);
        assert!((params.min_temperature + 20.0).abs() < f64::EPSILON);
    }
}
