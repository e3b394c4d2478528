//! Simulation clock.
//!
//! The tick counter is the single source of truth for simulated time.
//! Elapsed seconds are derived from it and never stored, so they cannot
//! drift from the tick count.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The time step is not a positive finite number.
    #[error("invalid time step: {time_step}")]
    InvalidTimeStep {
        /// The rejected value.
        time_step: f64,
    },
}

/// Tick counter with a fixed time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    /// Next tick to run (0-indexed).
    tick: u64,
    /// Simulated seconds per tick.
    time_step: f64,
}

impl SimulationClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTimeStep`] unless `time_step` is
    /// positive and finite.
    pub fn new(time_step: f64) -> Result<Self, ClockError> {
        if !time_step.is_finite() || time_step <= 0.0 {
            return Err(ClockError::InvalidTimeStep { time_step });
        }
        Ok(Self { tick: 0, time_step })
    }

    /// Advance by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// The next tick to run, equal to the number of ticks completed.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds per tick.
    pub const fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Simulated seconds elapsed.
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed(&self) -> f64 {
        self.tick as f64 * self.time_step
    }

    /// Back to tick 0.
    pub const fn reset(&mut self) {
        self.tick = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_tick_zero() {
        let clock = SimulationClock::new(0.1).unwrap();
        assert_eq!(clock.tick(), 0);
        assert!(clock.elapsed().abs() < f64::EPSILON);
    }

    #[test]
    fn elapsed_follows_ticks() {
        let mut clock = SimulationClock::new(0.25).unwrap();
        for _ in 0..8 {
            clock.advance().unwrap();
        }
        assert_eq!(clock.tick(), 8);
        assert!((clock.elapsed() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(SimulationClock::new(0.0).is_err());
        assert!(SimulationClock::new(-1.0).is_err());
        assert!(SimulationClock::new(f64::NAN).is_err());
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = SimulationClock::new(1.0).unwrap();
        clock.tick = u64::MAX;
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
    }
}
