//! Tick pipeline and orchestration for the agent playground simulation.
//!
//! This crate owns the fixed-step tick: observe, decide, resolve physics,
//! charge energy, drift the environment, verify, and publish events. The
//! [`Engine`] wraps the pipeline in a lifecycle state machine with
//! observers and operator controls.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and fixed time step.
//! - [`config`] -- Configuration loading from `playground-config.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- Order-independent decide phase with per-agent RNG
//!   streams and fault isolation.
//! - [`engine`] -- [`Engine`]: agent registry, state machine, observers.
//! - [`operator`] -- Shared pause/stop flags.
//! - [`perception`] -- Per-agent observation assembly.
//! - [`physics`] -- Integration, boundary reflection, obstacle and agent
//!   collisions, resource consumption.
//! - [`runner`] -- Async loop with real-time pacing.
//! - [`tick`] -- The tick pipeline itself.

pub mod clock;
pub mod config;
pub mod decision;
pub mod engine;
pub mod operator;
pub mod perception;
pub mod physics;
pub mod runner;
pub mod tick;

pub use clock::{ClockError, SimulationClock};
pub use config::{ConfigError, SimulationConfig};
pub use engine::{Engine, EngineError, ObserverError, RunOutcome, StatusReport, TickObserver, TickView};
pub use operator::OperatorState;
pub use runner::{RunnerError, run_simulation};
pub use tick::{SimulationState, TickError, TickReport};
