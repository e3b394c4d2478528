//! Agent state, memory, behaviors and energy rules for the agent playground.
//!
//! Everything here operates on agent state without touching the world or
//! the clock. The engine crate builds observations, asks each agent's
//! [`Behavior`] for an [`Action`](playground_types::Action), applies it, and
//! settles energy with [`vitals`].
//!
//! # Modules
//!
//! - [`agent`] -- Agent records and spawn requests ([`Agent`], [`AgentSpawn`])
//! - [`behavior`] -- The three policies and their dispatch ([`Behavior`])
//! - [`config`] -- Per-kind profiles and tuning ([`AgentsConfig`])
//! - [`error`] -- Error types ([`AgentError`], [`BehaviorError`])
//! - [`memory`] -- Bounded experience ring ([`MemoryRing`])
//! - [`vitals`] -- Per-tick energy accounting

pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod memory;
pub mod vitals;

pub use agent::{Agent, AgentSpawn};
pub use behavior::{AutonomousState, Behavior, ReactiveState, WandererState};
pub use config::{AgentsConfig, AutonomousTuning, KindProfile, ReactiveTuning, UtilityWeights, WandererTuning};
pub use error::{AgentError, BehaviorError};
pub use memory::{MemoryEntry, MemoryEvent, MemoryRing};
