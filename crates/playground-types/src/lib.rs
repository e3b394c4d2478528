//! Shared type definitions for the agent playground simulation.
//!
//! This crate is the single source of truth for the data that crosses crate
//! boundaries: identifiers, events, observations, actions and snapshots.
//! It contains no simulation rules.
//!
//! # Modules
//!
//! - [`ids`] -- Sequential `u64` identifiers plus the run correlation id
//! - [`enums`] -- Agent kinds, event kinds, engine status, callback phases
//! - [`event`] -- Events and their typed payloads
//! - [`environment`] -- Weather, obstacles and resource nodes
//! - [`perception`] -- The per-tick observation handed to behaviors
//! - [`action`] -- The action a behavior returns
//! - [`snapshot`] -- By-value views for external consumers

pub mod action;
pub mod enums;
pub mod environment;
pub mod event;
pub mod ids;
pub mod perception;
pub mod snapshot;

/// Two-dimensional vector used for positions, velocities and forces.
pub type Vec2 = glam::DVec2;

// Re-export all public types at crate root for convenience.
pub use action::Action;
pub use enums::{ActionIntent, AgentKind, CallbackPhase, EndReason, EngineStatus, EventKind, Wall};
pub use environment::{Obstacle, ResourceNode, Weather};
pub use event::{CollisionTarget, Event, EventDetails};
pub use ids::{AgentId, ObstacleId, ResourceId, RunId};
pub use perception::{NeighborView, ObstacleView, Observation, ResourceView, SelfState};
pub use snapshot::{AgentSnapshot, WorldSnapshot};
