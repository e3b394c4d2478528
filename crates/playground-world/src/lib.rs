//! Bounded 2D environment for the agent playground simulation.
//!
//! This crate models everything in the world that is not an agent: the
//! rectangular extent, static obstacles, regenerating resource nodes and
//! drifting weather. It also owns the uniform-grid spatial index used for
//! agent neighbor queries.
//!
//! # Modules
//!
//! - [`environment`] -- Deterministic bounded weather drift.
//! - [`error`] -- Error types for world and spatial index operations.
//! - [`layout`] -- Seeded random placement of obstacles and resources.
//! - [`resource`] -- Regeneration and harvesting for resource nodes.
//! - [`spatial`] -- Uniform-grid spatial index with radius and region queries.
//! - [`world`] -- [`World`]: extent, features, placement and snapshots.

pub mod environment;
pub mod error;
pub mod layout;
pub mod resource;
pub mod spatial;
pub mod world;

// Re-export primary types at crate root.
pub use environment::{WeatherParams, WeatherSystem};
pub use error::{SpatialError, WorldError};
pub use layout::{Layout, LayoutParams, scatter_features};
pub use spatial::{GridStats, SpatialGrid};
pub use world::{World, WorldStats, validate_extent};
