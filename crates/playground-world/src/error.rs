//! Error types for the `playground-world` crate.
//!
//! Spatial index failures are kept separate in [`SpatialError`] because the
//! engine treats some of them (an inconsistent grid) as fatal and others
//! (a duplicate insert from the API) as caller mistakes.

use playground_types::{AgentId, ObstacleId, ResourceId};

/// Errors raised by the spatial index.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The agent is already present in the grid.
    #[error("agent {0} is already in the spatial index")]
    Duplicate(AgentId),

    /// The agent is not present in the grid.
    #[error("agent {0} is not in the spatial index")]
    NotFound(AgentId),

    /// The supplied position has a NaN or infinite coordinate.
    #[error("agent {agent} has a non-finite position")]
    NonFinitePosition {
        /// The offending agent.
        agent: AgentId,
    },

    /// The cell size is not a positive finite number.
    #[error("invalid cell size {cell_size}")]
    InvalidCellSize {
        /// The rejected value.
        cell_size: f64,
    },

    /// The grid disagrees with the authoritative agent positions.
    #[error("spatial index inconsistent: {reason}")]
    Inconsistent {
        /// What was found to be wrong.
        reason: String,
    },
}

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Width or height is not a positive finite number.
    #[error("invalid world bounds {width} x {height}")]
    InvalidBounds {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// The grid cell size does not satisfy `0 < cell_size <= min(w, h) / 2`.
    #[error("cell size {cell_size} invalid for a {width} x {height} world")]
    InvalidCellSize {
        /// Requested cell size.
        cell_size: f64,
        /// World width.
        width: f64,
        /// World height.
        height: f64,
    },

    /// A feature was placed with a non-finite or non-positive radius, or
    /// outside the world.
    #[error("invalid feature: {reason}")]
    InvalidFeature {
        /// Explanation of what is wrong with the feature.
        reason: String,
    },

    /// An obstacle was not found.
    #[error("obstacle not found: {0}")]
    ObstacleNotFound(ObstacleId),

    /// A resource node was not found.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// A harvest was attempted on an empty resource node.
    #[error("resource {0} is exhausted")]
    ResourceExhausted(ResourceId),

    /// The identifier counter overflowed.
    #[error("identifier space exhausted")]
    IdOverflow,

    /// A spatial index operation failed.
    #[error("spatial error: {source}")]
    Spatial {
        /// The underlying spatial error.
        #[from]
        source: SpatialError,
    },
}
