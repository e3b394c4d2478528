//! Error types for the launcher binary.
//!
//! [`AppError`] is the top-level error type that wraps all possible
//! failure modes during startup and the run.

/// Top-level error for the launcher binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: playground_core::ConfigError,
    },

    /// Engine construction or an engine operation failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: playground_core::EngineError,
    },

    /// World feature placement failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: playground_world::WorldError,
    },

    /// The simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: playground_core::RunnerError,
    },

    /// Agent spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },

    /// The run summary could not be serialized.
    #[error("summary error: {source}")]
    Summary {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
