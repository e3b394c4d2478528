//! Error types for the playground-agents crate.
//!
//! [`AgentError`] covers construction and state mutation. [`BehaviorError`]
//! is raised by a single agent's decision and is never fatal to the
//! simulation: the engine replaces the action with a no-op and reports it.

use playground_types::AgentId;

/// Errors that can occur during agent state operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The spawn request carried unusable values.
    #[error("invalid spawn: {reason}")]
    InvalidSpawn {
        /// What was wrong with the request.
        reason: String,
    },

    /// An energy mutation produced a non-finite value.
    #[error("agent {agent} energy became non-finite")]
    NonFiniteEnergy {
        /// The affected agent.
        agent: AgentId,
    },

    /// The age counter would overflow.
    #[error("agent {agent} age overflow")]
    AgeOverflow {
        /// The affected agent.
        agent: AgentId,
    },
}

/// Errors raised while a behavior chooses its action.
#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    /// The observation contained NaN or infinite values.
    #[error("malformed observation: {reason}")]
    MalformedObservation {
        /// Which part of the observation was bad.
        reason: String,
    },

    /// The behavior produced an action that cannot be applied.
    #[error("malformed action: {reason}")]
    MalformedAction {
        /// Which part of the action was bad.
        reason: String,
    },
}
