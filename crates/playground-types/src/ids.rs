//! Type-safe identifier wrappers.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. Entity IDs are plain
//! `u64` counters handed out in insertion order, so two runs with the same
//! inputs assign the same IDs and iterate agents in the same order.
//!
//! [`RunId`] is the exception: it is a UUID v7 used only to correlate log
//! lines of a single run and never influences simulation state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// The first identifier handed out by a fresh allocator.
            pub const FIRST: Self = Self(1);

            /// Return the inner `u64` value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Return the identifier that follows this one, or `None` if the
            /// counter would overflow.
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(value) => Some(Self(value)),
                    None => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent in the simulation.
    AgentId
}

define_id! {
    /// Unique identifier for a static obstacle.
    ObstacleId
}

define_id! {
    /// Unique identifier for a regenerating resource node.
    ResourceId
}

/// Correlation identifier for one simulation run (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new run identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_advance_sequentially() {
        let first = AgentId::FIRST;
        let second = first.next().unwrap();
        assert_eq!(first.into_inner(), 1);
        assert_eq!(second.into_inner(), 2);
        assert!(first < second);
    }

    #[test]
    fn next_reports_overflow() {
        assert!(ResourceId(u64::MAX).next().is_none());
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&ObstacleId(7)).unwrap();
        assert_eq!(json, "7");
        let restored: ObstacleId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ObstacleId(7));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
