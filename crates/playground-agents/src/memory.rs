//! Bounded per-agent memory.
//!
//! Each agent keeps a ring of its most recent experiences. When the ring is
//! full the oldest entry is evicted to make room, so memory use per agent
//! is fixed regardless of run length. Behaviors read the ring to adapt
//! (the autonomous policy looks at recent energy outcomes) and write to it
//! when they set or reach goals.

use std::collections::VecDeque;

use playground_types::{ActionIntent, AgentId, ResourceId, Vec2, Wall};

/// Something an agent experienced.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryEvent {
    /// The action the agent took.
    Acted {
        /// What it intended.
        intent: ActionIntent,
    },
    /// Net energy change over a tick.
    Outcome {
        /// Energy after minus energy before.
        energy_delta: f64,
    },
    /// The agent bumped into another agent.
    CollidedWithAgent {
        /// The other agent.
        other: AgentId,
    },
    /// The agent bumped into an obstacle.
    CollidedWithObstacle,
    /// The agent was reflected off the world edge.
    Bounced {
        /// Walls hit.
        walls: Vec<Wall>,
    },
    /// The agent ate.
    Consumed {
        /// The node eaten from.
        resource: ResourceId,
        /// Energy gained.
        amount: f64,
    },
    /// An approaching neighbor was noticed.
    ThreatSeen {
        /// The neighbor.
        agent: AgentId,
    },
    /// A new target was chosen.
    GoalSet {
        /// Absolute target position.
        target: Vec2,
    },
    /// A target was reached.
    GoalReached {
        /// Absolute target position.
        target: Vec2,
    },
    /// The agent's behavior failed this tick.
    Fault {
        /// Error text.
        reason: String,
    },
}

/// One remembered experience.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    /// Tick the experience happened in.
    pub tick: u64,
    /// What happened.
    pub event: MemoryEvent,
}

/// Fixed-capacity FIFO of memory entries.
#[derive(Debug, Clone)]
pub struct MemoryRing {
    /// Maximum number of entries retained.
    capacity: usize,
    /// Oldest entry at the front.
    entries: VecDeque<MemoryEntry>,
}

impl MemoryRing {
    /// Create an empty ring. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    /// Record an experience, evicting the oldest entry if full.
    ///
    /// Returns the evicted entry, if any.
    pub fn record(&mut self, tick: u64, event: MemoryEvent) -> Option<MemoryEntry> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(MemoryEntry { tick, event });
        evicted
    }

    /// Maximum number of entries retained.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first iterator.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&MemoryEntry> {
        self.entries.back()
    }

    /// Entries recorded at or after `since_tick`, oldest first.
    pub fn since(&self, since_tick: u64) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter().filter(move |entry| entry.tick >= since_tick)
    }

    /// Mean of the `Outcome` energy deltas recorded at or after
    /// `since_tick`, or `None` if there are none.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_energy_delta(&self, since_tick: u64) -> Option<f64> {
        let (sum, count) = self
            .since(since_tick)
            .filter_map(|entry| match entry.event {
                MemoryEvent::Outcome { energy_delta } => Some(energy_delta),
                _ => None,
            })
            .fold((0.0, 0_u32), |(sum, count), delta| (sum + delta, count.saturating_add(1)));
        (count > 0).then(|| sum / f64::from(count))
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for MemoryRing {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut ring = MemoryRing::new(3);
        for tick in 0..3 {
            assert!(ring.record(tick, MemoryEvent::CollidedWithObstacle).is_none());
        }
        let evicted = ring.record(3, MemoryEvent::CollidedWithObstacle);
        assert_eq!(evicted.map(|e| e.tick), Some(0));
        assert_eq!(ring.len(), 3);
        let ticks: Vec<u64> = ring.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3]);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut ring = MemoryRing::new(0);
        ring.record(0, MemoryEvent::CollidedWithObstacle);
        ring.record(1, MemoryEvent::CollidedWithObstacle);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.latest().map(|e| e.tick), Some(1));
    }

    #[test]
    fn default_capacity_is_one_thousand() {
        let mut ring = MemoryRing::default();
        for tick in 0..1_500 {
            ring.record(tick, MemoryEvent::Outcome { energy_delta: -0.1 });
        }
        assert_eq!(ring.len(), 1000);
        assert_eq!(ring.iter().next().map(|e| e.tick), Some(500));
    }

    #[test]
    fn mean_delta_uses_outcomes_only() {
        let mut ring = MemoryRing::new(10);
        ring.record(1, MemoryEvent::Outcome { energy_delta: -1.0 });
        ring.record(2, MemoryEvent::CollidedWithObstacle);
        ring.record(3, MemoryEvent::Outcome { energy_delta: 3.0 });
        let mean = ring.mean_energy_delta(0).unwrap_or(f64::NAN);
        assert!((mean - 1.0).abs() < 1e-12);
        assert!(ring.mean_energy_delta(4).is_none());
    }
}
