//! Per-tick event bus for the agent playground.
//!
//! The tick pipeline publishes events as things happen and drains the bus
//! once at the end of the tick. Events come out in exactly the order they
//! went in, each stamped with its position in the batch. Nothing is kept
//! across ticks: a drained bus starts numbering from zero again.

use std::collections::BTreeMap;

use playground_types::{Event, EventKind};
use tracing::trace;

/// Ordered buffer of the events raised during one tick.
#[derive(Debug, Default)]
pub struct EventBus {
    /// Published, not yet drained, oldest first.
    pending: Vec<Event>,
    /// Sequence number given to the next published event.
    next_sequence: u64,
}

impl EventBus {
    /// Create an empty bus.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Append an event, stamping its sequence number.
    ///
    /// Returns the sequence number assigned.
    pub fn publish(&mut self, mut event: Event) -> u64 {
        let sequence = self.next_sequence;
        event.sequence = sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        trace!(tick = event.tick, sequence, kind = %event.kind(), "Event published");
        self.pending.push(event);
        sequence
    }

    /// Publish several events in iteration order.
    pub fn publish_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.publish(event);
        }
    }

    /// Take every pending event in publish order and reset numbering.
    pub fn drain(&mut self) -> Vec<Event> {
        self.next_sequence = 0;
        std::mem::take(&mut self.pending)
    }

    /// Events published since the last drain.
    pub fn pending(&self) -> &[Event] {
        &self.pending
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending events of one kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.pending.iter().filter(|e| e.kind() == kind).count()
    }
}

/// Tally events by kind.
pub fn count_by_kind<'a, I>(events: I) -> BTreeMap<EventKind, u64>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut counts = BTreeMap::new();
    for event in events {
        let slot = counts.entry(event.kind()).or_insert(0_u64);
        *slot = slot.saturating_add(1);
    }
    counts
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_types::{AgentId, AgentKind, EventDetails, Vec2};

    use super::*;

    fn spawn(tick: u64, id: u64) -> Event {
        Event::new(
            tick,
            vec![AgentId(id)],
            EventDetails::Spawn {
                agent_kind: AgentKind::Wanderer,
                position: Vec2::ZERO,
                energy: 100.0,
            },
        )
    }

    fn death(tick: u64, id: u64) -> Event {
        Event::new(
            tick,
            vec![AgentId(id)],
            EventDetails::Death {
                position: Vec2::ONE,
                age: 3,
            },
        )
    }

    #[test]
    fn drain_preserves_publish_order() {
        let mut bus = EventBus::new();
        bus.publish(spawn(0, 3));
        bus.publish(death(0, 1));
        bus.publish(spawn(0, 2));
        let events = bus.drain();
        let ids: Vec<AgentId> = events.iter().flat_map(|e| e.agents.clone()).collect();
        assert_eq!(ids, vec![AgentId(3), AgentId(1), AgentId(2)]);
        let seqs: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn drain_clears_and_resets_sequence() {
        let mut bus = EventBus::new();
        bus.publish_all([spawn(0, 1), spawn(0, 2)]);
        assert_eq!(bus.len(), 2);
        assert_eq!(bus.drain().len(), 2);
        assert!(bus.is_empty());
        assert!(bus.drain().is_empty());
        assert_eq!(bus.publish(spawn(1, 3)), 0);
    }

    #[test]
    fn counts_by_kind() {
        let mut bus = EventBus::new();
        bus.publish_all([spawn(0, 1), death(0, 1), spawn(0, 2)]);
        assert_eq!(bus.count(EventKind::Spawn), 2);
        assert_eq!(bus.count(EventKind::Collision), 0);
        let tally = count_by_kind(bus.pending());
        assert_eq!(tally.get(&EventKind::Death), Some(&1));
        assert_eq!(tally.get(&EventKind::Spawn), Some(&2));
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_value(spawn(4, 9)).unwrap();
        assert_eq!(json["details"]["kind"], "spawn");
        assert_eq!(json["tick"], 4);
    }
}
