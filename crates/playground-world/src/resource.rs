//! Regeneration and harvesting for resource nodes.
//!
//! Each [`ResourceNode`] holds an `energy` amount, a `regen_rate` per
//! simulated second, and a `capacity` ceiling. Regeneration runs between
//! ticks and never pushes `energy` above `capacity`; harvesting never takes
//! more than is available.

use playground_types::ResourceNode;

use crate::error::WorldError;

/// Apply `dt` seconds of regeneration to a node.
///
/// Returns the energy actually added (zero once the node is full).
pub fn regenerate(node: &mut ResourceNode, dt: f64) -> f64 {
    if node.energy >= node.capacity || dt <= 0.0 || node.regen_rate <= 0.0 {
        return 0.0;
    }
    let headroom = node.capacity - node.energy;
    let added = (node.regen_rate * dt).min(headroom);
    node.energy += added;
    added
}

/// Take up to `requested` energy from a node, returning the amount taken.
///
/// # Errors
///
/// Returns [`WorldError::ResourceExhausted`] if the node is already empty.
pub fn harvest(node: &mut ResourceNode, requested: f64) -> Result<f64, WorldError> {
    if node.is_depleted() {
        return Err(WorldError::ResourceExhausted(node.id));
    }
    let taken = requested.max(0.0).min(node.energy);
    node.energy -= taken;
    Ok(taken)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use playground_types::{ResourceId, Vec2};

    use super::*;

    fn make_node(energy: f64, regen_rate: f64, capacity: f64) -> ResourceNode {
        ResourceNode {
            id: ResourceId(1),
            position: Vec2::ZERO,
            radius: 10.0,
            energy,
            capacity,
            regen_rate,
        }
    }

    #[test]
    fn regen_adds_rate_times_dt() {
        let mut node = make_node(10.0, 0.5, 50.0);
        let added = regenerate(&mut node, 2.0);
        assert!((added - 1.0).abs() < 1e-12);
        assert!((node.energy - 11.0).abs() < 1e-12);
    }

    #[test]
    fn regen_capped_at_capacity() {
        let mut node = make_node(49.8, 0.5, 50.0);
        let added = regenerate(&mut node, 1.0);
        assert!((added - 0.2).abs() < 1e-9);
        assert!((node.energy - 50.0).abs() < 1e-12);
        assert!(regenerate(&mut node, 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn harvest_partial() {
        let mut node = make_node(3.0, 0.0, 50.0);
        let taken = harvest(&mut node, 5.0).unwrap();
        assert!((taken - 3.0).abs() < f64::EPSILON);
        assert!(node.is_depleted());
    }

    #[test]
    fn harvest_empty_node_fails() {
        let mut node = make_node(0.0, 0.1, 50.0);
        assert!(matches!(
            harvest(&mut node, 1.0),
            Err(WorldError::ResourceExhausted(ResourceId(1)))
        ));
    }

    #[test]
    fn harvest_negative_request_takes_nothing() {
        let mut node = make_node(5.0, 0.0, 50.0);
        let taken = harvest(&mut node, -2.0).unwrap();
        assert!(taken.abs() < f64::EPSILON);
        assert!((node.energy - 5.0).abs() < f64::EPSILON);
    }
}
