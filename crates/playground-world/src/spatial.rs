//! Uniform-grid spatial index for neighbor queries.
//!
//! The world is divided into square cells of `cell_size`. Each agent lives
//! in exactly one cell, derived from its position by flooring each
//! coordinate. A radius query visits only the cells overlapping the query
//! circle and then filters by exact distance, so it returns exactly the set
//! a brute-force scan would.
//!
//! Cells and agents are stored in ordered maps. Iteration order is therefore
//! a function of ids and coordinates only, which keeps neighbor lists (and
//! everything derived from them) reproducible across runs.

use std::collections::{BTreeMap, BTreeSet};

use playground_types::{AgentId, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::SpatialError;

/// Integer cell coordinates.
pub type Cell = (i64, i64);

/// Where an agent is recorded in the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridEntry {
    /// Cell the agent is filed under.
    cell: Cell,
    /// Position the cell was derived from.
    position: Vec2,
}

/// Occupancy statistics for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    /// Edge length of a cell.
    pub cell_size: f64,
    /// Number of indexed agents.
    pub agents: usize,
    /// Number of cells holding at least one agent.
    pub occupied_cells: usize,
    /// Largest number of agents in a single cell.
    pub max_cell_population: usize,
}

/// Spatial hash over a uniform grid.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Edge length of a cell.
    cell_size: f64,
    /// Cell -> agents filed under it.
    cells: BTreeMap<Cell, BTreeSet<AgentId>>,
    /// Agent -> its cell and last indexed position.
    entries: BTreeMap<AgentId, GridEntry>,
}

impl SpatialGrid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidCellSize`] unless `cell_size` is
    /// positive and finite.
    pub fn new(cell_size: f64) -> Result<Self, SpatialError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(SpatialError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            cell_size,
            cells: BTreeMap::new(),
            entries: BTreeMap::new(),
        })
    }

    /// Return the cell edge length.
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of indexed agents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `agent` is indexed.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.entries.contains_key(&agent)
    }

    /// The position `agent` was last indexed at.
    pub fn position_of(&self, agent: AgentId) -> Option<Vec2> {
        self.entries.get(&agent).map(|entry| entry.position)
    }

    /// Map a position to its cell.
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, position: Vec2) -> Cell {
        // `as` saturates for out-of-range floats.
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Add an agent at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Duplicate`] if the agent is already indexed,
    /// or [`SpatialError::NonFinitePosition`] for NaN/infinite coordinates.
    pub fn insert(&mut self, agent: AgentId, position: Vec2) -> Result<(), SpatialError> {
        if self.entries.contains_key(&agent) {
            return Err(SpatialError::Duplicate(agent));
        }
        if !position.is_finite() {
            return Err(SpatialError::NonFinitePosition { agent });
        }
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().insert(agent);
        self.entries.insert(agent, GridEntry { cell, position });
        Ok(())
    }

    /// Remove an agent, returning its last indexed position.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NotFound`] if the agent is not indexed.
    pub fn remove(&mut self, agent: AgentId) -> Result<Vec2, SpatialError> {
        let entry = self
            .entries
            .remove(&agent)
            .ok_or(SpatialError::NotFound(agent))?;
        self.detach(agent, entry.cell);
        Ok(entry.position)
    }

    /// Move an agent to `position` in one step.
    ///
    /// The agent is never observable in two cells or in none: on error the
    /// grid is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NotFound`] if the agent is not indexed, or
    /// [`SpatialError::NonFinitePosition`] for NaN/infinite coordinates.
    pub fn relocate(&mut self, agent: AgentId, position: Vec2) -> Result<(), SpatialError> {
        if !position.is_finite() {
            return Err(SpatialError::NonFinitePosition { agent });
        }
        let new_cell = self.cell_of(position);
        let entry = self
            .entries
            .get_mut(&agent)
            .ok_or(SpatialError::NotFound(agent))?;
        let old_cell = entry.cell;
        entry.cell = new_cell;
        entry.position = position;
        if old_cell != new_cell {
            self.detach(agent, old_cell);
            self.cells.entry(new_cell).or_default().insert(agent);
        }
        Ok(())
    }

    /// All agents within `radius` of `center` (inclusive), ascending by id.
    ///
    /// `exclude` is dropped from the result, typically the querying agent.
    /// A negative or NaN radius yields an empty result.
    pub fn query_radius(&self, center: Vec2, radius: f64, exclude: Option<AgentId>) -> Vec<AgentId> {
        if radius.is_nan() || radius < 0.0 || !center.is_finite() {
            return Vec::new();
        }
        let min = self.cell_of(center - Vec2::splat(radius));
        let max = self.cell_of(center + Vec2::splat(radius));
        let radius_sq = radius * radius;

        let mut found: Vec<AgentId> = self
            .cells_in_range(min, max)
            .flat_map(|agents| agents.iter().copied())
            .filter(|agent| Some(*agent) != exclude)
            .filter(|agent| {
                self.entries
                    .get(agent)
                    .is_some_and(|entry| entry.position.distance_squared(center) <= radius_sq)
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// All agents inside the axis-aligned rectangle `[min, max]`, ascending
    /// by id.
    pub fn query_region(&self, min: Vec2, max: Vec2) -> Vec<AgentId> {
        if !min.is_finite() || !max.is_finite() || min.x > max.x || min.y > max.y {
            return Vec::new();
        }
        let mut found: Vec<AgentId> = self
            .cells_in_range(self.cell_of(min), self.cell_of(max))
            .flat_map(|agents| agents.iter().copied())
            .filter(|agent| {
                self.entries.get(agent).is_some_and(|entry| {
                    let p = entry.position;
                    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
                })
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Remove every agent.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }

    /// Occupancy statistics.
    pub fn stats(&self) -> GridStats {
        GridStats {
            cell_size: self.cell_size,
            agents: self.entries.len(),
            occupied_cells: self.cells.len(),
            max_cell_population: self.cells.values().map(BTreeSet::len).max().unwrap_or(0),
        }
    }

    /// Check the grid against the authoritative agent positions.
    ///
    /// Every agent in `expected` must be indexed at exactly that position,
    /// filed under exactly one cell matching it, and no other agent may be
    /// indexed.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Inconsistent`] describing the first mismatch.
    pub fn verify<I>(&self, expected: I) -> Result<(), SpatialError>
    where
        I: IntoIterator<Item = (AgentId, Vec2)>,
    {
        let mut seen: usize = 0;
        for (agent, position) in expected {
            seen = seen.saturating_add(1);
            let entry = self.entries.get(&agent).ok_or_else(|| SpatialError::Inconsistent {
                reason: format!("agent {agent} missing from grid"),
            })?;
            if entry.position != position {
                return Err(SpatialError::Inconsistent {
                    reason: format!(
                        "agent {agent} indexed at {} but located at {position}",
                        entry.position
                    ),
                });
            }
            if entry.cell != self.cell_of(position) {
                return Err(SpatialError::Inconsistent {
                    reason: format!("agent {agent} filed under the wrong cell"),
                });
            }
            if !self.cells.get(&entry.cell).is_some_and(|set| set.contains(&agent)) {
                return Err(SpatialError::Inconsistent {
                    reason: format!("agent {agent} absent from its cell"),
                });
            }
        }
        if seen != self.entries.len() {
            return Err(SpatialError::Inconsistent {
                reason: format!(
                    "grid holds {} agents, expected {seen}",
                    self.entries.len()
                ),
            });
        }
        let filed: usize = self.cells.values().map(BTreeSet::len).sum();
        if filed != self.entries.len() {
            return Err(SpatialError::Inconsistent {
                reason: format!("{filed} cell memberships for {} agents", self.entries.len()),
            });
        }
        Ok(())
    }

    /// Drop `agent` from `cell`, discarding the cell once it is empty.
    fn detach(&mut self, agent: AgentId, cell: Cell) {
        if let Some(set) = self.cells.get_mut(&cell) {
            set.remove(&agent);
            if set.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Occupied cells within the inclusive rectangle `[min, max]`.
    ///
    /// Walks the rectangle cell by cell when it is small, and filters the
    /// occupied cells otherwise, so huge query radii stay bounded by the
    /// number of occupied cells.
    fn cells_in_range(&self, min: Cell, max: Cell) -> impl Iterator<Item = &BTreeSet<AgentId>> {
        let span_x = max.0.saturating_sub(min.0).saturating_add(1);
        let span_y = max.1.saturating_sub(min.1).saturating_add(1);
        let area = u64::try_from(span_x.saturating_mul(span_y)).unwrap_or(u64::MAX);
        let occupied = u64::try_from(self.cells.len()).unwrap_or(u64::MAX);

        let selected: Vec<&BTreeSet<AgentId>> = if area <= occupied {
            (min.0..=max.0)
                .flat_map(|cx| (min.1..=max.1).map(move |cy| (cx, cy)))
                .filter_map(|cell| self.cells.get(&cell))
                .collect()
        } else {
            self.cells
                .range((min.0, i64::MIN)..=(max.0, i64::MAX))
                .filter(|((_, cy), _)| *cy >= min.1 && *cy <= max.1)
                .map(|(_, agents)| agents)
                .collect()
        };
        selected.into_iter()
    }
}
