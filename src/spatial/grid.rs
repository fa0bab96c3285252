//! Uniform 3D grid for near-O(1) neighbor queries

use std::collections::HashMap;

use crate::types::{AgentSnapshot, Position};

/// Uniform spatial hash grid over agent snapshot indices
///
/// Cells have no identity across ticks; `rebuild` discards and re-derives
/// every cell from the current snapshot in O(N).
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<[i32; 3], Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid with the given cell edge length
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Cell key for a position: per-axis floor(coordinate / cell_size)
    fn cell_key(&self, position: &Position) -> [i32; 3] {
        [
            libm::floorf(position.x / self.cell_size) as i32,
            libm::floorf(position.y / self.cell_size) as i32,
            libm::floorf(position.z / self.cell_size) as i32,
        ]
    }

    /// Clear all cells and reinsert every agent from the snapshot
    pub fn rebuild(&mut self, snapshot: &[AgentSnapshot]) {
        self.cells.clear();
        for (index, agent) in snapshot.iter().enumerate() {
            let key = self.cell_key(&agent.position);
            self.cells.entry(key).or_default().push(index);
        }
    }

    /// Snapshot indices of all agents in the (2r+1)^3 cell neighborhood
    /// around `position`, excluding `index` itself
    ///
    /// Runs in time proportional to the local agent density. An index that
    /// was never inserted simply does not appear in any cell; the query is
    /// never an error.
    pub fn query_neighbors(
        &self,
        index: usize,
        position: &Position,
        radius_in_cells: i32,
    ) -> Vec<usize> {
        let center = self.cell_key(position);
        let mut nearby = Vec::new();
        for dx in -radius_in_cells..=radius_in_cells {
            for dy in -radius_in_cells..=radius_in_cells {
                for dz in -radius_in_cells..=radius_in_cells {
                    let key = [center[0] + dx, center[1] + dy, center[2] + dz];
                    if let Some(cell) = self.cells.get(&key) {
                        nearby.extend(cell.iter().copied().filter(|&i| i != index));
                    }
                }
            }
        }
        nearby
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}
