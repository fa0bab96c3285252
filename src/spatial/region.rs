//! Region partitioning for distributed per-tick control
//!
//! Splitting the swarm into bounded regions keeps the O(n^3) assignment
//! solve tractable: each region is solved independently on the worker pool.
//! Membership is recomputed from the snapshot every tick.

use crate::types::{AgentId, AgentSnapshot};

/// A bounded spatial partition of the swarm for one tick
#[derive(Debug, Clone)]
pub struct Region {
    /// Region identifier, unique within the tick
    pub id: u32,
    /// Horizontal grid coordinate of the region column
    pub grid_x: i32,
    /// Horizontal grid coordinate of the region column
    pub grid_y: i32,
    /// Snapshot indices of the agents owned by this region
    pub agents: Vec<usize>,
}

impl Region {
    /// Regions in the 8-adjacent columns of the same partition
    ///
    /// Collision queries run against the global snapshot grid, so boundary
    /// agents already see neighbors across region borders; this adjacency
    /// exists for diagnostics and partition checks.
    pub fn neighbor_regions<'a>(&self, all: &'a [Region]) -> Vec<&'a Region> {
        all.iter()
            .filter(|other| {
                other.id != self.id
                    && (other.grid_x - self.grid_x).abs() <= 1
                    && (other.grid_y - self.grid_y).abs() <= 1
            })
            .collect()
    }
}

/// Result of partitioning one tick's snapshot
#[derive(Debug, Clone)]
pub struct Partition {
    /// Disjoint regions covering every in-bounds agent
    pub regions: Vec<Region>,
    /// Agents outside the world bounds, excluded from region processing
    /// this tick and re-included automatically once back in bounds
    pub out_of_bounds: Vec<AgentId>,
}

/// Grid-based region partitioner
#[derive(Debug, Clone)]
pub struct RegionPartitioner {
    region_size: f32,
    world_size: f32,
    max_agents_per_region: usize,
}

impl RegionPartitioner {
    /// Create a partitioner over the given world
    pub fn new(region_size: f32, world_size: f32, max_agents_per_region: usize) -> Self {
        Self {
            region_size,
            world_size,
            max_agents_per_region,
        }
    }

    /// Partition the snapshot into bounded, disjoint regions
    ///
    /// Agents are bucketed by horizontal region column; a column whose
    /// population exceeds the per-region maximum is split into several
    /// regions over the same bounds so every assignment solve stays bounded.
    pub fn partition(&self, snapshot: &[AgentSnapshot]) -> Partition {
        let mut columns: Vec<((i32, i32), Vec<usize>)> = Vec::new();
        let mut out_of_bounds = Vec::new();

        for (index, agent) in snapshot.iter().enumerate() {
            let p = &agent.position;
            let in_bounds = p.x >= 0.0
                && p.x < self.world_size
                && p.y >= 0.0
                && p.y < self.world_size
                && p.z >= -f32::EPSILON
                && p.z < self.world_size;
            if !in_bounds {
                out_of_bounds.push(agent.id);
                continue;
            }

            let key = (
                libm::floorf(p.x / self.region_size) as i32,
                libm::floorf(p.y / self.region_size) as i32,
            );
            match columns.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(index),
                None => columns.push((key, vec![index])),
            }
        }

        let mut regions = Vec::new();
        let mut next_id = 0u32;
        for ((gx, gy), members) in columns {
            for chunk in members.chunks(self.max_agents_per_region) {
                regions.push(Region {
                    id: next_id,
                    grid_x: gx,
                    grid_y: gy,
                    agents: chunk.to_vec(),
                });
                next_id += 1;
            }
        }

        Partition {
            regions,
            out_of_bounds,
        }
    }
}
