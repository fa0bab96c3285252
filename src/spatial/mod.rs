//! Spatial indexing and region partitioning
//!
//! Both structures are rebuilt from scratch every tick from the agent
//! snapshot; they hold index sets, never owning references to agents.

pub mod grid;
pub mod region;

pub use grid::SpatialGrid;
pub use region::{Partition, Region, RegionPartitioner};
