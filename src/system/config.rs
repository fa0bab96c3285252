//! Configuration management for the formation control engine

use crate::types::{Result, SwarmError};

/// Static configuration for a formation run
///
/// Validated once before the first tick; invalid values are a fatal
/// `ConfigError`, never a runtime condition.
#[derive(Debug, Clone)]
pub struct FormationConfig {
    /// Number of agents in the swarm (fixed for the run)
    pub num_agents: usize,
    /// Side length of the cubic world volume (meters)
    pub world_size: f32,
    /// Point spacing used by the geometry generators (meters)
    pub formation_spacing: f32,
    /// Spacing of the parked ground grid (meters)
    pub ground_spacing: f32,
    /// Minimum allowed separation between agents (meters)
    pub min_distance: f32,
    /// Repulsion gain for collision avoidance (0.0-1.0)
    pub avoid_gain: f32,
    /// Look-ahead horizon for relative-motion prediction (seconds)
    pub prediction_horizon: f32,
    /// Maximum speed magnitude (m/s)
    pub max_speed: f32,
    /// Maximum velocity change rate (m/s^2)
    pub max_acceleration: f32,
    /// Speed floor while approaching a target (m/s)
    pub min_speed: f32,
    /// Distance at which the deceleration profile begins (meters)
    pub deceleration_distance: f32,
    /// Distance from target at which an agent counts as arrived (meters)
    pub convergence_threshold: f32,
    /// Exponential velocity smoothing factor, 0.0 disables (0.0-1.0)
    pub velocity_smoothing: f32,
    /// Width of the boundary repulsion band at world edges (meters)
    pub boundary_margin: f32,
    /// Gain of the boundary repulsion term (0.0-1.0)
    pub boundary_gain: f32,
    /// Spatial grid cell size (meters)
    pub cell_size: f32,
    /// Neighbor query radius in grid cells
    pub neighbor_radius_cells: i32,
    /// Side length of a partition region column (meters)
    pub region_size: f32,
    /// Maximum agents a single region may hold
    pub max_agents_per_region: usize,
    /// Simulated-time interval between network synchronizations (seconds)
    pub sync_interval: f64,
    /// Seed for the simulation noise stream
    pub rng_seed: u64,
}

impl FormationConfig {
    /// Create a configuration with production defaults
    pub fn new(num_agents: usize) -> Self {
        Self {
            num_agents,
            world_size: 40.0,
            formation_spacing: 2.0,
            ground_spacing: 1.8,
            min_distance: 1.5,
            avoid_gain: 0.5,
            prediction_horizon: 0.5,
            max_speed: 5.0,
            max_acceleration: 10.0,
            min_speed: 0.05,
            deceleration_distance: 2.0,
            convergence_threshold: 0.15,
            velocity_smoothing: 0.0,
            boundary_margin: 2.0,
            boundary_gain: 1.0,
            cell_size: 5.0,
            neighbor_radius_cells: 1,
            region_size: 10.0,
            max_agents_per_region: 100,
            sync_interval: 0.1,
            rng_seed: 0x5eed_f0e4_a7b3_91c2,
        }
    }

    /// Create a small deterministic configuration for testing
    pub fn test_config(num_agents: usize) -> Self {
        Self {
            max_agents_per_region: 50,
            rng_seed: 42,
            ..Self::new(num_agents)
        }
    }

    /// Validate configuration before any tick runs
    pub fn validate(&self) -> Result<()> {
        if self.num_agents == 0 {
            return Err(SwarmError::ConfigError);
        }
        if !self.world_size.is_finite() || self.world_size <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        if self.formation_spacing <= 0.0 || self.ground_spacing <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        if self.min_distance <= 0.0 || self.convergence_threshold <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        if self.max_speed <= 0.0 || self.max_acceleration <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        if self.min_speed <= 0.0 || self.min_speed > self.max_speed {
            return Err(SwarmError::ConfigError);
        }
        if self.deceleration_distance <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        if !(0.0..1.0).contains(&self.velocity_smoothing) {
            return Err(SwarmError::ConfigError);
        }
        if self.boundary_margin < 0.0 || self.cell_size <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        // The neighbor scan must cover the full avoidance radius, otherwise
        // close agents in adjacent cells would be invisible to avoidance.
        let required = libm::ceilf(self.min_distance / self.cell_size) as i32;
        if self.neighbor_radius_cells < required {
            return Err(SwarmError::ConfigError);
        }
        if self.region_size <= 0.0 || self.max_agents_per_region == 0 {
            return Err(SwarmError::ConfigError);
        }
        if self.sync_interval <= 0.0 {
            return Err(SwarmError::ConfigError);
        }
        Ok(())
    }

    /// Center of the world volume in the horizontal plane
    pub fn center(&self) -> (f32, f32) {
        (self.world_size / 2.0, self.world_size / 2.0)
    }
}
