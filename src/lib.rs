//! # Drone Formation Control System
//!
//! Coordinates a swarm of autonomous drones through a sequence of geometric
//! formations (grid, cube, sphere, pyramid, double helix) with
//! collision-free motion, velocity/acceleration-bounded kinematics, and
//! region-partitioned per-tick coordination.
//!
//! ## Architecture
//! - Uniform spatial grid for near-O(1) neighbor queries, rebuilt per tick
//! - Repulsive-velocity collision avoidance with boundary repulsion
//! - Exact minimum-cost target assignment (Hungarian algorithm),
//!   solved per region to bound the O(n^3) cost
//! - Region partitioning with a fan-out/fan-in worker-pool barrier
//! - Simulated two-way-ranging time synchronization feeding TDOA
//!   positioning against a fixed ground reference
//! - A formation phase state machine gated on swarm-wide convergence
//!
//! ## Example
//! ```no_run
//! use drone_formation_system::{FormationConfig, FormationEngine, FormationPhase};
//!
//! let config = FormationConfig::new(125);
//! let mut engine = FormationEngine::new(config)?;
//! engine.request_phase(FormationPhase::Cube);
//! while !engine.is_formation_complete() {
//!     engine.tick(0.05)?;
//! }
//! # Ok::<(), drone_formation_system::SwarmError>(())
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::needless_range_loop)]

/// Per-agent kinematics, collision avoidance, target assignment, and the
/// formation phase state machine
pub mod control;
/// The per-tick coordination loop and public engine interface
pub mod engine;
/// Formation geometry generators and the point-cloud file boundary
pub mod formations;
/// Reference stations, time synchronization, and TDOA positioning
pub mod positioning;
/// Deterministic simulation randomness
pub mod rng;
/// Spatial indexing and region partitioning
pub mod spatial;
/// System configuration
pub mod system;
/// Core types (AgentId, Position, Velocity, SwarmError)
pub mod types;

// Re-export the main entry points for convenience
pub use control::{Agent, FormationPhase, FormationStateMachine, TargetAssigner};
pub use engine::{FormationEngine, SwarmState, TickStats};
pub use formations::{load_point_cloud, save_point_clouds, PointCloud};
pub use system::FormationConfig;
pub use types::{AgentId, Position, Result, SwarmError, Velocity};
