//! Core type definitions for the formation control engine

use core::fmt;
use serde::{Deserialize, Serialize};

/// Result type for formation engine operations
pub type Result<T> = core::result::Result<T, SwarmError>;

/// Agents below this altitude are considered grounded (meters)
pub const GROUND_EPSILON: f32 = 0.1;

/// Distances below this are treated as numerically degenerate (meters)
pub const DEGENERATE_DISTANCE: f32 = 1e-4;

/// Fallback separation direction used when two agents overlap exactly
pub const DEGENERATE_FALLBACK: [f32; 3] = [0.01, 0.01, 0.01];

/// Unique identifier for each agent in the swarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Create a new AgentId from a u32
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner u32 value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent-{:04}", self.0)
    }
}

/// 3D position vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (meters)
    pub x: f32,
    /// Y coordinate (meters)
    pub y: f32,
    /// Z coordinate (altitude in meters)
    pub z: f32,
}

impl Position {
    /// Create a new position
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculate Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        libm::sqrtf(dx * dx + dy * dy + dz * dz)
    }

    /// Component-wise offset from another position
    pub fn delta_from(&self, other: &Position) -> [f32; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }

    /// Advance this position by a velocity over a time step
    pub fn integrate(&self, velocity: &Velocity, dt: f32) -> Position {
        Position {
            x: self.x + velocity.vx * dt,
            y: self.y + velocity.vy * dt,
            z: self.z + velocity.vz * dt,
        }
    }
}

/// Velocity vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// X velocity (m/s)
    pub vx: f32,
    /// Y velocity (m/s)
    pub vy: f32,
    /// Z velocity (m/s)
    pub vz: f32,
}

impl Velocity {
    /// Zero velocity
    pub const ZERO: Velocity = Velocity {
        vx: 0.0,
        vy: 0.0,
        vz: 0.0,
    };

    /// Create a new velocity
    pub const fn new(vx: f32, vy: f32, vz: f32) -> Self {
        Self { vx, vy, vz }
    }

    /// Velocity magnitude (speed)
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.vx * self.vx + self.vy * self.vy + self.vz * self.vz)
    }

    /// Sum of two velocities
    pub fn add(&self, other: &Velocity) -> Velocity {
        Velocity {
            vx: self.vx + other.vx,
            vy: self.vy + other.vy,
            vz: self.vz + other.vz,
        }
    }

    /// Velocity scaled by a factor
    pub fn scaled(&self, factor: f32) -> Velocity {
        Velocity {
            vx: self.vx * factor,
            vy: self.vy * factor,
            vz: self.vz * factor,
        }
    }

    /// Clamp magnitude to a maximum speed, preserving direction
    pub fn clamped(&self, max_speed: f32) -> Velocity {
        let speed = self.magnitude();
        if speed > max_speed && speed > 0.0 {
            self.scaled(max_speed / speed)
        } else {
            *self
        }
    }
}

/// Immutable per-tick view of an agent, shared across regions
#[derive(Debug, Clone, Copy)]
pub struct AgentSnapshot {
    /// Agent identifier
    pub id: AgentId,
    /// Position at the start of the tick
    pub position: Position,
    /// Velocity at the start of the tick
    pub velocity: Velocity,
}

/// Error types for the formation control engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwarmError {
    /// Static configuration is invalid (counts, world geometry, limits)
    ConfigError,
    /// A per-call argument is invalid (non-finite dt, unknown cloud name)
    InvalidParameter,
    /// A formation geometry generator failed for the requested parameters
    GeometryError,
    /// Point-cloud file could not be read or written
    IoError,
    /// Point-cloud file contents could not be parsed or encoded
    SerializationError,
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmError::ConfigError => write!(f, "Configuration error"),
            SwarmError::InvalidParameter => write!(f, "Invalid parameter"),
            SwarmError::GeometryError => write!(f, "Formation geometry generation failed"),
            SwarmError::IoError => write!(f, "Point-cloud file I/O failed"),
            SwarmError::SerializationError => write!(f, "Point-cloud serialization failed"),
        }
    }
}

impl std::error::Error for SwarmError {}
