//! Reference stations for time synchronization and TDOA

use serde::{Deserialize, Serialize};

use crate::rng::SimRng;
use crate::types::Position;

/// Mean aerial clock drift rate (seconds of offset per second)
const DRIFT_MEAN: f64 = 1e-6;

/// Standard deviation of the aerial drift rate
const DRIFT_STD: f64 = 1e-7;

/// Station role in the positioning network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    /// Fixed time reference; its offset is zero by definition
    Ground,
    /// Flying station with a drifting clock, identified within the fleet
    Aerial(u32),
}

/// A positioning reference station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceStation {
    kind: StationKind,
    position: Position,
    target: Position,
    time_offset: f64,
    clock_drift: f64,
}

impl ReferenceStation {
    /// Create the ground reference station
    pub fn ground(position: Position) -> Self {
        Self {
            kind: StationKind::Ground,
            position,
            target: position,
            time_offset: 0.0,
            clock_drift: 0.0,
        }
    }

    /// Create an aerial station; its drift rate is drawn once here
    pub fn aerial(id: u32, position: Position, rng: &mut SimRng) -> Self {
        Self {
            kind: StationKind::Aerial(id),
            position,
            target: position,
            time_offset: 0.0,
            clock_drift: rng.next_normal(DRIFT_MEAN, DRIFT_STD),
        }
    }

    /// Station role
    pub fn kind(&self) -> StationKind {
        self.kind
    }

    /// Current position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Current clock offset relative to the reference (seconds)
    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    /// Set the clock offset; the ground reference stays pinned to zero
    pub fn set_time_offset(&mut self, offset: f64) {
        match self.kind {
            StationKind::Ground => {}
            StationKind::Aerial(_) => self.time_offset = offset,
        }
    }

    /// Accumulate clock drift over elapsed simulated time
    pub fn accrue_drift(&mut self, elapsed: f64) {
        match self.kind {
            StationKind::Ground => {}
            StationKind::Aerial(_) => self.time_offset += self.clock_drift * elapsed,
        }
    }

    /// Movement target used during takeoff and landing phases
    pub fn target(&self) -> Position {
        self.target
    }

    /// Set the movement target
    pub fn set_target(&mut self, target: Position) {
        self.target = target;
    }

    /// Distance to the movement target
    pub fn distance_to_target(&self) -> f32 {
        self.position.distance_to(&self.target)
    }

    /// Step the station proportionally toward its target
    pub fn step_toward_target(&mut self, gain: f32) {
        if self.distance_to_target() <= 0.1 {
            return;
        }
        let g = gain.clamp(0.0, 1.0);
        self.position.x += (self.target.x - self.position.x) * g;
        self.position.y += (self.target.y - self.position.y) * g;
        self.position.z += (self.target.z - self.position.z) * g;
    }
}
