//! Double-helix formation

use core::f32::consts::PI;

use crate::formations::PointCloud;
use crate::types::{Position, Result, SwarmError};

/// Altitude of the helix base (meters)
const BASE_ALTITUDE: f32 = 3.0;

/// Total helix height (meters)
const HEIGHT: f32 = 20.0;

/// Number of full turns over the height
const TURNS: f32 = 4.0;

/// Helix radius as a multiple of the point spacing
const RADIUS_FACTOR: f32 = 2.0;

/// Two intertwined strands: odd-indexed points are phase-shifted by pi
pub fn generate(count: usize, center_x: f32, center_y: f32, spacing: f32) -> Result<PointCloud> {
    if count == 0 {
        return Err(SwarmError::GeometryError);
    }
    let radius = spacing * RADIUS_FACTOR;

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let t = i as f32 / count as f32;
        let mut angle = 2.0 * PI * TURNS * t;
        if i % 2 == 1 {
            angle += PI;
        }
        points.push(Position::new(
            center_x + radius * libm::cosf(angle),
            center_y + radius * libm::sinf(angle),
            BASE_ALTITUDE + HEIGHT * t,
        ));
    }
    Ok(PointCloud::new(points))
}
