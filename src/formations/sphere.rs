//! Sphere formation via the golden spiral

use core::f32::consts::PI;

use crate::formations::PointCloud;
use crate::types::{Position, Result, SwarmError};

/// Altitude of the sphere center (meters)
const CENTER_ALTITUDE: f32 = 8.0;

/// Sphere radius as a multiple of the point spacing
const RADIUS_FACTOR: f32 = 4.5;

/// Golden-spiral point distribution over a sphere surface
///
/// Needs at least two points; the spiral parametrization divides by n - 1.
pub fn generate(count: usize, center_x: f32, center_y: f32, spacing: f32) -> Result<PointCloud> {
    if count < 2 {
        return Err(SwarmError::GeometryError);
    }
    let radius = spacing * RADIUS_FACTOR;
    let golden_angle = PI * (3.0 - libm::sqrtf(5.0));

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        // y runs from 1 to -1 along the spiral
        let y = 1.0 - (i as f32 / (count as f32 - 1.0)) * 2.0;
        let ring_radius = libm::sqrtf((1.0 - y * y).max(0.0));
        let theta = golden_angle * i as f32;

        points.push(Position::new(
            center_x + libm::cosf(theta) * ring_radius * radius,
            center_y + y * radius,
            CENTER_ALTITUDE + libm::sinf(theta) * ring_radius * radius,
        ));
    }
    Ok(PointCloud::new(points))
}
