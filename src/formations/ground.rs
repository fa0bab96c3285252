//! Ground grid formation

use crate::formations::PointCloud;
use crate::types::{Position, Result, SwarmError};

/// Centered square grid at ground level
pub fn generate(count: usize, center_x: f32, center_y: f32, spacing: f32) -> Result<PointCloud> {
    if count == 0 {
        return Err(SwarmError::GeometryError);
    }
    let side = libm::ceilf(libm::sqrtf(count as f32)) as usize;
    let half = (side as f32 - 1.0) / 2.0;

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let row = i / side;
        let col = i % side;
        points.push(Position::new(
            center_x + (col as f32 - half) * spacing,
            center_y + (row as f32 - half) * spacing,
            0.0,
        ));
    }
    Ok(PointCloud::new(points))
}

/// Parked grid anchored at an origin corner, row-major
///
/// This is the launch layout the swarm starts from and returns to; it also
/// serves as the last-known-good fill for the padding policy.
pub fn parked_grid(count: usize, origin_x: f32, origin_y: f32, spacing: f32) -> PointCloud {
    let rows = libm::ceilf(libm::sqrtf(count as f32)).max(1.0) as usize;
    let cols = count.div_ceil(rows);

    let mut points = Vec::with_capacity(count);
    for i in 0..rows {
        for j in 0..cols {
            if points.len() < count {
                points.push(Position::new(
                    origin_x + i as f32 * spacing,
                    origin_y + j as f32 * spacing,
                    0.0,
                ));
            }
        }
    }
    PointCloud::new(points)
}
