//! Cube lattice formation

use crate::formations::PointCloud;
use crate::types::{Position, Result, SwarmError};

/// Altitude of the bottom cube layer (meters)
const BASE_ALTITUDE: f32 = 3.0;

/// Layer-major cube lattice with side ceil(cbrt(n))
pub fn generate(count: usize, center_x: f32, center_y: f32, spacing: f32) -> Result<PointCloud> {
    if count == 0 {
        return Err(SwarmError::GeometryError);
    }
    let side = libm::ceilf(libm::cbrtf(count as f32)) as usize;
    let layer_size = side * side;
    let half = (side as f32 - 1.0) / 2.0;

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let layer = i / layer_size;
        let remainder = i % layer_size;
        let row = remainder / side;
        let col = remainder % side;

        points.push(Position::new(
            center_x + (col as f32 - half) * spacing,
            center_y + (row as f32 - half) * spacing,
            BASE_ALTITUDE + layer as f32 * spacing,
        ));
    }
    Ok(PointCloud::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_cube_dimensions() {
        let cloud = generate(27, 20.0, 20.0, 2.0).unwrap();
        assert_eq!(cloud.len(), 27);

        // Three distinct layers, each of nine points
        let mut layers: Vec<f32> = cloud.points().iter().map(|p| p.z).collect();
        layers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        layers.dedup();
        assert_eq!(layers, vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_partial_cube() {
        let cloud = generate(8, 20.0, 20.0, 2.0).unwrap();
        assert_eq!(cloud.len(), 8);
        // side = 2, so the first layer holds four points at z = 3
        assert!(cloud.points()[..4].iter().all(|p| p.z == 3.0));
        assert!(cloud.points()[4..].iter().all(|p| p.z == 5.0));
    }

    #[test]
    fn test_horizontally_centered() {
        let cloud = generate(27, 20.0, 20.0, 2.0).unwrap();
        let cx: f32 = cloud.points().iter().map(|p| p.x).sum::<f32>() / 27.0;
        assert!((cx - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_count_rejected() {
        assert_eq!(generate(0, 0.0, 0.0, 2.0), Err(SwarmError::GeometryError));
    }
}
