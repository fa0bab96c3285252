//! Layered pyramid formation

use crate::formations::PointCloud;
use crate::types::{Position, Result, SwarmError};

/// Vertical distance between pyramid layers (meters)
const LAYER_HEIGHT: f32 = 2.0;

/// Edge length of the bottom layer (meters)
const BASE_SIZE: f32 = 12.0;

/// Number of layers before extras are appended
const BASE_LAYERS: usize = 5;

/// Hollow square pyramid, apex on top, truncated to the requested count
pub fn generate(count: usize, center_x: f32, center_y: f32) -> Result<PointCloud> {
    if count == 0 {
        return Err(SwarmError::GeometryError);
    }

    let mut points = Vec::new();
    let mut total_layers = BASE_LAYERS;
    for layer in 0..total_layers {
        layer_points(layer, total_layers, center_x, center_y, &mut points);
    }

    // Grow extra base rings until the pyramid can seat everyone
    while points.len() < count {
        layer_points(total_layers, total_layers + 1, center_x, center_y, &mut points);
        total_layers += 1;
    }

    points.truncate(count);
    Ok(PointCloud::new(points))
}

/// Points of one hollow square layer; layer 0 is the apex
fn layer_points(
    layer: usize,
    total_layers: usize,
    center_x: f32,
    center_y: f32,
    points: &mut Vec<Position>,
) {
    let z = layer as f32 * LAYER_HEIGHT;
    if layer == 0 {
        points.push(Position::new(center_x, center_y, z));
        return;
    }

    let layer_ratio = (total_layers - layer) as f32 / total_layers as f32;
    let size = BASE_SIZE * layer_ratio;
    let half = size / 2.0;
    let per_side = ((4.0 * layer_ratio) as usize).max(2);

    // Front and back edges own the corners; the side edges contribute
    // interior points only, so no two agents share a target.
    for i in 0..per_side {
        let ratio = i as f32 / (per_side - 1) as f32;
        let along = -half + size * ratio;
        points.push(Position::new(center_x + along, center_y - half, z));
        points.push(Position::new(center_x + along, center_y + half, z));
        if i > 0 && i < per_side - 1 {
            points.push(Position::new(center_x - half, center_y + along, z));
            points.push(Position::new(center_x + half, center_y + along, z));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apex_first() {
        let cloud = generate(30, 20.0, 20.0).unwrap();
        assert_eq!(cloud.point(0), Position::new(20.0, 20.0, 0.0));
    }

    #[test]
    fn test_exact_count() {
        for n in [1, 5, 30, 125] {
            let cloud = generate(n, 20.0, 20.0).unwrap();
            assert_eq!(cloud.len(), n);
        }
    }

    #[test]
    fn test_layers_shrink_with_height() {
        let cloud = generate(40, 20.0, 20.0).unwrap();
        let spread_at = |z: f32| -> f32 {
            cloud
                .points()
                .iter()
                .filter(|p| (p.z - z).abs() < 1e-4)
                .map(|p| (p.x - 20.0).abs().max((p.y - 20.0).abs()))
                .fold(0.0, f32::max)
        };
        // Layer 1 is the widest ring; rings above it taper off
        assert!(spread_at(2.0) > spread_at(2.0 * 4.0));
    }

    #[test]
    fn test_large_count_appends_layers() {
        let cloud = generate(200, 20.0, 20.0).unwrap();
        assert_eq!(cloud.len(), 200);
        let max_z = cloud.points().iter().map(|p| p.z).fold(0.0, f32::max);
        assert!(max_z >= BASE_LAYERS as f32 * LAYER_HEIGHT);
    }

    #[test]
    fn test_no_two_agents_share_a_target() {
        let cloud = generate(125, 20.0, 20.0).unwrap();
        for i in 0..cloud.len() {
            for j in (i + 1)..cloud.len() {
                assert!(
                    cloud.point(i).distance_to(&cloud.point(j)) > 1e-4,
                    "duplicate pyramid points at {i} and {j}"
                );
            }
        }
    }

    #[test]
    fn test_zero_count_rejected() {
        assert_eq!(generate(0, 0.0, 0.0), Err(SwarmError::GeometryError));
    }
}
