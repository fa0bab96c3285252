//! Formation geometry generators
//!
//! Pure functions mapping (swarm size, center, spacing) to an ordered
//! target point cloud. Every generator returns an explicit `Result`; a
//! failing generator is recovered by the engine's ground-formation
//! fallback, never by a caught panic.

pub mod cube;
pub mod ground;
pub mod helix;
pub mod point_cloud;
pub mod pyramid;
pub mod sphere;

pub use point_cloud::{load_point_cloud, save_point_clouds, PointCloud};

use crate::control::FormationPhase;
use crate::types::Result;

/// Generate the target cloud for an aerial formation phase
///
/// Phases whose targets are the parked ground grid (`uses_ground_cloud`)
/// are resolved by the engine and never reach this dispatch.
pub fn generate(
    phase: FormationPhase,
    count: usize,
    center_x: f32,
    center_y: f32,
    spacing: f32,
) -> Result<PointCloud> {
    match phase {
        FormationPhase::Cube => cube::generate(count, center_x, center_y, spacing),
        FormationPhase::Sphere => sphere::generate(count, center_x, center_y, spacing),
        FormationPhase::Pyramid => pyramid::generate(count, center_x, center_y),
        FormationPhase::Helix => helix::generate(count, center_x, center_y, spacing),
        _ => ground::generate(count, center_x, center_y, spacing),
    }
}
