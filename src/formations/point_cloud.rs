//! Target point clouds and their file boundary
//!
//! A cloud is an ordered list of points whose length is normalized to the
//! swarm size before use: short clouds are padded from the last-known-good
//! configuration (the parked ground grid), long clouds are truncated, and
//! either adjustment is logged rather than silent.
//!
//! The file boundary is a JSON document holding one or more named ordered
//! lists of `{x, y, z}` records. Loading applies an optional fixed
//! translation; a zero-offset round trip reproduces coordinates exactly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Position, Result, SwarmError};

/// Ordered sequence of formation target points
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    points: Vec<Position>,
}

impl PointCloud {
    /// Create a cloud from an ordered point list
    pub fn new(points: Vec<Position>) -> Self {
        Self { points }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The ordered points
    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// Point at an index
    pub fn point(&self, index: usize) -> Position {
        self.points[index]
    }

    /// Normalize the cloud length to `count`, padding from `fill`
    ///
    /// A mismatched generator output is a signal, not a failure: the engine
    /// pads from the parked ground positions (the last-known-good
    /// configuration) or truncates, and logs the adjustment.
    pub fn normalized_to(mut self, count: usize, fill: &[Position]) -> PointCloud {
        if self.points.len() < count {
            log::warn!(
                "point cloud has {} points, padding to {} from fallback positions",
                self.points.len(),
                count
            );
            while self.points.len() < count {
                let index = self.points.len();
                let fallback = fill
                    .get(index)
                    .or_else(|| fill.last())
                    .copied()
                    .unwrap_or(Position::new(0.0, 0.0, 0.0));
                self.points.push(fallback);
            }
        } else if self.points.len() > count {
            log::warn!(
                "point cloud has {} points, truncating to {}",
                self.points.len(),
                count
            );
            self.points.truncate(count);
        }
        self
    }
}

/// One `{x, y, z}` record in a point-cloud file
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PointRecord {
    x: f32,
    y: f32,
    z: f32,
}

/// On-disk shape: one or more named ordered lists of points
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PointCloudFile {
    clouds: BTreeMap<String, Vec<PointRecord>>,
}

/// Load a named cloud from a file, applying a fixed translation on ingest
pub fn load_point_cloud(
    path: impl AsRef<Path>,
    name: &str,
    offset: (f32, f32, f32),
) -> Result<PointCloud> {
    let raw = fs::read_to_string(path).map_err(|_| SwarmError::IoError)?;
    let file: PointCloudFile =
        serde_json::from_str(&raw).map_err(|_| SwarmError::SerializationError)?;
    let records = file.clouds.get(name).ok_or(SwarmError::InvalidParameter)?;

    let points = records
        .iter()
        .map(|record| {
            Position::new(
                record.x + offset.0,
                record.y + offset.1,
                record.z + offset.2,
            )
        })
        .collect();
    Ok(PointCloud::new(points))
}

/// Write named clouds to a file in the same shape `load_point_cloud` reads
pub fn save_point_clouds(
    path: impl AsRef<Path>,
    clouds: &[(&str, &PointCloud)],
) -> Result<()> {
    let mut file = PointCloudFile {
        clouds: BTreeMap::new(),
    };
    for (name, cloud) in clouds {
        let records = cloud
            .points()
            .iter()
            .map(|p| PointRecord {
                x: p.x,
                y: p.y,
                z: p.z,
            })
            .collect();
        file.clouds.insert((*name).to_owned(), records);
    }

    let encoded =
        serde_json::to_string_pretty(&file).map_err(|_| SwarmError::SerializationError)?;
    fs::write(path, encoded).map_err(|_| SwarmError::IoError)?;
    Ok(())
}
