//! Range sensor: reports obstacle cells within a Euclidean radius of the agent.

use crate::grid::{Grid, Position};
use serde::{Deserialize, Serialize};

/// One detected obstacle cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub position: Position,
    /// Euclidean distance between cell centres
    pub distance: f64,
}

/// Obstacles seen from one agent position, in row-major order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    pub origin: Position,
    pub range: i32,
    pub detections: Vec<Detection>,
}

impl SensorReading {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.detections.iter().any(|d| d.position == pos)
    }

    /// Closest detected obstacle, if any
    pub fn nearest(&self) -> Option<&Detection> {
        self.detections
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Scan the bounding box around `origin`, clipped to the grid, for obstacle
/// cells at distance <= `range`. Compares squared integer distances, so a cell
/// exactly on the boundary is always included.
pub fn detect(grid: &Grid, origin: Position, range: i32) -> SensorReading {
    let range = range.max(0);
    let range_squared = range as i64 * range as i64;
    let mut detections = Vec::new();

    let min_y = origin.y.saturating_sub(range).max(0);
    let max_y = origin.y.saturating_add(range).min(grid.height() - 1);
    let min_x = origin.x.saturating_sub(range).max(0);
    let max_x = origin.x.saturating_add(range).min(grid.width() - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let pos = Position::new(x, y);
            if origin.distance_squared(&pos) <= range_squared && grid.is_obstacle(pos) {
                detections.push(Detection {
                    position: pos,
                    distance: origin.distance(&pos),
                });
            }
        }
    }

    SensorReading {
        origin,
        range,
        detections,
    }
}
