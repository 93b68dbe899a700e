//! Integer axis-aligned boxes.

use serde::{Deserialize, Serialize};

/// Axis-aligned box with half-open extents `[min, max)` on every axis.
///
/// Coordinates are `i64` so that `position + size` never overflows for any
/// `i32` position and `u32` edge length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: [i64; 3],
    /// Maximum corner (x, y, z), exclusive
    pub max: [i64; 3],
}

impl Aabb {
    /// Creates a new box from its corners.
    pub fn new(min: [i64; 3], max: [i64; 3]) -> Self {
        Self { min, max }
    }

    /// Creates a box from a corner position and edge lengths.
    pub fn from_position_and_size(position: [i32; 3], size: [u32; 3]) -> Self {
        let min = position.map(i64::from);
        Self {
            min,
            max: [
                min[0] + i64::from(size[0]),
                min[1] + i64::from(size[1]),
                min[2] + i64::from(size[2]),
            ],
        }
    }

    /// Checks if the two boxes share interior volume.
    ///
    /// Boxes that only touch on a face, edge or corner do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min[0] < other.max[0]
            && self.max[0] > other.min[0]
            && self.min[1] < other.max[1]
            && self.max[1] > other.min[1]
            && self.min[2] < other.max[2]
            && self.max[2] > other.min[2]
    }

    /// Checks if this box lies entirely within `other`.
    pub fn is_within(&self, other: &Aabb) -> bool {
        self.min[0] >= other.min[0]
            && self.min[1] >= other.min[1]
            && self.min[2] >= other.min[2]
            && self.max[0] <= other.max[0]
            && self.max[1] <= other.max[1]
            && self.max[2] <= other.max[2]
    }
}
