//! Axis-aligned bounding box over the horizontal plane.

use std::fmt;

/// 2D box over the x/z plane.
///
/// The default box is inverted (min at +∞, max at -∞) so that the first
/// [`BoundingBox::include`] establishes real extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_z: f32::INFINITY,
            max_z: f32::NEG_INFINITY,
        }
    }
}

impl BoundingBox {
    #[must_use]
    pub const fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Whether nothing has been included yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_z > self.max_z
    }

    /// Widen the box to enclose `(x, z)`.
    pub fn include(&mut self, x: f32, z: f32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Half-open overlap test.
    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x > other.min_x
            && self.min_z <= other.max_z
            && self.max_z > other.min_z
    }

    /// Half-open containment test on both axes.
    #[must_use]
    pub fn inside(&self, x: f32, z: f32) -> bool {
        (self.min_x..self.max_x).contains(&x) && (self.min_z..self.max_z).contains(&z)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<x:{},{} z:{},{}>",
            self.min_x, self.max_x, self.min_z, self.max_z
        )
    }
}
