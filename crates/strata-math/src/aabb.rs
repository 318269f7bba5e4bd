use glam::Vec3;

/// Axis-aligned bounding box in world space, stored as center + half-extents.
///
/// Invariant: every component of `half_extents` is non-negative. The
/// constructor enforces this by taking the absolute value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    /// Create an AABB from a center point and half-extents.
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Minimum corner of the box.
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    /// Maximum corner of the box.
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y && p.z >= min.z && p.z <= max.z
    }

    /// Squared distance from `p` to the closest point of the box.
    ///
    /// Returns 0 when the point is inside or on the boundary.
    pub fn sq_distance(&self, p: Vec3) -> f32 {
        let closest = p.clamp(self.min(), self.max());
        p.distance_squared(closest)
    }

    /// Size of the box along each axis.
    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }
}
