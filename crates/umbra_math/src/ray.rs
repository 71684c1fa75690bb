use crate::Vec3;

/// A ray in 3D space.
///
/// The direction is stored as given; it is not normalized at construction,
/// so `t` is measured in units of `direction`'s length.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The same ray with its origin shifted by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Ray {
        Ray::new(self.origin + offset, self.direction)
    }
}
