//! Hittable trait and HitRecord for ray-object intersection.

use crate::{Material, Primitive};
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Geometric result of a single shape test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Ray parameter of the hit
    pub t: f32,
    /// Unit surface normal, pointing out of closed shapes
    pub normal: Vec3,
}

/// Trait for shapes that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Closest hit whose parameter lies strictly inside `ray_t`.
    ///
    /// Degenerate configurations (parallel rays, zero discriminants that
    /// fall outside the range, zero-area projections) are misses.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit>;

    /// Get the axis-aligned bounding box of this shape.
    fn bounding_box(&self) -> Aabb;
}

/// Record of a ray-scene intersection.
///
/// `Default` is the "no hit" sentinel: no object and `t = +inf`, so it also
/// works as the running minimum during traversal.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord<'a> {
    /// Primitive that was hit, `None` for a miss
    pub object: Option<&'a Primitive>,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub point: Vec3,
    /// Unit surface normal at the intersection
    pub normal: Vec3,
}

impl<'a> Default for HitRecord<'a> {
    fn default() -> Self {
        Self {
            object: None,
            t: f32::INFINITY,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
        }
    }
}

impl<'a> HitRecord<'a> {
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.object.is_some()
    }

    /// Material of the hit primitive.
    pub fn material(&self) -> Option<&'a Material> {
        self.object.map(|p| p.material())
    }

    /// True if the hit primitive emits light.
    pub fn is_light(&self) -> bool {
        self.object.is_some_and(|p| p.is_light())
    }
}
