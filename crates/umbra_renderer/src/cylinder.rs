//! Finite capped cylinder.
//!
//! Intersection happens in a local frame where the axis runs along +z from
//! the base: the caps become the slab `0 <= z <= length` and the side the
//! circle `x² + y² = r²`.

use crate::hittable::{Hittable, SurfaceHit};
use umbra_math::{Aabb, Interval, Mat3, Ray, Slab, Vec3};

/// A closed cylinder from `base` to `base + axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    base: Vec3,
    axis: Vec3,
    radius: f32,
    length: f32,
    /// Local-to-world rotation; its columns are two perpendiculars and the
    /// unit axis
    frame: Mat3,
}

impl Cylinder {
    pub fn new(base: Vec3, axis: Vec3, radius: f32) -> Self {
        let length = axis.length();
        let a = axis.normalize_or_zero();
        let a = if a == Vec3::ZERO { Vec3::Z } else { a };
        let helper = if a.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let b = helper.cross(a).normalize();
        let c = a.cross(b);

        Self {
            base,
            axis,
            radius: radius.max(0.0),
            length,
            frame: Mat3::from_cols(b, c, a),
        }
    }

    pub fn base(&self) -> Vec3 {
        self.base
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Hittable for Cylinder {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        if self.length == 0.0 || self.radius == 0.0 {
            return None;
        }

        let to_local = self.frame.transpose();
        let local = Ray::new(
            to_local * (ray.origin - self.base),
            to_local * ray.direction,
        );
        let (q, d) = (local.origin, local.direction);

        let caps = Slab::axis(2, 0.0, self.length).intersect(&local);

        // Side: roots of |q.xy + t d.xy|² = r²
        let a = d.x * d.x + d.y * d.y;
        let c = q.x * q.x + q.y * q.y - self.radius * self.radius;
        let side = if a == 0.0 {
            if c < 0.0 {
                Interval::UNIVERSE
            } else {
                return None;
            }
        } else {
            let h = d.x * q.x + d.y * q.y;
            let discriminant = h * h - a * c;
            if discriminant < 0.0 {
                return None;
            }
            let sqrtd = discriminant.sqrt();
            Interval::new((-h - sqrtd) / a, (-h + sqrtd) / a)
        };

        let span = caps.intersect(&side);
        if span.is_empty() || span.max <= ray_t.min {
            return None;
        }

        let entering = span.min > ray_t.min;
        let t = if entering { span.min } else { span.max };
        if !ray_t.surrounds(t) {
            return None;
        }

        // The boundary that produced t decides between cap and side.
        let on_cap = if entering {
            caps.min >= side.min
        } else {
            caps.max <= side.max
        };
        let local_normal = if on_cap {
            let facing = if entering { -d.z.signum() } else { d.z.signum() };
            Vec3::new(0.0, 0.0, facing)
        } else {
            let p = local.at(t);
            Vec3::new(p.x, p.y, 0.0)
        };

        let normal = (self.frame * local_normal).normalize_or_zero();
        if normal == Vec3::ZERO {
            return None;
        }
        Some(SurfaceHit { t, normal })
    }

    fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        let top = self.base + self.axis;
        Aabb::enclosing(&[self.base - r, self.base + r, top - r, top + r])
    }
}
