//! Sphere primitive.

use crate::hittable::{Hittable, SurfaceHit};
use crate::sampling::uniform_sphere;
use rand::RngCore;
use std::f32::consts::PI;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Uniform point on the surface, returned with its outward normal.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> (Vec3, Vec3) {
        let normal = uniform_sphere(rng);
        (self.center + self.radius * normal, normal)
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        if a == 0.0 || self.radius == 0.0 {
            return None;
        }
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let normal = (ray.at(root) - self.center).normalize();
        Some(SurfaceHit { t: root, normal })
    }

    fn bounding_box(&self) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(self.center - rvec, self.center + rvec)
    }
}
