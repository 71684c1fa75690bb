//! Triangle primitive using the Möller-Trumbore intersection test.

use crate::hittable::{Hittable, SurfaceHit};
use crate::sampling::gen_f32;
use rand::RngCore;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// A triangle with per-vertex normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    n0: Vec3,
    n1: Vec3,
    n2: Vec3,
    /// Precomputed edge vectors
    edge1: Vec3,
    edge2: Vec3,
}

impl Triangle {
    /// Flat-shaded triangle; every vertex gets the face normal.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let n = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self::with_normals([v0, v1, v2], [n, n, n])
    }

    /// Triangle with explicit vertex normals, interpolated across the face.
    pub fn with_normals(vertices: [Vec3; 3], normals: [Vec3; 3]) -> Self {
        let [v0, v1, v2] = vertices;
        let [n0, n1, n2] = normals;
        Self {
            v0,
            v1,
            v2,
            n0,
            n1,
            n2,
            edge1: v1 - v0,
            edge2: v2 - v0,
        }
    }

    /// Geometric face normal, following the vertex winding.
    pub fn face_normal(&self) -> Vec3 {
        self.edge1.cross(self.edge2).normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        0.5 * self.edge1.cross(self.edge2).length()
    }

    /// Interpolated unit normal at barycentric `(u, v)`.
    fn shading_normal(&self, u: f32, v: f32) -> Vec3 {
        let n = (1.0 - u - v) * self.n0 + u * self.n1 + v * self.n2;
        let n = n.normalize_or_zero();
        if n == Vec3::ZERO {
            self.face_normal()
        } else {
            n
        }
    }

    /// Uniform point on the face, returned with its normal.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> (Vec3, Vec3) {
        let r = gen_f32(rng).sqrt();
        let u = 1.0 - r;
        let v = gen_f32(rng) * r;
        let point = self.v0 + u * self.edge1 + v * self.edge2;
        (point, self.shading_normal(u, v))
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let p = ray.direction.cross(self.edge2);
        let det = p.dot(self.edge1);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = ray.origin - self.v0;
        let u = p.dot(s) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = self.edge2.dot(q) * inv_det;
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(SurfaceHit {
            t,
            normal: self.shading_normal(u, v),
        })
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::enclosing(&[self.v0, self.v1, self.v2])
    }
}
