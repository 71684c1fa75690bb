//! Axis-aligned box primitive, the intersection of three axis slabs.

use crate::hittable::{Hittable, SurfaceHit};
use umbra_math::{Aabb, Interval, Ray, Slab, Vec3};

/// An axis-aligned box given by a corner and a diagonal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    min: Vec3,
    max: Vec3,
}

impl Cuboid {
    /// Box spanning `corner` to `corner + diagonal`. The diagonal may have
    /// negative components.
    pub fn new(corner: Vec3, diagonal: Vec3) -> Self {
        let other = corner + diagonal;
        Self {
            min: corner.min(other),
            max: corner.max(other),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }
}

fn axis_normal(axis: usize) -> Vec3 {
    match axis {
        0 => Vec3::X,
        1 => Vec3::Y,
        _ => Vec3::Z,
    }
}

impl Hittable for Cuboid {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        // Clip [0, inf) by each slab, remembering which axis set each bound.
        let mut span = Interval::FORWARD;
        let mut entry_axis = None;
        let mut exit_axis = None;

        for axis in 0..3 {
            let slab = Slab::axis(axis, self.min[axis], self.max[axis]);
            let range = slab.intersect(ray);
            if range.min > span.min {
                span.min = range.min;
                entry_axis = Some(axis);
            }
            if range.max < span.max {
                span.max = range.max;
                exit_axis = Some(axis);
            }
        }

        if span.is_empty() || span.max <= ray_t.min || !span.max.is_finite() {
            return None;
        }

        let (t, axis, entering) = if span.min > ray_t.min {
            (span.min, entry_axis?, true)
        } else {
            (span.max, exit_axis?, false)
        };
        if !ray_t.surrounds(t) {
            return None;
        }

        // Entering through a face means moving against its outward normal.
        let sign = ray.direction[axis].signum();
        let facing = if entering { -sign } else { sign };
        let normal = facing * axis_normal(axis);
        Some(SurfaceHit { t, normal })
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{gen_f32, uniform_sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f32 = 1e-4;

    fn forward() -> Interval {
        Interval::new(EPS, f32::INFINITY)
    }

    fn unit_cube() -> Cuboid {
        Cuboid::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_box_top_face() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = unit_cube().hit(&ray, forward()).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_box_every_face_outward() {
        let cube = unit_cube();
        let center = Vec3::splat(0.5);
        for axis in 0..3 {
            for sign in [-1.0f32, 1.0] {
                let dir = axis_normal(axis) * sign;
                let ray = Ray::new(center + dir * 3.0, -dir);
                let hit = cube.hit(&ray, forward()).unwrap();
                assert!((hit.t - 2.5).abs() < 1e-5);
                assert!((hit.normal - dir).length() < 1e-6);
            }
        }
    }

    #[test]
    fn test_box_from_inside_hits_exit_face() {
        let ray = Ray::new(Vec3::splat(0.5), Vec3::X);
        let hit = unit_cube().hit(&ray, forward()).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-5);
        assert!((hit.normal - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_box_miss_and_behind() {
        let cube = unit_cube();
        let beside = Ray::new(Vec3::new(2.0, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(cube.hit(&beside, forward()).is_none());

        let behind = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::Z);
        assert!(cube.hit(&behind, forward()).is_none());
    }

    #[test]
    fn test_box_negative_diagonal() {
        let cube = Cuboid::new(Vec3::ONE, -Vec3::ONE);
        assert_eq!(cube.min(), Vec3::ZERO);
        assert_eq!(cube.max(), Vec3::ONE);
    }

    #[test]
    fn test_box_random_hits_on_surface() {
        let mut rng = StdRng::seed_from_u64(9);
        let cube = Cuboid::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(2.0, 1.0, 3.0));
        let center = (cube.min() + cube.max()) * 0.5;
        for _ in 0..500 {
            let origin = center + uniform_sphere(&mut rng) * 8.0;
            let target = cube.min()
                + (cube.max() - cube.min())
                    * Vec3::new(gen_f32(&mut rng), gen_f32(&mut rng), gen_f32(&mut rng));
            let ray = Ray::new(origin, target - origin);
            let hit = cube.hit(&ray, forward()).unwrap();
            let p = ray.at(hit.t);
            assert!(hit.t > EPS);
            assert!((hit.normal.length() - 1.0).abs() < 1e-6);
            // The point lies on the face the normal names, and the normal
            // points away from the center.
            assert!(hit.normal.dot(p - center) > 0.0);
            assert!((p - center).abs().cmple(Vec3::new(1.0, 0.5, 1.5) + 1e-3).all());
        }
    }
}
