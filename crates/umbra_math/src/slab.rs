use crate::{Interval, Ray, Vec3};

/// The region between two parallel planes `N·P + d0 = 0` and `N·P + d1 = 0`.
///
/// Boxes are the intersection of three axis slabs; a cylinder's caps are a
/// single slab along its local axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slab {
    pub normal: Vec3,
    pub d0: f32,
    pub d1: f32,
}

impl Slab {
    pub fn new(normal: Vec3, d0: f32, d1: f32) -> Self {
        Self { normal, d0, d1 }
    }

    /// Slab spanning `[lo, hi]` along one coordinate axis (0=X, 1=Y, 2=Z).
    pub fn axis(axis: usize, lo: f32, hi: f32) -> Self {
        let normal = match axis {
            0 => Vec3::X,
            1 => Vec3::Y,
            _ => Vec3::Z,
        };
        Self::new(normal, -lo, -hi)
    }

    /// Parametric range of `ray` that lies inside the slab.
    ///
    /// A ray parallel to the planes is either inside for its whole length
    /// (`UNIVERSE`) or never (`EMPTY`).
    pub fn intersect(&self, ray: &Ray) -> Interval {
        let n_dot_o = self.normal.dot(ray.origin);
        let n_dot_d = self.normal.dot(ray.direction);

        if n_dot_d == 0.0 {
            let s0 = n_dot_o + self.d0;
            let s1 = n_dot_o + self.d1;
            return if s0 * s1 < 0.0 {
                Interval::UNIVERSE
            } else {
                Interval::EMPTY
            };
        }

        let t0 = -(self.d0 + n_dot_o) / n_dot_d;
        let t1 = -(self.d1 + n_dot_o) / n_dot_d;
        if t0 <= t1 {
            Interval::new(t0, t1)
        } else {
            Interval::new(t1, t0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slab_crossing() {
        let slab = Slab::axis(2, -1.0, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let i = slab.intersect(&ray);
        assert!((i.min - 4.0).abs() < 1e-6);
        assert!((i.max - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_slab_parallel_inside() {
        let slab = Slab::axis(0, -1.0, 1.0);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 0.0), Vec3::Z);
        assert_eq!(slab.intersect(&ray), Interval::UNIVERSE);
    }

    #[test]
    fn test_slab_parallel_outside() {
        let slab = Slab::axis(0, -1.0, 1.0);
        let ray = Ray::new(Vec3::new(2.0, 0.0, 0.0), Vec3::Z);
        assert!(slab.intersect(&ray).is_empty());
    }

    #[test]
    fn test_slab_reversed_planes() {
        // Same slab with its planes given in the opposite order.
        let slab = Slab::new(Vec3::Y, -3.0, -1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0));
        let i = slab.intersect(&ray);
        assert!((i.min - 0.5).abs() < 1e-6);
        assert!((i.max - 1.5).abs() < 1e-6);
    }
}
