//! Motion blur along a quadratic Bezier path.

use crate::sampling::gen_f32;
use rand::RngCore;
use umbra_math::{Aabb, Vec3};

/// Path of a moving primitive: it starts at `start` and is pulled toward the
/// two control points over the shutter interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPath {
    pub start: Vec3,
    pub control1: Vec3,
    pub control2: Vec3,
}

impl MotionPath {
    pub fn new(start: Vec3, control1: Vec3, control2: Vec3) -> Self {
        Self {
            start,
            control1,
            control2,
        }
    }

    /// Position on the curve at shutter time `time ∈ [0, 1]`.
    ///
    /// Time is remapped through `1 - (1 - t)²`, so uniform shutter samples
    /// bunch toward the end of the path.
    pub fn position(&self, time: f32) -> Vec3 {
        let t = 1.0 - (1.0 - time) * (1.0 - time);
        let s = 1.0 - t;
        s * s * self.start + 2.0 * t * s * self.control1 + t * t * self.control2
    }

    /// Displacement from the rest position at a fresh random shutter time.
    pub fn sample_offset(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.position(gen_f32(rng)) - self.start
    }

    /// Bounds of a shape swept along the path.
    ///
    /// The curve lies in the convex hull of its control points, so the union
    /// of the rest box moved to each of them covers the sweep.
    pub fn swept_bounds(&self, rest: &Aabb) -> Aabb {
        let b1 = rest.translate(self.control1 - self.start);
        let b2 = rest.translate(self.control2 - self.start);
        Aabb::surrounding(&Aabb::surrounding(rest, &b1), &b2)
    }
}
