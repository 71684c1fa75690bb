//! Light-transport helpers shared by light sampling and the integrator.

use crate::sampling::gen_f32;
use crate::HitRecord;
use rand::RngCore;

/// Geometry factor `|n_a·d| |n_b·d| / |b - a|²` between two surface points,
/// `d` being the unit direction from `a` to `b`. Zero for coincident points.
pub fn geometry_factor(a: &HitRecord, b: &HitRecord) -> f32 {
    let offset = b.point - a.point;
    let dist2 = offset.length_squared();
    if dist2 < 1e-12 {
        return 0.0;
    }
    let d = offset / dist2.sqrt();
    (a.normal.dot(d) * b.normal.dot(d)).abs() / dist2
}

/// Uniformly choose one of `count` lights. `None` when there are none.
pub fn choose_light(count: usize, rng: &mut dyn RngCore) -> Option<usize> {
    match count {
        0 => None,
        1 => Some(0),
        n => Some(((gen_f32(rng) * n as f32) as usize).min(n - 1)),
    }
}
