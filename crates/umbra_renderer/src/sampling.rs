//! Random-number and direction-sampling helpers shared by materials and lights.

use crate::Color;
use rand::{Rng, RngCore};
use std::f32::consts::PI;
use umbra_math::Vec3;

/// Uniform random float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Rec. 709 luminance of a linear RGB color.
#[inline]
pub fn luminance(color: Color) -> f32 {
    0.2126 * color.x + 0.7152 * color.y + 0.0722 * color.z
}

/// Direction at polar angle `acos(cos_theta)` and azimuth `phi` around `n`.
///
/// `n` must be unit length. The local frame is built from `n` alone, so the
/// same inputs always give the same direction.
pub fn sample_lobe(n: Vec3, cos_theta: f32, phi: f32) -> Vec3 {
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

    if (n.z - 1.0).abs() < 1e-3 {
        return local;
    }
    if (n.z + 1.0).abs() < 1e-3 {
        return Vec3::new(local.x, -local.y, -local.z);
    }

    let a = Vec3::Z.cross(n).normalize();
    let b = n.cross(a);
    local.x * a + local.y * b + local.z * n
}

/// Uniformly distributed unit vector.
pub fn uniform_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let z = 2.0 * gen_f32(rng) - 1.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Cosine-weighted direction in the hemisphere around `n`.
pub fn cosine_hemisphere(n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let cos_theta = gen_f32(rng).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    sample_lobe(n, cos_theta, phi)
}
