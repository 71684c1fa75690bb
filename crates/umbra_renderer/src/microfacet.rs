//! Microfacet normal distributions, Smith shadowing and Schlick Fresnel.
//!
//! Three models are supported and selected per render: Phong, Beckmann and
//! GGX. All of them take a single roughness parameter `alpha`; for Phong this
//! is the shininess exponent itself, for the other two it is derived from it
//! with [`Distribution::roughness`].

use crate::Color;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use umbra_math::Vec3;

/// Microfacet normal distribution model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Phong,
    #[default]
    Beckmann,
    Ggx,
}

impl Distribution {
    /// Roughness parameter for a material with the given Phong shininess.
    #[inline]
    pub fn roughness(self, shininess: f32) -> f32 {
        match self {
            Distribution::Phong => shininess,
            Distribution::Beckmann | Distribution::Ggx => (2.0 / (shininess + 2.0)).sqrt(),
        }
    }

    /// Normal distribution `D(m)` about the surface normal `n`.
    pub fn d(self, m: Vec3, n: Vec3, alpha: f32) -> f32 {
        let cos_m = m.dot(n);
        if cos_m <= 1e-6 {
            return 0.0;
        }

        let cos2 = cos_m * cos_m;
        let a2 = alpha * alpha;
        match self {
            Distribution::Phong => (alpha + 2.0) / (2.0 * PI) * cos_m.powf(alpha),
            Distribution::Beckmann => {
                let tan2 = (1.0 - cos2).max(0.0) / cos2;
                (-tan2 / a2).exp() / (PI * a2 * cos2 * cos2)
            }
            Distribution::Ggx => {
                // a² / (π cos⁴ (a² + tan²)²), rearranged to avoid tan² overflow
                let denom = cos2 * (a2 - 1.0) + 1.0;
                a2 / (PI * denom * denom)
            }
        }
    }

    /// Smith masking for a single direction `v` over microfacet `m`.
    pub fn g1(self, v: Vec3, m: Vec3, n: Vec3, alpha: f32) -> f32 {
        let v_dot_n = v.dot(n);
        if v_dot_n == 0.0 || v.dot(m) / v_dot_n <= 0.0 {
            return 0.0;
        }
        if v_dot_n.abs() >= 1.0 {
            return 1.0;
        }

        let tan_theta = (1.0 - v_dot_n * v_dot_n).sqrt() / v_dot_n.abs();
        if tan_theta == 0.0 {
            return 1.0;
        }

        match self {
            Distribution::Phong => rational_g1((alpha / 2.0 + 1.0).sqrt() / tan_theta),
            Distribution::Beckmann => rational_g1(1.0 / (alpha * tan_theta)),
            Distribution::Ggx => {
                2.0 / (1.0 + (1.0 + alpha * alpha * tan_theta * tan_theta).sqrt())
            }
        }
    }

    /// Separable Smith shadowing-masking `G1(wi) * G1(wo)`.
    #[inline]
    pub fn g(self, wi: Vec3, wo: Vec3, m: Vec3, n: Vec3, alpha: f32) -> f32 {
        self.g1(wi, m, n, alpha) * self.g1(wo, m, n, alpha)
    }

    /// Cosine of a microfacet normal drawn with density `D(m) (m·n)`.
    pub fn sample_cos_theta(self, alpha: f32, xi: f32) -> f32 {
        match self {
            Distribution::Phong => xi.powf(1.0 / (alpha + 2.0)),
            Distribution::Beckmann => {
                let tan_theta = (-alpha * alpha * (1.0 - xi).ln()).sqrt();
                1.0 / (1.0 + tan_theta * tan_theta).sqrt()
            }
            Distribution::Ggx => {
                let tan_theta = alpha * (xi / (1.0 - xi)).sqrt();
                1.0 / (1.0 + tan_theta * tan_theta).sqrt()
            }
        }
    }
}

/// Rational fit of the Smith term shared by Phong and Beckmann.
#[inline]
fn rational_g1(a: f32) -> f32 {
    if a < 1.6 {
        (3.535 * a + 2.181 * a * a) / (1.0 + 2.276 * a + 2.577 * a * a)
    } else {
        1.0
    }
}

/// Schlick's approximation, `d` being the cosine between the light direction
/// and the microfacet normal.
#[inline]
pub fn fresnel_schlick(ks: Color, d: f32) -> Color {
    ks + (Color::ONE - ks) * (1.0 - d.abs()).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{gen_f32, sample_lobe};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ALL: [Distribution; 3] = [Distribution::Phong, Distribution::Beckmann, Distribution::Ggx];

    /// Monte Carlo estimate of the projected-area normalization ∫ D(m) (m·n) dω.
    fn projected_area(dist: Distribution, alpha: f32) -> f32 {
        let mut rng = StdRng::seed_from_u64(11);
        let n = Vec3::Z;
        let samples = 200_000;
        let mut sum = 0.0;
        for _ in 0..samples {
            // Uniform hemisphere, pdf 1 / 2π.
            let m = sample_lobe(n, gen_f32(&mut rng), 2.0 * PI * gen_f32(&mut rng));
            sum += dist.d(m, n, alpha) * m.dot(n) * 2.0 * PI;
        }
        sum / samples as f32
    }

    #[test]
    fn test_distributions_normalized() {
        for dist in ALL {
            let alpha = dist.roughness(20.0);
            let area = projected_area(dist, alpha);
            assert!((area - 1.0).abs() < 0.05, "{:?} normalizes to {}", dist, area);
        }
    }

    #[test]
    fn test_roughness_mapping() {
        assert_eq!(Distribution::Phong.roughness(30.0), 30.0);
        assert!((Distribution::Ggx.roughness(0.0) - 1.0).abs() < 1e-6);
        assert!(Distribution::Beckmann.roughness(1000.0) < 0.05);
    }

    #[test]
    fn test_d_zero_below_surface() {
        for dist in ALL {
            assert_eq!(dist.d(-Vec3::Z, Vec3::Z, 0.5), 0.0);
        }
    }

    #[test]
    fn test_g1_limits() {
        let n = Vec3::Z;
        for dist in ALL {
            let alpha = dist.roughness(50.0);
            // Head-on: no masking.
            assert!((dist.g1(n, n, n, alpha) - 1.0).abs() < 1e-6);
            // Back-facing relative to the microfacet.
            let v = Vec3::new(0.6, 0.0, 0.8);
            let m = Vec3::new(-0.99, 0.0, 0.141).normalize();
            assert_eq!(dist.g1(v, m, n, alpha), 0.0);
            // Grazing directions are masked more than steep ones.
            let steep = Vec3::new(0.2, 0.0, 0.98).normalize();
            let grazing = Vec3::new(0.98, 0.0, 0.05).normalize();
            assert!(dist.g1(grazing, n, n, alpha) <= dist.g1(steep, n, n, alpha));
        }
    }

    #[test]
    fn test_sampled_cos_theta_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for dist in ALL {
            let alpha = dist.roughness(10.0);
            for _ in 0..1000 {
                let c = dist.sample_cos_theta(alpha, gen_f32(&mut rng));
                assert!((0.0..=1.0).contains(&c), "{:?} gave cos {}", dist, c);
            }
        }
    }

    #[test]
    fn test_fresnel_schlick() {
        let ks = Color::splat(0.04);
        assert!((fresnel_schlick(ks, 1.0) - ks).length() < 1e-6);
        assert!((fresnel_schlick(ks, 0.0) - Color::ONE).length() < 1e-6);
        // Sign of the cosine does not matter.
        assert_eq!(fresnel_schlick(ks, -0.5), fresnel_schlick(ks, 0.5));
    }
}
