//! Materials and the mixture BRDF used by the path tracer.
//!
//! A surface scatters through up to three lobes: Lambertian diffuse, glossy
//! microfacet reflection and glossy microfacet transmission. Sampling first
//! picks a lobe with probability proportional to the channel sum of its
//! color, then draws a direction from that lobe; [`Material::pdf_brdf`]
//! returns the density of exactly that two-step process.
//!
//! All directions point away from the surface: `wo` toward the previous
//! path vertex, `wi` toward the next one. `n` is the outward geometric
//! normal; each routine orients it to `wo`'s side itself.

use crate::error::{SceneError, SceneResult};
use crate::microfacet::{fresnel_schlick, Distribution};
use crate::sampling::{cosine_hemisphere, gen_f32, sample_lobe};
use rand::RngCore;
use std::f32::consts::PI;
use umbra_math::Vec3;

/// RGB color type.
pub type Color = Vec3;

/// Probability of sampling each lobe. Sums to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LobeWeights {
    pub diffuse: f32,
    pub reflective: f32,
    pub transmissive: f32,
}

impl LobeWeights {
    fn from_colors(kd: Color, ks: Color, kt: Color) -> Self {
        let d = kd.element_sum().max(0.0);
        let r = ks.element_sum().max(0.0);
        let t = kt.element_sum().max(0.0);
        let total = d + r + t;
        if !(total > 0.0 && total.is_finite()) {
            return Self {
                diffuse: 1.0,
                reflective: 0.0,
                transmissive: 0.0,
            };
        }
        Self {
            diffuse: d / total,
            reflective: r / total,
            transmissive: t / total,
        }
    }
}

/// Surface material. Immutable once built; primitives share it through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Diffuse color
    pub kd: Color,
    /// Specular color, also the Fresnel reflectance at normal incidence
    pub ks: Color,
    /// Transmission color, the per-unit-distance interior attenuation
    pub kt: Color,
    /// Index of refraction of the interior
    pub ior: f32,
    /// Phong exponent; Beckmann and GGX derive their roughness from it
    pub shininess: f32,
    emission: Option<Color>,
    weights: LobeWeights,
}

impl Material {
    /// Opaque material with diffuse and glossy reflection.
    pub fn new(kd: Color, ks: Color, shininess: f32) -> Self {
        Self {
            kd,
            ks,
            kt: Color::ZERO,
            ior: 1.0,
            shininess,
            emission: None,
            weights: LobeWeights::from_colors(kd, ks, Color::ZERO),
        }
    }

    /// Pure Lambertian material.
    pub fn diffuse(kd: Color) -> Self {
        Self::new(kd, Color::ZERO, 0.0)
    }

    /// Add a transmissive lobe with interior color `kt` and index of
    /// refraction `ior`.
    pub fn with_transmission(mut self, kt: Color, ior: f32) -> Self {
        self.kt = kt;
        self.ior = ior;
        self.weights = LobeWeights::from_colors(self.kd, self.ks, kt);
        self
    }

    /// Emissive material. Lights do not scatter.
    pub fn light(emission: Color) -> Self {
        Self {
            emission: Some(emission),
            ..Self::diffuse(Color::ZERO)
        }
    }

    #[inline]
    pub fn is_light(&self) -> bool {
        self.emission.is_some()
    }

    /// Emitted radiance, black for non-lights.
    pub fn emission(&self) -> Color {
        self.emission.unwrap_or(Color::ZERO)
    }

    pub fn weights(&self) -> LobeWeights {
        self.weights
    }

    /// Check that every parameter is physically meaningful.
    pub fn validate(&self) -> SceneResult<()> {
        let colors = [
            ("kd", self.kd),
            ("ks", self.ks),
            ("kt", self.kt),
            ("emission", self.emission()),
        ];
        for (name, c) in colors {
            if !c.is_finite() || c.min_element() < 0.0 {
                return Err(SceneError::InvalidMaterial(format!(
                    "{} must be finite and non-negative, got {:?}",
                    name, c
                )));
            }
        }
        if !(self.shininess >= 0.0 && self.shininess.is_finite()) {
            return Err(SceneError::InvalidMaterial(format!(
                "shininess must be non-negative, got {}",
                self.shininess
            )));
        }
        if !(self.ior > 0.0 && self.ior.is_finite()) {
            return Err(SceneError::InvalidMaterial(format!(
                "index of refraction must be positive, got {}",
                self.ior
            )));
        }
        Ok(())
    }

    /// Indices of refraction on `wo`'s side and on the far side.
    #[inline]
    fn etas(&self, wo: Vec3, n: Vec3) -> (f32, f32) {
        if wo.dot(n) >= 0.0 {
            (1.0, self.ior)
        } else {
            (self.ior, 1.0)
        }
    }

    /// Draw an incoming direction for outgoing direction `wo`.
    ///
    /// Returns `Vec3::ZERO` when the chosen lobe produces no valid
    /// direction (a microfacet facing away from `wo`, or a glossy sample
    /// that lands on the wrong side). `pdf_brdf` of the zero vector is 0,
    /// so the caller treats it as absorption.
    pub fn sample_brdf(
        &self,
        wo: Vec3,
        n: Vec3,
        distribution: Distribution,
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        let n_o = face_forward(n, wo);
        let choice = gen_f32(rng);

        if choice < self.weights.diffuse {
            return cosine_hemisphere(n_o, rng);
        }

        let alpha = distribution.roughness(self.shininess);
        let cos_m = distribution.sample_cos_theta(alpha, gen_f32(rng));
        let m = sample_lobe(n_o, cos_m, 2.0 * PI * gen_f32(rng));
        let o_dot_m = wo.dot(m);
        if o_dot_m <= 0.0 {
            return Vec3::ZERO;
        }

        let wi = if choice < self.weights.diffuse + self.weights.reflective {
            reflect(wo, m)
        } else {
            let (eta_o, eta_i) = self.etas(wo, n);
            match refract(wo, m, eta_o / eta_i) {
                Some(wi) => {
                    return if wi.dot(n_o) < 0.0 { wi } else { Vec3::ZERO };
                }
                None => reflect(wo, m),
            }
        };

        if wi.dot(n_o) > 0.0 {
            wi
        } else {
            Vec3::ZERO
        }
    }

    /// Solid-angle density with which [`sample_brdf`](Self::sample_brdf)
    /// returns `wi`.
    pub fn pdf_brdf(&self, wo: Vec3, n: Vec3, wi: Vec3, distribution: Distribution) -> f32 {
        let n_o = face_forward(n, wo);
        let i_dot_n = wi.dot(n_o);
        let alpha = distribution.roughness(self.shininess);
        let w = self.weights;
        let mut pdf = 0.0;

        if i_dot_n > 0.0 {
            pdf += w.diffuse * i_dot_n / PI;

            let m = (wo + wi).normalize_or_zero();
            let i_dot_m = wi.dot(m);
            if i_dot_m > 0.0 {
                let p_reflect = distribution.d(m, n_o, alpha) * m.dot(n_o) / (4.0 * i_dot_m);
                pdf += w.reflective * p_reflect;

                // The transmissive lobe reflects when refraction is impossible.
                let (eta_o, eta_i) = self.etas(wo, n);
                if w.transmissive > 0.0 && refract(wo, m, eta_o / eta_i).is_none() {
                    pdf += w.transmissive * p_reflect;
                }
            }
        } else if i_dot_n < 0.0 && w.transmissive > 0.0 {
            let (eta_o, eta_i) = self.etas(wo, n);
            if let Some((m, denom)) = refraction_half_vector(wo, wi, n_o, eta_o, eta_i) {
                let jacobian = eta_i * eta_i * wi.dot(m).abs() / (denom * denom);
                pdf += w.transmissive * distribution.d(m, n_o, alpha) * m.dot(n_o) * jacobian;
            }
        }

        pdf
    }

    /// Scattering `f(wo, wi) |n·wi|`.
    ///
    /// `distance` is the length of the segment that arrived at this vertex;
    /// when `wo` lies inside the surface it attenuates the transmitted part
    /// by Beer's law.
    pub fn eval_scattering(
        &self,
        wo: Vec3,
        n: Vec3,
        wi: Vec3,
        distance: f32,
        distribution: Distribution,
    ) -> Color {
        let n_o = face_forward(n, wo);
        let i_dot_n = wi.dot(n_o);
        let o_dot_n = wo.dot(n_o);
        if i_dot_n == 0.0 || o_dot_n <= 0.0 {
            return Color::ZERO;
        }

        let alpha = distribution.roughness(self.shininess);
        let transmissive = self.weights.transmissive > 0.0;
        let mut f = Color::ZERO;

        if i_dot_n > 0.0 {
            f += self.kd / PI;

            let m = (wo + wi).normalize_or_zero();
            if m != Vec3::ZERO {
                let d = distribution.d(m, n_o, alpha);
                let g = distribution.g(wi, wo, m, n_o, alpha);
                let fresnel = fresnel_schlick(self.ks, wi.dot(m));
                let specular = fresnel * (d * g / (4.0 * i_dot_n * o_dot_n));
                f += specular;

                let (eta_o, eta_i) = self.etas(wo, n);
                if transmissive && refract(wo, m, eta_o / eta_i).is_none() {
                    f += specular * self.attenuation(wo, n, distance);
                }
            }
        } else if transmissive {
            let (eta_o, eta_i) = self.etas(wo, n);
            if let Some((m, denom)) = refraction_half_vector(wo, wi, n_o, eta_o, eta_i) {
                let d = distribution.d(m, n_o, alpha);
                let g = distribution.g(wi, wo, m, n_o, alpha);
                let fresnel = fresnel_schlick(self.ks, wi.dot(m));
                let geometric = wi.dot(m).abs() * wo.dot(m).abs() * eta_o * eta_o
                    / (i_dot_n.abs() * o_dot_n * denom * denom);
                let btdf = (Color::ONE - fresnel) * (d * g * geometric);
                f += btdf * self.attenuation(wo, n, distance);
            }
        }

        f * i_dot_n.abs()
    }

    /// Beer's-law absorption over `distance` when `wo` is inside.
    fn attenuation(&self, wo: Vec3, n: Vec3, distance: f32) -> Color {
        if wo.dot(n) >= 0.0 {
            return Color::ONE;
        }
        let channel = |k: f32| if k > 0.0 { (distance * k.ln()).exp() } else { 0.0 };
        Color::new(channel(self.kt.x), channel(self.kt.y), channel(self.kt.z))
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// `n` flipped to the hemisphere containing `v`.
#[inline]
fn face_forward(n: Vec3, v: Vec3) -> Vec3 {
    if v.dot(n) >= 0.0 {
        n
    } else {
        -n
    }
}

/// Mirror `wo` about `m`.
#[inline]
fn reflect(wo: Vec3, m: Vec3) -> Vec3 {
    2.0 * wo.dot(m) * m - wo
}

/// Refract `wo` through microfacet `m` with relative index `eta = η_o / η_i`.
/// `None` on total internal reflection.
#[inline]
fn refract(wo: Vec3, m: Vec3, eta: f32) -> Option<Vec3> {
    let o_dot_m = wo.dot(m);
    let r = 1.0 - eta * eta * (1.0 - o_dot_m * o_dot_m);
    if r < 0.0 {
        return None;
    }
    Some((eta * o_dot_m - r.sqrt()) * m - eta * wo)
}

/// Microfacet normal that refracts `wo` into `wi`, oriented to `n_o`, and
/// the Jacobian denominator `η_o (wo·m) + η_i (wi·m)`.
///
/// `None` unless `wo` and `wi` lie on opposite sides of that microfacet.
fn refraction_half_vector(
    wo: Vec3,
    wi: Vec3,
    n_o: Vec3,
    eta_o: f32,
    eta_i: f32,
) -> Option<(Vec3, f32)> {
    let m = -(eta_o * wo + eta_i * wi).normalize_or_zero();
    if m == Vec3::ZERO {
        return None;
    }
    let m = face_forward(m, n_o);
    if wo.dot(m) <= 0.0 || wi.dot(m) >= 0.0 {
        return None;
    }
    let denom = eta_o * wo.dot(m) + eta_i * wi.dot(m);
    if denom.abs() < 1e-6 {
        return None;
    }
    Some((m, denom))
}
