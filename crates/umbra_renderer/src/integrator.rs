//! Unidirectional path tracing with next-event estimation, BRDF sampling,
//! multiple importance sampling and Russian roulette.

use crate::light::geometry_factor;
use crate::sampling::gen_f32;
use crate::{Color, HitRecord, LightingStrategy, RenderConfig, Scene};
use rand::RngCore;
use umbra_math::Ray;

/// Radiance estimate for one camera ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathResult {
    pub radiance: Color,
    /// Russian roulette continuations taken
    pub bounces: u32,
}

/// Balance heuristic weight of strategy `a` against strategy `b`.
#[inline]
fn balance(a: f32, b: f32) -> f32 {
    let (a2, b2) = (a * a, b * b);
    if a2 + b2 > 0.0 {
        a2 / (a2 + b2)
    } else {
        0.0
    }
}

/// Per-render tracing context: the scene and the settings every path uses.
pub struct Integrator<'s> {
    scene: &'s Scene,
    config: RenderConfig,
}

impl<'s> Integrator<'s> {
    pub fn new(scene: &'s Scene, config: RenderConfig) -> Self {
        Self { scene, config }
    }

    pub fn scene(&self) -> &'s Scene {
        self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// One radiance sample along `ray`.
    pub fn trace_ray(&self, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        self.trace_path(ray, rng).radiance
    }

    /// Trace a full path starting with `ray`.
    pub fn trace_path(&self, ray: &Ray, rng: &mut dyn RngCore) -> PathResult {
        let epsilon = self.config.epsilon;
        let distribution = self.config.distribution;
        let strategy = self.config.strategy;
        let split = strategy.split();
        let q = self.config.russian_roulette;
        let light_count = self.scene.light_count();

        let first = self.scene.intersect(ray, epsilon, rng);
        let Some(object) = first.object else {
            return PathResult {
                radiance: Color::ZERO,
                bounces: 0,
            };
        };
        if object.is_light() {
            return PathResult {
                radiance: object.eval_radiance(&first),
                bounces: 0,
            };
        }

        let mut radiance = Color::ZERO;
        let mut weight = Color::ONE;
        let mut vertex = first;
        let mut wo = -ray.direction.normalize();
        let mut segment = first.t * ray.direction.length();
        let mut bounces = 0;

        // Roulette survival is folded into the BRDF density, so only the
        // extension throughput and both MIS weights carry the factor q.
        while gen_f32(rng) < q {
            bounces += 1;

            let Some(material) = vertex.material() else {
                break;
            };
            let n = vertex.normal;

            // Next-event estimation
            if strategy.uses_light_sampling() {
                if let Some(light) = self.scene.sample_light(rng) {
                    let to_light = light.point - vertex.point;
                    let distance = to_light.length();
                    let g = geometry_factor(&vertex, &light);
                    let p_light = light
                        .object
                        .map_or(0.0, |l| l.pdf_light(light_count, &light))
                        / g;

                    if distance > 0.0 && g > 0.0 && p_light > 0.0 && p_light.is_finite() {
                        let wi = to_light / distance;
                        let shadow = self.scene.intersect(&Ray::new(vertex.point, wi), epsilon, rng);
                        if is_same_point(&shadow, &light, distance) {
                            let f = material.eval_scattering(wo, n, wi, segment, distribution);
                            let w = match strategy {
                                LightingStrategy::Mis => {
                                    let p_brdf = material.pdf_brdf(wo, n, wi, distribution) * q;
                                    balance(p_light, p_brdf)
                                }
                                _ => 1.0,
                            };
                            let le = light.object.map_or(Color::ZERO, |l| l.eval_radiance(&light));
                            radiance += split * weight * w * f / p_light * le;
                        }
                    }
                }
            }

            // Extend the path
            let wi = material.sample_brdf(wo, n, distribution, rng);
            let p_brdf = material.pdf_brdf(wo, n, wi, distribution) * q;
            if p_brdf < epsilon {
                break;
            }
            let f = material.eval_scattering(wo, n, wi, segment, distribution);

            let next = self.scene.intersect(&Ray::new(vertex.point, wi), epsilon, rng);
            let Some(hit_object) = next.object else {
                break;
            };

            weight *= f / p_brdf;
            if !weight.is_finite() {
                break;
            }

            if hit_object.is_light() {
                if strategy.uses_brdf_hits() {
                    let w = match strategy {
                        LightingStrategy::Mis => {
                            let g = geometry_factor(&vertex, &next);
                            let p_light = if g > 0.0 {
                                hit_object.pdf_light(light_count, &next) / g
                            } else {
                                0.0
                            };
                            balance(p_brdf, p_light)
                        }
                        _ => 1.0,
                    };
                    radiance += split * weight * w * hit_object.eval_radiance(&next);
                }
                break;
            }

            wo = -wi;
            segment = next.t;
            vertex = next;
        }

        PathResult { radiance, bounces }
    }
}

/// Whether a shadow ray's nearest hit is the sampled light point.
fn is_same_point(shadow: &HitRecord, light: &HitRecord, distance: f32) -> bool {
    match (shadow.object, light.object) {
        (Some(a), Some(b)) => {
            std::ptr::eq(a, b) && (shadow.point - light.point).length() <= 1e-3 * (1.0 + distance)
        }
        _ => false,
    }
}
