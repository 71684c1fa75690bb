//! Scene: the primitive list, its BVH and the explicit light set.

use crate::error::{SceneError, SceneResult};
use crate::light::choose_light;
use crate::{Bvh, HitRecord, Primitive};
use rand::RngCore;
use umbra_math::{Aabb, Ray};

/// A finalized, read-only scene.
#[derive(Debug)]
pub struct Scene {
    bvh: Bvh,
    /// Indices of the lights next-event estimation can sample
    lights: Vec<usize>,
}

impl Scene {
    /// Validate the primitives, collect the light set and build the BVH.
    pub fn new(primitives: Vec<Primitive>) -> SceneResult<Self> {
        let mut lights = Vec::new();
        let mut environments = 0;

        for (i, prim) in primitives.iter().enumerate() {
            prim.material().validate()?;
            if prim.is_environment() {
                environments += 1;
            }
            if prim.is_samplable_light() {
                lights.push(i);
            } else if prim.is_light() {
                log::warn!(
                    "Primitive {} emits light but cannot be sampled directly; \
                     it is only found by BRDF sampling",
                    i
                );
            }
        }
        if environments > 1 {
            return Err(SceneError::MultipleEnvironments);
        }

        log::info!(
            "Scene has {} primitives, {} samplable lights{}",
            primitives.len(),
            lights.len(),
            if environments == 1 { " (including environment)" } else { "" }
        );

        Ok(Self {
            bvh: Bvh::new(primitives),
            lights,
        })
    }

    pub fn primitives(&self) -> &[Primitive] {
        self.bvh.primitives()
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }

    /// Number of lights in the explicit light set.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Closest hit with `t > epsilon`.
    pub fn intersect<'a>(&'a self, ray: &Ray, epsilon: f32, rng: &mut dyn RngCore) -> HitRecord<'a> {
        self.bvh.intersect(ray, epsilon, rng)
    }

    /// Pick a light uniformly and a point on it.
    ///
    /// The returned record carries the light, the point and the light's
    /// normal there; `t` is unused. `None` when the scene has no lights.
    pub fn sample_light(&self, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        let index = choose_light(self.lights.len(), rng)?;
        let prim = &self.primitives()[self.lights[index]];
        let (point, normal) = prim.sample_point(rng)?;
        Some(HitRecord {
            object: Some(prim),
            t: 0.0,
            point,
            normal,
        })
    }
}
