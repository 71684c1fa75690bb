//! Scene primitives: a shape, its shared material and optional motion.

use crate::environment::{EnvironmentLight, EnvironmentMap};
use crate::hittable::{HitRecord, Hittable, SurfaceHit};
use crate::{Color, Cuboid, Cylinder, Material, MotionPath, Sphere, Triangle};
use rand::RngCore;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// The closed set of supported shapes.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere(Sphere),
    Cuboid(Cuboid),
    Triangle(Triangle),
    Cylinder(Cylinder),
    Environment(EnvironmentLight),
}

impl Shape {
    /// Rest position used as the start of a motion path.
    fn anchor(&self) -> Vec3 {
        match self {
            Shape::Sphere(s) => s.center,
            Shape::Cuboid(b) => b.min(),
            Shape::Triangle(t) => t.bounding_box().centroid(),
            Shape::Cylinder(c) => c.base(),
            Shape::Environment(e) => e.center,
        }
    }
}

impl Hittable for Shape {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        match self {
            Shape::Sphere(s) => s.hit(ray, ray_t),
            Shape::Cuboid(b) => b.hit(ray, ray_t),
            Shape::Triangle(t) => t.hit(ray, ray_t),
            Shape::Cylinder(c) => c.hit(ray, ray_t),
            Shape::Environment(e) => e.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Cuboid(b) => b.bounding_box(),
            Shape::Triangle(t) => t.bounding_box(),
            Shape::Cylinder(c) => c.bounding_box(),
            Shape::Environment(e) => e.bounding_box(),
        }
    }
}

/// A renderable object.
#[derive(Debug, Clone)]
pub struct Primitive {
    shape: Shape,
    material: Arc<Material>,
    motion: Option<MotionPath>,
    bbox: Aabb,
}

impl Primitive {
    pub fn new(shape: Shape, material: Arc<Material>) -> Self {
        let bbox = shape.bounding_box();
        Self {
            shape,
            material,
            motion: None,
            bbox,
        }
    }

    pub fn sphere(center: Vec3, radius: f32, material: Arc<Material>) -> Self {
        Self::new(Shape::Sphere(Sphere::new(center, radius)), material)
    }

    /// Axis-aligned box from `corner` to `corner + diagonal`.
    pub fn cuboid(corner: Vec3, diagonal: Vec3, material: Arc<Material>) -> Self {
        Self::new(Shape::Cuboid(Cuboid::new(corner, diagonal)), material)
    }

    pub fn triangle(triangle: Triangle, material: Arc<Material>) -> Self {
        Self::new(Shape::Triangle(triangle), material)
    }

    pub fn cylinder(base: Vec3, axis: Vec3, radius: f32, material: Arc<Material>) -> Self {
        Self::new(Shape::Cylinder(Cylinder::new(base, axis, radius)), material)
    }

    /// Environment sphere lit by `map`.
    pub fn environment(center: Vec3, radius: f32, map: Arc<EnvironmentMap>) -> Self {
        let light = EnvironmentLight::new(center, radius, map);
        Self::new(Shape::Environment(light), Arc::new(Material::light(Color::ONE)))
    }

    /// Blur the primitive along a Bezier path through two control points.
    ///
    /// The path starts at the shape's anchor (sphere center, box corner,
    /// cylinder base, triangle centroid). The environment cannot move.
    pub fn with_motion(mut self, control1: Vec3, control2: Vec3) -> Self {
        if matches!(self.shape, Shape::Environment(_)) {
            log::warn!("Ignoring motion blur on the environment light");
            return self;
        }
        let path = MotionPath::new(self.shape.anchor(), control1, control2);
        self.bbox = path.swept_bounds(&self.shape.bounding_box());
        self.motion = Some(path);
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn motion(&self) -> Option<&MotionPath> {
        self.motion.as_ref()
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn is_environment(&self) -> bool {
        matches!(self.shape, Shape::Environment(_))
    }

    /// Emissive material or the environment.
    pub fn is_light(&self) -> bool {
        self.material.is_light() || self.is_environment()
    }

    /// Whether next-event estimation can draw points on this light.
    pub fn is_samplable_light(&self) -> bool {
        self.is_light()
            && self.motion.is_none()
            && matches!(
                self.shape,
                Shape::Sphere(_) | Shape::Triangle(_) | Shape::Environment(_)
            )
    }

    /// Intersect, writing into `rec` if the hit is closer than `ray_t.max`.
    ///
    /// Moving primitives draw a fresh shutter time on every call.
    pub fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
        rec: &mut HitRecord<'a>,
    ) -> bool {
        let surface = match &self.motion {
            Some(path) => {
                let offset = path.sample_offset(rng);
                self.shape.hit(&ray.translated(-offset), ray_t)
            }
            None => self.shape.hit(ray, ray_t),
        };

        match surface {
            Some(SurfaceHit { t, normal }) => {
                rec.object = Some(self);
                rec.t = t;
                rec.point = ray.at(t);
                rec.normal = normal;
                true
            }
            None => false,
        }
    }

    /// Point on the light, with its normal, for next-event estimation.
    /// `None` for shapes that cannot be sampled.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> Option<(Vec3, Vec3)> {
        if !self.is_samplable_light() {
            return None;
        }
        match &self.shape {
            Shape::Sphere(s) => Some(s.sample_point(rng)),
            Shape::Triangle(t) => Some(t.sample_point(rng)),
            Shape::Environment(e) => Some(e.sample_point(rng)),
            Shape::Cuboid(_) | Shape::Cylinder(_) => None,
        }
    }

    /// Radiance leaving the light at `hit` back along the incoming ray.
    pub fn eval_radiance(&self, hit: &HitRecord) -> Color {
        match &self.shape {
            Shape::Environment(e) => e.radiance(hit.point),
            _ => self.material.emission(),
        }
    }

    /// Area density of choosing `hit` by uniform light selection among
    /// `light_count` lights followed by [`sample_point`](Self::sample_point).
    pub fn pdf_light(&self, light_count: usize, hit: &HitRecord) -> f32 {
        if light_count == 0 || !self.is_samplable_light() {
            return 0.0;
        }
        let area_pdf = match &self.shape {
            Shape::Sphere(s) => 1.0 / s.area(),
            Shape::Triangle(t) => 1.0 / t.area(),
            Shape::Environment(e) => e.pdf_area(hit.point),
            Shape::Cuboid(_) | Shape::Cylinder(_) => 0.0,
        };
        if area_pdf.is_finite() {
            area_pdf / light_count as f32
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grey() -> Arc<Material> {
        Arc::new(Material::diffuse(Color::splat(0.5)))
    }

    fn forward() -> Interval {
        Interval::new(1e-4, f32::INFINITY)
    }

    #[test]
    fn test_primitive_hit_fills_record() {
        let mut rng = StdRng::seed_from_u64(0);
        let prim = Primitive::sphere(Vec3::ZERO, 1.0, grey());
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let mut rec = HitRecord::default();
        assert!(prim.hit(&ray, forward(), &mut rng, &mut rec));
        assert!(std::ptr::eq(rec.object.unwrap(), &prim));
        assert!((rec.point - ray.at(rec.t)).length() < 1e-6);
        assert!((rec.t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_moving_sphere_is_blurred() {
        let mut rng = StdRng::seed_from_u64(10);
        let prim = Primitive::sphere(Vec3::ZERO, 0.5, grey())
            .with_motion(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));

        // A ray through the rest position and one through the end position
        // both hit some of the time, but not always.
        for x in [0.0, 2.0] {
            let ray = Ray::new(Vec3::new(x, 0.0, 5.0), -Vec3::Z);
            let hits = (0..1000)
                .filter(|_| {
                    let mut rec = HitRecord::default();
                    prim.hit(&ray, forward(), &mut rng, &mut rec)
                })
                .count();
            assert!(hits > 0 && hits < 1000, "x = {}: {} hits", x, hits);
        }

        let bbox = prim.bounding_box();
        assert!(bbox.x.min <= -0.5 && bbox.x.max >= 2.5);
    }

    #[test]
    fn test_moving_hit_point_is_on_original_ray() {
        let mut rng = StdRng::seed_from_u64(12);
        let prim = Primitive::cuboid(Vec3::ZERO, Vec3::ONE, grey())
            .with_motion(Vec3::new(0.3, 0.0, 0.0), Vec3::new(0.3, 0.3, 0.0));
        let ray = Ray::new(Vec3::new(0.9, 0.9, 5.0), -Vec3::Z);
        for _ in 0..100 {
            let mut rec = HitRecord::default();
            if prim.hit(&ray, forward(), &mut rng, &mut rec) {
                assert!((rec.point - ray.at(rec.t)).length() < 1e-5);
                assert!((rec.point.z - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_light_classification() {
        let lamp = Arc::new(Material::light(Color::splat(4.0)));
        assert!(Primitive::sphere(Vec3::ZERO, 1.0, lamp.clone()).is_samplable_light());
        assert!(Primitive::cuboid(Vec3::ZERO, Vec3::ONE, lamp.clone()).is_light());
        assert!(!Primitive::cuboid(Vec3::ZERO, Vec3::ONE, lamp.clone()).is_samplable_light());
        assert!(!Primitive::sphere(Vec3::ZERO, 1.0, grey()).is_light());

        let moving = Primitive::sphere(Vec3::ZERO, 1.0, lamp).with_motion(Vec3::X, Vec3::Y);
        assert!(moving.is_light() && !moving.is_samplable_light());
    }

    #[test]
    fn test_sphere_light_pdf() {
        let lamp = Arc::new(Material::light(Color::ONE));
        let prim = Primitive::sphere(Vec3::ZERO, 2.0, lamp);
        let rec = HitRecord {
            object: Some(&prim),
            ..Default::default()
        };
        let expected = 1.0 / (4.0 * std::f32::consts::PI * 4.0 * 3.0);
        assert!((prim.pdf_light(3, &rec) - expected).abs() < 1e-7);
        assert_eq!(prim.pdf_light(0, &rec), 0.0);
    }

    #[test]
    fn test_environment_radiance_by_direction() {
        // Left half of the panorama red, right half blue.
        let (w, h) = (8, 4);
        let mut data = Vec::new();
        for _ in 0..h {
            for i in 0..w {
                let c = if i < w / 2 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] };
                data.extend_from_slice(&c);
            }
        }
        let map = Arc::new(EnvironmentMap::new(w, h, data).unwrap());
        let prim = Primitive::environment(Vec3::ZERO, 1000.0, map);
        assert!(prim.is_light() && prim.is_samplable_light());

        // u = -φ / 2π: φ = -π/2 is u = 0.25 (red), φ = +π/2 is u = 0.75 (blue).
        let red = HitRecord {
            object: Some(&prim),
            point: Vec3::new(0.0, -1000.0, 0.0),
            ..Default::default()
        };
        let blue = HitRecord {
            point: Vec3::new(0.0, 1000.0, 0.0),
            ..red
        };
        assert!(prim.eval_radiance(&red).x > 0.9);
        assert!(prim.eval_radiance(&blue).z > 0.9);
    }
}
