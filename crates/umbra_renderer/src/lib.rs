//! Umbra renderer - stochastic CPU path tracing.
//!
//! A unidirectional Monte Carlo path tracer:
//! - Spheres, boxes, triangles, cylinders and a spherical environment light
//! - Median-split BVH with near-to-far traversal
//! - Diffuse + microfacet reflection/transmission materials (Phong,
//!   Beckmann or GGX distributions)
//! - Next-event estimation and BRDF sampling combined by multiple
//!   importance sampling, Russian roulette termination
//! - Motion blur along Bezier paths
//! - Progressive bucket rendering on rayon's thread pool

mod bucket;
mod bvh;
mod camera;
mod config;
mod cuboid;
mod cylinder;
mod environment;
mod error;
mod hittable;
mod integrator;
mod light;
mod material;
mod microfacet;
mod motion;
mod primitive;
mod renderer;
mod sampling;
mod scene;
mod sphere;
mod triangle;

pub use bucket::{bucket_seed, generate_buckets, render_bucket, Bucket, BucketResult};
pub use bvh::{Bvh, BvhNode};
pub use camera::Camera;
pub use config::{LightingStrategy, RenderConfig};
pub use cuboid::Cuboid;
pub use cylinder::Cylinder;
pub use environment::{EnvironmentLight, EnvironmentMap};
pub use error::{RenderError, RenderResult, SceneError, SceneResult};
pub use hittable::{HitRecord, Hittable, SurfaceHit};
pub use integrator::{Integrator, PathResult};
pub use light::{choose_light, geometry_factor};
pub use material::{Color, LobeWeights, Material};
pub use microfacet::{fresnel_schlick, Distribution};
pub use motion::MotionPath;
pub use primitive::{Primitive, Shape};
pub use renderer::{color_to_rgba, linear_to_gamma, render, Film};
pub use sampling::{cosine_hemisphere, gen_f32, luminance, sample_lobe, uniform_sphere};
pub use scene::Scene;
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export of the math types used throughout the public API
pub use umbra_math::{Aabb, Interval, Quat, Ray, Vec2, Vec3};
