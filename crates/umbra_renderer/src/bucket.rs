//! Bucket-based tiling of the image.
//!
//! The image is split into rectangular buckets that render independently on
//! rayon's pool. Each bucket owns a disjoint set of pixels and its own
//! deterministic random stream.

use crate::{Camera, Color, Integrator};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A rectangular region of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of the top-left corner
    pub x: u32,
    /// Y coordinate of the top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Squared distance from the bucket center to `(cx, cy)`.
    fn distance_squared(&self, cx: f32, cy: f32) -> f32 {
        let bx = self.x as f32 + self.width as f32 / 2.0;
        let by = self.y as f32 + self.height as f32 / 2.0;
        (bx - cx).powi(2) + (by - cy).powi(2)
    }
}

/// Split a `width` x `height` image into buckets, ordered outwards from the
/// image center.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    if width == 0 || height == 0 || bucket_size == 0 {
        return Vec::new();
    }

    let mut buckets = Vec::new();
    for y in (0..height).step_by(bucket_size as usize) {
        for x in (0..width).step_by(bucket_size as usize) {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, buckets.len()));
        }
    }

    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    // Stable sort keeps row-major order among equidistant buckets.
    buckets.sort_by(|a, b| a.distance_squared(cx, cy).total_cmp(&b.distance_squared(cx, cy)));
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }
    buckets
}

/// Seed of the generator for one bucket in one pass (splitmix64 mixing).
pub fn bucket_seed(seed: u64, pass: u32, index: usize) -> u64 {
    let mut z = seed
        ^ (pass as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (index as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Pixels of one bucket for one pass.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Row-major within the bucket
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }
}

/// Trace one jittered camera ray through every pixel of `bucket`.
pub fn render_bucket(
    bucket: &Bucket,
    camera: &Camera,
    integrator: &Integrator,
    pass: u32,
) -> BucketResult {
    let mut rng = StdRng::seed_from_u64(bucket_seed(integrator.config().seed, pass, bucket.index));
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let ray = camera.sample_ray(bucket.x + local_x, bucket.y + local_y, &mut rng);
            pixels.push(integrator.trace_ray(&ray, &mut rng));
        }
    }

    BucketResult::new(*bucket, pixels)
}
