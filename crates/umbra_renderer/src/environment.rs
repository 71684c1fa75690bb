//! Image-based environment lighting.
//!
//! An [`EnvironmentMap`] is a latitude-longitude panorama with +z up: row `j`
//! covers polar angles `θ ∈ [jπ/H, (j+1)π/H]`, column `i` covers a slice of
//! azimuth. Directions are importance sampled from luminance weighted by
//! `sin θ`, using a marginal distribution over columns and a conditional one
//! over the rows of each column. Both tables are built once at construction.

use crate::error::{SceneError, SceneResult};
use crate::hittable::{Hittable, SurfaceHit};
use crate::sampling::{gen_f32, luminance};
use crate::Color;
use rand::RngCore;
use std::f32::consts::PI;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Decoded HDR panorama plus its sampling tables.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    width: usize,
    height: usize,
    /// Row-major linear RGB
    pixels: Vec<Color>,
    /// Azimuth of the left image edge
    azimuth: f32,
    /// Running sum of column weights
    column_cdf: Vec<f32>,
    /// Per column, running sum of pixel weights down the rows
    /// (column-major, `height` entries per column)
    row_cdfs: Vec<f32>,
}

impl EnvironmentMap {
    /// Build a map from `width * height` interleaved RGB floats.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> SceneResult<Self> {
        if width == 0 || height == 0 {
            return Err(SceneError::EnvironmentDimensions { width, height });
        }
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(SceneError::EnvironmentSize {
                expected,
                actual: data.len(),
            });
        }

        let pixels: Vec<Color> = data
            .chunks_exact(3)
            .map(|c| Color::new(c[0], c[1], c[2]))
            .collect();

        let mut map = Self {
            width,
            height,
            pixels,
            azimuth: 0.0,
            column_cdf: Vec::new(),
            row_cdfs: Vec::new(),
        };
        map.build_tables();
        Ok(map)
    }

    /// Rotate the panorama about +z.
    pub fn with_azimuth(mut self, azimuth: f32) -> Self {
        self.azimuth = azimuth;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn build_tables(&mut self) {
        let (w, h) = (self.width, self.height);
        let sin_theta: Vec<f32> = (0..h)
            .map(|j| (PI * (j as f32 + 0.5) / h as f32).sin())
            .collect();

        let weight = |pixels: &[Color], i: usize, j: usize| -> f32 {
            let lum = luminance(pixels[j * w + i]);
            if lum.is_finite() {
                lum.max(0.0) * sin_theta[j]
            } else {
                0.0
            }
        };

        let mut use_luminance = true;
        let total: f32 = (0..w)
            .flat_map(|i| (0..h).map(move |j| (i, j)))
            .map(|(i, j)| weight(&self.pixels, i, j))
            .sum();
        if !(total > 0.0 && total.is_finite()) {
            log::warn!("Environment map is black; sampling it uniformly");
            use_luminance = false;
        }

        let mut row_cdfs = Vec::with_capacity(w * h);
        let mut column_cdf = Vec::with_capacity(w);
        let mut running_columns = 0.0;
        for i in 0..w {
            let mut running_rows = 0.0;
            for j in 0..h {
                running_rows += if use_luminance {
                    weight(&self.pixels, i, j)
                } else {
                    sin_theta[j]
                };
                row_cdfs.push(running_rows);
            }
            running_columns += running_rows;
            column_cdf.push(running_columns);
        }

        log::debug!(
            "Built environment sampling tables for {}x{} map (total weight {})",
            w,
            h,
            running_columns
        );
        self.row_cdfs = row_cdfs;
        self.column_cdf = column_cdf;
    }

    /// Image coordinates `(u, v)` in `[0, 1)²` of a unit direction.
    fn direction_to_uv(&self, dir: Vec3) -> (f32, f32) {
        let theta = dir.z.clamp(-1.0, 1.0).acos();
        let phi = dir.y.atan2(dir.x);
        let u = ((self.azimuth - phi) / (2.0 * PI)).rem_euclid(1.0);
        let v = (theta / PI).clamp(0.0, 1.0);
        (u, v)
    }

    fn uv_to_direction(&self, u: f32, v: f32) -> Vec3 {
        let theta = PI * v;
        let phi = self.azimuth - 2.0 * PI * u;
        Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
    }

    fn pixel(&self, i: usize, j: usize) -> Color {
        self.pixels[j * self.width + i]
    }

    /// Radiance arriving from direction `dir` (need not be normalized),
    /// bilinearly filtered between pixel `floor(u·W), floor(v·H)` and its
    /// right and lower neighbours, both wrapping. Each channel is clamped
    /// to at most 1.
    pub fn radiance(&self, dir: Vec3) -> Color {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Color::ZERO;
        }
        let (u, v) = self.direction_to_uv(dir);

        let x = u * self.width as f32;
        let y = v * self.height as f32;
        let fx = x - x.floor();
        let fy = y - y.floor();

        let x0 = x.floor() as usize % self.width;
        let x1 = (x0 + 1) % self.width;
        let y0 = y.floor() as usize % self.height;
        let y1 = (y0 + 1) % self.height;

        let top = self.pixel(x0, y0) * (1.0 - fx) + self.pixel(x1, y0) * fx;
        let bottom = self.pixel(x0, y1) * (1.0 - fx) + self.pixel(x1, y1) * fx;
        (top * (1.0 - fy) + bottom * fy).min(Color::ONE)
    }

    /// Draw a unit direction with density proportional to the table weights.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let total = self.column_cdf[self.width - 1];
        let target = gen_f32(rng) * total;
        let iu = self
            .column_cdf
            .partition_point(|&c| c <= target)
            .min(self.width - 1);

        let column = &self.row_cdfs[iu * self.height..(iu + 1) * self.height];
        let target = gen_f32(rng) * column[self.height - 1];
        let iv = column.partition_point(|&c| c <= target).min(self.height - 1);

        let u = (iu as f32 + gen_f32(rng)) / self.width as f32;
        let v = (iv as f32 + gen_f32(rng)) / self.height as f32;
        self.uv_to_direction(u, v)
    }

    /// Solid-angle density of [`sample`](Self::sample) producing `dir`.
    pub fn pdf(&self, dir: Vec3) -> f32 {
        let dir = dir.normalize_or_zero();
        let sin_theta = (1.0 - dir.z * dir.z).max(0.0).sqrt();
        if dir == Vec3::ZERO || sin_theta < 1e-6 {
            return 0.0;
        }
        let (u, v) = self.direction_to_uv(dir);
        let iu = ((u * self.width as f32) as usize).min(self.width - 1);
        let iv = ((v * self.height as f32) as usize).min(self.height - 1);

        let column = &self.row_cdfs[iu * self.height..(iu + 1) * self.height];
        let cell = column[iv] - if iv > 0 { column[iv - 1] } else { 0.0 };
        let total = self.column_cdf[self.width - 1];

        let pixel_probability = cell / total;
        pixel_probability * (self.width * self.height) as f32 / (2.0 * PI * PI * sin_theta)
    }
}

/// The environment surrounding the scene: a large sphere whose radiance is
/// looked up in an [`EnvironmentMap`].
#[derive(Debug, Clone)]
pub struct EnvironmentLight {
    pub center: Vec3,
    pub radius: f32,
    pub map: Arc<EnvironmentMap>,
}

impl EnvironmentLight {
    pub fn new(center: Vec3, radius: f32, map: Arc<EnvironmentMap>) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            map,
        }
    }

    /// Direction from the center toward a point on the sphere.
    #[inline]
    pub fn direction_of(&self, point: Vec3) -> Vec3 {
        (point - self.center).normalize_or_zero()
    }

    /// Importance-sampled point on the sphere and its inward normal.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> (Vec3, Vec3) {
        let dir = self.map.sample(rng);
        (self.center + self.radius * dir, -dir)
    }

    /// Area density on the sphere of [`sample_point`](Self::sample_point).
    pub fn pdf_area(&self, point: Vec3) -> f32 {
        self.map.pdf(self.direction_of(point)) / (self.radius * self.radius)
    }

    pub fn radiance(&self, point: Vec3) -> Color {
        self.map.radiance(self.direction_of(point))
    }
}

impl Hittable for EnvironmentLight {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        if a == 0.0 {
            return None;
        }
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // From inside only the far root is ahead of the ray.
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        Some(SurfaceHit {
            t: root,
            normal: -ray.direction.normalize(),
        })
    }

    fn bounding_box(&self) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(self.center - rvec, self.center + rvec)
    }
}
