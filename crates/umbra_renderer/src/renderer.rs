//! Frame driver: progressive passes over parallel buckets into a film.

use crate::bucket::{generate_buckets, render_bucket, BucketResult};
use crate::error::{RenderError, RenderResult};
use crate::{Camera, Color, Integrator, RenderConfig, Scene};
use rayon::prelude::*;
use std::time::Instant;

/// Per-pixel accumulation of radiance samples.
#[derive(Debug, Clone)]
pub struct Film {
    width: u32,
    height: u32,
    sums: Vec<Color>,
    counts: Vec<u32>,
    discarded: u64,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            sums: vec![Color::ZERO; len],
            counts: vec![0; len],
            discarded: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples rejected for being NaN or infinite.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Add one sample to pixel `(x, y)`. Returns `false` if the sample was
    /// discarded.
    pub fn add_sample(&mut self, x: u32, y: u32, color: Color) -> bool {
        if !color.is_finite() {
            self.discarded += 1;
            return false;
        }
        let i = self.index(x, y);
        self.sums[i] += color;
        self.counts[i] += 1;
        true
    }

    /// Mean radiance of pixel `(x, y)`, black before any sample lands.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let i = self.index(x, y);
        match self.counts[i] {
            0 => Color::ZERO,
            n => self.sums[i] / n as f32,
        }
    }

    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        self.counts[self.index(x, y)]
    }

    /// Mean radiance of every pixel, row-major.
    pub fn average(&self) -> Vec<Color> {
        self.sums
            .iter()
            .zip(&self.counts)
            .map(|(sum, &n)| if n == 0 { Color::ZERO } else { *sum / n as f32 })
            .collect()
    }

    /// Gamma-corrected 8-bit RGBA, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.sums.len() * 4);
        for color in self.average() {
            bytes.extend_from_slice(&color_to_rgba(color));
        }
        bytes
    }

    fn add_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        let mut pixels = result.pixels.iter();
        for y in bucket.y..bucket.y + bucket.height {
            for x in bucket.x..bucket.x + bucket.width {
                if let Some(&color) = pixels.next() {
                    self.add_sample(x, y, color);
                }
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Gamma 2 encoding.
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [encode(color.x), encode(color.y), encode(color.z), 255]
}

/// Render `scene` through `camera`, one sample per pixel per pass.
pub fn render(scene: &Scene, camera: &Camera, config: &RenderConfig) -> RenderResult<Film> {
    config.validate()?;
    if camera.width() == 0 || camera.height() == 0 {
        return Err(RenderError::EmptyImage);
    }
    if config.strategy.uses_light_sampling() && scene.light_count() == 0 {
        return Err(RenderError::NoLights);
    }

    let start = Instant::now();
    let buckets = generate_buckets(camera.width(), camera.height(), config.bucket_size);
    let integrator = Integrator::new(scene, config.clone());
    let mut film = Film::new(camera.width(), camera.height());

    log::info!(
        "Rendering {}x{} in {} buckets, {} passes, {:?} / {:?}",
        camera.width(),
        camera.height(),
        buckets.len(),
        config.passes,
        config.strategy,
        config.distribution
    );

    for pass in 0..config.passes {
        let results: Vec<BucketResult> = buckets
            .par_iter()
            .map(|bucket| render_bucket(bucket, camera, &integrator, pass))
            .collect();

        let before = film.discarded();
        for result in &results {
            film.add_bucket(result);
        }
        let dropped = film.discarded() - before;
        if dropped > 0 {
            log::warn!("Pass {}: discarded {} non-finite samples", pass, dropped);
        }
        log::debug!("Pass {}/{} done", pass + 1, config.passes);
    }

    log::info!(
        "Render finished in {:.2?} ({} samples discarded)",
        start.elapsed(),
        film.discarded()
    );
    Ok(film)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LightingStrategy, Material, Primitive, SceneError};
    use std::sync::Arc;
    use umbra_math::{Quat, Vec3};

    fn lit_scene() -> Scene {
        let white = Arc::new(Material::diffuse(Color::splat(0.7)));
        let lamp = Arc::new(Material::light(Color::splat(5.0)));
        Scene::new(vec![
            Primitive::sphere(Vec3::new(0.0, 0.0, -4.0), 1.0, white.clone()),
            Primitive::cuboid(Vec3::new(-5.0, -5.0, -6.0), Vec3::new(10.0, 10.0, 0.5), white),
            Primitive::sphere(Vec3::new(1.5, 1.5, -2.0), 0.3, lamp),
        ])
        .unwrap()
    }

    fn camera(width: u32, height: u32) -> Camera {
        Camera::new(Vec3::ZERO, Quat::IDENTITY, 0.6, width, height)
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            passes: 4,
            bucket_size: 8,
            seed: 11,
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 1e-4);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::new(4.0, 0.0, 0.25)), [255, 0, 127, 255]);
    }

    #[test]
    fn test_film_discards_non_finite() {
        let mut film = Film::new(2, 2);
        assert!(film.add_sample(1, 0, Color::splat(1.0)));
        assert!(!film.add_sample(1, 0, Color::new(f32::NAN, 0.0, 0.0)));
        assert!(!film.add_sample(1, 0, Color::splat(f32::INFINITY)));
        assert!(film.add_sample(1, 0, Color::splat(3.0)));
        assert_eq!(film.discarded(), 2);
        assert_eq!(film.sample_count(1, 0), 2);
        assert_eq!(film.pixel(1, 0), Color::splat(2.0));
        assert_eq!(film.pixel(0, 0), Color::ZERO);
    }

    #[test]
    fn test_render_fills_every_pixel() {
        let scene = lit_scene();
        let config = small_config();
        let film = render(&scene, &camera(20, 12), &config).unwrap();
        let mut total = film.discarded();
        for y in 0..12 {
            for x in 0..20 {
                assert!(film.sample_count(x, y) <= config.passes);
                total += film.sample_count(x, y) as u64;
            }
        }
        assert_eq!(total, 20 * 12 * config.passes as u64);
        assert_eq!(film.to_rgba().len(), 20 * 12 * 4);
        assert!(film.average().iter().any(|c| c.max_element() > 0.0));
    }

    #[test]
    fn test_render_is_deterministic() {
        let scene = lit_scene();
        let config = small_config();
        let a = render(&scene, &camera(17, 9), &config).unwrap();
        let b = render(&scene, &camera(17, 9), &config).unwrap();
        assert_eq!(a.average(), b.average());

        let other = RenderConfig {
            seed: 12,
            ..small_config()
        };
        let c = render(&scene, &camera(17, 9), &other).unwrap();
        assert_ne!(a.average(), c.average());
    }

    #[test]
    fn test_render_requires_lights_for_next_event() {
        let white = Arc::new(Material::diffuse(Color::splat(0.7)));
        let scene = Scene::new(vec![Primitive::sphere(Vec3::new(0.0, 0.0, -4.0), 1.0, white)]).unwrap();
        let err = render(&scene, &camera(4, 4), &small_config()).unwrap_err();
        assert!(matches!(err, RenderError::NoLights));

        let config = RenderConfig {
            strategy: LightingStrategy::BrdfOnly,
            ..small_config()
        };
        let film = render(&scene, &camera(4, 4), &config).unwrap();
        assert!(film.average().iter().all(|c| *c == Color::ZERO));
    }

    #[test]
    fn test_render_rejects_bad_input() {
        let scene = lit_scene();
        assert!(matches!(
            render(&scene, &camera(0, 4), &small_config()),
            Err(RenderError::EmptyImage)
        ));
        let config = RenderConfig {
            russian_roulette: 1.5,
            ..small_config()
        };
        assert!(matches!(
            render(&scene, &camera(4, 4), &config),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scene_error_converts() {
        let err: RenderError = SceneError::MultipleEnvironments.into();
        assert!(matches!(err, RenderError::Scene(SceneError::MultipleEnvironments)));
    }
}
