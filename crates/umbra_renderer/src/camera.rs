//! Pinhole camera for primary ray generation.

use crate::sampling::gen_f32;
use rand::RngCore;
use umbra_math::{Quat, Ray, Vec2, Vec3};

/// Pinhole camera described by an eye point and a scaled orthonormal frame.
///
/// The view looks down `-z` of the oriented frame. `ry` is the half-height of
/// the image plane at unit distance; the half-width follows from the aspect.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    x_axis: Vec3,
    y_axis: Vec3,
    z_axis: Vec3,
    width: u32,
    height: u32,
}

impl Camera {
    pub fn new(eye: Vec3, orientation: Quat, ry: f32, width: u32, height: u32) -> Self {
        let rx = if height > 0 {
            ry * width as f32 / height as f32
        } else {
            ry
        };
        Self {
            eye,
            x_axis: rx * (orientation * Vec3::X),
            y_axis: ry * (orientation * Vec3::Y),
            z_axis: orientation * Vec3::Z,
            width,
            height,
        }
    }

    /// Camera at `eye` looking towards `target`, with `up` roughly upwards in
    /// the image.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, ry: f32, width: u32, height: u32) -> Self {
        let back = (eye - target).normalize_or_zero();
        let right = up.cross(back).normalize_or_zero();
        let orientation = if back == Vec3::ZERO || right == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            let true_up = back.cross(right);
            Quat::from_mat3(&umbra_math::Mat3::from_cols(right, true_up, back))
        };
        Self::new(eye, orientation, ry, width, height)
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Ray through pixel `(x, y)` offset by `jitter` in `[0, 1)²`. Row 0 is
    /// the top of the image.
    pub fn ray(&self, x: u32, y: u32, jitter: Vec2) -> Ray {
        let dx = 2.0 * (x as f32 + jitter.x) / self.width as f32 - 1.0;
        let dy = 1.0 - 2.0 * (y as f32 + jitter.y) / self.height as f32;
        let direction = (dx * self.x_axis + dy * self.y_axis - self.z_axis).normalize();
        Ray::new(self.eye, direction)
    }

    /// Ray through a uniformly jittered position inside pixel `(x, y)`.
    pub fn sample_ray(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Ray {
        let jitter = Vec2::new(gen_f32(rng), gen_f32(rng));
        self.ray(x, y, jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_center_ray_looks_down_negative_z() {
        let camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, 0.5, 100, 100);
        let ray = camera.ray(50, 50, Vec2::ZERO);
        assert!((ray.direction - -Vec3::Z).length() < 1e-5);
        assert_eq!(ray.origin, Vec3::ZERO);
    }

    #[test]
    fn test_corners_follow_aspect() {
        // 200x100 image, ry = 1 gives rx = 2
        let camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, 1.0, 200, 100);
        let top_left = camera.ray(0, 0, Vec2::ZERO);
        let expected = Vec3::new(-2.0, 1.0, -1.0).normalize();
        assert!((top_left.direction - expected).length() < 1e-5);

        let bottom_right = camera.ray(199, 99, Vec2::ONE);
        let expected = Vec3::new(2.0, -1.0, -1.0).normalize();
        assert!((bottom_right.direction - expected).length() < 1e-5);
    }

    #[test]
    fn test_orientation_rotates_view() {
        // Yaw by 90 degrees about +z: the view axis -z stays put, image x
        // turns into world y.
        let q = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), q, 1.0, 10, 10);
        let ray = camera.ray(10, 5, Vec2::ZERO);
        let expected = Vec3::new(0.0, 1.0, -1.0).normalize();
        assert!((ray.direction - expected).length() < 1e-5);
    }

    #[test]
    fn test_look_at_centers_target() {
        let eye = Vec3::new(0.0, -5.0, 1.0);
        let camera = Camera::look_at(eye, Vec3::new(0.0, 0.0, 1.0), Vec3::Z, 0.5, 64, 48);
        let ray = camera.ray(32, 24, Vec2::ZERO);
        assert!((ray.direction - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_sample_ray_stays_in_pixel_footprint() {
        let camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, 1.0, 4, 4);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let ray = camera.sample_ray(3, 0, &mut rng);
            // Pixel (3, 0) covers dx in [0.5, 1], dy in [0.5, 1]
            let p = ray.direction / -ray.direction.z;
            assert!(p.x >= 0.5 - 1e-5 && p.x <= 1.0 + 1e-5);
            assert!(p.y >= 0.5 - 1e-5 && p.y <= 1.0 + 1e-5);
        }
    }
}
