use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::{direction, point, Mat4Ext, Ray};

/// Camera for rasterised rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Create a new camera
    pub fn new(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        Self {
            eye,
            center,
            up,
            ..Default::default()
        }
    }

    /// Camera looking down the local -z axis of a world pose.
    pub fn from_pose(to_world: Mat4) -> Self {
        Self {
            eye: (to_world * point(0.0, 0.0, 0.0)).truncate(),
            center: (to_world * point(0.0, 0.0, -1.0)).truncate(),
            up: (to_world * direction(0.0, 1.0, 0.0)).truncate(),
            ..Default::default()
        }
    }

    /// Camera to world matrix (inverse of the view matrix).
    pub fn to_world(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    /// Horizontal opening angle in radians derived from `fovy` and `aspect`.
    pub fn horizontal_angle(&self) -> f32 {
        2.0 * ((self.fovy.to_radians() / 2.0).tan() * self.aspect).atan()
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::lookat(self.eye, self.center, self.up)
    }

    /// Get the projection matrix (camera → clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fovy, self.aspect, self.near, self.far)
    }

    /// Update aspect ratio (e.g., on window resize)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

/// Pinhole model used by the ray tracer.
///
/// The image plane sits at distance `(width / 2) / tan(alpha / 2)` in front of
/// the eye, looking down -z in camera space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeCamera {
    pub width: u32,
    pub height: u32,
    /// Horizontal opening angle in radians
    pub alpha: f32,
}

impl Default for PinholeCamera {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            alpha: std::f32::consts::FRAC_PI_3,
        }
    }
}

impl PinholeCamera {
    pub fn new(width: u32, height: u32, alpha: f32) -> Self {
        Self {
            width,
            height,
            alpha,
        }
    }

    /// Camera-space primary ray through pixel (x, y), origin at the eye.
    ///
    /// Pixel coordinates may be fractional.
    pub fn make_ray(&self, x: f32, y: f32) -> Ray {
        let width = self.width as f32;
        let height = self.height as f32;
        let dir = direction(
            x - (width - 1.0) / 2.0,
            (height - 1.0) / 2.0 - y,
            -(width / 2.0) / (self.alpha / 2.0).tan(),
        );
        Ray::new(point(0.0, 0.0, 0.0), dir.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.fovy, 60.0);
        assert_eq!(camera.aspect, 1.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 100.0);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

        let view = camera.view_matrix();
        // View matrix should translate camera to origin
        assert!(view.w_axis.z < 0.0);
    }

    #[test]
    fn test_aspect_update() {
        let mut camera = Camera::default();
        camera.set_aspect(16.0 / 9.0);
        assert_eq!(camera.aspect, 16.0 / 9.0);
        assert!(camera.projection_matrix().x_axis.x < camera.projection_matrix().y_axis.y);
    }

    #[test]
    fn test_from_pose_round_trip() {
        let pose = Mat4::from_translation(Vec3::new(0.0, 1.0, 10.0));
        let camera = Camera::from_pose(pose);

        assert_eq!(camera.eye, Vec3::new(0.0, 1.0, 10.0));
        assert_eq!(camera.center, Vec3::new(0.0, 1.0, 9.0));
        assert_eq!(camera.up, Vec3::Y);
        assert!(camera.to_world().abs_diff_eq(pose, 0.001));
    }

    #[test]
    fn test_horizontal_angle_square_viewport() {
        let camera = Camera::default();
        assert!((camera.horizontal_angle() - 60.0_f32.to_radians()).abs() < 0.001);
    }

    #[test]
    fn test_make_ray_center_pixel_looks_forward() {
        let camera = PinholeCamera::new(11, 11, std::f32::consts::FRAC_PI_2);
        let ray = camera.make_ray(5.0, 5.0);

        assert_eq!(ray.origin, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!((ray.direction - Vec4::new(0.0, 0.0, -1.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_make_ray_corner_orientation() {
        let camera = PinholeCamera::new(10, 10, std::f32::consts::FRAC_PI_3);
        let top_left = camera.make_ray(0.0, 0.0);

        // image y grows downward, camera y upward
        assert!(top_left.direction.x < 0.0);
        assert!(top_left.direction.y > 0.0);
        assert!(top_left.direction.z < 0.0);
        assert!((top_left.direction.length() - 1.0).abs() < 0.001);
        assert_eq!(top_left.direction.w, 0.0);
    }
}
