use crate::{Mat4, Vec4};

/// A ray in homogeneous space with origin (w = 1) and direction (w = 0).
///
/// Rays are generated in camera space by the pinhole model and moved between
/// world and object space with the cumulative transforms of the scene graph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec4,
    pub direction: Vec4,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec4, direction: Vec4) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec4 {
        self.origin + self.direction * t
    }

    /// Parameter at which this ray reaches `point`, assuming it lies on the ray.
    ///
    /// Divides the coordinate delta on the axis where the direction is largest,
    /// so the result stays stable when other components are near zero.
    pub fn parameter_of(&self, point: Vec4) -> f32 {
        let d = self.direction.truncate().abs();
        let axis = if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        };
        if self.direction[axis] == 0.0 {
            return 0.0;
        }
        (point[axis] - self.origin[axis]) / self.direction[axis]
    }

    /// Apply a matrix to origin and direction and renormalize the direction.
    ///
    /// Used to move a world ray into the local frame of a leaf. The parametric
    /// distance of the result is therefore measured in the target frame.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: *matrix * self.origin,
            direction: (*matrix * self.direction).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{direction, point, Vec3};

    #[test]
    fn test_ray_creation() {
        let ray = Ray::new(point(1.0, 2.0, 3.0), direction(0.0, 1.0, 0.0));
        assert_eq!(ray.origin, point(1.0, 2.0, 3.0));
        assert_eq!(ray.direction, direction(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(point(0.0, 0.0, 0.0), direction(1.0, 0.0, 0.0));

        assert_eq!(ray.at(0.0), point(0.0, 0.0, 0.0));
        assert_eq!(ray.at(2.0), point(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), point(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parameter_of_uses_dominant_axis() {
        let ray = Ray::new(point(1.0, 2.0, 3.0), direction(0.0, 0.0, -1.0));
        // x and y direction components are zero; z carries the parameter
        assert!((ray.parameter_of(ray.at(4.5)) - 4.5).abs() < 0.001);

        let diagonal = Ray::new(point(0.0, 0.0, 0.0), direction(0.6, -0.8, 0.0));
        assert!((diagonal.parameter_of(diagonal.at(2.0)) - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_ray_transformed_keeps_w() {
        let ray = Ray::new(point(0.0, 0.0, 5.0), direction(0.0, 0.0, -1.0));
        let m = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let moved = ray.transformed(&m);

        assert_eq!(moved.origin, point(1.0, 0.0, 5.0));
        assert_eq!(moved.direction, direction(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_ray_transformed_renormalizes() {
        let ray = Ray::new(point(0.0, 0.0, 0.0), direction(1.0, 0.0, 0.0));
        let m = Mat4::from_scale(Vec3::new(0.5, 1.0, 1.0));
        let moved = ray.transformed(&m);

        assert!((moved.direction.length() - 1.0).abs() < 0.001);
    }
}
