use prism_math::{point, Ray, Vec4};

use crate::intersection::{Intersect, Intersection};

/// A sphere defined by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec4,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec4, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Unit sphere at the origin.
    pub fn unit() -> Self {
        Self::new(point(0.0, 0.0, 0.0), 1.0)
    }
}

impl Intersect for Sphere {
    /// Expects a unit-length ray direction.
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let x0 = ray.origin - self.center;
        let b = x0.dot(ray.direction);
        let discriminant = b * b - x0.length_squared() + self.radius * self.radius;
        if discriminant < 0.0 {
            return None;
        }

        // Nearest root in front of the origin; rays starting inside hit the far side.
        let sqrtd = discriminant.sqrt();
        let near = -b - sqrtd;
        let far = -b + sqrtd;
        let t = if near >= 0.0 {
            near
        } else if far >= 0.0 {
            far
        } else {
            return None;
        };

        let p = ray.at(t);
        Some(Intersection::new(ray, t, p, p - self.center))
    }
}
