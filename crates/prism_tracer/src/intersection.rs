//! Intersection record and the trait implemented by every traceable shape.

use prism_math::{Ray, Vec4};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection (w = 1)
    pub point: Vec4,
    /// Unit surface normal (w = 0), always facing against the ray
    pub normal: Vec4,
}

impl Intersection {
    /// Create an intersection, orienting `outward_normal` against the ray.
    pub fn new(ray: &Ray, t: f32, point: Vec4, outward_normal: Vec4) -> Self {
        let mut hit = Self {
            t,
            point,
            normal: Vec4::ZERO,
        };
        hit.set_face_normal(ray, outward_normal);
        hit
    }

    /// Store the normal pointing against the ray direction.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec4) {
        let n = outward_normal.normalize_or_zero();
        self.normal = if ray.direction.dot(n) < 0.0 { n } else { -n };
    }

    /// True when this hit lies strictly nearer along the ray than `other`.
    #[inline]
    pub fn closer_than(&self, other: &Intersection) -> bool {
        self.t < other.t
    }
}

/// Trait for shapes that can be hit by rays.
pub trait Intersect: Send + Sync {
    /// Nearest intersection in front of the ray origin, if any.
    fn intersect(&self, ray: &Ray) -> Option<Intersection>;
}
