// Re-export glam for convenience
pub use glam::*;

// Prism math types
mod camera;
mod ray;
mod transform;

pub use camera::{Camera, PinholeCamera};
pub use ray::Ray;
pub use transform::{Mat4Ext, Transformation, Vec4Ext};

/// Tolerance used when comparing a transformation against its maintained inverse.
pub const CONSISTENCY_EPSILON: f32 = 1e-3;

/// Homogeneous point (w = 1).
#[inline]
pub fn point(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4::new(x, y, z, 1.0)
}

/// Homogeneous direction (w = 0).
#[inline]
pub fn direction(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4::new(x, y, z, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_and_direction() {
        let p = point(1.0, 2.0, 3.0);
        let d = direction(1.0, 2.0, 3.0);
        assert_eq!(p.w, 1.0);
        assert_eq!(d.w, 0.0);
        assert_eq!(p - d, Vec4::W);
    }

    #[test]
    fn test_vec4_operations() {
        let a = point(1.0, 2.0, 3.0);
        let b = direction(4.0, 5.0, 6.0);
        assert_eq!(a + b, point(5.0, 7.0, 9.0));
        assert_eq!(b * 2.0, direction(8.0, 10.0, 12.0));
        // dot product includes w
        assert_eq!(a.dot(a), 15.0);
    }

    #[test]
    fn test_normalize_uses_all_components() {
        // Length over four components is 2, so w is scaled too
        let v = Vec4::new(1.0, 1.0, 1.0, 1.0).normalize();
        assert!((v.x - 0.5).abs() < 0.001);
        assert!((v.w - 0.5).abs() < 0.001);
        assert!((v.length() - 1.0).abs() < 0.001);
    }
}
