//! Phong reflection model used by the ray tracer.

use prism_core::PhongValues;
use prism_math::{Vec3, Vec4};

use crate::intersection::Intersection;

/// Colour of every point light.
pub const LIGHT_COLOR: Vec3 = Vec3::new(0.8, 0.8, 0.8);

/// Shade a surface point lit by point lights.
///
/// The ambient term takes the surface colour; diffuse and specular terms sum
/// the light colour over all lights. Without lights only the ambient term
/// remains.
pub fn phong(
    color: Vec3,
    hit: &Intersection,
    lights: &[Vec4],
    values: &PhongValues,
    camera_position: Vec4,
) -> Vec3 {
    let n = hit.normal.truncate();
    let p = hit.point.truncate();
    let v = (camera_position.truncate() - p).normalize_or_zero();

    let mut diffuse = Vec3::ZERO;
    let mut specular = Vec3::ZERO;
    for light in lights {
        let s = (light.truncate() - p).normalize_or_zero();
        let r = n * (2.0 * s.dot(n)) - s;
        diffuse += LIGHT_COLOR * n.dot(s).max(0.0);
        specular += LIGHT_COLOR * r.dot(v).max(0.0).powf(values.shininess);
    }

    color * values.ambient + diffuse * values.diffuse + specular * values.specular
}
