// Transform utilities for Mat4 and Vec4
//
// Extends glam with the GL-style factories used by the scene graph and a
// Transformation type that carries its inverse alongside the forward matrix.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::CONSISTENCY_EPSILON;

/// Extension trait for Mat4 with the factories the renderers need.
pub trait Mat4Ext {
    /// Rotation about `axis` by `angle` radians.
    ///
    /// The principal axes use the exact single-axis matrices; any other axis is
    /// normalized and rotated about (Rodrigues). A zero axis yields identity.
    fn rotation(axis: Vec3, angle: f32) -> Mat4;

    /// OpenGL-style projection normalisation for an off-center view volume.
    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Symmetric perspective projection. `fovy` is in degrees.
    fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// View matrix looking from `eye` toward `center`.
    fn lookat(eye: Vec3, center: Vec3, up: Vec3) -> Mat4;

    /// Normal matrix from an inverse model matrix.
    ///
    /// Transposes `self`, zeroes the translation row and column and sets [3][3] to 1.
    fn normal_matrix(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation(axis: Vec3, angle: f32) -> Mat4 {
        if axis == Vec3::X {
            Mat4::from_rotation_x(angle)
        } else if axis == Vec3::Y {
            Mat4::from_rotation_y(angle)
        } else if axis == Vec3::Z {
            Mat4::from_rotation_z(angle)
        } else {
            match axis.try_normalize() {
                Some(unit) => Mat4::from_axis_angle(unit, angle),
                None => Mat4::IDENTITY,
            }
        }
    }

    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;
        Mat4::from_cols(
            Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
            Vec4::new(
                (right + left) / width,
                (top + bottom) / height,
                -(far + near) / depth,
                -1.0,
            ),
            Vec4::new(0.0, 0.0, -(2.0 * far * near) / depth, 0.0),
        )
    }

    fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let top = near * (fovy * std::f32::consts::PI / 360.0).tan();
        let right = top * aspect;
        Mat4::frustum(-right, right, -top, top, near, far)
    }

    fn lookat(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(eye, center, up)
    }

    fn normal_matrix(&self) -> Mat4 {
        let mut normal = self.transpose();
        normal.x_axis.w = 0.0;
        normal.y_axis.w = 0.0;
        normal.z_axis.w = 0.0;
        normal.w_axis = Vec4::W;
        normal
    }
}

/// Extension trait for Vec4 in homogeneous coordinates.
pub trait Vec4Ext {
    /// Cross product of the xyz parts. The result is a direction (w = 0).
    fn cross3(self, other: Vec4) -> Vec4;
}

impl Vec4Ext for Vec4 {
    fn cross3(self, other: Vec4) -> Vec4 {
        self.truncate().cross(other.truncate()).extend(0.0)
    }
}

/// A forward matrix paired with its inverse.
///
/// The inverse is never obtained by general inversion. Every factory builds
/// the exact inverse of its delta and `compose` multiplies both sides, so
/// `matrix * inverse` stays at identity up to float rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    matrix: Mat4,
    inverse: Mat4,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transformation {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
    };

    pub fn translation(offset: Vec3) -> Self {
        Self {
            matrix: Mat4::from_translation(offset),
            inverse: Mat4::from_translation(-offset),
        }
    }

    pub fn rotation(axis: Vec3, angle: f32) -> Self {
        Self {
            matrix: Mat4::rotation(axis, angle),
            inverse: Mat4::rotation(axis, -angle),
        }
    }

    /// Per-axis scaling. Every factor must be non-zero.
    pub fn scaling(factors: Vec3) -> Self {
        debug_assert!(
            factors.x != 0.0 && factors.y != 0.0 && factors.z != 0.0,
            "scaling by zero has no inverse"
        );
        Self {
            matrix: Mat4::from_scale(factors),
            inverse: Mat4::from_scale(factors.recip()),
        }
    }

    /// General transformation from a matrix and its known inverse.
    pub fn from_parts(matrix: Mat4, inverse: Mat4) -> Self {
        Self { matrix, inverse }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    #[inline]
    pub fn inverse(&self) -> Mat4 {
        self.inverse
    }

    /// Compose `delta` after the current transform in local space.
    ///
    /// `matrix' = matrix * delta`, `inverse' = delta_inverse * inverse`.
    pub fn compose(&mut self, delta: &Transformation) {
        self.matrix *= delta.matrix;
        self.inverse = delta.inverse * self.inverse;
    }

    /// By-value form of [`Transformation::compose`].
    pub fn then(mut self, delta: &Transformation) -> Self {
        self.compose(delta);
        self
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.compose(&Transformation::translation(offset));
    }

    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.compose(&Transformation::rotation(axis, angle));
    }

    pub fn scale(&mut self, factors: Vec3) {
        self.compose(&Transformation::scaling(factors));
    }

    /// True when `matrix * inverse` is identity within `epsilon` per entry.
    pub fn is_consistent(&self, epsilon: f32) -> bool {
        (self.matrix * self.inverse).abs_diff_eq(Mat4::IDENTITY, epsilon)
    }

    /// Debug-build check of the inverse invariant. No-op in release.
    #[inline]
    pub fn debug_check(&self) {
        debug_assert!(
            self.is_consistent(CONSISTENCY_EPSILON),
            "transformation drifted from its inverse: {:?}",
            self.matrix * self.inverse
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::PI;

    #[test]
    fn test_rotation_x_matches_single_axis_layout() {
        let angle = 0.3_f32;
        let m = Mat4::rotation(Vec3::X, angle);
        // row 1, col 2 is -sin; row 2, col 1 is sin
        assert!((m.col(2).y + angle.sin()).abs() < 0.001);
        assert!((m.col(1).z - angle.sin()).abs() < 0.001);
        assert!((m.col(1).y - angle.cos()).abs() < 0.001);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let m = Mat4::rotation(Vec3::Z, PI / 2.0);
        let v = m * Vec4::new(1.0, 0.0, 0.0, 0.0);

        assert!((v.x - 0.0).abs() < 0.001);
        assert!((v.y - 1.0).abs() < 0.001);
        assert!((v.z - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_rotation_arbitrary_axis_keeps_axis_fixed() {
        let axis = Vec3::new(1.0, 1.0, 0.0);
        let m = Mat4::rotation(axis, 1.2);
        let v = m * axis.extend(0.0);

        assert!((v.truncate() - axis).length() < 0.001);
    }

    #[test]
    fn test_rotation_zero_axis_is_identity() {
        assert_eq!(Mat4::rotation(Vec3::ZERO, 1.0), Mat4::IDENTITY);
    }

    #[test]
    fn test_perspective_matches_gl_projection() {
        let ours = Mat4::perspective(60.0, 1.5, 0.1, 100.0);
        let gl = Mat4::perspective_rh_gl(60.0_f32.to_radians(), 1.5, 0.1, 100.0);
        assert!(ours.abs_diff_eq(gl, 0.001));
    }

    #[test]
    fn test_frustum_maps_near_plane_to_minus_one() {
        let m = Mat4::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let clip = m * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert!((clip.z / clip.w + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_lookat_moves_eye_to_origin() {
        let view = Mat4::lookat(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let eye = view * Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert!(eye.truncate().length() < 0.001);
        // looking down -z
        let target = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((target.z + 5.0).abs() < 0.001);
    }

    #[test]
    fn test_normal_matrix_drops_translation() {
        let t = Transformation::translation(Vec3::new(3.0, 4.0, 5.0))
            .then(&Transformation::scaling(Vec3::new(2.0, 1.0, 1.0)));
        let n = t.inverse().normal_matrix();

        assert_eq!(n.w_axis, Vec4::W);
        assert_eq!(n.row(3), Vec4::W);
        let normal = n * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!((normal.x - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_cross3_sets_w_zero() {
        let a = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let b = Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert_eq!(a.cross3(b), Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn test_factories_are_consistent() {
        assert!(Transformation::translation(Vec3::new(1.0, -2.0, 3.0)).is_consistent(1e-5));
        assert!(Transformation::rotation(Vec3::Y, 0.7).is_consistent(1e-5));
        assert!(Transformation::rotation(Vec3::new(1.0, 2.0, 3.0), 0.7).is_consistent(1e-5));
        assert!(Transformation::scaling(Vec3::new(2.0, 0.5, 4.0)).is_consistent(1e-5));
    }

    #[test]
    fn test_compose_order() {
        // Translate then scale in local space: the scale applies first to points
        let t = Transformation::translation(Vec3::new(1.0, 0.0, 0.0))
            .then(&Transformation::scaling(Vec3::splat(2.0)));
        let p = t.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 0.001);

        let back = t.inverse() * p;
        assert!((back.x - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_random_compose_sequences_stay_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        let axes = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, 1.0, 1.0)];

        for _ in 0..20 {
            let mut t = Transformation::IDENTITY;
            for _ in 0..50 {
                match rng.gen_range(0..3) {
                    0 => t.translate(Vec3::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    )),
                    1 => {
                        let axis = axes[rng.gen_range(0..axes.len())];
                        t.rotate(axis, rng.gen_range(-PI..PI));
                    }
                    _ => t.scale(Vec3::new(
                        rng.gen_range(0.9..1.1),
                        rng.gen_range(0.9..1.1),
                        rng.gen_range(0.9..1.1),
                    )),
                }
            }
            assert!(t.is_consistent(CONSISTENCY_EPSILON));
            t.debug_check();
        }
    }
}
