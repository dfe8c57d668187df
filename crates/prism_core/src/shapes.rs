//! Corner layouts of the built-in polygonal shapes.
//!
//! The tracer intersects these faces and the rasteriser triangulates them, so
//! both see the same geometry.

use prism_math::{point, Vec3, Vec4};

/// Corners per box face.
pub const BOX_STRIDE: usize = 4;

/// Indices of the six box quads into [`aabox_corners`].
pub const BOX_INDICES: [u32; 24] = [
    0, 1, 2, 3, // front
    1, 5, 6, 2, // right
    4, 0, 3, 7, // left
    3, 2, 6, 7, // top
    5, 4, 7, 6, // back
    0, 4, 5, 1, // bottom
];

/// Corners per pyramid face.
pub const PYRAMID_STRIDE: usize = 3;

/// Two base triangles followed by four sides, into [`unit_pyramid_corners`].
pub const PYRAMID_INDICES: [u32; 18] = [0, 2, 1, 0, 3, 2, 0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4];

/// A point strictly inside the unit pyramid.
pub const PYRAMID_INTERIOR: Vec3 = Vec3::new(0.0, 0.25, 0.0);

/// Corners of the axis-aligned box between `min` and `max`, front face first.
pub fn aabox_corners(min: Vec3, max: Vec3) -> [Vec4; 8] {
    [
        point(min.x, min.y, max.z),
        point(max.x, min.y, max.z),
        point(max.x, max.y, max.z),
        point(min.x, max.y, max.z),
        point(min.x, min.y, min.z),
        point(max.x, min.y, min.z),
        point(max.x, max.y, min.z),
        point(min.x, max.y, min.z),
    ]
}

/// Corners of the box spanning -0.5..0.5 on every axis.
pub fn unit_aabox_corners() -> [Vec4; 8] {
    aabox_corners(Vec3::splat(-0.5), Vec3::splat(0.5))
}

/// Square base of side 1 on y = 0, then the apex at (0, 1, 0).
pub fn unit_pyramid_corners() -> [Vec4; 5] {
    [
        point(-0.5, 0.0, 0.5),
        point(0.5, 0.0, 0.5),
        point(0.5, 0.0, -0.5),
        point(-0.5, 0.0, -0.5),
        point(0.0, 1.0, 0.0),
    ]
}
