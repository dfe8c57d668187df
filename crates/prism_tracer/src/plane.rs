//! Plane through three points and convex polygon containment.

use prism_math::{Ray, Vec4, Vec4Ext};

use crate::intersection::{Intersect, Intersection};

/// Distance from an edge within which a point still counts as on the polygon.
pub const EDGE_EPSILON: f32 = 1e-5;

/// Plane spanned by three support points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    support: Vec4,
    /// Unnormalized `(a - b) x (c - b)`, zero for collinear points
    normal: Vec4,
}

impl Plane {
    pub fn new(a: Vec4, b: Vec4, c: Vec4) -> Self {
        Self {
            support: a,
            normal: (a - b).cross3(c - b),
        }
    }

    /// Raw normal as given by the winding of the support points.
    #[inline]
    pub fn normal(&self) -> Vec4 {
        self.normal
    }

    /// Whether the support points were collinear.
    pub fn is_degenerate(&self) -> bool {
        self.normal.length_squared() == 0.0
    }

    /// Test whether `point` (assumed to lie in the plane) is inside the convex
    /// polygon `vertices`.
    ///
    /// For each cyclic edge the side of the point is its signed distance to
    /// the edge line, measured along `(start - end) x normal`. The point is
    /// inside when no edge puts it further than [`EDGE_EPSILON`] on the other
    /// side from the rest, so points on an edge count as inside. Vertices must
    /// share one winding order.
    pub fn is_inside(&self, vertices: &[Vec4], point: Vec4) -> bool {
        if vertices.is_empty() {
            return false;
        }
        let count = vertices.len();
        let distance = |i: usize| {
            let start = vertices[i];
            let outward = (start - vertices[(i + 1) % count]).cross3(self.normal);
            let length = outward.length();
            if length == 0.0 {
                0.0
            } else {
                (point - start).dot(outward) / length
            }
        };

        let (mut positive, mut negative) = (true, true);
        for i in 0..count {
            let d = distance(i);
            positive &= d >= -EDGE_EPSILON;
            negative &= d <= EDGE_EPSILON;
        }
        positive || negative
    }
}

impl Intersect for Plane {
    fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        if self.is_degenerate() {
            return None;
        }
        let denominator = self.normal.dot(ray.direction);
        if denominator == 0.0 {
            return None;
        }
        let t = self.normal.dot(self.support - ray.origin) / denominator;
        // Hits behind or exactly at the origin are misses.
        if t <= 0.0 {
            return None;
        }
        Some(Intersection::new(ray, t, ray.at(t), self.normal))
    }
}

/// True when every corner of a planar polygon turns the same way.
pub fn has_consistent_winding(vertices: &[Vec4]) -> bool {
    let count = vertices.len();
    if count < 3 {
        return false;
    }
    let turn = |i: usize| {
        let a = vertices[i];
        let b = vertices[(i + 1) % count];
        let c = vertices[(i + 2) % count];
        (b - a).cross3(c - b)
    };
    let reference = turn(0);
    (1..count).all(|i| turn(i).dot(reference) > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::{direction, point};

    fn floor() -> Plane {
        Plane::new(point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(1.0, 0.0, 1.0))
    }

    #[test]
    fn test_plane_hit() {
        let ray = Ray::new(point(0.5, 2.0, 0.5), direction(0.0, -1.0, 0.0));
        let hit = floor().intersect(&ray).unwrap();

        assert!((hit.t - 2.0).abs() < 0.001);
        assert!((hit.point - point(0.5, 0.0, 0.5)).length() < 0.001);
        // normal faces back toward the ray origin
        assert!((hit.normal - direction(0.0, 1.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_plane_parallel_ray_misses() {
        let ray = Ray::new(point(0.0, 1.0, 0.0), direction(1.0, 0.0, 0.0));
        assert!(floor().intersect(&ray).is_none());
    }

    #[test]
    fn test_plane_behind_origin_misses() {
        let ray = Ray::new(point(0.0, 1.0, 0.0), direction(0.0, 1.0, 0.0));
        assert!(floor().intersect(&ray).is_none());
    }

    #[test]
    fn test_plane_hit_at_origin_is_miss() {
        let ray = Ray::new(point(0.3, 0.0, 0.3), direction(0.0, -1.0, 0.0));
        assert!(floor().intersect(&ray).is_none());
    }

    #[test]
    fn test_degenerate_plane_misses() {
        let plane = Plane::new(point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(2.0, 0.0, 0.0));
        assert!(plane.is_degenerate());

        let ray = Ray::new(point(0.0, 1.0, 0.0), direction(0.0, -1.0, 0.0));
        assert!(plane.intersect(&ray).is_none());
    }

    #[test]
    fn test_is_inside_square() {
        let square = [
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(1.0, 0.0, 1.0),
            point(0.0, 0.0, 1.0),
        ];
        let plane = Plane::new(square[0], square[1], square[2]);

        assert!(plane.is_inside(&square, point(0.5, 0.0, 0.5)));
        assert!(!plane.is_inside(&square, point(1.5, 0.0, 0.5)));
        assert!(!plane.is_inside(&square, point(-0.1, 0.0, 0.9)));
    }

    #[test]
    fn test_is_inside_triangle_either_winding() {
        let ccw = [point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(0.0, 1.0, 0.0)];
        let cw = [ccw[0], ccw[2], ccw[1]];

        for tri in [ccw, cw] {
            let plane = Plane::new(tri[0], tri[1], tri[2]);
            assert!(plane.is_inside(&tri, point(0.2, 0.2, 0.0)));
            assert!(!plane.is_inside(&tri, point(0.8, 0.8, 0.0)));
        }
    }

    #[test]
    fn test_is_inside_includes_edges() {
        let tri = [point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(0.0, 1.0, 0.0)];
        let plane = Plane::new(tri[0], tri[1], tri[2]);

        // on the hypotenuse, on a leg and at a corner
        assert!(plane.is_inside(&tri, point(0.5, 0.5, 0.0)));
        assert!(plane.is_inside(&tri, point(0.3, 0.0, 0.0)));
        assert!(plane.is_inside(&tri, point(0.0, 0.0, 0.0)));
        assert!(!plane.is_inside(&tri, point(0.51, 0.51, 0.0)));
        assert!(!plane.is_inside(&tri, point(0.3, -0.01, 0.0)));
    }

    #[test]
    fn test_winding_check() {
        let square = [
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(1.0, 1.0, 0.0),
            point(0.0, 1.0, 0.0),
        ];
        assert!(has_consistent_winding(&square));

        let bow_tie = [square[0], square[2], square[1], square[3]];
        assert!(!has_consistent_winding(&bow_tie));
    }
}
