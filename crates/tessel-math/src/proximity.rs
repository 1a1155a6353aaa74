//! Point–triangle proximity.
//!
//! Closest-point query following the Voronoi-region walk in
//! Ericson, *Real-Time Collision Detection*, §5.1.5: the result may lie
//! on the triangle interior, on an edge, or on a corner.

use glam::Vec3;
use tessel_types::constants::DEGENERATE_AREA_THRESHOLD;

/// Closest point on a triangle together with its barycentric weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleProjection {
    /// Closest point on the triangle.
    pub point: Vec3,
    /// Weights of `(a, b, c)`; non-negative and summing to one.
    pub barycentric: [f32; 3],
}

impl TriangleProjection {
    /// Distance from `p` to the projected point.
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        (p - self.point).length()
    }
}

/// Returns the closest point to `p` on triangle `(a, b, c)`.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> TriangleProjection {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return corner(a, 0);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return corner(b, 1);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return TriangleProjection {
            point: a + ab * v,
            barycentric: [1.0 - v, v, 0.0],
        };
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return corner(c, 2);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return TriangleProjection {
            point: a + ac * w,
            barycentric: [1.0 - w, 0.0, w],
        };
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return TriangleProjection {
            point: b + (c - b) * w,
            barycentric: [0.0, 1.0 - w, w],
        };
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    TriangleProjection {
        point: a + ab * v + ac * w,
        barycentric: [1.0 - v - w, v, w],
    }
}

fn corner(point: Vec3, which: usize) -> TriangleProjection {
    let mut barycentric = [0.0; 3];
    barycentric[which] = 1.0;
    TriangleProjection { point, barycentric }
}

/// Unit normal of `(a, b, c)`, or `None` for a degenerate triangle.
#[inline]
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let n = (b - a).cross(c - a);
    let len_sq = n.length_squared();
    if len_sq < DEGENERATE_AREA_THRESHOLD {
        return None;
    }
    Some(n / len_sq.sqrt())
}
