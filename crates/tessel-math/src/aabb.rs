//! Axis-aligned bounding boxes.
//!
//! Device buffers store a box as six consecutive `f32` lanes
//! `[lx, ly, lz, ux, uy, uz]`; [`Aabb::to_lanes`] and
//! [`Aabb::from_lanes`] convert between the two forms.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of `f32` lanes one box occupies in a storage buffer.
pub const AABB_LANES: usize = 6;

/// Axis-aligned bounding box `{lower, upper}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Aabb {
    /// The identity element of [`Aabb::merge`]: contains nothing.
    pub const EMPTY: Self = Self {
        lower: Vec3::splat(f32::INFINITY),
        upper: Vec3::splat(f32::NEG_INFINITY),
    };

    #[inline]
    pub fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    /// Degenerate box around a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { lower: p, upper: p }
    }

    /// Tight box around the three corners of a triangle.
    #[inline]
    pub fn from_triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            lower: a.min(b).min(c),
            upper: a.max(b).max(c),
        }
    }

    /// `{min(a.lower, b.lower), max(a.upper, b.upper)}`.
    ///
    /// Associative and commutative, so reduction order never matters.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// Grows the box by `margin` on every side.
    #[inline]
    pub fn inflate(&self, margin: f32) -> Aabb {
        Aabb {
            lower: self.lower - Vec3::splat(margin),
            upper: self.upper + Vec3::splat(margin),
        }
    }

    /// Closed-interval overlap test (touching boxes overlap).
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && self.upper.x >= other.lower.x
            && self.lower.y <= other.upper.y
            && self.upper.y >= other.lower.y
            && self.lower.z <= other.upper.z
            && self.upper.z >= other.lower.z
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.lower).all() && p.cmple(self.upper).all()
    }

    /// True if `other` lies entirely inside this box.
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        other.lower.cmpge(self.lower).all() && other.upper.cmple(self.upper).all()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.lower + self.upper) * 0.5
    }

    /// Per-axis size. Negative on an empty box.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.lower.cmpgt(self.upper).any()
    }

    pub fn is_finite(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    #[inline]
    pub fn to_lanes(&self) -> [f32; AABB_LANES] {
        [
            self.lower.x,
            self.lower.y,
            self.lower.z,
            self.upper.x,
            self.upper.y,
            self.upper.z,
        ]
    }

    #[inline]
    pub fn from_lanes(lanes: [f32; AABB_LANES]) -> Self {
        Self {
            lower: Vec3::new(lanes[0], lanes[1], lanes[2]),
            upper: Vec3::new(lanes[3], lanes[4], lanes[5]),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
