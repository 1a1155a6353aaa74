//! Integration tests for tessel-math.

use approx::assert_relative_eq;
use proptest::prelude::*;
use tessel_math::morton::{code_in_bound, encode, normalize};
use tessel_math::proximity::{closest_point_on_triangle, triangle_normal};
use tessel_math::{Aabb, Vec3};

// ─── Aabb Tests ───────────────────────────────────────────────

#[test]
fn triangle_box_contains_corners() {
    let a = Vec3::new(0.0, -1.0, 2.0);
    let b = Vec3::new(3.0, 0.5, -2.0);
    let c = Vec3::new(-1.0, 4.0, 0.0);
    let bb = Aabb::from_triangle(a, b, c);
    assert!(bb.contains_point(a));
    assert!(bb.contains_point(b));
    assert!(bb.contains_point(c));
    assert_eq!(bb.lower, Vec3::new(-1.0, -1.0, -2.0));
    assert_eq!(bb.upper, Vec3::new(3.0, 4.0, 2.0));
}

#[test]
fn merge_is_commutative() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let b = Aabb::new(Vec3::splat(-2.0), Vec3::splat(0.5));
    assert_eq!(a.merge(&b), b.merge(&a));
    assert_eq!(a.merge(&b), Aabb::new(Vec3::splat(-2.0), Vec3::ONE));
}

#[test]
fn overlap_is_closed() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let touching = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    let apart = Aabb::new(Vec3::new(1.01, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    assert!(a.overlaps(&touching));
    assert!(!a.overlaps(&apart));
}

#[test]
fn inflate_creates_overlap() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let b = Aabb::new(Vec3::new(1.05, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    assert!(!a.overlaps(&b));
    assert!(a.inflate(0.05).overlaps(&b.inflate(0.05)));
}

#[test]
fn aabb_serializes() {
    let a = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
    let json = serde_json::to_string(&a).unwrap();
    let back: Aabb = serde_json::from_str(&json).unwrap();
    assert_eq!(a, back);
}

// ─── Morton Tests ─────────────────────────────────────────────

#[test]
fn degenerate_bound_does_not_produce_nan() {
    let p = Vec3::new(2.0, 2.0, 2.0);
    let bound = Aabb::from_point(p);
    let n = normalize(p, &bound);
    assert!(n.is_finite());
    assert_eq!(code_in_bound(p, &bound), 0);
}

#[test]
fn codes_are_deterministic() {
    let bound = Aabb::new(Vec3::splat(-3.0), Vec3::splat(7.0));
    let p = Vec3::new(0.123, 4.56, -2.2);
    assert_eq!(code_in_bound(p, &bound), code_in_bound(p, &bound));
}

#[test]
fn nearby_points_share_prefix() {
    let bound = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let a = code_in_bound(Vec3::new(0.5001, 0.5001, 0.5001), &bound);
    let b = code_in_bound(Vec3::new(0.5002, 0.5002, 0.5002), &bound);
    let far = code_in_bound(Vec3::new(0.01, 0.9, 0.2), &bound);
    assert!((a ^ b).leading_zeros() > (a ^ far).leading_zeros());
}

proptest! {
    #[test]
    fn encode_is_monotone_per_axis(x in 0u32..(1 << 20), y in 0u32..(1 << 21), z in 0u32..(1 << 21)) {
        prop_assert!(encode(x + 1, y, z) > encode(x, y, z));
    }

    #[test]
    fn points_inside_bound_normalise_to_unit_cube(
        px in -10.0f32..10.0, py in -10.0f32..10.0, pz in -10.0f32..10.0,
    ) {
        let bound = Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        let n = normalize(Vec3::new(px, py, pz), &bound);
        prop_assert!(n.cmpge(Vec3::ZERO).all() && n.cmple(Vec3::ONE).all());
    }
}

// ─── Proximity Tests ──────────────────────────────────────────

fn unit_triangle() -> (Vec3, Vec3, Vec3) {
    (Vec3::ZERO, Vec3::X, Vec3::Y)
}

#[test]
fn interior_projection_hits_plane() {
    let (a, b, c) = unit_triangle();
    let p = Vec3::new(0.25, 0.25, 0.3);
    let proj = closest_point_on_triangle(p, a, b, c);
    assert_relative_eq!(proj.point.z, 0.0);
    assert_relative_eq!(proj.distance(p), 0.3, epsilon = 1e-6);
    let sum: f32 = proj.barycentric.iter().sum();
    assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
}

#[test]
fn edge_region_projection() {
    let (a, b, c) = unit_triangle();
    let p = Vec3::new(0.5, -1.0, 0.0);
    let proj = closest_point_on_triangle(p, a, b, c);
    assert_relative_eq!(proj.point.x, 0.5, epsilon = 1e-6);
    assert_relative_eq!(proj.point.y, 0.0, epsilon = 1e-6);
    assert_eq!(proj.barycentric[2], 0.0);
}

#[test]
fn corner_region_projection() {
    let (a, b, c) = unit_triangle();
    let proj = closest_point_on_triangle(Vec3::new(2.0, -1.0, 0.0), a, b, c);
    assert_eq!(proj.point, b);
    assert_eq!(proj.barycentric, [0.0, 1.0, 0.0]);
}

#[test]
fn normal_of_degenerate_triangle_is_none() {
    assert!(triangle_normal(Vec3::ZERO, Vec3::ZERO, Vec3::X).is_none());
    let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
    assert_relative_eq!(n.z, 1.0);
}
