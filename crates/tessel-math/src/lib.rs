//! # tessel-math
//!
//! Geometric primitives for the tessel collision core.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, etc.)
//! - [`Aabb`]: axis-aligned bounding box with merge/overlap/inflate
//! - 64-bit Morton encoding of positions normalised into a bound
//! - Closest point on a triangle (plane interior, edges, corners)

pub mod aabb;
pub mod morton;
pub mod proximity;

pub use aabb::Aabb;

// Re-export glam types as the canonical math types for tessel.
pub use glam::{Vec2, Vec3, Vec4};
