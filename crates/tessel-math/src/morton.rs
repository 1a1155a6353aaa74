//! 64-bit Morton (Z-order) codes.
//!
//! Each axis is quantised to [`MORTON_BITS_PER_AXIS`] bits and the three
//! integers are bit-interleaved as `..x2y2z2 x1y1z1 x0y0z0`, so codes of
//! nearby positions share long common prefixes.

use glam::Vec3;
use tessel_types::constants::{MORTON_BITS_PER_AXIS, NORMALIZE_EPSILON};

use crate::aabb::Aabb;

/// Largest quantised coordinate on one axis.
pub const MORTON_AXIS_MAX: u32 = (1 << MORTON_BITS_PER_AXIS) - 1;

/// Spreads the low 21 bits of `v` so that two zero bits follow each bit.
#[inline]
pub fn expand_bits(v: u32) -> u64 {
    let mut x = u64::from(v) & 0x1f_ffff;
    x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
    x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
    x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

/// Interleaves three quantised coordinates into one code.
#[inline]
pub fn encode(x: u32, y: u32, z: u32) -> u64 {
    (expand_bits(x) << 2) | (expand_bits(y) << 1) | expand_bits(z)
}

/// Maps `p` into `[0, 1]^3` relative to `bound`.
///
/// Zero-extent axes use [`NORMALIZE_EPSILON`] as the denominator so a
/// degenerate bound never divides by zero.
#[inline]
pub fn normalize(p: Vec3, bound: &Aabb) -> Vec3 {
    let extent = bound.extent().max(Vec3::splat(NORMALIZE_EPSILON));
    ((p - bound.lower) / extent).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Quantises a unit-cube coordinate to the Morton grid.
#[inline]
fn quantize(t: f32) -> u32 {
    // `as` saturates and maps NaN to 0, so the result is always in range.
    ((t * MORTON_AXIS_MAX as f32) as u32).min(MORTON_AXIS_MAX)
}

/// Morton code of `p` inside `bound`.
#[inline]
pub fn code_in_bound(p: Vec3, bound: &Aabb) -> u64 {
    let n = normalize(p, bound);
    encode(quantize(n.x), quantize(n.y), quantize(n.z))
}
