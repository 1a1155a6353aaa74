//! Capacities, dispatch block sizes and numeric guards.
//!
//! Block sizes must agree between every pass that touches the same
//! buffer, so they live here rather than next to each kernel.

/// Maximum number of partial groups in the global AABB reduction.
/// Also caps the per-group lane count.
pub const REDUCE_PARTIAL_COUNT: usize = 128;

/// Lanes per workgroup for simple one-element-per-lane kernels.
pub const ELEMENT_BLOCK_SIZE: usize = 256;

/// Records per workgroup in the radix sort's local bucketing pass.
pub const SORT_BLOCK_SIZE: usize = 128;

/// Elements per workgroup in the Blelloch scan (two per lane).
pub const SCAN_BLOCK_SIZE: usize = 256;

/// Upper bound on scan recursion levels. `SCAN_BLOCK_SIZE^4` elements.
pub const MAX_SCAN_LEVELS: usize = 4;

/// Candidate pairs handled per narrow-phase workgroup.
pub const NARROW_BLOCK_SIZE: usize = 128;

/// Bits per axis in a 64-bit Morton code (3 × 21 = 63).
pub const MORTON_BITS_PER_AXIS: u32 = 21;

/// Radix digit width of the sorter.
pub const RADIX_BITS: u32 = 2;

/// Number of buckets per radix digit.
pub const RADIX_BUCKETS: usize = 1 << RADIX_BITS;

/// Minimum normalisation extent when mapping into the global bound.
pub const NORMALIZE_EPSILON: f32 = 1.0e-6;

/// Fixed traversal stack for broad-phase queries. Karras trees are at
/// most 96 levels deep (64 code bits + 32 index bits).
pub const MAX_TRAVERSAL_STACK: usize = 128;

/// Sentinel for "no node" in the flat LBVH arrays.
pub const INVALID_NODE: u32 = u32::MAX;

/// Default narrow-phase contact threshold (meters).
pub const DEFAULT_COLLISION_MINIMAL_DIST: f32 = 0.01;

/// Default capacity of the candidate and exact pair buffers.
pub const DEFAULT_MAX_COLLISION_PAIRS: u32 = 1 << 18;

/// Epsilon for degenerate triangle detection (squared area threshold).
pub const DEGENERATE_AREA_THRESHOLD: f32 = 1.0e-12;

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.81;

/// Default simulation timestep (seconds). 1/60th of a second.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;
