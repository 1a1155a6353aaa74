//! Integration tests for tessel-types.

use tessel_types::constants::{
    DEFAULT_MAX_COLLISION_PAIRS, MORTON_BITS_PER_AXIS, RADIX_BITS, RADIX_BUCKETS, SCAN_BLOCK_SIZE,
    SORT_BLOCK_SIZE,
};
use tessel_types::TesselError;

// ─── Constant Tests ───────────────────────────────────────────

#[test]
fn block_sizes_are_powers_of_two() {
    assert!(SORT_BLOCK_SIZE.is_power_of_two());
    assert!(SCAN_BLOCK_SIZE.is_power_of_two());
    assert_eq!(RADIX_BUCKETS, 1 << RADIX_BITS);
}

#[test]
fn morton_code_fits_in_u64() {
    assert!(3 * MORTON_BITS_PER_AXIS <= 64);
}

#[test]
fn default_pair_capacity_is_a_u32_count() {
    let capacity: u32 = DEFAULT_MAX_COLLISION_PAIRS;
    assert!(capacity.is_power_of_two());
    assert_eq!(capacity, 1 << 18);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = TesselError::InvalidMesh("index 9 out of range".into());
    assert!(err.to_string().contains("index 9"));
}

#[test]
fn sort_scratch_display() {
    let err = TesselError::SortScratchTooSmall {
        required: 1024,
        available: 512,
    };
    let msg = err.to_string();
    assert!(msg.contains("1024"));
    assert!(msg.contains("512"));
}

#[test]
fn barrier_mismatch_display() {
    let err = TesselError::BarrierMismatch {
        expected: 3,
        observed: 2,
    };
    assert!(err.to_string().contains("expected ticket 3"));
}
