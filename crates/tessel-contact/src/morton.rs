//! Morton indexing of triangle centroids.
//!
//! Emits the `(code, triangle)` records the radix sorter orders. The
//! global bound is read back before this dispatch is recorded, so it is
//! captured by value.

use tessel_gpu::{group_count, CommandList, StorageBuffer};
use tessel_math::{morton, Aabb};
use tessel_types::constants::ELEMENT_BLOCK_SIZE;

use crate::device_mesh::DeviceMesh;

/// Computes one Morton code per triangle.
pub struct MortonIndexer;

impl MortonIndexer {
    /// Records `morton_codes` over every triangle of `mesh`.
    ///
    /// Writes `keys[t] = code(centroid(t))` and `values[t] = t`.
    pub fn record<'a>(
        list: &mut CommandList<'a>,
        mesh: &'a DeviceMesh,
        bound: Aabb,
        keys: &'a StorageBuffer<u64>,
        values: &'a StorageBuffer<u32>,
    ) {
        let n = mesh.triangle_count();
        list.dispatch(
            "morton_codes",
            group_count(n, ELEMENT_BLOCK_SIZE),
            move |group| {
                let start = group as usize * ELEMENT_BLOCK_SIZE;
                for t in start..(start + ELEMENT_BLOCK_SIZE).min(n) {
                    let [a, b, c] = mesh.corners(t as u32);
                    let centroid = (a + b + c) / 3.0;
                    keys.store(t, morton::code_in_bound(centroid, &bound));
                    values.store(t, t as u32);
                }
            },
        );
    }
}
