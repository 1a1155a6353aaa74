//! Per-triangle AABBs and their parallel reduction to one global bound.
//!
//! Two dispatches, both in the first submission of a cycle:
//!
//! 1. `triangle_aabbs`: one lane per triangle writes its tight box.
//! 2. `reduce_partials`: up to [`REDUCE_PARTIAL_COUNT`] workgroups each
//!    fold a grid-strided share of the boxes in workgroup-local memory
//!    with a power-of-two thread count, then halve it in a tree until
//!    lane 0 holds the group's partial bound.
//!
//! The host merges the partials after the barrier. `merge` is
//! associative and commutative, so neither the group split nor the
//! backend's scheduling can change the result.

use tessel_gpu::{group_count, CommandList, StorageBuffer};
use tessel_math::aabb::AABB_LANES;
use tessel_math::Aabb;
use tessel_types::constants::{ELEMENT_BLOCK_SIZE, REDUCE_PARTIAL_COUNT};

use crate::device_mesh::{load_aabb, read_aabbs, store_aabb, DeviceMesh};

/// Thread and group counts of a reduction over `triangles` boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReducePlan {
    /// Power-of-two lanes per workgroup.
    pub threads: usize,
    /// Workgroups, each producing one partial bound.
    pub groups: usize,
}

impl ReducePlan {
    pub fn new(triangles: usize) -> Self {
        let threads = triangles
            .div_ceil(2)
            .max(1)
            .next_power_of_two()
            .min(REDUCE_PARTIAL_COUNT);
        let groups = triangles.div_ceil(2 * threads).min(REDUCE_PARTIAL_COUNT);
        Self { threads, groups }
    }
}

/// Owns the per-triangle box table and the partial-bound buffer.
pub struct AabbReducer {
    triangles: usize,
    plan: ReducePlan,
    triangle_aabbs: StorageBuffer<f32>,
    partials: StorageBuffer<f32>,
}

impl AabbReducer {
    pub fn new(triangles: usize) -> Self {
        Self {
            triangles,
            plan: ReducePlan::new(triangles),
            triangle_aabbs: StorageBuffer::filled(
                "triangle_aabbs",
                triangles.max(1) * AABB_LANES,
                0.0,
            ),
            partials: StorageBuffer::filled(
                "aabb_partials",
                REDUCE_PARTIAL_COUNT * AABB_LANES,
                0.0,
            ),
        }
    }

    pub fn plan(&self) -> ReducePlan {
        self.plan
    }

    /// Tight per-triangle boxes, indexed by triangle id.
    pub fn triangle_aabbs(&self) -> &StorageBuffer<f32> {
        &self.triangle_aabbs
    }

    /// Records both dispatches.
    pub fn record<'a>(&'a self, list: &mut CommandList<'a>, mesh: &'a DeviceMesh) {
        let n = self.triangles;
        let boxes = &self.triangle_aabbs;

        list.dispatch(
            "triangle_aabbs",
            group_count(n, ELEMENT_BLOCK_SIZE),
            move |group| {
                let start = group as usize * ELEMENT_BLOCK_SIZE;
                for t in start..(start + ELEMENT_BLOCK_SIZE).min(n) {
                    let [a, b, c] = mesh.corners(t as u32);
                    store_aabb(boxes, t, &Aabb::from_triangle(a, b, c));
                }
            },
        );

        let ReducePlan { threads, groups } = self.plan;
        let partials = &self.partials;
        list.dispatch("reduce_partials", groups as u32, move |group| {
            let stride = groups * 2 * threads;
            let mut shared = vec![Aabb::EMPTY; threads];

            for (lane, slot) in shared.iter_mut().enumerate() {
                let mut acc = Aabb::EMPTY;
                let mut i = group as usize * 2 * threads + lane;
                while i < n {
                    acc = acc.merge(&load_aabb(boxes, i));
                    if i + threads < n {
                        acc = acc.merge(&load_aabb(boxes, i + threads));
                    }
                    i += stride;
                }
                *slot = acc;
            }

            let mut active = threads / 2;
            while active > 0 {
                for lane in 0..active {
                    shared[lane] = shared[lane].merge(&shared[lane + active]);
                }
                active /= 2;
            }
            store_aabb(partials, group as usize, &shared[0]);
        });
    }

    /// Host-side merge of the partial bounds. Valid after the recording
    /// submission has completed; [`Aabb::EMPTY`] for an empty mesh.
    pub fn global_bound(&self) -> Aabb {
        read_aabbs(&self.partials, self.plan.groups)
            .iter()
            .fold(Aabb::EMPTY, |acc, partial| acc.merge(partial))
    }

    /// Host readback of the per-triangle boxes.
    pub fn read_triangle_aabbs(&self) -> Vec<Aabb> {
        read_aabbs(&self.triangle_aabbs, self.triangles)
    }
}
