//! Narrow phase: candidate pairs to exact vertex-triangle pairs.
//!
//! Sized from the clamped candidate count read back after the broad
//! phase's barrier, so it is always recorded in its own submission.

use tessel_gpu::{group_count, CommandList};
use tessel_types::constants::NARROW_BLOCK_SIZE;

use crate::contact::{CandidatePair, ExactPair};
use crate::device_mesh::DeviceMesh;
use crate::pairs::AppendBuffer;
use crate::vertex_triangle::pair_contacts;

/// Refines candidates into [`ExactPair`]s closer than a threshold.
pub struct NarrowPhase;

impl NarrowPhase {
    /// Records `narrow_phase` over the first `candidate_count` entries of
    /// `candidates`.
    pub fn record<'a>(
        list: &mut CommandList<'a>,
        mesh: &'a DeviceMesh,
        candidates: &'a AppendBuffer,
        candidate_count: u32,
        exact: &'a AppendBuffer,
        threshold: f32,
    ) {
        let count = candidate_count.min(candidates.capacity()) as usize;
        list.dispatch(
            "narrow_phase",
            group_count(count, NARROW_BLOCK_SIZE),
            move |group| {
                let start = group as usize * NARROW_BLOCK_SIZE;
                for i in start..(start + NARROW_BLOCK_SIZE).min(count) {
                    let pair = CandidatePair::from_lanes(&candidates.entry::<2>(i));
                    pair_contacts(mesh, pair, threshold, |contact: ExactPair| {
                        exact.push(&contact.to_lanes());
                    });
                }
            },
        );
    }
}
