//! Detection session: orchestrates one detection cycle per call.
//!
//! A [`CollisionDetector`] owns every device buffer of the session,
//! sized once for the mesh it was built with. Each cycle issues three
//! submissions on the session's queue, each ending in a host-blocking
//! barrier:
//!
//! 1. `bounds`: triangle AABBs and partial reductions. The host merges
//!    the partials into the global bound.
//! 2. `hierarchy`: Morton codes, radix sort, LBVH build and refit,
//!    broad phase. The host clamps the candidate count.
//! 3. `narrow`: narrow phase sized from that clamped count. The host
//!    clamps the exact count.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tessel_gpu::{
    CommandList, CommandQueue, GpuBackend, RadixSortScratch, RadixSorter, SortRequirements,
};
use tessel_math::Aabb;
use tessel_mesh::TriangleMesh;
use tessel_solver::SimulationState;
use tessel_telemetry::{EventBus, EventKind, SimulationEvent};
use tessel_types::TesselResult;

use crate::aabb_reduce::AabbReducer;
use crate::broad::LbvhBroadPhase;
use crate::config::CollisionConfig;
use crate::contact::{CandidatePair, ExactPair};
use crate::device_mesh::DeviceMesh;
use crate::lbvh::{Lbvh, LbvhSnapshot};
use crate::morton::MortonIndexer;
use crate::narrow::NarrowPhase;
use crate::pairs::{AppendBuffer, AppendCount};
use crate::response::{ContactResponse, ContactResult};

/// Outcome of one detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// 1-based cycle number within the session.
    pub cycle: u32,
    pub triangles: u32,
    /// Tight bound of all triangles ([`Aabb::EMPTY`] for an empty mesh).
    pub global_bound: Aabb,
    /// Candidate pairs stored (clamped to capacity).
    pub candidate_pairs: u32,
    pub candidates_dropped: u32,
    /// Exact pairs stored (clamped to capacity).
    pub exact_pairs: u32,
    pub exact_dropped: u32,
    /// Queue submissions issued by this cycle.
    pub submissions: u32,
    pub wall_time: Duration,
}

/// Collision detection session over one triangle mesh.
pub struct CollisionDetector {
    config: CollisionConfig,
    backend: Box<dyn GpuBackend>,
    queue: CommandQueue,
    mesh: DeviceMesh,
    reducer: AabbReducer,
    lbvh: Lbvh,
    sort_requirements: SortRequirements,
    sort_scratch: RadixSortScratch,
    candidates: AppendBuffer,
    exact: AppendBuffer,
    bus: Option<EventBus>,
    cycle: u32,
    last: Option<DetectionReport>,
}

impl CollisionDetector {
    /// Validates inputs, initializes `backend` and allocates every buffer
    /// for the worst case.
    ///
    /// This is the only place structural misconfiguration surfaces: an
    /// invalid mesh or config, a backend that fails to initialize, or a
    /// sort scratch smaller than the capacity probe requires.
    pub fn new(
        mesh: &TriangleMesh,
        config: CollisionConfig,
        mut backend: Box<dyn GpuBackend>,
    ) -> TesselResult<Self> {
        config.validate()?;
        mesh.validate()?;
        if !backend.is_initialized() {
            backend.init()?;
        }

        let triangles = mesh.triangle_count();
        let sort_requirements = RadixSorter::probe(triangles)?;
        let slots = config.sort_scratch_slots.unwrap_or(sort_requirements.slots);
        let sort_scratch = RadixSortScratch::with_capacity(slots, sort_requirements.records);
        if let Err(e) = sort_scratch.check(&sort_requirements) {
            tracing::error!(
                required = sort_requirements.slots,
                available = slots,
                "sort scratch undersized, refusing to start"
            );
            return Err(e);
        }

        let lbvh = Lbvh::new(triangles);
        tracing::info!(
            backend = backend.name(),
            triangles,
            nodes = lbvh.node_count(),
            pair_capacity = config.max_collision_pairs,
            sort_slots = slots,
            "collision session allocated"
        );

        Ok(Self {
            backend,
            queue: CommandQueue::new(),
            mesh: DeviceMesh::new(mesh),
            reducer: AabbReducer::new(triangles),
            lbvh,
            sort_requirements,
            sort_scratch,
            candidates: AppendBuffer::new(
                "candidate_pairs",
                config.max_collision_pairs,
                CandidatePair::LANES,
            ),
            exact: AppendBuffer::new("exact_pairs", config.max_collision_pairs, ExactPair::LANES),
            config,
            bus: None,
            cycle: 0,
            last: None,
        })
    }

    /// Attaches a telemetry bus, flushed at the end of every cycle.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn event_bus_mut(&mut self) -> Option<&mut EventBus> {
        self.bus.as_mut()
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Scratch the radix sort of this session needs.
    pub fn sort_requirements(&self) -> SortRequirements {
        self.sort_requirements
    }

    /// Completed detection cycles.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn last_report(&self) -> Option<&DetectionReport> {
        self.last.as_ref()
    }

    /// Runs detection only on substeps that are a multiple of
    /// `detection_interval`.
    pub fn step(
        &mut self,
        substep: u32,
        state: &SimulationState,
    ) -> TesselResult<Option<DetectionReport>> {
        if substep % self.config.detection_interval != 0 {
            return Ok(None);
        }
        self.detect(state).map(Some)
    }

    /// Runs one full detection cycle over the positions in `state`.
    pub fn detect(&mut self, state: &SimulationState) -> TesselResult<DetectionReport> {
        let started = Instant::now();
        self.mesh.upload(state)?;
        self.cycle += 1;
        let triangles = self.mesh.triangle_count();
        let submissions_before = self.queue.submissions();
        self.emit(EventKind::DetectionBegin {
            triangles: triangles as u32,
        });

        self.candidates.reset();
        self.exact.reset();

        if triangles == 0 {
            tracing::debug!(cycle = self.cycle, "empty mesh, nothing to detect");
            let none = AppendCount::default();
            return Ok(self.finish(started, Aabb::EMPTY, none, none, 0));
        }

        // 1. Global bound.
        let mut list = CommandList::new("bounds");
        self.reducer.record(&mut list, &self.mesh);
        let ticket = self.queue.submit_and_wait(self.backend.as_ref(), list)?;
        self.barrier("bounds", ticket);

        let bound = self.reducer.global_bound();
        tracing::debug!(
            cycle = self.cycle,
            lower = ?bound.lower,
            upper = ?bound.upper,
            "global bound"
        );
        self.emit(EventKind::GlobalBound {
            lower: bound.lower.to_array(),
            upper: bound.upper.to_array(),
        });

        // 2. Codes, sort, hierarchy, broad phase.
        let mut list = CommandList::new("hierarchy");
        MortonIndexer::record(
            &mut list,
            &self.mesh,
            bound,
            self.lbvh.codes(),
            self.lbvh.leaf_triangles(),
        );
        RadixSorter::record(
            &mut list,
            self.lbvh.codes(),
            self.lbvh.leaf_triangles(),
            triangles,
            &self.sort_scratch,
        )?;
        self.lbvh
            .record_build(&mut list, self.reducer.triangle_aabbs(), self.config.extended_dist());
        LbvhBroadPhase::record(&mut list, &self.lbvh, &self.candidates);
        let ticket = self.queue.submit_and_wait(self.backend.as_ref(), list)?;
        self.barrier("hierarchy", ticket);

        let candidates = self.candidates.clamp();
        if candidates.dropped > 0 {
            tracing::warn!(
                cycle = self.cycle,
                stored = candidates.stored,
                dropped = candidates.dropped,
                "candidate pair buffer full, pairs dropped"
            );
        }
        self.emit(EventKind::BroadPhase {
            candidate_pairs: candidates.stored,
            dropped: candidates.dropped,
        });

        // 3. Narrow phase, sized from the clamped candidate count.
        let mut list = CommandList::new("narrow");
        NarrowPhase::record(
            &mut list,
            &self.mesh,
            &self.candidates,
            candidates.stored,
            &self.exact,
            self.config.collision_minimal_dist,
        );
        let ticket = self.queue.submit_and_wait(self.backend.as_ref(), list)?;
        self.barrier("narrow", ticket);

        let exact = self.exact.clamp();
        if exact.dropped > 0 {
            tracing::warn!(
                cycle = self.cycle,
                stored = exact.stored,
                dropped = exact.dropped,
                "exact pair buffer full, pairs dropped"
            );
        }
        self.emit(EventKind::NarrowPhase {
            exact_pairs: exact.stored,
            dropped: exact.dropped,
        });

        let submissions = self.queue.submissions().wrapping_sub(submissions_before);
        Ok(self.finish(started, bound, candidates, exact, submissions))
    }

    fn finish(
        &mut self,
        started: Instant,
        global_bound: Aabb,
        candidates: AppendCount,
        exact: AppendCount,
        submissions: u32,
    ) -> DetectionReport {
        let report = DetectionReport {
            cycle: self.cycle,
            triangles: self.mesh.triangle_count() as u32,
            global_bound,
            candidate_pairs: candidates.stored,
            candidates_dropped: candidates.dropped,
            exact_pairs: exact.stored,
            exact_dropped: exact.dropped,
            submissions,
            wall_time: started.elapsed(),
        };
        tracing::debug!(
            cycle = report.cycle,
            candidates = report.candidate_pairs,
            exact = report.exact_pairs,
            wall_us = report.wall_time.as_micros() as u64,
            "detection cycle complete"
        );
        self.emit(EventKind::DetectionEnd {
            wall_time: report.wall_time.as_secs_f64(),
        });
        if let Some(bus) = self.bus.as_mut() {
            bus.flush();
        }
        self.last = Some(report.clone());
        report
    }

    /// Applies `response` to the exact pairs of the latest cycle.
    pub fn resolve(
        &mut self,
        response: &dyn ContactResponse,
        state: &mut SimulationState,
        dt: f32,
    ) -> TesselResult<ContactResult> {
        let contacts = self.exact_pairs();
        let result = response.resolve(&contacts, state, dt)?;
        self.emit(EventKind::XpbdProjection {
            resolved: result.resolved_count,
            max_penetration: result.max_penetration,
        });
        if let Some(bus) = self.bus.as_mut() {
            bus.flush();
        }
        Ok(result)
    }

    fn barrier(&self, label: &'static str, ticket: u32) {
        self.emit(EventKind::Barrier {
            label: label.to_string(),
            ticket,
        });
    }

    fn emit(&self, kind: EventKind) {
        if let Some(bus) = &self.bus {
            bus.emit(SimulationEvent::new(self.cycle, kind));
        }
    }

    // ─── Readbacks (valid after `detect`) ────────────────────────

    /// Candidate pairs of the latest cycle, in device append order.
    pub fn candidate_pairs(&self) -> Vec<CandidatePair> {
        self.candidates
            .read_back(self.candidates.stored_count())
            .chunks_exact(CandidatePair::LANES)
            .map(CandidatePair::from_lanes)
            .collect()
    }

    /// Exact pairs of the latest cycle, in device append order.
    pub fn exact_pairs(&self) -> Vec<ExactPair> {
        self.exact
            .read_back(self.exact.stored_count())
            .chunks_exact(ExactPair::LANES)
            .map(ExactPair::from_lanes)
            .collect()
    }

    /// Global bound of the latest cycle.
    pub fn global_bound(&self) -> Option<Aabb> {
        self.last.as_ref().map(|r| r.global_bound)
    }

    /// Per-triangle tight boxes of the latest cycle.
    pub fn triangle_aabbs(&self) -> Vec<Aabb> {
        self.reducer.read_triangle_aabbs()
    }

    /// Morton codes of the latest cycle, in sorted order.
    pub fn sorted_codes(&self) -> Vec<u64> {
        self.lbvh.codes().read_range(0..self.mesh.triangle_count())
    }

    pub fn lbvh_snapshot(&self) -> LbvhSnapshot {
        self.lbvh.snapshot()
    }
}
