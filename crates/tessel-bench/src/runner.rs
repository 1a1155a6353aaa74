//! Benchmark runner: executes scenarios and collects metrics.

use std::time::Instant;

use tessel_contact::{CollisionDetector, DetectionReport, XpbdCollisionResponse};
use tessel_gpu::BackendKind;
use tessel_solver::SimulationState;
use tessel_types::TesselResult;

use crate::metrics::CollisionMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario on the given backend.
    ///
    /// Integrates `cycles × detection_interval` substeps; every substep
    /// predicts, detects when the cadence says so, projects the latest
    /// exact pairs and updates velocities.
    pub fn run(scenario: &Scenario, backend: BackendKind) -> TesselResult<CollisionMetrics> {
        scenario.solver.validate()?;
        let mut state =
            SimulationState::from_mesh(&scenario.mesh, scenario.vertex_mass, &scenario.pinned)?;
        let mut detector =
            CollisionDetector::new(&scenario.mesh, scenario.collision.clone(), backend.create())?;
        let response = XpbdCollisionResponse::new(
            scenario.collision.collision_minimal_dist,
            scenario.collision.xpbd_compliance,
        );

        let dt = scenario.solver.substep_dt();
        let substeps = scenario.cycles * scenario.collision.detection_interval;
        let mut reports: Vec<DetectionReport> = Vec::with_capacity(scenario.cycles as usize);
        let mut max_penetration = 0.0f32;

        let total_start = Instant::now();
        for substep in 0..substeps {
            state.predict(dt, scenario.solver.gravity);
            if let Some(report) = detector.step(substep, &state)? {
                reports.push(report);
            }
            let result = detector.resolve(&response, &mut state, dt)?;
            max_penetration = max_penetration.max(result.max_penetration);
            state.update_velocities(dt);
            state.damp_velocities(scenario.solver.damping);
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let detect_times: Vec<f64> = reports.iter().map(|r| r.wall_time.as_secs_f64()).collect();
        let cycles = reports.len() as u32;
        let mean = |sum: f64| if cycles == 0 { 0.0 } else { sum / cycles as f64 };

        let metrics = CollisionMetrics {
            scenario: scenario.kind.name().to_string(),
            backend: detector.backend_name().to_string(),
            vertex_count: scenario.mesh.vertex_count(),
            triangle_count: scenario.mesh.triangle_count(),
            cycles,
            total_wall_time,
            avg_detect_time: mean(detect_times.iter().sum()),
            min_detect_time: detect_times.iter().copied().fold(f64::MAX, f64::min),
            max_detect_time: detect_times.iter().copied().fold(0.0, f64::max),
            avg_candidate_pairs: mean(reports.iter().map(|r| r.candidate_pairs as f64).sum()),
            max_candidate_pairs: reports.iter().map(|r| r.candidate_pairs).max().unwrap_or(0),
            avg_exact_pairs: mean(reports.iter().map(|r| r.exact_pairs as f64).sum()),
            candidates_dropped: reports.iter().map(|r| u64::from(r.candidates_dropped)).sum(),
            exact_dropped: reports.iter().map(|r| u64::from(r.exact_dropped)).sum(),
            max_penetration,
            final_kinetic_energy: state.kinetic_energy(),
        };
        tracing::info!(
            scenario = %metrics.scenario,
            backend = %metrics.backend,
            cycles,
            avg_detect_ms = metrics.avg_detect_time * 1000.0,
            "scenario complete"
        );
        Ok(metrics)
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all(backend: BackendKind) -> TesselResult<Vec<CollisionMetrics>> {
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let scenario = Scenario::from_kind(kind);
            let metrics = Self::run(&scenario, backend)?;
            results.push(metrics);
        }
        Ok(results)
    }
}
