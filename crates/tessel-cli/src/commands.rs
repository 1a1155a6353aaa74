//! CLI command implementations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessel_bench::metrics::CollisionMetrics;
use tessel_bench::runner::BenchmarkRunner;
use tessel_bench::scenarios::{Scenario, ScenarioKind};
use tessel_contact::{CollisionConfig, CollisionDetector};
use tessel_gpu::BackendKind;
use tessel_mesh::TriangleMesh;
use tessel_solver::{SimulationState, SolverConfig};
use tessel_telemetry::{EventBus, TracingSink};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Contents of a run config file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    collision: CollisionConfig,
    solver: SolverConfig,
}

impl RunConfig {
    fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&content)?;
        config.collision.validate()?;
        config.solver.validate()?;
        Ok(config)
    }
}

/// Run detection cycles on a scenario.
pub fn detect(
    kind: ScenarioKind,
    backend: BackendKind,
    config_path: Option<&Path>,
    cycles: u32,
    events: bool,
) -> CliResult {
    let config = match config_path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let scenario = Scenario::from_kind(kind).with_collision(config.collision);

    println!("Tessel Detection");
    println!("────────────────");
    println!(
        "Scenario: {kind} ({} verts, {} tris)",
        scenario.mesh.vertex_count(),
        scenario.mesh.triangle_count()
    );

    let state = SimulationState::from_mesh(&scenario.mesh, scenario.vertex_mass, &scenario.pinned)?;
    let mut detector =
        CollisionDetector::new(&scenario.mesh, scenario.collision.clone(), backend.create())?;
    if events {
        let mut bus = EventBus::new();
        bus.add_sink(Box::new(TracingSink::new(tracing::Level::INFO)));
        detector = detector.with_event_bus(bus);
    }
    println!(
        "Backend:  {} (sort scratch: {} slots)",
        detector.backend_name(),
        detector.sort_requirements().slots
    );
    println!();

    for _ in 0..cycles {
        let report = detector.detect(&state)?;
        println!(
            "cycle {:>3}: {:>8} candidates ({} dropped), {:>8} exact ({} dropped), {:.3}ms",
            report.cycle,
            report.candidate_pairs,
            report.candidates_dropped,
            report.exact_pairs,
            report.exact_dropped,
            report.wall_time.as_secs_f64() * 1000.0,
        );
    }

    if let Some(bound) = detector.global_bound() {
        println!();
        println!("Global bound: {:?} .. {:?}", bound.lower, bound.upper);
    }
    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, backend: BackendKind, output_path: Option<&Path>) -> CliResult {
    println!("Tessel Benchmark Suite");
    println!("══════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        vec![scenario_name.parse::<ScenarioKind>()?]
    };

    let mut all_metrics = Vec::new();
    for &kind in &scenarios {
        let scenario = Scenario::from_kind(kind);
        println!(
            "Running: {} ({} verts, {} tris, {} cycles)",
            kind,
            scenario.mesh.vertex_count(),
            scenario.mesh.triangle_count(),
            scenario.cycles,
        );

        let metrics = BenchmarkRunner::run(&scenario, backend)
            .map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg detect:    {:.3}ms", metrics.avg_detect_time * 1000.0);
        println!("  Candidates:    {:.1} avg", metrics.avg_candidate_pairs);
        println!("  Exact pairs:   {:.1} avg", metrics.avg_exact_pairs);
        println!();

        all_metrics.push(metrics);
    }

    let csv = CollisionMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {}", path.display());
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }

    Ok(())
}

/// Validate a run config or a mesh.
pub fn validate(path: &Path) -> CliResult {
    println!("Tessel Validator");
    println!("────────────────");
    println!();

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            println!("Validating config: {}", path.display());
            let config = RunConfig::load(path)?;
            println!(
                "Config is valid (contact distance {}, interval {}, capacity {}).",
                config.collision.collision_minimal_dist,
                config.collision.detection_interval,
                config.collision.max_collision_pairs
            );
        }
        Some("json") => {
            println!("Validating mesh: {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let mesh: TriangleMesh = serde_json::from_str(&content)?;
            mesh.validate()?;
            println!(
                "Mesh is valid ({} verts, {} tris).",
                mesh.vertex_count(),
                mesh.triangle_count()
            );
        }
        _ => return Err("Unsupported file format. Use .toml (config) or .json (mesh).".into()),
    }

    Ok(())
}
