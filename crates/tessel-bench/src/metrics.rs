//! Benchmark metrics: data collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Backend name.
    pub backend: String,
    /// Vertex count.
    pub vertex_count: usize,
    /// Triangle count.
    pub triangle_count: usize,
    /// Detection cycles executed.
    pub cycles: u32,
    /// Total wall-clock time including XPBD substeps (seconds).
    pub total_wall_time: f64,
    /// Average detection cycle time (seconds).
    pub avg_detect_time: f64,
    /// Minimum detection cycle time.
    pub min_detect_time: f64,
    /// Maximum detection cycle time.
    pub max_detect_time: f64,
    /// Average candidate pairs per cycle (after clamping).
    pub avg_candidate_pairs: f64,
    /// Largest candidate count of any cycle.
    pub max_candidate_pairs: u32,
    /// Average exact pairs per cycle (after clamping).
    pub avg_exact_pairs: f64,
    /// Candidate appends dropped over the whole run.
    pub candidates_dropped: u64,
    /// Exact appends dropped over the whole run.
    pub exact_dropped: u64,
    /// Deepest constraint violation seen by the contact response (meters).
    pub max_penetration: f32,
    /// Final kinetic energy.
    pub final_kinetic_energy: f64,
}

impl CollisionMetrics {
    /// CSV header row.
    pub fn to_csv_header() -> String {
        "scenario,backend,vertex_count,triangle_count,cycles,total_wall_time_s,avg_detect_ms,min_detect_ms,max_detect_ms,avg_candidates,max_candidates,avg_exact,candidates_dropped,exact_dropped,max_penetration,final_ke".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.1},{},{:.1},{},{},{:.6},{:.6e}",
            self.scenario,
            self.backend,
            self.vertex_count,
            self.triangle_count,
            self.cycles,
            self.total_wall_time,
            self.avg_detect_time * 1000.0,
            self.min_detect_time * 1000.0,
            self.max_detect_time * 1000.0,
            self.avg_candidate_pairs,
            self.max_candidate_pairs,
            self.avg_exact_pairs,
            self.candidates_dropped,
            self.exact_dropped,
            self.max_penetration,
            self.final_kinetic_energy,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[CollisionMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
