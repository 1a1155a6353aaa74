//! # tessel-bench
//!
//! Benchmark suite for the tessel collision core.
//!
//! Provides procedural collision scenarios, a runner that interleaves
//! detection cycles with XPBD substeps, and CSV/JSON export of the
//! collected metrics for regression tracking.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::CollisionMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{Scenario, ScenarioKind};
