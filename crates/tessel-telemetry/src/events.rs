//! Simulation event types.
//!
//! Structured events emitted once per detection cycle at its stage
//! boundaries. Events are lightweight value types that carry just
//! enough data to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the engine.
///
/// Events are tagged with the detection cycle they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Detection cycle number (1-based; 0 for events outside a cycle).
    pub cycle: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Detection cycle started.
    DetectionBegin {
        /// Triangles in the simulated mesh.
        triangles: u32,
    },

    /// Global bound reduced and read back.
    GlobalBound {
        lower: [f32; 3],
        upper: [f32; 3],
    },

    /// A submission reached its host-blocking barrier.
    Barrier {
        /// Command list label.
        label: String,
        /// Sentinel ticket read back.
        ticket: u32,
    },

    /// Broad phase finished; counts are after clamping.
    BroadPhase {
        candidate_pairs: u32,
        /// Appends rejected because the buffer was full.
        dropped: u32,
    },

    /// Narrow phase finished; counts are after clamping.
    NarrowPhase {
        exact_pairs: u32,
        dropped: u32,
    },

    /// Detection cycle completed.
    DetectionEnd {
        /// Wall-clock time for the whole cycle (seconds).
        wall_time: f64,
    },

    /// Contact response applied to the exact pairs.
    XpbdProjection {
        /// Constraints that moved at least one vertex.
        resolved: u32,
        /// Deepest violation before projection (meters).
        max_penetration: f32,
    },

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given detection cycle.
    pub fn new(cycle: u32, kind: EventKind) -> Self {
        Self { cycle, kind }
    }
}
