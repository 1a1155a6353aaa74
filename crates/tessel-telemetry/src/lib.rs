//! # tessel-telemetry
//!
//! Event bus for collision-detection telemetry. A detector emits
//! structured events (cycle boundaries, barriers, global bound, pair
//! counts, contact projection) that pluggable sinks consume: a
//! [`sinks::TracingSink`] forwarding to `tracing`, or a
//! [`sinks::VecSink`] recording into a shared handle for inspection.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, SharedEvents, TracingSink, VecSink};
