//! Pluggable event sinks.
//!
//! Sinks consume events from the bus and process them
//! (forward to `tracing`, collect for tests, ...).

use std::sync::{Arc, Mutex};

use crate::events::SimulationEvent;

/// Trait for event consumers.
///
/// Implement this to create custom telemetry outputs.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the simulation ends. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Read handle onto the events collected by a [`VecSink`].
///
/// Stays valid after the sink has been boxed into a bus.
#[derive(Debug, Clone, Default)]
pub struct SharedEvents {
    inner: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl SharedEvents {
    /// Copy of every event received so far.
    pub fn snapshot(&self) -> Vec<SimulationEvent> {
        match self.inner.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, event: SimulationEvent) {
        match self.inner.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// A simple sink that records events for testing and inspection.
#[derive(Default)]
pub struct VecSink {
    events: SharedEvents,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the collected events.
    pub fn events(&self) -> SharedEvents {
        self.events.clone()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.events.push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events using the `tracing` crate.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a new tracing sink at the given log level.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        // `tracing` macros need the level as a constant.
        match self.level {
            tracing::Level::ERROR => {
                tracing::error!(cycle = event.cycle, event = ?event.kind, "simulation_event")
            }
            tracing::Level::WARN => {
                tracing::warn!(cycle = event.cycle, event = ?event.kind, "simulation_event")
            }
            tracing::Level::INFO => {
                tracing::info!(cycle = event.cycle, event = ?event.kind, "simulation_event")
            }
            tracing::Level::DEBUG => {
                tracing::debug!(cycle = event.cycle, event = ?event.kind, "simulation_event")
            }
            tracing::Level::TRACE => {
                tracing::trace!(cycle = event.cycle, event = ?event.kind, "simulation_event")
            }
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
