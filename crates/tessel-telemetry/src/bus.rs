//! Per-cycle event batching.
//!
//! A detector emits while a cycle runs; nothing reaches the sinks until
//! the owner calls [`EventBus::flush`]. The detector flushes right after
//! `DetectionEnd` and after each `XpbdProjection`, so every sink sees one
//! cycle as a contiguous batch in emission order, never interleaved
//! with the next cycle. Pending events wait in a `std::sync::mpsc`
//! channel owned by the bus.

use std::sync::mpsc;

use crate::events::SimulationEvent;
use crate::sinks::EventSink;

/// Detection telemetry bus.
pub struct EventBus {
    sender: mpsc::Sender<SimulationEvent>,
    receiver: mpsc::Receiver<SimulationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    enabled: bool,
    /// Events handed to the sinks over the bus lifetime.
    delivered: u64,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
            enabled: true,
            delivered: 0,
        }
    }

    /// Registers a sink. It receives batches flushed from now on.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// A disabled bus discards emitted events.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queues an event for the current batch.
    pub fn emit(&self, event: SimulationEvent) {
        if self.enabled {
            // The receiver lives in `self`, so the send cannot fail.
            let _ = self.sender.send(event);
        }
    }

    /// Hands the pending batch to every sink, in emission order.
    /// Returns the batch size.
    pub fn flush(&mut self) -> usize {
        let batch: Vec<SimulationEvent> = self.receiver.try_iter().collect();
        for sink in &mut self.sinks {
            for event in &batch {
                sink.handle(event);
            }
        }
        self.delivered += batch.len() as u64;
        batch.len()
    }

    /// Total events delivered since the bus was created.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Flushes the last batch, then lets every sink finalize.
    pub fn finalize(&mut self) -> usize {
        let flushed = self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
        flushed
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
