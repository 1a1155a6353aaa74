//! Capacity-bounded append buffers.
//!
//! Kernels append fixed-width entries through an atomic counter that
//! never moves past capacity. A rejected append writes nothing and bumps
//! a separate saturating drop tally instead, so memory stays constant
//! and stored entries are never overwritten, whatever the number of
//! appends. After the pass the host reads both counters and resets the
//! tally. Overflow is a soft condition, never an error.

use tessel_gpu::StorageBuffer;

/// Host-side result of [`AppendBuffer::clamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendCount {
    /// Entries stored, `<= capacity`.
    pub stored: u32,
    /// Appends rejected for lack of space.
    pub dropped: u32,
}

/// Fixed-capacity buffer of `lanes`-wide `u32` entries with an atomic
/// length counter (slot 0) and drop tally (slot 1).
pub struct AppendBuffer {
    label: &'static str,
    lanes: usize,
    capacity: u32,
    counter: StorageBuffer<u32>,
    data: StorageBuffer<u32>,
}

impl AppendBuffer {
    pub fn new(label: &'static str, capacity: u32, lanes: usize) -> Self {
        Self {
            label,
            lanes,
            capacity,
            counter: StorageBuffer::filled("append_counter", 2, 0),
            data: StorageBuffer::filled(label, capacity as usize * lanes, 0),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Zeroes both counters. Host-side, between submissions.
    pub fn reset(&self) {
        self.counter.fill(0);
    }

    /// Appends one entry from inside a kernel.
    ///
    /// Returns `false` when the buffer was already full.
    #[inline]
    pub fn push(&self, entry: &[u32]) -> bool {
        debug_assert_eq!(entry.len(), self.lanes);
        match self.counter.fetch_add_below(0, 1, self.capacity) {
            Ok(slot) => {
                self.data.write_from(slot as usize * self.lanes, entry);
                true
            }
            Err(_) => {
                self.counter.fetch_saturating_add(1, 1);
                false
            }
        }
    }

    /// Entries stored so far, `<= capacity`.
    pub fn stored_count(&self) -> u32 {
        self.counter.load(0)
    }

    /// Attempted appends, stored plus rejected, saturating at `u32::MAX`.
    pub fn raw_count(&self) -> u32 {
        self.stored_count().saturating_add(self.counter.load(1))
    }

    /// Reports the stored/dropped split and clears the drop tally.
    /// Host-side, after the producing submission has completed.
    pub fn clamp(&self) -> AppendCount {
        let count = AppendCount {
            stored: self.stored_count(),
            dropped: self.counter.load(1),
        };
        self.counter.store(1, 0);
        count
    }

    /// Lanes of entry `i`, read from inside a kernel.
    #[inline]
    pub fn entry<const L: usize>(&self, i: usize) -> [u32; L] {
        debug_assert_eq!(L, self.lanes);
        let base = i * self.lanes;
        std::array::from_fn(|k| self.data.load(base + k))
    }

    /// Reads back the first `count` entries as flat lanes.
    pub fn read_back(&self, count: u32) -> Vec<u32> {
        let count = count.min(self.capacity) as usize;
        self.data.read_range(0..count * self.lanes)
    }
}

impl std::fmt::Debug for AppendBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppendBuffer")
            .field("label", &self.label)
            .field("lanes", &self.lanes)
            .field("capacity", &self.capacity)
            .field("count", &self.raw_count())
            .finish()
    }
}
