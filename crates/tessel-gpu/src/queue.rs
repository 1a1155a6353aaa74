//! Command lists and the submission queue.
//!
//! A detection cycle records its dispatches into a [`CommandList`] and
//! hands the whole list to [`CommandQueue::submit_and_wait`]. Dispatches
//! run strictly in issue order: pass `i + 1` always observes the fully
//! written output of pass `i`. Every submission ends with a sentinel
//! barrier: one extra dispatch writes a fresh ticket into a sentinel
//! buffer, and the host blocks until it reads that ticket back. Data
//! read back after `submit_and_wait` returns is therefore complete.

use tessel_types::{TesselError, TesselResult};

use crate::backend::GpuBackend;
use crate::buffers::StorageBuffer;

type Kernel<'a> = Box<dyn Fn(u32) + Sync + 'a>;

struct Dispatch<'a> {
    label: &'static str,
    groups: u32,
    kernel: Kernel<'a>,
}

/// An ordered batch of kernel dispatches.
///
/// Kernels may borrow device buffers for the lifetime `'a`; the list is
/// consumed by submission.
pub struct CommandList<'a> {
    label: &'static str,
    dispatches: Vec<Dispatch<'a>>,
}

impl<'a> CommandList<'a> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            dispatches: Vec::new(),
        }
    }

    /// Records `kernel` over `groups` workgroups. Empty dispatches are skipped.
    pub fn dispatch<F>(&mut self, label: &'static str, groups: u32, kernel: F)
    where
        F: Fn(u32) + Sync + 'a,
    {
        if groups == 0 {
            return;
        }
        self.dispatches.push(Dispatch {
            label,
            groups,
            kernel: Box::new(kernel),
        });
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Number of recorded dispatches.
    pub fn len(&self) -> usize {
        self.dispatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }

    /// Labels of the recorded dispatches, in issue order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.dispatches.iter().map(|d| d.label)
    }
}

/// The single in-order queue of a simulation session.
pub struct CommandQueue {
    sentinel: StorageBuffer<u32>,
    submitted: u32,
    dispatched: u64,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            sentinel: StorageBuffer::filled("barrier_sentinel", 1, 0),
            submitted: 0,
            dispatched: 0,
        }
    }

    /// Executes `list` in order, then blocks on the sentinel barrier.
    ///
    /// Returns the barrier ticket of this submission. A dispatch failure
    /// aborts the remainder of the list.
    pub fn submit_and_wait(
        &mut self,
        backend: &dyn GpuBackend,
        list: CommandList<'_>,
    ) -> TesselResult<u32> {
        for dispatch in &list.dispatches {
            tracing::trace!(
                list = list.label,
                kernel = dispatch.label,
                groups = dispatch.groups,
                "dispatch"
            );
            backend.dispatch(dispatch.groups, &*dispatch.kernel)?;
        }

        let ticket = self.submitted.wrapping_add(1);
        let sentinel = &self.sentinel;
        backend.dispatch(1, &|_: u32| sentinel.store(0, ticket))?;

        let observed = self.sentinel.load(0);
        if observed != ticket {
            return Err(TesselError::BarrierMismatch {
                expected: ticket,
                observed,
            });
        }

        self.submitted = ticket;
        self.dispatched += list.dispatches.len() as u64;
        tracing::debug!(
            list = list.label,
            ticket,
            dispatches = list.dispatches.len(),
            "barrier reached"
        );
        Ok(ticket)
    }

    /// Number of completed submissions.
    pub fn submissions(&self) -> u32 {
        self.submitted
    }

    /// Total kernel dispatches executed (barrier dispatches excluded).
    pub fn dispatches(&self) -> u64 {
        self.dispatched
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
