//! # tessel-gpu
//!
//! Compute-device abstraction layer for the tessel collision core.
//!
//! Work is expressed as data-parallel kernels dispatched over
//! workgroups. A [`GpuBackend`] executes dispatches; two are provided:
//! - [`CpuFallback`]: Runs workgroups in order (reference, reproducible)
//! - [`ParallelCpu`]: Runs workgroups concurrently on a rayon pool
//!
//! Dispatches are recorded into a [`CommandList`] and executed in issue
//! order by [`CommandQueue::submit_and_wait`], which ends every
//! submission with a host-blocking sentinel barrier.
//!
//! On top of that sit the parallel primitives the LBVH build needs:
//! a recursive Blelloch exclusive scan ([`scan`]) and a stable 2-bit
//! radix sort of `(u64, u32)` pairs ([`radix_sort`]).

pub mod backend;
pub mod buffers;
pub mod queue;
pub mod radix_sort;
pub mod scan;

pub use backend::{group_count, BackendKind, CpuFallback, GpuBackend, ParallelCpu};
pub use buffers::{BufferView, Element, StorageBuffer};
pub use queue::{CommandList, CommandQueue};
pub use radix_sort::{RadixSortScratch, RadixSorter, SortRequirements};
pub use scan::ScanPlan;
