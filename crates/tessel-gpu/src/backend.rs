//! Compute backend trait and CPU implementations.
//!
//! The [`GpuBackend`] trait defines the interface for dispatching
//! data-parallel kernels. A kernel is invoked once per workgroup id;
//! the body iterates its own lanes and owns any workgroup-local
//! ("shared") memory it needs.

use rayon::prelude::*;
use tessel_types::{TesselError, TesselResult};

/// Trait for GPU/CPU compute backends.
///
/// # Implementations
/// - [`CpuFallback`]: Sequential CPU reference (always available)
/// - [`ParallelCpu`]: Workgroups spread over a rayon thread pool
pub trait GpuBackend: Send + Sync {
    /// Initialize the backend. Called once at session start.
    fn init(&mut self) -> TesselResult<()>;

    /// Returns the backend name (e.g., "cpu_fallback", "parallel_cpu").
    fn name(&self) -> &str;

    /// Returns true once [`GpuBackend::init`] has succeeded.
    fn is_initialized(&self) -> bool;

    /// Runs `kernel(group)` for every `group` in `0..groups` and returns
    /// once all invocations have finished.
    fn dispatch(&self, groups: u32, kernel: &(dyn Fn(u32) + Sync)) -> TesselResult<()>;

    /// Returns true if the backend runs on a GPU device.
    fn is_gpu(&self) -> bool;
}

/// Number of workgroups of `block` lanes needed to cover `n` items.
#[inline]
pub fn group_count(n: usize, block: usize) -> u32 {
    n.div_ceil(block) as u32
}

fn not_initialized(name: &str) -> TesselError {
    TesselError::Gpu(format!("backend '{name}' dispatched before init"))
}

/// CPU fallback backend: sequential reference implementation.
///
/// Always available, used for:
/// - Platforms without GPU support
/// - Reproducible output ordering (workgroups run in id order)
/// - Small meshes where parallel overhead isn't worthwhile
pub struct CpuFallback {
    initialized: bool,
}

impl CpuFallback {
    /// Creates a new CPU fallback backend.
    pub fn new() -> Self {
        Self { initialized: false }
    }
}

impl Default for CpuFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for CpuFallback {
    fn init(&mut self) -> TesselResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "cpu_fallback"
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn dispatch(&self, groups: u32, kernel: &(dyn Fn(u32) + Sync)) -> TesselResult<()> {
        if !self.initialized {
            return Err(not_initialized(self.name()));
        }
        for group in 0..groups {
            kernel(group);
        }
        Ok(())
    }

    fn is_gpu(&self) -> bool {
        false
    }
}

/// Workgroups executed concurrently on a dedicated rayon pool.
pub struct ParallelCpu {
    threads: Option<usize>,
    pool: Option<rayon::ThreadPool>,
}

impl ParallelCpu {
    /// Uses rayon's default thread count.
    pub fn new() -> Self {
        Self {
            threads: None,
            pool: None,
        }
    }

    /// Uses exactly `threads` worker threads.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
            pool: None,
        }
    }
}

impl Default for ParallelCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for ParallelCpu {
    fn init(&mut self) -> TesselResult<()> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("tessel-worker-{i}"));
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| TesselError::Gpu(format!("thread pool creation failed: {e}")))?;
        tracing::debug!(threads = pool.current_num_threads(), "parallel_cpu initialized");
        self.pool = Some(pool);
        Ok(())
    }

    fn name(&self) -> &str {
        "parallel_cpu"
    }

    fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    fn dispatch(&self, groups: u32, kernel: &(dyn Fn(u32) + Sync)) -> TesselResult<()> {
        let pool = self.pool.as_ref().ok_or_else(|| not_initialized(self.name()))?;
        pool.install(|| (0..groups).into_par_iter().for_each(kernel));
        Ok(())
    }

    fn is_gpu(&self) -> bool {
        false
    }
}

/// Backend selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    Parallel,
}

impl BackendKind {
    /// Creates an uninitialised backend of this kind.
    pub fn create(self) -> Box<dyn GpuBackend> {
        match self {
            BackendKind::Cpu => Box::new(CpuFallback::new()),
            BackendKind::Parallel => Box::new(ParallelCpu::new()),
        }
    }
}
