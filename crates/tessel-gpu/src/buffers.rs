//! Device storage buffers.
//!
//! Every slot is an atomic cell, so workgroups running concurrently may
//! write disjoint slots of a shared buffer and bump counters without
//! any `unsafe`. Plain loads and stores are `Relaxed`; ordering between
//! dispatches comes from the queue executing them one after another.
//! Host-side upload and readback happen only between submissions.

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Scalar types that can live in a [`StorageBuffer`].
pub trait Element: Copy + Send + Sync + 'static {
    /// Atomic cell holding one value.
    type Cell: Send + Sync;

    fn new_cell(value: Self) -> Self::Cell;
    fn load(cell: &Self::Cell, order: Ordering) -> Self;
    fn store(cell: &Self::Cell, value: Self, order: Ordering);
}

impl Element for u32 {
    type Cell = AtomicU32;

    fn new_cell(value: Self) -> Self::Cell {
        AtomicU32::new(value)
    }

    #[inline]
    fn load(cell: &Self::Cell, order: Ordering) -> Self {
        cell.load(order)
    }

    #[inline]
    fn store(cell: &Self::Cell, value: Self, order: Ordering) {
        cell.store(value, order)
    }
}

impl Element for u64 {
    type Cell = AtomicU64;

    fn new_cell(value: Self) -> Self::Cell {
        AtomicU64::new(value)
    }

    #[inline]
    fn load(cell: &Self::Cell, order: Ordering) -> Self {
        cell.load(order)
    }

    #[inline]
    fn store(cell: &Self::Cell, value: Self, order: Ordering) {
        cell.store(value, order)
    }
}

// f32 is stored by bit pattern.
impl Element for f32 {
    type Cell = AtomicU32;

    fn new_cell(value: Self) -> Self::Cell {
        AtomicU32::new(value.to_bits())
    }

    #[inline]
    fn load(cell: &Self::Cell, order: Ordering) -> Self {
        f32::from_bits(cell.load(order))
    }

    #[inline]
    fn store(cell: &Self::Cell, value: Self, order: Ordering) {
        cell.store(value.to_bits(), order)
    }
}

/// A fixed-size device buffer.
///
/// Buffers are allocated once for worst-case sizes and overwritten in
/// place; they never grow.
pub struct StorageBuffer<T: Element> {
    label: &'static str,
    cells: Box<[T::Cell]>,
}

impl<T: Element> StorageBuffer<T> {
    /// Creates a buffer of `len` copies of `value`.
    pub fn filled(label: &'static str, len: usize, value: T) -> Self {
        Self {
            label,
            cells: (0..len).map(|_| T::new_cell(value)).collect(),
        }
    }

    /// Creates a buffer initialised from host data.
    pub fn from_slice(label: &'static str, data: &[T]) -> Self {
        Self {
            label,
            cells: data.iter().map(|&v| T::new_cell(v)).collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn load(&self, i: usize) -> T {
        T::load(&self.cells[i], Ordering::Relaxed)
    }

    #[inline]
    pub fn store(&self, i: usize, value: T) {
        T::store(&self.cells[i], value, Ordering::Relaxed)
    }

    /// Host upload of `src` starting at `offset`.
    pub fn write_from(&self, offset: usize, src: &[T]) {
        for (cell, &v) in self.cells[offset..offset + src.len()].iter().zip(src) {
            T::store(cell, v, Ordering::Relaxed);
        }
    }

    /// Sets every element to `value`.
    pub fn fill(&self, value: T) {
        for cell in self.cells.iter() {
            T::store(cell, value, Ordering::Relaxed);
        }
    }

    /// Copies the whole buffer back to the host.
    pub fn read_back(&self) -> Vec<T> {
        self.read_range(0..self.len())
    }

    /// Copies `range` back to the host.
    pub fn read_range(&self, range: Range<usize>) -> Vec<T> {
        self.cells[range]
            .iter()
            .map(|c| T::load(c, Ordering::Relaxed))
            .collect()
    }

    /// A window of `len` elements starting at `offset`.
    ///
    /// # Panics
    /// If the window does not fit inside the buffer.
    pub fn view(&self, offset: usize, len: usize) -> BufferView<'_, T> {
        assert!(
            offset + len <= self.len(),
            "view {}..{} out of range for buffer '{}' of length {}",
            offset,
            offset + len,
            self.label,
            self.len()
        );
        BufferView {
            buffer: self,
            offset,
            len,
        }
    }

    /// A view over the whole buffer.
    pub fn as_view(&self) -> BufferView<'_, T> {
        self.view(0, self.len())
    }
}

impl StorageBuffer<u32> {
    /// Atomic increment; returns the previous value.
    ///
    /// Acquire-release, so writes made before the increment are visible
    /// to whichever invocation observes its result.
    #[inline]
    pub fn fetch_add(&self, i: usize, value: u32) -> u32 {
        self.cells[i].fetch_add(value, Ordering::AcqRel)
    }

    /// Atomic increment that only happens while the slot is below
    /// `limit`. Returns the previous value on success, or the observed
    /// value when the slot was already at the limit.
    #[inline]
    pub fn fetch_add_below(&self, i: usize, value: u32, limit: u32) -> Result<u32, u32> {
        self.cells[i].fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            if current < limit {
                current.checked_add(value).filter(|next| *next <= limit)
            } else {
                None
            }
        })
    }

    /// Atomic increment clamped at `u32::MAX`; returns the previous value.
    #[inline]
    pub fn fetch_saturating_add(&self, i: usize, value: u32) -> u32 {
        match self.cells[i].fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            Some(current.saturating_add(value))
        }) {
            Ok(previous) | Err(previous) => previous,
        }
    }
}

impl<T: Element> fmt::Debug for StorageBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBuffer")
            .field("label", &self.label)
            .field("len", &self.len())
            .finish()
    }
}

/// A sub-range of a [`StorageBuffer`], addressed from zero.
pub struct BufferView<'a, T: Element> {
    buffer: &'a StorageBuffer<T>,
    offset: usize,
    len: usize,
}

// Manual impls: a derive would require `T: Clone`/`T: Copy` on the cell type.
impl<T: Element> Clone for BufferView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for BufferView<'_, T> {}

impl<'a, T: Element> BufferView<'a, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn load(&self, i: usize) -> T {
        debug_assert!(i < self.len);
        self.buffer.load(self.offset + i)
    }

    #[inline]
    pub fn store(&self, i: usize, value: T) {
        debug_assert!(i < self.len);
        self.buffer.store(self.offset + i, value)
    }

    /// A narrower window inside this view.
    pub fn slice(&self, offset: usize, len: usize) -> BufferView<'a, T> {
        assert!(offset + len <= self.len, "sub-view out of range");
        BufferView {
            buffer: self.buffer,
            offset: self.offset + offset,
            len,
        }
    }

    pub fn read_back(&self) -> Vec<T> {
        self.buffer.read_range(self.offset..self.offset + self.len)
    }
}
