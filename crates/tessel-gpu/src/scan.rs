//! Recursive Blelloch exclusive scan.
//!
//! Each workgroup scans [`SCAN_BLOCK_SIZE`] elements in local memory
//! with the work-efficient up-sweep/down-sweep and writes its block
//! total into the next level. Levels repeat until one block covers the
//! remaining totals, then the scanned totals are added back top-down.
//!
//! ```text
//! level 0: data            [ b0 | b1 | b2 | ... ]   ceil(n / S) blocks
//! level 1: aux[0..k1]      block totals of level 0
//! level 2: aux[k1..k1+k2]  block totals of level 1
//! ```
//!
//! The level count is planned up front with an explicit loop bounded by
//! [`MAX_SCAN_LEVELS`]; nothing recurses at run time.

use tessel_types::constants::{MAX_SCAN_LEVELS, SCAN_BLOCK_SIZE};
use tessel_types::{TesselError, TesselResult};

use crate::backend::group_count;
use crate::buffers::BufferView;
use crate::queue::CommandList;

/// In-place exclusive scan of a power-of-two slice. Returns the total.
///
/// This is the workgroup-local body: `log2(n)` up-sweep rounds build
/// partial sums in a balanced tree, the root is cleared, and `log2(n)`
/// down-sweep rounds push prefixes back to the leaves.
pub fn blelloch_exclusive_scan(data: &mut [u32]) -> u32 {
    let n = data.len();
    if n == 0 {
        return 0;
    }
    debug_assert!(n.is_power_of_two(), "blelloch scan needs a power-of-two width");

    let mut offset = 1;
    while offset < n {
        let step = offset * 2;
        for i in (step - 1..n).step_by(step) {
            data[i] = data[i].wrapping_add(data[i - offset]);
        }
        offset = step;
    }

    let total = data[n - 1];
    data[n - 1] = 0;

    let mut offset = n / 2;
    while offset >= 1 {
        let step = offset * 2;
        for i in (step - 1..n).step_by(step) {
            let left = data[i - offset];
            data[i - offset] = data[i];
            data[i] = data[i].wrapping_add(left);
        }
        offset /= 2;
    }

    total
}

/// Level layout of a multi-block scan over a fixed element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    len: usize,
    aux_levels: Vec<usize>,
}

impl ScanPlan {
    /// Plans a scan of `len` elements.
    ///
    /// Fails with [`TesselError::CapacityPlan`] when more than
    /// [`MAX_SCAN_LEVELS`] levels would be needed.
    pub fn new(len: usize) -> TesselResult<Self> {
        let mut aux_levels = Vec::new();
        let mut level_len = len;
        while level_len > SCAN_BLOCK_SIZE {
            if aux_levels.len() + 1 >= MAX_SCAN_LEVELS {
                return Err(TesselError::CapacityPlan(format!(
                    "scan of {len} elements needs more than {MAX_SCAN_LEVELS} levels"
                )));
            }
            level_len = level_len.div_ceil(SCAN_BLOCK_SIZE);
            aux_levels.push(level_len);
        }
        Ok(Self { len, aux_levels })
    }

    /// Number of scanned elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total levels including the data level.
    pub fn levels(&self) -> usize {
        1 + self.aux_levels.len()
    }

    /// Scratch slots needed for the block-total levels.
    pub fn aux_slots(&self) -> usize {
        self.aux_levels.iter().sum()
    }

    /// Records the scan of `data` using `aux` for block totals.
    pub fn record<'a>(
        &self,
        list: &mut CommandList<'a>,
        data: BufferView<'a, u32>,
        aux: BufferView<'a, u32>,
    ) -> TesselResult<()> {
        if data.len() < self.len || aux.len() < self.aux_slots() {
            return Err(TesselError::CapacityPlan(format!(
                "scan views too small: data {} < {} or aux {} < {}",
                data.len(),
                self.len,
                aux.len(),
                self.aux_slots()
            )));
        }
        if self.len == 0 {
            return Ok(());
        }

        let mut arrays = Vec::with_capacity(self.levels());
        arrays.push(data.slice(0, self.len));
        let mut offset = 0;
        for &level_len in &self.aux_levels {
            arrays.push(aux.slice(offset, level_len));
            offset += level_len;
        }

        for level in 0..arrays.len() {
            let input = arrays[level];
            let totals = arrays.get(level + 1).copied();
            list.dispatch(
                "scan_blocks",
                group_count(input.len(), SCAN_BLOCK_SIZE),
                move |group| scan_block(input, totals, group),
            );
        }

        for level in (0..arrays.len() - 1).rev() {
            let target = arrays[level];
            let offsets = arrays[level + 1];
            list.dispatch(
                "scan_add_offsets",
                group_count(target.len(), SCAN_BLOCK_SIZE),
                move |group| add_block_offset(target, offsets, group),
            );
        }

        Ok(())
    }
}

fn block_range(group: u32, len: usize) -> (usize, usize) {
    let start = group as usize * SCAN_BLOCK_SIZE;
    (start, (start + SCAN_BLOCK_SIZE).min(len))
}

fn scan_block(input: BufferView<'_, u32>, totals: Option<BufferView<'_, u32>>, group: u32) {
    let (start, end) = block_range(group, input.len());
    let mut local = [0u32; SCAN_BLOCK_SIZE];
    for (lane, i) in (start..end).enumerate() {
        local[lane] = input.load(i);
    }

    let total = blelloch_exclusive_scan(&mut local);

    for (lane, i) in (start..end).enumerate() {
        input.store(i, local[lane]);
    }
    if let Some(totals) = totals {
        totals.store(group as usize, total);
    }
}

fn add_block_offset(target: BufferView<'_, u32>, offsets: BufferView<'_, u32>, group: u32) {
    let add = offsets.load(group as usize);
    if add == 0 {
        return;
    }
    let (start, end) = block_range(group, target.len());
    for i in start..end {
        target.store(i, target.load(i).wrapping_add(add));
    }
}
