//! Stable parallel radix sort of `(u64 key, u32 value)` pairs.
//!
//! The key is consumed two bits at a time, least significant digit
//! first, giving `64 / 2 = 32` passes. Each pass is three stages:
//!
//! 1. **Local sort + count**: every workgroup buckets its
//!    [`SORT_BLOCK_SIZE`] records by the current digit in place
//!    (preserving relative order inside each bucket), records each
//!    record's rank within its bucket, and writes its four bucket sizes
//!    digit-major into the block-sum table (`sums[d * blocks + b]`).
//! 2. **Block-sum scan**: a Blelloch exclusive scan of the table turns
//!    each entry into the global start of bucket `d` of block `b`.
//! 3. **Global shuffle**: every record moves to
//!    `sums[d * blocks + b] + rank`.
//!
//! Records ping-pong between the caller's buffers and the scratch's
//! alternate buffers; with an even pass count the sorted output ends up
//! back in the caller's buffers.
//!
//! Equal keys keep their input order. Callers building a BVH rely on
//! this to make the leaf order reproducible.

use tessel_types::constants::{RADIX_BITS, RADIX_BUCKETS, SORT_BLOCK_SIZE};
use tessel_types::{TesselError, TesselResult};

use crate::backend::group_count;
use crate::buffers::{BufferView, StorageBuffer};
use crate::queue::CommandList;
use crate::scan::{blelloch_exclusive_scan, ScanPlan};

/// Working-set size of a sort, as returned by [`RadixSorter::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortRequirements {
    /// `u32` scratch slots: local ranks, block sums, scan levels.
    pub slots: usize,
    /// Records each alternate key/value buffer must hold.
    pub records: usize,
}

/// Caller-owned temporary storage for [`RadixSorter`].
pub struct RadixSortScratch {
    pub slots: StorageBuffer<u32>,
    pub keys_alt: StorageBuffer<u64>,
    pub values_alt: StorageBuffer<u32>,
}

impl RadixSortScratch {
    /// Allocates exactly what `requirements` asks for.
    pub fn new(requirements: &SortRequirements) -> Self {
        Self::with_capacity(requirements.slots, requirements.records)
    }

    /// Allocates `slots` scratch slots and `records` alternate records.
    pub fn with_capacity(slots: usize, records: usize) -> Self {
        Self {
            slots: StorageBuffer::filled("sort_scratch", slots, 0),
            keys_alt: StorageBuffer::filled("sort_keys_alt", records, 0),
            values_alt: StorageBuffer::filled("sort_values_alt", records, 0),
        }
    }

    /// Fails if this scratch cannot hold `requirements`.
    pub fn check(&self, requirements: &SortRequirements) -> TesselResult<()> {
        if self.slots.len() < requirements.slots {
            return Err(TesselError::SortScratchTooSmall {
                required: requirements.slots,
                available: self.slots.len(),
            });
        }
        let records = self.keys_alt.len().min(self.values_alt.len());
        if records < requirements.records {
            return Err(TesselError::SortScratchTooSmall {
                required: requirements.records,
                available: records,
            });
        }
        Ok(())
    }
}

/// 2-bit LSD radix sorter.
pub struct RadixSorter;

impl RadixSorter {
    /// Number of 2-bit passes over a 64-bit key.
    pub const PASSES: u32 = u64::BITS / RADIX_BITS;

    /// Pure capacity probe: the scratch a sort of `n` records needs.
    /// Performs no work.
    ///
    /// Counts exactly what the passes touch: `n` local ranks, `4·B`
    /// digit-major block sums (`B = ceil(n / SORT_BLOCK_SIZE)`, scanned in
    /// place) and the scan's auxiliary levels. This is below the classic
    /// `prefixSums + blockSums*2 + prefixSums*4` sizing, which also
    /// reserves separate per-digit prefix arrays this sorter never
    /// allocates.
    pub fn probe(n: usize) -> TesselResult<SortRequirements> {
        let block_sums = RADIX_BUCKETS * n.div_ceil(SORT_BLOCK_SIZE);
        let plan = ScanPlan::new(block_sums)?;
        Ok(SortRequirements {
            slots: n + block_sums + plan.aux_slots(),
            records: n,
        })
    }

    /// Records a full sort of the first `n` records of `keys`/`values`.
    ///
    /// Scratch capacity is checked before anything is recorded: on
    /// failure the command list and every buffer are left untouched.
    /// Fewer than two records need no work.
    pub fn record<'a>(
        list: &mut CommandList<'a>,
        keys: &'a StorageBuffer<u64>,
        values: &'a StorageBuffer<u32>,
        n: usize,
        scratch: &'a RadixSortScratch,
    ) -> TesselResult<()> {
        let requirements = Self::probe(n)?;
        scratch.check(&requirements)?;
        if keys.len() < n || values.len() < n {
            return Err(TesselError::SortScratchTooSmall {
                required: n,
                available: keys.len().min(values.len()),
            });
        }
        if n < 2 {
            return Ok(());
        }

        let blocks = n.div_ceil(SORT_BLOCK_SIZE);
        let block_sum_len = RADIX_BUCKETS * blocks;
        let plan = ScanPlan::new(block_sum_len)?;

        let ranks = scratch.slots.view(0, n);
        let sums = scratch.slots.view(n, block_sum_len);
        let aux = scratch.slots.view(n + block_sum_len, plan.aux_slots());

        let primary = Records {
            keys: keys.view(0, n),
            values: values.view(0, n),
        };
        let alternate = Records {
            keys: scratch.keys_alt.view(0, n),
            values: scratch.values_alt.view(0, n),
        };

        for pass in 0..Self::PASSES {
            let shift = pass * RADIX_BITS;
            let (src, dst) = if pass % 2 == 0 {
                (primary, alternate)
            } else {
                (alternate, primary)
            };
            let groups = group_count(n, SORT_BLOCK_SIZE);

            list.dispatch("radix_local_sort", groups, move |group| {
                local_sort(src, ranks, sums, blocks, shift, group)
            });
            plan.record(list, sums, aux)?;
            list.dispatch("radix_scatter", groups, move |group| {
                scatter(src, dst, ranks, sums, blocks, shift, group)
            });
        }

        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Records<'a> {
    keys: BufferView<'a, u64>,
    values: BufferView<'a, u32>,
}

#[inline]
fn digit(key: u64, shift: u32) -> usize {
    ((key >> shift) as usize) & (RADIX_BUCKETS - 1)
}

fn local_sort(
    records: Records<'_>,
    ranks: BufferView<'_, u32>,
    sums: BufferView<'_, u32>,
    blocks: usize,
    shift: u32,
    group: u32,
) {
    let start = group as usize * SORT_BLOCK_SIZE;
    let end = (start + SORT_BLOCK_SIZE).min(records.keys.len());
    let len = end - start;

    let mut keys = [0u64; SORT_BLOCK_SIZE];
    let mut values = [0u32; SORT_BLOCK_SIZE];
    let mut digits = [0usize; SORT_BLOCK_SIZE];
    for lane in 0..len {
        keys[lane] = records.keys.load(start + lane);
        values[lane] = records.values.load(start + lane);
        digits[lane] = digit(keys[lane], shift);
    }

    // One split per bucket: the exclusive scan of the membership flags is
    // each member's rank, and the scan total is the bucket size.
    let mut rank = [0u32; SORT_BLOCK_SIZE];
    let mut counts = [0u32; RADIX_BUCKETS];
    for (bucket, count) in counts.iter_mut().enumerate() {
        let mut flags = [0u32; SORT_BLOCK_SIZE];
        for lane in 0..len {
            flags[lane] = u32::from(digits[lane] == bucket);
        }
        *count = blelloch_exclusive_scan(&mut flags);
        for lane in 0..len {
            if digits[lane] == bucket {
                rank[lane] = flags[lane];
            }
        }
    }

    let mut bucket_start = [0u32; RADIX_BUCKETS];
    for bucket in 1..RADIX_BUCKETS {
        bucket_start[bucket] = bucket_start[bucket - 1] + counts[bucket - 1];
    }

    for lane in 0..len {
        let slot = start + (bucket_start[digits[lane]] + rank[lane]) as usize;
        records.keys.store(slot, keys[lane]);
        records.values.store(slot, values[lane]);
        ranks.store(slot, rank[lane]);
    }
    for (bucket, &count) in counts.iter().enumerate() {
        sums.store(bucket * blocks + group as usize, count);
    }
}

fn scatter(
    src: Records<'_>,
    dst: Records<'_>,
    ranks: BufferView<'_, u32>,
    sums: BufferView<'_, u32>,
    blocks: usize,
    shift: u32,
    group: u32,
) {
    let start = group as usize * SORT_BLOCK_SIZE;
    let end = (start + SORT_BLOCK_SIZE).min(src.keys.len());
    for i in start..end {
        let key = src.keys.load(i);
        let bucket = digit(key, shift);
        let target = sums.load(bucket * blocks + group as usize) + ranks.load(i);
        dst.keys.store(target as usize, key);
        dst.values.store(target as usize, src.values.load(i));
    }
}
