//! Integration tests for tessel-gpu.

use proptest::prelude::*;
use tessel_gpu::backend::{BackendKind, CpuFallback, GpuBackend, ParallelCpu};
use tessel_gpu::buffers::StorageBuffer;
use tessel_gpu::queue::{CommandList, CommandQueue};
use tessel_gpu::radix_sort::{RadixSortScratch, RadixSorter};
use tessel_gpu::scan::ScanPlan;
use tessel_types::constants::{SCAN_BLOCK_SIZE, SORT_BLOCK_SIZE};
use tessel_types::TesselError;

fn cpu() -> CpuFallback {
    let mut backend = CpuFallback::new();
    backend.init().unwrap();
    backend
}

fn parallel() -> ParallelCpu {
    let mut backend = ParallelCpu::with_threads(4);
    backend.init().unwrap();
    backend
}

/// Sorts host data through the device path and returns the result.
fn device_sort(backend: &dyn GpuBackend, keys: &[u64], values: &[u32]) -> (Vec<u64>, Vec<u32>) {
    let n = keys.len();
    let key_buf = StorageBuffer::from_slice("keys", keys);
    let value_buf = StorageBuffer::from_slice("values", values);
    let scratch = RadixSortScratch::new(&RadixSorter::probe(n).unwrap());
    let mut queue = CommandQueue::new();
    let mut list = CommandList::new("sort");
    RadixSorter::record(&mut list, &key_buf, &value_buf, n, &scratch).unwrap();
    queue.submit_and_wait(backend, list).unwrap();
    (key_buf.read_back(), value_buf.read_back())
}

fn reference_sort(keys: &[u64], values: &[u32]) -> (Vec<u64>, Vec<u32>) {
    let mut pairs: Vec<(u64, u32)> = keys.iter().copied().zip(values.iter().copied()).collect();
    pairs.sort_by_key(|&(k, _)| k); // std's sort_by_key is stable
    pairs.into_iter().unzip()
}

/// Deterministic pseudo-random keys without pulling in an RNG.
fn lcg_keys(n: usize, seed: u64, mask: u64) -> Vec<u64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 1) & mask
        })
        .collect()
}

// ─── Backend Tests ────────────────────────────────────────────

#[test]
fn dispatch_before_init_fails() {
    let backend = CpuFallback::new();
    let result = backend.dispatch(1, &|_: u32| {});
    assert!(matches!(result, Err(TesselError::Gpu(_))));

    let parallel = ParallelCpu::new();
    assert!(!parallel.is_initialized());
    assert!(parallel.dispatch(1, &|_: u32| {}).is_err());
}

#[test]
fn backend_names() {
    assert_eq!(cpu().name(), "cpu_fallback");
    assert_eq!(parallel().name(), "parallel_cpu");
    assert!(!cpu().is_gpu());
    assert_eq!(BackendKind::Parallel.create().name(), "parallel_cpu");
}

#[test]
fn every_group_runs_once() {
    for backend in [&cpu() as &dyn GpuBackend, &parallel()] {
        let hits = StorageBuffer::filled("hits", 1000, 0u32);
        backend
            .dispatch(1000, &|g: u32| {
                hits.fetch_add(g as usize, 1);
            })
            .unwrap();
        assert!(hits.read_back().iter().all(|&h| h == 1));
    }
}

// ─── Queue Tests ──────────────────────────────────────────────

#[test]
fn dispatches_execute_in_issue_order() {
    let backend = parallel();
    let data = StorageBuffer::filled("data", 512, 1u32);
    let mut queue = CommandQueue::new();
    let mut list = CommandList::new("ordered");
    list.dispatch("double", 2, |g| {
        for i in g as usize * 256..(g as usize + 1) * 256 {
            data.store(i, data.load(i) * 2);
        }
    });
    list.dispatch("add_three", 2, |g| {
        for i in g as usize * 256..(g as usize + 1) * 256 {
            data.store(i, data.load(i) + 3);
        }
    });
    assert_eq!(list.labels().collect::<Vec<_>>(), vec!["double", "add_three"]);
    queue.submit_and_wait(&backend, list).unwrap();
    assert!(data.read_back().iter().all(|&v| v == 5));
}

#[test]
fn barrier_tickets_increase() {
    let backend = cpu();
    let mut queue = CommandQueue::new();
    assert_eq!(queue.submit_and_wait(&backend, CommandList::new("a")).unwrap(), 1);
    assert_eq!(queue.submit_and_wait(&backend, CommandList::new("b")).unwrap(), 2);
    assert_eq!(queue.submissions(), 2);
}

#[test]
fn empty_dispatches_are_dropped() {
    let mut list = CommandList::new("empty");
    list.dispatch("nothing", 0, |_| {});
    assert!(list.is_empty());
}

#[test]
fn submission_propagates_device_failure() {
    let backend = CpuFallback::new();
    let mut queue = CommandQueue::new();
    let mut list = CommandList::new("uninit");
    list.dispatch("noop", 1, |_| {});
    assert!(queue.submit_and_wait(&backend, list).is_err());
    assert_eq!(queue.submissions(), 0);
}

// ─── Scan Tests ───────────────────────────────────────────────

fn device_scan(backend: &dyn GpuBackend, input: &[u32]) -> Vec<u32> {
    let plan = ScanPlan::new(input.len()).unwrap();
    let data = StorageBuffer::from_slice("scan_data", input);
    let aux = StorageBuffer::filled("scan_aux", plan.aux_slots(), 0u32);
    let mut queue = CommandQueue::new();
    let mut list = CommandList::new("scan");
    plan.record(&mut list, data.as_view(), aux.as_view()).unwrap();
    queue.submit_and_wait(backend, list).unwrap();
    data.read_back()
}

fn serial_exclusive_scan(input: &[u32]) -> Vec<u32> {
    let mut acc = 0u32;
    input
        .iter()
        .map(|&v| {
            let out = acc;
            acc += v;
            out
        })
        .collect()
}

#[test]
fn multi_level_scan_matches_serial() {
    let backend = parallel();
    for len in [1, 7, SCAN_BLOCK_SIZE, SCAN_BLOCK_SIZE + 1, 3 * SCAN_BLOCK_SIZE * SCAN_BLOCK_SIZE + 5] {
        let input: Vec<u32> = (0..len).map(|i| (i % 5) as u32).collect();
        assert_eq!(device_scan(&backend, &input), serial_exclusive_scan(&input), "len {len}");
    }
}

// ─── Radix Sort Tests ─────────────────────────────────────────

#[test]
fn probe_counts_slots() {
    let req = RadixSorter::probe(1000).unwrap();
    let blocks = 1000usize.div_ceil(SORT_BLOCK_SIZE);
    assert_eq!(req.records, 1000);
    assert_eq!(req.slots, 1000 + 4 * blocks);
    assert_eq!(RadixSorter::PASSES, 32);
}

#[test]
fn sorts_full_width_keys() {
    let keys = lcg_keys(3000, 11, u64::MAX);
    let values: Vec<u32> = (0..3000).collect();
    let (sorted_keys, sorted_values) = device_sort(&parallel(), &keys, &values);
    assert!(sorted_keys.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!((sorted_keys, sorted_values), reference_sort(&keys, &values));
}

#[test]
fn equal_keys_keep_input_order() {
    let keys = lcg_keys(2000, 3, 0x7); // heavy duplication
    let values: Vec<u32> = (0..2000).collect();
    let (sorted_keys, sorted_values) = device_sort(&cpu(), &keys, &values);
    for i in 1..sorted_keys.len() {
        if sorted_keys[i - 1] == sorted_keys[i] {
            assert!(sorted_values[i - 1] < sorted_values[i]);
        }
    }
}

#[test]
fn sorting_sorted_input_is_a_fixed_point() {
    let keys: Vec<u64> = (0..700).map(|i| i * 3).collect();
    let values: Vec<u32> = (0..700).rev().collect();
    let (k, v) = device_sort(&cpu(), &keys, &values);
    assert_eq!(k, keys);
    assert_eq!(v, values);
}

#[test]
fn parallel_and_sequential_agree() {
    let keys = lcg_keys(5000, 99, (1 << 40) - 1);
    let values: Vec<u32> = (0..5000).collect();
    assert_eq!(device_sort(&cpu(), &keys, &values), device_sort(&parallel(), &keys, &values));
}

#[test]
fn undersized_scratch_fails_without_side_effects() {
    let n = 500;
    let keys = StorageBuffer::from_slice("keys", &lcg_keys(n, 5, u64::MAX));
    let values = StorageBuffer::from_slice("values", &(0..n as u32).collect::<Vec<_>>());
    let before = keys.read_back();
    let req = RadixSorter::probe(n).unwrap();
    let scratch = RadixSortScratch::with_capacity(req.slots - 1, n);

    let mut list = CommandList::new("sort");
    let result = RadixSorter::record(&mut list, &keys, &values, n, &scratch);
    assert!(matches!(
        result,
        Err(TesselError::SortScratchTooSmall { required, available })
            if required == req.slots && available == req.slots - 1
    ));
    assert!(list.is_empty());
    assert_eq!(keys.read_back(), before);
}

#[test]
fn tiny_inputs_record_nothing() {
    let keys = StorageBuffer::from_slice("keys", &[42u64]);
    let values = StorageBuffer::from_slice("values", &[0u32]);
    let scratch = RadixSortScratch::new(&RadixSorter::probe(1).unwrap());
    let mut list = CommandList::new("sort");
    RadixSorter::record(&mut list, &keys, &values, 1, &scratch).unwrap();
    assert!(list.is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sort_is_a_sorted_permutation(keys in prop::collection::vec(any::<u64>(), 0..600)) {
        let values: Vec<u32> = (0..keys.len() as u32).collect();
        let (sorted_keys, sorted_values) = device_sort(&cpu(), &keys, &values);
        prop_assert!(sorted_keys.windows(2).all(|w| w[0] <= w[1]));
        let (ref_keys, ref_values) = reference_sort(&keys, &values);
        prop_assert_eq!(sorted_keys, ref_keys);
        prop_assert_eq!(sorted_values, ref_values);
    }
}
