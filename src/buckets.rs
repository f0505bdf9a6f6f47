//! Length-percentile helpers for bucketed batch assembly.

use indexmap::IndexMap;

use crate::types::ExampleId;

/// Interior percentile boundaries over per-example lengths.
///
/// `num_buckets` buckets need `num_buckets - 1` boundaries at the
/// `k / num_buckets` percentiles. Boundaries use "higher" interpolation:
/// each is the smallest observed length at or above the exact percentile
/// position, so every boundary is a value that actually occurs.
pub fn bucket_boundaries(lengths: &IndexMap<ExampleId, u64>, num_buckets: usize) -> Vec<u64> {
    if num_buckets <= 1 || lengths.is_empty() {
        return Vec::new();
    }
    let mut sorted: Vec<u64> = lengths.values().copied().collect();
    sorted.sort_unstable();
    let last = sorted.len() - 1;
    (1..num_buckets)
        .map(|bucket| {
            let fraction = bucket as f64 / num_buckets as f64;
            let position = (fraction * last as f64).ceil() as usize;
            sorted[position.min(last)]
        })
        .collect()
}
