use std::sync::atomic::{AtomicU8, Ordering};

use rayon::prelude::*;

/// Output items processed per merge-path partition.
pub(crate) const EXPAND_GRAIN: usize = 2048;

/// Flags scanned per block in the two-phase compact.
const COMPACT_BLOCK: usize = 4096;

/// Exclusive prefix sum of `n` counts produced by `count`, written into
/// `out` as `n + 1` entries; returns the total.
pub fn exclusive_scan_by<F>(n: usize, count: F, out: &mut Vec<u32>) -> u32
where
    F: Fn(usize) -> u32,
{
    out.clear();
    out.reserve(n + 1);
    let mut acc = 0u32;
    for i in 0..n {
        out.push(acc);
        acc += count(i);
    }
    out.push(acc);
    acc
}

/// Index of the segment owning output position `diagonal`: the largest `i`
/// with `scan[i] <= diagonal`, for an exclusive scan of length `n + 1`.
/// Zero-width segments are skipped in favor of the last candidate.
pub fn merge_path_search(scan: &[u32], diagonal: u32) -> usize {
    scan.partition_point(|&s| s <= diagonal) - 1
}

/// Splits `total` output positions into `EXPAND_GRAIN`-sized partitions and
/// returns each partition's first owning segment, found by upper-bound
/// search on the scan. This is the load-balanced-search decomposition: the
/// partition points cost `O(P log n)` and let every worker walk its range
/// without scanning the segment array from the start.
pub fn merge_path_partitions(scan: &[u32], total: usize) -> Vec<usize> {
    let n_partitions = total.div_ceil(EXPAND_GRAIN);
    (0..n_partitions)
        .into_par_iter()
        .map(|p| merge_path_search(scan, (p * EXPAND_GRAIN) as u32))
        .collect()
}

/// Load-balanced expansion writing one `(key, value)` per output position.
///
/// `scan` is the exclusive per-segment count scan with `scan[n] == total`;
/// `fill(segment, rank)` produces the item for the `rank`-th output of
/// `segment`. Output order is the segment order, so equal keys emitted by
/// one segment land contiguously.
pub fn expand_into<K, V, F>(scan: &[u32], total: usize, keys_out: &mut [K], vals_out: &mut [V], fill: F)
where
    K: Send,
    V: Send,
    F: Fn(usize, u32) -> (K, V) + Sync,
{
    let partitions = merge_path_partitions(scan, total);
    keys_out[..total]
        .par_chunks_mut(EXPAND_GRAIN)
        .zip(vals_out[..total].par_chunks_mut(EXPAND_GRAIN))
        .zip(partitions.par_iter())
        .enumerate()
        .for_each(|(p, ((key_chunk, val_chunk), &first_segment))| {
            let base = (p * EXPAND_GRAIN) as u32;
            let mut seg = first_segment;
            for j in 0..key_chunk.len() {
                let t = base + j as u32;
                while scan[seg + 1] <= t {
                    seg += 1;
                }
                let (k, v) = fill(seg, t - scan[seg]);
                key_chunk[j] = k;
                val_chunk[j] = v;
            }
        });
}

/// Load-balanced expansion without an output buffer: `visit(segment, rank)`
/// runs once per output position, partitioned across threads. Used for
/// interval-gather style side effects onto idempotent targets.
pub fn for_each_expanded<F>(scan: &[u32], total: usize, visit: F)
where
    F: Fn(usize, u32) + Sync,
{
    let partitions = merge_path_partitions(scan, total);
    partitions.par_iter().enumerate().for_each(|(p, &first_segment)| {
        let start = p * EXPAND_GRAIN;
        let end = ((p + 1) * EXPAND_GRAIN).min(total);
        let mut seg = first_segment;
        for t in start..end {
            while scan[seg + 1] <= t as u32 {
                seg += 1;
            }
            visit(seg, t as u32 - scan[seg]);
        }
    });
}

/// Segmented reduce over contiguous runs of equal keys; `emit` is invoked
/// once per run, in run order. Callers must deliver equal keys adjacent;
/// the expansion above guarantees that.
pub fn reduce_by_key_runs<V, R, E>(keys: &[u32], values: &[V], reduce: R, mut emit: E)
where
    V: Clone + Send + Sync,
    R: Fn(&V, &V) -> V + Sync,
    E: FnMut(u32, V),
{
    if keys.is_empty() {
        return;
    }
    let mut bounds = Vec::with_capacity(64);
    bounds.push(0usize);
    bounds.par_extend(
        (1..keys.len())
            .into_par_iter()
            .filter(|&i| keys[i] != keys[i - 1]),
    );
    bounds.push(keys.len());

    let reduced: Vec<(u32, V)> = bounds
        .par_windows(2)
        .map(|w| {
            let run = &values[w[0]..w[1]];
            let mut acc = run[0].clone();
            for v in &run[1..] {
                acc = reduce(&acc, v);
            }
            (keys[w[0]], acc)
        })
        .collect();

    for (k, v) in reduced {
        emit(k, v);
    }
}

/// Resets every activation flag.
pub fn clear_flags(flags: &[AtomicU8]) {
    flags.par_iter().for_each(|f| f.store(0, Ordering::Relaxed));
}

/// Two-phase compaction of set flags into a dense ascending index list:
/// per-block counts, a scan over the counts, then per-block scatter into
/// disjoint output ranges. Returns the number of set flags.
pub fn compact_flags(flags: &[AtomicU8], out: &mut Vec<u32>) -> usize {
    let counts: Vec<u32> = flags
        .par_chunks(COMPACT_BLOCK)
        .map(|block| block.iter().filter(|f| f.load(Ordering::Relaxed) != 0).count() as u32)
        .collect();

    let total: usize = counts.iter().map(|&c| c as usize).sum();
    out.clear();
    out.resize(total, 0);

    let mut block_outputs: Vec<&mut [u32]> = Vec::with_capacity(counts.len());
    let mut rest: &mut [u32] = out.as_mut_slice();
    for &c in &counts {
        let (head, tail) = rest.split_at_mut(c as usize);
        block_outputs.push(head);
        rest = tail;
    }

    flags
        .par_chunks(COMPACT_BLOCK)
        .zip(block_outputs.into_par_iter())
        .enumerate()
        .for_each(|(b, (block, dst))| {
            let mut w = 0usize;
            for (i, f) in block.iter().enumerate() {
                if f.load(Ordering::Relaxed) != 0 {
                    dst[w] = (b * COMPACT_BLOCK + i) as u32;
                    w += 1;
                }
            }
        });

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_from(bits: &[u8]) -> Vec<AtomicU8> {
        bits.iter().map(|&b| AtomicU8::new(b)).collect()
    }

    #[test]
    fn scan_totals_and_offsets() {
        let counts = [3u32, 0, 1, 2];
        let mut out = Vec::new();
        let total = exclusive_scan_by(counts.len(), |i| counts[i], &mut out);
        assert_eq!(total, 6);
        assert_eq!(out, vec![0, 3, 3, 4, 6]);
    }

    #[test]
    fn search_skips_empty_segments() {
        let scan = [0u32, 2, 2, 5];
        assert_eq!(merge_path_search(&scan, 0), 0);
        assert_eq!(merge_path_search(&scan, 1), 0);
        assert_eq!(merge_path_search(&scan, 2), 2);
        assert_eq!(merge_path_search(&scan, 4), 2);
    }

    #[test]
    fn expansion_matches_a_naive_walk() {
        let counts: Vec<u32> = (0..500).map(|i| (i * 7 + 3) % 11).collect();
        let mut scan = Vec::new();
        let total = exclusive_scan_by(counts.len(), |i| counts[i], &mut scan) as usize;

        let mut keys = vec![0u32; total];
        let mut vals = vec![0u64; total];
        expand_into(&scan, total, &mut keys, &mut vals, |seg, rank| {
            (seg as u32, (seg * 1000) as u64 + rank as u64)
        });

        let mut expected_keys = Vec::with_capacity(total);
        let mut expected_vals = Vec::with_capacity(total);
        for (seg, &c) in counts.iter().enumerate() {
            for rank in 0..c {
                expected_keys.push(seg as u32);
                expected_vals.push((seg * 1000) as u64 + rank as u64);
            }
        }
        assert_eq!(keys, expected_keys);
        assert_eq!(vals, expected_vals);
    }

    #[test]
    fn side_effect_expansion_covers_every_position() {
        use std::sync::atomic::AtomicU32;
        let counts = [2u32, 0, 3, 1];
        let mut scan = Vec::new();
        let total = exclusive_scan_by(counts.len(), |i| counts[i], &mut scan) as usize;

        let hits: Vec<AtomicU32> = (0..counts.len()).map(|_| AtomicU32::new(0)).collect();
        for_each_expanded(&scan, total, |seg, _rank| {
            hits[seg].fetch_add(1, Ordering::Relaxed);
        });
        let observed: Vec<u32> = hits.iter().map(|h| h.load(Ordering::Relaxed)).collect();
        assert_eq!(observed, counts);
    }

    #[test]
    fn run_reduce_folds_each_key_once() {
        let keys = [5u32, 5, 5, 9, 9, 12];
        let vals = [1u64, 2, 3, 10, 20, 7];
        let mut seen = Vec::new();
        reduce_by_key_runs(&keys, &vals, |a, b| a + b, |k, v| seen.push((k, v)));
        assert_eq!(seen, vec![(5, 6), (9, 30), (12, 7)]);
    }

    #[test]
    fn compact_preserves_ascending_order() {
        let mut bits = vec![0u8; 10_000];
        for i in (0..bits.len()).step_by(7) {
            bits[i] = 1;
        }
        let flags = flags_from(&bits);
        let mut out = Vec::new();
        let total = compact_flags(&flags, &mut out);
        let expected: Vec<u32> = (0..bits.len() as u32).filter(|i| i % 7 == 0).collect();
        assert_eq!(total, expected.len());
        assert_eq!(out, expected);
    }

    #[test]
    fn compact_of_cleared_flags_is_empty() {
        let flags = flags_from(&[1, 1, 1]);
        clear_flags(&flags);
        let mut out = Vec::new();
        assert_eq!(compact_flags(&flags, &mut out), 0);
        assert!(out.is_empty());
    }
}
