//! Batch distribution and thread-pool configuration for parallel trial
//! execution.
//!
//! Trials are independent, so a simulation request can be split into batches
//! that each run on their own derived RNG stream and merge by summation. The
//! simulator owns the merging; this module only decides batch boundaries and
//! worker counts.

use rayon::ThreadPoolBuilder;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; earlier batches absorb the
/// remainder.
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for batch in 0..num_batches {
        let size = base + usize::from(batch < remainder);
        ranges.push((start, start + size));
        start += size;
    }
    ranges
}

/// Worker-thread configuration for parallel simulation batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrialPool {
    /// Number of worker threads; 0 means the global Rayon pool (all cores).
    pub workers: usize,
}

impl TrialPool {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// How many batches a request should split into: a few batches per
    /// worker keeps the pool busy without shredding the trial count.
    pub fn batch_count(&self) -> usize {
        let workers = if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        };
        workers.max(1) * 4
    }

    /// Run `f` on a pool with this worker count. Worker count 0 uses the
    /// global Rayon pool.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            match ThreadPoolBuilder::new().num_threads(self.workers).build() {
                Ok(pool) => pool.install(f),
                Err(_) => f(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ranges_even_split() {
        assert_eq!(
            batch_ranges(100, 4),
            vec![(0, 25), (25, 50), (50, 75), (75, 100)]
        );
    }

    #[test]
    fn batch_ranges_remainder_goes_to_early_batches() {
        assert_eq!(batch_ranges(10, 3), vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn batch_ranges_never_exceeds_total() {
        let ranges = batch_ranges(3, 10);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges.last().unwrap().1, 3);
    }

    #[test]
    fn batch_ranges_empty_inputs() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
    }

    #[test]
    fn batch_count_scales_with_workers() {
        assert_eq!(TrialPool::with_workers(2).batch_count(), 8);
    }
}
