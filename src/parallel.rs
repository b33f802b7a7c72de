//! Explicit worker-pool abstraction
//!
//! Batch work (corpus preprocessing partitions, grid-search candidates) is
//! dispatched onto a fixed-size rayon pool. The degree is explicit so a
//! caller can force sequential execution; results are always joined in
//! input order, so the degree never changes the output.

use crate::error::{MbtiError, Result};

/// Fixed-size worker pool with an explicit degree of parallelism.
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    degree: usize,
}

impl WorkerPool {
    /// Create a pool with the given number of workers (at least 1).
    pub fn new(degree: usize) -> Result<Self> {
        if degree == 0 {
            return Err(MbtiError::Config(
                "worker pool degree must be at least 1".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(degree)
            .build()
            .map_err(|e| MbtiError::ThreadPool(e.to_string()))?;
        Ok(Self { pool, degree })
    }

    /// Single-worker pool; parallel operations degrade to sequential.
    pub fn sequential() -> Result<Self> {
        Self::new(1)
    }

    /// One worker per available hardware thread.
    pub fn all() -> Result<Self> {
        let degree = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(degree)
    }

    /// Number of workers in this pool.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Run a closure inside the pool so rayon parallel iterators use
    /// exactly this pool's workers.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }
}

/// Split a slice into `n` disjoint contiguous partitions covering the whole
/// slice in order. Leading partitions take the remainder, so sizes differ
/// by at most one.
pub fn split_partitions<T>(items: &[T], n: usize) -> Vec<&[T]> {
    let n = n.max(1);
    let base = items.len() / n;
    let remainder = items.len() % n;

    let mut partitions = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < remainder);
        partitions.push(&items[start..start + len]);
        start += len;
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_validation() {
        assert!(WorkerPool::new(0).is_err());
        assert_eq!(WorkerPool::new(4).unwrap().degree(), 4);
        assert_eq!(WorkerPool::sequential().unwrap().degree(), 1);
    }

    #[test]
    fn test_split_partitions_covers_in_order() {
        let items: Vec<usize> = (0..10).collect();
        let parts = split_partitions(&items, 3);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], &[0, 1, 2, 3]);
        assert_eq!(parts[1], &[4, 5, 6]);
        assert_eq!(parts[2], &[7, 8, 9]);
    }

    #[test]
    fn test_split_partitions_more_workers_than_items() {
        let items: Vec<usize> = (0..2).collect();
        let parts = split_partitions(&items, 5);
        assert_eq!(parts.len(), 5);
        let flat: Vec<usize> = parts.iter().flat_map(|p| p.iter().copied()).collect();
        assert_eq!(flat, items);
    }
}
