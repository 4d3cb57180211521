//! Bounded worker pool with order-preserving collection.

use rayon::prelude::*;

/// Dispatches independent units of work to a bounded number of workers.
///
/// Results always come back in submission order: each task is tagged with
/// its index at submission and the collected results are sorted by that
/// index, so completion order never leaks into reassembly. The first
/// failing task fails the whole batch.
///
/// With `jobs <= 1` tasks run inline on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    jobs: usize,
}

impl WorkerPool {
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    /// Worker count.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run independent tasks, returning their results in submission order.
    pub fn run<T, E, F>(&self, tasks: Vec<F>) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send,
        T: Send,
        E: Send,
    {
        if self.jobs <= 1 || tasks.len() <= 1 {
            return tasks.into_iter().map(|task| task()).collect();
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                tracing::warn!(%err, "worker pool unavailable, running sequentially");
                return tasks.into_iter().map(|task| task()).collect();
            }
        };

        pool.install(|| {
            let mut indexed: Vec<(usize, Result<T, E>)> = tasks
                .into_par_iter()
                .enumerate()
                .map(|(index, task)| (index, task()))
                .collect();
            indexed.sort_by_key(|(index, _)| *index);
            indexed.into_iter().map(|(_, result)| result).collect()
        })
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_preserves_order() {
        let pool = WorkerPool::new(1);
        let tasks: Vec<_> = (0..8)
            .map(|i| move || Ok::<_, ()>(i * 10))
            .collect();
        let results = pool.run(tasks).unwrap();
        assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn test_parallel_results_in_submission_order() {
        let pool = WorkerPool::new(4);
        // later tasks finish first
        let tasks: Vec<_> = (0..16u64)
            .map(|i| {
                move || {
                    std::thread::sleep(std::time::Duration::from_millis(16 - i));
                    Ok::<_, ()>(i)
                }
            })
            .collect();
        let results = pool.run(tasks).unwrap();
        assert_eq!(results, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_error_fails_batch() {
        let pool = WorkerPool::new(2);
        let tasks: Vec<Box<dyn FnOnce() -> Result<u32, String> + Send>> = vec![
            Box::new(|| Ok(1)),
            Box::new(|| Err("boom".to_string())),
            Box::new(|| Ok(3)),
        ];
        assert!(pool.run(tasks).is_err());
    }
}
