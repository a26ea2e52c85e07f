use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls on which threads the point cloud operations run.
///
/// Every operation in this crate is a data parallel map or reduction over the
/// point indices and runs on the current Rayon pool. The strategy selects that
/// pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool.
    #[default]
    Parallel,

    /// Run on a single worker thread.
    ///
    /// Useful for small clouds, debugging, or when the overhead of
    /// parallelization outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Run `op` under this strategy and return its result.
    ///
    /// Example:
    ///
    /// ```
    /// use kornia_pointcloud::{ExecutionStrategy, PointCloud};
    ///
    /// let pcd = PointCloud::from_points(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);
    /// let max = ExecutionStrategy::Serial.install(|| pcd.get_max_bound()).unwrap();
    /// assert_eq!(max.to_array(), [1.0, 2.0, 3.0]);
    /// ```
    pub fn install<R, F>(self, op: F) -> Result<R, ParallelError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        let num_threads = match self {
            ExecutionStrategy::Parallel => return Ok(op()),
            ExecutionStrategy::Serial => 1,
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                n
            }
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| ParallelError::BuildError(e.to_string()))?;

        Ok(pool.install(op))
    }
}
