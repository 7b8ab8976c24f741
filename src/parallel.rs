//! Parallel processing configuration and management
//!
//! Files and regions are always processed one after another. Only the
//! per-timestamp reductions inside one (file, region) step use Rayon, and this
//! module configures the global pool they run on.

use crate::errors::{Result, ZonalError};
use log::info;
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    #[must_use]
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Set up the global Rayon thread pool with the specified configuration
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::ThreadPool`] if the pool was already built or the
    /// thread count is rejected.
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    ZonalError::ThreadPool(format!(
                        "Failed to initialize thread pool with {num_threads} threads: {e}"
                    ))
                })?;

            info!("Configured parallel reductions with {num_threads} threads");
        } else {
            info!("Using default thread pool configuration");
        }

        Ok(())
    }
}

/// Get information about the current parallel configuration
#[must_use]
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
        available_parallelism: std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1),
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    /// Log parallel processing information
    pub fn log_info(&self) {
        info!(
            "Reduction threads: {} (CPU cores: {}, available parallelism: {})",
            self.current_threads, self.available_cores, self.available_parallelism
        );
    }
}
