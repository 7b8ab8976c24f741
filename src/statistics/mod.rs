//! Zonal statistics over masked grids
//!
//! # Organization
//!
//! This module is organized into submodules:
//! - [`operations`]: the mean/max reductions and the [`MaskedReduction`] trait
//! - [`parallel`]: per-time-step reductions on the Rayon pool
//! - [`zonal`]: per-file, per-region time series

pub mod operations;
pub mod parallel;
pub mod zonal;

// Re-export the main types and functions for convenience
pub use operations::{MaskedReduction, StatOperation, MAX_REDUCED_VARIABLE};
pub use parallel::parallel_masked_reduce;
pub use zonal::{ZonalReducer, ZonalSeries};
