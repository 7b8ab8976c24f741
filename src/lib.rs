//! RuNeZonal: zonal statistics of NetCDF forecasts over basin polygons
//!
//! RuNeZonal reduces gridded land-surface model output (LDAS/LIS NetCDF
//! forecasts) to per-basin time series. Each grid is masked against the
//! polygons of a GeoJSON region catalog, reduced over its spatial axes for
//! every timestamp, and merged into one CSV table per region.
//!
//! ## Key Features
//!
//! - **Coordinate aliases**: finds longitude, latitude and time under LIS or CF names
//! - **CF decoding**: fill values, packing attributes and `"<unit> since <date>"` time axes
//! - **Polygon masking**: cell-centre rasterization with longitude wrapping
//! - **Zonal reductions**: mean per timestamp, maximum for `Streamflow_tavg`
//! - **CSV accumulation**: outer merge on `time`, one column per variable
//!
//! ## Module Organization
//!
//! - [`coordinates`]: coordinate variable resolution
//! - [`catalog`]: GeoJSON region catalog loading
//! - [`netcdf_io`]: loading one forecast variable into memory
//! - [`time`]: CF time decoding and canonical timestamps
//! - [`masking`]: rasterizing polygons onto the grid
//! - [`statistics`]: masked reductions and per-region series
//! - [`accumulator`]: per-region CSV tables
//! - [`pipeline`]: the sequential file × region driver
//! - [`config`], [`cli`]: run configuration
//! - [`parallel`]: Rayon pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ru_ne_zonal::prelude::*;
//! use std::path::PathBuf;
//!
//! let config = PipelineConfig {
//!     catalog: "basins.geojson".to_string(),
//!     files: vec![PathBuf::from("ldas_fcst_2024_dec01_Rainf_tavg_lvl_0.nc")],
//!     ..PipelineConfig::default()
//! };
//! let summary = ru_ne_zonal::pipeline::run(&config).unwrap();
//! println!("{} tables written", summary.written.len());
//! ```

// Core modules
pub mod accumulator;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinates;
pub mod errors;
pub mod masking;
pub mod netcdf_io;
pub mod parallel;
pub mod pipeline;
pub mod statistics;
pub mod time;

// Direct re-exports for the public API
pub use accumulator::{CsvAccumulator, RegionOutputTable};
pub use catalog::{RegionCatalog, RegionId, RegionPolygon};
pub use coordinates::{resolve_coordinates, CoordinateAliases, CoordinateNames};
pub use errors::{Result, ZonalError};
pub use masking::RegionMask;
pub use netcdf_io::GriddedDataset;
pub use pipeline::{run, RunSummary};
pub use statistics::{StatOperation, ZonalReducer, ZonalSeries};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::accumulator::{CsvAccumulator, RegionOutputTable};
    pub use crate::catalog::{RegionCatalog, RegionId};
    pub use crate::config::PipelineConfig;
    pub use crate::coordinates::CoordinateAliases;
    pub use crate::errors::{Result, ZonalError};
    pub use crate::netcdf_io::GriddedDataset;
    pub use crate::parallel::ParallelConfig;
    pub use crate::statistics::{MaskedReduction, StatOperation, ZonalReducer, ZonalSeries};
}
