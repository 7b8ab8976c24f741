//! The zonal statistics pipeline
//!
//! The catalog is loaded once. Each forecast file is then opened, reduced over
//! every region in turn and dropped before the next file is opened. Every
//! reduced series is merged into its region's CSV straight away.

use crate::accumulator::CsvAccumulator;
use crate::catalog::{RegionCatalog, RegionId};
use crate::config::PipelineConfig;
use crate::coordinates::CoordinateAliases;
use crate::errors::Result;
use crate::netcdf_io::GriddedDataset;
use crate::statistics::ZonalReducer;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    /// Every CSV write, in order; a region appears once per file
    pub written: Vec<PathBuf>,
    /// (file, region) pairs skipped because the region had no polygon
    pub regions_skipped: usize,
}

/// Runs the whole pipeline described by `config`.
///
/// # Errors
///
/// Any error halts the run: catalog load failures, unreadable or malformed
/// forecast files, and unreadable existing CSV tables.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let accumulator = CsvAccumulator::new(&config.output_dir, &config.id_field)?;
    let catalog = RegionCatalog::load(&config.catalog, &config.id_field)?;
    run_with_catalog(config, &catalog, &accumulator)
}

/// Runs the pipeline against an already loaded catalog.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_catalog(
    config: &PipelineConfig,
    catalog: &RegionCatalog,
    accumulator: &CsvAccumulator,
) -> Result<RunSummary> {
    let regions = config
        .regions
        .clone()
        .unwrap_or_else(|| catalog.unique_ids());
    info!(
        "Processing {} files over {} regions",
        config.files.len(),
        regions.len()
    );

    let mut summary = RunSummary::default();
    for path in &config.files {
        process_file(path, &config.aliases, catalog, &regions, accumulator, &mut summary)?;
        summary.files_processed += 1;
    }

    info!(
        "Finished: {} files, {} CSV writes, {} regions skipped",
        summary.files_processed,
        summary.written.len(),
        summary.regions_skipped
    );
    Ok(summary)
}

/// Reduces one forecast file over `regions` and accumulates the results.
///
/// # Errors
///
/// See [`run`].
pub fn process_file(
    path: &Path,
    aliases: &CoordinateAliases,
    catalog: &RegionCatalog,
    regions: &[RegionId],
    accumulator: &CsvAccumulator,
    summary: &mut RunSummary,
) -> Result<()> {
    let dataset = GriddedDataset::open(path, aliases)?;
    let reducer = ZonalReducer::new(&dataset, catalog);
    info!(
        "{}: '{}' ({} over regions)",
        path.display(),
        dataset.variable,
        reducer.operation().as_str()
    );

    for region in regions {
        let Some(series) = reducer.reduce(region)? else {
            summary.regions_skipped += 1;
            continue;
        };
        let written = accumulator.accumulate(&series)?;
        println!("Saved: {}", written.display());
        summary.written.push(written);
    }

    debug!("Closing {}", path.display());
    Ok(())
}
