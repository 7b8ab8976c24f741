//! Defines command-line interface options using `clap` for the RuNeZonal application.

use crate::catalog::{RegionId, DEFAULT_ID_FIELD};
use crate::config::{
    default_forecast_files, PipelineConfig, DEFAULT_CATALOG_URL, DEFAULT_FORECAST_DIR,
    DEFAULT_OUTPUT_DIR,
};
use crate::coordinates::CoordinateAliases;
use crate::parallel::ParallelConfig;
use clap::Parser;
use std::path::PathBuf;

/// Zonal statistics of NetCDF forecasts over basin polygons
#[derive(Parser, Debug)]
#[command(
    version,
    name = "RuNeZonal",
    about = "Accumulate per-basin zonal means of NetCDF forecast variables into CSV files"
)]
pub struct Args {
    /// NetCDF files to process, in order. Defaults to the LDAS forecast set under --forecast-dir
    pub files: Vec<PathBuf>,

    /// Directory holding the default forecast files
    #[arg(long, default_value = DEFAULT_FORECAST_DIR)]
    pub forecast_dir: PathBuf,

    /// Path or URL of the GeoJSON region catalog
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    pub catalog: String,

    /// Directory receiving one pfaf_<id>.csv per region
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Region identifier property in the catalog
    #[arg(long, default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Only process these region identifiers (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub pfaf_ids: Option<Vec<String>>,

    /// Accepted longitude variable names, searched in order (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub lon_names: Option<Vec<String>>,

    /// Accepted latitude variable names, searched in order (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub lat_names: Option<Vec<String>>,

    /// Accepted time variable names, searched in order (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub time_names: Option<Vec<String>>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads for per-timestamp reductions. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

impl Args {
    /// Turns parsed arguments into a run configuration
    #[must_use]
    pub fn into_config(self) -> PipelineConfig {
        let files = if self.files.is_empty() {
            default_forecast_files(&self.forecast_dir)
        } else {
            self.files
        };

        PipelineConfig {
            catalog: self.catalog,
            id_field: self.id_field,
            files,
            output_dir: self.output_dir,
            aliases: CoordinateAliases::new(self.lon_names, self.lat_names, self.time_names),
            regions: self
                .pfaf_ids
                .map(|ids| ids.iter().map(|id| RegionId::new(id.trim())).collect()),
            parallel: ParallelConfig::new(self.threads),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_metadata_names_this_tool() {
        let command = Args::command();
        assert_eq!(command.get_name(), "RuNeZonal");
        assert!(command.get_author().is_none());
        command.debug_assert();
    }

    #[test]
    fn defaults_reproduce_the_forecast_run() {
        let config = Args::parse_from(["ru_ne_zonal"]).into_config();
        assert_eq!(config.catalog, DEFAULT_CATALOG_URL);
        assert_eq!(config.output_dir, PathBuf::from("get_zonal_averages_csv"));
        assert_eq!(config.files.len(), 12);
        assert!(config.regions.is_none());
        assert_eq!(config.aliases, CoordinateAliases::default());
    }

    #[test]
    fn lists_split_on_commas() {
        let config = Args::parse_from([
            "ru_ne_zonal",
            "a.nc",
            "b.nc",
            "--pfaf-ids",
            "10,20",
            "--lon-names",
            "x,lon",
            "--threads",
            "4",
        ])
        .into_config();
        assert_eq!(config.files, vec![PathBuf::from("a.nc"), PathBuf::from("b.nc")]);
        assert_eq!(
            config.regions,
            Some(vec![RegionId::new("10"), RegionId::new("20")])
        );
        assert_eq!(config.aliases.lon, vec!["x", "lon"]);
        assert_eq!(config.aliases.time, vec!["time"]);
        assert_eq!(config.parallel.num_threads, Some(4));
    }
}
