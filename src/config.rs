//! Run configuration and its defaults
//!
//! The defaults reproduce the December 2024 LDAS forecast run over the
//! HydroBASINS level-5 area of study; every value can be overridden from the
//! command line.

use crate::catalog::{RegionId, DEFAULT_ID_FIELD};
use crate::coordinates::CoordinateAliases;
use crate::parallel::ParallelConfig;
use std::path::{Path, PathBuf};

/// Basin polygons of the area of study
pub const DEFAULT_CATALOG_URL: &str = "https://raw.githubusercontent.com/blackteacatsu/spring_2024_envs_research_amazon_ldas/main/resources/hybas_sa_lev05_areaofstudy.geojson";

/// Directory receiving the per-region tables
pub const DEFAULT_OUTPUT_DIR: &str = "get_zonal_averages_csv";

/// Directory holding the downloaded forecast files
pub const DEFAULT_FORECAST_DIR: &str = "get_ldas_raw_forecast";

/// Forecast issue embedded in the default file names
pub const DEFAULT_FORECAST_ISSUE: &str = "2024_dec01";

/// Variable/level suffixes of the default forecast files, in processing order
pub const DEFAULT_FORECAST_FIELDS: [&str; 12] = [
    "Evap_tavg_lvl_0",
    "Qair_f_tavg_lvl_0",
    "Qs_tavg_lvl_0",
    "Rainf_tavg_lvl_0",
    "SoilMoist_inst_lvl_0",
    "SoilMoist_inst_lvl_1",
    "SoilMoist_inst_lvl_2",
    "SoilMoist_inst_lvl_3",
    "SoilTemp_inst_lvl_0",
    "SoilTemp_inst_lvl_1",
    "SoilTemp_inst_lvl_2",
    "SoilTemp_inst_lvl_3",
];

/// Default forecast file list under `forecast_dir`
#[must_use]
pub fn default_forecast_files(forecast_dir: &Path) -> Vec<PathBuf> {
    DEFAULT_FORECAST_FIELDS
        .iter()
        .map(|field| forecast_dir.join(format!("ldas_fcst_{DEFAULT_FORECAST_ISSUE}_{field}.nc")))
        .collect()
}

/// Everything one pipeline run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path or URL of the GeoJSON region catalog
    pub catalog: String,
    /// Region identifier property
    pub id_field: String,
    /// Forecast files, processed in order
    pub files: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub aliases: CoordinateAliases,
    /// Restrict processing to these regions; all catalog regions when `None`
    pub regions: Option<Vec<RegionId>>,
    pub parallel: ParallelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG_URL.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            files: default_forecast_files(Path::new(DEFAULT_FORECAST_DIR)),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            aliases: CoordinateAliases::default(),
            regions: None,
            parallel: ParallelConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_files_follow_ldas_naming() {
        let files = default_forecast_files(Path::new("fcst"));
        assert_eq!(files.len(), 12);
        assert_eq!(
            files[0],
            Path::new("fcst").join("ldas_fcst_2024_dec01_Evap_tavg_lvl_0.nc")
        );
        assert!(files[11].ends_with("ldas_fcst_2024_dec01_SoilTemp_inst_lvl_3.nc"));
    }
}
