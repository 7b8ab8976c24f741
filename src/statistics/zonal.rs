//! Per-file zonal reduction
//!
//! A [`ZonalReducer`] is built once per loaded file and then asked for one
//! [`ZonalSeries`] per region. Each call rasterizes the region afresh.

use super::operations::{MaskedReduction, StatOperation};
use crate::catalog::{RegionCatalog, RegionId};
use crate::errors::Result;
use crate::masking::{wrap_longitudes, RegionMask};
use crate::netcdf_io::GriddedDataset;
use log::debug;
use ndarray::Array2;

/// Reduced time series of one variable over one region
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalSeries {
    pub region: RegionId,
    pub variable: String,
    pub operation: StatOperation,
    /// Distinct canonical timestamps of the source file, ascending
    pub times: Vec<String>,
    /// One value per timestamp; `NaN` when no member cell had data
    pub values: Vec<f64>,
}

impl ZonalSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// `(timestamp, value)` pairs in time order
    pub fn rows(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.times
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Computes zonal series for every region of one gridded file
pub struct ZonalReducer<'a> {
    dataset: &'a GriddedDataset,
    catalog: &'a RegionCatalog,
    lon: Array2<f64>,
    timestamps: Vec<String>,
    time_steps: Vec<Vec<usize>>,
    operation: StatOperation,
}

impl<'a> ZonalReducer<'a> {
    #[must_use]
    pub fn new(dataset: &'a GriddedDataset, catalog: &'a RegionCatalog) -> Self {
        let operation = StatOperation::for_variable(&dataset.variable);
        debug!(
            "Reducing '{}' with {} over regions",
            dataset.variable,
            operation.as_str()
        );
        let (timestamps, time_steps) = dataset.time_groups();
        Self {
            dataset,
            catalog,
            lon: wrap_longitudes(dataset.lon.view(), catalog.bounds()),
            timestamps,
            time_steps,
            operation,
        }
    }

    #[must_use]
    pub fn operation(&self) -> StatOperation {
        self.operation
    }

    /// Series for `region`, or `None` when the catalog has no polygon for it.
    ///
    /// A region whose polygons cover no grid cell still yields a series, with
    /// every value missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid and mask shapes disagree.
    pub fn reduce(&self, region: &RegionId) -> Result<Option<ZonalSeries>> {
        let subset = self.catalog.subset(region);
        if subset.is_empty() {
            debug!("No polygon for region {region}, skipping");
            return Ok(None);
        }

        let mask = RegionMask::rasterize(&subset, self.lon.view(), self.dataset.lat.view())?;
        let members = mask.union();
        debug!(
            "Region {region}: {} of {} cells inside",
            members.iter().filter(|&&inside| inside).count(),
            members.len()
        );

        let values = self
            .dataset
            .values
            .reduce_masked(&members, &self.time_steps, self.operation)?;

        Ok(Some(ZonalSeries {
            region: region.clone(),
            variable: self.dataset.variable.clone(),
            operation: self.operation,
            times: self.timestamps.clone(),
            values,
        }))
    }
}
