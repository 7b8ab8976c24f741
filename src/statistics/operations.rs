//! Core statistical operations and traits
//!
//! This module defines the spatial reductions applied to masked grids.

use crate::errors::{Result, ZonalError};
use ndarray::{Array2, Array3};

/// Variable whose zonal statistic is the maximum rather than the mean
pub const MAX_REDUCED_VARIABLE: &str = "Streamflow_tavg";

/// Supported spatial reductions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Arithmetic mean of the member cells
    Mean,
    /// Maximum value of the member cells
    Max,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Max => "maximum",
        }
    }

    /// Reduction used for a variable: streamflow peaks, everything else averages.
    ///
    /// The match is on the exact variable name.
    #[must_use]
    pub fn for_variable(variable: &str) -> Self {
        if variable == MAX_REDUCED_VARIABLE {
            Self::Max
        } else {
            Self::Mean
        }
    }

    /// Applies the operation to the finite values of `cells`; `NaN` if there are none.
    #[must_use]
    pub fn apply<I>(self, cells: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let mut finite = cells.into_iter().filter(|v| v.is_finite());
        match self {
            Self::Mean => {
                let (sum, count) = finite.fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            }
            Self::Max => finite
                .next()
                .map_or(f64::NAN, |first| finite.fold(first, f64::max)),
        }
    }
}

/// Trait for grids that can be reduced over their spatial axes under a mask
pub trait MaskedReduction {
    /// Reduce each group of time steps over the cells where `mask` is true
    ///
    /// # Errors
    ///
    /// Returns an error if the mask does not match the spatial shape or a
    /// group names a time step outside the grid.
    fn reduce_masked(
        &self,
        mask: &Array2<bool>,
        groups: &[Vec<usize>],
        operation: StatOperation,
    ) -> Result<Vec<f64>>;
}

impl MaskedReduction for Array3<f64> {
    fn reduce_masked(
        &self,
        mask: &Array2<bool>,
        groups: &[Vec<usize>],
        operation: StatOperation,
    ) -> Result<Vec<f64>> {
        let (nt, ny, nx) = self.dim();
        if mask.dim() != (ny, nx) {
            return Err(ZonalError::StatisticsError(format!(
                "mask shape {:?} does not match grid shape {:?}",
                mask.dim(),
                (ny, nx)
            )));
        }
        if let Some(&step) = groups.iter().flatten().find(|&&t| t >= nt) {
            return Err(ZonalError::StatisticsError(format!(
                "time step {step} is out of bounds for {nt} time steps"
            )));
        }
        Ok(super::parallel::parallel_masked_reduce(self, mask, groups, operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streamflow_uses_maximum() {
        assert_eq!(StatOperation::for_variable("Streamflow_tavg"), StatOperation::Max);
        assert_eq!(StatOperation::for_variable("streamflow_tavg"), StatOperation::Mean);
        assert_eq!(StatOperation::for_variable("Rainf_tavg"), StatOperation::Mean);
    }

    #[test]
    fn reductions_skip_missing_cells() {
        let cells = [1.0, f64::NAN, 3.0];
        assert_eq!(StatOperation::Mean.apply(cells), 2.0);
        assert_eq!(StatOperation::Max.apply(cells), 3.0);
        assert!(StatOperation::Mean.apply([f64::NAN]).is_nan());
        assert!(StatOperation::Max.apply(Vec::new()).is_nan());
    }
}
