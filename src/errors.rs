//! Centralized error handling for RuNeZonal
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the structured [`ZonalError`]. Nothing is retried: the pipeline is a one-shot
//! batch run, so errors propagate up to `main` and halt it.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for RuNeZonal operations
#[derive(Debug, Error)]
pub enum ZonalError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// None of the accepted aliases for a coordinate role exist in the dataset
    #[error("None of the {role} variable names {aliases:?} found in the dataset")]
    MissingCoordinate { role: String, aliases: Vec<String> },

    /// Statistics computation errors
    #[error("Statistics computation error: {0}")]
    StatisticsError(String),

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// The dataset holds only coordinate variables
    #[error("No data variable found in '{}'", path.display())]
    NoDataVariable { path: PathBuf },

    /// Coordinate or data variable does not fit a (time, lat, lon) grid
    #[error("Invalid grid: {message}")]
    InvalidGrid { message: String },

    /// CF time units or calendar could not be decoded
    #[error("Cannot decode time: {message}")]
    TimeDecode { message: String },

    /// Region catalog resource unreachable or malformed
    #[error("Failed to load region catalog '{source_name}': {message}")]
    CatalogLoad { source_name: String, message: String },

    /// CSV parsing or writing errors
    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Existing output table does not have the expected layout
    #[error("Malformed table '{}': {message}", path.display())]
    MalformedTable { path: PathBuf, message: String },

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),
}

impl ZonalError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn catalog(source_name: &str, message: impl ToString) -> Self {
        Self::CatalogLoad {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }

    pub(crate) fn time(message: impl Into<String>) -> Self {
        Self::TimeDecode {
            message: message.into(),
        }
    }
}

/// Result type alias for RuNeZonal operations
pub type Result<T> = std::result::Result<T, ZonalError>;
