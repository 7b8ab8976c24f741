//! NetCDF input: loading one gridded forecast variable
//!
//! This module opens a forecast file, resolves its coordinate variables,
//! picks the primary data variable and decodes it into a `(time, lat, lon)`
//! cube of `f64` values with CF fill values turned into `NaN`.

use crate::coordinates::{resolve_coordinates, CoordinateAliases, CoordinateNames};
use crate::errors::{Result, ZonalError};
use crate::time::{decode_times, format_timestamps, group_time_steps};
use chrono::NaiveDateTime;
use log::{debug, info};
use ndarray::{Array1, Array2, Array3, ArrayD, Ix3};
use netcdf::{AttributeValue, File, Variable};
use std::path::{Path, PathBuf};

/// One forecast variable held in memory, axes ordered `(time, lat, lon)`
#[derive(Debug, Clone)]
pub struct GriddedDataset {
    pub path: PathBuf,
    pub variable: String,
    pub coordinates: CoordinateNames,
    pub times: Vec<NaiveDateTime>,
    /// Cell-centre longitudes, `(lat, lon)`
    pub lon: Array2<f64>,
    /// Cell-centre latitudes, `(lat, lon)`
    pub lat: Array2<f64>,
    /// Values with missing cells as `NaN`
    pub values: Array3<f64>,
}

impl GriddedDataset {
    /// Opens `path` and loads its primary data variable.
    ///
    /// The file handle is closed before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a coordinate is missing,
    /// no data variable exists, or the grid does not have a (time, lat, lon)
    /// layout.
    pub fn open(path: &Path, aliases: &CoordinateAliases) -> Result<Self> {
        let file = netcdf::open(path)?;
        info!("Opened NetCDF file: {}", path.display());
        Self::from_file(&file, path, aliases)
    }

    /// Loads the primary data variable from an already open file.
    ///
    /// # Errors
    ///
    /// See [`GriddedDataset::open`].
    pub fn from_file(file: &File, path: &Path, aliases: &CoordinateAliases) -> Result<Self> {
        let coords = resolve_coordinates(file, aliases)?;
        let grid = GridAxes::from_coordinates(&coords.lon, &coords.lat)?;

        let time_dims = dimension_names(&coords.time);
        let [time_dim] = time_dims.as_slice() else {
            return Err(ZonalError::grid(format!(
                "time variable '{}' must be one-dimensional",
                coords.names.time
            )));
        };

        let var = primary_variable(file, &coords.names, aliases).ok_or_else(|| {
            ZonalError::NoDataVariable {
                path: path.to_path_buf(),
            }
        })?;
        let variable = var.name().to_string();
        debug!("Primary data variable: {variable}");

        let axes = axis_order(&var, time_dim, &grid.y_dim, &grid.x_dim)?;
        let values = read_values(&var)?;
        let values = values
            .into_dimensionality::<Ix3>()?
            .permuted_axes(axes)
            .as_standard_layout()
            .into_owned();

        let raw_times = coords.time.get_values::<f64, _>(..)?;
        let units = string_attribute(&coords.time, "units")?.ok_or_else(|| {
            ZonalError::time(format!("time variable '{}' has no units", coords.names.time))
        })?;
        let calendar = string_attribute(&coords.time, "calendar")?;
        let times = decode_times(&raw_times, &units, calendar.as_deref())?;

        if values.dim().1 != grid.lon.nrows() || values.dim().2 != grid.lon.ncols() {
            return Err(ZonalError::grid(format!(
                "variable '{variable}' shape {:?} does not match grid {:?}",
                values.dim(),
                grid.lon.dim()
            )));
        }

        info!(
            "Loaded '{variable}' with {} timesteps on a {}x{} grid",
            times.len(),
            grid.lon.nrows(),
            grid.lon.ncols()
        );

        Ok(Self {
            path: path.to_path_buf(),
            variable,
            coordinates: coords.names,
            times,
            lon: grid.lon,
            lat: grid.lat,
            values,
        })
    }

    /// Distinct timestamps in canonical string form, ascending, each with
    /// the indices of the time steps carrying it
    #[must_use]
    pub fn time_groups(&self) -> (Vec<String>, Vec<Vec<usize>>) {
        let (times, steps): (Vec<_>, Vec<_>) = group_time_steps(&self.times).into_iter().unzip();
        (format_timestamps(&times), steps)
    }
}

/// Longitude/latitude as 2-D cell-centre grids plus their dimension names
struct GridAxes {
    y_dim: String,
    x_dim: String,
    lon: Array2<f64>,
    lat: Array2<f64>,
}

impl GridAxes {
    fn from_coordinates(lon: &Variable<'_>, lat: &Variable<'_>) -> Result<Self> {
        let lon_dims = dimension_names(lon);
        let lat_dims = dimension_names(lat);
        let lon_values = Array1::from(lon.get_values::<f64, _>(..)?);
        let lat_values = Array1::from(lat.get_values::<f64, _>(..)?);

        match (lon_dims.as_slice(), lat_dims.as_slice()) {
            ([x_dim], [y_dim]) => {
                let (ny, nx) = (lat_values.len(), lon_values.len());
                Ok(Self {
                    y_dim: y_dim.clone(),
                    x_dim: x_dim.clone(),
                    lon: Array2::from_shape_fn((ny, nx), |(_, i)| lon_values[i]),
                    lat: Array2::from_shape_fn((ny, nx), |(j, _)| lat_values[j]),
                })
            }
            ([lon_y, lon_x], [lat_y, lat_x]) if lon_y == lat_y && lon_x == lat_x => {
                let shape = (
                    lon.dimensions()[0].len(),
                    lon.dimensions()[1].len(),
                );
                Ok(Self {
                    y_dim: lon_y.clone(),
                    x_dim: lon_x.clone(),
                    lon: lon_values.into_shape(shape)?,
                    lat: lat_values.into_shape(shape)?,
                })
            }
            _ => Err(ZonalError::grid(format!(
                "unsupported coordinate layout: {} {lon_dims:?}, {} {lat_dims:?}",
                lon.name(),
                lat.name()
            ))),
        }
    }
}

fn dimension_names(var: &Variable<'_>) -> Vec<String> {
    var.dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect()
}

/// First variable that is neither a coordinate nor a dimension axis
fn primary_variable<'f>(
    file: &'f File,
    coords: &CoordinateNames,
    aliases: &CoordinateAliases,
) -> Option<Variable<'f>> {
    let dimension_axes: Vec<String> = file.dimensions().map(|d| d.name().to_string()).collect();
    file.variables().find(|var| {
        let name = var.name();
        !coords.contains(&name)
            && !aliases.contains(&name)
            && !dimension_axes.iter().any(|dim| *dim == name)
    })
}

/// Permutation taking the variable's axes to `(time, y, x)`
fn axis_order(var: &Variable<'_>, time_dim: &str, y_dim: &str, x_dim: &str) -> Result<[usize; 3]> {
    let dims = dimension_names(var);
    let position = |wanted: &str| {
        dims.iter().position(|d| d == wanted).ok_or_else(|| {
            ZonalError::grid(format!(
                "variable '{}' {dims:?} lacks dimension '{wanted}'",
                var.name()
            ))
        })
    };

    if dims.len() != 3 {
        return Err(ZonalError::grid(format!(
            "variable '{}' must be (time, lat, lon), found {dims:?}",
            var.name()
        )));
    }
    Ok([position(time_dim)?, position(y_dim)?, position(x_dim)?])
}

/// Reads a variable as `f64`, masking fill values and applying CF packing.
fn read_values(var: &Variable<'_>) -> Result<ArrayD<f64>> {
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
    let raw = var.get_values::<f64, _>(..)?;

    let mut missing = numeric_attribute(var, "_FillValue")?;
    missing.extend(numeric_attribute(var, "missing_value")?);
    let scale = numeric_attribute(var, "scale_factor")?.first().copied();
    let offset = numeric_attribute(var, "add_offset")?.first().copied();

    let decoded: Vec<f64> = raw
        .into_iter()
        .map(|value| {
            if !value.is_finite() || missing.contains(&value) {
                f64::NAN
            } else {
                value * scale.unwrap_or(1.0) + offset.unwrap_or(0.0)
            }
        })
        .collect();

    Ok(ArrayD::from_shape_vec(shape, decoded)?)
}

/// Numeric attribute values widened to `f64`; empty when absent
pub fn numeric_attribute(var: &Variable<'_>, name: &str) -> Result<Vec<f64>> {
    let Some(attr) = var.attribute(name) else {
        return Ok(Vec::new());
    };

    #[allow(clippy::cast_precision_loss)]
    let values = match attr.value()? {
        AttributeValue::Uchar(v) => vec![f64::from(v)],
        AttributeValue::Schar(v) => vec![f64::from(v)],
        AttributeValue::Ushort(v) => vec![f64::from(v)],
        AttributeValue::Short(v) => vec![f64::from(v)],
        AttributeValue::Uint(v) => vec![f64::from(v)],
        AttributeValue::Int(v) => vec![f64::from(v)],
        AttributeValue::Ulonglong(v) => vec![v as f64],
        AttributeValue::Longlong(v) => vec![v as f64],
        AttributeValue::Float(v) => vec![f64::from(v)],
        AttributeValue::Double(v) => vec![v],
        AttributeValue::Uchars(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Schars(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Ushorts(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Shorts(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Uints(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Ints(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Ulonglongs(vs) => vs.into_iter().map(|v| v as f64).collect(),
        AttributeValue::Longlongs(vs) => vs.into_iter().map(|v| v as f64).collect(),
        AttributeValue::Floats(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Doubles(vs) => vs,
        AttributeValue::Str(_) | AttributeValue::Strs(_) => Vec::new(),
    };
    Ok(values)
}

/// Text attribute value, if present
pub fn string_attribute(var: &Variable<'_>, name: &str) -> Result<Option<String>> {
    let Some(attr) = var.attribute(name) else {
        return Ok(None);
    };
    match attr.value()? {
        AttributeValue::Str(s) => Ok(Some(s)),
        AttributeValue::Strs(mut ss) if !ss.is_empty() => Ok(Some(ss.remove(0))),
        _ => Ok(None),
    }
}
