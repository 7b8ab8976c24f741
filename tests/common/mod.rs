//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use ndarray::{Array1, Array3};
use netcdf::{create, FileMut};
use ru_ne_zonal::errors::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Two basins on a 2x2 grid with cell centres at 0.5 and 1.5 degrees:
/// region 10 covers the southern row, region 20 the northern row.
pub const BASINS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"PFAF_ID": 10},
         "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 1], [0, 1], [0, 0]]]}},
        {"type": "Feature", "properties": {"PFAF_ID": 20},
         "geometry": {"type": "Polygon", "coordinates": [[[0, 1], [2, 1], [2, 2], [0, 2], [0, 1]]]}}
    ]
}"#;

pub const GRID_LAT: [f32; 2] = [0.5, 1.5];
pub const GRID_LON: [f32; 2] = [0.5, 1.5];

/// Writes the basin catalog next to the test data and returns its path
pub fn write_catalog(dir: &Path, geojson: &str) -> PathBuf {
    let path = dir.join("basins.geojson");
    fs::write(&path, geojson).expect("Failed to write catalog");
    path
}

/// Creates a forecast file holding only the `time`, `lat` and `lon`
/// coordinates of the 2x2 test grid; the caller adds the data variable.
///
/// `time_days` are offsets in days from 2024-12-01.
pub fn create_forecast_grid(path: &Path, time_days: &[f64]) -> Result<FileMut> {
    let mut file = create(path)?;

    file.add_dimension("time", time_days.len())?;
    file.add_dimension("lat", GRID_LAT.len())?;
    file.add_dimension("lon", GRID_LON.len())?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 2024-12-01 00:00:00")?;
        time_var.put_attribute("calendar", "standard")?;
        time_var.put(Array1::from(time_days.to_vec()).view(), ..)?;
    }
    {
        let mut lat_var = file.add_variable::<f32>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put(Array1::from(GRID_LAT.to_vec()).view(), ..)?;
    }
    {
        let mut lon_var = file.add_variable::<f32>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put(Array1::from(GRID_LON.to_vec()).view(), ..)?;
    }

    Ok(file)
}

/// Creates a CF-style forecast file on the 2x2 test grid.
///
/// `time_days` are offsets in days from 2024-12-01; `values` are laid out
/// `(time, lat, lon)`.
pub fn write_forecast(
    path: &Path,
    variable: &str,
    time_days: &[f64],
    values: &[f32],
    fill_value: Option<f32>,
) -> Result<()> {
    let mut file = create_forecast_grid(path, time_days)?;

    let mut var = file.add_variable::<f32>(variable, &["time", "lat", "lon"])?;
    if let Some(fill) = fill_value {
        var.put_attribute("_FillValue", fill)?;
    }
    let data = Array3::from_shape_vec(
        (time_days.len(), GRID_LAT.len(), GRID_LON.len()),
        values.to_vec(),
    )?;
    var.put(data.view(), ..)?;

    Ok(())
}

/// Reads a CSV output as trimmed lines
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read CSV output")
        .lines()
        .map(str::to_string)
        .collect()
}
