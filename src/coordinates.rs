//! Coordinate variable resolution
//!
//! Land-surface model output does not agree on coordinate names: LIS/LDAS files
//! use `east_west`/`north_south`, CF-style files use `lon`/`lat` or
//! `longitude`/`latitude`. This module finds the longitude, latitude and time
//! variables of a dataset under any of a list of accepted aliases.

use crate::errors::{Result, ZonalError};
use netcdf::{File, Variable};
use std::fmt;

/// Default longitude aliases, searched in order
pub const DEFAULT_LON_NAMES: [&str; 3] = ["east_west", "lon", "longitude"];
/// Default latitude aliases, searched in order
pub const DEFAULT_LAT_NAMES: [&str; 3] = ["north_south", "lat", "latitude"];
/// Default time aliases, searched in order
pub const DEFAULT_TIME_NAMES: [&str; 1] = ["time"];

/// The role a coordinate variable plays in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateRole {
    Longitude,
    Latitude,
    Time,
}

impl CoordinateRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Longitude => "longitude",
            Self::Latitude => "latitude",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for CoordinateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted names for each coordinate role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateAliases {
    pub lon: Vec<String>,
    pub lat: Vec<String>,
    pub time: Vec<String>,
}

impl Default for CoordinateAliases {
    fn default() -> Self {
        Self {
            lon: to_owned(&DEFAULT_LON_NAMES),
            lat: to_owned(&DEFAULT_LAT_NAMES),
            time: to_owned(&DEFAULT_TIME_NAMES),
        }
    }
}

impl CoordinateAliases {
    /// Build alias lists, falling back to the defaults for any role left unset
    /// or given an empty list.
    #[must_use]
    pub fn new(
        lon: Option<Vec<String>>,
        lat: Option<Vec<String>>,
        time: Option<Vec<String>>,
    ) -> Self {
        let defaults = Self::default();
        let pick = |given: Option<Vec<String>>, fallback: Vec<String>| {
            given.filter(|names| !names.is_empty()).unwrap_or(fallback)
        };
        Self {
            lon: pick(lon, defaults.lon),
            lat: pick(lat, defaults.lat),
            time: pick(time, defaults.time),
        }
    }

    /// Alias list for one role
    #[must_use]
    pub fn for_role(&self, role: CoordinateRole) -> &[String] {
        match role {
            CoordinateRole::Longitude => &self.lon,
            CoordinateRole::Latitude => &self.lat,
            CoordinateRole::Time => &self.time,
        }
    }

    /// Whether `name` is listed under any role
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lon
            .iter()
            .chain(&self.lat)
            .chain(&self.time)
            .any(|alias| alias == name)
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Names of the coordinate variables found in a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateNames {
    pub lon: String,
    pub lat: String,
    pub time: String,
}

impl CoordinateNames {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lon == name || self.lat == name || self.time == name
    }
}

/// Coordinate variables borrowed from an open NetCDF file
pub struct CoordinateVariables<'f> {
    pub names: CoordinateNames,
    pub lon: Variable<'f>,
    pub lat: Variable<'f>,
    pub time: Variable<'f>,
}

/// Returns the first alias for which `has_variable` holds.
///
/// # Errors
///
/// Returns [`ZonalError::MissingCoordinate`] naming the role and the searched
/// aliases when none is present.
pub fn find_variable_name<F>(has_variable: F, role: CoordinateRole, aliases: &[String]) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    aliases
        .iter()
        .find(|name| has_variable(name))
        .cloned()
        .ok_or_else(|| ZonalError::MissingCoordinate {
            role: role.to_string(),
            aliases: aliases.to_vec(),
        })
}

/// Resolves the three coordinate names through a presence predicate.
///
/// Roles are resolved longitude, latitude, time; the first role without a
/// match is the one reported.
///
/// # Errors
///
/// Returns [`ZonalError::MissingCoordinate`] for the first unmatched role.
pub fn resolve_names<F>(has_variable: F, aliases: &CoordinateAliases) -> Result<CoordinateNames>
where
    F: Fn(&str) -> bool,
{
    let lon = find_variable_name(&has_variable, CoordinateRole::Longitude, &aliases.lon)?;
    let lat = find_variable_name(&has_variable, CoordinateRole::Latitude, &aliases.lat)?;
    let time = find_variable_name(&has_variable, CoordinateRole::Time, &aliases.time)?;
    Ok(CoordinateNames { lon, lat, time })
}

/// Locates the longitude, latitude and time variables of a NetCDF file.
///
/// # Errors
///
/// Returns [`ZonalError::MissingCoordinate`] if a role has no matching variable.
pub fn resolve_coordinates<'f>(
    file: &'f File,
    aliases: &CoordinateAliases,
) -> Result<CoordinateVariables<'f>> {
    let names = resolve_names(|name| file.variable(name).is_some(), aliases)?;

    let fetch = |name: &str| {
        file.variable(name).ok_or_else(|| ZonalError::VariableNotFound {
            var: name.to_string(),
        })
    };

    Ok(CoordinateVariables {
        lon: fetch(&names.lon)?,
        lat: fetch(&names.lat)?,
        time: fetch(&names.time)?,
        names,
    })
}
