//! CF time decoding and canonical timestamp rendering
//!
//! NetCDF time axes are numbers counted from a reference date, described by a
//! `units` attribute such as `"minutes since 2024-12-01 00:00:00"`. Output
//! tables key rows on a string form of the decoded timestamp, so the rendering
//! here has to be stable across files and runs.

use crate::errors::{Result, ZonalError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::collections::BTreeMap;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REFERENCE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Calendars whose day arithmetic matches the proleptic Gregorian one
const SUPPORTED_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Step size of a CF time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    #[must_use]
    pub const fn seconds(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3_600.0,
            Self::Days => 86_400.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = ZonalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Ok(Self::Seconds),
            "minutes" | "minute" | "mins" | "min" => Ok(Self::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Ok(Self::Hours),
            "days" | "day" | "d" => Ok(Self::Days),
            other => Err(ZonalError::time(format!("unsupported time unit '{other}'"))),
        }
    }
}

/// A parsed `"<unit> since <reference>"` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub reference: NaiveDateTime,
}

impl FromStr for CfTimeUnits {
    type Err = ZonalError;

    fn from_str(units: &str) -> Result<Self> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| ZonalError::time(format!("units '{units}' lack 'since'")))?;

        Ok(Self {
            unit: unit.trim().parse()?,
            reference: parse_reference(reference)?,
        })
    }
}

impl CfTimeUnits {
    /// Converts one raw axis value into a timestamp, rounded to the millisecond.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::TimeDecode`] for non-finite values or offsets that
    /// overflow the calendar.
    pub fn decode(&self, value: f64) -> Result<NaiveDateTime> {
        let millis = (value * self.unit.seconds() * 1_000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(ZonalError::time(format!("time value {value} out of range")));
        }

        TimeDelta::try_milliseconds(millis as i64)
            .and_then(|delta| self.reference.checked_add_signed(delta))
            .ok_or_else(|| ZonalError::time(format!("time value {value} out of range")))
    }
}

fn parse_reference(reference: &str) -> Result<NaiveDateTime> {
    let trimmed = reference.trim();
    let trimmed = trimmed
        .strip_suffix("UTC")
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed)
        .trim();

    for format in REFERENCE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| ZonalError::time(format!("unrecognised reference date '{reference}'")))
}

/// Rejects calendars whose dates would not match Gregorian arithmetic.
///
/// # Errors
///
/// Returns [`ZonalError::TimeDecode`] for `noleap`, `360_day` and friends.
pub fn check_calendar(calendar: Option<&str>) -> Result<()> {
    match calendar {
        None => Ok(()),
        Some(name) if SUPPORTED_CALENDARS.iter().any(|c| c.eq_ignore_ascii_case(name)) => Ok(()),
        Some(name) => Err(ZonalError::time(format!("unsupported calendar '{name}'"))),
    }
}

/// Decodes a whole time axis.
///
/// # Errors
///
/// Propagates unit, calendar and range errors.
pub fn decode_times(values: &[f64], units: &str, calendar: Option<&str>) -> Result<Vec<NaiveDateTime>> {
    check_calendar(calendar)?;
    let units: CfTimeUnits = units.parse()?;
    values.iter().map(|&value| units.decode(value)).collect()
}

/// Renders timestamps in their canonical string form.
///
/// When every timestamp falls on midnight the time of day is dropped
/// (`2024-12-01`); otherwise every entry carries it (`2024-12-01 06:00:00`).
#[must_use]
pub fn format_timestamps(times: &[NaiveDateTime]) -> Vec<String> {
    let date_only = times.iter().all(|t| t.time() == NaiveTime::MIN);
    let format = if date_only { DATE_FORMAT } else { DATETIME_FORMAT };
    times.iter().map(|t| t.format(format).to_string()).collect()
}

/// Groups time-step indices by timestamp, in ascending time order.
///
/// Files normally hold distinct timestamps, giving one single-index group per
/// step; repeated timestamps share a group.
#[must_use]
pub fn group_time_steps(times: &[NaiveDateTime]) -> Vec<(NaiveDateTime, Vec<usize>)> {
    let mut groups: BTreeMap<NaiveDateTime, Vec<usize>> = BTreeMap::new();
    for (index, &time) in times.iter().enumerate() {
        groups.entry(time).or_default().push(index);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_ldas_units() {
        let units: CfTimeUnits = "minutes since 2024-12-01 00:00:00".parse().unwrap();
        assert_eq!(units.unit, TimeUnit::Minutes);
        assert_eq!(units.reference, at(2024, 12, 1, 0));
        assert_eq!(units.decode(1440.0).unwrap(), at(2024, 12, 2, 0));
    }

    #[test]
    fn accepts_date_only_and_iso_references() {
        let days: CfTimeUnits = "days since 2023-01-01".parse().unwrap();
        assert_eq!(days.decode(31.0).unwrap(), at(2023, 2, 1, 0));

        let hours: CfTimeUnits = "hours since 2000-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(hours.decode(6.0).unwrap(), at(2000, 1, 1, 6));
    }

    #[test]
    fn rejects_bad_units_and_calendars() {
        assert!("minutes after 2024-12-01".parse::<CfTimeUnits>().is_err());
        assert!("fortnights since 2024-12-01".parse::<CfTimeUnits>().is_err());
        assert!(check_calendar(Some("noleap")).is_err());
        assert!(check_calendar(Some("Gregorian")).is_ok());
    }

    #[test]
    fn canonical_format_drops_midnight_only_when_uniform() {
        let daily = [at(2024, 12, 1, 0), at(2025, 1, 1, 0)];
        assert_eq!(format_timestamps(&daily), vec!["2024-12-01", "2025-01-01"]);

        let mixed = [at(2024, 12, 1, 0), at(2024, 12, 1, 6)];
        assert_eq!(
            format_timestamps(&mixed),
            vec!["2024-12-01 00:00:00", "2024-12-01 06:00:00"]
        );
    }

    #[test]
    fn repeated_timestamps_share_a_group() {
        let times = [at(2024, 12, 2, 0), at(2024, 12, 1, 0), at(2024, 12, 2, 0)];
        let groups = group_time_steps(&times);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], (at(2024, 12, 1, 0), vec![1]));
        assert_eq!(groups[1], (at(2024, 12, 2, 0), vec![0, 2]));
    }
}
