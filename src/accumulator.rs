//! Per-region CSV accumulation
//!
//! Every region owns one CSV file, `pfaf_<id>.csv`, keyed by `time` with one
//! column per processed variable and a trailing region identifier column.
//! Each new series is outer-merged into the file: timestamps from either side
//! survive, and cells the other side lacks stay blank. Rows are never
//! removed.

use crate::catalog::RegionId;
use crate::errors::{Result, ZonalError};
use crate::statistics::ZonalSeries;
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key column of every output table
pub const TIME_COLUMN: &str = "time";

/// File name of a region's output table
#[must_use]
pub fn region_file_name(region: &RegionId) -> String {
    format!("pfaf_{region}.csv")
}

/// In-memory copy of one region's output table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutputTable {
    headers: Vec<String>,
    /// Full records keyed by their `time` cell
    rows: BTreeMap<String, Vec<String>>,
}

impl RegionOutputTable {
    /// Empty table laid out as `time, <variable>, <id_field>`
    #[must_use]
    pub fn new(variable: &str, id_field: &str) -> Self {
        Self {
            headers: vec![
                TIME_COLUMN.to_string(),
                variable.to_string(),
                id_field.to_string(),
            ],
            rows: BTreeMap::new(),
        }
    }

    /// Reads an existing table, keeping every cell verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::Csv`] for unreadable or ragged files and
    /// [`ZonalError::MalformedTable`] when the `time` column is missing or a
    /// timestamp repeats.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ZonalError::csv(path, e))?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ZonalError::csv(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let time_idx = headers
            .iter()
            .position(|h| h == TIME_COLUMN)
            .ok_or_else(|| ZonalError::MalformedTable {
                path: path.to_path_buf(),
                message: format!("missing '{TIME_COLUMN}' column"),
            })?;

        let mut rows = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| ZonalError::csv(path, e))?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            let time = cells[time_idx].clone();
            if rows.insert(time.clone(), cells).is_some() {
                return Err(ZonalError::MalformedTable {
                    path: path.to_path_buf(),
                    message: format!("duplicate timestamp '{time}'"),
                });
            }
        }

        Ok(Self { headers, rows })
    }

    /// Column names in file order
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Timestamps in row order
    pub fn times(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.keys().map(String::as_str)
    }

    /// Cell at (`time`, `column`); `None` when either is unknown
    #[must_use]
    pub fn cell(&self, time: &str, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(time).map(|row| row[idx].as_str())
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Index of `column`, appending it (blank in every row) if absent
    fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        self.headers.push(column.to_string());
        for row in self.rows.values_mut() {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Outer-merges a series on `time` and stamps every row with its region.
    ///
    /// The series' variable column is appended when new. When it already
    /// exists its cells are replaced at the series' timestamps, so merging the
    /// same series twice leaves the table unchanged.
    pub fn merge(&mut self, series: &ZonalSeries, id_field: &str) {
        let value_idx = self.ensure_column(&series.variable);
        let id_idx = self.ensure_column(id_field);
        let time_idx = self.ensure_column(TIME_COLUMN);
        let width = self.headers.len();

        for (time, value) in series.rows() {
            let row = self.rows.entry(time.to_string()).or_insert_with(|| {
                let mut row = vec![String::new(); width];
                row[time_idx] = time.to_string();
                row
            });
            row[value_idx] = format_value(value);
        }

        let id = series.region.to_string();
        for row in self.rows.values_mut() {
            row[id_idx].clone_from(&id);
        }
    }

    /// Writes the table, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::Csv`] if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| ZonalError::csv(path, e))?;
        writer
            .write_record(&self.headers)
            .map_err(|e| ZonalError::csv(path, e))?;
        for row in self.rows.values() {
            writer.write_record(row).map_err(|e| ZonalError::csv(path, e))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Renders a reduced value in shortest round-trip form, blank when missing.
///
/// Integral values keep a `.0`; magnitudes below `1e-4` or from `1e16` up
/// switch to exponent notation (`2.5e-5`).
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value:?}")
    } else {
        String::new()
    }
}

/// Writes zonal series into a directory of per-region tables
#[derive(Debug, Clone)]
pub struct CsvAccumulator {
    output_dir: PathBuf,
    id_field: String,
}

impl CsvAccumulator {
    /// Accumulator rooted at `output_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ZonalError::Io`] if the directory cannot be created.
    pub fn new(output_dir: impl Into<PathBuf>, id_field: &str) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            id_field: id_field.to_string(),
        })
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output path of a region
    #[must_use]
    pub fn path_for(&self, region: &RegionId) -> PathBuf {
        self.output_dir.join(region_file_name(region))
    }

    /// Merges `series` into its region's file, creating the file when absent,
    /// and returns the path written.
    ///
    /// # Errors
    ///
    /// Propagates read, parse and write failures of the region's file.
    pub fn accumulate(&self, series: &ZonalSeries) -> Result<PathBuf> {
        let path = self.path_for(&series.region);
        let mut table = if path.exists() {
            debug!("Merging '{}' into {}", series.variable, path.display());
            RegionOutputTable::read(&path)?
        } else {
            debug!("Creating {} for '{}'", path.display(), series.variable);
            RegionOutputTable::new(&series.variable, &self.id_field)
        };

        table.merge(series, &self.id_field);
        table.write(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::StatOperation;

    fn series(variable: &str, rows: &[(&str, f64)]) -> ZonalSeries {
        ZonalSeries {
            region: RegionId::new("10"),
            variable: variable.to_string(),
            operation: StatOperation::Mean,
            times: rows.iter().map(|(t, _)| (*t).to_string()).collect(),
            values: rows.iter().map(|(_, v)| *v).collect(),
        }
    }

    #[test]
    fn fresh_table_has_time_variable_id_layout() {
        let mut table = RegionOutputTable::new("Qair_f_tavg", "PFAF_ID");
        table.merge(&series("Qair_f_tavg", &[("T1", 1.0), ("T2", 2.0)]), "PFAF_ID");

        assert_eq!(table.headers(), ["time", "Qair_f_tavg", "PFAF_ID"]);
        assert_eq!(table.cell("T1", "Qair_f_tavg"), Some("1.0"));
        assert_eq!(table.cell("T2", "PFAF_ID"), Some("10"));
    }

    #[test]
    fn outer_merge_keeps_both_sides() {
        let mut table = RegionOutputTable::new("Qair_f_tavg", "PFAF_ID");
        table.merge(&series("Qair_f_tavg", &[("T1", 1.0), ("T2", 2.0)]), "PFAF_ID");
        table.merge(&series("Rainf_tavg", &[("T2", 5.0), ("T3", 6.0)]), "PFAF_ID");

        assert_eq!(table.headers(), ["time", "Qair_f_tavg", "PFAF_ID", "Rainf_tavg"]);
        assert_eq!(table.times().collect::<Vec<_>>(), vec!["T1", "T2", "T3"]);
        assert_eq!(table.cell("T3", "Qair_f_tavg"), Some(""));
        assert_eq!(table.cell("T1", "Rainf_tavg"), Some(""));
        assert_eq!(table.cell("T3", "PFAF_ID"), Some("10"));
    }

    #[test]
    fn remerging_a_variable_replaces_its_cells() {
        let mut table = RegionOutputTable::new("Evap_tavg", "PFAF_ID");
        table.merge(&series("Evap_tavg", &[("T1", 1.0), ("T2", 2.0)]), "PFAF_ID");
        let once = table.clone();
        table.merge(&series("Evap_tavg", &[("T1", 1.0), ("T2", 2.0)]), "PFAF_ID");
        assert_eq!(table, once);

        table.merge(&series("Evap_tavg", &[("T2", 9.5)]), "PFAF_ID");
        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.cell("T1", "Evap_tavg"), Some("1.0"));
        assert_eq!(table.cell("T2", "Evap_tavg"), Some("9.5"));
    }

    #[test]
    fn missing_values_render_blank() {
        assert_eq!(format_value(f64::NAN), "");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(3.0), "3.0");
        assert_eq!(format_value(2.5e-5), "2.5e-5");
    }
}
