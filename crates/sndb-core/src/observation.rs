//! Observation files and the timestamp embedded in their names.

use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// `YYYYMMDD` with an optional fractional day, e.g. `20150301.123`.
static DATE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}(\.\d+)?").expect("date regex is valid"));

/// UT date plus fractional day parsed from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationTimestamp {
    pub date: NaiveDate,
    pub day_fraction: f64,
}

impl ObservationTimestamp {
    /// Parse the first `YYYYMMDD[.fff]` run in `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataIntegrity`] if no such run exists or it is
    /// not a calendar date.
    pub fn from_file_name(file_name: &str) -> Result<Self, CoreError> {
        let found = DATE_RUN.find(file_name).ok_or_else(|| {
            CoreError::data_integrity(file_name, "no YYYYMMDD date in file name")
        })?;
        let (digits, fraction) = found.as_str().split_at(8);
        let date = NaiveDate::parse_from_str(digits, "%Y%m%d")
            .map_err(|e| CoreError::data_integrity(file_name, format!("bad date {digits}: {e}")))?;
        let day_fraction = if fraction.is_empty() {
            0.0
        } else {
            format!("0{fraction}").parse().map_err(|e| {
                CoreError::data_integrity(file_name, format!("bad day fraction {fraction}: {e}"))
            })?
        };
        Ok(Self { date, day_fraction })
    }

    /// The prefix of `file_name` before the date run, with `-`/`_` trimmed.
    #[must_use]
    pub fn object_prefix(file_name: &str) -> Option<&str> {
        let found = DATE_RUN.find(file_name)?;
        let prefix = file_name[..found.start()].trim_matches(['-', '_']);
        (!prefix.is_empty()).then_some(prefix)
    }

    /// The compact `YYYYMMDD.fff` form used by legacy records.
    #[must_use]
    pub fn as_compact(&self) -> f64 {
        let month_day = self.date.month() * 100 + self.date.day();
        f64::from(self.date.year()) * 10_000.0 + f64::from(month_day) + self.day_fraction
    }
}

/// A discovered observation and its calibration file.
///
/// Built once per discovered file and consumed by the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationFile {
    pub primary_path: PathBuf,
    pub calibration_path: Option<PathBuf>,
    pub parsed_timestamp: ObservationTimestamp,
    pub candidate_name: String,
}
