//! Light-curve files and the per-object photometry book.
//!
//! Light curves use the flipper text format: one point per line, Julian
//! date in the first column, filter in the fifth, telescope in the sixth.
//! Lines starting with `#` are comments.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use sndb_core::CoreError;

use crate::snapshot;

const FILTER_COLUMN: usize = 4;
const TELESCOPE_COLUMN: usize = 5;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// What a light-curve file covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightCurveSummary {
    pub first_observed: NaiveDate,
    pub last_observed: NaiveDate,
    /// Distinct filters, sorted.
    pub filters: Vec<String>,
    /// Distinct telescopes, sorted.
    pub telescopes: Vec<String>,
    pub points: usize,
}

/// Parse a light curve. `context` names the source in errors.
///
/// # Errors
///
/// [`CoreError::DataIntegrity`] if a line has fewer than six columns, its
/// Julian date is not a number, or the file has no points.
pub fn parse_light_curve(text: &str, context: &str) -> Result<LightCurveSummary, CoreError> {
    let mut dates = Vec::new();
    let mut filters = BTreeSet::new();
    let mut telescopes = BTreeSet::new();
    for (number, line) in text.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let columns: Vec<&str> = line.split_whitespace().collect();
        let bad_line = |reason: &str| {
            CoreError::data_integrity(context, format!("line {}: {reason}", number + 1))
        };
        if columns.len() <= TELESCOPE_COLUMN {
            return Err(bad_line("expected at least six columns"));
        }
        let date = columns[0]
            .parse::<f64>()
            .ok()
            .and_then(julian_date_to_date)
            .ok_or_else(|| bad_line("first column is not a Julian date"))?;
        dates.push(date);
        filters.insert(columns[FILTER_COLUMN].to_string());
        telescopes.insert(columns[TELESCOPE_COLUMN].to_string());
    }
    let (Some(&first_observed), Some(&last_observed)) = (dates.iter().min(), dates.iter().max())
    else {
        return Err(CoreError::data_integrity(context, "light curve has no points"));
    };
    Ok(LightCurveSummary {
        first_observed,
        last_observed,
        filters: filters.into_iter().collect(),
        telescopes: telescopes.into_iter().collect(),
        points: dates.len(),
    })
}

/// UT calendar date of a Julian date.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn julian_date_to_date(jd: f64) -> Option<NaiveDate> {
    if !jd.is_finite() {
        return None;
    }
    let seconds = ((jd - UNIX_EPOCH_JD) * 86_400.0).floor();
    DateTime::from_timestamp(seconds as i64, 0).map(|at| at.date_naive())
}

/// A light curve attached to a registry object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightCurve {
    pub path: PathBuf,
    pub object: String,
    /// Whether the file is cleared for release, marked by `public` in its name.
    pub public: bool,
    #[serde(flatten)]
    pub summary: LightCurveSummary,
}

impl LightCurve {
    #[must_use]
    pub fn new(path: PathBuf, object: String, summary: LightCurveSummary) -> Self {
        let public = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains("public"));
        Self {
            path,
            object,
            public,
            summary,
        }
    }
}

/// Light curves keyed by file path. Re-importing a path replaces its entry.
#[derive(Debug, Default)]
pub struct LightCurveBook {
    entries: Mutex<BTreeMap<PathBuf, LightCurve>>,
}

impl LightCurveBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a book saved by [`Self::save_json`]. A missing file is empty.
    pub fn load_json(path: &Path) -> Result<Self, CoreError> {
        let curves: Vec<LightCurve> = snapshot::read(path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), curves = curves.len(), "light curves loaded");
        Ok(Self {
            entries: Mutex::new(curves.into_iter().map(|c| (c.path.clone(), c)).collect()),
        })
    }

    pub fn save_json(&self, path: &Path) -> Result<(), CoreError> {
        snapshot::write(path, &self.curves()?)
    }

    /// Insert or replace the entry for `curve.path`. Returns whether an
    /// entry was replaced.
    pub fn upsert(&self, curve: LightCurve) -> Result<bool, CoreError> {
        Ok(self.lock()?.insert(curve.path.clone(), curve).is_some())
    }

    /// Point curves attached to `from` at `to`. Returns how many moved.
    pub fn rename_object(&self, from: &str, to: &str) -> Result<usize, CoreError> {
        let mut entries = self.lock()?;
        let mut moved = 0;
        for curve in entries.values_mut().filter(|c| c.object == from) {
            curve.object = to.to_string();
            moved += 1;
        }
        Ok(moved)
    }

    /// All curves, ordered by path.
    pub fn curves(&self) -> Result<Vec<LightCurve>, CoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<PathBuf, LightCurve>>, CoreError> {
        self.entries
            .lock()
            .map_err(|_| CoreError::data_integrity("photometry", "light curve lock poisoned"))
    }
}
