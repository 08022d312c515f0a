//! Grouping observations into observing runs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use sndb_core::{CoreError, ObservingRun, RunId, RunKey, TargetList};

use crate::header::ObservationHeader;
use crate::snapshot;

/// Run metadata from one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSighting {
    pub date: NaiveDate,
    pub observer: String,
    pub instrument: Option<String>,
    pub telescope: Option<String>,
    pub seeing: Option<f64>,
    pub reducer: Option<String>,
}

impl RunSighting {
    #[must_use]
    pub fn from_header(header: &ObservationHeader) -> Self {
        Self {
            date: header.date,
            observer: header.observer.clone(),
            instrument: header.instrument.clone(),
            telescope: header.observatory.clone(),
            seeing: header.seeing,
            reducer: header.reducer.clone(),
        }
    }

    fn key(&self) -> RunKey {
        RunKey {
            date: self.date,
            observer: self.observer.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct RunBook {
    by_key: BTreeMap<RunKey, ObservingRun>,
    next_id: u64,
}

/// Owns all observing runs. Creation and appends go through one lock.
#[derive(Debug)]
pub struct RunAggregator {
    book: Mutex<RunBook>,
}

impl Default for RunAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl RunAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_runs(Vec::new())
    }

    /// Seed with existing runs. New ids continue after the largest.
    #[must_use]
    pub fn with_runs(runs: impl IntoIterator<Item = ObservingRun>) -> Self {
        let mut book = RunBook {
            by_key: BTreeMap::new(),
            next_id: 1,
        };
        for run in runs {
            book.next_id = book.next_id.max(run.id.0 + 1);
            book.by_key.insert(run.key(), run);
        }
        Self {
            book: Mutex::new(book),
        }
    }

    /// Load runs saved by [`Self::save_json`]. A missing file means no
    /// runs yet.
    pub fn load_json(path: &Path) -> Result<Self, CoreError> {
        let runs: Vec<ObservingRun> = snapshot::read(path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), runs = runs.len(), "observing runs loaded");
        Ok(Self::with_runs(runs))
    }

    /// Write every run to `path`, ordered by id.
    pub fn save_json(&self, path: &Path) -> Result<(), CoreError> {
        snapshot::write(path, &self.runs()?)
    }

    /// Find the run for the sighting's `(date, observer)` and add `target`,
    /// or create the run.
    ///
    /// An existing run keeps its instrument, telescope, seeing, and reducer.
    pub fn group_or_create_run(&self, sighting: &RunSighting, target: &str) -> Result<RunId, CoreError> {
        let mut book = self.lock()?;
        let key = sighting.key();

        if let Some(run) = book.by_key.get_mut(&key) {
            if run.targets.insert(target) {
                tracing::debug!(run = %run.id, target, "target added to run");
            }
            return Ok(run.id);
        }

        let id = RunId(book.next_id);
        book.next_id += 1;
        let mut targets = TargetList::default();
        targets.insert(target);
        book.by_key.insert(
            key,
            ObservingRun {
                id,
                date: sighting.date,
                observer: sighting.observer.clone(),
                instrument: sighting.instrument.clone(),
                telescope: sighting.telescope.clone(),
                seeing: sighting.seeing,
                reducer: sighting.reducer.clone(),
                targets,
            },
        );
        tracing::info!(run = %id, date = %sighting.date, observer = %sighting.observer, "new observing run");
        Ok(id)
    }

    /// Rename `from` to `to` in every run's targets. Returns the number of
    /// runs touched.
    pub fn rename_target(&self, from: &str, to: &str) -> Result<usize, CoreError> {
        let mut book = self.lock()?;
        Ok(book
            .by_key
            .values_mut()
            .map(|run| run.targets.rename(from, to))
            .filter(|renamed| *renamed)
            .count())
    }

    /// All runs, ordered by id.
    pub fn runs(&self) -> Result<Vec<ObservingRun>, CoreError> {
        let book = self.lock()?;
        let mut runs: Vec<_> = book.by_key.values().cloned().collect();
        runs.sort_by_key(|run| run.id);
        Ok(runs)
    }

    fn lock(&self) -> Result<MutexGuard<'_, RunBook>, CoreError> {
        self.book
            .lock()
            .map_err(|_| CoreError::data_integrity("runs", "run lock poisoned"))
    }
}
