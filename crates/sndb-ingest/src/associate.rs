//! Pair observation files with their calibration files.
//!
//! [`FileAssociator::discover_pairs`] walks a folder tree with the `ignore`
//! crate (all standard filters off, sorted by file name) and yields each
//! observation file with the best fuzzy-matched calibration file from the
//! same directory, or failing that from the first immediate subdirectory
//! that has one.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use sndb_config::IngestConfig;
use sndb_core::{CoreError, ObservationFile, ObservationTimestamp};

use crate::naming::candidate_name_for;

/// An observation file and its calibration file, if one matched.
pub type FilePair = (PathBuf, Option<PathBuf>);

/// Fuzzy pairing of observation and calibration files.
#[derive(Debug, Clone)]
pub struct FileAssociator {
    observation_suffix: String,
    calibration_suffix: String,
    photometry_suffix: String,
    details_dir: String,
    cutoff: f64,
}

impl Default for FileAssociator {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

impl FileAssociator {
    #[must_use]
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            observation_suffix: config.observation_suffix.clone(),
            calibration_suffix: config.calibration_suffix.clone(),
            photometry_suffix: config.photometry_suffix.clone(),
            details_dir: config.details_dir.clone(),
            cutoff: config.match_cutoff,
        }
    }

    /// Lazily yield `(observation, calibration)` pairs under `root`.
    ///
    /// Each call starts a fresh walk. Observation files under a directory
    /// named like the details folder are skipped unless `include_details`.
    /// With `require_calibration`, observations without a match are skipped
    /// rather than yielded with `None`.
    #[must_use]
    pub fn discover_pairs(
        &self,
        root: &Path,
        include_details: bool,
        require_calibration: bool,
    ) -> Pairs {
        Pairs {
            walk: self.walk(root, include_details),
            associator: self.clone(),
            require_calibration,
        }
    }

    /// Light-curve files under `root`, in walk order. The details folder is
    /// always skipped.
    #[must_use]
    pub fn discover_light_curves(&self, root: &Path) -> Vec<PathBuf> {
        self.walk(root, false)
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(%e, "walk error, skipping entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| has_suffix(name, &self.photometry_suffix))
            })
            .map(ignore::DirEntry::into_path)
            .collect()
    }

    fn walk(&self, root: &Path, include_details: bool) -> ignore::Walk {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .hidden(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        if !include_details {
            let details = self.details_dir.clone();
            builder.filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && entry.depth() > 0 && entry.file_name() == details.as_str())
            });
        }
        builder.build()
    }

    fn is_observation(&self, name: &str) -> bool {
        has_suffix(name, &self.observation_suffix)
    }

    fn stem<'a>(name: &'a str, suffix: &str) -> &'a str {
        name.strip_suffix(suffix).unwrap_or(name)
    }

    /// Best calibration file for `observation`: same directory first, then
    /// each immediate subdirectory in lexical order.
    #[must_use]
    pub fn find_calibration(&self, observation: &Path) -> Option<PathBuf> {
        let dir = observation.parent()?;
        let name = observation.file_name()?.to_str()?;
        let stem = Self::stem(name, &self.observation_suffix);

        if let Some(found) = self.best_in(dir, stem) {
            return Some(found);
        }
        sorted_entries(dir)
            .into_iter()
            .filter(|p| p.is_dir())
            .find_map(|sub| self.best_in(&sub, stem))
    }

    fn best_in(&self, dir: &Path, stem: &str) -> Option<PathBuf> {
        let candidates: Vec<(String, PathBuf)> = sorted_entries(dir)
            .into_iter()
            .filter(|p| p.is_file())
            .filter_map(|p| {
                let name = p.file_name()?.to_str()?.to_string();
                has_suffix(&name, &self.calibration_suffix).then_some((name, p))
            })
            .collect();
        let names: Vec<&str> = candidates
            .iter()
            .map(|(name, _)| Self::stem(name, &self.calibration_suffix))
            .collect();
        let index = best_match(stem, &names, self.cutoff)?;
        Some(candidates[index].1.clone())
    }
}

/// `name` ends with `suffix` and has a non-empty stem.
fn has_suffix(name: &str, suffix: &str) -> bool {
    name.len() > suffix.len() && name.ends_with(suffix)
}

/// Index of the most similar candidate at or above `cutoff`.
///
/// Similarity is normalized Levenshtein. Ties go to the lexically smallest
/// candidate.
#[must_use]
pub fn best_match(target: &str, candidates: &[&str], cutoff: f64) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, strsim::normalized_levenshtein(target, c)))
        .filter(|(_, score)| *score >= cutoff)
        .max_by(|(ia, a), (ib, b)| {
            a.total_cmp(b)
                .then_with(|| candidates[*ib].cmp(candidates[*ia]))
        })
        .map(|(i, _)| i)
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(read) => read.filter_map(Result::ok).map(|e| e.path()).collect(),
        Err(e) => {
            tracing::warn!(path = %dir.display(), %e, "cannot list directory");
            Vec::new()
        }
    };
    entries.sort();
    entries
}

/// Lazy sequence of file pairs from one walk.
pub struct Pairs {
    walk: ignore::Walk,
    associator: FileAssociator,
    require_calibration: bool,
}

impl Iterator for Pairs {
    type Item = FilePair;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(%e, "walk error, skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !self.associator.is_observation(name) {
                continue;
            }
            let observation = entry.into_path();
            let calibration = self.associator.find_calibration(&observation);
            if calibration.is_none() {
                if self.require_calibration {
                    tracing::debug!(path = %observation.display(), "no calibration match, skipping");
                    continue;
                }
                tracing::debug!(path = %observation.display(), "no calibration match");
            }
            return Some((observation, calibration));
        }
    }
}

/// Build the [`ObservationFile`] for a discovered pair.
///
/// # Errors
///
/// [`CoreError::DataIntegrity`] if the file name has no date or the folder
/// gives no candidate name.
pub fn observation_file(
    primary: PathBuf,
    calibration: Option<PathBuf>,
) -> Result<ObservationFile, CoreError> {
    let file_name = primary
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| CoreError::data_integrity(primary.display().to_string(), "file name is not UTF-8"))?;
    let parsed_timestamp = ObservationTimestamp::from_file_name(file_name)?;
    let candidate_name = candidate_name_for(&primary).ok_or_else(|| {
        CoreError::data_integrity(primary.display().to_string(), "no folder to take a name from")
    })?;
    Ok(ObservationFile {
        primary_path: primary,
        calibration_path: calibration,
        parsed_timestamp,
        candidate_name,
    })
}
