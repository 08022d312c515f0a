//! Folder import: discover, read headers, resolve, register, group.
//!
//! Every discovered file is handled independently. An error aborts only
//! the file it came from and is recorded in the report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sndb_catalog::{CatalogError, RegistryStore};
use sndb_config::IngestConfig;
use sndb_core::{CatalogSource, CoreError, ObjectRecord, RunId};

use crate::associate::{FileAssociator, observation_file};
use crate::disambiguation::{Disambiguation, NonInteractive};
use crate::header::ObservationHeader;
use crate::matcher::{IdentityMatcher, MatchedBy};
use crate::naming::candidate_name;
use crate::photometry::{LightCurve, LightCurveBook, parse_light_curve};
use crate::runs::{RunAggregator, RunSighting};
use crate::spectrum::{Spectrum, SpectrumMetrics};
use crate::typing::{SnidRunner, TypingOutcome};

/// A successfully imported observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedFile {
    pub observation: PathBuf,
    pub calibration: PathBuf,
    pub object: String,
    pub source: CatalogSource,
    pub matched_by: MatchedBy,
    /// True when the object was added to the registry by this import.
    pub registered: bool,
    pub run: RunId,
    pub spectrum: SpectrumMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing: Option<TypingOutcome>,
}

/// An observation the pipeline did not attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub observation: PathBuf,
    pub reason: String,
}

/// An observation whose import was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub observation: PathBuf,
    pub kind: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<ImportedFile>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
}

impl ImportReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.imported.len() + self.skipped.len() + self.failed.len()
    }
}

/// A light curve attached to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedLightCurve {
    pub path: PathBuf,
    pub object: String,
    pub source: CatalogSource,
    /// True when the object was added to the registry by this import.
    pub registered: bool,
    /// True when an earlier entry for the same file was replaced.
    pub replaced: bool,
    pub points: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotometryReport {
    pub imported: Vec<ImportedLightCurve>,
    pub failed: Vec<FailedFile>,
}

/// Wires the associator, matcher, registry, and run aggregator together.
pub struct Importer {
    config: IngestConfig,
    associator: FileAssociator,
    matcher: IdentityMatcher,
    store: Arc<dyn RegistryStore>,
    runs: Arc<RunAggregator>,
    prompt: Arc<dyn Disambiguation>,
    typer: Option<SnidRunner>,
}

impl Importer {
    #[must_use]
    pub fn new(
        config: IngestConfig,
        matcher: IdentityMatcher,
        store: Arc<dyn RegistryStore>,
        runs: Arc<RunAggregator>,
        prompt: Arc<dyn Disambiguation>,
    ) -> Self {
        Self {
            associator: FileAssociator::from_config(&config),
            config,
            matcher,
            store,
            runs,
            prompt,
            typer: None,
        }
    }

    /// Re-type each imported spectrum with SNID.
    #[must_use]
    pub fn with_typing(mut self, typer: SnidRunner) -> Self {
        self.typer = Some(typer);
        self
    }

    /// Import every observation under `root`.
    pub async fn import_folder(&self, root: &Path) -> ImportReport {
        let mut report = ImportReport::default();
        let pairs = self.associator.discover_pairs(
            root,
            self.config.include_details,
            self.config.require_calibration,
        );
        for (observation, calibration) in pairs {
            let Some(calibration) = calibration else {
                tracing::info!(path = %observation.display(), "no matching calibration file, skipping");
                report.skipped.push(SkippedFile {
                    observation,
                    reason: "no matching calibration file".to_string(),
                });
                continue;
            };
            match self.import_pair(&observation, calibration).await {
                Ok(imported) => {
                    tracing::info!(
                        path = %observation.display(),
                        object = %imported.object,
                        run = %imported.run,
                        registered = imported.registered,
                        "imported"
                    );
                    report.imported.push(imported);
                }
                Err(e) => {
                    tracing::info!(path = %observation.display(), kind = e.kind(), %e, "import failed");
                    report.failed.push(FailedFile {
                        observation,
                        kind: e.kind(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn import_pair(
        &self,
        observation: &Path,
        calibration: PathBuf,
    ) -> Result<ImportedFile, CoreError> {
        let file = observation_file(observation.to_path_buf(), Some(calibration.clone()))?;
        let header = ObservationHeader::read(&calibration)?;
        let spectrum = Spectrum::read(&file.primary_path)?.metrics();

        let resolution = self
            .matcher
            .resolve_identity(
                Some(&file.candidate_name),
                header.coordinate.as_ref(),
                self.config.interactive_budget,
                &*self.prompt,
            )
            .await?;

        let (record, registered) = if resolution.is_registered() {
            (resolution.record, false)
        } else {
            self.register(resolution.record).await?
        };

        let run = self
            .runs
            .group_or_create_run(&RunSighting::from_header(&header), &record.name)?;

        let typing = match &self.typer {
            Some(typer) => match typer.run(&file.primary_path).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::warn!(path = %file.primary_path.display(), %e, "re-typing failed");
                    None
                }
            },
            None => None,
        };

        Ok(ImportedFile {
            observation: file.primary_path,
            calibration,
            object: record.name,
            source: resolution.source,
            matched_by: resolution.matched_by,
            registered,
            run,
            spectrum,
            typing,
        })
    }

    /// Attach every light curve under `root` to its object, named after
    /// the file, and record it in `book`.
    ///
    /// Objects are resolved by name only, without prompting. A file already
    /// in `book` is replaced.
    pub async fn import_light_curves(&self, root: &Path, book: &LightCurveBook) -> PhotometryReport {
        let mut report = PhotometryReport::default();
        for path in self.associator.discover_light_curves(root) {
            match self.import_light_curve(&path, book).await {
                Ok(imported) => {
                    tracing::info!(
                        path = %path.display(),
                        object = %imported.object,
                        points = imported.points,
                        replaced = imported.replaced,
                        "light curve imported"
                    );
                    report.imported.push(imported);
                }
                Err(e) => {
                    tracing::info!(path = %path.display(), kind = e.kind(), %e, "light curve import failed");
                    report.failed.push(FailedFile {
                        observation: path,
                        kind: e.kind(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn import_light_curve(
        &self,
        path: &Path,
        book: &LightCurveBook,
    ) -> Result<ImportedLightCurve, CoreError> {
        let context = path.display().to_string();
        let name = light_curve_name(path)
            .ok_or_else(|| CoreError::data_integrity(&context, "no object name in file name"))?;
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::data_integrity(&context, e.to_string()))?;
        let summary = parse_light_curve(&text, &context)?;

        let resolution = self
            .matcher
            .resolve_identity(Some(&name), None, 0, &NonInteractive)
            .await?;
        let source = resolution.source;
        let (record, registered) = if resolution.is_registered() {
            (resolution.record, false)
        } else {
            self.register(resolution.record).await?
        };

        let points = summary.points;
        let replaced = book.upsert(LightCurve::new(path.to_path_buf(), record.name.clone(), summary))?;
        Ok(ImportedLightCurve {
            path: path.to_path_buf(),
            object: record.name,
            source,
            registered,
            replaced,
            points,
        })
    }

    /// Insert a newly resolved record. If the name is already taken, the
    /// existing record wins.
    async fn register(&self, record: ObjectRecord) -> Result<(ObjectRecord, bool), CoreError> {
        match self.store.insert(record.clone()).await {
            Ok(()) => Ok((record, true)),
            Err(CatalogError::Conflict { name }) => {
                tracing::debug!(%name, "object registered concurrently, re-reading");
                let existing = self
                    .store
                    .find_by_name(&name)
                    .await
                    .map_err(|e| e.into_core(CatalogSource::LocalRegistry))?
                    .ok_or_else(|| {
                        CoreError::data_integrity(CatalogSource::LocalRegistry.as_str(), format!("'{name}' vanished after conflict"))
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into_core(CatalogSource::LocalRegistry)),
        }
    }
}

/// Object name from a light-curve file name: the text before its first dot.
fn light_curve_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.split('.').next()?;
    let name = candidate_name(stem);
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_curve_names_come_from_the_file_stem() {
        assert_eq!(
            light_curve_name(Path::new("/data/phot/sn2011fe.public.dat")).as_deref(),
            Some("SN 2011fe")
        );
        assert_eq!(light_curve_name(Path::new("/data/phot/.dat")), None);
    }
}
