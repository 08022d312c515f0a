//! Name reconciliation for registry objects still carrying provisional
//! names such as `PSN J...` or `PGIR...`.
//!
//! Each selected record is matched by coordinate against the transient name
//! server and the survey index. An accepted match either becomes the
//! alternate name, or replaces the registry name with the old name kept as
//! the alternate. Run target lists and light curves follow a rename.

use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use sndb_catalog::{CoordinateMatch, RegistryStore};
use sndb_core::{CatalogSource, CoreError, ObjectRecord, RecordField};

use crate::disambiguation::Disambiguation;
use crate::matcher::{Candidate, IdentityMatcher, MatchedBy};
use crate::naming::candidate_name;
use crate::photometry::LightCurveBook;
use crate::runs::RunAggregator;

/// Names selected for reconciliation when no pattern is given.
pub const DEFAULT_PROVISIONAL_PATTERN: &str = r"(?i)psn|pgir";

/// Catalog fields copied with `fill_details`.
pub const DETAIL_FIELDS: [RecordField; 4] = [
    RecordField::ObjectType,
    RecordField::DiscoveryDate,
    RecordField::Discoverer,
    RecordField::HostName,
];

/// Where an accepted catalog name goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameUpdate {
    /// Store the catalog name as the alternate name.
    AltName,
    /// Make the catalog name the registry name and keep the old one as the
    /// alternate.
    Rename,
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Registry names to reconsider. Records that already have an
    /// alternate name are skipped.
    pub pattern: Regex,
    pub update: NameUpdate,
    /// Also fill absent [`DETAIL_FIELDS`] from the accepted record.
    pub fill_details: bool,
    /// Inexact candidates offered to the prompt. Zero accepts exact
    /// coordinate matches only.
    pub interactive_budget: usize,
}

impl ReconcileOptions {
    #[must_use]
    pub const fn new(pattern: Regex, update: NameUpdate) -> Self {
        Self {
            pattern,
            update,
            fill_details: false,
            interactive_budget: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledName {
    pub previous: String,
    pub name: String,
    pub alt_name: String,
    pub source: CatalogSource,
    pub matched_by: MatchedBy,
    pub offset_sq: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filled: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UntouchedRecord {
    pub name: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRecord {
    pub name: String,
    pub kind: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub updated: Vec<ReconciledName>,
    pub untouched: Vec<UntouchedRecord>,
    pub failed: Vec<FailedRecord>,
}

enum Outcome {
    Updated(ReconciledName),
    Untouched(&'static str),
}

/// Walks the registry and settles provisional names against the catalogs.
pub struct NameReconciler {
    matcher: IdentityMatcher,
    store: Arc<dyn RegistryStore>,
    prompt: Arc<dyn Disambiguation>,
    runs: Option<Arc<RunAggregator>>,
    light_curves: Option<Arc<LightCurveBook>>,
}

impl NameReconciler {
    #[must_use]
    pub fn new(
        matcher: IdentityMatcher,
        store: Arc<dyn RegistryStore>,
        prompt: Arc<dyn Disambiguation>,
    ) -> Self {
        Self {
            matcher,
            store,
            prompt,
            runs: None,
            light_curves: None,
        }
    }

    /// Rename run targets along with registry renames.
    #[must_use]
    pub fn with_runs(mut self, runs: Arc<RunAggregator>) -> Self {
        self.runs = Some(runs);
        self
    }

    /// Re-point light curves along with registry renames.
    #[must_use]
    pub fn with_light_curves(mut self, book: Arc<LightCurveBook>) -> Self {
        self.light_curves = Some(book);
        self
    }

    /// Reconcile every registry record selected by `options.pattern`.
    ///
    /// Per-record failures land in the report.
    ///
    /// # Errors
    ///
    /// [`CoreError::DataIntegrity`] if the registry cannot be listed.
    pub async fn reconcile_names(&self, options: &ReconcileOptions) -> Result<ReconcileReport, CoreError> {
        let records = self
            .store
            .list()
            .await
            .map_err(|e| e.into_core(CatalogSource::LocalRegistry))?;
        let selected: Vec<ObjectRecord> = records
            .into_iter()
            .filter(|r| r.alt_name.is_none() && options.pattern.is_match(&r.name))
            .collect();
        tracing::info!(selected = selected.len(), update = ?options.update, "reconciling names");

        let mut report = ReconcileReport::default();
        for record in selected {
            let name = record.name.clone();
            match self.reconcile(record, options).await {
                Ok(Outcome::Updated(updated)) => {
                    tracing::info!(previous = %updated.previous, name = %updated.name, alt_name = %updated.alt_name, "name reconciled");
                    report.updated.push(updated);
                }
                Ok(Outcome::Untouched(reason)) => {
                    tracing::debug!(%name, reason, "name left as is");
                    report.untouched.push(UntouchedRecord { name, reason });
                }
                Err(e) => {
                    tracing::warn!(%name, %e, "reconciliation failed");
                    report.failed.push(FailedRecord {
                        name,
                        kind: e.kind(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn reconcile(&self, record: ObjectRecord, options: &ReconcileOptions) -> Result<Outcome, CoreError> {
        let Some(target) = record.coordinate.clone() else {
            return Ok(Outcome::Untouched("no coordinate"));
        };
        let candidates: Vec<Candidate> = self
            .matcher
            .external_candidates(&target)
            .await
            .into_iter()
            .filter(|c| candidate_name(&c.found.record.name) != record.name)
            .collect();
        let (chosen, matched_by) = match self.choose(&candidates, options.interactive_budget).await {
            Ok(choice) => choice,
            Err(reason) => return Ok(Outcome::Untouched(reason)),
        };
        self.apply(record, chosen, matched_by, options).await.map(Outcome::Updated)
    }

    /// Exact coordinate matches are taken as is; anything else needs the prompt.
    async fn choose<'a>(
        &self,
        candidates: &'a [Candidate],
        budget: usize,
    ) -> Result<(&'a Candidate, MatchedBy), &'static str> {
        let Some(best) = candidates.first() else {
            return Err("no catalog candidate");
        };
        if best.found.offset_sq == 0.0 {
            return Ok((best, MatchedBy::ExactCoordinate));
        }
        if budget == 0 {
            return Err("no exact coordinate match");
        }
        let shown: Vec<CoordinateMatch> = candidates
            .iter()
            .take(budget)
            .map(|c| c.found.clone())
            .collect();
        match self.prompt.choose(&shown).await {
            Some(index) if index < shown.len() => Ok((&candidates[index], MatchedBy::Selection)),
            Some(index) => {
                tracing::warn!(index, shown = shown.len(), "selection out of range, treating as declined");
                Err("candidates declined")
            }
            None => Err("candidates declined"),
        }
    }

    async fn apply(
        &self,
        mut record: ObjectRecord,
        chosen: &Candidate,
        matched_by: MatchedBy,
        options: &ReconcileOptions,
    ) -> Result<ReconciledName, CoreError> {
        let previous = record.name.clone();
        let catalog_name = candidate_name(&chosen.found.record.name);
        let alt_name = match options.update {
            NameUpdate::AltName => {
                record.provenance.insert(RecordField::AltName, chosen.source);
                catalog_name
            }
            NameUpdate::Rename => {
                record.name = catalog_name;
                record.provenance.insert(RecordField::Name, chosen.source);
                record.provenance.insert(RecordField::AltName, CatalogSource::LocalRegistry);
                previous.clone()
            }
        };
        record.alt_name = Some(alt_name.clone());
        let filled = if options.fill_details {
            record.fill_absent_from(&chosen.found.record, &DETAIL_FIELDS)
        } else {
            Vec::new()
        };

        let reconciled = ReconciledName {
            previous: previous.clone(),
            name: record.name.clone(),
            alt_name,
            source: chosen.source,
            matched_by,
            offset_sq: chosen.found.offset_sq,
            filled,
        };
        let stored = match options.update {
            NameUpdate::AltName => self.store.update(record).await,
            NameUpdate::Rename => self.store.rename(&previous, record).await,
        };
        stored.map_err(|e| e.into_core(CatalogSource::LocalRegistry))?;

        if options.update == NameUpdate::Rename {
            if let Some(runs) = &self.runs {
                let moved = runs.rename_target(&previous, &reconciled.name)?;
                tracing::debug!(%previous, runs = moved, "run targets renamed");
            }
            if let Some(book) = &self.light_curves {
                let moved = book.rename_object(&previous, &reconciled.name)?;
                tracing::debug!(%previous, curves = moved, "light curves renamed");
            }
        }
        Ok(reconciled)
    }
}
