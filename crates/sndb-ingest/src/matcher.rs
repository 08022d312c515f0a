//! Identity resolution across the catalog priority chain.
//!
//! Order, first success wins:
//! 1. exact name in the local registry (returned as is)
//! 2. exact name in the Transient Name Server
//! 3. lowercased name in the survey index, then name variants
//! 4. coordinate candidates from every coordinate-capable catalog
//!
//! A primary record from steps 2–4 is then enriched with host fields from
//! the host catalog. The matcher never writes to any catalog.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use sndb_catalog::{CatalogResolver, CoordinateMatch, RetryPolicy};
use sndb_core::{CatalogSource, Coordinate, CoreError, ObjectRecord, RecordField};

use crate::disambiguation::Disambiguation;
use crate::naming::lookup_variants;

/// How the primary record was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Name,
    ExactCoordinate,
    Selection,
}

/// A resolved identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub record: ObjectRecord,
    /// Catalog the primary record came from.
    pub source: CatalogSource,
    pub matched_by: MatchedBy,
    /// Squared offset of the accepted coordinate candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_sq: Option<f64>,
    /// Host fields filled during enrichment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enriched: Vec<RecordField>,
}

impl Resolution {
    /// Whether the record is already in the local registry.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.source == CatalogSource::LocalRegistry
    }
}

/// A coordinate candidate tagged with the catalog that produced it.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) source: CatalogSource,
    pub(crate) found: CoordinateMatch,
}

/// Resolves a candidate name and/or coordinate to one object record.
pub struct IdentityMatcher {
    registry: Arc<dyn CatalogResolver>,
    transient: Arc<dyn CatalogResolver>,
    survey: Arc<dyn CatalogResolver>,
    host: Arc<dyn CatalogResolver>,
    retry: RetryPolicy,
}

impl IdentityMatcher {
    #[must_use]
    pub fn new(
        registry: Arc<dyn CatalogResolver>,
        transient: Arc<dyn CatalogResolver>,
        survey: Arc<dyn CatalogResolver>,
        host: Arc<dyn CatalogResolver>,
    ) -> Self {
        Self {
            registry,
            transient,
            survey,
            host,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve `name` and/or `coordinate` to a single record.
    ///
    /// With `interactive_budget > 0`, inexact coordinate candidates (up to
    /// the budget) are offered to `prompt`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] when nothing matches or the prompt declines.
    /// [`CoreError::AmbiguousMatch`] when several inexact candidates remain
    /// and no prompt is allowed.
    pub async fn resolve_identity(
        &self,
        name: Option<&str>,
        coordinate: Option<&Coordinate>,
        interactive_budget: usize,
        prompt: &dyn Disambiguation,
    ) -> Result<Resolution, CoreError> {
        let query = describe(name, coordinate);

        if let Some(name) = name {
            if let Some(record) = self.lookup_name(&*self.registry, name).await {
                tracing::debug!(%query, "found in local registry");
                return Ok(Resolution {
                    record,
                    source: CatalogSource::LocalRegistry,
                    matched_by: MatchedBy::Name,
                    offset_sq: None,
                    enriched: Vec::new(),
                });
            }
        }

        let mut resolution = match name {
            Some(name) => self.resolve_by_name(name).await,
            None => None,
        };
        if resolution.is_none() {
            if let Some(target) = coordinate {
                resolution = self
                    .resolve_by_coordinate(target, &query, interactive_budget, prompt)
                    .await?;
            }
        }
        let Some(mut resolution) = resolution else {
            tracing::debug!(%query, "no catalog match");
            return Err(CoreError::NotFound { query });
        };

        resolution.enriched = self.enrich(&mut resolution.record).await;
        Ok(resolution)
    }

    async fn resolve_by_name(&self, name: &str) -> Option<Resolution> {
        let by_name = |record, source| Resolution {
            record,
            source,
            matched_by: MatchedBy::Name,
            offset_sq: None,
            enriched: Vec::new(),
        };

        if let Some(record) = self.lookup_name(&*self.transient, name).await {
            tracing::debug!(name, "found in transient name server");
            return Some(by_name(record, self.transient.source()));
        }
        for variant in lookup_variants(name) {
            if let Some(record) = self.lookup_name(&*self.survey, &variant).await {
                tracing::debug!(name, %variant, "found in survey index");
                return Some(by_name(record, self.survey.source()));
            }
        }
        None
    }

    async fn resolve_by_coordinate(
        &self,
        target: &Coordinate,
        query: &str,
        budget: usize,
        prompt: &dyn Disambiguation,
    ) -> Result<Option<Resolution>, CoreError> {
        let candidates = self.gather_candidates(target).await;
        let Some(best) = candidates.first() else {
            return Ok(None);
        };

        if best.found.offset_sq == 0.0 {
            tracing::debug!(query, source = %best.source, name = %best.found.record.name, "exact coordinate match");
            return Ok(Some(Resolution {
                record: best.found.record.clone(),
                source: best.source,
                matched_by: MatchedBy::ExactCoordinate,
                offset_sq: Some(0.0),
                enriched: Vec::new(),
            }));
        }

        if budget == 0 {
            return if candidates.len() >= 2 {
                Err(CoreError::AmbiguousMatch {
                    query: query.to_string(),
                    candidates: candidates.len(),
                })
            } else {
                Ok(None)
            };
        }

        let shown: Vec<CoordinateMatch> = candidates
            .iter()
            .take(budget)
            .map(|c| c.found.clone())
            .collect();
        match prompt.choose(&shown).await {
            Some(index) if index < shown.len() => {
                let chosen = &candidates[index];
                tracing::debug!(query, name = %chosen.found.record.name, "candidate selected");
                Ok(Some(Resolution {
                    record: chosen.found.record.clone(),
                    source: chosen.source,
                    matched_by: MatchedBy::Selection,
                    offset_sq: Some(chosen.found.offset_sq),
                    enriched: Vec::new(),
                }))
            }
            Some(index) => {
                tracing::warn!(query, index, shown = shown.len(), "selection out of range, treating as declined");
                Ok(None)
            }
            None => {
                tracing::debug!(query, "all candidates declined");
                Ok(None)
            }
        }
    }

    /// Candidates from all coordinate-capable catalogs, queried
    /// concurrently, merged by offset, then source priority, then name.
    async fn gather_candidates(&self, target: &Coordinate) -> Vec<Candidate> {
        self.gather_from(target, [&self.registry, &self.transient, &self.survey])
            .await
    }

    /// Like [`Self::gather_candidates`] but without the local registry.
    pub(crate) async fn external_candidates(&self, target: &Coordinate) -> Vec<Candidate> {
        self.gather_from(target, [&self.transient, &self.survey]).await
    }

    async fn gather_from<const N: usize>(
        &self,
        target: &Coordinate,
        resolvers: [&Arc<dyn CatalogResolver>; N],
    ) -> Vec<Candidate> {
        let sources: Vec<&Arc<dyn CatalogResolver>> = resolvers
            .into_iter()
            .filter(|r| r.supports_coordinate_lookup())
            .collect();

        let results = join_all(sources.iter().map(|resolver| async move {
            let source = resolver.source();
            match self
                .retry
                .run(source, || resolver.lookup_by_coordinate(target))
                .await
            {
                Ok(found) => found
                    .into_iter()
                    .map(|found| Candidate { source, found })
                    .collect::<Vec<_>>(),
                Err(e) => {
                    tracing::warn!(%source, %e, "coordinate lookup failed, treating as miss");
                    Vec::new()
                }
            }
        }))
        .await;

        let mut candidates: Vec<Candidate> = results.into_iter().flatten().collect();
        candidates.sort_by(compare_candidates);
        candidates
    }

    /// Fill absent host fields from the host catalog.
    async fn enrich(&self, record: &mut ObjectRecord) -> Vec<RecordField> {
        let Some(host) = record.host_name.clone() else {
            return Vec::new();
        };
        if !record.missing_host_fields() {
            return Vec::new();
        }
        let Some(host_record) = self.lookup_name(&*self.host, &host).await else {
            return Vec::new();
        };
        let filled = record.fill_absent_from(&host_record, &RecordField::HOST);
        if !filled.is_empty() {
            tracing::debug!(name = %record.name, %host, ?filled, "host fields enriched");
        }
        filled
    }

    /// Name lookup through the retry policy. Failures become misses.
    async fn lookup_name(&self, resolver: &dyn CatalogResolver, name: &str) -> Option<ObjectRecord> {
        let source = resolver.source();
        match self.retry.run(source, || resolver.lookup_by_name(name)).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(%source, query = name, %e, "catalog lookup failed, treating as miss");
                None
            }
        }
    }
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.found
        .offset_sq
        .total_cmp(&b.found.offset_sq)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.found.record.name.cmp(&b.found.record.name))
}

fn describe(name: Option<&str>, coordinate: Option<&Coordinate>) -> String {
    match (name, coordinate) {
        (Some(name), Some(coord)) => format!("'{name}' at {coord}"),
        (Some(name), None) => format!("'{name}'"),
        (None, Some(coord)) => coord.to_string(),
        (None, None) => "an empty query".to_string(),
    }
}
