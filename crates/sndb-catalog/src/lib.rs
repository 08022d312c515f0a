//! # sndb-catalog
//!
//! Catalog lookup clients for SNDB identity resolution.
//!
//! Each catalog implements [`CatalogResolver`] and normalizes its own field
//! names into the shared [`ObjectRecord`] shape:
//!
//! - **Local registry**: previously-resolved objects behind a
//!   [`RegistryStore`]
//! - **Transient Name Server**: CSV search export
//! - **Historical survey index**: Rochester supernova pages, fetched once
//! - **Host catalog**: SIMBAD identifier lookups for host galaxies
//!
//! All HTTP traffic goes through a shared `reqwest::Client`; callers wrap
//! lookups in a [`RetryPolicy`].

pub mod error;
pub mod host;
mod html;
pub mod http;
pub mod registry;
pub mod retry;
pub mod survey;
pub mod tns;

pub use error::CatalogError;
pub use host::HostCatalogService;
pub use registry::{InMemoryRegistry, LocalRegistry, RegistryStore};
pub use retry::RetryPolicy;
pub use survey::{HistoricalSurveyIndex, RochesterPages, SurveySource, SurveyTable};
pub use tns::TransientNameServer;

use async_trait::async_trait;
use serde::Serialize;
use sndb_core::{CatalogSource, Coordinate, ObjectRecord};

/// A coordinate-search candidate with its flat squared offset (deg²).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateMatch {
    pub record: ObjectRecord,
    pub offset_sq: f64,
}

impl CoordinateMatch {
    /// Candidate for `record` relative to `target`; `None` if the record has
    /// no coordinate.
    #[must_use]
    pub fn measure(record: ObjectRecord, target: &Coordinate) -> Option<Self> {
        let offset_sq = record.coordinate.as_ref()?.squared_offset(target);
        Some(Self { record, offset_sq })
    }
}

/// Sort candidates by ascending offset, then name.
pub fn rank(matches: &mut [CoordinateMatch]) {
    matches.sort_by(|a, b| {
        a.offset_sq
            .total_cmp(&b.offset_sq)
            .then_with(|| a.record.name.cmp(&b.record.name))
    });
}

/// Lookup capabilities of one catalog.
///
/// `Ok(None)` and an empty candidate list are explicit misses. Errors are
/// failures the caller may retry.
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    fn source(&self) -> CatalogSource;

    async fn lookup_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError>;

    fn supports_coordinate_lookup(&self) -> bool {
        false
    }

    /// Ranked candidates near `target`, ascending by offset.
    async fn lookup_by_coordinate(
        &self,
        _target: &Coordinate,
    ) -> Result<Vec<CoordinateMatch>, CatalogError> {
        Ok(Vec::new())
    }
}
