//! Historical survey index built from the Rochester supernova pages.
//!
//! The table is large, so it is fetched once and held by
//! [`HistoricalSurveyIndex`] until [`HistoricalSurveyIndex::refresh`] is
//! called. Keys are lowercased object names.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sndb_core::{CatalogSource, Coordinate, ObjectRecord, known_host, non_blank, parse_discovery_date};
use tokio::sync::RwLock;

use crate::error::CatalogError;
use crate::html;
use crate::http::get_text;
use crate::{CatalogResolver, CoordinateMatch, rank};

/// Default number of coordinate candidates returned from a scan.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

/// Parsed survey table keyed by lowercased name.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    entries: BTreeMap<String, ObjectRecord>,
}

impl SurveyTable {
    /// Build from the active and historical pages. Historical rows replace
    /// active rows with the same key.
    ///
    /// Every table after the first on the active page holds objects; the
    /// historical page has a single object table, the second one.
    #[must_use]
    pub fn from_pages(active: &str, historical: &str) -> Self {
        let mut table = Self::default();
        let active_tables = html::tables(active).into_iter().skip(1);
        for row in data_rows(active_tables) {
            if let Some(record) = active_row(&row) {
                table.insert(record);
            }
        }
        let historical_table = html::tables(historical).into_iter().nth(1);
        for row in data_rows(historical_table) {
            if let Some(record) = historical_row(&row) {
                table.insert(record);
            }
        }
        table
    }

    pub fn insert(&mut self, record: ObjectRecord) {
        let record = record.attributed_to(CatalogSource::HistoricalSurveyIndex);
        self.entries.insert(record.name.to_lowercase(), record);
    }

    /// Exact lookup by lowercased key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ObjectRecord> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest `limit` entries to `target`, ascending.
    #[must_use]
    pub fn nearest(&self, target: &Coordinate, limit: usize) -> Vec<CoordinateMatch> {
        let mut matches: Vec<_> = self
            .entries
            .values()
            .filter_map(|record| CoordinateMatch::measure(record.clone(), target))
            .collect();
        rank(&mut matches);
        matches.truncate(limit);
        matches
    }
}

/// Rows with more than one cell; single-cell rows are section banners.
fn data_rows(tables: impl IntoIterator<Item = html::Table>) -> impl Iterator<Item = Vec<String>> {
    tables.into_iter().flatten().filter(|row| row.len() > 1)
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", String::as_str)
}

/// Active page: name 0, host 1, RA 2, Dec 3, type 7, date 11, discoverer 12.
fn active_row(row: &[String]) -> Option<ObjectRecord> {
    let name = non_blank(cell(row, 0))?;
    let coordinate = Coordinate::parse(cell(row, 2), cell(row, 3)).ok()?;
    let mut record = ObjectRecord::new(name);
    record.coordinate = Some(coordinate);
    record.host_name = known_host(cell(row, 1));
    record.object_type = non_blank(cell(row, 7));
    record.discovery_date = parse_discovery_date(cell(row, 11));
    record.discoverer = non_blank(cell(row, 12));
    Some(record)
}

/// Historical page: RA 0, Dec 1, date 2, host 6, type 7, magnitude 9,
/// name 10, alt 11. Rows without a numeric magnitude are dropped.
fn historical_row(row: &[String]) -> Option<ObjectRecord> {
    cell(row, 9).trim().parse::<f64>().ok()?;
    let name = non_blank(cell(row, 10))?;
    let coordinate = Coordinate::parse(cell(row, 0), cell(row, 1)).ok()?;
    let mut record = ObjectRecord::new(name);
    record.coordinate = Some(coordinate);
    record.discovery_date = parse_discovery_date(cell(row, 2));
    record.host_name = known_host(cell(row, 6));
    record.object_type = non_blank(cell(row, 7));
    record.alt_name = non_blank(cell(row, 11));
    Some(record)
}

/// Where survey pages come from.
#[async_trait]
pub trait SurveySource: Send + Sync {
    async fn fetch(&self) -> Result<SurveyTable, CatalogError>;
}

/// Fetches the Rochester active and historical pages over HTTP.
#[derive(Debug, Clone)]
pub struct RochesterPages {
    http: reqwest::Client,
    active_url: String,
    historical_url: String,
}

impl RochesterPages {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        active_url: impl Into<String>,
        historical_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            active_url: active_url.into(),
            historical_url: historical_url.into(),
        }
    }
}

#[async_trait]
impl SurveySource for RochesterPages {
    async fn fetch(&self) -> Result<SurveyTable, CatalogError> {
        let (active, historical) = tokio::try_join!(
            get_text(&self.http, &self.active_url),
            get_text(&self.http, &self.historical_url),
        )?;
        Ok(SurveyTable::from_pages(&active, &historical))
    }
}

/// Memoized survey table with explicit refresh.
pub struct HistoricalSurveyIndex {
    source: Arc<dyn SurveySource>,
    table: RwLock<Option<Arc<SurveyTable>>>,
    candidate_limit: usize,
}

impl HistoricalSurveyIndex {
    #[must_use]
    pub fn new(source: Arc<dyn SurveySource>) -> Self {
        Self {
            source,
            table: RwLock::new(None),
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    /// The cached table, fetching it on first use.
    ///
    /// A failed fetch is not cached.
    pub async fn table(&self) -> Result<Arc<SurveyTable>, CatalogError> {
        if let Some(table) = self.table.read().await.as_ref() {
            return Ok(Arc::clone(table));
        }
        let mut slot = self.table.write().await;
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.source.fetch().await?);
        tracing::info!(entries = table.len(), "survey index loaded");
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Refetch the table, replacing the cache. Returns the new entry count.
    ///
    /// On failure the previous table stays cached.
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let table = Arc::new(self.source.fetch().await?);
        let entries = table.len();
        *self.table.write().await = Some(table);
        tracing::info!(entries, "survey index refreshed");
        Ok(entries)
    }

    pub async fn is_loaded(&self) -> bool {
        self.table.read().await.is_some()
    }
}

#[async_trait]
impl CatalogResolver for HistoricalSurveyIndex {
    fn source(&self) -> CatalogSource {
        CatalogSource::HistoricalSurveyIndex
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        Ok(self.table().await?.get(&name.to_lowercase()).cloned())
    }

    fn supports_coordinate_lookup(&self) -> bool {
        true
    }

    async fn lookup_by_coordinate(
        &self,
        target: &Coordinate,
    ) -> Result<Vec<CoordinateMatch>, CatalogError> {
        Ok(self.table().await?.nearest(target, self.candidate_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ACTIVE: &str = "<html><table><tr><td>Latest supernovae</td></tr></table>
<table>
<tr><th>SN</th><th>Host</th><th>R.A.</th><th>Decl.</th><th>Offset</th><th>Mag</th><th>Disc. Ref.</th><th>SN Position</th><th>Type</th><th>Date</th><th>Ref</th><th>Disc. date</th><th>Discoverer(s)</th></tr>
<tr><td>SN 2020abc</td><td>M87</td><td>12:30:49.42</td><td>+12:23:28.0</td><td>1E 2N</td><td>15.2</td><td>TNS</td><td>Ia</td><td>2020/01/20</td><td>ATel</td><td>x</td><td>2020/01/15</td><td>ZTF</td></tr>
<tr><td>AT 2020xyz</td><td>Anon.</td><td>01:00:00.00</td><td>-10:00:00.0</td><td></td><td></td><td></td><td>unk</td><td></td><td></td><td></td><td>2020/02/01</td><td>ATLAS</td></tr>
<tr><td>bad row</td><td>x</td><td>not a coordinate</td><td>?</td></tr>
</table></html>";

    const HISTORICAL: &str = "<html><table><tr><td>All supernovae</td></tr></table>
<table>
<tr><td>R.A.</td><td>Decl.</td><td>Date</td><td>x</td><td>x</td><td>x</td><td>Host</td><td>Type</td><td>x</td><td>Mag</td><td>SN</td><td>Alt</td></tr>
<tr><td>12:30:49.42</td><td>+12:23:28.0</td><td>2020/01/15</td><td></td><td></td><td></td><td>M87</td><td>Ia-norm</td><td></td><td>15.0</td><td>SN 2020abc</td><td>ZTF20aaaaaaa</td></tr>
<tr><td>10:00:00.00</td><td>+20:00:00.0</td><td>1999/03/10</td><td></td><td></td><td></td><td>NGC 1</td><td>II</td><td></td><td>16.0</td><td>SN 1999x</td><td></td></tr>
<tr><td>11:00:00.00</td><td>+21:00:00.0</td><td>1999/04/10</td><td></td><td></td><td></td><td>NGC 2</td><td>Ia</td><td></td><td>?</td><td>SN 1999y</td><td></td></tr>
</table>
<table><tr><td>Footnotes</td><td>x</td></tr>
<tr><td>12:00:00.00</td><td>+22:00:00.0</td><td>1999/05/10</td><td></td><td></td><td></td><td>NGC 3</td><td>Ia</td><td></td><td>17.0</td><td>SN 1999z</td><td></td></tr>
</table></html>";

    struct FixturePages {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl SurveySource for FixturePages {
        async fn fetch(&self) -> Result<SurveyTable, CatalogError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(SurveyTable::from_pages(ACTIVE, HISTORICAL))
        }
    }

    fn index() -> (Arc<FixturePages>, HistoricalSurveyIndex) {
        let pages = Arc::new(FixturePages {
            fetches: AtomicUsize::new(0),
        });
        let index = HistoricalSurveyIndex::new(pages.clone());
        (pages, index)
    }

    #[test]
    fn pages_parse_into_keyed_table() {
        let table = SurveyTable::from_pages(ACTIVE, HISTORICAL);
        assert_eq!(table.len(), 3);

        let at = table.get("at 2020xyz").unwrap();
        assert_eq!(at.host_name, None);
        assert_eq!(at.discoverer.as_deref(), Some("ATLAS"));

        let old = table.get("sn 1999x").unwrap();
        assert_eq!(old.object_type.as_deref(), Some("II"));
        assert_eq!(old.alt_name, None);
    }

    #[test]
    fn historical_page_reads_only_its_object_table() {
        let table = SurveyTable::from_pages(ACTIVE, HISTORICAL);
        assert!(table.get("sn 1999y").is_none(), "row without magnitude");
        assert!(table.get("sn 1999z").is_none(), "row from a later table");
    }

    #[test]
    fn historical_rows_override_active_rows() {
        let table = SurveyTable::from_pages(ACTIVE, HISTORICAL);
        let sn = table.get("sn 2020abc").unwrap();
        assert_eq!(sn.object_type.as_deref(), Some("Ia-norm"));
        assert_eq!(sn.alt_name.as_deref(), Some("ZTF20aaaaaaa"));
        assert_eq!(sn.discoverer, None);
        assert_eq!(
            sn.source_of(sndb_core::RecordField::ObjectType),
            Some(CatalogSource::HistoricalSurveyIndex)
        );
    }

    #[tokio::test]
    async fn table_is_fetched_once() {
        let (pages, index) = index();
        assert!(!index.is_loaded().await);
        assert!(index.lookup_by_name("SN 2020ABC").await.unwrap().is_some());
        assert!(index.lookup_by_name("SN 2020zzz").await.unwrap().is_none());
        assert_eq!(pages.fetches.load(Ordering::SeqCst), 1);

        assert_eq!(index.refresh().await.unwrap(), 3);
        assert_eq!(pages.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn coordinate_scan_is_ranked() {
        let (_, index) = index();
        let target = Coordinate::parse("12:30:49.42", "+12:23:28.0").unwrap();
        let matches = index.lookup_by_coordinate(&target).await.unwrap();
        assert_eq!(matches[0].record.name, "SN 2020abc");
        assert_eq!(matches[0].offset_sq, 0.0);
        assert!(matches.windows(2).all(|w| w[0].offset_sq <= w[1].offset_sq));
    }
}
