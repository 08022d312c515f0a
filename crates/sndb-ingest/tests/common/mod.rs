#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sndb_catalog::{
    CatalogError, CatalogResolver, CoordinateMatch, InMemoryRegistry, LocalRegistry, RegistryStore,
    RetryPolicy, rank,
};
use sndb_core::{CatalogSource, Coordinate, ObjectRecord};
use sndb_ingest::{Disambiguation, IdentityMatcher};

/// Canned catalog with call counters.
pub struct FakeCatalog {
    source: CatalogSource,
    by_name: BTreeMap<String, ObjectRecord>,
    near: Vec<ObjectRecord>,
    coordinates: bool,
    failing: bool,
    pub name_calls: AtomicUsize,
    pub coordinate_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            by_name: BTreeMap::new(),
            near: Vec::new(),
            coordinates: false,
            failing: false,
            name_calls: AtomicUsize::new(0),
            coordinate_calls: AtomicUsize::new(0),
        }
    }

    fn key(&self, name: &str) -> String {
        if self.source == CatalogSource::HistoricalSurveyIndex {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn with_name(mut self, record: ObjectRecord) -> Self {
        let record = record.attributed_to(self.source);
        self.by_name.insert(self.key(&record.name), record);
        self
    }

    pub fn with_near(mut self, record: ObjectRecord) -> Self {
        self.coordinates = true;
        self.near.push(record.attributed_to(self.source));
        self
    }

    pub fn with_coordinates(mut self) -> Self {
        self.coordinates = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogResolver for FakeCatalog {
    fn source(&self) -> CatalogSource {
        self.source
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(CatalogError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self.by_name.get(&self.key(name)).cloned())
    }

    fn supports_coordinate_lookup(&self) -> bool {
        self.coordinates
    }

    async fn lookup_by_coordinate(
        &self,
        target: &Coordinate,
    ) -> Result<Vec<CoordinateMatch>, CatalogError> {
        self.coordinate_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(CatalogError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        let mut matches: Vec<_> = self
            .near
            .iter()
            .cloned()
            .filter_map(|record| CoordinateMatch::measure(record, target))
            .collect();
        rank(&mut matches);
        Ok(matches)
    }
}

/// Prompt that returns a fixed answer and records what it was shown.
pub struct ScriptedPrompt {
    answer: Option<usize>,
    pub shown: std::sync::Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: Option<usize>) -> Self {
        Self {
            answer,
            shown: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl Disambiguation for ScriptedPrompt {
    async fn choose(&self, candidates: &[CoordinateMatch]) -> Option<usize> {
        self.shown
            .lock()
            .unwrap()
            .push(candidates.iter().map(|c| c.record.name.clone()).collect());
        self.answer
    }
}

pub fn at(name: &str, ra: f64, dec: f64) -> ObjectRecord {
    let mut record = ObjectRecord::new(name);
    record.coordinate = Some(Coordinate::from_degrees(ra, dec).unwrap());
    record
}

pub struct Catalogs {
    pub store: Arc<InMemoryRegistry>,
    pub transient: Arc<FakeCatalog>,
    pub survey: Arc<FakeCatalog>,
    pub host: Arc<FakeCatalog>,
}

impl Catalogs {
    pub fn new(registry: InMemoryRegistry, transient: FakeCatalog, survey: FakeCatalog, host: FakeCatalog) -> Self {
        Self {
            store: Arc::new(registry),
            transient: Arc::new(transient),
            survey: Arc::new(survey),
            host: Arc::new(host),
        }
    }

    pub fn empty() -> Self {
        Self::new(
            InMemoryRegistry::new(),
            FakeCatalog::new(CatalogSource::TransientNameServer),
            FakeCatalog::new(CatalogSource::HistoricalSurveyIndex),
            FakeCatalog::new(CatalogSource::HostCatalog),
        )
    }

    pub fn store(&self) -> Arc<dyn RegistryStore> {
        self.store.clone()
    }

    pub fn matcher(&self) -> IdentityMatcher {
        let registry = LocalRegistry::new(self.store(), 10.0, 5);
        IdentityMatcher::new(
            Arc::new(registry),
            self.transient.clone(),
            self.survey.clone(),
            self.host.clone(),
        )
        .with_retry(RetryPolicy::from_millis(2, 1, 1))
    }
}

fn card(text: &str) -> String {
    format!("{text:<80}")
}

/// Write a minimal FITS primary header with `cards` to `path`.
pub fn write_fits(path: &Path, cards: &[&str]) {
    let mut out = card("SIMPLE  =                    T");
    for c in cards {
        out.push_str(&card(c));
    }
    out.push_str(&card("END"));
    while out.len() % 2880 != 0 {
        out.push(' ');
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, out).unwrap();
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

/// Write a short two-column spectrum to `path`.
pub fn write_spectrum(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "# wavelength flux\n3500.0 1.0e-15\n3502.0 1.1e-15\n3504.0 1.0e-15\n").unwrap();
}
