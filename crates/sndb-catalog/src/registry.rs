//! The local registry of previously-resolved objects.
//!
//! [`RegistryStore`] is the storage contract; [`InMemoryRegistry`] is the
//! default store, optionally persisted as a JSON snapshot. [`LocalRegistry`]
//! exposes a store as a [`CatalogResolver`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use sndb_core::{CatalogSource, Coordinate, ObjectRecord};

use crate::error::CatalogError;
use crate::{CatalogResolver, CoordinateMatch, rank};

/// Storage contract for resolved objects, keyed by exact name.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError>;

    /// Records whose squared offset from `target` is below `max_offset_sq`,
    /// ascending, at most `limit`.
    async fn find_near(
        &self,
        target: &Coordinate,
        max_offset_sq: f64,
        limit: usize,
    ) -> Result<Vec<CoordinateMatch>, CatalogError>;

    /// Insert a new record. An existing name is a [`CatalogError::Conflict`].
    async fn insert(&self, record: ObjectRecord) -> Result<(), CatalogError>;

    /// Replace the record with the same name.
    async fn update(&self, record: ObjectRecord) -> Result<(), CatalogError>;

    /// Replace the record named `previous` with `record`, which may carry a
    /// new name. A new name already in use is a [`CatalogError::Conflict`].
    async fn rename(&self, previous: &str, record: ObjectRecord) -> Result<(), CatalogError>;

    /// Every record, ordered by name.
    async fn list(&self) -> Result<Vec<ObjectRecord>, CatalogError>;
}

/// In-process registry store.
///
/// All writes take one lock, so inserts for a given name are serialized.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    objects: RwLock<BTreeMap<String, ObjectRecord>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records. Later duplicates replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = ObjectRecord>) -> Self {
        let objects = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            objects: RwLock::new(objects),
        }
    }

    /// Load a JSON snapshot (an array of records). A missing file is an
    /// empty registry.
    pub fn load_json(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no registry snapshot, starting empty");
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Store(format!("read {}: {e}", path.display())))?;
        let records: Vec<ObjectRecord> = serde_json::from_str(&text)
            .map_err(|e| CatalogError::Store(format!("parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), objects = records.len(), "registry snapshot loaded");
        Ok(Self::from_records(records))
    }

    /// Write all records to `path` as a JSON array, sorted by name.
    pub fn save_json(&self, path: &Path) -> Result<(), CatalogError> {
        let records = self.records()?;
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| CatalogError::Store(format!("serialize registry: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CatalogError::Store(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(path, json)
            .map_err(|e| CatalogError::Store(format!("write {}: {e}", path.display())))
    }

    pub fn records(&self) -> Result<Vec<ObjectRecord>, CatalogError> {
        Ok(self.read()?.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, CatalogError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, ObjectRecord>>, CatalogError> {
        self.objects
            .read()
            .map_err(|_| CatalogError::Store("registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, ObjectRecord>>, CatalogError> {
        self.objects
            .write()
            .map_err(|_| CatalogError::Store("registry lock poisoned".to_string()))
    }
}

#[async_trait]
impl RegistryStore for InMemoryRegistry {
    async fn find_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        Ok(self.read()?.get(name).cloned())
    }

    async fn find_near(
        &self,
        target: &Coordinate,
        max_offset_sq: f64,
        limit: usize,
    ) -> Result<Vec<CoordinateMatch>, CatalogError> {
        let mut matches: Vec<_> = self
            .read()?
            .values()
            .filter_map(|record| CoordinateMatch::measure(record.clone(), target))
            .filter(|m| m.offset_sq < max_offset_sq)
            .collect();
        rank(&mut matches);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn insert(&self, record: ObjectRecord) -> Result<(), CatalogError> {
        let mut objects = self.write()?;
        if objects.contains_key(&record.name) {
            return Err(CatalogError::Conflict { name: record.name });
        }
        objects.insert(record.name.clone(), record);
        Ok(())
    }

    async fn update(&self, record: ObjectRecord) -> Result<(), CatalogError> {
        let mut objects = self.write()?;
        match objects.get_mut(&record.name) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(CatalogError::Store(format!(
                "no registry entry named '{}'",
                record.name
            ))),
        }
    }

    async fn rename(&self, previous: &str, record: ObjectRecord) -> Result<(), CatalogError> {
        let mut objects = self.write()?;
        if !objects.contains_key(previous) {
            return Err(CatalogError::Store(format!(
                "no registry entry named '{previous}'"
            )));
        }
        if record.name != previous && objects.contains_key(&record.name) {
            return Err(CatalogError::Conflict { name: record.name });
        }
        objects.remove(previous);
        objects.insert(record.name.clone(), record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.records()
    }
}

/// The registry as a catalog: exact-name and bounded coordinate lookups.
#[derive(Clone)]
pub struct LocalRegistry {
    store: Arc<dyn RegistryStore>,
    search_radius_sq: f64,
    search_limit: usize,
}

impl LocalRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn RegistryStore>, search_radius_sq: f64, search_limit: usize) -> Self {
        Self {
            store,
            search_radius_sq,
            search_limit,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }
}

#[async_trait]
impl CatalogResolver for LocalRegistry {
    fn source(&self) -> CatalogSource {
        CatalogSource::LocalRegistry
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        Ok(self
            .store
            .find_by_name(name)
            .await?
            .map(|record| record.attributed_to(CatalogSource::LocalRegistry)))
    }

    fn supports_coordinate_lookup(&self) -> bool {
        true
    }

    async fn lookup_by_coordinate(
        &self,
        target: &Coordinate,
    ) -> Result<Vec<CoordinateMatch>, CatalogError> {
        let matches = self
            .store
            .find_near(target, self.search_radius_sq, self.search_limit)
            .await?;
        Ok(matches
            .into_iter()
            .map(|m| CoordinateMatch {
                record: m.record.attributed_to(CatalogSource::LocalRegistry),
                offset_sq: m.offset_sq,
            })
            .collect())
    }
}
