//! Canonical object records and per-field provenance.
//!
//! Every optional field is either present or absent; catalogs never fill a
//! field with an empty string or zero to mean "unknown". The provenance map
//! records which catalog supplied each present field.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// A catalog or store that can supply object fields.
///
/// Declaration order is resolution priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    LocalRegistry,
    TransientNameServer,
    HistoricalSurveyIndex,
    HostCatalog,
}

impl CatalogSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalRegistry => "local_registry",
            Self::TransientNameServer => "transient_name_server",
            Self::HistoricalSurveyIndex => "historical_survey_index",
            Self::HostCatalog => "host_catalog",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field names of [`ObjectRecord`], used as provenance keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Name,
    AltName,
    Coordinate,
    ObjectType,
    TypeReference,
    Redshift,
    HostName,
    HostType,
    HostRedshift,
    DiscoveryDate,
    Discoverer,
    Notes,
}

impl RecordField {
    pub const ALL: [Self; 12] = [
        Self::Name,
        Self::AltName,
        Self::Coordinate,
        Self::ObjectType,
        Self::TypeReference,
        Self::Redshift,
        Self::HostName,
        Self::HostType,
        Self::HostRedshift,
        Self::DiscoveryDate,
        Self::Discoverer,
        Self::Notes,
    ];

    /// Fields supplied by host-galaxy enrichment.
    pub const HOST: [Self; 2] = [Self::HostType, Self::HostRedshift];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::AltName => "alt_name",
            Self::Coordinate => "coordinate",
            Self::ObjectType => "object_type",
            Self::TypeReference => "type_reference",
            Self::Redshift => "redshift",
            Self::HostName => "host_name",
            Self::HostType => "host_type",
            Self::HostRedshift => "host_redshift",
            Self::DiscoveryDate => "discovery_date",
            Self::Discoverer => "discoverer",
            Self::Notes => "notes",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field → catalog that supplied it.
pub type Provenance = BTreeMap<RecordField, CatalogSource>;

/// The canonical identity of an astronomical object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_redshift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discoverer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub provenance: Provenance,
}

impl ObjectRecord {
    /// A record with only a name and no provenance.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alt_name: None,
            coordinate: None,
            object_type: None,
            type_reference: None,
            redshift: None,
            host_name: None,
            host_type: None,
            host_redshift: None,
            discovery_date: None,
            discoverer: None,
            notes: None,
            provenance: Provenance::new(),
        }
    }

    /// Attribute every present field without provenance to `source`.
    #[must_use]
    pub fn attributed_to(mut self, source: CatalogSource) -> Self {
        for field in RecordField::ALL {
            if self.has(field) {
                self.provenance.entry(field).or_insert(source);
            }
        }
        self
    }

    /// Whether `field` holds a value.
    #[must_use]
    pub const fn has(&self, field: RecordField) -> bool {
        match field {
            RecordField::Name => true,
            RecordField::AltName => self.alt_name.is_some(),
            RecordField::Coordinate => self.coordinate.is_some(),
            RecordField::ObjectType => self.object_type.is_some(),
            RecordField::TypeReference => self.type_reference.is_some(),
            RecordField::Redshift => self.redshift.is_some(),
            RecordField::HostName => self.host_name.is_some(),
            RecordField::HostType => self.host_type.is_some(),
            RecordField::HostRedshift => self.host_redshift.is_some(),
            RecordField::DiscoveryDate => self.discovery_date.is_some(),
            RecordField::Discoverer => self.discoverer.is_some(),
            RecordField::Notes => self.notes.is_some(),
        }
    }

    /// The catalog that supplied `field`, if known.
    #[must_use]
    pub fn source_of(&self, field: RecordField) -> Option<CatalogSource> {
        self.provenance.get(&field).copied()
    }

    /// Whether any host-enrichment field is absent.
    #[must_use]
    pub const fn missing_host_fields(&self) -> bool {
        self.host_type.is_none() || self.host_redshift.is_none()
    }

    /// Copy each of `fields` that is absent here and present in `other`.
    ///
    /// Present fields are never overwritten. Provenance of a copied field
    /// follows `other`. Returns the fields that were filled.
    pub fn fill_absent_from(&mut self, other: &Self, fields: &[RecordField]) -> Vec<RecordField> {
        let mut filled = Vec::new();
        for &field in fields {
            if self.copy_if_absent(other, field) {
                if let Some(source) = other.source_of(field) {
                    self.provenance.insert(field, source);
                }
                filled.push(field);
            }
        }
        filled
    }

    fn copy_if_absent(&mut self, other: &Self, field: RecordField) -> bool {
        match field {
            RecordField::Name => false,
            RecordField::AltName => fill(&mut self.alt_name, &other.alt_name),
            RecordField::Coordinate => fill(&mut self.coordinate, &other.coordinate),
            RecordField::ObjectType => fill(&mut self.object_type, &other.object_type),
            RecordField::TypeReference => fill(&mut self.type_reference, &other.type_reference),
            RecordField::Redshift => fill(&mut self.redshift, &other.redshift),
            RecordField::HostName => fill(&mut self.host_name, &other.host_name),
            RecordField::HostType => fill(&mut self.host_type, &other.host_type),
            RecordField::HostRedshift => fill(&mut self.host_redshift, &other.host_redshift),
            RecordField::DiscoveryDate => fill(&mut self.discovery_date, &other.discovery_date),
            RecordField::Discoverer => fill(&mut self.discoverer, &other.discoverer),
            RecordField::Notes => fill(&mut self.notes, &other.notes),
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) -> bool {
    match (slot.as_ref(), value) {
        (None, Some(v)) => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

/// Treat blank catalog text and the `---` placeholder as absent.
#[must_use]
pub fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "---" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Host placeholder catalogs use for "no known host".
pub const ANONYMOUS_HOST: &str = "Anon.";

/// Host name text, with blanks and [`ANONYMOUS_HOST`] treated as absent.
#[must_use]
pub fn known_host(text: &str) -> Option<String> {
    non_blank(text).filter(|host| host != ANONYMOUS_HOST)
}

/// Parse a catalog discovery date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, and `YYYY MM DD`, each optionally
/// followed by a time or a fractional day, which is dropped.
#[must_use]
pub fn parse_discovery_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let head: String = trimmed
        .split(['T', '.'])
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");
    // "2020-01-15 12:34:56" splits into date + time on whitespace.
    let date_part = head.split(' ').next().unwrap_or_default();
    for (input, fmt) in [
        (date_part, "%Y-%m-%d"),
        (date_part, "%Y/%m/%d"),
        (head.as_str(), "%Y %m %d"),
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Some(date);
        }
    }
    None
}
