//! Transient Name Server client (CSV search export).

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use sndb_core::{
    CatalogSource, Coordinate, ObjectRecord, known_host, non_blank, parse_discovery_date,
};

use crate::error::CatalogError;
use crate::http::get_text;
use crate::{CatalogResolver, CoordinateMatch, rank};

/// Type reference attached to every TNS record.
pub const TYPE_REFERENCE: &str = "TNS";

static DESIGNATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}[a-zA-Z]+").expect("designation regex is valid"));

/// Extract the TNS designation (`2020abc`) from a candidate name.
#[must_use]
pub fn designation(name: &str) -> Option<&str> {
    DESIGNATION.find(name).map(|m| m.as_str())
}

#[derive(Debug, serde::Deserialize)]
struct TnsRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "RA", default)]
    ra: String,
    #[serde(rename = "DEC", default)]
    dec: String,
    #[serde(rename = "Obj. Type", default)]
    object_type: String,
    #[serde(rename = "Redshift", default)]
    redshift: String,
    #[serde(rename = "Host Name", default)]
    host_name: String,
    #[serde(rename = "Host Redshift", default)]
    host_redshift: String,
    #[serde(rename = "Discovery Date (UT)", default)]
    discovery_date: String,
    #[serde(rename = "Reporters", default)]
    reporters: String,
}

impl TnsRow {
    fn into_record(self) -> ObjectRecord {
        let mut record = ObjectRecord::new(self.name.trim());
        record.coordinate = match Coordinate::parse(&self.ra, &self.dec) {
            Ok(coord) => Some(coord),
            Err(e) => {
                tracing::debug!(name = %record.name, %e, "TNS row without usable coordinate");
                None
            }
        };
        record.object_type = non_blank(&self.object_type).map(|t| match t.strip_prefix("SN ") {
            Some(rest) => rest.trim().to_string(),
            None => t,
        });
        record.type_reference = Some(TYPE_REFERENCE.to_string());
        record.redshift = parse_number(&self.redshift);
        record.host_name = known_host(&self.host_name);
        record.host_redshift = parse_number(&self.host_redshift);
        record.discovery_date = parse_discovery_date(&self.discovery_date);
        record.discoverer = non_blank(&self.reporters);
        record.attributed_to(CatalogSource::TransientNameServer)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    non_blank(text).and_then(|t| t.parse().ok())
}

/// Parse a TNS CSV search export into records.
pub fn parse_search_csv(text: &str) -> Result<Vec<ObjectRecord>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    reader
        .deserialize::<TnsRow>()
        .map(|row| {
            row.map(TnsRow::into_record)
                .map_err(|e| CatalogError::Parse(format!("TNS CSV: {e}")))
        })
        .collect()
}

/// Client for the TNS search export.
#[derive(Debug, Clone)]
pub struct TransientNameServer {
    http: reqwest::Client,
    base_url: String,
    radius_arcmin: f64,
}

impl TransientNameServer {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, radius_arcmin: f64) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            radius_arcmin,
        }
    }

    fn name_url(&self, designation: &str) -> String {
        format!(
            "{}/search?name={}&format=csv",
            self.base_url,
            urlencoding::encode(designation)
        )
    }

    fn coordinate_url(&self, target: &Coordinate) -> String {
        format!(
            "{}/search?ra={:.6}&decl={:.6}&radius={}&coords_unit=arcmin&format=csv",
            self.base_url,
            target.ra_deg(),
            target.dec_deg(),
            self.radius_arcmin
        )
    }
}

#[async_trait]
impl CatalogResolver for TransientNameServer {
    fn source(&self) -> CatalogSource {
        CatalogSource::TransientNameServer
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        let Some(wanted) = designation(name) else {
            tracing::debug!(name, "no TNS designation in name");
            return Ok(None);
        };
        let text = get_text(&self.http, &self.name_url(wanted)).await?;
        Ok(parse_search_csv(&text)?
            .into_iter()
            .find(|record| designation(&record.name).is_some_and(|d| d.eq_ignore_ascii_case(wanted))))
    }

    fn supports_coordinate_lookup(&self) -> bool {
        true
    }

    async fn lookup_by_coordinate(
        &self,
        target: &Coordinate,
    ) -> Result<Vec<CoordinateMatch>, CatalogError> {
        let text = get_text(&self.http, &self.coordinate_url(target)).await?;
        let mut matches: Vec<_> = parse_search_csv(&text)?
            .into_iter()
            .filter_map(|record| CoordinateMatch::measure(record, target))
            .collect();
        rank(&mut matches);
        Ok(matches)
    }
}
