//! SIMBAD host-galaxy lookups.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use sndb_core::{CatalogSource, ObjectRecord, non_blank};

use crate::CatalogResolver;
use crate::error::CatalogError;
use crate::http::get_text;

static MORPHOLOGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Morphological type:\s+(\S+)\s").expect("morphology regex is valid")
});
static REDSHIFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Redshift:\s+(\d+\.\d+)").expect("redshift regex is valid"));

/// Parse SIMBAD's ASCII identifier output for `host`.
///
/// Returns `None` when SIMBAD reports an error (lines starting `!!`), e.g.
/// an unknown identifier. `~` marks an unknown value.
#[must_use]
pub fn parse_simbad_ascii(host: &str, text: &str) -> Option<ObjectRecord> {
    if text.lines().any(|line| line.trim_start().starts_with("!!")) {
        return None;
    }
    let mut record = ObjectRecord::new(host);
    record.host_name = Some(host.to_string());
    record.host_type = MORPHOLOGY
        .captures(text)
        .and_then(|c| non_blank(&c[1]))
        .filter(|t| t != "~");
    record.host_redshift = REDSHIFT.captures(text).and_then(|c| c[1].parse().ok());
    Some(record.attributed_to(CatalogSource::HostCatalog))
}

/// Host-galaxy enrichment source. Looked up by host name only.
#[derive(Debug, Clone)]
pub struct HostCatalogService {
    http: reqwest::Client,
    base_url: String,
}

impl HostCatalogService {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, host: &str) -> String {
        format!(
            "{}?output.format=ASCII&Ident={}",
            self.base_url,
            urlencoding::encode(host)
        )
    }
}

#[async_trait]
impl CatalogResolver for HostCatalogService {
    fn source(&self) -> CatalogSource {
        CatalogSource::HostCatalog
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<ObjectRecord>, CatalogError> {
        let text = get_text(&self.http, &self.url(name)).await?;
        let record = parse_simbad_ascii(name, &text);
        if record.is_none() {
            tracing::debug!(host = name, "host unknown to SIMBAD");
        }
        Ok(record)
    }
}
