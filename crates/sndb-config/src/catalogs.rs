//! External catalog endpoints and HTTP client settings.

use serde::{Deserialize, Serialize};

fn default_tns_url() -> String {
    String::from("https://www.wis-tns.org")
}

fn default_rochester_active_url() -> String {
    String::from("http://www.rochesterastronomy.org/snimages/snactive.html")
}

fn default_rochester_historical_url() -> String {
    String::from("http://www.rochesterastronomy.org/snimages/sndateall.html")
}

fn default_simbad_url() -> String {
    String::from("https://simbad.cds.unistra.fr/simbad/sim-id")
}

fn default_user_agent() -> String {
    String::from("sndb/0.1")
}

/// Default HTTP timeout in seconds.
const fn default_timeout_secs() -> u64 {
    20
}

/// Default TNS cone radius in arcminutes.
const fn default_tns_radius_arcmin() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogsConfig {
    /// Transient Name Server base URL (search lives under `/search`).
    #[serde(default = "default_tns_url")]
    pub tns_url: String,

    /// Cone radius for TNS coordinate searches, in arcminutes.
    #[serde(default = "default_tns_radius_arcmin")]
    pub tns_radius_arcmin: f64,

    /// Rochester page listing currently active supernovae.
    #[serde(default = "default_rochester_active_url")]
    pub rochester_active_url: String,

    /// Rochester page listing all historical supernovae.
    #[serde(default = "default_rochester_historical_url")]
    pub rochester_historical_url: String,

    /// SIMBAD identifier query endpoint.
    #[serde(default = "default_simbad_url")]
    pub simbad_url: String,

    /// User agent sent with every catalog request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogsConfig {
    fn default() -> Self {
        Self {
            tns_url: default_tns_url(),
            tns_radius_arcmin: default_tns_radius_arcmin(),
            rochester_active_url: default_rochester_active_url(),
            rochester_historical_url: default_rochester_historical_url(),
            simbad_url: default_simbad_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
