//! Local registry settings.

use serde::{Deserialize, Serialize};

/// Squared-offset threshold (deg²) for registry coordinate queries.
const fn default_search_radius_sq() -> f64 {
    10.0
}

const fn default_search_limit() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Registry coordinate candidates must lie below this squared offset.
    #[serde(default = "default_search_radius_sq")]
    pub search_radius_sq: f64,

    /// Maximum number of registry coordinate candidates.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// JSON snapshot the CLI loads the registry from and saves it to.
    /// Empty means in-memory only.
    #[serde(default)]
    pub snapshot_path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            search_radius_sq: default_search_radius_sq(),
            search_limit: default_search_limit(),
            snapshot_path: String::new(),
        }
    }
}

impl RegistryConfig {
    /// Whether a snapshot file is configured.
    pub fn has_snapshot(&self) -> bool {
        !self.snapshot_path.is_empty()
    }
}
