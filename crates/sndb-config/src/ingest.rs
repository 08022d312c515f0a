//! File discovery and resolution settings.

use serde::{Deserialize, Serialize};

fn default_observation_suffix() -> String {
    String::from(".flm")
}

fn default_calibration_suffix() -> String {
    String::from(".fits")
}

fn default_photometry_suffix() -> String {
    String::from(".dat")
}

fn default_details_dir() -> String {
    String::from("details")
}

/// Minimum stem similarity for a calibration file to count as a match.
const fn default_match_cutoff() -> f64 {
    0.6
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Suffix of observation (spectrum) files.
    #[serde(default = "default_observation_suffix")]
    pub observation_suffix: String,

    /// Suffix of calibration (header) files.
    #[serde(default = "default_calibration_suffix")]
    pub calibration_suffix: String,

    /// Suffix of light-curve (photometry) files.
    #[serde(default = "default_photometry_suffix")]
    pub photometry_suffix: String,

    /// Folder name whose observation files are skipped by default.
    #[serde(default = "default_details_dir")]
    pub details_dir: String,

    /// Include observation files found under the details folder.
    #[serde(default)]
    pub include_details: bool,

    /// Skip observation files without a calibration match.
    #[serde(default)]
    pub require_calibration: bool,

    /// Similarity cutoff in `[0, 1]` for fuzzy calibration matching.
    #[serde(default = "default_match_cutoff")]
    pub match_cutoff: f64,

    /// Number of coordinate candidates offered for manual confirmation.
    /// `0` disables prompting entirely.
    #[serde(default)]
    pub interactive_budget: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            observation_suffix: default_observation_suffix(),
            calibration_suffix: default_calibration_suffix(),
            photometry_suffix: default_photometry_suffix(),
            details_dir: default_details_dir(),
            include_details: false,
            require_calibration: false,
            match_cutoff: default_match_cutoff(),
            interactive_budget: 0,
        }
    }
}
