//! Candidate object names from observation folders.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static DESIGNATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(p?sn)[\s_-]*(\d{4})([a-z]*)$").expect("designation regex is valid")
});

/// Normalize a folder name to registry form.
///
/// `sn2016a` becomes `SN 2016A`, `psn2013ab` becomes `PSN 2013ab`. Names
/// that are not a supernova designation are returned trimmed.
#[must_use]
pub fn candidate_name(folder: &str) -> String {
    let folder = folder.trim();
    let Some(caps) = DESIGNATED.captures(folder) else {
        return folder.to_string();
    };
    let prefix = caps[1].to_uppercase();
    let year = &caps[2];
    let letters = &caps[3];
    let letters = if letters.len() == 1 {
        letters.to_uppercase()
    } else {
        letters.to_lowercase()
    };
    format!("{prefix} {year}{letters}")
}

/// Candidate name from the folder holding `observation`.
#[must_use]
pub fn candidate_name_for(observation: &Path) -> Option<String> {
    let folder = observation.parent()?.file_name()?.to_str()?;
    let name = candidate_name(folder);
    (!name.is_empty()).then_some(name)
}

/// Lookup variants of `name` for the survey index: lowercase, then without
/// whitespace, then in registry form.
#[must_use]
pub fn lookup_variants(name: &str) -> Vec<String> {
    let lower = name.trim().to_lowercase();
    let compact: String = lower.split_whitespace().collect();
    let registry = candidate_name(&compact).to_lowercase();
    let mut variants = Vec::with_capacity(3);
    for variant in [lower, compact, registry] {
        if !variant.is_empty() && !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}
