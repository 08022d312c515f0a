//! Cross-cutting error types for SNDB.
//!
//! [`CoreError`] is the item-level outcome taxonomy of the ingestion
//! engine. Adapter-specific errors (`CatalogError`, `ConfigError`) live in
//! their own crates and convert into this type at the engine boundary.
//!
//! No variant is fatal to a batch: `Parse` and `DataIntegrity` abort one
//! file, `NotFound` and `AmbiguousMatch` are terminal outcomes for one
//! object, and `Network` is downgraded to a catalog miss after retries.

use thiserror::Error;

/// Errors that can be raised by any SNDB crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Coordinate text could not be parsed.
    #[error("cannot parse coordinate '{text}': {reason}")]
    Parse { text: String, reason: String },

    /// No registry entry or catalog matched after the full priority chain.
    #[error("no catalog match for {query}")]
    NotFound { query: String },

    /// A non-interactive resolution reached several coordinate candidates.
    #[error("{candidates} coordinate candidates for {query}; none is an exact match")]
    AmbiguousMatch { query: String, candidates: usize },

    /// A catalog could not be reached.
    #[error("network error from {catalog}: {message}")]
    Network { catalog: String, message: String },

    /// A required field is absent or unparsable.
    #[error("data integrity error in {context}: {reason}")]
    DataIntegrity { context: String, reason: String },
}

impl CoreError {
    pub fn parse(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            text: text.into(),
            reason: reason.into(),
        }
    }

    pub fn data_integrity(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Stable short name of the error kind, used in logs and reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::NotFound { .. } => "not_found",
            Self::AmbiguousMatch { .. } => "ambiguous_match",
            Self::Network { .. } => "network",
            Self::DataIntegrity { .. } => "data_integrity",
        }
    }
}
