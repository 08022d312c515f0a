//! Catalog error types.

use sndb_core::{CatalogSource, CoreError};
use thiserror::Error;

/// Errors that can occur when querying a catalog or the local registry.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the catalog.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The catalog returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Failed to parse a catalog response.
    #[error("parse error: {0}")]
    Parse(String),

    /// A registry insert collided with an existing name.
    #[error("registry already holds an object named '{name}'")]
    Conflict { name: String },

    /// The registry store failed.
    #[error("registry store error: {0}")]
    Store(String),
}

impl CatalogError {
    /// Whether retrying the same call may succeed.
    ///
    /// Timeouts, connection failures, rate limiting, and 5xx responses are
    /// transient. Parse failures, 4xx responses, and registry errors are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Api { status, .. } => *status >= 500,
            Self::RateLimited { .. } => true,
            Self::Parse(_) | Self::Conflict { .. } | Self::Store(_) => false,
        }
    }

    /// Map into the engine-level taxonomy.
    #[must_use]
    pub fn into_core(self, catalog: CatalogSource) -> CoreError {
        match self {
            Self::Conflict { name } => {
                CoreError::data_integrity(catalog.as_str(), format!("duplicate object name '{name}'"))
            }
            Self::Store(reason) => CoreError::data_integrity(catalog.as_str(), reason),
            other => CoreError::Network {
                catalog: catalog.as_str().to_string(),
                message: other.to_string(),
            },
        }
    }
}
