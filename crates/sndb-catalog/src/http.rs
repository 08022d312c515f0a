//! HTTP plumbing shared by the catalog clients: one client builder and one
//! status check, so 429 and error bodies are mapped the same way everywhere.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::CatalogError;

/// Wait assumed when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Build the HTTP client shared by all catalog adapters.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, CatalogError> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Pass successful responses through; map 429 to
/// [`CatalogError::RateLimited`] and any other failure status to
/// [`CatalogError::Api`] carrying the body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CatalogError::RateLimited {
            retry_after_secs: retry_after_secs(resp.headers()),
        });
    }
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(CatalogError::Api {
        status: status.as_u16(),
        message,
    })
}

/// GET `url` and return the body text after status checks.
pub async fn get_text(http: &reqwest::Client, url: &str) -> Result<String, CatalogError> {
    tracing::debug!(url, "catalog request");
    let resp = check_response(http.get(url).send().await?).await?;
    Ok(resp.text().await?)
}

/// `Retry-After` in whole seconds. HTTP-date values are not supported.
fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|secs| secs.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
