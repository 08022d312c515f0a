//! Strategies for choosing among coordinate candidates.

use async_trait::async_trait;
use sndb_catalog::CoordinateMatch;

/// Picks one of `candidates` (ascending by offset), or declines with `None`.
#[async_trait]
pub trait Disambiguation: Send + Sync {
    async fn choose(&self, candidates: &[CoordinateMatch]) -> Option<usize>;
}

/// Declines every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

#[async_trait]
impl Disambiguation for NonInteractive {
    async fn choose(&self, _candidates: &[CoordinateMatch]) -> Option<usize> {
        None
    }
}

/// Accepts the first candidate.
///
/// Useful for unattended imports where the nearest candidate is trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptNearest;

#[async_trait]
impl Disambiguation for AcceptNearest {
    async fn choose(&self, candidates: &[CoordinateMatch]) -> Option<usize> {
        (!candidates.is_empty()).then_some(0)
    }
}
