use crate::types::{Query, RawResult};
use async_trait::async_trait;
use leadhawk_common::Recency;
use thiserror::Error;

/// Failure of one search call.
///
/// A backend must fail with [`SearchError::Unavailable`] on rate limiting,
/// block pages, transport failure, or an unparseable response, never with a
/// silently empty list, so the orchestrator can tell "no matches" from
/// "could not search".
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search unavailable: {0}")]
    Unavailable(String),
}

/// One search provider.
///
/// `recency` and `max_results` are provider-side hints, not guarantees; the
/// caller must not assume exact compliance.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name for logs ("api", "browser", ...).
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        query: &Query,
        recency: Recency,
        max_results: u32,
    ) -> Result<Vec<RawResult>, SearchError>;
}
