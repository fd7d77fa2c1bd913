use serde::{Deserialize, Serialize};
use url::Url;

/// One search phrase to run, generated once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// The full phrase handed to the backend, including any `site:` scope.
    pub text: String,
    /// Human-facing name for logs and notifications (the phrase without
    /// its `site:` scope).
    pub label: String,
}

/// One raw hit from a search backend; scoped to one query's processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub title: String,
    pub link: Url,
    pub snippet: String,
}

/// A [`RawResult`] that survived block-word filtering, tagged with the
/// originating query's label for message formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub result: RawResult,
    pub query_label: String,
}
