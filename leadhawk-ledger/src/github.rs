//! GitHub-issue-backed ledger.
//!
//! One labeled issue per notified lead, the identity embedded in the issue
//! title. `exists` goes through the issue-search API scoped to the repo and
//! label; because that API tokenizes URLs rather than matching them
//! literally, the returned titles are re-checked with a plain substring
//! test, which is the authoritative answer.

use crate::{DedupLedger, LedgerError};
use async_trait::async_trait;
use leadhawk_common::LeadRecord;
use leadhawk_http::{Auth, HttpClient, RequestOpts};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::json;

pub struct GithubIssueLedger {
    http: HttpClient,
    token: String,
    repo: String,
    label: String,
}

impl GithubIssueLedger {
    pub fn new(token: String, repo: String, label: String) -> anyhow::Result<Self> {
        let http = HttpClient::new("https://api.github.com")?;
        Ok(Self {
            http,
            token,
            repo,
            label,
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        // The GitHub API rejects requests without a User-Agent.
        headers.insert(USER_AGENT, HeaderValue::from_static("leadhawk"));
        headers
    }
}

/// Search expression scoping the existence check to this ledger's
/// repo + label namespace and to issue titles.
fn search_query(repo: &str, label: &str, identity: &str) -> String {
    format!("repo:{repo} label:{label} in:title \"{identity}\"")
}

/// Issue title for a recorded lead. `exists` matches by substring, so the
/// identity must appear verbatim.
fn issue_title(identity: &str) -> String {
    format!("[lead] {identity}")
}

fn issue_body(lead: &LeadRecord) -> String {
    format!(
        "**Query:** {}\n\n{}\n\n{}",
        lead.query_label, lead.summary, lead.identity
    )
}

#[derive(Debug, Deserialize)]
struct IssueSearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<IssueHit>,
}

#[derive(Debug, Deserialize)]
struct IssueHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
}

#[async_trait]
impl DedupLedger for GithubIssueLedger {
    async fn exists(&self, identity: &str) -> Result<bool, LedgerError> {
        let q = search_query(&self.repo, &self.label, identity);
        let resp: IssueSearchResponse = self
            .http
            .get_json(
                "search/issues",
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.token)),
                    headers: Some(Self::default_headers()),
                    query: Some(vec![("q", q.into()), ("per_page", "20".into())]),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let seen = resp.items.iter().any(|i| i.title.contains(identity));
        tracing::debug!(
            identity,
            total_count = resp.total_count,
            seen,
            "ledger.exists"
        );
        Ok(seen)
    }

    async fn record(&self, lead: &LeadRecord) -> Result<(), LedgerError> {
        let payload = json!({
            "title": issue_title(&lead.identity),
            "body": issue_body(lead),
            "labels": [self.label],
        });

        let created: CreatedIssue = self
            .http
            .post_json(
                &format!("repos/{}/issues", self.repo),
                &payload,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.token)),
                    headers: Some(Self::default_headers()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        tracing::info!(
            identity = %lead.identity,
            issue = created.number,
            "ledger.recorded"
        );
        Ok(())
    }
}
