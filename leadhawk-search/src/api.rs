//! Structured web-search API adapter.
//!
//! Thin client for a Brave-compatible web search endpoint: subscription
//! token in a header, query parameters for freshness and result count,
//! clean JSON back. Fast but rate-limited; the orchestrator owns pacing,
//! so HTTP-level retries are disabled here.

use crate::backend::{SearchBackend, SearchError};
use crate::types::{Query, RawResult};
use async_trait::async_trait;
use leadhawk_common::Recency;
use leadhawk_http::{Auth, HttpClient, RequestOpts};
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

// Provider-enforced ceiling per request.
const MAX_COUNT: u32 = 20;

#[derive(Clone)]
pub struct SearchApi {
    http: HttpClient,
    token: String,
}

impl SearchApi {
    pub fn new(endpoint: &str, token: String) -> anyhow::Result<Self> {
        let http = HttpClient::new(endpoint)?;
        Ok(Self { http, token })
    }

    async fn search_page(
        &self,
        query: &Query,
        recency: Recency,
        count: u32,
    ) -> Result<WebSearchResponse, SearchError> {
        let params: Vec<(&str, std::borrow::Cow<'_, str>)> = vec![
            ("q", query.text.clone().into()),
            ("count", count.to_string().into()),
            ("freshness", freshness_param(recency).into()),
            ("country", "TW".into()),
            ("safesearch", "moderate".into()),
        ];

        let token = HeaderValue::from_str(&self.token)
            .map_err(|e| SearchError::Unavailable(format!("invalid subscription token: {e}")))?;

        self.http
            .get_json(
                "res/v1/web/search",
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: HeaderName::from_static("x-subscription-token"),
                        value: token,
                    }),
                    query: Some(params),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| SearchError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for SearchApi {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn search(
        &self,
        query: &Query,
        recency: Recency,
        max_results: u32,
    ) -> Result<Vec<RawResult>, SearchError> {
        let count = max_results.clamp(1, MAX_COUNT);
        let started = std::time::Instant::now();
        tracing::debug!(query = %query.label, count, %recency, "search.api.start");

        let resp = self.search_page(query, recency, count).await?;
        let results = collect_results(resp, max_results as usize);

        tracing::info!(
            query = %query.label,
            hit_count = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search.api.done"
        );
        Ok(results)
    }
}

fn freshness_param(recency: Recency) -> &'static str {
    match recency {
        Recency::Day => "pd",
        Recency::Week => "pw",
        Recency::Month => "pm",
    }
}

fn collect_results(resp: WebSearchResponse, limit: usize) -> Vec<RawResult> {
    let mut out = Vec::new();
    let Some(web) = resp.web else {
        return out;
    };
    for hit in web.results {
        if out.len() >= limit {
            break;
        }
        // Hits without a parseable URL are useless downstream; skip them.
        let Ok(link) = Url::parse(&hit.url) else {
            tracing::debug!(url = %hit.url, "search.api.unparseable_url");
            continue;
        };
        out.push(RawResult {
            title: hit.title,
            link,
            snippet: hit.description,
        });
    }
    out
}

#[derive(Debug, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Debug, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}
