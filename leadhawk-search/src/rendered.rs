//! Rendered-page search adapter.
//!
//! Drives a stealth browser session to the DuckDuckGo HTML results page and
//! extracts hits from the markup. Slower than the API adapter and far more
//! fragile: the session needs a plausible fingerprint and randomized pacing
//! or the engine serves a block page. Markup drift is expected: a page with
//! no recognizable result blocks is reported as unavailable, not as "no
//! matches".

use crate::backend::{SearchBackend, SearchError};
use crate::types::{Query, RawResult};
use async_trait::async_trait;
use leadhawk_common::{Recency, StealthLevel};
use leadhawk_drivers::driver::StealthDriver;
use scraper::{Html, Selector};
use url::Url;

const RESULTS_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
// Region code pinning results to Taiwan (traditional Chinese).
const REGION: &str = "tw-tzh";

pub struct RenderedPageSearch {
    webdriver_url: String,
    headless: bool,
    stealth: StealthLevel,
}

impl RenderedPageSearch {
    pub fn new(webdriver_url: String, headless: bool, stealth: StealthLevel) -> Self {
        Self {
            webdriver_url,
            headless,
            stealth,
        }
    }

    fn results_url(query: &Query, recency: Recency) -> Url {
        Url::parse_with_params(
            RESULTS_ENDPOINT,
            &[
                ("q", query.text.as_str()),
                ("df", recency_param(recency)),
                ("kl", REGION),
            ],
        )
        .expect("static endpoint with encoded params")
    }
}

#[async_trait]
impl SearchBackend for RenderedPageSearch {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn search(
        &self,
        query: &Query,
        recency: Recency,
        max_results: u32,
    ) -> Result<Vec<RawResult>, SearchError> {
        let url = Self::results_url(query, recency);
        tracing::debug!(query = %query.label, %url, "search.browser.start");

        // One session per search call: a fresh fingerprint each time, and a
        // hung page can't poison later queries.
        let mut driver = StealthDriver::connect(&self.webdriver_url, self.headless, self.stealth)
            .await
            .map_err(|e| SearchError::Unavailable(format!("webdriver session: {e}")))?;

        if let Err(e) = driver.goto(url.as_str()).await {
            let _ = driver.close().await;
            return Err(SearchError::Unavailable(format!("navigation: {e}")));
        }
        driver.dwell().await;

        let html = match driver.page_source().await {
            Ok(html) => html,
            Err(e) => {
                let _ = driver.close().await;
                return Err(SearchError::Unavailable(format!("page source: {e}")));
            }
        };
        let _ = driver.close().await;

        let mut results = parse_results_page(&html)?;
        results.truncate(max_results as usize);

        tracing::info!(
            query = %query.label,
            hit_count = results.len(),
            "search.browser.done"
        );
        Ok(results)
    }
}

fn recency_param(recency: Recency) -> &'static str {
    match recency {
        Recency::Day => "d",
        Recency::Week => "w",
        Recency::Month => "m",
    }
}

/// Extract hits from a results page.
///
/// Returns `Unavailable` when the page has neither result blocks nor the
/// explicit no-results marker: that shape means drift or a block page, and
/// must not be confused with a genuine empty result set.
fn parse_results_page(html: &str) -> Result<Vec<RawResult>, SearchError> {
    let doc = Html::parse_document(html);
    let result_sel = Selector::parse(".result").expect("static selector");
    let anchor_sel = Selector::parse("a.result__a").expect("static selector");
    let snippet_sel = Selector::parse(".result__snippet").expect("static selector");
    let no_results_sel = Selector::parse(".no-results").expect("static selector");

    let mut out = Vec::new();
    let mut saw_result_block = false;

    for block in doc.select(&result_sel) {
        saw_result_block = true;
        if block.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(anchor) = block.select(&anchor_sel).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_result_link(href) else {
            continue;
        };

        let title = collapse_whitespace(anchor.text());
        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(|s| collapse_whitespace(s.text()))
            .unwrap_or_default();

        out.push(RawResult {
            title,
            link,
            snippet,
        });
    }

    if !saw_result_block && doc.select(&no_results_sel).next().is_none() {
        return Err(SearchError::Unavailable(
            "no extractable results (markup drift or block page)".into(),
        ));
    }

    Ok(out)
}

/// Result anchors point at a `/l/?uddg=<target>` redirect; unwrap it so the
/// lead identity is the destination post, not the redirector.
fn resolve_result_link(href: &str) -> Option<Url> {
    let absolute = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    if url.domain() == Some("duckduckgo.com") && url.path().starts_with("/l/") {
        let target = url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())?;
        return Url::parse(&target).ok();
    }
    Some(url)
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r##"
<html><body><div id="links">
  <div class="result results_links web-result">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a"
         href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fthreads.net%2Fpost%2F123&amp;rut=abc123">中壢接睫毛心得</a>
    </h2>
    <a class="result__snippet" href="#">分享我的經驗，真的很滿意</a>
  </div>
  <div class="result result--ad">
    <a class="result__a" href="https://ads.example.com/x">贊助廣告</a>
  </div>
  <div class="result web-result">
    <h2 class="result__title">
      <a class="result__a" href="https://threads.net/post/456">桃園做臉推薦</a>
    </h2>
    <a class="result__snippet" href="#">有人推薦嗎？想找
      <b>做臉</b> 店家</a>
  </div>
</div></body></html>"##;

    #[test]
    fn parses_results_and_unwraps_redirect_links() {
        let results = parse_results_page(SAMPLE_PAGE).unwrap();
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].title, "中壢接睫毛心得");
        assert_eq!(results[0].link.as_str(), "https://threads.net/post/123");
        assert_eq!(results[0].snippet, "分享我的經驗，真的很滿意");

        // Direct links pass through; nested markup collapses to one line.
        assert_eq!(results[1].link.as_str(), "https://threads.net/post/456");
        assert_eq!(results[1].snippet, "有人推薦嗎？想找 做臉 店家");
    }

    #[test]
    fn ads_are_skipped() {
        let results = parse_results_page(SAMPLE_PAGE).unwrap();
        assert!(results.iter().all(|r| r.link.domain() != Some("ads.example.com")));
    }

    #[test]
    fn explicit_no_results_marker_is_a_genuine_empty_set() {
        let page = r#"<html><body>
            <div class="no-results">找不到相關結果</div>
        </body></html>"#;
        let results = parse_results_page(page).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn unrecognizable_markup_is_unavailable_not_empty() {
        let page = "<html><body><h1>Please verify you are human</h1></body></html>";
        let err = parse_results_page(page).unwrap_err();
        assert!(matches!(err, SearchError::Unavailable(_)));
    }

    #[test]
    fn redirect_link_without_target_is_dropped() {
        assert!(resolve_result_link("//duckduckgo.com/l/?rut=abc").is_none());
        assert_eq!(
            resolve_result_link("//duckduckgo.com/l/?uddg=https%3A%2F%2Fthreads.net%2Fp%2F9")
                .unwrap()
                .as_str(),
            "https://threads.net/p/9"
        );
    }

    #[test]
    fn results_url_carries_recency_and_region() {
        let q = Query {
            text: "中壢接睫毛 site:threads.net".into(),
            label: "中壢接睫毛".into(),
        };
        let url = RenderedPageSearch::results_url(&q, Recency::Day);
        let pairs: Vec<_> = url.query_pairs().collect();
        assert!(pairs.iter().any(|(k, v)| k == "df" && v == "d"));
        assert!(pairs.iter().any(|(k, v)| k == "kl" && v == "tw-tzh"));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "q" && v == "中壢接睫毛 site:threads.net"));
    }
}
