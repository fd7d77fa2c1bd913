//! The scan pass: run every query once, in order, and push each surviving
//! result through filter → dedup → notify → record.
//!
//! The loop is sequential. Queries hit the same backend and the same
//! ledger; fanning them out would trade rate-limit headroom for speed the
//! once-in-a-while cadence doesn't need. A pass that reaches the end is
//! a success even if individual queries failed along the way; per-query
//! failures are logged and skipped, never escalated.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use leadhawk_common::{LeadRecord, Recency, RunStats};
use leadhawk_ledger::DedupLedger;
use leadhawk_notify::Notifier;
use leadhawk_search::filter::apply_block_words;
use leadhawk_search::{Query, SearchBackend, SearchError};
use url::Url;

/// Pauses between pipeline steps, kept injectable so tests run unpaced.
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    /// After finishing one query, before starting the next.
    pub between_queries: Duration,
    /// After each notification attempt, before the next candidate.
    pub between_notifications: Duration,
    /// After a failed search, before moving on.
    pub failure_backoff: Duration,
}

impl PacingPolicy {
    pub const fn none() -> Self {
        Self {
            between_queries: Duration::ZERO,
            between_notifications: Duration::ZERO,
            failure_backoff: Duration::ZERO,
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            between_queries: Duration::from_millis(2000),
            between_notifications: Duration::from_millis(1000),
            failure_backoff: Duration::from_millis(5000),
        }
    }
}

/// The dedup key for a result is its link, byte for byte.
///
/// No normalization: the same post reached through different tracking
/// parameters counts as distinct leads. Accepted as a rare duplicate
/// notification rather than risking a lossy canonicalization.
pub fn lead_identity(link: &Url) -> String {
    link.as_str().to_owned()
}

pub struct ScanOrchestrator {
    backend: Arc<dyn SearchBackend>,
    ledger: Arc<dyn DedupLedger>,
    notifier: Arc<dyn Notifier>,
    recency: Recency,
    max_results: u32,
    block_words: Vec<String>,
    pacing: PacingPolicy,
}

impl ScanOrchestrator {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        ledger: Arc<dyn DedupLedger>,
        notifier: Arc<dyn Notifier>,
        recency: Recency,
        max_results: u32,
        block_words: Vec<String>,
        pacing: PacingPolicy,
    ) -> Self {
        Self {
            backend,
            ledger,
            notifier,
            recency,
            max_results,
            block_words,
            pacing,
        }
    }

    /// Run one full pass over `queries` and report what it saw.
    ///
    /// `scanned` counts raw results before filtering; `new` counts leads
    /// actually delivered to the notifier.
    pub async fn run(&self, queries: &[Query]) -> RunStats {
        let mut stats = RunStats::default();
        // Links already handled this pass; adjacent queries overlap a lot.
        let mut seen_this_run: HashSet<String> = HashSet::new();

        tracing::info!(
            backend = self.backend.name(),
            queries = queries.len(),
            "scan.start"
        );

        for query in queries {
            let results = match self
                .backend
                .search(query, self.recency, self.max_results)
                .await
            {
                Ok(results) => results,
                Err(SearchError::Unavailable(reason)) => {
                    tracing::warn!(query = %query.label, %reason, "scan.query.unavailable");
                    pause(self.pacing.failure_backoff).await;
                    continue;
                }
            };

            stats.scanned += results.len() as u64;
            tracing::debug!(query = %query.label, results = results.len(), "scan.query.done");

            let candidates = apply_block_words(results, query, &self.block_words);
            for candidate in candidates {
                let identity = lead_identity(&candidate.result.link);
                if !seen_this_run.insert(identity.clone()) {
                    tracing::debug!(%identity, "scan.duplicate_in_run");
                    continue;
                }

                let already_known = match self.ledger.exists(&identity).await {
                    Ok(known) => known,
                    Err(err) => {
                        // Assume unseen: a duplicate alert beats a lost lead.
                        tracing::warn!(%identity, error = %err, "scan.ledger.unavailable");
                        false
                    }
                };
                if already_known {
                    tracing::debug!(%identity, "scan.already_known");
                    continue;
                }

                let summary = if candidate.result.snippet.is_empty() {
                    candidate.result.title.clone()
                } else {
                    candidate.result.snippet.clone()
                };
                let lead = LeadRecord {
                    identity: identity.clone(),
                    summary,
                    query_label: candidate.query_label.clone(),
                };

                let notified = match self.notifier.notify(&lead).await {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(%identity, error = %err, "scan.notify.failed");
                        false
                    }
                };

                // Recorded even when the notification failed, so the lead is
                // never re-alerted on the next run.
                if let Err(err) = self.ledger.record(&lead).await {
                    tracing::warn!(%identity, error = %err, "scan.record.failed");
                }

                if notified {
                    stats.new += 1;
                }
                pause(self.pacing.between_notifications).await;
            }

            pause(self.pacing.between_queries).await;
        }

        tracing::info!(scanned = stats.scanned, new = stats.new, "scan.complete");
        stats
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use leadhawk_ledger::LedgerError;
    use leadhawk_notify::NotifyError;
    use leadhawk_search::RawResult;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn query(text: &str) -> Query {
        Query {
            text: format!("{text} site:threads.net"),
            label: text.to_string(),
        }
    }

    fn result(link: &str, title: &str, snippet: &str) -> RawResult {
        RawResult {
            title: title.into(),
            link: Url::parse(link).unwrap(),
            snippet: snippet.into(),
        }
    }

    #[derive(Default)]
    struct ScriptedBackend {
        responses: HashMap<String, Vec<RawResult>>,
        failing: HashSet<String>,
    }

    impl ScriptedBackend {
        fn with(mut self, label: &str, results: Vec<RawResult>) -> Self {
            self.responses.insert(label.to_string(), results);
            self
        }

        fn failing_on(mut self, label: &str) -> Self {
            self.failing.insert(label.to_string());
            self
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn search(
            &self,
            query: &Query,
            _recency: Recency,
            _max_results: u32,
        ) -> Result<Vec<RawResult>, SearchError> {
            if self.failing.contains(&query.label) {
                return Err(SearchError::Unavailable("scripted outage".into()));
            }
            Ok(self.responses.get(&query.label).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MemoryLedger {
        entries: Mutex<HashSet<String>>,
        recorded: Mutex<Vec<LeadRecord>>,
        exists_calls: AtomicUsize,
        exists_unavailable: bool,
        record_unavailable: bool,
    }

    #[async_trait]
    impl DedupLedger for MemoryLedger {
        async fn exists(&self, identity: &str) -> Result<bool, LedgerError> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            if self.exists_unavailable {
                return Err(LedgerError::Unavailable("scripted outage".into()));
            }
            Ok(self.entries.lock().unwrap().contains(identity))
        }

        async fn record(&self, lead: &LeadRecord) -> Result<(), LedgerError> {
            if self.record_unavailable {
                return Err(LedgerError::Unavailable("scripted outage".into()));
            }
            self.entries.lock().unwrap().insert(lead.identity.clone());
            self.recorded.lock().unwrap().push(lead.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<LeadRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("scripted outage".into()));
            }
            self.sent.lock().unwrap().push(lead.clone());
            Ok(())
        }
    }

    fn orchestrator(
        backend: Arc<ScriptedBackend>,
        ledger: Arc<MemoryLedger>,
        notifier: Arc<RecordingNotifier>,
        block_words: &[&str],
    ) -> ScanOrchestrator {
        ScanOrchestrator::new(
            backend,
            ledger,
            notifier,
            Recency::Day,
            5,
            block_words.iter().map(|s| s.to_string()).collect(),
            PacingPolicy::none(),
        )
    }

    #[tokio::test]
    async fn first_sighting_notifies_and_records() {
        let backend = Arc::new(ScriptedBackend::default().with(
            "中壢接睫毛",
            vec![result(
                "https://threads.net/post/1",
                "中壢接睫毛心得",
                "好想找人做",
            )],
        ));
        let ledger = Arc::new(MemoryLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = orchestrator(backend, ledger.clone(), notifier.clone(), &[])
            .run(&[query("中壢接睫毛")])
            .await;

        assert_eq!(stats, RunStats { scanned: 1, new: 1 });
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].identity, "https://threads.net/post/1");
        assert_eq!(sent[0].query_label, "中壢接睫毛");
        assert!(
            ledger
                .entries
                .lock()
                .unwrap()
                .contains("https://threads.net/post/1")
        );
    }

    #[tokio::test]
    async fn second_run_is_quiet() {
        let backend = Arc::new(ScriptedBackend::default().with(
            "中壢接睫毛",
            vec![result(
                "https://threads.net/post/1",
                "中壢接睫毛心得",
                "好想找人做",
            )],
        ));
        let ledger = Arc::new(MemoryLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let queries = [query("中壢接睫毛")];

        let orch = orchestrator(backend, ledger, notifier.clone(), &[]);
        let first = orch.run(&queries).await;
        let second = orch.run(&queries).await;

        assert_eq!(first, RunStats { scanned: 1, new: 1 });
        assert_eq!(second, RunStats { scanned: 1, new: 0 });
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blocked_results_never_reach_ledger_or_notifier() {
        let backend = Arc::new(ScriptedBackend::default().with(
            "中壢接睫毛",
            vec![result(
                "https://threads.net/post/1",
                "中壢接睫毛",
                "分享我的經驗",
            )],
        ));
        let ledger = Arc::new(MemoryLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = orchestrator(backend, ledger.clone(), notifier.clone(), &["分享"])
            .run(&[query("中壢接睫毛")])
            .await;

        assert_eq!(stats, RunStats { scanned: 1, new: 0 });
        assert_eq!(ledger.exists_calls.load(Ordering::SeqCst), 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_failure_does_not_stop_later_queries() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with(
                    "中壢接睫毛",
                    vec![result("https://threads.net/post/1", "a", "b")],
                )
                .failing_on("中壢霧眉")
                .with(
                    "中壢美甲",
                    vec![result("https://threads.net/post/2", "c", "d")],
                ),
        );
        let ledger = Arc::new(MemoryLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = orchestrator(backend, ledger, notifier.clone(), &[])
            .run(&[query("中壢接睫毛"), query("中壢霧眉"), query("中壢美甲")])
            .await;

        assert_eq!(stats, RunStats { scanned: 2, new: 2 });
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ledger_outage_is_treated_as_unseen() {
        let backend = Arc::new(ScriptedBackend::default().with(
            "中壢接睫毛",
            vec![result("https://threads.net/post/1", "a", "b")],
        ));
        let ledger = Arc::new(MemoryLedger {
            exists_unavailable: true,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = orchestrator(backend, ledger, notifier.clone(), &[])
            .run(&[query("中壢接睫毛")])
            .await;

        assert_eq!(stats, RunStats { scanned: 1, new: 1 });
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notify_failure_still_records_the_lead() {
        let backend = Arc::new(ScriptedBackend::default().with(
            "中壢接睫毛",
            vec![result("https://threads.net/post/1", "a", "b")],
        ));
        let ledger = Arc::new(MemoryLedger::default());
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });

        let stats = orchestrator(backend, ledger.clone(), notifier, &[])
            .run(&[query("中壢接睫毛")])
            .await;

        assert_eq!(stats, RunStats { scanned: 1, new: 0 });
        assert!(
            ledger
                .entries
                .lock()
                .unwrap()
                .contains("https://threads.net/post/1")
        );
    }

    #[tokio::test]
    async fn same_link_across_queries_notifies_once() {
        let shared = result("https://threads.net/post/1", "中壢接睫毛心得", "好想找人做");
        let backend = Arc::new(
            ScriptedBackend::default()
                .with("中壢接睫毛", vec![shared.clone()])
                .with("中壢美睫", vec![shared]),
        );
        let ledger = Arc::new(MemoryLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = orchestrator(backend, ledger, notifier.clone(), &[])
            .run(&[query("中壢接睫毛"), query("中壢美睫")])
            .await;

        assert_eq!(stats, RunStats { scanned: 2, new: 1 });
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_failure_is_not_fatal() {
        let backend = Arc::new(ScriptedBackend::default().with(
            "中壢接睫毛",
            vec![result("https://threads.net/post/1", "a", "b")],
        ));
        let ledger = Arc::new(MemoryLedger {
            record_unavailable: true,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let stats = orchestrator(backend, ledger, notifier, &[])
            .run(&[query("中壢接睫毛")])
            .await;

        assert_eq!(stats, RunStats { scanned: 1, new: 1 });
    }

    #[test]
    fn identity_is_the_exact_link_string() {
        let with_params = Url::parse("https://threads.net/post/1?utm_source=share").unwrap();
        let bare = Url::parse("https://threads.net/post/1").unwrap();
        assert_ne!(lead_identity(&with_params), lead_identity(&bare));
        assert_eq!(
            lead_identity(&with_params),
            "https://threads.net/post/1?utm_source=share"
        );
    }
}
