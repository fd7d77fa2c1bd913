//! Leadhawk binary: load config, wire the pipeline, run one scan pass.
//!
//! One invocation is one pass over every configured query; scheduling
//! repeated passes is the job of cron or a systemd timer. The process exits
//! zero whenever a pass runs to completion, even if individual queries
//! failed along the way; only startup problems (unreadable config, missing
//! credentials for the chosen backend) are fatal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use leadhawk_common::observability::{init_logging, LogConfig};
use leadhawk_config::{LeadhawkConfig, LeadhawkConfigLoader, SearchSpec};
use leadhawk_ledger::{DedupLedger, DisabledLedger, GithubIssueLedger};
use leadhawk_notify::{LogOnlyNotifier, Notifier, TelegramNotifier};
use leadhawk_scan::{PacingPolicy, ScanOrchestrator};
use leadhawk_search::api::SearchApi;
use leadhawk_search::keywords;
use leadhawk_search::rendered::RenderedPageSearch;
use leadhawk_search::SearchBackend;

#[derive(Parser)]
#[command(name = "leadhawk", version, about = "Scan for fresh service leads and alert on new ones")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "leadhawk.yaml")]
    config: PathBuf,

    /// Log what would be notified without sending anything or touching the
    /// ledger.
    #[arg(long)]
    dry_run: bool,
}

fn build_backend(cfg: &LeadhawkConfig) -> anyhow::Result<Arc<dyn SearchBackend>> {
    Ok(match &cfg.search {
        SearchSpec::Api { token, endpoint } => {
            anyhow::ensure!(
                !token.is_empty(),
                "search.token is required for the api backend"
            );
            Arc::new(SearchApi::new(endpoint, token.clone())?)
        }
        SearchSpec::Browser {
            webdriver_url,
            headless,
            stealth,
        } => Arc::new(RenderedPageSearch::new(
            webdriver_url.clone(),
            *headless,
            *stealth,
        )),
    })
}

fn build_notifier(cfg: &LeadhawkConfig, dry_run: bool) -> anyhow::Result<Arc<dyn Notifier>> {
    if dry_run {
        tracing::info!("dry run: leads will be logged, not sent");
        return Ok(Arc::new(LogOnlyNotifier));
    }
    Ok(match &cfg.telegram {
        Some(tg) => Arc::new(TelegramNotifier::new(
            tg.bot_token.clone(),
            tg.chat_id.clone(),
        )?),
        None => {
            tracing::warn!("no telegram section in config; leads will be logged, not sent");
            Arc::new(LogOnlyNotifier)
        }
    })
}

fn build_ledger(cfg: &LeadhawkConfig, dry_run: bool) -> anyhow::Result<Arc<dyn DedupLedger>> {
    if dry_run {
        return Ok(Arc::new(DisabledLedger));
    }
    Ok(match &cfg.ledger {
        Some(ledger) => Arc::new(GithubIssueLedger::new(
            ledger.token.clone(),
            ledger.repo.clone(),
            ledger.label.clone(),
        )?),
        None => {
            tracing::warn!("no ledger section in config; every lead will count as new");
            Arc::new(DisabledLedger)
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig {
        app_name: "leadhawk",
        emit_stderr: true,
        ..Default::default()
    })?;

    let cfg = LeadhawkConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    let queries = keywords::generate(
        &cfg.watch.locations,
        &cfg.watch.services,
        &cfg.watch.extra,
        &cfg.watch.site,
    );
    anyhow::ensure!(
        !queries.is_empty(),
        "watch config produced no queries (locations × services is empty and no extra phrases)"
    );

    let backend = build_backend(&cfg)?;
    let notifier = build_notifier(&cfg, cli.dry_run)?;
    let ledger = build_ledger(&cfg, cli.dry_run)?;

    tracing::info!(
        backend = backend.name(),
        queries = queries.len(),
        site = %cfg.watch.site,
        dry_run = cli.dry_run,
        log = %log_path.display(),
        "run.start"
    );

    let pacing = PacingPolicy {
        between_queries: Duration::from_millis(cfg.pacing.between_queries_ms),
        between_notifications: Duration::from_millis(cfg.pacing.between_notifications_ms),
        failure_backoff: Duration::from_millis(cfg.pacing.failure_backoff_ms),
    };

    let orchestrator = ScanOrchestrator::new(
        backend,
        ledger,
        notifier,
        cfg.recency,
        cfg.max_results,
        cfg.watch.block_words.clone(),
        pacing,
    );

    let stats = orchestrator.run(&queries).await;

    tracing::info!(scanned = stats.scanned, new = stats.new, "run.summary");
    println!("scanned {} results, {} new leads", stats.scanned, stats.new);
    Ok(())
}
