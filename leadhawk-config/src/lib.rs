//! Loader for the Leadhawk configuration with YAML + environment overlays.
//!
//! A run is configured from a single `leadhawk.yaml` merged with
//! `LEADHAWK_`-prefixed environment variables (`__` separates nesting
//! levels). String values may reference `${VAR}` placeholders, which are
//! expanded recursively with a depth cap so secrets can stay in the
//! environment while the file stays committable.
use config::{Config, ConfigError, Environment, File};
use leadhawk_common::{Recency, StealthLevel};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Top-level runtime configuration for one scan run.
#[derive(Debug, Deserialize)]
pub struct LeadhawkConfig {
    pub version: Option<String>,
    pub watch: WatchConfig,
    pub search: SearchSpec,
    #[serde(default)]
    pub recency: Recency,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Absent → notifications are logged, not sent.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    /// Absent → dedup is disabled and every lead counts as new.
    #[serde(default)]
    pub ledger: Option<LedgerConfig>,
}

/// What to watch: the query cross-product inputs and the noise filter.
#[derive(Debug, Deserialize)]
pub struct WatchConfig {
    pub locations: Vec<String>,
    pub services: Vec<String>,
    /// High-intent literal phrases appended after the cross-product.
    #[serde(default)]
    pub extra: Vec<String>,
    /// Target domain every query is scoped to (`site:` filter).
    pub site: String,
    #[serde(default)]
    pub block_words: Vec<String>,
}

/// The tag is `kind`; the payload is the backend-specific config.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchSpec {
    /// Structured web-search API (subscription token auth).
    Api {
        token: String,
        #[serde(default = "default_api_endpoint")]
        endpoint: String,
    },
    /// Rendered-page search through a WebDriver session.
    Browser {
        #[serde(default = "default_webdriver_url")]
        webdriver_url: String,
        #[serde(default = "default_headless")]
        headless: bool,
        #[serde(default)]
        stealth: StealthLevel,
    },
}

/// Pauses between pipeline steps: 2s between queries, 1s between
/// notifications, 5s after a failed search.
#[derive(Debug, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_query_pause_ms")]
    pub between_queries_ms: u64,
    #[serde(default = "default_notify_pause_ms")]
    pub between_notifications_ms: u64,
    #[serde(default = "default_failure_backoff_ms")]
    pub failure_backoff_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_queries_ms: default_query_pause_ms(),
            between_notifications_ms: default_notify_pause_ms(),
            failure_backoff_ms: default_failure_backoff_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    pub token: String,
    /// "owner/name" of the repository holding the ledger issues.
    pub repo: String,
    #[serde(default = "default_ledger_label")]
    pub label: String,
}

fn default_max_results() -> u32 {
    5
}
fn default_api_endpoint() -> String {
    "https://api.search.brave.com".into()
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_headless() -> bool {
    true
}
fn default_query_pause_ms() -> u64 {
    2000
}
fn default_notify_pause_ms() -> u64 {
    1000
}
fn default_failure_backoff_ms() -> u64 {
    5000
}
fn default_ledger_label() -> String {
    "leadhawk-lead".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct LeadhawkConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for LeadhawkConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadhawkConfigLoader {
    /// Start with sensible defaults: `LEADHAWK_` env overrides are always on.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("LEADHAWK").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use leadhawk_config::{LeadhawkConfigLoader, SearchSpec};
    ///
    /// let cfg = LeadhawkConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// watch:
    ///   locations: ["中壢"]
    ///   services: ["接睫毛"]
    ///   site: "threads.net"
    /// search:
    ///   kind: browser
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.watch.locations, ["中壢"]);
    /// assert!(matches!(cfg.search, SearchSpec::Browser { .. }));
    /// assert_eq!(cfg.max_results, 5);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// Sources are merged, `${VAR}` placeholders expanded, and the result
    /// materialised into [`LeadhawkConfig`].
    pub fn load(self) -> Result<LeadhawkConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Go through serde_json::Value so env expansion can walk every string.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: LeadhawkConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
