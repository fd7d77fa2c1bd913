//! Types and utilities shared across Leadhawk crates.
//!
//! This crate defines the small domain vocabulary the pipeline crates pass
//! between each other, plus the centralised tracing setup. It stays
//! lightweight so that every crate can depend on it without heavy
//! transitive costs.
//!
//! # Overview
//!
//! - [`LeadRecord`]: the durable unit handed to the ledger and the notifier
//! - [`RunStats`]: per-run counters reported at the end of a scan
//! - [`Recency`]: the maximum content age a search call should return
//! - [`observability`]: centralised tracing/logging initialisation
use serde::{Deserialize, Serialize};

pub mod observability;

/// Maximum age of content a search backend should return.
///
/// Providers treat this as a hint, not a guarantee; callers must tolerate
/// slightly older results slipping through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    #[default]
    Day,
    Week,
    Month,
}

impl std::fmt::Display for Recency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recency::Day => f.write_str("day"),
            Recency::Week => f.write_str("week"),
            Recency::Month => f.write_str("month"),
        }
    }
}

/// How aggressively the rendered-page backend masks its automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// A confirmed-new lead, ready to be notified and recorded.
///
/// `identity` is the sole dedup key: two search hits with the same link are
/// the same lead regardless of title or snippet drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Canonical dedup key (the result link as a string).
    pub identity: String,
    /// Human-readable summary, usually the result snippet.
    pub summary: String,
    /// Label of the query that surfaced this lead.
    pub query_label: String,
}

/// Counters scoped to a single scan run; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Raw results examined across all queries, before filtering.
    pub scanned: u64,
    /// First-seen leads successfully delivered to the notifier.
    pub new: u64,
}

/// Character-boundary-safe preview of user text for messages and logs.
///
/// Appends an ellipsis when the input was longer than `max_chars`.
///
/// ```
/// assert_eq!(leadhawk_common::preview("中壢接睫毛", 3), "中壢接…");
/// assert_eq!(leadhawk_common::preview("short", 10), "short");
/// ```
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
