//! The idempotency layer: "have we notified this lead before?"
//!
//! The ledger is an external, queryable, human-auditable store: one
//! tracked item per notified lead, keyed by the lead identity, append-only.
//! Keeping it external is the whole point: this system has no persistent
//! process or disk between runs, so every notification decision must be
//! answerable from the store alone, and an operator can audit it after the
//! fact.

use async_trait::async_trait;
use leadhawk_common::LeadRecord;
use thiserror::Error;

pub mod disabled;
pub mod github;

pub use disabled::DisabledLedger;
pub use github::GithubIssueLedger;

/// Failure to reach the ledger store.
///
/// Distinct from a definitive "not found": callers must choose a policy for
/// unavailability. The scan orchestrator treats it as "assume unseen",
/// favouring a possible duplicate notification over silently dropping a
/// lead.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Existence check plus durable append for lead identities.
#[async_trait]
pub trait DedupLedger: Send + Sync {
    /// Has any prior entry been created for this identity, on any run?
    async fn exists(&self, identity: &str) -> Result<bool, LedgerError>;

    /// Durably create an entry for `lead.identity`.
    ///
    /// Safe to call even if an entry already exists by the time of the
    /// call: overlapping runs race between `exists` and `record` without
    /// mutual exclusion, and a duplicate append-only entry is accepted.
    async fn record(&self, lead: &LeadRecord) -> Result<(), LedgerError>;
}
