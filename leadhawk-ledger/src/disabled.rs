use crate::{DedupLedger, LedgerError};
use async_trait::async_trait;
use leadhawk_common::LeadRecord;

/// Ledger used when no store credentials are configured: every lead counts
/// as new and nothing is recorded.
pub struct DisabledLedger;

#[async_trait]
impl DedupLedger for DisabledLedger {
    async fn exists(&self, _identity: &str) -> Result<bool, LedgerError> {
        Ok(false)
    }

    async fn record(&self, lead: &LeadRecord) -> Result<(), LedgerError> {
        tracing::debug!(identity = %lead.identity, "ledger.disabled.skip_record");
        Ok(())
    }
}
