use crate::{Notifier, NotifyError};
use async_trait::async_trait;
use leadhawk_common::{preview, LeadRecord};

/// Notifier used when no delivery channel is configured (or in dry runs):
/// leads land in the log and nowhere else.
pub struct LogOnlyNotifier;

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
        tracing::info!(
            identity = %lead.identity,
            query = %lead.query_label,
            summary = %preview(&lead.summary, 100),
            "notify.log_only"
        );
        Ok(())
    }
}
