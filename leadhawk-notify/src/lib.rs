//! Operator notification for confirmed-new leads.
//!
//! One delivery attempt per lead per run: a failed send is reported as
//! [`NotifyError`] and logged, never retried and never fatal to the scan.

use async_trait::async_trait;
use leadhawk_common::LeadRecord;
use thiserror::Error;

pub mod log_only;
pub mod telegram;

pub use log_only::LogOnlyNotifier;
pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message never reached the channel (network, timeout).
    #[error("notification transport failed: {0}")]
    Transport(String),
    /// The channel refused the message (bad chat id, malformed markup).
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Formats and dispatches a human-readable alert for one lead.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError>;
}
