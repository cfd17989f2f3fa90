//! Notification of pushed resources.
//!
//! One Slack message per run. The message carries a field per pushed
//! resource; an empty push list still produces a message with no fields.

pub mod slack;

pub use slack::SlackNotifier;

use crate::errors::NotificationError;
use crate::models::PushResult;

/// Delivers the end-of-run summary.
#[allow(async_fn_in_trait)]
pub trait SummaryNotifier {
    async fn send(&self, title: &str, fields: &[(String, String)]) -> Result<(), NotificationError>;
}

impl SummaryNotifier for SlackNotifier {
    async fn send(&self, title: &str, fields: &[(String, String)]) -> Result<(), NotificationError> {
        self.send_attachment(title, fields).await
    }
}

/// One `(title, value)` field per pushed resource: the resource slug and its
/// changed lines as a preformatted block.
pub fn summary_fields(results: &[PushResult]) -> Vec<(String, String)> {
    results
        .iter()
        .map(|r| (r.key.resource.clone(), format!("```{}```", r.changes)))
        .collect()
}
