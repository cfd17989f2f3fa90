//! Slack webhook notification sender.
//!
//! Sends one attachment-style message to a Slack channel via an incoming
//! webhook URL.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::NotificationError;

/// Slack incoming-webhook notifier.
pub struct SlackNotifier {
    webhook_url: String,
    color: String,
    http: reqwest::Client,
}

impl SlackNotifier {
    /// Create a new Slack notifier targeting the given webhook URL.
    pub fn new(webhook_url: String, color: String, timeout: Duration) -> Result<Self, NotificationError> {
        info!("initializing Slack notifier");
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { webhook_url, color, http })
    }

    /// Send one attachment titled `title` with a field per `(title, value)`.
    pub async fn send_attachment(
        &self,
        title: &str,
        fields: &[(String, String)],
    ) -> Result<(), NotificationError> {
        debug!(fields = fields.len(), "sending Slack message");

        let payload = attachment_payload(title, &self.color, fields);

        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(NotificationError::HttpError)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned error");
            return Err(NotificationError::SlackError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        info!("Slack message sent successfully");
        Ok(())
    }
}

/// Build the webhook body: a single attachment holding every field.
pub fn attachment_payload(title: &str, color: &str, fields: &[(String, String)]) -> Value {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(title, value)| json!({ "title": title, "value": value, "short": false }))
        .collect();

    json!({
        "attachments": [{
            "color": color,
            "title": title,
            "fields": fields,
        }]
    })
}
