use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::types::*;

/// Header line placed above the list of dates in every alert.
pub const DEFAULT_MESSAGE_HEADER: &str = "**Brooks Permit Available**";

/// Delivery channel for newly available permit dates.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one alert listing `dates` in the order given.
    async fn notify_new_dates(&self, dates: &[String]) -> Result<(), NotificationError>;
}

/// Builds the alert text: the header, then one date per line.
pub fn format_availability_message(header: &str, dates: &[String]) -> String {
    let mut lines = Vec::with_capacity(dates.len() + 1);
    lines.push(header);
    lines.extend(dates.iter().map(String::as_str));
    lines.join("\n")
}

/// Posts alerts to a chat webhook as `{"content": ...}`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    webhook_url: Url,
}

impl WebhookNotifier {
    /// Creates a notifier for `webhook_url` with the given request timeout.
    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let webhook_url = Url::parse(webhook_url)
            .map_err(|e| NotificationError::InvalidWebhookUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                NotificationError::Network(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            webhook_url,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_new_dates(&self, dates: &[String]) -> Result<(), NotificationError> {
        let content = format_availability_message(DEFAULT_MESSAGE_HEADER, dates);

        log::info!("📣 Sending availability alert for {} date(s)", dates.len());

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&WebhookMessage { content: &content })
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Webhook request failed: {}", e);
                NotificationError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Webhook returned {}: {}", status, body);
            return Err(NotificationError::Webhook(format!("HTTP {} - {}", status, body)));
        }

        log::info!("✅ Availability alert delivered");
        Ok(())
    }
}
