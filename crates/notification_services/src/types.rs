use serde::Serialize;

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The webhook answered with a non-success status.
    #[error("Webhook rejected message: {0}")]
    Webhook(String),

    /// Transport failure or timeout talking to the webhook.
    #[error("Network error: {0}")]
    Network(String),

    /// The configured webhook URL is unusable.
    #[error("Invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),
}

/// JSON body accepted by chat webhooks (Discord-compatible).
#[derive(Debug, Serialize)]
pub struct WebhookMessage<'a> {
    /// Plain text (markdown allowed) message content.
    pub content: &'a str,
}
