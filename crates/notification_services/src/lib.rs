//! # Notification Services
//!
//! This crate delivers availability alerts. It defines the `Notifier` seam used
//! by the scanner and a webhook implementation that posts chat messages.

/// Notifier trait and the webhook delivery service.
pub mod service;
/// Types and errors used by notification services.
pub mod types;

pub use service::{DEFAULT_MESSAGE_HEADER, Notifier, WebhookNotifier, format_availability_message};
pub use types::{NotificationError, WebhookMessage};
