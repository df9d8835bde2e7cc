//! Notification delivery capability.
//!
//! The dispatcher talks to a [`Notifier`] trait; the production
//! implementation posts to the Telegram Bot API over HTTPS. Delivery
//! failures are reported to the caller per recipient and never abort the
//! remaining recipients.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Base URL of the Telegram Bot API.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Per-request delivery timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Capability to deliver formatted text to a recipient.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Deliver `text` to a single recipient identifier.
    async fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API notifier.
///
/// Messages are sent with HTML parse mode so the spot fields render with
/// their bold markup.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    token: String,
    client: Client,
}

impl TelegramNotifier {
    /// Create a notifier for the given bot token.
    pub fn new(token: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            token: token.into(),
            client,
        })
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, self.token);
        let body = json!({
            "chat_id": recipient,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!(
                "telegram api returned {status}"
            )));
        }
        debug!("delivered notification to chat {}", recipient);
        Ok(())
    }
}
