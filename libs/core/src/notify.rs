//! Outbound replies. `ReplySender` is the seam between the webhook handler
//! and the Telegram Bot API; tests substitute a recording implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Delivers one reply, best effort. Returns whether the platform
    /// accepted it; failures are logged by the implementation and never
    /// escalate past this boundary.
    async fn send(&self, chat_id: i64, text: &str) -> bool;
}

pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl TelegramNotifier {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn endpoint(&self) -> Option<String> {
        self.token
            .as_deref()
            .map(|token| build_api_url(&self.api_base, token))
    }
}

#[async_trait]
impl ReplySender for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> bool {
        let Some(url) = self.endpoint() else {
            tracing::warn!("bot token not configured; reply dropped");
            return false;
        };

        let payload = json!({ "chat_id": chat_id, "text": text });
        let response = match self
            .http
            .post(url)
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(chat_id, error = %err, "telegram send failed");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(chat_id, status = %status, body = %body, "telegram send rejected");
            return false;
        }

        // The Bot API reports logical failure in the body's `ok` field even
        // on a 2xx status.
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(chat_id, error = %err, "telegram response unreadable");
                return false;
            }
        };
        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !ok {
            tracing::warn!(chat_id, body = %body, "telegram send not ok");
        }
        ok
    }
}

fn build_api_url(api_base: &str, bot_token: &str) -> String {
    format!(
        "{}/bot{}/sendMessage",
        api_base.trim_end_matches('/'),
        bot_token
    )
}
