//! Inbound update handling: parse, validate, look up, reply, acknowledge.
//!
//! Telegram is always acknowledged with 200 once the payload is readable;
//! reply delivery is best effort and never changes the inbound status.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use lookbot_core::ReplySender;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;

/// Maximum accepted text size in UTF-8 bytes.
const MAX_TEXT_BYTES: usize = 50;

pub(crate) const PROMPT_SEND_TEXT: &str = "请发送文本消息！";
pub(crate) const PROMPT_TOO_LONG: &str = "消息太长了！请发送不超过50字节的字符串。";
pub(crate) const PROMPT_EMPTY_QUERY: &str = "请输入非空的查询关键字。";

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    #[serde(default)]
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    #[serde(default)]
    chat: Option<TelegramChat>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// A normalized inbound request.
#[derive(Debug, PartialEq)]
pub(crate) enum ParsedUpdate {
    /// A well-formed update of a kind we do not answer (edits, channel
    /// events, ...).
    Ignored,
    Inbound {
        chat_id: Option<i64>,
        text: Option<String>,
    },
}

/// The single normalization point for inbound bodies. `None` means the body
/// was unparseable or empty and the request should be rejected with 400.
pub(crate) fn parse_update(body: &[u8]) -> Option<ParsedUpdate> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    if object.is_empty() {
        return None;
    }
    if !object.contains_key("message") {
        return Some(ParsedUpdate::Ignored);
    }
    let update: TelegramUpdate = serde_json::from_value(value).ok()?;
    Some(match update.message {
        None => ParsedUpdate::Ignored,
        Some(message) => ParsedUpdate::Inbound {
            chat_id: message.chat.map(|chat| chat.id),
            text: message.text,
        },
    })
}

pub(crate) async fn handle_update<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> (StatusCode, Json<Value>)
where
    S: ReplySender + 'static,
{
    if state.config.bot_token.is_none() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "BOT_TOKEN not configured" })),
        );
    }

    let Some(update) = parse_update(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No data received" })),
        );
    };

    let ParsedUpdate::Inbound { chat_id, text } = update else {
        return ack();
    };

    let Some(text) = text else {
        reply(state.sender.as_ref(), chat_id, PROMPT_SEND_TEXT).await;
        return ack();
    };

    if text.len() > MAX_TEXT_BYTES {
        reply(state.sender.as_ref(), chat_id, PROMPT_TOO_LONG).await;
        return ack();
    }

    let query = text.trim();
    if query.is_empty() {
        reply(state.sender.as_ref(), chat_id, PROMPT_EMPTY_QUERY).await;
        return ack();
    }

    let message = state.lookup.resolve(query).await;
    reply(state.sender.as_ref(), chat_id, &message).await;
    ack()
}

fn ack() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn reply<S: ReplySender>(sender: &S, chat_id: Option<i64>, text: &str) {
    let Some(chat_id) = chat_id else {
        tracing::warn!("message has no chat id; reply dropped");
        return;
    };
    if !sender.send(chat_id, text).await {
        tracing::warn!(chat_id, "reply delivery failed");
    }
}
