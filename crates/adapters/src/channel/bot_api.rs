// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound delivery through a Telegram-style bot HTTP API
//!
//! Only the sendMessage surface is used; inbound traffic reaches the
//! daemon over its local socket, not through this adapter.

use super::{Channel, SendError};
use async_trait::async_trait;
use ck_core::{Payload, UserId};

/// Channel that posts messages to a bot API endpoint
#[derive(Debug, Clone)]
pub struct BotApiChannel {
    api_url: String,
    token: String,
}

impl BotApiChannel {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.token
        )
    }

    fn request_body(user: UserId, payload: &Payload) -> serde_json::Value {
        let mut body = serde_json::json!({
            "chat_id": user.0,
            "text": payload.text,
        });
        if !payload.keyboard.is_empty() {
            body["reply_markup"] = serde_json::json!({
                "keyboard": payload.keyboard,
                "one_time_keyboard": true,
                "resize_keyboard": true,
            });
        } else if payload.remove_keyboard {
            body["reply_markup"] = serde_json::json!({ "remove_keyboard": true });
        }
        body
    }
}

#[async_trait]
impl Channel for BotApiChannel {
    async fn send(&self, user: UserId, payload: &Payload) -> Result<(), SendError> {
        let url = self.send_url();
        let body = Self::request_body(user, payload);

        // ureq is blocking; keep the call off the async runtime
        let result = tokio::task::spawn_blocking(move || ureq::post(&url).send_json(body)).await;

        match result {
            Err(join_error) => Err(SendError::Transient(format!(
                "send task failed: {}",
                join_error
            ))),
            Ok(Ok(_response)) => Ok(()),
            Ok(Err(error)) => Err(classify(error)),
        }
    }
}

/// Map a bot API failure onto the transient/permanent split
fn classify(error: ureq::Error) -> SendError {
    match error {
        // 403: the user blocked the bot; 400: chat id does not exist.
        // Both mean this recipient will never become reachable by retry.
        ureq::Error::StatusCode(403) => {
            SendError::Permanent("recipient blocked the bot (403)".to_string())
        }
        ureq::Error::StatusCode(400) => {
            SendError::Permanent("chat not found (400)".to_string())
        }
        ureq::Error::StatusCode(code) => {
            SendError::Transient(format!("bot api returned status {}", code))
        }
        other => SendError::Transient(other.to_string()),
    }
}

#[cfg(test)]
#[path = "bot_api_tests.rs"]
mod tests;
