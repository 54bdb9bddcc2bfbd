// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery channel adapters
//!
//! A channel is best-effort: it either delivers a rendered payload, fails
//! transiently (worth retrying), or fails permanently (the recipient is
//! structurally unreachable). Dispatchers build their retry and
//! undeliverable policies on that distinction.

mod bot_api;
mod noop;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use bot_api::BotApiChannel;
pub use noop::NoOpChannel;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChannel, SendCall, SendScript};

use async_trait::async_trait;
use ck_core::{Payload, UserId};
use thiserror::Error;

/// Errors from a delivery attempt
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// Expected to succeed on retry (outage, rate limit, timeout)
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The recipient is structurally unreachable (e.g. blocked the bot)
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

/// Best-effort delivery of a rendered payload to one user
#[async_trait]
pub trait Channel: Clone + Send + Sync + 'static {
    async fn send(&self, user: UserId, payload: &Payload) -> Result<(), SendError>;
}
