// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::channel::{Channel, SendError};
use async_trait::async_trait;
use ck_core::{Payload, UserId};

/// Wrapper that adds tracing to any Channel
#[derive(Clone)]
pub struct TracedChannel<C> {
    inner: C,
}

impl<C> TracedChannel<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: Channel> Channel for TracedChannel<C> {
    async fn send(&self, user: UserId, payload: &Payload) -> Result<(), SendError> {
        let span = tracing::info_span!("channel.send", user = %user);
        let _guard = span.enter();

        tracing::debug!(text_len = payload.text.len(), "sending");

        let start = std::time::Instant::now();
        let result = self.inner.send(user, payload).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "delivered"),
            Err(SendError::Transient(e)) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "transient delivery failure"
            ),
            Err(SendError::Permanent(e)) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "permanent delivery failure"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
