// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op channel for dry-run deployments

use super::{Channel, SendError};
use async_trait::async_trait;
use ck_core::{Payload, UserId};

/// Channel that logs outbound messages and reports success
#[derive(Clone, Default)]
pub struct NoOpChannel;

impl NoOpChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for NoOpChannel {
    async fn send(&self, user: UserId, payload: &Payload) -> Result<(), SendError> {
        tracing::info!(user = %user, text = %payload.text, "dropping outbound message (noop channel)");
        Ok(())
    }
}
