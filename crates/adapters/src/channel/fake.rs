// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake channel for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Channel, SendError};
use async_trait::async_trait;
use ck_core::{Payload, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded delivery attempt
#[derive(Debug, Clone)]
pub struct SendCall {
    pub user: UserId,
    pub payload: Payload,
}

/// Scripted outcome for a user's sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendScript {
    Deliver,
    FailTransient,
    FailPermanent,
    /// Never resolve; exercises per-send timeouts
    Hang,
}

/// Fake channel recording every attempt, with per-user scripted outcomes
#[derive(Clone, Default)]
pub struct FakeChannel {
    calls: Arc<Mutex<Vec<SendCall>>>,
    scripts: Arc<Mutex<HashMap<UserId, SendScript>>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome of future sends to `user` (default: deliver)
    pub fn script(&self, user: UserId, script: SendScript) {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user, script);
    }

    /// Get all recorded delivery attempts
    pub fn calls(&self) -> Vec<SendCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Payloads attempted for one user, in order
    pub fn sent_to(&self, user: UserId) -> Vec<Payload> {
        self.calls()
            .into_iter()
            .filter(|c| c.user == user)
            .map(|c| c.payload)
            .collect()
    }
}

#[async_trait]
impl Channel for FakeChannel {
    async fn send(&self, user: UserId, payload: &Payload) -> Result<(), SendError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SendCall {
                user,
                payload: payload.clone(),
            });

        let script = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&user)
            .copied()
            .unwrap_or(SendScript::Deliver);

        match script {
            SendScript::Deliver => Ok(()),
            SendScript::FailTransient => {
                Err(SendError::Transient("scripted outage".to_string()))
            }
            SendScript::FailPermanent => {
                Err(SendError::Permanent("scripted unreachable user".to_string()))
            }
            SendScript::Hang => {
                std::future::pending::<()>().await;
                Err(SendError::Transient("unreachable".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
