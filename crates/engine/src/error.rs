// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use ck_core::{GatewayError, ScheduleError};
use thiserror::Error;

/// Errors surfaced by the enrollment flow
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),
}
