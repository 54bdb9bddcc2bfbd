// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable operations applied to the materialized store
//!
//! Each variant is one atomic unit of persistence. `InstancesCreate`
//! carries a whole generated schedule so enrollment either persists every
//! occurrence or none of them. The catalog is configuration, not an
//! operation.

use crate::model::{Answer, Enrollment, InstanceId, ScheduledInstance, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    UserUpsert {
        user: User,
    },
    EnrollmentCreate {
        enrollment: Enrollment,
    },
    InstancesCreate {
        batch: Vec<ScheduledInstance>,
    },
    MarkSent {
        instance: InstanceId,
        at: DateTime<Utc>,
    },
    MarkUndeliverable {
        instance: InstanceId,
        at: DateTime<Utc>,
    },
    AnswerRecord {
        answer: Answer,
    },
}
