// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain records for questionnaire scheduling
//!
//! Packages and question templates are configuration, created at catalog
//! load time and read-only afterwards. Enrollments and scheduled instances
//! are the mutable half: instances are created in bulk when an enrollment
//! is made and transition unsent -> sent exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identity of a user on the delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a question template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an enrollment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

impl EnrollmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EnrollmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a scheduled instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A user known to the system, created on first interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The answer format a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    YesNo,
    MultipleChoice,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::YesNo => write!(f, "yes_no"),
            QuestionKind::MultipleChoice => write!(f, "multiple_choice"),
        }
    }
}

impl std::str::FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes_no" => Ok(QuestionKind::YesNo),
            "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            _ => Err(format!("unknown question kind: {}", s)),
        }
    }
}

/// A recurring question belonging to one package
///
/// `options` is non-empty iff `kind` is `MultipleChoice`; the catalog
/// loader enforces this before a template ever reaches the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    pub id: QuestionId,
    pub package: PackageId,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub interval_days: i64,
    pub delay_days: i64,
}

/// A named bundle of questions with a bounded duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub duration_days: i64,
}

/// A user's association with one package from a start date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user: UserId,
    pub package: PackageId,
    pub start_date: DateTime<Utc>,
}

/// One concrete (question, time) delivery, the unit the dispatchers operate on
///
/// `sent` is monotonic: false -> true, never back. `sent_time` is set on
/// the same transition. `undeliverable` marks a recipient the channel
/// reported as structurally unreachable; such instances are excluded from
/// reminder eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstance {
    pub id: InstanceId,
    pub enrollment: EnrollmentId,
    pub template: QuestionId,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub undeliverable: bool,
}

impl ScheduledInstance {
    pub fn new(
        id: InstanceId,
        enrollment: EnrollmentId,
        template: QuestionId,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            enrollment,
            template,
            scheduled_time,
            sent: false,
            sent_time: None,
            undeliverable: false,
        }
    }

    /// Whether this instance is due for delivery at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.scheduled_time <= now
    }
}

/// A user's answer to one scheduled instance; at most one per instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub instance: InstanceId,
    pub text: String,
    pub answered_time: DateTime<Utc>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
