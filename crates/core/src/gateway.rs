// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence gateway and template-source seams
//!
//! The dispatchers and the enrollment flow talk to storage only through
//! these traits. The gateway must provide read-your-writes consistency
//! and per-instance isolation: two concurrent callers cannot both win the
//! same `mark_sent` (the loser sees `MarkOutcome::Conflict`).

use crate::model::{
    Answer, Enrollment, EnrollmentId, InstanceId, Package, PackageId, QuestionId,
    QuestionTemplate, ScheduledInstance, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors from gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown instance: {0}")]
    UnknownInstance(InstanceId),

    #[error("unknown enrollment: {0}")]
    UnknownEnrollment(EnrollmentId),

    #[error("duplicate instance for enrollment {enrollment}, question {question} at {at}")]
    DuplicateInstance {
        enrollment: EnrollmentId,
        question: QuestionId,
        at: DateTime<Utc>,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

/// One due or stale row, joined with the user and question it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct DueItem {
    pub instance: ScheduledInstance,
    pub user: UserId,
    pub question: QuestionId,
}

/// Result of a state-transition attempt on one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The transition was committed by this caller
    Marked,
    /// Another caller already won the transition; nothing was changed
    Conflict,
}

/// Result of recording an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The instance already has an answer; nothing was changed
    Duplicate,
    /// Answers are only accepted for sent instances
    NotSent,
}

/// Transactional access to enrollment and delivery state
#[async_trait]
pub trait Gateway: Send + Sync {
    /// All unsent instances with `scheduled_time <= now`, oldest first
    async fn find_due_unsent(&self, now: DateTime<Utc>) -> Result<Vec<DueItem>, GatewayError>;

    /// Sent, unanswered, deliverable instances whose `sent_time` is at
    /// least `threshold` before `now`
    async fn find_stale_unanswered(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Vec<DueItem>, GatewayError>;

    /// Commit the unsent -> sent transition for one instance
    async fn mark_sent(
        &self,
        instance: &InstanceId,
        at: DateTime<Utc>,
    ) -> Result<MarkOutcome, GatewayError>;

    /// Flag an instance as permanently undeliverable. An unsent instance
    /// is also marked sent (with `at` as its sent time) so it stops being
    /// due; an already-sent one keeps its original `sent_time`.
    async fn mark_undeliverable(
        &self,
        instance: &InstanceId,
        at: DateTime<Utc>,
    ) -> Result<MarkOutcome, GatewayError>;

    /// Persist a generated schedule as one atomic batch: either every
    /// instance is created or none are
    async fn create_instances(&self, batch: Vec<ScheduledInstance>) -> Result<(), GatewayError>;

    /// Create or update a user record
    async fn upsert_user(&self, user: User) -> Result<(), GatewayError>;

    /// Create an enrollment
    async fn create_enrollment(&self, enrollment: Enrollment) -> Result<(), GatewayError>;

    /// Record an answer for a sent, unanswered instance
    async fn record_answer(&self, answer: Answer) -> Result<RecordOutcome, GatewayError>;

    /// The user's most recently scheduled sent-but-unanswered instance,
    /// if any (the instance an inbound free-text answer applies to)
    async fn latest_unanswered(&self, user: UserId) -> Result<Option<DueItem>, GatewayError>;
}

/// Read-only lookup of catalog configuration
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn template(&self, id: &QuestionId) -> Result<Option<QuestionTemplate>, GatewayError>;

    async fn package(&self, id: &PackageId) -> Result<Option<Package>, GatewayError>;

    /// All packages, in catalog order (drives the selection menu)
    async fn packages(&self) -> Result<Vec<Package>, GatewayError>;

    async fn templates_for_package(
        &self,
        id: &PackageId,
    ) -> Result<Vec<QuestionTemplate>, GatewayError>;
}
