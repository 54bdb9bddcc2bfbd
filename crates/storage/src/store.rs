// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistence gateway: WAL + materialized state behind one mutex
//!
//! Every mutation is committed write-ahead: the operation is appended and
//! fsynced before it is applied in memory, so an acknowledged transition
//! survives a crash. The mutex is held per operation, never across a
//! channel send or a whole dispatch cycle.

use crate::state::State;
use crate::wal::{Wal, WalError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ck_core::model::{
    Answer, Enrollment, InstanceId, Package, PackageId, QuestionId, QuestionTemplate,
    ScheduledInstance, User, UserId,
};
use ck_core::{
    Catalog, DueItem, Gateway, GatewayError, MarkOutcome, Operation, RecordOutcome,
    TemplateSource,
};
use std::path::Path;
use std::sync::Mutex;

/// Record counts for startup logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub users: usize,
    pub enrollments: usize,
    pub instances: usize,
    pub answers: usize,
}

struct Inner {
    state: State,
    wal: Option<Wal>,
}

/// Durable store implementing the gateway and template-source seams
pub struct Store {
    inner: Mutex<Inner>,
}

impl Store {
    /// Open a store, replaying any committed operations from the WAL
    pub fn open(catalog: &Catalog, wal_path: &Path) -> Result<Self, WalError> {
        let mut state = State::with_catalog(catalog);
        for op in Wal::replay(wal_path)? {
            state.apply(&op);
        }
        let wal = Wal::open(wal_path)?;

        Ok(Self {
            inner: Mutex::new(Inner {
                state,
                wal: Some(wal),
            }),
        })
    }

    /// Volatile store for tests and dry runs
    pub fn in_memory(catalog: &Catalog) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::with_catalog(catalog),
                wal: None,
            }),
        }
    }

    pub fn counts(&self) -> StoreCounts {
        let inner = self.lock();
        StoreCounts {
            users: inner.state.user_count(),
            enrollments: inner.state.enrollment_count(),
            instances: inner.state.instance_count(),
            answers: inner.state.answer_count(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Append (write-ahead) then apply one operation
fn commit(inner: &mut Inner, op: Operation) -> Result<(), GatewayError> {
    if let Some(wal) = inner.wal.as_mut() {
        wal.append(&op)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
    }
    inner.state.apply(&op);
    Ok(())
}

#[async_trait]
impl Gateway for Store {
    async fn find_due_unsent(&self, now: DateTime<Utc>) -> Result<Vec<DueItem>, GatewayError> {
        Ok(self.lock().state.due_unsent(now))
    }

    async fn find_stale_unanswered(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Vec<DueItem>, GatewayError> {
        Ok(self.lock().state.stale_unanswered(now, threshold))
    }

    async fn mark_sent(
        &self,
        instance: &InstanceId,
        at: DateTime<Utc>,
    ) -> Result<MarkOutcome, GatewayError> {
        let mut inner = self.lock();
        let found = inner
            .state
            .instance(instance)
            .ok_or_else(|| GatewayError::UnknownInstance(instance.clone()))?;
        if found.sent {
            return Ok(MarkOutcome::Conflict);
        }
        commit(
            &mut inner,
            Operation::MarkSent {
                instance: instance.clone(),
                at,
            },
        )?;
        Ok(MarkOutcome::Marked)
    }

    async fn mark_undeliverable(
        &self,
        instance: &InstanceId,
        at: DateTime<Utc>,
    ) -> Result<MarkOutcome, GatewayError> {
        let mut inner = self.lock();
        let found = inner
            .state
            .instance(instance)
            .ok_or_else(|| GatewayError::UnknownInstance(instance.clone()))?;
        if found.undeliverable {
            return Ok(MarkOutcome::Conflict);
        }
        commit(
            &mut inner,
            Operation::MarkUndeliverable {
                instance: instance.clone(),
                at,
            },
        )?;
        Ok(MarkOutcome::Marked)
    }

    async fn create_instances(&self, batch: Vec<ScheduledInstance>) -> Result<(), GatewayError> {
        let mut inner = self.lock();

        // Validate the whole batch before logging anything: the operation
        // is all-or-nothing.
        for (index, instance) in batch.iter().enumerate() {
            if inner.state.enrollment(&instance.enrollment).is_none() {
                return Err(GatewayError::UnknownEnrollment(instance.enrollment.clone()));
            }
            let duplicate_in_state = inner.state.has_occurrence(
                &instance.enrollment,
                &instance.template,
                instance.scheduled_time,
            );
            let duplicate_in_batch = batch[..index].iter().any(|earlier| {
                earlier.enrollment == instance.enrollment
                    && earlier.template == instance.template
                    && earlier.scheduled_time == instance.scheduled_time
            });
            if duplicate_in_state || duplicate_in_batch {
                return Err(GatewayError::DuplicateInstance {
                    enrollment: instance.enrollment.clone(),
                    question: instance.template.clone(),
                    at: instance.scheduled_time,
                });
            }
        }

        commit(&mut inner, Operation::InstancesCreate { batch })
    }

    async fn upsert_user(&self, user: User) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        commit(&mut inner, Operation::UserUpsert { user })
    }

    async fn create_enrollment(&self, enrollment: Enrollment) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        commit(&mut inner, Operation::EnrollmentCreate { enrollment })
    }

    async fn record_answer(&self, answer: Answer) -> Result<RecordOutcome, GatewayError> {
        let mut inner = self.lock();
        let found = inner
            .state
            .instance(&answer.instance)
            .ok_or_else(|| GatewayError::UnknownInstance(answer.instance.clone()))?;
        if !found.sent {
            return Ok(RecordOutcome::NotSent);
        }
        if inner.state.answer(&answer.instance).is_some() {
            return Ok(RecordOutcome::Duplicate);
        }
        commit(&mut inner, Operation::AnswerRecord { answer })?;
        Ok(RecordOutcome::Recorded)
    }

    async fn latest_unanswered(&self, user: UserId) -> Result<Option<DueItem>, GatewayError> {
        Ok(self.lock().state.latest_unanswered(user))
    }
}

#[async_trait]
impl TemplateSource for Store {
    async fn template(&self, id: &QuestionId) -> Result<Option<QuestionTemplate>, GatewayError> {
        Ok(self.lock().state.template(id).cloned())
    }

    async fn package(&self, id: &PackageId) -> Result<Option<Package>, GatewayError> {
        Ok(self.lock().state.package(id).cloned())
    }

    async fn packages(&self) -> Result<Vec<Package>, GatewayError> {
        Ok(self.lock().state.packages().to_vec())
    }

    async fn templates_for_package(
        &self,
        id: &PackageId,
    ) -> Result<Vec<QuestionTemplate>, GatewayError> {
        Ok(self.lock().state.templates_for_package(id))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
