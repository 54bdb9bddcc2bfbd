// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay
//!
//! Catalog tables (packages, templates) are loaded once and read-only;
//! everything else is built by applying operations in log order. The
//! queries here back the gateway contract: the due scan, the stale scan,
//! and the latest-unanswered lookup the answer path uses.

use chrono::{DateTime, Duration, Utc};
use ck_core::model::{
    Answer, Enrollment, EnrollmentId, InstanceId, Package, PackageId, QuestionId,
    QuestionTemplate, ScheduledInstance, User, UserId,
};
use ck_core::{Catalog, DueItem, Operation};
use std::collections::HashMap;

/// Materialized state built from catalog configuration plus WAL operations
#[derive(Debug, Default)]
pub struct State {
    packages: Vec<Package>,
    templates: HashMap<QuestionId, QuestionTemplate>,
    users: HashMap<UserId, User>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    instances: HashMap<InstanceId, ScheduledInstance>,
    answers: HashMap<InstanceId, Answer>,
}

impl State {
    /// Create a state with catalog tables loaded
    pub fn with_catalog(catalog: &Catalog) -> Self {
        Self {
            packages: catalog.packages().to_vec(),
            templates: catalog
                .templates()
                .iter()
                .map(|t| (t.id.clone(), t.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Apply an operation to update the state
    ///
    /// Apply is total: operations referencing unknown ids are dropped
    /// rather than failing replay (validation happens before an operation
    /// is ever logged).
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::UserUpsert { user } => {
                self.users.insert(user.id, user.clone());
            }

            Operation::EnrollmentCreate { enrollment } => {
                self.enrollments
                    .insert(enrollment.id.clone(), enrollment.clone());
            }

            Operation::InstancesCreate { batch } => {
                for instance in batch {
                    self.instances.insert(instance.id.clone(), instance.clone());
                }
            }

            Operation::MarkSent { instance, at } => {
                if let Some(found) = self.instances.get_mut(instance) {
                    if !found.sent {
                        found.sent = true;
                        found.sent_time = Some(*at);
                    }
                }
            }

            Operation::MarkUndeliverable { instance, at } => {
                if let Some(found) = self.instances.get_mut(instance) {
                    if !found.sent {
                        found.sent = true;
                        found.sent_time = Some(*at);
                    }
                    found.undeliverable = true;
                }
            }

            Operation::AnswerRecord { answer } => {
                self.answers
                    .entry(answer.instance.clone())
                    .or_insert_with(|| answer.clone());
            }
        }
    }

    /// Unsent instances due at `now`, oldest scheduled time first
    pub fn due_unsent(&self, now: DateTime<Utc>) -> Vec<DueItem> {
        let mut due: Vec<DueItem> = self
            .instances
            .values()
            .filter(|i| i.is_due(now))
            .filter_map(|i| self.join(i))
            .collect();
        due.sort_by(|a, b| {
            (a.instance.scheduled_time, &a.instance.id)
                .cmp(&(b.instance.scheduled_time, &b.instance.id))
        });
        due
    }

    /// Sent, unanswered, deliverable instances stale for at least `threshold`
    pub fn stale_unanswered(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<DueItem> {
        let mut stale: Vec<DueItem> = self
            .instances
            .values()
            .filter(|i| i.sent && !i.undeliverable && !self.answers.contains_key(&i.id))
            .filter(|i| match i.sent_time {
                Some(sent_time) => now - sent_time >= threshold,
                None => false,
            })
            .filter_map(|i| self.join(i))
            .collect();
        stale.sort_by(|a, b| {
            (a.instance.scheduled_time, &a.instance.id)
                .cmp(&(b.instance.scheduled_time, &b.instance.id))
        });
        stale
    }

    /// The user's most recently scheduled sent-but-unanswered instance
    pub fn latest_unanswered(&self, user: UserId) -> Option<DueItem> {
        self.instances
            .values()
            .filter(|i| i.sent && !self.answers.contains_key(&i.id))
            .filter_map(|i| self.join(i))
            .filter(|item| item.user == user)
            .max_by(|a, b| {
                (a.instance.scheduled_time, &a.instance.id)
                    .cmp(&(b.instance.scheduled_time, &b.instance.id))
            })
    }

    /// Join an instance with the user it belongs to. Instances whose
    /// enrollment is gone are unreachable and silently skipped.
    fn join(&self, instance: &ScheduledInstance) -> Option<DueItem> {
        let enrollment = self.enrollments.get(&instance.enrollment)?;
        Some(DueItem {
            instance: instance.clone(),
            user: enrollment.user,
            question: instance.template.clone(),
        })
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&ScheduledInstance> {
        self.instances.get(id)
    }

    pub fn answer(&self, id: &InstanceId) -> Option<&Answer> {
        self.answers.get(id)
    }

    pub fn enrollment(&self, id: &EnrollmentId) -> Option<&Enrollment> {
        self.enrollments.get(id)
    }

    /// Whether an instance with the same (enrollment, template,
    /// scheduled_time) already exists
    pub fn has_occurrence(
        &self,
        enrollment: &EnrollmentId,
        template: &QuestionId,
        at: DateTime<Utc>,
    ) -> bool {
        self.instances.values().any(|i| {
            i.enrollment == *enrollment && i.template == *template && i.scheduled_time == at
        })
    }

    pub fn template(&self, id: &QuestionId) -> Option<&QuestionTemplate> {
        self.templates.get(id)
    }

    pub fn package(&self, id: &PackageId) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == *id)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn templates_for_package(&self, id: &PackageId) -> Vec<QuestionTemplate> {
        let mut templates: Vec<QuestionTemplate> = self
            .templates
            .values()
            .filter(|t| t.package == *id)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn enrollment_count(&self) -> usize {
        self.enrollments.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
