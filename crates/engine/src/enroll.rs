// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enrollment and answer capture
//!
//! The conversational path: /start -> name -> package selection ->
//! free-text answers to delivered questions. Per-user conversation state
//! is an explicit keyed map behind a mutex, owned by the flow.
//!
//! Enrollment is the only caller of the occurrence generator: the whole
//! schedule for a package is generated up front and persisted as one
//! atomic batch, so a partially scheduled enrollment never exists.

use crate::error::EngineError;
use ck_adapters::Channel;
use ck_core::model::{Answer, Enrollment, EnrollmentId, InstanceId, Package, ScheduledInstance, User, UserId};
use ck_core::{render, schedule, Clock, Gateway, IdGen, Payload, RecordOutcome, TemplateSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConversationState {
    AwaitingName,
    AwaitingPackage { name: String },
}

/// Handles inbound messages: enrollment conversations and answers
pub struct EnrollmentFlow<G, T, Ch, C, I> {
    gateway: Arc<G>,
    templates: Arc<T>,
    channel: Ch,
    clock: C,
    ids: I,
    conversations: Mutex<HashMap<UserId, ConversationState>>,
}

impl<G, T, Ch, C, I> EnrollmentFlow<G, T, Ch, C, I>
where
    G: Gateway,
    T: TemplateSource,
    Ch: Channel,
    C: Clock,
    I: IdGen,
{
    pub fn new(gateway: Arc<G>, templates: Arc<T>, channel: Ch, clock: C, ids: I) -> Self {
        Self {
            gateway,
            templates,
            channel,
            clock,
            ids,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one inbound message from a user
    pub async fn handle_message(&self, user: UserId, text: &str) -> Result<(), EngineError> {
        let text = text.trim();
        let state = self.state_of(user);

        match state {
            None if text == "/start" => self.begin(user).await,
            None => self.capture_answer(user, text).await,
            Some(ConversationState::AwaitingName) => self.save_name(user, text).await,
            Some(ConversationState::AwaitingPackage { name }) => {
                self.choose_package(user, &name, text).await
            }
        }
    }

    async fn begin(&self, user: UserId) -> Result<(), EngineError> {
        self.set_state(user, ConversationState::AwaitingName);
        self.reply(user, Payload::plain("Welcome! Please enter your name:"))
            .await;
        Ok(())
    }

    async fn save_name(&self, user: UserId, name: &str) -> Result<(), EngineError> {
        if name.is_empty() {
            self.reply(user, Payload::plain("Please enter your name:"))
                .await;
            return Ok(());
        }

        self.gateway
            .upsert_user(User {
                id: user,
                full_name: name.to_string(),
                username: None,
                created_at: self.clock.now(),
            })
            .await?;

        self.set_state(
            user,
            ConversationState::AwaitingPackage {
                name: name.to_string(),
            },
        );

        let packages = self.templates.packages().await?;
        self.reply(user, render::package_menu(&packages)).await;
        Ok(())
    }

    async fn choose_package(
        &self,
        user: UserId,
        name: &str,
        choice: &str,
    ) -> Result<(), EngineError> {
        let packages = self.templates.packages().await?;
        let Some(package) = packages.iter().find(|p| p.name == choice) else {
            let mut menu = render::package_menu(&packages);
            menu.text = format!("Invalid selection. {}", menu.text);
            self.reply(user, menu).await;
            return Ok(());
        };

        self.enroll(user, package).await?;
        self.clear_state(user);
        self.reply(
            user,
            Payload::closing(format!(
                "Hello, {}!\nYou are enrolled in: {}",
                name, package.name
            )),
        )
        .await;
        Ok(())
    }

    /// Create the enrollment and its full schedule
    async fn enroll(&self, user: UserId, package: &Package) -> Result<(), EngineError> {
        let start = self.clock.now();
        let enrollment_id = EnrollmentId::new(self.ids.next_id("enr"));

        // Generate everything before touching storage: an invalid
        // recurrence fails enrollment with nothing persisted.
        let templates = self.templates.templates_for_package(&package.id).await?;
        let mut batch = Vec::new();
        for template in &templates {
            for occurrence in schedule::generate(start, package.duration_days, template)? {
                batch.push(ScheduledInstance::new(
                    InstanceId::new(self.ids.next_id("inst")),
                    enrollment_id.clone(),
                    template.id.clone(),
                    occurrence,
                ));
            }
        }

        self.gateway
            .create_enrollment(Enrollment {
                id: enrollment_id.clone(),
                user,
                package: package.id.clone(),
                start_date: start,
            })
            .await?;

        let count = batch.len();
        self.gateway.create_instances(batch).await?;

        tracing::info!(
            user = %user,
            package = %package.id,
            enrollment = %enrollment_id,
            instances = count,
            "enrollment created"
        );
        Ok(())
    }

    async fn capture_answer(&self, user: UserId, text: &str) -> Result<(), EngineError> {
        let Some(pending) = self.gateway.latest_unanswered(user).await? else {
            self.reply(
                user,
                Payload::plain("You have no questions awaiting an answer."),
            )
            .await;
            return Ok(());
        };

        let Some(template) = self.templates.template(&pending.question).await? else {
            tracing::warn!(
                instance = %pending.instance.id,
                question = %pending.question,
                "pending instance references a missing template"
            );
            self.reply(
                user,
                Payload::plain("You have no questions awaiting an answer."),
            )
            .await;
            return Ok(());
        };

        if !render::is_valid_answer(&template, text) {
            self.reply(user, render::invalid_answer(&template)).await;
            return Ok(());
        }

        let outcome = self
            .gateway
            .record_answer(Answer {
                instance: pending.instance.id.clone(),
                text: text.to_string(),
                answered_time: self.clock.now(),
            })
            .await?;

        match outcome {
            RecordOutcome::Recorded => {
                self.reply(user, Payload::closing("Your answer has been recorded."))
                    .await;
            }
            RecordOutcome::Duplicate | RecordOutcome::NotSent => {
                // Raced with another writer; the question is no longer open
                self.reply(
                    user,
                    Payload::plain("You have no questions awaiting an answer."),
                )
                .await;
            }
        }
        Ok(())
    }

    /// Conversational replies are best-effort: a failed reply is logged
    /// and never propagated
    async fn reply(&self, user: UserId, payload: Payload) {
        if let Err(e) = self.channel.send(user, &payload).await {
            tracing::warn!(user = %user, error = %e, "failed to deliver reply");
        }
    }

    fn state_of(&self, user: UserId) -> Option<ConversationState> {
        self.conversations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&user)
            .cloned()
    }

    fn set_state(&self, user: UserId, state: ConversationState) {
        self.conversations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user, state);
    }

    fn clear_state(&self, user: UserId) {
        self.conversations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&user);
    }
}

#[cfg(test)]
#[path = "enroll_tests.rs"]
mod tests;
