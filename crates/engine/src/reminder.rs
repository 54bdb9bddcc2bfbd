// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reminder dispatch
//!
//! Re-notifies sent-but-unanswered instances past the staleness
//! threshold. A reminder never mutates `sent`/`sent_time`, so repeating
//! it every cycle is safe until an answer arrives or the instance is
//! flagged undeliverable.

use crate::driver::StopSignal;
use ck_adapters::{Channel, SendError};
use ck_core::{render, Clock, DueItem, Gateway, TemplateSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Outcome counts for one reminder cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderStats {
    pub examined: usize,
    pub reminded: usize,
    pub transient_failures: usize,
    pub permanent_failures: usize,
    pub errors: usize,
}

/// Re-sends stale unanswered questions with a reminder marker
pub struct ReminderDispatcher<G, T, Ch, C> {
    gateway: Arc<G>,
    templates: Arc<T>,
    channel: Ch,
    clock: C,
    threshold: chrono::Duration,
    send_timeout: Duration,
    stop: StopSignal,
}

impl<G, T, Ch, C> ReminderDispatcher<G, T, Ch, C>
where
    G: Gateway,
    T: TemplateSource,
    Ch: Channel,
    C: Clock,
{
    pub fn new(
        gateway: Arc<G>,
        templates: Arc<T>,
        channel: Ch,
        clock: C,
        threshold: chrono::Duration,
        send_timeout: Duration,
        stop: StopSignal,
    ) -> Self {
        Self {
            gateway,
            templates,
            channel,
            clock,
            threshold,
            send_timeout,
            stop,
        }
    }

    /// Run one reminder cycle to completion
    pub async fn run_cycle(&self) -> ReminderStats {
        let mut stats = ReminderStats::default();

        // One clock read drives every staleness comparison in this cycle
        let now = self.clock.now();

        let stale = match self.gateway.find_stale_unanswered(now, self.threshold).await {
            Ok(stale) => stale,
            Err(e) => {
                tracing::error!(error = %e, "stale query failed, skipping cycle");
                stats.errors += 1;
                return stats;
            }
        };

        tracing::debug!(count = stale.len(), "stale unanswered instances found");

        for item in &stale {
            if self.stop.is_stopped() {
                tracing::info!("stop requested, ending reminder cycle early");
                break;
            }
            stats.examined += 1;
            self.remind_one(item, now, &mut stats).await;
        }

        if stats.examined > 0 {
            tracing::info!(
                examined = stats.examined,
                reminded = stats.reminded,
                transient = stats.transient_failures,
                permanent = stats.permanent_failures,
                errors = stats.errors,
                "reminder cycle complete"
            );
        }

        stats
    }

    async fn remind_one(&self, item: &DueItem, now: DateTime<Utc>, stats: &mut ReminderStats) {
        let template = match self.templates.template(&item.question).await {
            Ok(Some(template)) => template,
            Ok(None) => {
                tracing::warn!(
                    instance = %item.instance.id,
                    question = %item.question,
                    "question template missing, skipping reminder"
                );
                stats.errors += 1;
                return;
            }
            Err(e) => {
                tracing::error!(instance = %item.instance.id, error = %e, "template lookup failed");
                stats.errors += 1;
                return;
            }
        };

        let payload = render::reminder(&template);

        let outcome = match tokio::time::timeout(
            self.send_timeout,
            self.channel.send(item.user, &payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SendError::Transient(format!(
                "send timed out after {:?}",
                self.send_timeout
            ))),
        };

        match outcome {
            Ok(()) => {
                stats.reminded += 1;
                tracing::debug!(instance = %item.instance.id, user = %item.user, "reminded");
            }
            Err(SendError::Transient(e)) => {
                stats.transient_failures += 1;
                tracing::warn!(
                    instance = %item.instance.id,
                    user = %item.user,
                    error = %e,
                    "transient reminder failure, will retry next cycle"
                );
            }
            Err(SendError::Permanent(e)) => {
                stats.permanent_failures += 1;
                tracing::warn!(
                    instance = %item.instance.id,
                    user = %item.user,
                    error = %e,
                    "recipient unreachable, excluding from future reminders"
                );
                // Flag only: sent/sent_time stay untouched for an
                // already-sent instance.
                if let Err(e) = self.gateway.mark_undeliverable(&item.instance.id, now).await {
                    stats.errors += 1;
                    tracing::error!(
                        instance = %item.instance.id,
                        error = %e,
                        "failed to mark undeliverable"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reminder_tests.rs"]
mod tests;
