// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Due-item dispatch
//!
//! One cycle queries every unsent instance whose scheduled time has
//! passed, sends each independently, and commits the unsent -> sent
//! transition per item. A failed item never rolls back or blocks the
//! rest of the batch; it is logged and the cycle moves on.

use crate::driver::StopSignal;
use ck_adapters::{Channel, SendError};
use ck_core::{render, Clock, DueItem, Gateway, MarkOutcome, TemplateSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Outcome counts for one due-check cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub examined: usize,
    pub sent: usize,
    pub transient_failures: usize,
    pub permanent_failures: usize,
    pub conflicts: usize,
    pub errors: usize,
}

/// Promotes due instances from unsent to sent
pub struct DueDispatcher<G, T, Ch, C> {
    gateway: Arc<G>,
    templates: Arc<T>,
    channel: Ch,
    clock: C,
    send_timeout: Duration,
    stop: StopSignal,
}

impl<G, T, Ch, C> DueDispatcher<G, T, Ch, C>
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
        send_timeout: Duration,
        stop: StopSignal,
    ) -> Self {
        Self {
            gateway,
            templates,
            channel,
            clock,
            send_timeout,
            stop,
        }
    }

    /// Run one due-check cycle to completion
    ///
    /// Re-running at the same clock reading is idempotent: instances the
    /// first run marked sent are filtered out by the query, and a racing
    /// double-mark surfaces as a conflict, not a second delivery state.
    pub async fn run_cycle(&self) -> CycleStats {
        let mut stats = CycleStats::default();

        // One clock read drives every comparison in this cycle
        let now = self.clock.now();

        let due = match self.gateway.find_due_unsent(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "due query failed, skipping cycle");
                stats.errors += 1;
                return stats;
            }
        };

        tracing::debug!(count = due.len(), "due instances found");

        for item in &due {
            if self.stop.is_stopped() {
                tracing::info!("stop requested, ending due cycle early");
                break;
            }
            stats.examined += 1;
            self.dispatch_one(item, now, &mut stats).await;
        }

        if stats.examined > 0 {
            tracing::info!(
                examined = stats.examined,
                sent = stats.sent,
                transient = stats.transient_failures,
                permanent = stats.permanent_failures,
                conflicts = stats.conflicts,
                errors = stats.errors,
                "due cycle complete"
            );
        }

        stats
    }

    async fn dispatch_one(&self, item: &DueItem, now: DateTime<Utc>, stats: &mut CycleStats) {
        let template = match self.templates.template(&item.question).await {
            Ok(Some(template)) => template,
            Ok(None) => {
                tracing::warn!(
                    instance = %item.instance.id,
                    question = %item.question,
                    "question template missing, skipping instance"
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

        let payload = render::question(&template);

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
                // The window between this send succeeding and the mark
                // committing is the accepted at-least-once risk: a crash
                // here re-delivers once on recovery, it never loses the
                // instance.
                match self.gateway.mark_sent(&item.instance.id, now).await {
                    Ok(MarkOutcome::Marked) => {
                        stats.sent += 1;
                        tracing::debug!(instance = %item.instance.id, user = %item.user, "sent");
                    }
                    Ok(MarkOutcome::Conflict) => {
                        stats.conflicts += 1;
                        tracing::warn!(
                            instance = %item.instance.id,
                            "already marked sent by a concurrent caller"
                        );
                    }
                    Err(e) => {
                        stats.errors += 1;
                        tracing::error!(
                            instance = %item.instance.id,
                            error = %e,
                            "failed to mark sent, instance stays due"
                        );
                    }
                }
            }
            Err(SendError::Transient(e)) => {
                stats.transient_failures += 1;
                tracing::warn!(
                    instance = %item.instance.id,
                    user = %item.user,
                    error = %e,
                    "transient delivery failure, will retry next cycle"
                );
            }
            Err(SendError::Permanent(e)) => {
                stats.permanent_failures += 1;
                tracing::warn!(
                    instance = %item.instance.id,
                    user = %item.user,
                    error = %e,
                    "permanent delivery failure, marking undeliverable"
                );
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
#[path = "due_tests.rs"]
mod tests;
