// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic dispatch driver
//!
//! Runs the due check and the reminder check as two independent loops.
//! Each loop awaits its own cycle before the next tick, so a dispatcher
//! never overlaps itself; the two loops are free to overlap each other.
//! Shutdown is two-staged: the watch signal ends the loops between
//! cycles, and the shared `StopSignal` lets an in-flight cycle finish
//! its current item and return early.

use crate::due::DueDispatcher;
use crate::reminder::ReminderDispatcher;
use ck_adapters::Channel;
use ck_core::{Clock, DispatchConfig, Gateway, TemplateSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Cooperative stop flag checked between items within a cycle
#[derive(Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask in-flight cycles to end after their current item
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Owns both dispatchers and their cadences
pub struct Driver<G, T, Ch, C> {
    due: DueDispatcher<G, T, Ch, C>,
    reminder: ReminderDispatcher<G, T, Ch, C>,
    due_interval: Duration,
    reminder_interval: Duration,
    stop: StopSignal,
}

impl<G, T, Ch, C> Driver<G, T, Ch, C>
where
    G: Gateway + 'static,
    T: TemplateSource + 'static,
    Ch: Channel,
    C: Clock,
{
    pub fn new(
        gateway: Arc<G>,
        templates: Arc<T>,
        channel: Ch,
        clock: C,
        config: &DispatchConfig,
    ) -> Self {
        let stop = StopSignal::new();
        let threshold = chrono::Duration::from_std(config.reminder_threshold)
            .unwrap_or_else(|_| chrono::Duration::MAX);

        let due = DueDispatcher::new(
            Arc::clone(&gateway),
            Arc::clone(&templates),
            channel.clone(),
            clock.clone(),
            config.send_timeout,
            stop.clone(),
        );
        let reminder = ReminderDispatcher::new(
            gateway,
            templates,
            channel,
            clock,
            threshold,
            config.send_timeout,
            stop.clone(),
        );

        Self {
            due,
            reminder,
            due_interval: config.due_check_interval,
            reminder_interval: config.reminder_check_interval,
            stop,
        }
    }

    /// The stop flag shared with both dispatchers
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Run both loops until the shutdown signal fires
    ///
    /// The first tick of each loop fires immediately so a restart catches
    /// up on work that came due while the process was down.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let Self {
            due,
            reminder,
            due_interval,
            reminder_interval,
            stop,
        } = self;

        // Relay the shutdown signal into the cooperative stop flag so an
        // in-flight cycle ends after its current item.
        let mut stop_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = stop_shutdown.changed().await;
            stop.trigger();
        });

        let mut due_shutdown = shutdown.clone();
        let due_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(due_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        due.run_cycle().await;
                    }
                    _ = due_shutdown.changed() => break,
                }
            }
            info!("due loop stopped");
        });

        let mut reminder_shutdown = shutdown;
        let reminder_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(reminder_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reminder.run_cycle().await;
                    }
                    _ = reminder_shutdown.changed() => break,
                }
            }
            info!("reminder loop stopped");
        });

        let _ = tokio::join!(due_task, reminder_task);
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
