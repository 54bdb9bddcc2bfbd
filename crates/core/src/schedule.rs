// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Occurrence generation for recurring questions
//!
//! Expands a question's recurrence parameters into the concrete delivery
//! timestamps for one enrollment. Pure computation; the caller persists
//! the result as one atomic batch.

use crate::model::QuestionTemplate;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors from occurrence generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A non-positive interval would never make progress
    #[error("invalid recurrence for question {question}: interval_days must be >= 1, got {interval_days}")]
    InvalidRecurrence { question: String, interval_days: i64 },
}

/// Generate the delivery timestamps for one question of one enrollment.
///
/// The first occurrence is `start + delay_days`; each subsequent one steps
/// by `interval_days`. Occurrences are included while they fall on or
/// before `start + duration_days` (boundary inclusive), so a delay equal
/// to the duration yields exactly one occurrence and a delay beyond it
/// yields none.
pub fn generate(
    start: DateTime<Utc>,
    duration_days: i64,
    template: &QuestionTemplate,
) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
    if template.interval_days <= 0 {
        return Err(ScheduleError::InvalidRecurrence {
            question: template.id.to_string(),
            interval_days: template.interval_days,
        });
    }

    let end = start + Duration::days(duration_days);
    let mut occurrences = Vec::new();
    let mut current = start + Duration::days(template.delay_days);

    while current <= end {
        occurrences.push(current);
        current += Duration::days(template.interval_days);
    }

    Ok(occurrences)
}

/// Closed form for the number of occurrences `generate` produces.
///
/// `floor((duration_days - delay_days) / interval_days) + 1` when the
/// delay fits inside the duration, zero otherwise.
pub fn occurrence_count(duration_days: i64, delay_days: i64, interval_days: i64) -> u64 {
    if interval_days <= 0 || delay_days > duration_days {
        return 0;
    }
    ((duration_days - delay_days) / interval_days + 1) as u64
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
