// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound payload rendering
//!
//! Builds the text and reply keyboard for questions, reminders, and the
//! enrollment flow prompts. The keyboard layout mirrors the channel's
//! reply-markup shape: rows of button labels.

use crate::model::{Package, QuestionKind, QuestionTemplate};

/// Prefix prepended to a re-sent question so the recipient can tell a
/// reminder from a fresh delivery
pub const REMINDER_MARKER: &str = "Reminder: ";

const YES: &str = "Yes";
const NO: &str = "No";

/// A rendered outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    /// Reply keyboard as rows of button labels; empty means no keyboard
    pub keyboard: Vec<Vec<String>>,
    /// Ask the channel to drop any previously shown keyboard
    pub remove_keyboard: bool,
}

impl Payload {
    /// Plain text, leaving any shown keyboard alone
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: vec![],
            remove_keyboard: false,
        }
    }

    /// Plain text that also clears the reply keyboard
    pub fn closing(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: vec![],
            remove_keyboard: true,
        }
    }

    fn with_keyboard(text: String, keyboard: Vec<Vec<String>>) -> Self {
        Self {
            text,
            keyboard,
            remove_keyboard: false,
        }
    }
}

/// Render a question for first delivery
pub fn question(template: &QuestionTemplate) -> Payload {
    Payload::with_keyboard(template.text.clone(), keyboard_for(template))
}

/// Render a question as a reminder
pub fn reminder(template: &QuestionTemplate) -> Payload {
    Payload::with_keyboard(
        format!("{}{}", REMINDER_MARKER, template.text),
        keyboard_for(template),
    )
}

/// Render the package selection menu, one package per row in catalog order
pub fn package_menu(packages: &[Package]) -> Payload {
    Payload::with_keyboard(
        "Select a package:".to_string(),
        packages.iter().map(|p| vec![p.name.clone()]).collect(),
    )
}

/// Re-prompt after an answer that matches none of the options
pub fn invalid_answer(template: &QuestionTemplate) -> Payload {
    Payload::with_keyboard(
        "Invalid answer. Choose one of the options below:".to_string(),
        keyboard_for(template),
    )
}

fn keyboard_for(template: &QuestionTemplate) -> Vec<Vec<String>> {
    match template.kind {
        QuestionKind::YesNo => vec![vec![YES.to_string(), NO.to_string()]],
        QuestionKind::MultipleChoice => {
            template.options.iter().map(|o| vec![o.clone()]).collect()
        }
    }
}

/// The answers accepted for a question
pub fn valid_answers(template: &QuestionTemplate) -> Vec<String> {
    match template.kind {
        QuestionKind::YesNo => vec![YES.to_string(), NO.to_string()],
        QuestionKind::MultipleChoice => template.options.clone(),
    }
}

/// Whether `text` is an accepted answer for the question
pub fn is_valid_answer(template: &QuestionTemplate, text: &str) -> bool {
    valid_answers(template).iter().any(|a| a == text.trim())
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
