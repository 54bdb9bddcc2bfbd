// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::{PackageId, QuestionId};

fn yes_no_template() -> QuestionTemplate {
    QuestionTemplate {
        id: QuestionId::from("q-meds"),
        package: PackageId::from("pkg-1"),
        text: "Did you take your medication?".to_string(),
        kind: QuestionKind::YesNo,
        options: vec![],
        interval_days: 1,
        delay_days: 0,
    }
}

fn choice_template() -> QuestionTemplate {
    QuestionTemplate {
        id: QuestionId::from("q-energy"),
        package: PackageId::from("pkg-1"),
        text: "How is your energy level?".to_string(),
        kind: QuestionKind::MultipleChoice,
        options: vec!["High".into(), "Medium".into(), "Low".into()],
        interval_days: 3,
        delay_days: 2,
    }
}

#[test]
fn yes_no_question_gets_a_single_row_keyboard() {
    let payload = question(&yes_no_template());
    assert_eq!(payload.text, "Did you take your medication?");
    assert_eq!(payload.keyboard, vec![vec!["Yes".to_string(), "No".to_string()]]);
    assert!(!payload.remove_keyboard);
}

#[test]
fn choice_question_gets_one_option_per_row() {
    let payload = question(&choice_template());
    assert_eq!(payload.keyboard.len(), 3);
    assert_eq!(payload.keyboard[0], vec!["High".to_string()]);
}

#[test]
fn reminder_prefixes_the_marker_and_keeps_the_keyboard() {
    let payload = reminder(&choice_template());
    assert_eq!(payload.text, "Reminder: How is your energy level?");
    assert_eq!(payload.keyboard, question(&choice_template()).keyboard);
}

#[test]
fn package_menu_lists_packages_in_order() {
    let packages = vec![
        Package {
            id: PackageId::from("pkg-1"),
            name: "1 month".to_string(),
            duration_days: 30,
        },
        Package {
            id: PackageId::from("pkg-2"),
            name: "2 months".to_string(),
            duration_days: 60,
        },
    ];
    let payload = package_menu(&packages);
    assert_eq!(
        payload.keyboard,
        vec![vec!["1 month".to_string()], vec!["2 months".to_string()]]
    );
}

#[test]
fn answer_validation_accepts_options_and_trims() {
    let template = choice_template();
    assert!(is_valid_answer(&template, "Low"));
    assert!(is_valid_answer(&template, "  High "));
    assert!(!is_valid_answer(&template, "Exhausted"));

    let yes_no = yes_no_template();
    assert!(is_valid_answer(&yes_no, "Yes"));
    assert!(!is_valid_answer(&yes_no, "Maybe"));
}

#[test]
fn closing_payload_removes_the_keyboard() {
    let payload = Payload::closing("Your answer has been recorded.");
    assert!(payload.keyboard.is_empty());
    assert!(payload.remove_keyboard);
}
