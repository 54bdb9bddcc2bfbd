// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = r#"
[[package]]
id = "course-30"
name = "1 month"
duration_days = 30

  [[package.question]]
  id = "mood-daily"
  text = "How are you feeling today?"
  kind = "multiple_choice"
  options = ["Very good", "Good", "Satisfactory", "Poor"]
  interval_days = 1

  [[package.question]]
  id = "meds-decade"
  text = "Did you take your medication without interruption?"
  kind = "yes_no"
  interval_days = 10
  delay_days = 10

[[package]]
id = "course-60"
name = "2 months"
duration_days = 60

  [[package.question]]
  id = "health-overall"
  text = "How is your overall health?"
  kind = "multiple_choice"
  options = ["Very good", "Good", "Satisfactory", "Poor"]
  interval_days = 5
  delay_days = 5
"#;

#[test]
fn parses_packages_and_questions_in_order() {
    let catalog = Catalog::parse(SAMPLE).unwrap();

    let names: Vec<&str> = catalog.packages().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["1 month", "2 months"]);

    assert_eq!(catalog.templates().len(), 3);
    let meds = &catalog.templates()[1];
    assert_eq!(meds.id, QuestionId::from("meds-decade"));
    assert_eq!(meds.package, PackageId::from("course-30"));
    assert_eq!(meds.kind, QuestionKind::YesNo);
    assert_eq!(meds.interval_days, 10);
    assert_eq!(meds.delay_days, 10);
}

#[test]
fn delay_days_defaults_to_zero() {
    let catalog = Catalog::parse(SAMPLE).unwrap();
    assert_eq!(catalog.templates()[0].delay_days, 0);
}

#[test]
fn empty_catalog_is_valid() {
    let catalog = Catalog::parse("").unwrap();
    assert!(catalog.packages().is_empty());
    assert!(catalog.templates().is_empty());
}

#[test]
fn rejects_zero_interval() {
    let toml = r#"
        [[package]]
        id = "p"
        name = "p"
        duration_days = 30

          [[package.question]]
          id = "q"
          text = "?"
          kind = "yes_no"
          interval_days = 0
    "#;
    assert!(matches!(
        Catalog::parse(toml),
        Err(CatalogError::NonPositiveInterval(id, 0)) if id == QuestionId::from("q")
    ));
}

#[test]
fn rejects_zero_duration() {
    let toml = r#"
        [[package]]
        id = "p"
        name = "p"
        duration_days = 0
    "#;
    assert!(matches!(
        Catalog::parse(toml),
        Err(CatalogError::NonPositiveDuration(_, 0))
    ));
}

#[test]
fn rejects_choice_question_without_options() {
    let toml = r#"
        [[package]]
        id = "p"
        name = "p"
        duration_days = 30

          [[package.question]]
          id = "q"
          text = "?"
          kind = "multiple_choice"
          interval_days = 1
    "#;
    assert!(matches!(
        Catalog::parse(toml),
        Err(CatalogError::MissingOptions(_))
    ));
}

#[test]
fn rejects_duplicate_question_ids_across_packages() {
    let toml = r#"
        [[package]]
        id = "a"
        name = "a"
        duration_days = 30

          [[package.question]]
          id = "q"
          text = "?"
          kind = "yes_no"
          interval_days = 1

        [[package]]
        id = "b"
        name = "b"
        duration_days = 30

          [[package.question]]
          id = "q"
          text = "?"
          kind = "yes_no"
          interval_days = 1
    "#;
    assert!(matches!(
        Catalog::parse(toml),
        Err(CatalogError::DuplicateId(id)) if id == "q"
    ));
}
