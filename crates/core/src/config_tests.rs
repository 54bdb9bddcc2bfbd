// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_use_minute_and_day_cadences() {
    let config = DispatchConfig::default();
    assert_eq!(config.due_check_interval, Duration::from_secs(300));
    assert_eq!(config.reminder_check_interval, Duration::from_secs(86400));
    assert_eq!(config.reminder_threshold, Duration::from_secs(86400));
    assert_eq!(config.send_timeout, Duration::from_secs(10));
}

#[test]
fn parses_humantime_durations() {
    let config = DispatchConfig::parse(
        r#"
        due_check_interval = "1m"
        reminder_check_interval = "2h"
        reminder_threshold = "36h"
        send_timeout = "5s"
        "#,
    )
    .unwrap();

    assert_eq!(config.due_check_interval, Duration::from_secs(60));
    assert_eq!(config.reminder_check_interval, Duration::from_secs(7200));
    assert_eq!(config.reminder_threshold, Duration::from_secs(129_600));
    assert_eq!(config.send_timeout, Duration::from_secs(5));
}

#[test]
fn partial_config_keeps_defaults_for_the_rest() {
    let config = DispatchConfig::parse(r#"due_check_interval = "30s""#).unwrap();
    assert_eq!(config.due_check_interval, Duration::from_secs(30));
    assert_eq!(
        config.reminder_threshold,
        DispatchConfig::default().reminder_threshold
    );
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(DispatchConfig::parse(r#"due_interval = "30s""#).is_err());
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = DispatchConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, DispatchConfig::default());
}
