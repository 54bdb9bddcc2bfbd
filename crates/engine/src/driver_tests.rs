// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ck_adapters::FakeChannel;
use ck_core::model::{Enrollment, EnrollmentId, QuestionId, ScheduledInstance, User, UserId};
use ck_core::{Catalog, FakeClock, Gateway, InstanceId, PackageId};
use ck_storage::Store;
use chrono::TimeZone;

const CATALOG: &str = r#"
[[package]]
id = "course-30"
name = "1 month"
duration_days = 30

  [[package.question]]
  id = "q-mood"
  text = "How are you feeling today?"
  kind = "yes_no"
  interval_days = 1
"#;

fn day(n: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(n)
}

#[test]
fn stop_signal_is_shared_across_clones() {
    let stop = StopSignal::new();
    let clone = stop.clone();
    assert!(!clone.is_stopped());

    stop.trigger();
    assert!(clone.is_stopped());
}

#[tokio::test(start_paused = true)]
async fn driver_sends_due_work_once_and_stops_on_shutdown() {
    let store = Arc::new(Store::in_memory(&Catalog::parse(CATALOG).unwrap()));
    store
        .upsert_user(User {
            id: UserId(7),
            full_name: "Aliya".to_string(),
            username: None,
            created_at: day(0),
        })
        .await
        .unwrap();
    store
        .create_enrollment(Enrollment {
            id: EnrollmentId::from("enr-1"),
            user: UserId(7),
            package: PackageId::from("course-30"),
            start_date: day(0),
        })
        .await
        .unwrap();
    store
        .create_instances(vec![ScheduledInstance::new(
            InstanceId::from("inst-1"),
            EnrollmentId::from("enr-1"),
            QuestionId::from("q-mood"),
            day(0),
        )])
        .await
        .unwrap();

    let channel = FakeChannel::new();
    let clock = FakeClock::at(day(0));
    let config = DispatchConfig {
        due_check_interval: Duration::from_secs(60),
        reminder_check_interval: Duration::from_secs(3600),
        reminder_threshold: Duration::from_secs(24 * 3600),
        send_timeout: Duration::from_secs(10),
    };

    let driver = Driver::new(
        Arc::clone(&store),
        Arc::clone(&store),
        channel.clone(),
        clock.clone(),
        &config,
    );
    let stop = driver.stop_signal();

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(driver.run(rx));

    // Let several due ticks elapse on the paused runtime clock
    tokio::time::sleep(Duration::from_secs(310)).await;

    tx.send(true).unwrap();
    handle.await.unwrap();
    assert!(stop.is_stopped());

    // Many ticks, one delivery: already-sent work is never re-sent
    assert_eq!(channel.calls().len(), 1);
    let outcome = store.mark_sent(&InstanceId::from("inst-1"), day(0)).await;
    assert!(matches!(outcome, Ok(ck_core::MarkOutcome::Conflict)));
}

#[tokio::test(start_paused = true)]
async fn driver_first_tick_fires_immediately() {
    let store = Arc::new(Store::in_memory(&Catalog::parse(CATALOG).unwrap()));
    store
        .upsert_user(User {
            id: UserId(7),
            full_name: "Aliya".to_string(),
            username: None,
            created_at: day(0),
        })
        .await
        .unwrap();
    store
        .create_enrollment(Enrollment {
            id: EnrollmentId::from("enr-1"),
            user: UserId(7),
            package: PackageId::from("course-30"),
            start_date: day(0),
        })
        .await
        .unwrap();
    store
        .create_instances(vec![ScheduledInstance::new(
            InstanceId::from("inst-1"),
            EnrollmentId::from("enr-1"),
            QuestionId::from("q-mood"),
            day(0),
        )])
        .await
        .unwrap();

    let channel = FakeChannel::new();
    let clock = FakeClock::at(day(0));
    let config = DispatchConfig {
        due_check_interval: Duration::from_secs(3600),
        reminder_check_interval: Duration::from_secs(3600),
        reminder_threshold: Duration::from_secs(24 * 3600),
        send_timeout: Duration::from_secs(10),
    };

    let driver = Driver::new(
        Arc::clone(&store),
        Arc::clone(&store),
        channel.clone(),
        clock,
        &config,
    );

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(driver.run(rx));

    // Well under one interval: the catch-up tick already delivered
    tokio::time::sleep(Duration::from_secs(1)).await;
    tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(channel.calls().len(), 1);
}
