// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
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

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

fn instance(id: &str, at: DateTime<Utc>) -> ScheduledInstance {
    ScheduledInstance::new(
        InstanceId::from(id),
        ck_core::EnrollmentId::from("enr-1"),
        QuestionId::from("q-mood"),
        at,
    )
}

async fn seeded_store(store: &Store) {
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
            id: ck_core::EnrollmentId::from("enr-1"),
            user: UserId(7),
            package: PackageId::from("course-30"),
            start_date: day(0),
        })
        .await
        .unwrap();
    store
        .create_instances(vec![instance("inst-1", day(1)), instance("inst-2", day(2))])
        .await
        .unwrap();
}

#[tokio::test]
async fn mark_sent_commits_once() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());
    seeded_store(&store).await;

    let first = store
        .mark_sent(&InstanceId::from("inst-1"), day(1))
        .await
        .unwrap();
    assert_eq!(first, MarkOutcome::Marked);

    // A second caller loses
    let second = store
        .mark_sent(&InstanceId::from("inst-1"), day(1))
        .await
        .unwrap();
    assert_eq!(second, MarkOutcome::Conflict);

    let due = store.find_due_unsent(day(2)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].instance.id, InstanceId::from("inst-2"));
}

#[tokio::test]
async fn mark_sent_on_unknown_instance_fails() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());
    let result = store.mark_sent(&InstanceId::from("ghost"), day(1)).await;
    assert!(matches!(result, Err(GatewayError::UnknownInstance(_))));
}

#[tokio::test]
async fn create_instances_is_all_or_nothing() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());
    seeded_store(&store).await;

    // Second entry collides with an existing occurrence; nothing from the
    // batch may land.
    let result = store
        .create_instances(vec![instance("inst-3", day(3)), instance("inst-dup", day(1))])
        .await;
    assert!(matches!(
        result,
        Err(GatewayError::DuplicateInstance { .. })
    ));

    let due = store.find_due_unsent(day(30)).await.unwrap();
    let ids: Vec<&str> = due.iter().map(|d| d.instance.id.0.as_str()).collect();
    assert_eq!(ids, vec!["inst-1", "inst-2"]);
}

#[tokio::test]
async fn create_instances_rejects_in_batch_duplicates() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());
    seeded_store(&store).await;

    let result = store
        .create_instances(vec![instance("inst-a", day(5)), instance("inst-b", day(5))])
        .await;
    assert!(matches!(
        result,
        Err(GatewayError::DuplicateInstance { .. })
    ));
}

#[tokio::test]
async fn create_instances_requires_enrollment() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());
    let result = store.create_instances(vec![instance("inst-1", day(1))]).await;
    assert!(matches!(result, Err(GatewayError::UnknownEnrollment(_))));
}

#[tokio::test]
async fn record_answer_outcomes() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());
    seeded_store(&store).await;

    let answer = Answer {
        instance: InstanceId::from("inst-1"),
        text: "Yes".to_string(),
        answered_time: day(2),
    };

    // Unsent instances take no answers
    assert_eq!(
        store.record_answer(answer.clone()).await.unwrap(),
        RecordOutcome::NotSent
    );

    store
        .mark_sent(&InstanceId::from("inst-1"), day(1))
        .await
        .unwrap();
    assert_eq!(
        store.record_answer(answer.clone()).await.unwrap(),
        RecordOutcome::Recorded
    );
    assert_eq!(
        store.record_answer(answer).await.unwrap(),
        RecordOutcome::Duplicate
    );
}

#[tokio::test]
async fn reopened_store_replays_committed_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let wal_path = dir.path().join("ops.wal");
    let catalog = Catalog::parse(CATALOG).unwrap();

    {
        let store = Store::open(&catalog, &wal_path).unwrap();
        seeded_store(&store).await;
        store
            .mark_sent(&InstanceId::from("inst-1"), day(1))
            .await
            .unwrap();
    }

    let store = Store::open(&catalog, &wal_path).unwrap();
    let counts = store.counts();
    assert_eq!(counts.users, 1);
    assert_eq!(counts.enrollments, 1);
    assert_eq!(counts.instances, 2);

    // The committed transition survived the restart
    assert_eq!(
        store
            .mark_sent(&InstanceId::from("inst-1"), day(3))
            .await
            .unwrap(),
        MarkOutcome::Conflict
    );
    let due = store.find_due_unsent(day(5)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].instance.id, InstanceId::from("inst-2"));
}

#[tokio::test]
async fn template_source_serves_catalog() {
    let store = Store::in_memory(&Catalog::parse(CATALOG).unwrap());

    let packages = store.packages().await.unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "1 month");

    let template = store
        .template(&QuestionId::from("q-mood"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(template.package, PackageId::from("course-30"));

    assert!(store
        .template(&QuestionId::from("q-ghost"))
        .await
        .unwrap()
        .is_none());
}
