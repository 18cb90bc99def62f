//! Persistence tests for the JSON file repository.

#![cfg(feature = "file-repo")]

mod support;

use std::sync::Arc;

use chrono::Weekday;
use colortime::db::repositories::FileRepository;
use colortime::db::repository::FullRepository;
use colortime::db::{DefaultDayRepository, TemplateRepository, WeekRepository};
use colortime::models::TemplateKey;
use colortime::runtime::SequentialIdGenerator;
use colortime::services::ColorTimeService;
use support::{date, hm, new_slot, teacher, template_slot, ACTOR, ORG, TERM};

async fn service_at(dir: &std::path::Path, first_id: u64) -> ColorTimeService {
    let repo = FileRepository::open(dir).await.unwrap();
    ColorTimeService::with_runtime(
        Arc::new(repo) as Arc<dyn FullRepository>,
        Arc::new(colortime::runtime::SystemClock),
        Arc::new(SequentialIdGenerator::starting_at(first_id)),
    )
}

#[tokio::test]
async fn test_open_creates_directory_and_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("nested").join("data");
    let repo = FileRepository::open(&dir).await.unwrap();

    assert!(dir.is_dir());
    assert!(repo.health_check().await.unwrap());
    assert!(repo.list_default_days(ORG).await.unwrap().is_empty());
    // Nothing is written until the first mutation.
    assert!(!repo.path().exists());
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();

    let (week_id, template_id) = {
        let service = service_at(tmp.path(), 1).await;
        let template = service
            .create_template_slot(template_slot(
                TemplateKey::Weekday(Weekday::Mon),
                new_slot("Circle time", hm(9, 0), 30),
            ))
            .await
            .unwrap();
        service
            .apply_template(ORG, TERM, date(2025, 3, 10), date(2025, 3, 16), ACTOR)
            .await
            .unwrap();
        let week = service
            .get_or_create_week(ORG, &teacher("t-1"), date(2025, 3, 10), date(2025, 3, 16))
            .await
            .unwrap();
        (week.week_id, template.template_id)
    };

    let reopened = FileRepository::open(tmp.path()).await.unwrap();
    let week = reopened.get_week(week_id).await.unwrap().unwrap();
    assert_eq!(week.days.len(), 7);
    assert_eq!(week.day(date(2025, 3, 10)).unwrap().blocks.len(), 1);
    assert!(reopened.get_template(template_id).await.unwrap().is_some());
    assert!(reopened
        .find_default_day(ORG, date(2025, 3, 10))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_reapplying_after_reopen_keeps_identities() {
    let tmp = tempfile::tempdir().unwrap();
    let first_slot = {
        let service = service_at(tmp.path(), 1).await;
        service
            .create_template_slot(template_slot(
                TemplateKey::Weekday(Weekday::Mon),
                new_slot("Circle time", hm(9, 0), 30),
            ))
            .await
            .unwrap();
        service
            .apply_template(ORG, TERM, date(2025, 3, 10), date(2025, 3, 10), ACTOR)
            .await
            .unwrap();
        let day = service
            .get_default_day(ORG, date(2025, 3, 10), None)
            .await
            .unwrap();
        day.blocks[0].slots[0].slot_id
    };

    let service = service_at(tmp.path(), 1_000).await;
    service
        .apply_template(ORG, TERM, date(2025, 3, 10), date(2025, 3, 10), ACTOR)
        .await
        .unwrap();
    let day = service
        .get_default_day(ORG, date(2025, 3, 10), None)
        .await
        .unwrap();
    assert_eq!(day.blocks.len(), 1);
    assert_eq!(day.blocks[0].slots.len(), 1);
    assert_eq!(day.blocks[0].slots[0].slot_id, first_slot);
}

#[tokio::test]
async fn test_corrupt_snapshot_is_a_serialization_error() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(colortime::db::repositories::file::SNAPSHOT_FILE),
        b"{ not json",
    )
    .unwrap();

    let err = FileRepository::open(tmp.path()).await.err().unwrap();
    assert!(matches!(
        err,
        colortime::db::RepositoryError::SerializationError { .. }
    ));
}
