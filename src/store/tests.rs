//! SQLite backend tests against an in-memory database with real migrations.

use std::sync::Arc;

use chrono::Duration;

use super::*;
use crate::{
    clock::{Clock, ManualClock},
    models::{ItemQuery, ItemStatus, LIFETIME_META_KEY, MetaFilter, TRASH_TIME_META_KEY},
};

async fn store() -> (SqliteStore, Arc<ManualClock>) {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    let clock = Arc::new(ManualClock::new("2026-08-05T12:00:00Z".parse().unwrap()));
    let store = SqliteStore::new(pool, clock.clone());
    store.run_migrations().await.expect("Failed to run migrations");
    (store, clock)
}

#[tokio::test]
async fn insert_and_query_by_status() {
    let (store, _clock) = store().await;
    let a = store
        .insert_item("a", 1, ItemStatus::Published)
        .await
        .unwrap();
    let b = store
        .insert_item("b", 1, ItemStatus::Published)
        .await
        .unwrap();
    store.insert_item("c", 1, ItemStatus::Trashed).await.unwrap();

    let items = store
        .query(&ItemQuery::with_status(ItemStatus::Published))
        .await
        .unwrap();
    let ids: Vec<_> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![b, a]);
}

#[tokio::test]
async fn date_before_matches_lexically_and_guards_format() {
    let (store, _clock) = store().await;
    let expired = store
        .insert_item("expired", 1, ItemStatus::Published)
        .await
        .unwrap();
    let today = store
        .insert_item("today", 1, ItemStatus::Published)
        .await
        .unwrap();
    let garbage = store
        .insert_item("garbage", 1, ItemStatus::Published)
        .await
        .unwrap();
    let unset = store
        .insert_item("unset", 1, ItemStatus::Published)
        .await
        .unwrap();

    store
        .set_metadata(expired, LIFETIME_META_KEY, "2026-08-04")
        .await
        .unwrap();
    store
        .set_metadata(today, LIFETIME_META_KEY, "2026-08-05")
        .await
        .unwrap();
    store
        .set_metadata(garbage, LIFETIME_META_KEY, "someday")
        .await
        .unwrap();
    let _ = unset;

    let items = store
        .query(&ItemQuery::default().meta(MetaFilter::DateBefore {
            key: LIFETIME_META_KEY.to_string(),
            date: "2026-08-05".parse().unwrap(),
        }))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, expired);
}

#[tokio::test]
async fn exists_filter_and_limit() {
    let (store, _clock) = store().await;
    for i in 0..4 {
        let id = store
            .insert_item(&format!("item {}", i), 1, ItemStatus::Trashed)
            .await
            .unwrap();
        if i % 2 == 0 {
            store
                .set_metadata(id, LIFETIME_META_KEY, "2030-01-01")
                .await
                .unwrap();
        }
    }

    let items = store
        .query(
            &ItemQuery::with_status(ItemStatus::Trashed)
                .meta(MetaFilter::Exists {
                    key: LIFETIME_META_KEY.to_string(),
                })
                .limit(1),
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "item 2");
}

#[tokio::test]
async fn trash_transition_stamps_and_restore_clears() {
    let (store, clock) = store().await;
    let id = store
        .insert_item("a", 1, ItemStatus::Published)
        .await
        .unwrap();

    store.set_status(id, ItemStatus::Trashed).await.unwrap();
    let stamped = store
        .get_metadata(id, TRASH_TIME_META_KEY)
        .await
        .unwrap()
        .expect("trash time recorded");
    assert_eq!(stamped, clock.now_unix().to_string());

    clock.advance(Duration::seconds(60));
    store.set_status(id, ItemStatus::Trashed).await.unwrap();
    assert_eq!(
        store.get_metadata(id, TRASH_TIME_META_KEY).await.unwrap(),
        Some(stamped)
    );

    store.set_status(id, ItemStatus::Published).await.unwrap();
    assert_eq!(
        store.get_metadata(id, TRASH_TIME_META_KEY).await.unwrap(),
        None
    );
    assert!(matches!(
        store.set_status(9999, ItemStatus::Trashed).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn delete_permanently_removes_row_and_meta() {
    let (store, _clock) = store().await;
    let id = store
        .insert_item("a", 1, ItemStatus::Trashed)
        .await
        .unwrap();
    store
        .set_metadata(id, LIFETIME_META_KEY, "2026-01-01")
        .await
        .unwrap();

    store.delete_permanently(id).await.unwrap();
    assert!(matches!(
        store.get_metadata(id, LIFETIME_META_KEY).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        store.delete_permanently(id).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn metadata_round_trip_and_delete() {
    let (store, _clock) = store().await;
    let id = store
        .insert_item("a", 1, ItemStatus::Published)
        .await
        .unwrap();

    assert_eq!(store.get_metadata(id, "k").await.unwrap(), None);
    store.set_metadata(id, "k", "v1").await.unwrap();
    store.set_metadata(id, "k", "v2").await.unwrap();
    assert_eq!(store.get_metadata(id, "k").await.unwrap(), Some("v2".into()));

    assert!(store.delete_metadata(id, "k").await.unwrap());
    assert!(!store.delete_metadata(id, "k").await.unwrap());
}

#[tokio::test]
async fn options_round_trip() {
    let (store, _clock) = store().await;
    assert_eq!(store.get_option("k").await.unwrap(), None);

    store.set_option("k", "v1").await.unwrap();
    store.set_option("k", "v2").await.unwrap();
    assert_eq!(store.get_option("k").await.unwrap(), Some("v2".into()));

    assert!(store.delete_option("k").await.unwrap());
    assert!(!store.delete_option("k").await.unwrap());
}

#[tokio::test]
async fn author_emails_treat_null_and_empty_as_absent() {
    let (store, _clock) = store().await;
    let with_email = store.insert_author(Some("author@example.com")).await.unwrap();
    let without = store.insert_author(None).await.unwrap();
    let empty = store.insert_author(Some("")).await.unwrap();

    assert_eq!(
        store.email(with_email).await.unwrap(),
        Some("author@example.com".into())
    );
    assert_eq!(store.email(without).await.unwrap(), None);
    assert_eq!(store.email(empty).await.unwrap(), None);
    assert_eq!(store.email(9999).await.unwrap(), None);
}
