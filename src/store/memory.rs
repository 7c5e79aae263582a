//! In-memory backends built on `DashMap`.
//!
//! Single-process only: nothing here survives a restart, so the cron lock's
//! crash-expiry path never comes into play. Production deployments want the
//! SQLite backend; these types exist for tests and embedding.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use super::{
    AuthorDirectory, ContentStore, OptionStore, StoreError, StoreResult,
};
use crate::{
    clock::Clock,
    models::{AuthorId, Item, ItemId, ItemQuery, ItemStatus, MetaFilter, TRASH_TIME_META_KEY},
};

struct ItemRecord {
    item: Item,
    meta: HashMap<String, String>,
}

/// In-memory content store.
pub struct MemoryStore {
    items: DashMap<ItemId, ItemRecord>,
    next_id: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            items: DashMap::new(),
            next_id: AtomicI64::new(1),
            clock,
        }
    }

    /// Insert a new item, assigning the next free id.
    ///
    /// Items inserted directly as [`ItemStatus::Trashed`] carry no trash
    /// timestamp; only a status transition records one.
    pub fn insert(&self, title: &str, author: AuthorId, status: ItemStatus) -> ItemId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.items.insert(
            id,
            ItemRecord {
                item: Item {
                    id,
                    title: title.to_string(),
                    author,
                    status,
                },
                meta: HashMap::new(),
            },
        );
        id
    }

    /// Snapshot of a stored item, if present.
    pub fn get(&self, id: ItemId) -> Option<Item> {
        self.items.get(&id).map(|rec| rec.item.clone())
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    fn matches_meta(meta: &HashMap<String, String>, filter: &MetaFilter) -> bool {
        match filter {
            MetaFilter::Exists { key } => meta.contains_key(key),
            MetaFilter::DateBefore { key, date } => meta
                .get(key)
                .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
                .is_some_and(|value| value < *date),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn query(&self, query: &ItemQuery) -> StoreResult<Vec<Item>> {
        let mut matched: Vec<Item> = self
            .items
            .iter()
            .filter(|rec| {
                query
                    .status
                    .is_none_or(|status| rec.item.status == status)
                    && query
                        .meta
                        .as_ref()
                        .is_none_or(|filter| Self::matches_meta(&rec.meta, filter))
            })
            .map(|rec| rec.item.clone())
            .collect();

        // Newest first, matching the SQLite backend's default ordering.
        matched.sort_by_key(|item| std::cmp::Reverse(item.id));

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn set_status(&self, id: ItemId, status: ItemStatus) -> StoreResult<()> {
        let mut rec = self.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        let was_trashed = rec.item.status == ItemStatus::Trashed;
        rec.item.status = status;

        if status == ItemStatus::Trashed {
            if !was_trashed {
                let now = self.clock.now_unix();
                rec.meta
                    .insert(TRASH_TIME_META_KEY.to_string(), now.to_string());
            }
        } else {
            rec.meta.remove(TRASH_TIME_META_KEY);
        }

        Ok(())
    }

    async fn delete_permanently(&self, id: ItemId) -> StoreResult<()> {
        self.items
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn get_metadata(&self, id: ItemId, key: &str) -> StoreResult<Option<String>> {
        let rec = self.items.get(&id).ok_or(StoreError::NotFound)?;
        Ok(rec.meta.get(key).cloned())
    }

    async fn set_metadata(&self, id: ItemId, key: &str, value: &str) -> StoreResult<()> {
        let mut rec = self.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        rec.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_metadata(&self, id: ItemId, key: &str) -> StoreResult<bool> {
        let mut rec = self.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        Ok(rec.meta.remove(key).is_some())
    }
}

/// In-memory option store.
#[derive(Default)]
pub struct MemoryOptions {
    options: DashMap<String, String>,
}

impl MemoryOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionStore for MemoryOptions {
    async fn get_option(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.options.get(key).map(|v| v.value().clone()))
    }

    async fn set_option(&self, key: &str, value: &str) -> StoreResult<()> {
        self.options.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> StoreResult<bool> {
        Ok(self.options.remove(key).is_some())
    }
}

/// In-memory author directory.
#[derive(Default)]
pub struct MemoryAuthors {
    emails: DashMap<AuthorId, String>,
}

impl MemoryAuthors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, author: AuthorId, email: &str) {
        self.emails.insert(author, email.to_string());
    }
}

#[async_trait]
impl AuthorDirectory for MemoryAuthors {
    async fn email(&self, author: AuthorId) -> StoreResult<Option<String>> {
        Ok(self.emails.get(&author).map(|v| v.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        clock::ManualClock,
        models::LIFETIME_META_KEY,
    };

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new("2026-08-05T12:00:00Z".parse().unwrap()))
    }

    #[tokio::test]
    async fn query_filters_by_status_and_meta() {
        let store = MemoryStore::new(clock());
        let published = store.insert("a", 1, ItemStatus::Published);
        let draft = store.insert("b", 1, ItemStatus::Draft);
        store.insert("c", 1, ItemStatus::Trashed);

        store
            .set_metadata(published, LIFETIME_META_KEY, "2026-01-01")
            .await
            .unwrap();
        store
            .set_metadata(draft, LIFETIME_META_KEY, "2026-01-01")
            .await
            .unwrap();

        let q = ItemQuery::with_status(ItemStatus::Published).meta(MetaFilter::Exists {
            key: LIFETIME_META_KEY.to_string(),
        });
        let items = store.query(&q).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, published);
    }

    #[tokio::test]
    async fn date_before_is_strict_and_skips_garbage() {
        let store = MemoryStore::new(clock());
        let before = store.insert("before", 1, ItemStatus::Published);
        let on = store.insert("on", 1, ItemStatus::Published);
        let garbage = store.insert("garbage", 1, ItemStatus::Published);

        store
            .set_metadata(before, LIFETIME_META_KEY, "2026-08-04")
            .await
            .unwrap();
        store
            .set_metadata(on, LIFETIME_META_KEY, "2026-08-05")
            .await
            .unwrap();
        store
            .set_metadata(garbage, LIFETIME_META_KEY, "soon")
            .await
            .unwrap();

        let q = ItemQuery::default().meta(MetaFilter::DateBefore {
            key: LIFETIME_META_KEY.to_string(),
            date: "2026-08-05".parse().unwrap(),
        });
        let items = store.query(&q).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, before);
    }

    #[tokio::test]
    async fn query_orders_newest_first_and_respects_limit() {
        let store = MemoryStore::new(clock());
        for i in 0..5 {
            store.insert(&format!("item {}", i), 1, ItemStatus::Published);
        }

        let items = store
            .query(&ItemQuery::with_status(ItemStatus::Published).limit(3))
            .await
            .unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn trashing_records_timestamp_and_restore_clears_it() {
        let c = clock();
        let store = MemoryStore::new(c.clone());
        let id = store.insert("a", 1, ItemStatus::Published);

        store.set_status(id, ItemStatus::Trashed).await.unwrap();
        let stamped = store
            .get_metadata(id, TRASH_TIME_META_KEY)
            .await
            .unwrap()
            .expect("trash time recorded");
        assert_eq!(stamped, c.now_unix().to_string());

        // Re-trashing keeps the original timestamp.
        c.advance(Duration::seconds(100));
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
    }

    #[tokio::test]
    async fn delete_permanently_removes_item_and_meta() {
        let store = MemoryStore::new(clock());
        let id = store.insert("a", 1, ItemStatus::Trashed);
        store
            .set_metadata(id, LIFETIME_META_KEY, "2026-01-01")
            .await
            .unwrap();

        store.delete_permanently(id).await.unwrap();
        assert!(!store.contains(id));
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
    async fn options_round_trip() {
        let options = MemoryOptions::new();
        assert_eq!(options.get_option("k").await.unwrap(), None);

        options.set_option("k", "v").await.unwrap();
        assert_eq!(options.get_option("k").await.unwrap(), Some("v".into()));

        assert!(options.delete_option("k").await.unwrap());
        assert!(!options.delete_option("k").await.unwrap());
    }
}
