//! Read-only lifecycle queries over the content store.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    models::{Item, ItemQuery, ItemStatus, LIFETIME_META_KEY, MetaFilter},
    store::{ContentStore, StoreResult},
};

/// Default number of rows returned by
/// [`LifecycleQuery::find_trashed_with_lifetime`].
pub const DEFAULT_TRASHED_REPORT_LIMIT: usize = 10;

/// Typed wrapper for the two queries the lifecycle engine and the reporting
/// surface need.
#[derive(Clone)]
pub struct LifecycleQuery {
    store: Arc<dyn ContentStore>,
}

impl LifecycleQuery {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Published items whose expiration date lies strictly before `as_of`.
    ///
    /// An item expiring on `as_of` itself is not yet expired. `limit`
    /// defaults to unbounded.
    pub async fn find_expiring(
        &self,
        as_of: NaiveDate,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Item>> {
        let query = ItemQuery {
            status: Some(ItemStatus::Published),
            meta: Some(MetaFilter::DateBefore {
                key: LIFETIME_META_KEY.to_string(),
                date: as_of,
            }),
            limit,
        };
        self.store.query(&query).await
    }

    /// Trashed items that carry the lifetime key at all, newest first.
    ///
    /// Reporting only: the purge decision never consults this query.
    pub async fn find_trashed_with_lifetime(&self, limit: usize) -> StoreResult<Vec<Item>> {
        let query = ItemQuery::with_status(ItemStatus::Trashed)
            .meta(MetaFilter::Exists {
                key: LIFETIME_META_KEY.to_string(),
            })
            .limit(limit);
        self.store.query(&query).await
    }
}
