use chrono::NaiveDate;

use super::item::ItemStatus;

/// Metadata predicate for item queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaFilter {
    /// The key is present, whatever its value.
    Exists { key: String },
    /// The key's value is a `YYYY-MM-DD` date strictly before `date`.
    /// Values that are not well-formed dates never match.
    DateBefore { key: String, date: NaiveDate },
}

/// Filter for [`ContentStore::query`](crate::store::ContentStore::query).
///
/// All fields are optional; an empty query matches every item.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub status: Option<ItemStatus>,
    pub meta: Option<MetaFilter>,
    /// Maximum number of items to return. `None` means no limit.
    pub limit: Option<usize>,
}

impl ItemQuery {
    pub fn with_status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn meta(mut self, meta: MetaFilter) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
