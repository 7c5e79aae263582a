//! Narrow interfaces onto the external storage engine.
//!
//! The lifecycle engine never talks to a database directly; it consumes
//! three seams (content items, site-wide options, the author directory)
//! as trait objects. Two backends are provided: an in-memory
//! one built on `DashMap`, and a SQLite one behind the `database-sqlite`
//! feature.

mod error;
mod memory;
#[cfg(feature = "database-sqlite")]
mod sqlite;

#[cfg(all(test, feature = "database-sqlite"))]
mod tests;

use async_trait::async_trait;
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryAuthors, MemoryOptions, MemoryStore};
#[cfg(feature = "database-sqlite")]
pub use sqlite::SqliteStore;

use crate::models::{AuthorId, Item, ItemId, ItemQuery, ItemStatus};

/// Content-item operations consumed by the lifecycle engine.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch items matching `query`. Returns an empty vector, not an error,
    /// when nothing matches.
    async fn query(&self, query: &ItemQuery) -> StoreResult<Vec<Item>>;

    /// Change an item's lifecycle status.
    ///
    /// Transitioning into [`ItemStatus::Trashed`] records the current Unix
    /// time under [`TRASH_TIME_META_KEY`](crate::models::TRASH_TIME_META_KEY);
    /// leaving the trash clears it.
    async fn set_status(&self, id: ItemId, status: ItemStatus) -> StoreResult<()>;

    /// Permanently remove an item and its metadata. Irreversible.
    async fn delete_permanently(&self, id: ItemId) -> StoreResult<()>;

    async fn get_metadata(&self, id: ItemId, key: &str) -> StoreResult<Option<String>>;

    async fn set_metadata(&self, id: ItemId, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a metadata key. Returns whether a value was present.
    async fn delete_metadata(&self, id: ItemId, key: &str) -> StoreResult<bool>;
}

/// Shared durable key-value options: retention period, admin email, and the
/// cron lock records all live here.
#[async_trait]
pub trait OptionStore: Send + Sync {
    async fn get_option(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_option(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove an option. Returns whether a value was present; deleting an
    /// absent option is not an error.
    async fn delete_option(&self, key: &str) -> StoreResult<bool>;
}

/// Lookup of author contact addresses.
#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    /// Registered email address for an author, if any.
    async fn email(&self, author: AuthorId) -> StoreResult<Option<String>>;
}
