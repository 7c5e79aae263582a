//! SQLite-backed storage engine.
//!
//! One pool serves all three seams: items, options, and authors. Queries
//! use runtime binding so the schema lives entirely in the migration files.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use super::{
    AuthorDirectory, ContentStore, OptionStore, StoreError, StoreResult,
};
use crate::{
    clock::Clock,
    config::SqliteConfig,
    models::{AuthorId, Item, ItemId, ItemQuery, ItemStatus, MetaFilter, TRASH_TIME_META_KEY},
};

/// Matches well-formed `YYYY-MM-DD` metadata values; anything else never
/// satisfies a date comparison.
const DATE_GLOB: &str = "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]";

pub struct SqliteStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Open (or create) the database described by `config`.
    pub async fn connect(config: &SqliteConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&config.path)
                    .create_if_missing(config.create_if_missing)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
                    .foreign_keys(true),
            )
            .await?;
        Ok(Self::new(pool, clock))
    }

    /// Create or update the schema.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        tracing::info!("Running SQLite migrations");
        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new item, returning its assigned id.
    pub async fn insert_item(
        &self,
        title: &str,
        author: AuthorId,
        status: ItemStatus,
    ) -> StoreResult<ItemId> {
        let result = sqlx::query("INSERT INTO items (title, author_id, status) VALUES (?, ?, ?)")
            .bind(title)
            .bind(author)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Insert an author, returning the assigned id.
    pub async fn insert_author(&self, email: Option<&str>) -> StoreResult<AuthorId> {
        let result = sqlx::query("INSERT INTO authors (email) VALUES (?)")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn item_exists(&self, id: ItemId) -> StoreResult<bool> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    fn item_from_row(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Item> {
        let status: String = row.get("status");
        let status = status
            .parse::<ItemStatus>()
            .map_err(StoreError::Internal)?;
        Ok(Item {
            id: row.get("id"),
            title: row.get("title"),
            author: row.get("author_id"),
            status,
        })
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn query(&self, query: &ItemQuery) -> StoreResult<Vec<Item>> {
        let mut sql =
            String::from("SELECT i.id, i.title, i.author_id, i.status FROM items i");

        match &query.meta {
            Some(MetaFilter::Exists { .. }) => {
                sql.push_str(" JOIN item_meta m ON m.item_id = i.id AND m.meta_key = ?");
            }
            Some(MetaFilter::DateBefore { .. }) => {
                sql.push_str(
                    " JOIN item_meta m ON m.item_id = i.id AND m.meta_key = ? \
                     AND m.meta_value GLOB ? AND m.meta_value < ?",
                );
            }
            None => {}
        }
        if query.status.is_some() {
            sql.push_str(" WHERE i.status = ?");
        }
        sql.push_str(" ORDER BY i.id DESC");
        if query.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        // Binds in placeholder order: meta join, status, limit.
        let mut q = sqlx::query(&sql);
        match &query.meta {
            Some(MetaFilter::Exists { key }) => {
                q = q.bind(key);
            }
            Some(MetaFilter::DateBefore { key, date }) => {
                q = q
                    .bind(key)
                    .bind(DATE_GLOB)
                    .bind(date.format("%Y-%m-%d").to_string());
            }
            None => {}
        }
        if let Some(status) = query.status {
            q = q.bind(status.as_str());
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit as i64);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(Self::item_from_row).collect()
    }

    async fn set_status(&self, id: ItemId, status: ItemStatus) -> StoreResult<()> {
        let current = sqlx::query_scalar::<_, String>("SELECT status FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        sqlx::query("UPDATE items SET status = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if status == ItemStatus::Trashed {
            if current != ItemStatus::Trashed.as_str() {
                sqlx::query(
                    "INSERT INTO item_meta (item_id, meta_key, meta_value) VALUES (?, ?, ?) \
                     ON CONFLICT (item_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
                )
                .bind(id)
                .bind(TRASH_TIME_META_KEY)
                .bind(self.clock.now_unix().to_string())
                .execute(&self.pool)
                .await?;
            }
        } else {
            sqlx::query("DELETE FROM item_meta WHERE item_id = ? AND meta_key = ?")
                .bind(id)
                .bind(TRASH_TIME_META_KEY)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    async fn delete_permanently(&self, id: ItemId) -> StoreResult<()> {
        sqlx::query("DELETE FROM item_meta WHERE item_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_metadata(&self, id: ItemId, key: &str) -> StoreResult<Option<String>> {
        if !self.item_exists(id).await? {
            return Err(StoreError::NotFound);
        }
        let value = sqlx::query_scalar::<_, String>(
            "SELECT meta_value FROM item_meta WHERE item_id = ? AND meta_key = ?",
        )
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set_metadata(&self, id: ItemId, key: &str, value: &str) -> StoreResult<()> {
        if !self.item_exists(id).await? {
            return Err(StoreError::NotFound);
        }
        sqlx::query(
            "INSERT INTO item_meta (item_id, meta_key, meta_value) VALUES (?, ?, ?) \
             ON CONFLICT (item_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_metadata(&self, id: ItemId, key: &str) -> StoreResult<bool> {
        if !self.item_exists(id).await? {
            return Err(StoreError::NotFound);
        }
        let result = sqlx::query("DELETE FROM item_meta WHERE item_id = ? AND meta_key = ?")
            .bind(id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OptionStore for SqliteStore {
    async fn get_option(&self, key: &str) -> StoreResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT option_value FROM options WHERE option_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set_option(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO options (option_key, option_value) VALUES (?, ?) \
             ON CONFLICT (option_key) DO UPDATE SET option_value = excluded.option_value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM options WHERE option_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AuthorDirectory for SqliteStore {
    async fn email(&self, author: AuthorId) -> StoreResult<Option<String>> {
        let email = sqlx::query_scalar::<_, Option<String>>(
            "SELECT email FROM authors WHERE id = ?",
        )
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;
        Ok(email.flatten().filter(|e| !e.is_empty()))
    }
}
