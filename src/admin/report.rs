use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{RetentionSetting, render_edit_link};
use crate::{
    models::{ItemId, TRASH_TIME_META_KEY},
    query::{DEFAULT_TRASHED_REPORT_LIMIT, LifecycleQuery},
    store::{ContentStore, OptionStore, StoreResult},
};

/// One trashed item in the dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct TrashReportEntry {
    pub id: ItemId,
    pub title: String,
    pub edit_link: String,
    /// When the item entered the trash, if the storage engine recorded it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trashed_at: Option<DateTime<Utc>>,
}

/// Read-only view of the most recent trashed items carrying a lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct TrashReport {
    pub retention_days: u32,
    pub entries: Vec<TrashReportEntry>,
}

/// Builds [`TrashReport`]s for the dashboard collaborator.
pub struct TrashReporter {
    store: Arc<dyn ContentStore>,
    queries: LifecycleQuery,
    retention: RetentionSetting,
    edit_url: String,
}

impl TrashReporter {
    pub fn new(
        store: Arc<dyn ContentStore>,
        options: Arc<dyn OptionStore>,
        edit_url: impl Into<String>,
    ) -> Self {
        Self {
            queries: LifecycleQuery::new(store.clone()),
            retention: RetentionSetting::new(options),
            store,
            edit_url: edit_url.into(),
        }
    }

    /// Up to [`DEFAULT_TRASHED_REPORT_LIMIT`] trashed items with the
    /// lifetime field, newest first.
    pub async fn build(&self) -> StoreResult<TrashReport> {
        let items = self
            .queries
            .find_trashed_with_lifetime(DEFAULT_TRASHED_REPORT_LIMIT)
            .await?;
        let retention_days = self.retention.get().await;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let trashed_at = self
                .store
                .get_metadata(item.id, TRASH_TIME_META_KEY)
                .await?
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .and_then(|ts| DateTime::from_timestamp(ts, 0));
            entries.push(TrashReportEntry {
                edit_link: render_edit_link(&self.edit_url, item.id),
                id: item.id,
                title: item.title,
                trashed_at,
            });
        }

        Ok(TrashReport {
            retention_days,
            entries,
        })
    }
}
