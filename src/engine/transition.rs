use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    admin::{RetentionSetting, render_edit_link},
    clock::Clock,
    lock::{CronLock, DEFAULT_LOCK_DURATION, LockOutcome},
    models::{Item, ItemQuery, ItemStatus, TRASH_TIME_META_KEY},
    notify::{Notifier, trash_notice},
    query::LifecycleQuery,
    store::{AuthorDirectory, ContentStore, OptionStore},
};

/// Job key gating and scheduling the daily lifecycle run.
pub const JOB_NAME: &str = "posts_lifetime";

/// Option key for the site-wide fallback notification address.
pub const ADMIN_EMAIL_OPTION: &str = "admin_email";

const DEFAULT_EDIT_URL: &str = "/admin/items/{id}/edit";

/// Terminal state of one `process()` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Both phases executed and the lock was released.
    Completed,
    /// Another run held the lock; nothing was touched.
    Skipped,
}

/// Accounting for a single `process()` invocation.
#[derive(Debug)]
pub struct ProcessResult {
    pub state: RunState,
    /// Items moved to the trash by the expiring phase.
    pub trashed: u64,
    /// Trash notices successfully handed to the transport.
    pub notices_sent: u64,
    /// Items permanently deleted by the purging phase.
    pub purged: u64,
}

impl ProcessResult {
    fn skipped() -> Self {
        Self {
            state: RunState::Skipped,
            trashed: 0,
            notices_sent: 0,
            purged: 0,
        }
    }

    pub fn has_mutations(&self) -> bool {
        self.trashed > 0 || self.purged > 0
    }
}

/// Orchestrates the two lifecycle transitions under the cron lock.
///
/// All collaborators are injected at construction; the engine holds no
/// global state and can be instantiated per tenant. Engines sharing one
/// option store also share the lock and serialize their runs.
pub struct TransitionEngine {
    store: Arc<dyn ContentStore>,
    options: Arc<dyn OptionStore>,
    authors: Arc<dyn AuthorDirectory>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    queries: LifecycleQuery,
    retention: RetentionSetting,
    lock: CronLock,
    lock_duration: Duration,
    edit_url: String,
}

impl TransitionEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        options: Arc<dyn OptionStore>,
        authors: Arc<dyn AuthorDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queries: LifecycleQuery::new(store.clone()),
            retention: RetentionSetting::new(options.clone()),
            lock: CronLock::new(JOB_NAME, options.clone(), clock.clone()),
            store,
            options,
            authors,
            notifier,
            clock,
            lock_duration: DEFAULT_LOCK_DURATION,
            edit_url: DEFAULT_EDIT_URL.to_string(),
        }
    }

    pub fn with_lock_duration(mut self, duration: Duration) -> Self {
        self.lock_duration = duration;
        self
    }

    pub fn with_edit_url(mut self, template: impl Into<String>) -> Self {
        self.edit_url = template.into();
        self
    }

    /// Run one lifecycle pass.
    ///
    /// The pre-check is a cheap early exit; `run_exclusive` checks again
    /// when it takes the lock. The expiring phase fully completes before
    /// the purging phase starts, and the lock is released whatever either
    /// phase did.
    ///
    /// Retention applies uniformly: every trashed item old enough is
    /// purged, whether or not it ever carried a lifetime date.
    pub async fn process(&self) -> ProcessResult {
        if self.lock.is_locked().await {
            tracing::debug!(job = JOB_NAME, "Lifecycle run skipped, lock held");
            return ProcessResult::skipped();
        }

        let outcome = self
            .lock
            .run_exclusive(self.lock_duration, || async {
                let (trashed, notices_sent) = self.trash_expired_items().await;
                let purged = self.purge_trashed_items().await;
                (trashed, notices_sent, purged)
            })
            .await;

        match outcome {
            LockOutcome::Contended => {
                tracing::debug!(job = JOB_NAME, "Lifecycle run skipped, lock contended");
                ProcessResult::skipped()
            }
            LockOutcome::Completed((trashed, notices_sent, purged)) => ProcessResult {
                state: RunState::Completed,
                trashed,
                notices_sent,
                purged,
            },
        }
    }

    /// Expiring phase: move expired items to the trash and notify authors.
    ///
    /// Idempotent across runs: an item already trashed no longer matches
    /// the published-only query. Failures are per-item: an item that cannot
    /// be transitioned or notified is logged and the loop moves on.
    async fn trash_expired_items(&self) -> (u64, u64) {
        let today = self.clock.today();
        let expiring = match self.queries.find_expiring(today, None).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query expiring items");
                return (0, 0);
            }
        };
        if expiring.is_empty() {
            return (0, 0);
        }

        let retention_days = self.retention.get().await;
        let mut trashed = 0u64;
        let mut notices_sent = 0u64;

        for item in expiring {
            if let Err(e) = self.store.set_status(item.id, ItemStatus::Trashed).await {
                tracing::error!(item = item.id, error = %e, "Failed to trash expired item");
                continue;
            }
            trashed += 1;
            tracing::debug!(item = item.id, title = %item.title, "Trashed expired item");

            if self.notify_author(&item, retention_days).await {
                notices_sent += 1;
            }
        }

        (trashed, notices_sent)
    }

    /// Resolve a notification address for `item` and send the trash notice.
    ///
    /// The author's registered address wins; the site admin address is the
    /// fallback. Returns false when no address resolves or the transport
    /// fails; the transition above stands either way.
    async fn notify_author(&self, item: &Item, retention_days: u32) -> bool {
        let address = match self.authors.email(item.author).await {
            Ok(Some(email)) => Some(email),
            Ok(None) => self.admin_email().await,
            Err(e) => {
                tracing::warn!(
                    item = item.id,
                    author = item.author,
                    error = %e,
                    "Failed to look up author email"
                );
                self.admin_email().await
            }
        };
        let Some(address) = address else {
            tracing::debug!(item = item.id, "No notification address resolved");
            return false;
        };

        let edit_link = render_edit_link(&self.edit_url, item.id);
        let (subject, body) = trash_notice(&item.title, retention_days, &edit_link);
        if self.notifier.send(&address, &subject, &body).await {
            true
        } else {
            tracing::warn!(item = item.id, to = %address, "Trash notice delivery failed");
            false
        }
    }

    async fn admin_email(&self) -> Option<String> {
        match self.options.get_option(ADMIN_EMAIL_OPTION).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read admin email");
                None
            }
        }
    }

    /// Purging phase: permanently delete trashed items past the retention
    /// window. Returns the number purged.
    ///
    /// A threshold computation failure aborts this phase alone; items whose
    /// trash timestamp is missing or malformed are skipped as expected data
    /// variance.
    async fn purge_trashed_items(&self) -> u64 {
        let retention_days = self.retention.get().await;
        let threshold = match chrono::Duration::try_days(i64::from(retention_days))
            .and_then(|d| self.clock.now_utc().checked_sub_signed(d))
        {
            Some(threshold) => threshold,
            None => {
                tracing::error!(retention_days, "Failed to compute purge threshold");
                return 0;
            }
        };

        let trashed = match self
            .store
            .query(&ItemQuery::with_status(ItemStatus::Trashed))
            .await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query trashed items");
                return 0;
            }
        };

        let mut purged = 0u64;
        for item in trashed {
            let raw = match self.store.get_metadata(item.id, TRASH_TIME_META_KEY).await {
                Ok(Some(raw)) => raw,
                // Trashed through some other path; not a purge candidate.
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(item = item.id, error = %e, "Failed to read trash timestamp");
                    continue;
                }
            };
            let Ok(ts) = raw.trim().parse::<i64>() else {
                continue;
            };
            let Some(trashed_at) = DateTime::<Utc>::from_timestamp(ts, 0) else {
                continue;
            };

            if trashed_at < threshold {
                match self.store.delete_permanently(item.id).await {
                    Ok(()) => {
                        purged += 1;
                        tracing::debug!(item = item.id, title = %item.title, "Purged trashed item");
                    }
                    Err(e) => {
                        tracing::error!(item = item.id, error = %e, "Failed to purge trashed item");
                    }
                }
            }
        }

        purged
    }
}
