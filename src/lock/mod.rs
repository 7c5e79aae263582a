//! Named, time-bounded mutual exclusion for recurring jobs.
//!
//! A lock is one option-store record, `cron_lock_<job>`, holding a Unix
//! expiry timestamp. Readers treat an expired record as unlocked, so a lock
//! left behind by a crashed run heals itself after its duration elapses;
//! no cleanup pass exists or is needed.
//!
//! Lock operations never propagate errors. A store failure during `acquire`
//! degrades to `false` and the caller skips that run; the worst case is one
//! missed daily pass.

use std::{future::Future, sync::Arc, time::Duration};

use crate::{clock::Clock, store::OptionStore};

/// Default duration a job run holds its lock.
pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(300);

const LOCK_OPTION_PREFIX: &str = "cron_lock_";

/// Outcome of [`CronLock::run_exclusive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome<T> {
    /// Another run holds the lock; the protected block did not execute.
    Contended,
    /// The protected block ran (successfully or not) and the lock was
    /// released.
    Completed(T),
}

impl<T> LockOutcome<T> {
    pub fn is_contended(&self) -> bool {
        matches!(self, LockOutcome::Contended)
    }

    pub fn into_completed(self) -> Option<T> {
        match self {
            LockOutcome::Contended => None,
            LockOutcome::Completed(value) => Some(value),
        }
    }
}

/// Time-bounded mutual exclusion marker for one job type.
pub struct CronLock {
    options: Arc<dyn OptionStore>,
    clock: Arc<dyn Clock>,
    job: String,
    option_key: String,
}

impl CronLock {
    pub fn new(job: &str, options: Arc<dyn OptionStore>, clock: Arc<dyn Clock>) -> Self {
        let option_key = format!("{}{}", LOCK_OPTION_PREFIX, sanitize_key(job));
        Self {
            options,
            clock,
            job: job.to_string(),
            option_key,
        }
    }

    /// True while a stored expiry for this job lies strictly in the future.
    pub async fn is_locked(&self) -> bool {
        match self.options.get_option(&self.option_key).await {
            Ok(Some(raw)) => raw
                .trim()
                .parse::<i64>()
                .map(|expires_at| expires_at > self.clock.now_unix())
                .unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(job = %self.job, error = %e, "Failed to read cron lock");
                false
            }
        }
    }

    /// Take the lock for `duration`. Returns false without mutating anything
    /// when the lock is already held.
    ///
    /// The check and the store are separate operations; two callers racing
    /// through that window can both succeed. The scheduler fires each job
    /// once a day per tenant, so the window is accepted rather than closed
    /// with a conditional write.
    pub async fn acquire(&self, duration: Duration) -> bool {
        if self.is_locked().await {
            return false;
        }

        let expires_at = self.clock.now_unix() + duration.as_secs() as i64;
        match self
            .options
            .set_option(&self.option_key, &expires_at.to_string())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(job = %self.job, error = %e, "Failed to store cron lock");
                false
            }
        }
    }

    /// Drop the lock. Releasing a lock that is not held is not an error.
    pub async fn release(&self) -> bool {
        match self.options.delete_option(&self.option_key).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(job = %self.job, error = %e, "Failed to delete cron lock");
                false
            }
        }
    }

    /// Run `f` under the lock, releasing it on every exit path.
    ///
    /// `f` reports failure through its return value rather than unwinding;
    /// the release after the await therefore runs whether the protected
    /// block succeeded or not.
    pub async fn run_exclusive<F, Fut, T>(&self, duration: Duration, f: F) -> LockOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.acquire(duration).await {
            return LockOutcome::Contended;
        }

        let value = f().await;
        self.release().await;
        LockOutcome::Completed(value)
    }
}

/// Lowercase alphanumerics, dashes and underscores; everything else is
/// dropped.
fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}
