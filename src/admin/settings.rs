use std::sync::Arc;

use crate::store::{OptionStore, StoreResult};

/// Option key for the trash retention period, in days.
pub const RETENTION_PERIOD_OPTION: &str = "trash_retention_period";

/// Days a trashed item is kept before it becomes purge-eligible.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Reader/writer for the site-wide retention period.
///
/// The value lives in the option store so it can change between runs
/// without a restart; the engine reads it at the start of every pass.
#[derive(Clone)]
pub struct RetentionSetting {
    options: Arc<dyn OptionStore>,
}

impl RetentionSetting {
    pub fn new(options: Arc<dyn OptionStore>) -> Self {
        Self { options }
    }

    /// Current retention period. Absent, unreadable, or malformed values
    /// fall back to [`DEFAULT_RETENTION_DAYS`].
    pub async fn get(&self) -> u32 {
        match self.options.get_option(RETENTION_PERIOD_OPTION).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or(DEFAULT_RETENTION_DAYS),
            Ok(None) => DEFAULT_RETENTION_DAYS,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read retention period");
                DEFAULT_RETENTION_DAYS
            }
        }
    }

    /// Sanitize and store a raw settings-form value, returning what was
    /// stored.
    pub async fn set(&self, raw: &str) -> StoreResult<u32> {
        let days = sanitize_retention(raw);
        self.options
            .set_option(RETENTION_PERIOD_OPTION, &days.to_string())
            .await?;
        Ok(days)
    }
}

/// Sanitize a settings-form value: the integer magnitude of the input,
/// floored at one day. Unparseable input falls back to the default.
pub fn sanitize_retention(raw: &str) -> u32 {
    let days = raw
        .trim()
        .parse::<i64>()
        .map(|v| v.unsigned_abs())
        .unwrap_or(u64::from(DEFAULT_RETENTION_DAYS));
    days.clamp(1, u64::from(u32::MAX)) as u32
}
