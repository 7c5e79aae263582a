use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    models::{ItemId, LIFETIME_META_KEY},
    store::{ContentStore, StoreResult},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` form value; `None` for empty or malformed input.
pub fn parse_lifetime(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Read/write access to an item's expiration date field.
#[derive(Clone)]
pub struct LifetimeField {
    store: Arc<dyn ContentStore>,
}

impl LifetimeField {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Raw stored value, if the field is set. Empty stored values read as
    /// absent.
    pub async fn get(&self, item: ItemId) -> StoreResult<Option<String>> {
        let value = self.store.get_metadata(item, LIFETIME_META_KEY).await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    /// Parsed expiration date, if set and well-formed.
    pub async fn date(&self, item: ItemId) -> StoreResult<Option<NaiveDate>> {
        Ok(self.get(item).await?.as_deref().and_then(parse_lifetime))
    }

    /// Store a raw field value. Valid `YYYY-MM-DD` input is normalized and
    /// saved; empty or unparseable input clears the field instead of
    /// erroring.
    pub async fn set(&self, item: ItemId, raw: &str) -> StoreResult<Option<NaiveDate>> {
        match parse_lifetime(raw) {
            Some(date) => {
                self.store
                    .set_metadata(item, LIFETIME_META_KEY, &date.format(DATE_FORMAT).to_string())
                    .await?;
                Ok(Some(date))
            }
            None => {
                self.store.delete_metadata(item, LIFETIME_META_KEY).await?;
                Ok(None)
            }
        }
    }

    /// Remove the field. Returns whether a value was present.
    pub async fn clear(&self, item: ItemId) -> StoreResult<bool> {
        self.store.delete_metadata(item, LIFETIME_META_KEY).await
    }
}
