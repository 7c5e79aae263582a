use serde::{Deserialize, Serialize};

/// Metadata key holding an item's expiration date as `YYYY-MM-DD`.
///
/// Absence means the item never expires.
pub const LIFETIME_META_KEY: &str = "pl_post_lifetime";

/// Metadata key holding the Unix timestamp written by the storage engine
/// when an item enters the trash. Read-only to the lifecycle engine.
pub const TRASH_TIME_META_KEY: &str = "_trash_time";

/// Identifier assigned to an item by the storage engine.
pub type ItemId = i64;

/// Identifier of an item's author in the author directory.
pub type AuthorId = i64;

/// Lifecycle state of a content item.
///
/// Permanent deletion is not a state: a purged item's row is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "publish")]
    Published,
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "trash")]
    Trashed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Published => "publish",
            ItemStatus::Draft => "draft",
            ItemStatus::Trashed => "trash",
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(ItemStatus::Published),
            "draft" => Ok(ItemStatus::Draft),
            "trash" => Ok(ItemStatus::Trashed),
            _ => Err(format!("Invalid item status: {}", s)),
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content item as seen by the lifecycle engine.
///
/// The storage engine owns everything else about the item; only the fields
/// the transition and notification paths need are surfaced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub author: AuthorId,
    pub status: ItemStatus,
}
