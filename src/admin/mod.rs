//! Surfaces exposed to the administrative collaborators: the retention
//! setting, the per-item lifetime field, and the trashed-items report.

mod lifetime_field;
mod report;
mod settings;

pub use lifetime_field::{LifetimeField, parse_lifetime};
pub use report::{TrashReport, TrashReportEntry, TrashReporter};
pub use settings::{
    DEFAULT_RETENTION_DAYS, RETENTION_PERIOD_OPTION, RetentionSetting, sanitize_retention,
};

use crate::models::ItemId;

/// Expand an edit-link template, replacing `{id}` with the item id.
pub fn render_edit_link(template: &str, id: ItemId) -> String {
    template.replace("{id}", &id.to_string())
}
