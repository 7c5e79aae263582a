use serde::{Deserialize, Serialize};

/// Site-level settings surfaced to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Fallback notification address, seeded into the option store at
    /// startup when no value is present there.
    #[serde(default)]
    pub admin_email: Option<String>,

    /// Edit-link template; `{id}` is replaced with the item id.
    /// Default: "/admin/items/{id}/edit"
    #[serde(default = "default_edit_url")]
    pub edit_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            admin_email: None,
            edit_url: default_edit_url(),
        }
    }
}

fn default_edit_url() -> String {
    "/admin/items/{id}/edit".to_string()
}
