use serde::{Deserialize, Serialize};

/// Storage engine selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseConfig {
    Sqlite(SqliteConfig),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Sqlite(SqliteConfig::default())
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the database file.
    #[serde(default = "default_sqlite_path")]
    pub path: String,

    /// Create the database file if it does not exist.
    /// Default: true
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// Maximum number of pooled connections.
    /// Default: 5
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Milliseconds to wait on a locked database before failing.
    /// Default: 5000
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
            create_if_missing: default_create_if_missing(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_sqlite_path() -> String {
    "post-lifetime.db".to_string()
}

fn default_create_if_missing() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5000
}
