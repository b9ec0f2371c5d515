//! Engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Charset clause appended to `CREATE TABLE` when none is configured.
pub const DEFAULT_CHARSET_COLLATE: &str =
    "DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_520_ci";

/// How the updater treats live columns the descriptor does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Undeclared columns are kept and logged.
    #[default]
    Additive,
    /// The descriptor is exhaustive: undeclared columns are dropped.
    Strict,
}

/// Settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix turning logical table names into physical ones.
    pub table_prefix: String,
    /// Charset and collation clause for new tables.
    pub charset_collate: String,
    /// Column removal policy.
    pub mode: ReconcileMode,
    /// Log and report statements without executing them.
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            charset_collate: DEFAULT_CHARSET_COLLATE.to_string(),
            mode: ReconcileMode::default(),
            dry_run: false,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Sets the charset and collation clause.
    #[must_use]
    pub fn charset_collate(mut self, clause: impl Into<String>) -> Self {
        self.charset_collate = clause.into();
        self
    }

    /// Sets the reconcile mode.
    #[must_use]
    pub fn mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables dry-run mode (SQL is logged and reported but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Physical name of a logical table.
    #[must_use]
    pub fn physical_name(&self, table: &str) -> String {
        format!("{}{}", self.table_prefix, table)
    }

    /// Reads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| ReconcileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
