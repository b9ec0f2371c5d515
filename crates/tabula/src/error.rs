//! Error types for schema reconciliation.

use std::path::PathBuf;

/// Errors that can stop a reconciliation before or while reading the catalog.
///
/// Failures of individual DDL statements are not errors: they are logged and
/// recorded in the [`ReconcileReport`](crate::report::ReconcileReport).
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Database error while reading catalog metadata or connecting.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The descriptor references something it does not declare.
    #[error("Invalid descriptor for table '{table}': {message}")]
    InvalidDescriptor {
        /// Logical table name.
        table: String,
        /// What is wrong with the descriptor.
        message: String,
    },

    /// Table names must be 1 to 20 key characters.
    #[error("Invalid table name '{0}': names must be between 1 and 20 characters")]
    InvalidTableName(String),

    /// No descriptor is registered under this name.
    #[error("No descriptor registered for table '{0}'")]
    UnknownTable(String),

    /// Registered tables reference each other in a cycle.
    #[error("Circular foreign key dependency between tables: {}", .0.join(", "))]
    CircularDependency(Vec<String>),

    /// IO error while reading descriptor or config files.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Descriptor or config JSON could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReconcileError {
    pub(crate) fn invalid(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
