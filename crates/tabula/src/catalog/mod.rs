//! Live database metadata and DDL execution.
//!
//! The reconciler talks to the database only through the two traits defined
//! here: [`SchemaInspector`] for read-only catalog lookups and [`DdlExecutor`]
//! for running structural statements. [`MySqlCatalog`] implements both over a
//! `sqlx` MySQL pool.

mod mysql;

pub use mysql::MySqlCatalog;

use std::future::Future;

use indexmap::IndexMap;

use crate::error::Result;
use crate::normalize::normalize_definition;

/// Read-only access to the catalog of the active database.
///
/// Lookups for a table that does not exist report absence (`false` or an
/// empty map) instead of failing.
pub trait SchemaInspector: Send + Sync {
    /// Returns whether a base table with this physical name exists.
    fn table_exists(&self, table: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Returns the live columns of a table, in ordinal order.
    fn live_columns(&self, table: &str) -> impl Future<Output = Result<Vec<LiveColumn>>> + Send;

    /// Returns whether an index with this name exists on the table.
    fn index_exists(&self, table: &str, index: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Returns whether a foreign key constraint with this name exists on the table.
    fn foreign_key_exists(
        &self,
        table: &str,
        constraint: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Canonical definitions of the live columns, keyed by column name.
    ///
    /// Empty when the table does not exist.
    fn describe_columns(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<IndexMap<String, String>>> + Send {
        async move {
            Ok(self
                .live_columns(table)
                .await?
                .into_iter()
                .map(|column| {
                    let canonical = column.canonical();
                    (column.name, canonical)
                })
                .collect())
        }
    }
}

/// Executes DDL statements.
pub trait DdlExecutor: Send + Sync {
    /// Runs one statement and returns the number of affected rows.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<u64>> + Send;
}

/// One column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Full column type, e.g. `bigint unsigned` or `varchar(255)`.
    pub column_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default value, unquoted.
    pub default: Option<String>,
    /// Extra attributes such as `auto_increment`.
    pub extra: String,
}

impl LiveColumn {
    /// Builds a column from one `INFORMATION_SCHEMA.COLUMNS` row.
    ///
    /// MariaDB (10.2.7 and later) reports `COLUMN_DEFAULT` as an SQL
    /// expression: string literals come back quoted and a nullable column
    /// without a default reports the string `NULL`. Both are folded to the
    /// MySQL form, an unquoted value or no default at all.
    #[must_use]
    pub fn from_catalog(
        name: impl Into<String>,
        column_type: impl Into<String>,
        nullable: bool,
        default: Option<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable,
            default: default.and_then(catalog_default),
            extra: extra.into(),
        }
    }

    /// Definition in `{type} {NOT NULL|NULL} [DEFAULT '{default}'] [{extra}]`
    /// form, before normalization.
    #[must_use]
    pub fn definition(&self) -> String {
        let mut definition = format!(
            "{} {}",
            self.column_type,
            if self.nullable { "NULL" } else { "NOT NULL" }
        );
        if let Some(default) = &self.default {
            definition.push_str(&format!(" DEFAULT '{}'", default.replace('\'', "''")));
        }
        if !self.extra.trim().is_empty() {
            definition.push(' ');
            definition.push_str(self.extra.trim());
        }
        definition
    }

    /// Canonical, comparable definition.
    #[must_use]
    pub fn canonical(&self) -> String {
        normalize_definition(&self.definition())
    }
}

fn catalog_default(raw: String) -> Option<String> {
    if raw == "NULL" {
        return None;
    }
    match raw.strip_prefix('\'').and_then(|inner| inner.strip_suffix('\'')) {
        Some(literal) => Some(literal.replace("''", "'")),
        None => Some(raw),
    }
}
