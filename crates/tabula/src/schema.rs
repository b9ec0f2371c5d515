//! Schema descriptor types.
//!
//! A [`TableDescriptor`] is the declarative shape of one table: its columns,
//! primary key, secondary indexes and foreign keys. Descriptors are plain data;
//! the reconciler never mutates them.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};
use crate::registry::sanitize_key;

/// Placeholder an index column reference may carry instead of a literal
/// prefix length, e.g. `title($max_index_length)`.
pub const INDEX_LENGTH_PLACEHOLDER: &str = "$max_index_length";

/// Prefix length substituted for [`INDEX_LENGTH_PLACEHOLDER`].
///
/// 191 characters of utf8mb4 stay under the 767 byte index key limit of
/// older InnoDB row formats.
pub const MAX_INDEX_LENGTH: u32 = 191;

/// Referential action for `ON DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    /// Reject the delete while referencing rows exist (checked at statement end).
    #[default]
    #[serde(rename = "NO ACTION", alias = "no action", alias = "NO_ACTION")]
    NoAction,
    /// Reject the delete while referencing rows exist.
    #[serde(rename = "RESTRICT", alias = "restrict")]
    Restrict,
    /// Delete referencing rows too.
    #[serde(rename = "CASCADE", alias = "cascade")]
    Cascade,
    /// Set the referencing columns to NULL.
    #[serde(rename = "SET NULL", alias = "set null", alias = "SET_NULL")]
    SetNull,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }
}

/// Declared column: dialect-native type plus free-form attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Type with size, e.g. `BIGINT(20) UNSIGNED`.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Attributes such as `NOT NULL AUTO_INCREMENT` or `DEFAULT '0'`.
    #[serde(default)]
    pub attributes: String,
}

impl ColumnDef {
    /// Creates a column definition.
    #[must_use]
    pub fn new(sql_type: impl Into<String>, attributes: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
            attributes: attributes.into(),
        }
    }
}

/// Declared secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Column references, optionally with a prefix length suffix.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
}

impl IndexDef {
    /// Creates a non-unique index over the given column references.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Marks the index as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Declared foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Local columns.
    pub columns: Vec<String>,
    /// Logical (unprefixed) name of the referenced table.
    pub referenced_table: String,
    /// Columns of the referenced table.
    pub referenced_columns: Vec<String>,
    /// Action on delete of the referenced row.
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
}

impl ForeignKeyDef {
    /// Creates a foreign key with `ON DELETE NO ACTION`.
    #[must_use]
    pub fn new<I, S, J, T>(columns: I, referenced_table: impl Into<String>, referenced_columns: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.into_iter().map(Into::into).collect(),
            on_delete: ForeignKeyAction::default(),
        }
    }

    /// Sets the `ON DELETE` action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// Desired shape of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Columns in declaration order.
    pub columns: IndexMap<String, ColumnDef>,
    /// Primary key columns in key order.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Secondary indexes by name.
    #[serde(default)]
    pub indexes: IndexMap<String, IndexDef>,
    /// Foreign keys by constraint name.
    #[serde(default)]
    pub foreign_keys: IndexMap<String, ForeignKeyDef>,
}

impl TableDescriptor {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column.
    #[must_use]
    pub fn column(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
        attributes: impl Into<String>,
    ) -> Self {
        self.columns
            .insert(name.into(), ColumnDef::new(sql_type, attributes));
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, index: IndexDef) -> Self {
        self.indexes.insert(name.into(), index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, name: impl Into<String>, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.insert(name.into(), fk);
        self
    }

    /// Parses a descriptor from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a descriptor from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| ReconcileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Logical names of the tables this descriptor references.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys
            .values()
            .map(|fk| fk.referenced_table.as_str())
    }

    /// Checks that every referenced column is declared.
    ///
    /// `table` only appears in the error message.
    pub fn validate(&self, table: &str) -> Result<()> {
        if self.columns.is_empty() {
            return Err(ReconcileError::invalid(table, "no columns declared"));
        }

        for (name, column) in &self.columns {
            if name.trim().is_empty() {
                return Err(ReconcileError::invalid(table, "empty column name"));
            }
            if column.sql_type.trim().is_empty() {
                return Err(ReconcileError::invalid(
                    table,
                    format!("column '{name}' has no type"),
                ));
            }
        }

        for column in &self.primary_key {
            self.require_column(table, column, "primary key")?;
        }

        for (index_name, index) in &self.indexes {
            if index.columns.is_empty() {
                return Err(ReconcileError::invalid(
                    table,
                    format!("index '{index_name}' has no columns"),
                ));
            }
            for reference in &index.columns {
                let (column, _) = split_index_column(reference);
                self.require_column(table, column, &format!("index '{index_name}'"))?;
            }
        }

        for (key_name, fk) in &self.foreign_keys {
            if fk.columns.is_empty() {
                return Err(ReconcileError::invalid(
                    table,
                    format!("foreign key '{key_name}' has no columns"),
                ));
            }
            if fk.referenced_table.trim().is_empty() {
                return Err(ReconcileError::invalid(
                    table,
                    format!("foreign key '{key_name}' has no referenced table"),
                ));
            }
            let key = sanitize_key(&fk.referenced_table);
            if key != fk.referenced_table {
                return Err(ReconcileError::invalid(
                    table,
                    format!(
                        "foreign key '{key_name}' references '{}', which is not a table key (expected '{key}')",
                        fk.referenced_table
                    ),
                ));
            }
            if fk.columns.len() != fk.referenced_columns.len() {
                return Err(ReconcileError::invalid(
                    table,
                    format!(
                        "foreign key '{key_name}' has {} local columns but {} referenced columns",
                        fk.columns.len(),
                        fk.referenced_columns.len()
                    ),
                ));
            }
            for column in &fk.columns {
                self.require_column(table, column, &format!("foreign key '{key_name}'"))?;
            }
        }

        Ok(())
    }

    fn require_column(&self, table: &str, column: &str, context: &str) -> Result<()> {
        if self.columns.contains_key(column) {
            Ok(())
        } else {
            Err(ReconcileError::invalid(
                table,
                format!("{context} column '{column}' is not declared"),
            ))
        }
    }
}

/// Splits an index column reference into its column name and optional
/// prefix length suffix: `title($max_index_length)` gives
/// `("title", Some("$max_index_length"))`.
#[must_use]
pub fn split_index_column(reference: &str) -> (&str, Option<&str>) {
    let reference = reference.trim();
    match reference.split_once('(') {
        Some((name, rest)) => {
            let length = rest.trim_end().trim_end_matches(')').trim();
            (name.trim().trim_matches('`'), Some(length))
        }
        None => (reference.trim_matches('`'), None),
    }
}
