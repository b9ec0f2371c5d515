//! Structural changes.
//!
//! The creator, updater and foreign key attacher describe what they want to do
//! as [`SchemaChange`] values; the [`MySqlDialect`](crate::dialect::MySqlDialect)
//! renders each one to a single DDL statement.

use serde::Serialize;

use crate::schema::{ColumnDef, ForeignKeyDef, IndexDef};

/// A single structural change to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchemaChange {
    /// Create a table with its columns, primary key and indexes.
    CreateTable {
        /// Physical table name.
        table: String,
        /// Columns in declaration order.
        columns: Vec<(String, ColumnDef)>,
        /// Primary key columns.
        primary_key: Vec<String>,
        /// Secondary indexes.
        indexes: Vec<(String, IndexDef)>,
    },

    /// Add a column.
    AddColumn {
        /// Physical table name.
        table: String,
        /// Column name.
        column: String,
        /// Declared definition.
        definition: ColumnDef,
    },

    /// Redefine an existing column.
    ModifyColumn {
        /// Physical table name.
        table: String,
        /// Column name.
        column: String,
        /// Declared definition.
        definition: ColumnDef,
        /// Canonical live definition being replaced.
        previous: String,
    },

    /// Drop a column.
    DropColumn {
        /// Physical table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Add a secondary index.
    AddIndex {
        /// Physical table name.
        table: String,
        /// Index name.
        name: String,
        /// Index definition.
        index: IndexDef,
    },

    /// Add a foreign key constraint.
    AddForeignKey {
        /// Physical table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Constraint definition; the referenced table is still logical.
        foreign_key: ForeignKeyDef,
    },
}

/// Kind of a [`SchemaChange`], used in reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationKind {
    /// `CREATE TABLE`.
    CreateTable,
    /// `ADD COLUMN`.
    AddColumn,
    /// `MODIFY COLUMN`.
    ModifyColumn,
    /// `DROP COLUMN`.
    DropColumn,
    /// `ADD INDEX`.
    AddIndex,
    /// `ADD CONSTRAINT ... FOREIGN KEY`.
    AddForeignKey,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CreateTable => "create table",
            Self::AddColumn => "add column",
            Self::ModifyColumn => "modify column",
            Self::DropColumn => "drop column",
            Self::AddIndex => "add index",
            Self::AddForeignKey => "add foreign key",
        };
        f.write_str(name)
    }
}

impl SchemaChange {
    /// Creates an add column change.
    #[must_use]
    pub fn add_column(
        table: impl Into<String>,
        column: impl Into<String>,
        definition: ColumnDef,
    ) -> Self {
        Self::AddColumn {
            table: table.into(),
            column: column.into(),
            definition,
        }
    }

    /// Creates a modify column change.
    #[must_use]
    pub fn modify_column(
        table: impl Into<String>,
        column: impl Into<String>,
        definition: ColumnDef,
        previous: impl Into<String>,
    ) -> Self {
        Self::ModifyColumn {
            table: table.into(),
            column: column.into(),
            definition,
            previous: previous.into(),
        }
    }

    /// Creates a drop column change.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an add index change.
    #[must_use]
    pub fn add_index(table: impl Into<String>, name: impl Into<String>, index: IndexDef) -> Self {
        Self::AddIndex {
            table: table.into(),
            name: name.into(),
            index,
        }
    }

    /// Creates an add foreign key change.
    #[must_use]
    pub fn add_foreign_key(
        table: impl Into<String>,
        name: impl Into<String>,
        foreign_key: ForeignKeyDef,
    ) -> Self {
        Self::AddForeignKey {
            table: table.into(),
            name: name.into(),
            foreign_key,
        }
    }

    /// Returns the kind of this change.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTable { .. } => OperationKind::CreateTable,
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::ModifyColumn { .. } => OperationKind::ModifyColumn,
            Self::DropColumn { .. } => OperationKind::DropColumn,
            Self::AddIndex { .. } => OperationKind::AddIndex,
            Self::AddForeignKey { .. } => OperationKind::AddForeignKey,
        }
    }

    /// Returns the physical table this change applies to.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { table, .. }
            | Self::AddColumn { table, .. }
            | Self::ModifyColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AddIndex { table, .. }
            | Self::AddForeignKey { table, .. } => table,
        }
    }

    /// Returns the name of the object this change targets: the table, column,
    /// index or constraint.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::CreateTable { table, .. } => table,
            Self::AddColumn { column, .. }
            | Self::ModifyColumn { column, .. }
            | Self::DropColumn { column, .. } => column,
            Self::AddIndex { name, .. } | Self::AddForeignKey { name, .. } => name,
        }
    }

    /// Canonical live definition a `MODIFY COLUMN` replaces.
    #[must_use]
    pub fn previous(&self) -> Option<&str> {
        match self {
            Self::ModifyColumn { previous, .. } => Some(previous),
            _ => None,
        }
    }
}
