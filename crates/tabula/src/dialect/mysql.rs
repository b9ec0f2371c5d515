//! MySQL dialect.
//!
//! Tables are created with a single `CREATE TABLE` carrying columns, primary
//! key and indexes. Every later change is its own `ALTER TABLE` statement so
//! that one failure never takes sibling changes down with it.

use crate::operations::SchemaChange;
use crate::schema::{
    split_index_column, ColumnDef, ForeignKeyDef, IndexDef, INDEX_LENGTH_PLACEHOLDER,
    MAX_INDEX_LENGTH,
};

use super::quote_identifier;

/// MySQL SQL generator.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect {
    table_prefix: String,
    charset_collate: String,
}

impl MySqlDialect {
    /// Creates a dialect that prefixes referenced tables with `table_prefix`
    /// and appends `charset_collate` to `CREATE TABLE`.
    #[must_use]
    pub fn new(table_prefix: impl Into<String>, charset_collate: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into(),
            charset_collate: charset_collate.into(),
        }
    }

    /// Generates the statement for a change.
    #[must_use]
    pub fn generate_sql(&self, change: &SchemaChange) -> String {
        match change {
            SchemaChange::CreateTable {
                table,
                columns,
                primary_key,
                indexes,
            } => self.create_table_sql(table, columns, primary_key, indexes),

            SchemaChange::AddColumn {
                table,
                column,
                definition,
            } => self.alter_table_sql(
                table,
                &format!("ADD COLUMN {}", self.column_clause(column, definition)),
            ),

            SchemaChange::ModifyColumn {
                table,
                column,
                definition,
                ..
            } => self.alter_table_sql(
                table,
                &format!("MODIFY COLUMN {}", self.column_clause(column, definition)),
            ),

            SchemaChange::DropColumn { table, column } => self.alter_table_sql(
                table,
                &format!("DROP COLUMN {}", quote_identifier(column)),
            ),

            SchemaChange::AddIndex { table, name, index } => {
                let keyword = if index.unique {
                    "ADD UNIQUE INDEX"
                } else {
                    "ADD INDEX"
                };
                self.alter_table_sql(
                    table,
                    &format!(
                        "{keyword} {} ({})",
                        quote_identifier(name),
                        self.index_columns(index)
                    ),
                )
            }

            SchemaChange::AddForeignKey {
                table,
                name,
                foreign_key,
            } => self.alter_table_sql(table, &self.foreign_key_clause(name, foreign_key)),
        }
    }

    fn create_table_sql(
        &self,
        table: &str,
        columns: &[(String, ColumnDef)],
        primary_key: &[String],
        indexes: &[(String, IndexDef)],
    ) -> String {
        let mut clauses: Vec<String> = columns
            .iter()
            .map(|(name, definition)| self.column_clause(name, definition))
            .collect();

        if !primary_key.is_empty() {
            clauses.push(format!("PRIMARY KEY ({})", quote_list(primary_key)));
        }

        for (name, index) in indexes {
            let keyword = if index.unique { "UNIQUE KEY" } else { "KEY" };
            clauses.push(format!(
                "{keyword} {} ({})",
                quote_identifier(name),
                self.index_columns(index)
            ));
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n  {}\n)",
            quote_identifier(table),
            clauses.join(",\n  ")
        );
        if !self.charset_collate.trim().is_empty() {
            sql.push(' ');
            sql.push_str(self.charset_collate.trim());
        }
        sql
    }

    fn alter_table_sql(&self, table: &str, clause: &str) -> String {
        format!("ALTER TABLE {} {}", quote_identifier(table), clause)
    }

    /// `` `name` TYPE ATTRIBUTES `` using the declared text as written.
    fn column_clause(&self, name: &str, definition: &ColumnDef) -> String {
        let mut clause = format!("{} {}", quote_identifier(name), definition.sql_type.trim());
        if !definition.attributes.trim().is_empty() {
            clause.push(' ');
            clause.push_str(definition.attributes.trim());
        }
        clause
    }

    fn index_columns(&self, index: &IndexDef) -> String {
        index
            .columns
            .iter()
            .map(|reference| index_column(reference))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn foreign_key_clause(&self, name: &str, foreign_key: &ForeignKeyDef) -> String {
        format!(
            "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            quote_identifier(name),
            quote_list(&foreign_key.columns),
            quote_identifier(&format!(
                "{}{}",
                self.table_prefix, foreign_key.referenced_table
            )),
            quote_list(&foreign_key.referenced_columns),
            foreign_key.on_delete.to_sql()
        )
    }
}

/// Renders one index column reference, substituting the prefix length
/// placeholder with [`MAX_INDEX_LENGTH`].
fn index_column(reference: &str) -> String {
    match split_index_column(reference) {
        (name, None) => quote_identifier(name),
        (name, Some(length)) if length == INDEX_LENGTH_PLACEHOLDER => {
            format!("{}({MAX_INDEX_LENGTH})", quote_identifier(name))
        }
        (name, Some(length)) => format!("{}({length})", quote_identifier(name)),
    }
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}
