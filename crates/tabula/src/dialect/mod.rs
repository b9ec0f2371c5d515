//! SQL generation.
//!
//! Only the MySQL family is targeted; the dialect turns each
//! [`SchemaChange`](crate::operations::SchemaChange) into exactly one statement.

mod mysql;

pub use mysql::MySqlDialect;

/// Quotes an identifier with backticks, doubling embedded backticks.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
