//! MySQL catalog backed by `INFORMATION_SCHEMA`.
//!
//! Every lookup is scoped to the connection's current database
//! (`DATABASE()`). Catalog string columns are cast to `CHAR` because some
//! servers report them as binary strings. MariaDB's quoted
//! `COLUMN_DEFAULT` values are folded by [`LiveColumn::from_catalog`].

use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use tracing::debug;

use super::{DdlExecutor, LiveColumn, SchemaInspector};
use crate::error::Result;

const TABLE_EXISTS_SQL: &str = r#"
    SELECT COUNT(*)
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND TABLE_TYPE = 'BASE TABLE'
"#;

const COLUMNS_SQL: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(COLUMN_TYPE AS CHAR(1024)) AS COLUMN_TYPE,
        CAST(IF(IS_NULLABLE = 'YES', 1, 0) AS SIGNED) AS is_nullable,
        CAST(COLUMN_DEFAULT AS CHAR(4000)) AS COLUMN_DEFAULT,
        CAST(EXTRA AS CHAR(255)) AS EXTRA
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

const INDEX_EXISTS_SQL: &str = r#"
    SELECT COUNT(*)
    FROM INFORMATION_SCHEMA.STATISTICS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND INDEX_NAME = ?
"#;

const FOREIGN_KEY_EXISTS_SQL: &str = r#"
    SELECT COUNT(*)
    FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND CONSTRAINT_NAME = ?
      AND CONSTRAINT_TYPE = 'FOREIGN KEY'
"#;

/// Catalog and executor over a borrowed MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    /// Wraps an existing pool. The pool's lifetime stays with the caller.
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn count(&self, sql: &str, binds: &[&str]) -> Result<i64> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }
}

fn live_column(row: &MySqlRow) -> Result<LiveColumn> {
    Ok(LiveColumn::from_catalog(
        row.try_get::<String, _>("COLUMN_NAME")?,
        row.try_get::<String, _>("COLUMN_TYPE")?,
        row.try_get::<i64, _>("is_nullable")? == 1,
        row.try_get::<Option<String>, _>("COLUMN_DEFAULT")?,
        row.try_get::<Option<String>, _>("EXTRA")?
            .unwrap_or_default(),
    ))
}

impl SchemaInspector for MySqlCatalog {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.count(TABLE_EXISTS_SQL, &[table]).await? > 0)
    }

    async fn live_columns(&self, table: &str) -> Result<Vec<LiveColumn>> {
        let rows: Vec<MySqlRow> = sqlx::query(COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        debug!(table = %table, columns = rows.len(), "Loaded live columns");
        rows.iter().map(live_column).collect()
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        Ok(self.count(INDEX_EXISTS_SQL, &[table, index]).await? > 0)
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        Ok(self
            .count(FOREIGN_KEY_EXISTS_SQL, &[table, constraint])
            .await?
            > 0)
    }
}

impl DdlExecutor for MySqlCatalog {
    async fn execute(&self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "Executing DDL");
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
