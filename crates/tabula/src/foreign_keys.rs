//! Foreign key attachment.
//!
//! Foreign keys are added with `ALTER TABLE` after the table exists, so a
//! referenced table only has to exist by the time its constraint is attached.

use indexmap::IndexMap;
use tracing::info;

use crate::catalog::{DdlExecutor, SchemaInspector};
use crate::dialect::MySqlDialect;
use crate::error::Result;
use crate::operations::{OperationKind, SchemaChange};
use crate::reconciler::apply_change;
use crate::report::{OperationRecord, ReconcileReport};
use crate::schema::ForeignKeyDef;

/// Adds missing foreign key constraints, one statement per key.
pub struct ForeignKeyAttacher<'a, B> {
    backend: &'a B,
    dialect: &'a MySqlDialect,
    dry_run: bool,
}

impl<'a, B: SchemaInspector + DdlExecutor> ForeignKeyAttacher<'a, B> {
    /// Creates an attacher.
    #[must_use]
    pub fn new(backend: &'a B, dialect: &'a MySqlDialect, dry_run: bool) -> Self {
        Self {
            backend,
            dialect,
            dry_run,
        }
    }

    /// Attaches every constraint not already present on `table`.
    ///
    /// A failed constraint is logged and recorded; the remaining keys are
    /// still attempted. Only catalog read failures are returned as errors.
    pub async fn attach(
        &self,
        table: &str,
        foreign_keys: &IndexMap<String, ForeignKeyDef>,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        for (name, foreign_key) in foreign_keys {
            if self.backend.foreign_key_exists(table, name).await? {
                info!(
                    table = %table,
                    constraint = %name,
                    "Foreign key already exists, skipping"
                );
                report.record(OperationRecord::skipped(
                    OperationKind::AddForeignKey,
                    name,
                    "constraint already exists",
                ));
                continue;
            }

            let change = SchemaChange::add_foreign_key(table, name, foreign_key.clone());
            apply_change(self.backend, self.dialect, self.dry_run, &change, report).await;
        }
        Ok(())
    }
}
