//! In-place updates of existing tables.
//!
//! Columns are matched by name. A declared column whose canonical form equals
//! the live one is never touched, so running the updater twice in a row
//! issues no statements the second time.

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::catalog::{DdlExecutor, SchemaInspector};
use crate::config::ReconcileMode;
use crate::dialect::MySqlDialect;
use crate::error::Result;
use crate::normalize::normalize;
use crate::operations::{OperationKind, SchemaChange};
use crate::reconciler::apply_change;
use crate::report::{OperationRecord, ReconcileReport, TableOutcome};
use crate::schema::{ColumnDef, TableDescriptor};

/// Column changes needed to bring a live table in line with a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPlan {
    /// `ADD`, `MODIFY` and `DROP COLUMN` changes, in that order of discovery.
    pub changes: Vec<SchemaChange>,
    /// Undeclared live columns left in place (additive mode).
    pub retained: Vec<String>,
}

/// Diffs live canonical column definitions against a descriptor.
///
/// Declared columns come first, in declaration order: a live column with a
/// different canonical form is modified, a missing one is added. Live columns
/// the descriptor does not declare are dropped in [`ReconcileMode::Strict`]
/// and retained otherwise.
#[must_use]
pub fn plan_column_changes(
    table: &str,
    live: &IndexMap<String, String>,
    descriptor: &TableDescriptor,
    mode: ReconcileMode,
) -> ColumnPlan {
    let mut plan = ColumnPlan::default();

    for (name, column) in &descriptor.columns {
        match live.get(name) {
            Some(existing) => {
                let declared = declared_canonical(name, column, descriptor);
                if *existing != declared {
                    plan.changes.push(SchemaChange::modify_column(
                        table,
                        name,
                        column.clone(),
                        existing.clone(),
                    ));
                }
            }
            None => plan
                .changes
                .push(SchemaChange::add_column(table, name, column.clone())),
        }
    }

    for name in live.keys() {
        if descriptor.columns.contains_key(name) {
            continue;
        }
        match mode {
            ReconcileMode::Strict => plan.changes.push(SchemaChange::drop_column(table, name)),
            ReconcileMode::Additive => plan.retained.push(name.clone()),
        }
    }

    plan
}

/// Canonical form the catalog will report for a declared column.
///
/// MySQL makes primary key columns `NOT NULL` whether or not it was declared.
fn declared_canonical(name: &str, column: &ColumnDef, descriptor: &TableDescriptor) -> String {
    let in_primary_key = descriptor.primary_key.iter().any(|key| key == name);
    if in_primary_key && !normalize("", &column.attributes).contains("NOT NULL") {
        normalize(&column.sql_type, &format!("NOT NULL {}", column.attributes))
    } else {
        normalize(&column.sql_type, &column.attributes)
    }
}

/// Alters existing tables to match their descriptors.
pub struct SchemaUpdater<'a, B> {
    backend: &'a B,
    dialect: &'a MySqlDialect,
    mode: ReconcileMode,
    dry_run: bool,
}

impl<'a, B: SchemaInspector + DdlExecutor> SchemaUpdater<'a, B> {
    /// Creates an updater.
    #[must_use]
    pub fn new(
        backend: &'a B,
        dialect: &'a MySqlDialect,
        mode: ReconcileMode,
        dry_run: bool,
    ) -> Self {
        Self {
            backend,
            dialect,
            mode,
            dry_run,
        }
    }

    /// Updates `table` in place. Never creates it.
    ///
    /// Each change runs as its own `ALTER TABLE`; a failed statement is
    /// logged and recorded and the remaining ones still run.
    pub async fn update(
        &self,
        table: &str,
        descriptor: &TableDescriptor,
        report: &mut ReconcileReport,
    ) -> Result<TableOutcome> {
        let live = self.backend.describe_columns(table).await?;
        if live.is_empty() {
            info!(table = %table, "Table does not exist, skipping update");
            return Ok(TableOutcome::Missing);
        }

        let ColumnPlan {
            mut changes,
            retained,
        } = plan_column_changes(table, &live, descriptor, self.mode);

        for column in &retained {
            warn!(
                table = %table,
                column = %column,
                "Column is not declared, keeping it (additive mode)"
            );
            report.record(OperationRecord::skipped(
                OperationKind::DropColumn,
                column,
                "additive mode keeps undeclared columns",
            ));
        }

        for (name, index) in &descriptor.indexes {
            if self.backend.index_exists(table, name).await? {
                info!(table = %table, index = %name, "Index already exists, skipping");
                report.record(OperationRecord::skipped(
                    OperationKind::AddIndex,
                    name,
                    "index already exists",
                ));
            } else {
                changes.push(SchemaChange::add_index(table, name, index.clone()));
            }
        }

        if changes.is_empty() {
            info!(table = %table, "No schema changes detected");
            return Ok(TableOutcome::Unchanged);
        }

        let mut failed = 0usize;
        for change in &changes {
            if !apply_change(self.backend, self.dialect, self.dry_run, change, report).await {
                failed += 1;
            }
        }

        if self.dry_run {
            return Ok(TableOutcome::Planned);
        }

        info!(
            table = %table,
            statements = changes.len(),
            failed,
            "Table updated"
        );
        Ok(TableOutcome::Updated)
    }
}
