//! Table creation.

use tracing::{error, info, warn};

use crate::catalog::{DdlExecutor, SchemaInspector};
use crate::dialect::MySqlDialect;
use crate::error::Result;
use crate::operations::{OperationKind, SchemaChange};
use crate::reconciler::apply_change;
use crate::report::{OperationRecord, ReconcileReport, TableOutcome};
use crate::schema::TableDescriptor;

/// Builds the `CREATE TABLE` change for a descriptor.
#[must_use]
pub fn plan_create_table(table: &str, descriptor: &TableDescriptor) -> SchemaChange {
    SchemaChange::CreateTable {
        table: table.to_string(),
        columns: descriptor
            .columns
            .iter()
            .map(|(name, column)| (name.clone(), column.clone()))
            .collect(),
        primary_key: descriptor.primary_key.clone(),
        indexes: descriptor
            .indexes
            .iter()
            .map(|(name, index)| (name.clone(), index.clone()))
            .collect(),
    }
}

/// Creates tables that do not exist yet.
///
/// Columns, primary key and indexes go into one `CREATE TABLE`; foreign keys
/// are attached separately by the reconciler.
pub struct SchemaCreator<'a, B> {
    backend: &'a B,
    dialect: &'a MySqlDialect,
    dry_run: bool,
}

impl<'a, B: SchemaInspector + DdlExecutor> SchemaCreator<'a, B> {
    /// Creates a creator.
    #[must_use]
    pub fn new(backend: &'a B, dialect: &'a MySqlDialect, dry_run: bool) -> Self {
        Self {
            backend,
            dialect,
            dry_run,
        }
    }

    /// Creates `table` unless it already exists.
    ///
    /// A failed creation is logged and reported as
    /// [`TableOutcome::CreateFailed`], not returned as an error.
    pub async fn create(
        &self,
        table: &str,
        descriptor: &TableDescriptor,
        report: &mut ReconcileReport,
    ) -> Result<TableOutcome> {
        if self.backend.table_exists(table).await? {
            info!(table = %table, "Table already exists, skipping creation");
            report.record(OperationRecord::skipped(
                OperationKind::CreateTable,
                table,
                "table already exists",
            ));
            return Ok(TableOutcome::AlreadyExists);
        }

        let change = plan_create_table(table, descriptor);
        let applied = apply_change(self.backend, self.dialect, self.dry_run, &change, report).await;

        if self.dry_run {
            return Ok(TableOutcome::Planned);
        }

        if self.backend.table_exists(table).await? {
            if applied {
                info!(table = %table, "Table created successfully");
                Ok(TableOutcome::Created)
            } else {
                warn!(table = %table, "Table appeared while creating it, keeping existing table");
                Ok(TableOutcome::AlreadyExists)
            }
        } else {
            error!(table = %table, "Failed to create table");
            Ok(TableOutcome::CreateFailed)
        }
    }
}
