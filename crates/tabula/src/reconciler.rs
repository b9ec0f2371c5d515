//! Reconciliation entry points.
//!
//! A [`Reconciler`] is constructed once by the host with its backend and
//! configuration, then asked to reconcile tables. Each call inspects the live
//! catalog afresh; there is no migration history.

use tracing::{debug, error, info};

use crate::catalog::{DdlExecutor, SchemaInspector};
use crate::config::EngineConfig;
use crate::creator::SchemaCreator;
use crate::dialect::MySqlDialect;
use crate::error::Result;
use crate::foreign_keys::ForeignKeyAttacher;
use crate::operations::SchemaChange;
use crate::registry::SchemaRegistry;
use crate::report::{OperationRecord, OperationStatus, ReconcileReport, TableOutcome};
use crate::schema::TableDescriptor;
use crate::updater::SchemaUpdater;

/// Renders and runs one change, logging and recording the outcome.
///
/// Returns whether the statement succeeded. Dry runs count as success.
pub(crate) async fn apply_change<B: DdlExecutor>(
    backend: &B,
    dialect: &MySqlDialect,
    dry_run: bool,
    change: &SchemaChange,
    report: &mut ReconcileReport,
) -> bool {
    let sql = dialect.generate_sql(change);

    if let Some(previous) = change.previous() {
        info!(
            table = %change.table(),
            column = %change.target(),
            previous = %previous,
            "Column definition differs"
        );
    }

    if dry_run {
        info!(
            table = %change.table(),
            operation = %change.kind(),
            target = %change.target(),
            sql = %sql,
            "Planned"
        );
        report.record(OperationRecord::new(change, sql, OperationStatus::Planned));
        return true;
    }

    debug!(sql = %sql, "Executing SQL");
    match backend.execute(&sql).await {
        Ok(_) => {
            info!(
                table = %change.table(),
                operation = %change.kind(),
                target = %change.target(),
                "Executed: {sql}"
            );
            report.record(OperationRecord::new(change, sql, OperationStatus::Applied));
            true
        }
        Err(e) => {
            error!(
                table = %change.table(),
                operation = %change.kind(),
                target = %change.target(),
                error = %e,
                "Failed to execute query: {sql}"
            );
            report.record(OperationRecord::new(
                change,
                sql,
                OperationStatus::Failed(e.to_string()),
            ));
            false
        }
    }
}

/// Reconciles declared table shapes with the live database.
pub struct Reconciler<B> {
    backend: B,
    config: EngineConfig,
    dialect: MySqlDialect,
}

impl<B: SchemaInspector + DdlExecutor> Reconciler<B> {
    /// Creates a reconciler over `backend`.
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let dialect = MySqlDialect::new(&config.table_prefix, &config.charset_collate);
        Self {
            backend,
            config,
            dialect,
        }
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &MySqlDialect {
        &self.dialect
    }

    /// Creates `table` if absent, then attaches its foreign keys.
    ///
    /// Only an invalid descriptor or a catalog read failure is an error;
    /// failed statements are in the report.
    pub async fn reconcile_new_table(
        &self,
        table: &str,
        descriptor: &TableDescriptor,
    ) -> Result<ReconcileReport> {
        descriptor.validate(table)?;
        let physical = self.config.physical_name(table);
        let mut report = ReconcileReport::new(table, &physical);

        let creator = SchemaCreator::new(&self.backend, &self.dialect, self.config.dry_run);
        let outcome = creator.create(&physical, descriptor, &mut report).await?;
        report.outcome = outcome;

        self.attach_foreign_keys(&physical, descriptor, &mut report)
            .await?;
        Ok(self.finish(report))
    }

    /// Alters `table` to match the descriptor, then attaches its foreign keys.
    ///
    /// A missing table is left alone: nothing is written.
    pub async fn reconcile_existing_table(
        &self,
        table: &str,
        descriptor: &TableDescriptor,
    ) -> Result<ReconcileReport> {
        descriptor.validate(table)?;
        let physical = self.config.physical_name(table);
        let mut report = ReconcileReport::new(table, &physical);

        let updater = SchemaUpdater::new(
            &self.backend,
            &self.dialect,
            self.config.mode,
            self.config.dry_run,
        );
        let outcome = updater.update(&physical, descriptor, &mut report).await?;
        report.outcome = outcome;

        if report.outcome != TableOutcome::Missing {
            self.attach_foreign_keys(&physical, descriptor, &mut report)
                .await?;
        }
        Ok(self.finish(report))
    }

    /// Creates or updates `table`, whichever applies.
    pub async fn reconcile(
        &self,
        table: &str,
        descriptor: &TableDescriptor,
    ) -> Result<ReconcileReport> {
        descriptor.validate(table)?;
        let physical = self.config.physical_name(table);
        if self.backend.table_exists(&physical).await? {
            self.reconcile_existing_table(table, descriptor).await
        } else {
            self.reconcile_new_table(table, descriptor).await
        }
    }

    /// Reconciles every registered table, referenced tables first.
    pub async fn reconcile_registry(
        &self,
        registry: &SchemaRegistry,
    ) -> Result<Vec<ReconcileReport>> {
        let order = registry.creation_order()?;
        let mut reports = Vec::with_capacity(order.len());
        for table in order {
            let descriptor = registry.get(&table)?;
            reports.push(self.reconcile(&table, descriptor).await?);
        }
        Ok(reports)
    }

    async fn attach_foreign_keys(
        &self,
        physical: &str,
        descriptor: &TableDescriptor,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        if descriptor.foreign_keys.is_empty() {
            return Ok(());
        }
        ForeignKeyAttacher::new(&self.backend, &self.dialect, self.config.dry_run)
            .attach(physical, &descriptor.foreign_keys, report)
            .await
    }

    fn finish(&self, report: ReconcileReport) -> ReconcileReport {
        let report = report.finish();
        let failed = report.failures().count();
        if failed > 0 {
            error!(
                table = %report.physical_table,
                failed,
                "Reconciliation finished with failures"
            );
        } else {
            debug!(
                table = %report.physical_table,
                outcome = ?report.outcome,
                "Reconciliation finished"
            );
        }
        report
    }
}
