//! Reconciliation reports.
//!
//! Statement failures never abort a reconciliation, so the report is where a
//! caller learns what was attempted and what happened to each statement.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::operations::{OperationKind, SchemaChange};

/// What happened to the table as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableOutcome {
    /// The table was created.
    Created,
    /// The table already existed; creation was skipped.
    AlreadyExists,
    /// `CREATE TABLE` ran but the table still does not exist.
    CreateFailed,
    /// At least one change was attempted on the existing table.
    Updated,
    /// The existing table already matched the descriptor.
    Unchanged,
    /// The table to update does not exist.
    Missing,
    /// Dry run: statements were planned but not executed.
    Planned,
}

/// Result of one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OperationStatus {
    /// The statement ran successfully.
    Applied,
    /// The statement failed with this error.
    Failed(String),
    /// The statement was not needed, for this reason.
    Skipped(String),
    /// Dry run: the statement would have run.
    Planned,
}

/// One attempted (or skipped) structural change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    /// Kind of change.
    pub kind: OperationKind,
    /// Column, index, constraint or table name.
    pub target: String,
    /// Statement, empty when skipped before generation.
    pub sql: String,
    /// Canonical live definition replaced by a `MODIFY COLUMN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// Outcome.
    pub status: OperationStatus,
}

impl OperationRecord {
    pub(crate) fn new(change: &SchemaChange, sql: String, status: OperationStatus) -> Self {
        Self {
            kind: change.kind(),
            target: change.target().to_string(),
            sql,
            previous: change.previous().map(str::to_string),
            status,
        }
    }

    pub(crate) fn skipped(
        kind: OperationKind,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            sql: String::new(),
            previous: None,
            status: OperationStatus::Skipped(reason.into()),
        }
    }

    /// Returns whether the statement ran against the database.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(
            self.status,
            OperationStatus::Applied | OperationStatus::Failed(_)
        )
    }
}

/// Everything a reconciliation call did to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Logical table name.
    pub table: String,
    /// Physical table name.
    pub physical_table: String,
    /// Table-level outcome.
    pub outcome: TableOutcome,
    /// Statements in execution order, foreign keys last.
    pub operations: Vec<OperationRecord>,
    /// When reconciliation started.
    pub started_at: DateTime<Utc>,
    /// When reconciliation finished.
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub(crate) fn new(table: impl Into<String>, physical_table: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            table: table.into(),
            physical_table: physical_table.into(),
            outcome: TableOutcome::Unchanged,
            operations: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn record(&mut self, record: OperationRecord) {
        self.operations.push(record);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Statements that ran successfully.
    pub fn changes_applied(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations
            .iter()
            .filter(|op| op.status == OperationStatus::Applied)
    }

    /// Statements that failed.
    pub fn failures(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations
            .iter()
            .filter(|op| matches!(op.status, OperationStatus::Failed(_)))
    }

    /// Statements that reached the database, successful or not.
    pub fn writes(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.iter().filter(|op| op.is_write())
    }

    /// Returns operations of one kind.
    pub fn of_kind(&self, kind: OperationKind) -> impl Iterator<Item = &OperationRecord> {
        self.operations.iter().filter(move |op| op.kind == kind)
    }

    /// Returns true when no statement failed and the table exists.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
            && !matches!(
                self.outcome,
                TableOutcome::CreateFailed | TableOutcome::Missing
            )
    }
}
