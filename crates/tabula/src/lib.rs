//! Declarative schema reconciliation for MySQL.
//!
//! `tabula` takes a logical table name and a [`TableDescriptor`](schema::TableDescriptor)
//! and makes the live table match it:
//! - an absent table is created with a single `CREATE TABLE`
//! - an existing table is diffed column by column and altered in place
//! - missing indexes and foreign keys are added
//!
//! Every call re-reads the catalog, so reconciliation is idempotent: running
//! it again after success issues no statements, and running it again after a
//! partial failure retries only what is still missing.
//!
//! # Architecture
//!
//! - **Schema** - Declarative table descriptors
//! - **Catalog** - Live metadata lookups and DDL execution (`INFORMATION_SCHEMA`)
//! - **Normalize** - Canonical column definitions for comparison
//! - **Creator** / **Updater** - Create or alter one table
//! - **Foreign keys** - Attach missing constraints after the table exists
//! - **Reconciler** - Entry points tying it together
//! - **Registry** - Descriptors by table name, in dependency order
//!
//! # Example
//!
//! ```rust,ignore
//! use tabula::prelude::*;
//!
//! let pool = sqlx::MySqlPool::connect("mysql://root@localhost/app").await?;
//! let reconciler = Reconciler::new(
//!     MySqlCatalog::new(pool),
//!     EngineConfig::new().table_prefix("wp_"),
//! );
//!
//! let books = TableDescriptor::new()
//!     .column("id", "BIGINT(20) UNSIGNED", "NOT NULL AUTO_INCREMENT")
//!     .column("title", "VARCHAR(255)", "NOT NULL")
//!     .primary_key(["id"])
//!     .index("title", IndexDef::new(["title($max_index_length)"]));
//!
//! let report = reconciler.reconcile("books", &books).await?;
//! assert!(report.is_clean());
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Create or update every table described in ./schema/*.json
//! tabula reconcile --schema-dir schema
//!
//! # Show the statements without running them
//! tabula plan --schema-dir schema
//!
//! # Print the canonical live columns of a table
//! tabula inspect wp_books
//! ```

pub mod catalog;
pub mod config;
pub mod creator;
pub mod dialect;
pub mod error;
pub mod foreign_keys;
pub mod normalize;
pub mod operations;
pub mod reconciler;
pub mod registry;
pub mod report;
pub mod schema;
pub mod updater;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{DdlExecutor, LiveColumn, MySqlCatalog, SchemaInspector};
    pub use crate::config::{EngineConfig, ReconcileMode};
    pub use crate::creator::SchemaCreator;
    pub use crate::dialect::MySqlDialect;
    pub use crate::error::{ReconcileError, Result};
    pub use crate::foreign_keys::ForeignKeyAttacher;
    pub use crate::normalize::normalize;
    pub use crate::operations::{OperationKind, SchemaChange};
    pub use crate::reconciler::Reconciler;
    pub use crate::registry::SchemaRegistry;
    pub use crate::report::{OperationRecord, OperationStatus, ReconcileReport, TableOutcome};
    pub use crate::schema::{
        ColumnDef, ForeignKeyAction, ForeignKeyDef, IndexDef, TableDescriptor, MAX_INDEX_LENGTH,
    };
    pub use crate::updater::SchemaUpdater;
}
