//! Registry of table descriptors.
//!
//! The host builds one registry at startup, registers a descriptor per
//! logical table and hands it to
//! [`Reconciler::reconcile_registry`](crate::reconciler::Reconciler::reconcile_registry).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::schema::TableDescriptor;

/// Longest accepted logical table name.
pub const MAX_TABLE_NAME_LENGTH: usize = 20;

/// Lowercases a name and strips everything but `a-z`, `0-9`, `_` and `-`.
#[must_use]
pub fn sanitize_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

/// Descriptors by logical table name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: IndexMap<String, TableDescriptor>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any previous one for the same name.
    ///
    /// The name is sanitized first; the sanitized name is returned.
    pub fn register(&mut self, name: &str, descriptor: TableDescriptor) -> Result<String> {
        let key = sanitize_key(name);
        if key.is_empty() || key.len() > MAX_TABLE_NAME_LENGTH {
            return Err(ReconcileError::InvalidTableName(name.to_string()));
        }
        descriptor.validate(&key)?;
        debug!(table = %key, "Registered table descriptor");
        self.tables.insert(key.clone(), descriptor);
        Ok(key)
    }

    /// Removes a descriptor.
    pub fn unregister(&mut self, name: &str) -> Result<TableDescriptor> {
        self.tables
            .shift_remove(&sanitize_key(name))
            .ok_or_else(|| ReconcileError::UnknownTable(name.to_string()))
    }

    /// Looks up a descriptor.
    pub fn get(&self, name: &str) -> Result<&TableDescriptor> {
        self.tables
            .get(&sanitize_key(name))
            .ok_or_else(|| ReconcileError::UnknownTable(name.to_string()))
    }

    /// Returns whether a descriptor is registered under this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&sanitize_key(name))
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Registered names in registration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Registers every `*.json` file in `dir`, named after the file stem.
    ///
    /// Files are read in name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let io_err = |source| ReconcileError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            let descriptor = TableDescriptor::from_file(path)?;
            self.register(name, descriptor)?;
        }
        Ok(paths.len())
    }

    /// Table names ordered so that every table comes after the registered
    /// tables its foreign keys reference.
    ///
    /// Self references and references to unregistered tables are ignored.
    /// Otherwise registration order is kept.
    pub fn creation_order(&self) -> Result<Vec<String>> {
        let mut ordered: Vec<String> = Vec::with_capacity(self.tables.len());
        let mut placed: HashSet<&str> = HashSet::new();

        while ordered.len() < self.tables.len() {
            let mut progressed = false;
            for (name, descriptor) in &self.tables {
                if placed.contains(name.as_str()) {
                    continue;
                }
                let ready = descriptor.referenced_tables().all(|referenced| {
                    referenced == name.as_str()
                        || !self.tables.contains_key(referenced)
                        || placed.contains(referenced)
                });
                if ready {
                    placed.insert(name.as_str());
                    ordered.push(name.clone());
                    progressed = true;
                }
            }

            if !progressed {
                let remaining = self
                    .tables
                    .keys()
                    .filter(|name| !placed.contains(name.as_str()))
                    .cloned()
                    .collect();
                return Err(ReconcileError::CircularDependency(remaining));
            }
        }

        Ok(ordered)
    }
}
