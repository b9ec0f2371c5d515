#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use indexmap::IndexMap;
use regex::Regex;
use tabula::prelude::*;

/// Keywords that end the type part of a column definition.
const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "NOT",
    "NULL",
    "DEFAULT",
    "AUTO_INCREMENT",
    "ON",
    "COMMENT",
    "PRIMARY",
    "UNIQUE",
];

/// MySQL 8.0.19 and later no longer report integer display widths.
static DISPLAY_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(tinyint|smallint|mediumint|int|integer|bigint)\(\d+\)").unwrap()
});

/// Which server's `INFORMATION_SCHEMA.COLUMNS` format the fake reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Flavour {
    #[default]
    MySql,
    MariaDb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoredDefault {
    Literal(String),
    Number(String),
    /// Upper-case function name without parentheses, e.g. `CURRENT_TIMESTAMP`.
    Expression(String),
}

/// A column as the server keeps it, independent of how it is reported.
#[derive(Debug, Clone)]
struct StoredColumn {
    column_type: String,
    nullable: bool,
    default: Option<StoredDefault>,
    auto_increment: bool,
    on_update: Option<String>,
}

impl StoredColumn {
    /// `(COLUMN_TYPE, COLUMN_DEFAULT, EXTRA)` as the server reports them.
    fn catalog_row(&self, flavour: Flavour) -> (String, Option<String>, String) {
        let mut extra = Vec::new();
        if self.auto_increment {
            extra.push("auto_increment".to_string());
        }
        match flavour {
            Flavour::MySql => {
                let default = match &self.default {
                    Some(StoredDefault::Literal(value) | StoredDefault::Number(value)) => {
                        Some(value.clone())
                    }
                    Some(StoredDefault::Expression(name)) => {
                        extra.push("DEFAULT_GENERATED".to_string());
                        Some(name.clone())
                    }
                    None => None,
                };
                if let Some(name) = &self.on_update {
                    extra.push(format!("on update {name}"));
                }
                let column_type = DISPLAY_WIDTH
                    .replace_all(&self.column_type, "${1}")
                    .into_owned();
                (column_type, default, extra.join(" "))
            }
            Flavour::MariaDb => {
                let default = match &self.default {
                    Some(StoredDefault::Literal(value)) => {
                        Some(format!("'{}'", value.replace('\'', "''")))
                    }
                    Some(StoredDefault::Number(value)) => Some(value.clone()),
                    Some(StoredDefault::Expression(name)) => {
                        Some(format!("{}()", name.to_lowercase()))
                    }
                    None if self.nullable => Some("NULL".to_string()),
                    None => None,
                };
                if let Some(name) = &self.on_update {
                    extra.push(format!("on update {}()", name.to_lowercase()));
                }
                (self.column_type.clone(), default, extra.join(" "))
            }
        }
    }

    fn live(&self, name: &str, flavour: Flavour) -> LiveColumn {
        let (column_type, default, extra) = self.catalog_row(flavour);
        LiveColumn::from_catalog(name, column_type, self.nullable, default, extra)
    }
}

#[derive(Debug, Default)]
struct FakeTable {
    columns: IndexMap<String, StoredColumn>,
    primary_key: Vec<String>,
    indexes: HashSet<String>,
    foreign_keys: HashSet<String>,
}

#[derive(Debug, Default)]
struct State {
    tables: IndexMap<String, FakeTable>,
    executed: Vec<String>,
    failing: Vec<String>,
    ignore_creates: bool,
    flavour: Flavour,
}

/// In-memory MySQL catalog that understands the DDL tabula generates.
///
/// Columns are stored parsed and reported in the raw form the server would
/// use, MySQL 8 by default or MariaDB with [`FakeDatabase::mariadb`], and go
/// through [`LiveColumn::from_catalog`] like real catalog rows.
///
/// Clones share state, so a test can keep a handle while a reconciler owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<State>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake reporting columns the way MariaDB 10.2.7+ does.
    pub fn mariadb() -> Self {
        let db = Self::default();
        db.state().flavour = Flavour::MariaDb;
        db
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Adds a table directly, without recording a statement.
    pub fn seed_table(&self, table: &str, columns: &[(&str, &str)]) {
        let mut fake = FakeTable::default();
        for (name, definition) in columns {
            let column = parse_column(definition).unwrap_or_else(|e| panic!("{name}: {e}"));
            fake.columns.insert((*name).to_string(), column);
        }
        self.state().tables.insert(table.to_string(), fake);
    }

    /// `COLUMN_DEFAULT` exactly as the catalog reports it, before folding.
    pub fn raw_default(&self, table: &str, column: &str) -> Option<String> {
        let state = self.state();
        let stored = &state.tables[table].columns[column];
        stored.catalog_row(state.flavour).1
    }

    pub fn seed_index(&self, table: &str, index: &str) {
        self.state()
            .tables
            .get_mut(table)
            .unwrap_or_else(|| panic!("no table {table}"))
            .indexes
            .insert(index.to_string());
    }

    pub fn seed_foreign_key(&self, table: &str, constraint: &str) {
        self.state()
            .tables
            .get_mut(table)
            .unwrap_or_else(|| panic!("no table {table}"))
            .foreign_keys
            .insert(constraint.to_string());
    }

    /// Makes every statement containing `fragment` fail.
    pub fn fail_when(&self, fragment: &str) {
        self.state().failing.push(fragment.to_string());
    }

    /// Accepts `CREATE TABLE` statements without creating anything.
    pub fn ignore_creates(&self) {
        self.state().ignore_creates = true;
    }

    /// Statements that reached the database, including failed ones.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn clear_executed(&self) {
        self.state().executed.clear();
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state().tables.contains_key(table)
    }

    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.state()
            .tables
            .get(table)
            .map(|t| t.columns.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_index(&self, table: &str, index: &str) -> bool {
        self.state()
            .tables
            .get(table)
            .is_some_and(|t| t.indexes.contains(index))
    }

    pub fn has_foreign_key(&self, table: &str, constraint: &str) -> bool {
        self.state()
            .tables
            .get(table)
            .is_some_and(|t| t.foreign_keys.contains(constraint))
    }

    fn apply(&self, sql: &str) -> std::result::Result<(), String> {
        let mut state = self.state();
        state.executed.push(sql.to_string());

        if state.failing.iter().any(|fragment| sql.contains(fragment)) {
            return Err("injected failure".to_string());
        }

        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let (table, body) = take_identifier(rest);
            if state.tables.contains_key(&table) {
                return Err(format!("Table '{table}' already exists"));
            }
            if state.ignore_creates {
                return Ok(());
            }
            let body = body
                .strip_prefix("(\n  ")
                .and_then(|b| b.rsplit_once("\n)"))
                .map(|(clauses, _)| clauses)
                .ok_or("malformed CREATE TABLE")?;

            let mut fake = FakeTable::default();
            for clause in body.split(",\n  ") {
                if clause.starts_with('`') {
                    let (name, definition) = take_identifier(clause);
                    fake.columns.insert(name, parse_column(definition)?);
                } else if let Some(key) = clause
                    .strip_prefix("UNIQUE KEY ")
                    .or_else(|| clause.strip_prefix("KEY "))
                {
                    fake.indexes.insert(take_identifier(key).0);
                } else if let Some(columns) = clause.strip_prefix("PRIMARY KEY ") {
                    fake.primary_key = columns
                        .trim_matches(|c| c == '(' || c == ')')
                        .split(',')
                        .map(|name| name.trim().trim_matches('`').to_string())
                        .collect();
                    fake.indexes.insert("PRIMARY".to_string());
                } else {
                    return Err(format!("unsupported clause: {clause}"));
                }
            }
            for name in &fake.primary_key {
                fake.columns
                    .get_mut(name)
                    .ok_or_else(|| format!("Key column '{name}' doesn't exist in table"))?
                    .nullable = false;
            }
            state.tables.insert(table, fake);
            return Ok(());
        }

        let rest = sql
            .strip_prefix("ALTER TABLE ")
            .ok_or_else(|| format!("unsupported statement: {sql}"))?;
        let (table, action) = take_identifier(rest);

        if let Some(fk) = action.strip_prefix("ADD CONSTRAINT ") {
            let referenced = fk
                .split_once(" REFERENCES ")
                .map(|(_, r)| take_identifier(r).0)
                .ok_or("malformed foreign key")?;
            if !state.tables.contains_key(&referenced) {
                return Err(format!("Failed to open the referenced table '{referenced}'"));
            }
            let name = take_identifier(fk).0;
            let fake = table_mut(&mut state, &table)?;
            if !fake.foreign_keys.insert(name.clone()) {
                return Err(format!("Duplicate foreign key constraint name '{name}'"));
            }
            return Ok(());
        }

        let fake = table_mut(&mut state, &table)?;
        if let Some(column) = action.strip_prefix("ADD COLUMN ") {
            let (name, definition) = take_identifier(column);
            if fake.columns.contains_key(&name) {
                return Err(format!("Duplicate column name '{name}'"));
            }
            fake.columns.insert(name, parse_column(definition)?);
        } else if let Some(column) = action.strip_prefix("MODIFY COLUMN ") {
            let (name, definition) = take_identifier(column);
            let mut replacement = parse_column(definition)?;
            if fake.primary_key.contains(&name) {
                replacement.nullable = false;
            }
            let slot = fake
                .columns
                .get_mut(&name)
                .ok_or_else(|| format!("Unknown column '{name}'"))?;
            *slot = replacement;
        } else if let Some(column) = action.strip_prefix("DROP COLUMN ") {
            let name = take_identifier(column).0;
            fake.columns
                .shift_remove(&name)
                .ok_or_else(|| format!("Can't DROP '{name}'"))?;
        } else if let Some(index) = action
            .strip_prefix("ADD UNIQUE INDEX ")
            .or_else(|| action.strip_prefix("ADD INDEX "))
        {
            let name = take_identifier(index).0;
            if !fake.indexes.insert(name.clone()) {
                return Err(format!("Duplicate key name '{name}'"));
            }
        } else {
            return Err(format!("unsupported ALTER: {action}"));
        }
        Ok(())
    }
}

fn table_mut<'a>(state: &'a mut State, table: &str) -> std::result::Result<&'a mut FakeTable, String> {
    state
        .tables
        .get_mut(table)
        .ok_or_else(|| format!("Table '{table}' doesn't exist"))
}

/// Splits a leading `` `name` `` from the rest of the text.
fn take_identifier(text: &str) -> (String, &str) {
    let inner = text.strip_prefix('`').unwrap_or(text);
    match inner.find('`') {
        Some(end) => (inner[..end].to_string(), inner[end + 1..].trim()),
        None => (inner.to_string(), ""),
    }
}

/// Splits a definition on whitespace, keeping quoted literals whole.
fn tokenize(definition: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = definition.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if quoted && chars.peek() == Some(&'\'') => {
                current.push_str("''");
                chars.next();
            }
            '\'' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn expression_name(token: &str) -> String {
    token.trim_end_matches("()").to_uppercase()
}

fn parse_default(token: &str) -> Option<StoredDefault> {
    if let Some(inner) = token
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Some(StoredDefault::Literal(inner.replace("''", "'")));
    }
    if token.eq_ignore_ascii_case("NULL") {
        return None;
    }
    if token.parse::<f64>().is_ok() {
        return Some(StoredDefault::Number(token.to_string()));
    }
    Some(StoredDefault::Expression(expression_name(token)))
}

/// Parses a column definition the way the server stores it.
fn parse_column(definition: &str) -> std::result::Result<StoredColumn, String> {
    let tokens = tokenize(definition);
    let split = tokens
        .iter()
        .position(|t| ATTRIBUTE_KEYWORDS.contains(&t.to_uppercase().as_str()))
        .unwrap_or(tokens.len());

    let mut column = StoredColumn {
        column_type: tokens[..split].join(" ").to_lowercase(),
        nullable: true,
        default: None,
        auto_increment: false,
        on_update: None,
    };

    let mut rest = tokens[split..].iter();
    while let Some(token) = rest.next() {
        match token.to_uppercase().as_str() {
            "NOT" => match rest.next() {
                Some(next) if next.eq_ignore_ascii_case("NULL") => column.nullable = false,
                _ => return Err(format!("expected NULL after NOT in: {definition}")),
            },
            "NULL" => column.nullable = true,
            "DEFAULT" => {
                let value = rest.next().ok_or("DEFAULT without a value")?;
                column.default = parse_default(value);
            }
            "AUTO_INCREMENT" => column.auto_increment = true,
            "ON" => match (rest.next(), rest.next()) {
                (Some(update), Some(value)) if update.eq_ignore_ascii_case("UPDATE") => {
                    column.on_update = Some(expression_name(value));
                }
                _ => return Err(format!("expected ON UPDATE in: {definition}")),
            },
            _ => return Err(format!("unsupported column attribute: {token}")),
        }
    }
    Ok(column)
}

fn database_error(message: String) -> ReconcileError {
    ReconcileError::Database(sqlx::Error::Protocol(message))
}

impl SchemaInspector for FakeDatabase {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.has_table(table))
    }

    async fn live_columns(&self, table: &str) -> Result<Vec<LiveColumn>> {
        let state = self.state();
        Ok(state
            .tables
            .get(table)
            .map(|t| {
                t.columns
                    .iter()
                    .map(|(name, column)| column.live(name, state.flavour))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        Ok(self.has_index(table, index))
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        Ok(self.has_foreign_key(table, constraint))
    }
}

impl DdlExecutor for FakeDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        self.apply(sql).map(|()| 0).map_err(database_error)
    }
}

pub fn reconciler(db: &FakeDatabase, config: EngineConfig) -> Reconciler<FakeDatabase> {
    Reconciler::new(db.clone(), config)
}

/// Configuration used by most tests: `wp_` prefix, additive mode.
pub fn wp_config() -> EngineConfig {
    EngineConfig::new().table_prefix("wp_")
}

pub fn books() -> TableDescriptor {
    TableDescriptor::new()
        .column("id", "BIGINT(20) UNSIGNED", "NOT NULL AUTO_INCREMENT")
        .column("title", "VARCHAR(255)", "NOT NULL")
        .column("status", "VARCHAR(20)", "NOT NULL DEFAULT 'draft'")
        .column("summary", "TEXT", "")
        .primary_key(["id"])
        .index("title", IndexDef::new(["title($max_index_length)"]))
}

pub fn authors() -> TableDescriptor {
    TableDescriptor::new()
        .column("id", "BIGINT(20) UNSIGNED", "NOT NULL AUTO_INCREMENT")
        .column("name", "VARCHAR(255)", "NOT NULL")
        .primary_key(["id"])
}

pub fn books_with_author() -> TableDescriptor {
    books()
        .column("author_id", "BIGINT(20) UNSIGNED", "")
        .foreign_key(
            "fk_books_author",
            ForeignKeyDef::new(["author_id"], "authors", ["id"])
                .on_delete(ForeignKeyAction::SetNull),
        )
}
