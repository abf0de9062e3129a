//! SQLite storage facade
//!
//! Every storage-level failure is caught at this boundary, logged, and
//! absorbed. Callers that need to confirm an effect re-query (compare
//! column-value sets before/after). The one exception is the missing
//! primary key on update, which propagates as [`Error::NoPrimaryKey`].

use std::collections::HashMap;
use std::iter;
use std::path::PathBuf;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, params_from_iter};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{error, info, warn};

use super::schema::{ColumnInfo, ColumnSpec};
use crate::{Error, Result};

/// CRUD facade over one SQLite database file
pub struct SqliteStore {
    db_file: PathBuf,
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Record the database file path; nothing is opened until [`connect`]
    ///
    /// [`connect`]: SqliteStore::connect
    pub fn new(db_file: impl Into<PathBuf>) -> Self {
        Self {
            db_file: db_file.into(),
            conn: None,
        }
    }

    /// Open the file-backed connection. Calling while already connected
    /// is a no-op. An open failure is logged and the connection stays
    /// unset.
    pub fn connect(&mut self) {
        if self.conn.is_some() {
            return;
        }
        match Connection::open(&self.db_file) {
            Ok(conn) => {
                info!("Connected to {}", self.db_file.display());
                self.conn = Some(conn);
            }
            Err(e) => error!("Error connecting to the database: {e}"),
        }
    }

    /// Close and clear the connection if open; idempotent
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                error!("Error closing the database: {e}");
            }
            info!("Disconnected from {}", self.db_file.display());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::NotConnected)
    }

    // ========== Table Operations ==========

    /// Create a table with the given columns. Re-creating an existing
    /// table with the same name is a no-op, not an error.
    pub fn create_table(&self, table: &str, columns: &[ColumnSpec]) {
        match self.try_create_table(table, columns) {
            Ok(()) => info!("Table \"{table}\" created successfully"),
            Err(e) => error!("Error creating table: {e}"),
        }
    }

    fn try_create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        let conn = self.connection()?;
        let column_defs = columns
            .iter()
            .map(ColumnSpec::to_sql)
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("CREATE TABLE IF NOT EXISTS {table} ({column_defs})");
        conn.execute(&sql, [])?;
        Ok(())
    }

    /// Inspect the table's columns via the engine catalog. Re-read on
    /// every call so schema changes are always reflected.
    pub fn describe_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    is_primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    // ========== Row Operations ==========

    /// Insert one row, given as (column, value) pairs. A duplicate that
    /// violates a primary-key or unique constraint is reported as a
    /// warning and absorbed; other storage errors are logged and
    /// absorbed.
    pub fn insert(&self, table: &str, row: &[(&str, &str)]) {
        match self.try_insert(table, row) {
            Ok(()) => info!("Inserted row into \"{table}\""),
            Err(Error::Storage(rusqlite::Error::SqliteFailure(e, msg)))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                warn!("Duplicate data not inserted: {}", msg.unwrap_or_default());
            }
            Err(e) => error!("Error inserting data: {e}"),
        }
    }

    fn try_insert(&self, table: &str, row: &[(&str, &str)]) -> Result<()> {
        let conn = self.connection()?;
        let columns = row.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; row.len()].join(", ");
        let sql = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");
        conn.execute(&sql, params_from_iter(row.iter().map(|(_, v)| *v)))?;
        Ok(())
    }

    /// Delete every row where any column equals `value` exactly. No
    /// substring matching: a value that is only part of a stored string
    /// deletes nothing.
    pub fn delete_by_exact_match(&self, table: &str, value: &str) {
        match self.try_delete_by_exact_match(table, value) {
            Ok(0) => info!("No deletion: \"{value}\" not found in \"{table}\""),
            Ok(n) => info!("Success: {n} row(s) containing \"{value}\" deleted"),
            Err(e) => error!("Error deleting data: {e}"),
        }
    }

    fn try_delete_by_exact_match(&self, table: &str, value: &str) -> Result<usize> {
        let conn = self.connection()?;
        let columns = self.describe_columns(table)?;
        let predicate = match_any_column(&columns);
        let sql = format!("DELETE FROM {table} WHERE {predicate}");
        let affected = conn.execute(
            &sql,
            params_from_iter(iter::repeat(value).take(columns.len())),
        )?;
        Ok(affected)
    }

    /// Update the named columns for the row whose primary-key column
    /// equals `primary_key_value`. The primary-key column is resolved
    /// from the catalog at call time.
    ///
    /// Returns the affected-row count. Propagates [`Error::NoPrimaryKey`]
    /// when the schema declares none; storage errors are logged and
    /// absorbed as `Ok(0)`.
    pub fn update_row(
        &self,
        table: &str,
        primary_key_value: &str,
        updates: &[(&str, &str)],
    ) -> Result<usize> {
        let columns = match self.describe_columns(table) {
            Ok(columns) => columns,
            Err(e) => {
                error!("Error updating data: {e}");
                return Ok(0);
            }
        };
        let primary_key = columns
            .iter()
            .find(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .ok_or_else(|| Error::NoPrimaryKey(table.to_string()))?;

        match self.try_update_row(table, &primary_key, primary_key_value, updates) {
            Ok(0) => {
                info!("No update: no row with {primary_key} = \"{primary_key_value}\"");
                Ok(0)
            }
            Ok(n) => {
                info!("Updated {n} row(s) where {primary_key} = \"{primary_key_value}\"");
                Ok(n)
            }
            Err(e) => {
                error!("Error updating data: {e}");
                Ok(0)
            }
        }
    }

    fn try_update_row(
        &self,
        table: &str,
        primary_key: &str,
        primary_key_value: &str,
        updates: &[(&str, &str)],
    ) -> Result<usize> {
        let conn = self.connection()?;
        let set_clause = updates
            .iter()
            .map(|(c, _)| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {table} SET {set_clause} WHERE {primary_key} = ?");
        let params = updates
            .iter()
            .map(|(_, v)| *v)
            .chain(iter::once(primary_key_value));
        let affected = conn.execute(&sql, params_from_iter(params))?;
        Ok(affected)
    }

    // ========== Queries ==========

    /// Values of one column across all rows, in database row order.
    /// Errors are logged; an empty vec comes back on failure.
    pub fn get_column_values(&self, table: &str, column: &str) -> Vec<String> {
        match self.try_get_column_values(table, column) {
            Ok(values) => values,
            Err(e) => {
                error!("Error getting column values: {e}");
                Vec::new()
            }
        }
    }

    fn try_get_column_values(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT {column} FROM {table}"))?;
        let values = stmt
            .query_map([], |row| Ok(value_to_string(row.get_ref(0)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// First row where any column equals `value` exactly, as a
    /// column-to-value map. `None` when no row matches; absence is not
    /// an error.
    pub fn get_row_by_exact_match(
        &self,
        table: &str,
        value: &str,
    ) -> Option<HashMap<String, String>> {
        match self.try_get_row_by_exact_match(table, value) {
            Ok(row) => row,
            Err(e) => {
                error!("Error getting row containing \"{value}\": {e}");
                None
            }
        }
    }

    fn try_get_row_by_exact_match(
        &self,
        table: &str,
        value: &str,
    ) -> Result<Option<HashMap<String, String>>> {
        let conn = self.connection()?;
        let columns = self.describe_columns(table)?;
        let predicate = match_any_column(&columns);
        let sql = format!("SELECT * FROM {table} WHERE {predicate}");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(iter::repeat(value).take(columns.len())))?;

        match rows.next()? {
            Some(row) => {
                let mut mapped = HashMap::with_capacity(columns.len());
                for (i, column) in columns.iter().enumerate() {
                    mapped.insert(column.name.clone(), value_to_string(row.get_ref(i)?));
                }
                Ok(Some(mapped))
            }
            None => Ok(None),
        }
    }

    /// Print a column-aligned grid of all rows to stdout and return the
    /// row data. Logs "table is empty" and returns an empty vec when
    /// there are no rows.
    pub fn dump_table(&self, table: &str) -> Vec<Vec<String>> {
        let (column_names, rows) = match self.try_fetch_all(table) {
            Ok(data) => data,
            Err(e) => {
                error!("Error showing table data: {e}");
                return Vec::new();
            }
        };

        if rows.is_empty() {
            info!("Table \"{table}\" is empty");
            return Vec::new();
        }

        let mut builder = Builder::default();
        builder.push_record(column_names);
        for row in &rows {
            builder.push_record(row.clone());
        }
        let mut grid = builder.build();
        println!("\n{}", grid.with(Style::rounded()));

        rows
    }

    fn try_fetch_all(&self, table: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {table}"))?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = column_names.len();
        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(value_to_string(row.get_ref(i)?));
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((column_names, rows))
    }
}

/// OR-joined exact-equality predicate over every column, shared by
/// delete and lookup
fn match_any_column(columns: &[ColumnInfo]) -> String {
    columns
        .iter()
        .map(|c| format!("{} = ?", c.name))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
