//! Column definitions used at table-creation time

use std::fmt;

/// SQLite storage class for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }
}

/// Column constraint applied at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Constraint {
    #[default]
    None,
    PrimaryKey,
    Unique,
    NotNull,
}

impl Constraint {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Constraint::None => "",
            Constraint::PrimaryKey => "PRIMARY KEY",
            Constraint::Unique => "UNIQUE",
            Constraint::NotNull => "NOT NULL",
        }
    }
}

/// One column of a table schema: name, storage type, constraint.
/// Immutable; only consumed by [`SqliteStore::create_table`].
///
/// [`SqliteStore::create_table`]: super::SqliteStore::create_table
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: SqlType,
    pub constraint: Constraint,
}

impl ColumnSpec {
    pub fn new(name: &str, data_type: SqlType, constraint: Constraint) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraint,
        }
    }

    /// Render the column definition fragment for CREATE TABLE
    pub fn to_sql(&self) -> String {
        let constraint = self.constraint.as_sql();
        if constraint.is_empty() {
            format!("{} {}", self.name, self.data_type.as_sql())
        } else {
            format!("{} {} {}", self.name, self.data_type.as_sql(), constraint)
        }
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

/// Catalog view of one column, as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub is_primary_key: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_to_sql() {
        let spec = ColumnSpec::new("organisation_name", SqlType::Text, Constraint::PrimaryKey);
        assert_eq!(spec.to_sql(), "organisation_name TEXT PRIMARY KEY");
    }

    #[test]
    fn test_column_spec_without_constraint() {
        let spec = ColumnSpec::new("notes", SqlType::Text, Constraint::None);
        assert_eq!(spec.to_sql(), "notes TEXT");
    }
}
