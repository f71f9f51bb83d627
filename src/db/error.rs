//! Database error types.

use rusqlite::ffi;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
///
/// Constraint failures reported by SQLite are classified into their own
/// variants so callers can tell a duplicate key from a missing parent row.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("duplicate value for unique column {table}.{column}")]
    UniqueViolation { table: String, column: String },

    /// A referenced parent row is missing, or a parent still has dependents.
    #[error("foreign key constraint failed")]
    ForeignKeyViolation,

    #[error("missing value for required column {table}.{column}")]
    NotNullViolation { table: String, column: String },

    /// A value outside an enumerated column's literal set.
    #[error("check constraint failed: {0}")]
    CheckViolation(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::UniqueViolation { .. }
                | DatabaseError::ForeignKeyViolation
                | DatabaseError::NotNullViolation { .. }
                | DatabaseError::CheckViolation(_)
        )
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        let rusqlite::Error::SqliteFailure(failure, message) = &err else {
            return DatabaseError::Sqlite(err);
        };
        if failure.code != rusqlite::ErrorCode::ConstraintViolation {
            return DatabaseError::Sqlite(err);
        }
        let detail = message.as_deref().unwrap_or_default();

        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                let (table, column) = split_column(detail);
                DatabaseError::UniqueViolation { table, column }
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL => {
                let (table, column) = split_column(detail);
                DatabaseError::NotNullViolation { table, column }
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => DatabaseError::ForeignKeyViolation,
            ffi::SQLITE_CONSTRAINT_CHECK => DatabaseError::CheckViolation(
                detail
                    .strip_prefix("CHECK constraint failed: ")
                    .unwrap_or(detail)
                    .to_string(),
            ),
            _ => DatabaseError::Sqlite(err),
        }
    }
}

// SQLite reports e.g. "UNIQUE constraint failed: users.email". Composite keys
// list several columns; the first one is enough to identify the constraint.
fn split_column(message: &str) -> (String, String) {
    let target = message
        .rsplit_once(": ")
        .map(|(_, t)| t)
        .unwrap_or(message);
    let first = target.split(',').next().unwrap_or(target).trim();
    match first.split_once('.') {
        Some((table, column)) => (table.to_string(), column.to_string()),
        None => (String::new(), first.to_string()),
    }
}
