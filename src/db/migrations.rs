//! Schema migrations.
//!
//! Applied migrations are recorded in `_migrations`; each runs at most once.

use rusqlite::Connection;

use super::error::DatabaseError;
use crate::schema;

struct Migration {
    version: u32,
    description: &'static str,
    apply: fn(&Connection) -> rusqlite::Result<()>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create_schema",
    apply: create_schema,
}];

fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    for table in schema::tables() {
        conn.execute_batch(&table.create_table_sql())?;
        for index in table.create_index_sql() {
            conn.execute_batch(&index)?;
        }
    }
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Runs all pending migrations, each inside its own transaction.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT ({})
        );",
        schema::NOW_SQL
    ))?;

    let current = current_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            "Running migration: {}",
            migration.description
        );

        let tx = conn.unchecked_transaction()?;
        (migration.apply)(&tx).map_err(|e| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
        tx.commit()?;
    }

    Ok(())
}
