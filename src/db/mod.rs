use rusqlite::Connection;
use std::path::{Path, PathBuf};

mod cover_letters;
pub mod error;
mod interviews;
mod job_listings;
pub mod migrations;
mod organizations;
mod saved_jobs;
mod scraped_jobs;
mod users;

pub use error::DatabaseError;
pub use job_listings::JobListingFilter;
pub use scraped_jobs::InsertOutcome;

pub type Result<T> = std::result::Result<T, DatabaseError>;

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens (or creates) the database at `path` and applies pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::init(conn, path.to_path_buf())?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, path: PathBuf) -> Result<Self> {
        // Foreign keys are off by default in SQLite and are per-connection.
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::run_all(&conn)?;
        tracing::debug!(version = migrations::latest_version(), "schema up to date");
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    /// Row counts per table, in schema order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        crate::schema::tables()
            .iter()
            .map(|t| -> Result<(&'static str, i64)> {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM \"{}\"", t.name),
                    [],
                    |row| row.get(0),
                )?;
                Ok((t.name, count))
            })
            .collect()
    }
}

/// Default on-disk location: the platform data directory, or the working
/// directory when none can be determined.
pub fn default_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "career-copilot") {
        proj_dirs.data_dir().join("career-copilot.db")
    } else {
        PathBuf::from("career-copilot.db")
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Maps `QueryReturnedNoRows` to `None`.
pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_runs_migrations() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), migrations::latest_version());
        assert_eq!(db.path(), &PathBuf::from(":memory:"));
    }

    #[test]
    fn test_open_file_db_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("copilot.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        let counts = db.table_counts().unwrap();
        assert_eq!(counts.len(), crate::schema::tables().len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copilot.db");
        {
            let db = Database::open(&path).unwrap();
            db.create_user("u1", "Ada", "ada@example.com", "img").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert!(db.get_user("u1").unwrap().is_some());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let on: i64 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn test_default_path() {
        assert!(default_path().ends_with("career-copilot.db"));
    }
}
