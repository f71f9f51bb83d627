use rusqlite::{params, Row};

use super::{optional, Database, DatabaseError, Result};
use crate::models::User;
use crate::schema::NOW_SQL;

const USER_COLUMNS: &str = "id, name, email, imageUrl, createdAt, updatedAt";

impl Database {
    /// Creates a user. `id` is the identity issued by the external auth provider.
    pub fn create_user(&self, id: &str, name: &str, email: &str, image_url: &str) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (id, name, email, imageUrl) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, email, image_url],
        )?;
        tracing::debug!(user_id = id, "user created");
        self.get_user(id)?
            .ok_or_else(|| DatabaseError::not_found("user", id))
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [id],
            Self::row_to_user,
        ))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            [email],
            Self::row_to_user,
        ))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY createdAt, id", USER_COLUMNS))?;
        let rows = stmt.query_map([], Self::row_to_user)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Updates the given fields, leaving `None` fields untouched.
    pub fn update_user(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<User> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE users SET name = COALESCE(?2, name), email = COALESCE(?3, email),
                 imageUrl = COALESCE(?4, imageUrl), updatedAt = {}
                 WHERE id = ?1",
                NOW_SQL
            ),
            params![id, name, email, image_url],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("user", id));
        }
        self.get_user(id)?
            .ok_or_else(|| DatabaseError::not_found("user", id))
    }

    /// Deletes a user. Fails with `ForeignKeyViolation` while saved jobs,
    /// cover letters or interview sessions still reference the user.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("user", id));
        }
        Ok(())
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            image_url: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[test]
    fn test_create_and_fetch_user() {
        let db = test_support::db();
        let user = db.create_user("user_1", "Ada", "ada@example.com", "https://img/ada.png").unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.created_at.ends_with('Z'));

        let by_email = db.get_user_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, "user_1");
        assert!(db.get_user("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_a_unique_violation() {
        let db = test_support::db();
        db.create_user("u1", "Ada", "same@example.com", "img").unwrap();
        let err = db.create_user("u2", "Bob", "same@example.com", "img").unwrap_err();
        match err {
            DatabaseError::UniqueViolation { table, column } => {
                assert_eq!(table, "users");
                assert_eq!(column, "email");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_update_user_keeps_unset_fields() {
        let db = test_support::db();
        db.create_user("u1", "Ada", "ada@example.com", "img").unwrap();
        let updated = db.update_user("u1", Some("Ada L."), None, None).unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.email, "ada@example.com");
        assert!(updated.updated_at >= updated.created_at);

        let err = db.update_user("nobody", Some("x"), None, None).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn test_update_user_refreshes_updated_at() {
        let db = test_support::db();
        let before = db.create_user("u1", "Ada", "ada@example.com", "img").unwrap();
        test_support::tick();
        let after = db.update_user("u1", None, Some("ada@work.example"), None).unwrap();
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn test_delete_user_with_saved_job_is_restricted() {
        let db = test_support::db();
        test_support::user(&db, "u1", "ada@example.com");
        let job = test_support::scraped_job_id(&db, "https://jobs.example/1");
        let saved = db.save_job("u1", &job, 80).unwrap();

        let err = db.delete_user("u1").unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKeyViolation));
        assert!(db.get_user("u1").unwrap().is_some());

        db.unsave_job(&saved.id).unwrap();
        db.delete_user("u1").unwrap();
        assert!(db.get_user("u1").unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_user() {
        let db = test_support::db();
        assert!(matches!(
            db.delete_user("ghost").unwrap_err(),
            DatabaseError::NotFound { entity: "user", .. }
        ));
    }
}
