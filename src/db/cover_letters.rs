use rusqlite::{params, Row};

use super::{new_id, optional, Database, DatabaseError, Result};
use crate::models::GeneratedCoverLetter;
use crate::schema::NOW_SQL;

const LETTER_COLUMNS: &str = "id, userId, jobId, coverLetter, createdAt, updatedAt";

impl Database {
    /// Records a cover letter for a user and job. Passing `None` leaves the
    /// letter pending until `set_cover_letter_text` fills it in.
    pub fn create_cover_letter(
        &self,
        user_id: &str,
        job_id: &str,
        text: Option<&str>,
    ) -> Result<GeneratedCoverLetter> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO generated_cover_letters (id, userId, jobId, coverLetter) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, job_id, text],
        )?;
        self.get_cover_letter(&id)?
            .ok_or_else(|| DatabaseError::not_found("cover letter", id.clone()))
    }

    pub fn get_cover_letter(&self, id: &str) -> Result<Option<GeneratedCoverLetter>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM generated_cover_letters WHERE id = ?1", LETTER_COLUMNS),
            [id],
            Self::row_to_cover_letter,
        ))
    }

    pub fn set_cover_letter_text(&self, id: &str, text: &str) -> Result<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE generated_cover_letters SET coverLetter = ?2, updatedAt = {} WHERE id = ?1",
                NOW_SQL
            ),
            params![id, text],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("cover letter", id));
        }
        Ok(())
    }

    pub fn list_cover_letters(&self, user_id: &str) -> Result<Vec<GeneratedCoverLetter>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM generated_cover_letters WHERE userId = ?1 ORDER BY createdAt DESC",
            LETTER_COLUMNS
        ))?;
        let rows = stmt.query_map([user_id], Self::row_to_cover_letter)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_cover_letter(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM generated_cover_letters WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("cover letter", id));
        }
        Ok(())
    }

    fn row_to_cover_letter(row: &Row) -> rusqlite::Result<GeneratedCoverLetter> {
        Ok(GeneratedCoverLetter {
            id: row.get(0)?,
            user_id: row.get(1)?,
            job_id: row.get(2)?,
            cover_letter: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
