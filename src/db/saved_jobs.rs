use rusqlite::{params, Row};

use super::{new_id, optional, Database, DatabaseError, Result};
use crate::models::{SavedJob, SavedJobDetail};
use crate::schema::NOW_SQL;

impl Database {
    /// Saves a scraped job for a user with its match score.
    pub fn save_job(&self, user_id: &str, job_id: &str, ai_match_score: i64) -> Result<SavedJob> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO saved_jobs (id, userId, jobId, aiMatchScore) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, job_id, ai_match_score],
        )?;
        self.get_saved_job(&id)?
            .ok_or_else(|| DatabaseError::not_found("saved job", id.clone()))
    }

    pub fn get_saved_job(&self, id: &str) -> Result<Option<SavedJob>> {
        optional(self.conn.query_row(
            "SELECT id, userId, jobId, aiMatchScore, createdAt, updatedAt FROM saved_jobs WHERE id = ?1",
            [id],
            Self::row_to_saved_job,
        ))
    }

    /// A user's saved jobs with their posting details, best match first.
    pub fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<SavedJobDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.userId, s.jobId, s.aiMatchScore, s.createdAt, s.updatedAt,
                    j.title, j.companyName, j.sourceUrl
             FROM saved_jobs s
             JOIN scraped_jobs j ON s.jobId = j.id
             WHERE s.userId = ?1
             ORDER BY s.aiMatchScore DESC, s.createdAt DESC",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(SavedJobDetail {
                saved: Self::row_to_saved_job(row)?,
                title: row.get(6)?,
                company_name: row.get(7)?,
                source_url: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_match_score(&self, id: &str, ai_match_score: i64) -> Result<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE saved_jobs SET aiMatchScore = ?2, updatedAt = {} WHERE id = ?1",
                NOW_SQL
            ),
            params![id, ai_match_score],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("saved job", id));
        }
        Ok(())
    }

    pub fn unsave_job(&self, id: &str) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM saved_jobs WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("saved job", id));
        }
        Ok(())
    }

    fn row_to_saved_job(row: &Row) -> rusqlite::Result<SavedJob> {
        Ok(SavedJob {
            id: row.get(0)?,
            user_id: row.get(1)?,
            job_id: row.get(2)?,
            ai_match_score: row.get(3)?,
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
    fn test_saved_jobs_are_ordered_by_score() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let low = test_support::scraped_job_id(&db, "https://jobs.example/low");
        let high = test_support::scraped_job_id(&db, "https://jobs.example/high");

        db.save_job("u1", &low, 40).unwrap();
        let best = db.save_job("u1", &high, 92).unwrap();

        let saved = db.list_saved_jobs("u1").unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].saved.id, best.id);
        assert_eq!(saved[0].source_url, "https://jobs.example/high");
        assert_eq!(saved[0].company_name, "Acme");

        db.update_match_score(&saved[1].saved.id, 99).unwrap();
        assert_eq!(db.list_saved_jobs("u1").unwrap()[0].saved.ai_match_score, 99);
    }

    #[test]
    fn test_saving_requires_existing_user_and_job() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let job = test_support::scraped_job_id(&db, "https://jobs.example/1");

        assert!(matches!(
            db.save_job("ghost", &job, 10).unwrap_err(),
            DatabaseError::ForeignKeyViolation
        ));
        assert!(matches!(
            db.save_job("u1", "00000000-0000-0000-0000-000000000000", 10).unwrap_err(),
            DatabaseError::ForeignKeyViolation
        ));
    }
}
