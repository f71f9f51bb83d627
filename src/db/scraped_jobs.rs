use rusqlite::{named_params, params_from_iter, Row};

use super::{new_id, optional, Database, DatabaseError, Result};
use crate::models::{NewScrapedJob, ScrapedJob};

const SCRAPED_COLUMNS: &str = "id, title, companyName, description, wage, locationRequirement,
    experienceLevel, location, sourceUrl, sourceSite, scrapedAt, postedAt";

const INSERT_SQL: &str = "INSERT INTO scraped_jobs (
        id, title, companyName, description, wage, locationRequirement,
        experienceLevel, location, sourceUrl, sourceSite, postedAt
    ) VALUES (
        :id, :title, :companyName, :description, :wage, :locationRequirement,
        :experienceLevel, :location, :sourceUrl, :sourceSite, :postedAt
    )";

/// Result of an idempotent scraped-job insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(String),
    /// A row with the same `sourceUrl` already exists.
    Duplicate,
}

impl Database {
    /// Inserts a scraped job, silently skipping it when its `sourceUrl` has
    /// been seen before. Re-running a scrape is therefore harmless.
    pub fn insert_scraped_job(&self, job: &NewScrapedJob) -> Result<InsertOutcome> {
        let id = new_id();
        let inserted = self.execute_scraped_insert(
            &format!("{} ON CONFLICT (sourceUrl) DO NOTHING", INSERT_SQL),
            &id,
            job,
        )?;
        if inserted > 0 {
            tracing::info!(title = %job.title, site = %job.source_site, "inserted scraped job");
            Ok(InsertOutcome::Inserted(id))
        } else {
            tracing::debug!(title = %job.title, url = %job.source_url, "skipped duplicate scraped job");
            Ok(InsertOutcome::Duplicate)
        }
    }

    /// Inserts a scraped job, failing with `UniqueViolation` on a repeated
    /// `sourceUrl`.
    pub fn create_scraped_job(&self, job: &NewScrapedJob) -> Result<String> {
        let id = new_id();
        self.execute_scraped_insert(INSERT_SQL, &id, job)?;
        Ok(id)
    }

    fn execute_scraped_insert(&self, sql: &str, id: &str, job: &NewScrapedJob) -> Result<usize> {
        let changed = self.conn.execute(
            sql,
            named_params! {
                ":id": id,
                ":title": job.title,
                ":companyName": job.company_name,
                ":description": job.description,
                ":wage": job.wage,
                ":locationRequirement": job.location_requirement,
                ":experienceLevel": job.experience_level,
                ":location": job.location,
                ":sourceUrl": job.source_url,
                ":sourceSite": job.source_site,
                ":postedAt": job.posted_at,
            },
        )?;
        Ok(changed)
    }

    pub fn get_scraped_job(&self, id: &str) -> Result<Option<ScrapedJob>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM scraped_jobs WHERE id = ?1", SCRAPED_COLUMNS),
            [id],
            Self::row_to_scraped_job,
        ))
    }

    pub fn get_scraped_job_by_url(&self, source_url: &str) -> Result<Option<ScrapedJob>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM scraped_jobs WHERE sourceUrl = ?1", SCRAPED_COLUMNS),
            [source_url],
            Self::row_to_scraped_job,
        ))
    }

    /// Lists scraped jobs, newest first.
    pub fn list_scraped_jobs(
        &self,
        source_site: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ScrapedJob>> {
        let mut sql = format!("SELECT {} FROM scraped_jobs", SCRAPED_COLUMNS);
        let mut params: Vec<String> = vec![];
        if let Some(site) = source_site {
            params.push(site.to_string());
            sql.push_str(" WHERE LOWER(sourceSite) = LOWER(?1)");
        }
        sql.push_str(" ORDER BY scrapedAt DESC, rowid DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), Self::row_to_scraped_job)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Deletes a scraped job. Fails with `ForeignKeyViolation` while saved
    /// jobs, cover letters or interview sessions reference it.
    pub fn delete_scraped_job(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM scraped_jobs WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("scraped job", id));
        }
        Ok(())
    }

    fn row_to_scraped_job(row: &Row) -> rusqlite::Result<ScrapedJob> {
        Ok(ScrapedJob {
            id: row.get(0)?,
            title: row.get(1)?,
            company_name: row.get(2)?,
            description: row.get(3)?,
            wage: row.get(4)?,
            location_requirement: row.get(5)?,
            experience_level: row.get(6)?,
            location: row.get(7)?,
            source_url: row.get(8)?,
            source_site: row.get(9)?,
            scraped_at: row.get(10)?,
            posted_at: row.get(11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[test]
    fn test_strict_insert_rejects_duplicate_source_url() {
        let db = test_support::db();
        db.create_scraped_job(&test_support::scraped("https://jobs.example/1")).unwrap();

        let err = db
            .create_scraped_job(&test_support::scraped("https://jobs.example/1"))
            .unwrap_err();
        match err {
            DatabaseError::UniqueViolation { table, column } => {
                assert_eq!(table, "scraped_jobs");
                assert_eq!(column, "sourceUrl");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[test]
    fn test_idempotent_insert_reports_duplicate() {
        let db = test_support::db();
        let job = test_support::scraped("https://jobs.example/2");

        let first = db.insert_scraped_job(&job).unwrap();
        let InsertOutcome::Inserted(id) = first else {
            panic!("first insert should succeed");
        };
        assert_eq!(db.insert_scraped_job(&job).unwrap(), InsertOutcome::Duplicate);

        let stored = db.get_scraped_job(&id).unwrap().unwrap();
        assert_eq!(stored.source_url, "https://jobs.example/2");
        assert!(!stored.scraped_at.is_empty());
        assert_eq!(db.list_scraped_jobs(None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_by_site_and_limits() {
        let db = test_support::db();
        for i in 0..3 {
            db.create_scraped_job(&test_support::scraped(&format!("https://py.example/{i}"))).unwrap();
        }
        let mut other = test_support::scraped("https://simplify.example/1");
        other.source_site = "SimplifyJobs".to_string();
        db.create_scraped_job(&other).unwrap();

        assert_eq!(db.list_scraped_jobs(Some("python.org"), None).unwrap().len(), 3);
        assert_eq!(db.list_scraped_jobs(Some("SimplifyJobs"), None).unwrap().len(), 1);
        assert_eq!(db.list_scraped_jobs(None, Some(2)).unwrap().len(), 2);
        assert!(db.get_scraped_job_by_url("https://simplify.example/1").unwrap().is_some());
    }

    #[test]
    fn test_delete_scraped_job_with_dependents_is_restricted() {
        let db = test_support::db();
        test_support::user(&db, "u1", "a@example.com");
        let job = test_support::scraped_job_id(&db, "https://jobs.example/3");
        let letter = db.create_cover_letter("u1", &job, None).unwrap();

        assert!(matches!(
            db.delete_scraped_job(&job).unwrap_err(),
            DatabaseError::ForeignKeyViolation
        ));

        db.delete_cover_letter(&letter.id).unwrap();
        db.delete_scraped_job(&job).unwrap();
    }
}
