use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Row};

use super::{new_id, optional, Database, DatabaseError, Result};
use crate::models::{JobListing, JobListingStatus, NewJobListing};
use crate::schema::NOW_SQL;

const LISTING_COLUMNS: &str = "id, organizationId, title, description, wage, wageInterval,
    stateAbbreviation, city, isFeatured, locationRequirement, experienceLevel, status, \"type\",
    postedAt, createdAt, updatedAt";

/// Filters for `list_job_listings`. Unset fields match everything.
#[derive(Debug, Default, Clone)]
pub struct JobListingFilter {
    pub organization_id: Option<String>,
    pub state_abbreviation: Option<String>,
    pub status: Option<JobListingStatus>,
    pub featured_only: bool,
}

impl Database {
    /// Inserts a listing. State codes are stored upper-case. Leaving `status` or `is_featured` unset lets the
    /// column defaults (`Draft`, `false`) apply.
    pub fn create_job_listing(&self, listing: &NewJobListing) -> Result<JobListing> {
        let id = new_id();
        let state = listing.state_abbreviation.as_deref().map(str::to_uppercase);
        let mut columns = vec![
            "id",
            "organizationId",
            "title",
            "description",
            "wage",
            "wageInterval",
            "stateAbbreviation",
            "city",
            "locationRequirement",
            "experienceLevel",
            "\"type\"",
        ];
        let mut values: Vec<&dyn ToSql> = vec![
            &id,
            &listing.organization_id,
            &listing.title,
            &listing.description,
            &listing.wage,
            &listing.wage_interval,
            &state,
            &listing.city,
            &listing.location_requirement,
            &listing.experience_level,
            &listing.listing_type,
        ];
        if let Some(featured) = &listing.is_featured {
            columns.push("isFeatured");
            values.push(featured);
        }
        if let Some(status) = &listing.status {
            columns.push("status");
            values.push(status);
        }

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        self.conn.execute(
            &format!(
                "INSERT INTO job_listings ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            ),
            values.as_slice(),
        )?;

        tracing::debug!(listing_id = %id, organization_id = %listing.organization_id, "job listing created");
        self.get_job_listing(&id)?
            .ok_or_else(|| DatabaseError::not_found("job listing", id.clone()))
    }

    pub fn get_job_listing(&self, id: &str) -> Result<Option<JobListing>> {
        optional(self.conn.query_row(
            &format!("SELECT {} FROM job_listings WHERE id = ?1", LISTING_COLUMNS),
            [id],
            Self::row_to_job_listing,
        ))
    }

    pub fn list_job_listings(&self, filter: &JobListingFilter) -> Result<Vec<JobListing>> {
        let mut sql = format!("SELECT {} FROM job_listings WHERE 1=1", LISTING_COLUMNS);
        let mut params: Vec<String> = vec![];

        if let Some(org) = &filter.organization_id {
            params.push(org.clone());
            sql.push_str(&format!(" AND organizationId = ?{}", params.len()));
        }
        if let Some(state) = &filter.state_abbreviation {
            params.push(state.to_uppercase());
            sql.push_str(&format!(" AND stateAbbreviation = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(status.as_str().to_string());
            sql.push_str(&format!(" AND status = ?{}", params.len()));
        }
        if filter.featured_only {
            sql.push_str(" AND isFeatured = 1");
        }
        sql.push_str(" ORDER BY isFeatured DESC, createdAt DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), Self::row_to_job_listing)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Moves a listing through its lifecycle. The first transition to
    /// `Published` stamps `postedAt`.
    pub fn set_job_listing_status(&self, id: &str, status: JobListingStatus) -> Result<JobListing> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE job_listings SET status = ?2,
                 postedAt = CASE WHEN ?2 = 'Published' AND postedAt IS NULL THEN {now} ELSE postedAt END,
                 updatedAt = {now}
                 WHERE id = ?1",
                now = NOW_SQL
            ),
            params![id, status],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("job listing", id));
        }
        self.get_job_listing(id)?
            .ok_or_else(|| DatabaseError::not_found("job listing", id))
    }

    pub fn set_job_listing_featured(&self, id: &str, featured: bool) -> Result<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE job_listings SET isFeatured = ?2, updatedAt = {} WHERE id = ?1",
                NOW_SQL
            ),
            params![id, featured],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found("job listing", id));
        }
        Ok(())
    }

    pub fn delete_job_listing(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM job_listings WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("job listing", id));
        }
        Ok(())
    }

    fn row_to_job_listing(row: &Row) -> rusqlite::Result<JobListing> {
        Ok(JobListing {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            wage: row.get(4)?,
            wage_interval: row.get(5)?,
            state_abbreviation: row.get(6)?,
            city: row.get(7)?,
            is_featured: row.get(8)?,
            location_requirement: row.get(9)?,
            experience_level: row.get(10)?,
            status: row.get(11)?,
            listing_type: row.get(12)?,
            posted_at: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::models::{ExperienceLevel, JobListingType, LocationRequirement, WageInterval};

    fn listing(org: &str, state: Option<&str>) -> NewJobListing {
        NewJobListing {
            organization_id: org.to_string(),
            title: "Rust Developer".to_string(),
            description: "Systems work.".to_string(),
            wage: Some(65),
            wage_interval: Some(WageInterval::Hourly),
            state_abbreviation: state.map(str::to_string),
            city: Some("Austin".to_string()),
            is_featured: None,
            location_requirement: LocationRequirement::Hybrid,
            experience_level: ExperienceLevel::MidLevel,
            status: None,
            listing_type: JobListingType::FullTime,
        }
    }

    fn db_with_org() -> Database {
        let db = test_support::db();
        db.create_organization("org_1", "Acme", None).unwrap();
        db
    }

    #[test]
    fn test_defaults_apply_when_status_and_featured_are_omitted() {
        let db = db_with_org();
        let created = db.create_job_listing(&listing("org_1", Some("TX"))).unwrap();
        assert_eq!(created.status, JobListingStatus::Draft);
        assert!(!created.is_featured);
        assert!(created.posted_at.is_none());
        assert_eq!(created.experience_level, ExperienceLevel::MidLevel);
        assert_eq!(created.wage_interval, Some(WageInterval::Hourly));
    }

    #[test]
    fn test_explicit_status_and_featured_are_kept() {
        let db = db_with_org();
        let mut new = listing("org_1", None);
        new.status = Some(JobListingStatus::Published);
        new.is_featured = Some(true);
        let created = db.create_job_listing(&new).unwrap();
        assert_eq!(created.status, JobListingStatus::Published);
        assert!(created.is_featured);
    }

    #[test]
    fn test_required_enum_columns_are_not_null() {
        let db = db_with_org();
        for missing in ["\"type\"", "locationRequirement", "experienceLevel"] {
            let mut cols = vec!["\"type\"", "locationRequirement", "experienceLevel"];
            cols.retain(|c| *c != missing);
            let vals: Vec<&str> = cols
                .iter()
                .map(|c| match *c {
                    "\"type\"" => "'Full-time'",
                    "locationRequirement" => "'Remote'",
                    _ => "'Senior'",
                })
                .collect();
            let sql = format!(
                "INSERT INTO job_listings (id, organizationId, title, description, {}) VALUES ('x', 'org_1', 't', 'd', {})",
                cols.join(", "),
                vals.join(", ")
            );
            let err: DatabaseError = db.conn.execute(&sql, []).unwrap_err().into();
            match err {
                DatabaseError::NotNullViolation { table, column } => {
                    assert_eq!(table, "job_listings");
                    assert_eq!(column, missing.trim_matches('"'));
                }
                other => panic!("expected not-null violation for {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_out_of_set_literal_is_rejected() {
        let db = db_with_org();
        let err: DatabaseError = db
            .conn
            .execute(
                "INSERT INTO job_listings (id, organizationId, title, description, locationRequirement,
                 experienceLevel, \"type\") VALUES ('x', 'org_1', 't', 'd', 'Remote', 'Principal', 'Full-time')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, DatabaseError::CheckViolation(_)));
    }

    #[test]
    fn test_listing_requires_existing_organization() {
        let db = test_support::db();
        let err = db.create_job_listing(&listing("org_missing", None)).unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKeyViolation));
    }

    #[test]
    fn test_deleting_organization_cascades_to_listings() {
        let db = db_with_org();
        db.create_organization("org_2", "Other", None).unwrap();
        db.create_job_listing(&listing("org_1", Some("TX"))).unwrap();
        db.create_job_listing(&listing("org_1", Some("CA"))).unwrap();
        let survivor = db.create_job_listing(&listing("org_2", Some("CA"))).unwrap();

        db.delete_organization("org_1").unwrap();

        let remaining = db.list_job_listings(&JobListingFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, survivor.id);
    }

    #[test]
    fn test_filter_by_state_and_status() {
        let db = db_with_org();
        let tx = db.create_job_listing(&listing("org_1", Some("TX"))).unwrap();
        db.create_job_listing(&listing("org_1", Some("CA"))).unwrap();
        db.set_job_listing_status(&tx.id, JobListingStatus::Published).unwrap();

        let filter = JobListingFilter {
            state_abbreviation: Some("tx".to_string()),
            ..Default::default()
        };
        let found = db.list_job_listings(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tx.id);

        let drafts = db
            .list_job_listings(&JobListingFilter {
                status: Some(JobListingStatus::Draft),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].state_abbreviation.as_deref(), Some("CA"));
    }

    #[test]
    fn test_state_is_stored_upper_case() {
        let db = db_with_org();
        let created = db.create_job_listing(&listing("org_1", Some("tx"))).unwrap();
        assert_eq!(created.state_abbreviation.as_deref(), Some("TX"));

        let found = db
            .list_job_listings(&JobListingFilter {
                state_abbreviation: Some("tx".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, created.id);
    }

    #[test]
    fn test_status_change_refreshes_updated_at() {
        let db = db_with_org();
        let created = db.create_job_listing(&listing("org_1", None)).unwrap();
        test_support::tick();
        let published = db.set_job_listing_status(&created.id, JobListingStatus::Published).unwrap();
        assert!(published.updated_at > created.updated_at);
    }

    #[test]
    fn test_publishing_stamps_posted_at_once() {
        let db = db_with_org();
        let created = db.create_job_listing(&listing("org_1", None)).unwrap();

        let published = db.set_job_listing_status(&created.id, JobListingStatus::Published).unwrap();
        let first_posted = published.posted_at.clone().unwrap();

        db.set_job_listing_status(&created.id, JobListingStatus::Delisted).unwrap();
        let republished = db.set_job_listing_status(&created.id, JobListingStatus::Published).unwrap();
        assert_eq!(republished.posted_at.unwrap(), first_posted);
    }

    #[test]
    fn test_featured_listings_sort_first() {
        let db = db_with_org();
        db.create_job_listing(&listing("org_1", None)).unwrap();
        let featured = db.create_job_listing(&listing("org_1", None)).unwrap();
        db.set_job_listing_featured(&featured.id, true).unwrap();

        let all = db.list_job_listings(&JobListingFilter::default()).unwrap();
        assert_eq!(all[0].id, featured.id);

        let only = db
            .list_job_listings(&JobListingFilter {
                featured_only: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(only.len(), 1);
    }
}
