use rusqlite::{params, Row};

use super::{optional, Database, DatabaseError, Result};
use crate::models::Organization;

impl Database {
    pub fn create_organization(
        &self,
        id: &str,
        name: &str,
        image_url: Option<&str>,
    ) -> Result<Organization> {
        self.conn.execute(
            "INSERT INTO organizations (id, name, imageUrl) VALUES (?1, ?2, ?3)",
            params![id, name, image_url],
        )?;
        self.get_organization(id)?
            .ok_or_else(|| DatabaseError::not_found("organization", id))
    }

    pub fn get_organization(&self, id: &str) -> Result<Option<Organization>> {
        optional(self.conn.query_row(
            "SELECT id, name, imageUrl, createdAt, updatedAt FROM organizations WHERE id = ?1",
            [id],
            Self::row_to_organization,
        ))
    }

    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, imageUrl, createdAt, updatedAt FROM organizations ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::row_to_organization)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Deletes an organization together with all of its job listings.
    pub fn delete_organization(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM organizations WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DatabaseError::not_found("organization", id));
        }
        tracing::info!(organization_id = id, "organization deleted");
        Ok(())
    }

    fn row_to_organization(row: &Row) -> rusqlite::Result<Organization> {
        Ok(Organization {
            id: row.get(0)?,
            name: row.get(1)?,
            image_url: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support;

    #[test]
    fn test_create_list_delete() {
        let db = test_support::db();
        db.create_organization("org_b", "Beta", None).unwrap();
        db.create_organization("org_a", "Alpha", Some("https://img/a.png")).unwrap();

        let names: Vec<String> = db
            .list_organizations()
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);

        db.delete_organization("org_a").unwrap();
        assert!(db.get_organization("org_a").unwrap().is_none());
        assert!(db.delete_organization("org_a").is_err());
    }
}
