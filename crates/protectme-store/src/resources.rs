use rusqlite::params;

use protectme_shared::ResourceCategory;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{parse_column, Resource};

impl Database {
    /// All resources, name-ascending.
    pub fn list_resources(&self) -> Result<Vec<Resource>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, category, phone, address, latitude, longitude, is_open_24h
             FROM resources ORDER BY name ASC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_resource)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn count_resources(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Insert one resource and return its new id.  The `id` field of the
    /// argument is ignored.
    pub fn insert_resource(&self, resource: &Resource) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO resources (name, category, phone, address, latitude, longitude, is_open_24h)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                resource.name,
                resource.category.as_str(),
                resource.phone,
                resource.address,
                resource.latitude,
                resource.longitude,
                resource.is_open_24h,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Replace the whole directory with `resources`, keeping their ids.
    ///
    /// Runs in a single transaction: either every row is swapped or none.
    pub fn replace_resources(&self, resources: &[Resource]) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute("DELETE FROM resources", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO resources
                     (id, name, category, phone, address, latitude, longitude, is_open_24h)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in resources {
                stmt.execute(params![
                    r.id,
                    r.name,
                    r.category.as_str(),
                    r.phone,
                    r.address,
                    r.latitude,
                    r.longitude,
                    r.is_open_24h,
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(count = resources.len(), "replaced resource directory");
        Ok(resources.len())
    }
}

fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    let category_str: String = row.get(2)?;

    Ok(Resource {
        id: row.get(0)?,
        name: row.get(1)?,
        category: parse_column::<ResourceCategory>(2, &category_str)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        is_open_24h: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_resources;

    fn resource(id: i64, name: &str) -> Resource {
        Resource {
            id,
            name: name.into(),
            category: ResourceCategory::Legal,
            phone: "+254 700 000 000".into(),
            address: "Nairobi".into(),
            latitude: None,
            longitude: None,
            is_open_24h: false,
        }
    }

    #[test]
    fn list_is_name_ascending() {
        let db = Database::open_in_memory().unwrap();
        let names: Vec<String> = db
            .list_resources()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), default_resources().len());
    }

    #[test]
    fn replace_swaps_the_whole_directory() {
        let db = Database::open_in_memory().unwrap();
        let replaced = db
            .replace_resources(&[resource(10, "Zeta Legal Aid"), resource(11, "Alpha Legal Aid")])
            .unwrap();
        assert_eq!(replaced, 2);

        let listed = db.list_resources().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Alpha Legal Aid");
        assert_eq!(listed[0].id, 11);
    }

    #[test]
    fn failed_replace_leaves_directory_untouched() {
        let db = Database::open_in_memory().unwrap();
        let before = db.list_resources().unwrap();

        // Reject every insert so the transaction fails after the DELETE.
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_insert BEFORE INSERT ON resources
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        assert!(db.replace_resources(&[resource(1, "Only")]).is_err());

        db.conn().execute_batch("DROP TRIGGER reject_insert").unwrap();
        assert_eq!(db.list_resources().unwrap(), before);
    }
}
