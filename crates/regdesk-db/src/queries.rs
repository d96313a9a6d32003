use crate::Database;
use crate::models::RegistrationRow;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    /// Insert a registration row. Rows are append-only; there is no update
    /// or delete path.
    pub fn insert_registration(
        &self,
        id: &str,
        name: &str,
        phone: &str,
        created_on: i64,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO registration (id, name, phone, created_on) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, phone, created_on],
            )?;
            Ok(())
        })
    }

    pub fn get_registration(&self, id: &str) -> Result<Option<RegistrationRow>> {
        self.with_conn(|conn| query_registration(conn, id))
    }

    pub fn list_registrations(&self) -> Result<Vec<RegistrationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, phone, created_on FROM registration ORDER BY created_on",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(RegistrationRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        phone: row.get(2)?,
                        created_on: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_registration(conn: &Connection, id: &str) -> Result<Option<RegistrationRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, phone, created_on FROM registration WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(RegistrationRow {
                id: row.get(0)?,
                name: row.get(1)?,
                phone: row.get(2)?,
                created_on: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
