/// Database row types — these map directly to SQLite rows.

pub struct RegistrationRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// UNIX timestamp, UTC seconds, captured at insert time.
    pub created_on: i64,
}
