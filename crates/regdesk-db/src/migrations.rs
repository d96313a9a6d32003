use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Idempotent schema setup, safe to run on every process start.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS registration (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            phone       TEXT NOT NULL,
            created_on  INTEGER NOT NULL
        ) WITHOUT ROWID;
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
