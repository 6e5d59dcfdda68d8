pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

const MEMORY_PATH: &str = ":memory:";

/// Opens the local database at `path` (or an in-memory one for `:memory:`)
/// and brings its schema up to date.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = if path == MEMORY_PATH {
        Connection::open_in_memory().context("failed to open in-memory database")?
    } else {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("failed to enable WAL")?;
        conn
    };

    conn.busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("failed to enable foreign keys")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
