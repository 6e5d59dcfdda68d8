use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{params, Connection};

const BUILD_MIGRATIONS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

/// `MIGRATIONS_DIR`, then `./migrations`, then the directory shipped with the crate.
fn migrations_dir() -> Option<PathBuf> {
    let candidates = [
        std::env::var("MIGRATIONS_DIR").ok().map(PathBuf::from),
        Some(PathBuf::from("migrations")),
        Some(PathBuf::from(BUILD_MIGRATIONS_DIR)),
    ];
    candidates.into_iter().flatten().find(|p| p.is_dir())
}

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    let dir = migrations_dir().context("no migrations directory found")?;
    run_migrations_from(conn, &dir)
}

pub fn run_migrations_from(conn: &Connection, dir: &Path) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read migrations directory {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;
        if applied {
            continue;
        }

        let sql = fs::read_to_string(&path)
            .with_context(|| format!("failed to read migration file: {name}"))?;

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(&sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?1)", params![name])
            .with_context(|| format!("failed to record migration: {name}"))?;
        tx.commit()?;

        tracing::info!(migration = %name, "applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert!(applied >= 1);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('budgets', 'profiles', 'users')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
