//! Database schema migrations for whenwhere.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: users and everything they own.
///
/// Slot sets are JSON arrays. Hidden rows live alongside visible ones and
/// are told apart by their parent column.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id         TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS day_ranges (
            id            TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            name          TEXT NOT NULL,
            parent_tag_id TEXT,
            slots         TEXT NOT NULL DEFAULT '[]',
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS time_ranges (
            id            TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            name          TEXT NOT NULL,
            parent_tag_id TEXT,
            slots         TEXT NOT NULL DEFAULT '[]',
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS locations (
            id         TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL,
            name       TEXT NOT NULL,
            street     TEXT,
            city       TEXT,
            zip        TEXT,
            state      TEXT,
            latitude   REAL,
            longitude  REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tags (
            id             TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL,
            name           TEXT NOT NULL,
            parent_task_id TEXT,
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tag_locations (
            tag_id      TEXT NOT NULL,
            location_id TEXT NOT NULL,
            position    INTEGER NOT NULL,
            PRIMARY KEY (tag_id, location_id)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id           TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL,
            title        TEXT NOT NULL,
            content      TEXT NOT NULL DEFAULT '',
            important    INTEGER NOT NULL DEFAULT 0,
            long_lasting INTEGER NOT NULL DEFAULT 0,
            tag_id       TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: lookup indexes, one override per parent, and per-user
/// location name uniqueness.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_day_ranges_user ON day_ranges(user_id);
         CREATE UNIQUE INDEX IF NOT EXISTS idx_day_ranges_parent ON day_ranges(parent_tag_id)
             WHERE parent_tag_id IS NOT NULL;
         CREATE INDEX IF NOT EXISTS idx_time_ranges_user ON time_ranges(user_id);
         CREATE UNIQUE INDEX IF NOT EXISTS idx_time_ranges_parent ON time_ranges(parent_tag_id)
             WHERE parent_tag_id IS NOT NULL;
         CREATE INDEX IF NOT EXISTS idx_tags_user ON tags(user_id);
         CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_parent ON tags(parent_task_id)
             WHERE parent_task_id IS NOT NULL;
         CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
         CREATE INDEX IF NOT EXISTS idx_tag_locations_location ON tag_locations(location_id);
         CREATE UNIQUE INDEX IF NOT EXISTS idx_locations_user_name ON locations(user_id, name);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i32>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
        for table in [
            "users",
            "day_ranges",
            "time_ranges",
            "locations",
            "tags",
            "tag_locations",
            "tasks",
        ] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_incremental_migration() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);

        let now = "2024-01-01T00:00:00Z";
        conn.execute(
            "INSERT INTO locations (id, user_id, name, created_at, updated_at)
             VALUES ('a', 'u', 'Home', ?1, ?1)",
            [now],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO locations (id, user_id, name, created_at, updated_at)
             VALUES ('b', 'u', 'Home', ?1, ?1)",
            [now],
        );
        assert!(dup.is_err());
    }
}
