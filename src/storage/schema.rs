use rusqlite::{params, Connection};

/// A versioned table layout for one SQLite file.
pub(crate) struct Schema {
    /// Full layout applied to a fresh file. Must create `schema_version`.
    pub(crate) base: &'static str,
    pub(crate) version: i32,
    /// Migrations from version N to N+1.
    /// Each entry is (from_version, sql).
    pub(crate) migrations: &'static [(i32, &'static str)],
}

pub(crate) const LOCAL: Schema = Schema {
    base: r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS kv (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#,
    version: 1,
    migrations: &[],
};

pub(crate) fn migrate(conn: &Connection, schema: &Schema) -> rusqlite::Result<()> {
    let has_version_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !has_version_table {
        // Fresh file
        conn.execute_batch(schema.base)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![schema.version],
        )?;
        return Ok(());
    }

    let current: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    for &(from_version, sql) in schema.migrations {
        if current <= from_version {
            conn.execute_batch(sql)?;
        }
    }

    if current < schema.version {
        conn.execute(
            "UPDATE schema_version SET version = ?1",
            params![schema.version],
        )?;
    }

    Ok(())
}
