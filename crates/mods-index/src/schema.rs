use rusqlite::Connection;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 2;

// NOTE: Storage layout
//
// JSON-valued call fields (inputs, output, summary, attributes) are stored as text
// and parsed on read. input_refs/output_refs are denormalized JSON arrays so ref
// filters can use json_each() without re-walking the payloads.
//
// Call ids are unique per project only, so the calls key is (project_id, id).
//
// The store file is the only copy of imported data: a version mismatch is an
// error, never a reason to drop tables.
//
// Timestamps are RFC 3339 with fixed microsecond precision and a `Z` suffix, so
// lexical order equals chronological order.

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != SCHEMA_VERSION && (current_version != 0 || has_tables(conn)?) {
        return Err(Error::SchemaVersion {
            found: current_version,
            expected: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS calls (
            id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            op_name TEXT NOT NULL,
            display_name TEXT,
            trace_id TEXT NOT NULL,
            parent_id TEXT,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            attributes TEXT NOT NULL DEFAULT '{}',
            inputs TEXT NOT NULL DEFAULT '{}',
            input_refs TEXT NOT NULL DEFAULT '[]',
            output TEXT NOT NULL DEFAULT 'null',
            output_refs TEXT NOT NULL DEFAULT '[]',
            exception TEXT,
            summary TEXT,
            PRIMARY KEY (project_id, id)
        );

        CREATE TABLE IF NOT EXISTS objects (
            project_id TEXT NOT NULL,
            object_id TEXT NOT NULL,
            digest TEXT NOT NULL,
            version_index INTEGER NOT NULL,
            is_op BOOLEAN NOT NULL,
            base_object_class TEXT,
            created_at TEXT NOT NULL,
            val TEXT NOT NULL,
            PRIMARY KEY (project_id, object_id, digest)
        );

        CREATE INDEX IF NOT EXISTS idx_calls_project_started ON calls(project_id, started_at);
        CREATE INDEX IF NOT EXISTS idx_calls_trace ON calls(trace_id);
        CREATE INDEX IF NOT EXISTS idx_calls_parent ON calls(parent_id);
        CREATE INDEX IF NOT EXISTS idx_objects_version ON objects(project_id, object_id, version_index);
        "#,
    )?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

    Ok(())
}

fn has_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('calls', 'objects')",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
