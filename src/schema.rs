//! Private table layout of the SQLite adapter.
//!
//! Keys are stored as canonical JSON text (see [`crate::NodeKey::encode`]);
//! metadata is stored as a JSON object. Undirected edges occupy a single
//! row under the ordered pair `(min, max)` of the encoded endpoint keys.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::errors::GraphError;

/// Layout version written into `graph_meta`.
pub const SCHEMA_VERSION: i64 = 1;

/// Creates the tables and records directedness on first use.
///
/// Fails with [`GraphError::BackendUnavailable`] when the database was
/// created with the opposite directedness or by a newer layout.
pub fn ensure_schema(conn: &Connection, directed: bool) -> Result<(), GraphError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS graph_nodes (
            key  TEXT PRIMARY KEY,
            data TEXT NOT NULL
        ) WITHOUT ROWID;
        CREATE TABLE IF NOT EXISTS graph_edges (
            src  TEXT NOT NULL REFERENCES graph_nodes(key) ON DELETE CASCADE,
            dst  TEXT NOT NULL REFERENCES graph_nodes(key) ON DELETE CASCADE,
            data TEXT NOT NULL,
            PRIMARY KEY (src, dst)
        ) WITHOUT ROWID;
        CREATE INDEX IF NOT EXISTS idx_edges_dst ON graph_edges(dst, src);
        CREATE TABLE IF NOT EXISTS graph_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL,
            directed INTEGER NOT NULL
        );
        "#,
    )
    .map_err(schema_error)?;
    ensure_meta(conn, directed)
}

pub fn read_schema_version(conn: &Connection) -> Result<i64, GraphError> {
    conn.query_row(
        "SELECT schema_version FROM graph_meta WHERE id=1",
        [],
        |row| row.get(0),
    )
    .map_err(schema_error)
}

pub fn read_directed(conn: &Connection) -> Result<Option<bool>, GraphError> {
    conn.query_row("SELECT directed FROM graph_meta WHERE id=1", [], |row| {
        row.get::<_, i64>(0)
    })
    .optional()
    .map(|value| value.map(|flag| flag != 0))
    .map_err(schema_error)
}

fn ensure_meta(conn: &Connection, directed: bool) -> Result<(), GraphError> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT schema_version FROM graph_meta WHERE id=1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(schema_error)?;
    let Some(existing) = version else {
        conn.execute(
            "INSERT INTO graph_meta(id, schema_version, directed) VALUES(1, ?1, ?2)",
            rusqlite::params![SCHEMA_VERSION, directed],
        )
        .map_err(schema_error)?;
        info!(directed, "initialized graph schema");
        return Ok(());
    };
    if existing > SCHEMA_VERSION {
        return Err(GraphError::unavailable(format!(
            "database schema version {existing} is newer than supported {SCHEMA_VERSION}"
        )));
    }
    let stored = read_directed(conn)?.unwrap_or(directed);
    if stored != directed {
        return Err(GraphError::unavailable(format!(
            "graph was created with directed={stored}, requested directed={directed}"
        )));
    }
    Ok(())
}

fn schema_error(err: rusqlite::Error) -> GraphError {
    GraphError::unavailable(format!("schema: {err}"))
}
