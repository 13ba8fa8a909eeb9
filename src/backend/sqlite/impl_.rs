//! SQLite backend implementation for the Backend trait.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, trace, warn};

use super::{paging::PagedRows, storage_error};
use crate::{
    backend::{Backend, BackendIter},
    config::SqliteConfig,
    errors::GraphError,
    graph::{EdgeView, Metadata, NodeKey, NodeView, merge_metadata},
    schema::{ensure_schema, read_schema_version},
};

const NODE_KEYS_SQL: &str = "SELECT key FROM graph_nodes WHERE key > ?1 ORDER BY key LIMIT ?2";
const NODE_ROWS_SQL: &str =
    "SELECT key, data FROM graph_nodes WHERE key > ?1 ORDER BY key LIMIT ?2";
const EDGE_KEYS_SQL: &str = "SELECT src, dst FROM graph_edges \
     WHERE (src, dst) > (?1, ?2) ORDER BY src, dst LIMIT ?3";
const EDGE_ROWS_SQL: &str = "SELECT src, dst, data FROM graph_edges \
     WHERE (src, dst) > (?1, ?2) ORDER BY src, dst LIMIT ?3";
const SUCCESSORS_SQL: &str =
    "SELECT dst FROM graph_edges WHERE src = ?1 AND dst > ?2 ORDER BY dst LIMIT ?3";
const PREDECESSORS_SQL: &str =
    "SELECT src FROM graph_edges WHERE dst = ?1 AND src > ?2 ORDER BY src LIMIT ?3";
const UNDIRECTED_NEIGHBORS_SQL: &str = "SELECT nbr FROM (\
     SELECT dst AS nbr FROM graph_edges WHERE src = ?1 \
     UNION SELECT src AS nbr FROM graph_edges WHERE dst = ?1) \
     WHERE nbr > ?2 ORDER BY nbr LIMIT ?3";

/// Relational adapter storing one graph in SQLite tables.
///
/// The connection is private to the adapter; callers only ever see keys,
/// metadata and views.
pub struct SqliteBackend {
    conn: Connection,
    directed: bool,
    page_size: usize,
}

impl SqliteBackend {
    /// Opens or creates the database at `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P, directed: bool) -> Result<Self, GraphError> {
        Self::open_with_config(path, directed, &SqliteConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        directed: bool,
        cfg: &SqliteConfig,
    ) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            GraphError::unavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), directed, "opening sqlite graph");
        Self::from_connection(conn, directed, cfg, true)
    }

    /// Private, non-shared database that disappears with the backend.
    pub fn open_in_memory(directed: bool) -> Result<Self, GraphError> {
        Self::open_in_memory_with_config(directed, &SqliteConfig::default())
    }

    pub fn open_in_memory_with_config(
        directed: bool,
        cfg: &SqliteConfig,
    ) -> Result<Self, GraphError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| GraphError::unavailable(format!("cannot open in-memory db: {e}")))?;
        Self::from_connection(conn, directed, cfg, false)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn schema_version(&self) -> Result<i64, GraphError> {
        read_schema_version(&self.conn)
    }

    fn from_connection(
        conn: Connection,
        directed: bool,
        cfg: &SqliteConfig,
        file_backed: bool,
    ) -> Result<Self, GraphError> {
        conn.set_prepared_statement_cache_capacity(cfg.statement_cache_capacity);
        if let Some(timeout) = cfg.busy_timeout {
            conn.busy_timeout(timeout).map_err(storage_error)?;
        }
        if file_backed {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(storage_error)?;
            if !mode.eq_ignore_ascii_case("wal") {
                // Some filesystems refuse WAL; SQLite keeps the previous mode.
                warn!(mode = %mode, "WAL journal unavailable");
            }
        }
        for (key, value) in &cfg.pragma_settings {
            let pragma_sql = format!("PRAGMA {key} = {value}");
            match conn.execute(&pragma_sql, []) {
                Ok(_) | Err(rusqlite::Error::ExecuteReturnedResults) => {}
                Err(e) => {
                    return Err(GraphError::unavailable(format!(
                        "PRAGMA {key} = {value}: {e}"
                    )));
                }
            }
        }
        ensure_schema(&conn, directed)?;
        Ok(Self {
            conn,
            directed,
            page_size: cfg.effective_page_size(),
        })
    }

    /// Runs `op` inside a `BEGIN IMMEDIATE` transaction, rolling back on error.
    fn write_tx<T, F>(&self, op: F) -> Result<T, GraphError>
    where
        F: FnOnce(&Connection) -> Result<T, GraphError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(storage_error)?;
        let result = op(&self.conn).and_then(|value| {
            self.conn.execute_batch("COMMIT").map_err(storage_error)?;
            Ok(value)
        });
        if result.is_err() && !self.conn.is_autocommit() {
            rollback(&self.conn);
        }
        result
    }

    /// Stored row key of the edge `(u, v)`; undirected edges are ordered.
    fn edge_row_key(&self, u: &NodeKey, v: &NodeKey) -> Result<(String, String), GraphError> {
        let (src, dst) = (u.encode()?, v.encode()?);
        if !self.directed && dst < src {
            Ok((dst, src))
        } else {
            Ok((src, dst))
        }
    }

    fn node_exists(&self, encoded: &str) -> Result<bool, GraphError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM graph_nodes WHERE key=?1")
            .map_err(storage_error)?;
        stmt.exists(params![encoded]).map_err(storage_error)
    }

    fn require_node(&self, key: &NodeKey) -> Result<String, GraphError> {
        let encoded = key.encode()?;
        if !self.node_exists(&encoded)? {
            return Err(GraphError::not_found(format!("node {key}")));
        }
        Ok(encoded)
    }

    fn count(&self, sql: &str) -> Result<usize, GraphError> {
        let count: i64 = self
            .conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(storage_error)?;
        Ok(count as usize)
    }

    fn stream<T>(
        &self,
        sql: &'static str,
        anchor: Option<String>,
        cursor_columns: usize,
        convert: fn(Vec<String>) -> Result<T, GraphError>,
    ) -> PagedRows<'_, T> {
        PagedRows::new(
            &self.conn,
            sql,
            anchor,
            cursor_columns,
            self.page_size,
            convert,
        )
    }
}

impl Backend for SqliteBackend {
    fn is_directed(&self) -> bool {
        self.directed
    }

    fn add_node(&self, key: NodeKey, metadata: Metadata) -> Result<(), GraphError> {
        let encoded = key.encode()?;
        self.write_tx(|conn| {
            let mut data = read_metadata(
                conn,
                "SELECT data FROM graph_nodes WHERE key=?1",
                &[&encoded],
            )?
            .unwrap_or_default();
            merge_metadata(&mut data, metadata);
            let text = encode_metadata(&data)?;
            conn.prepare_cached(
                "INSERT INTO graph_nodes(key, data) VALUES(?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET data=excluded.data",
            )
            .and_then(|mut stmt| stmt.execute(params![encoded, text]))
            .map_err(storage_error)?;
            Ok(())
        })?;
        trace!(node = %key, "sqlite add_node");
        Ok(())
    }

    fn get_node(&self, key: &NodeKey) -> Result<Metadata, GraphError> {
        let encoded = key.encode()?;
        read_metadata(
            &self.conn,
            "SELECT data FROM graph_nodes WHERE key=?1",
            &[&encoded],
        )?
        .ok_or_else(|| GraphError::not_found(format!("node {key}")))
    }

    fn all_nodes(&self, include_metadata: bool) -> Result<BackendIter<'_, NodeView>, GraphError> {
        let rows = if include_metadata {
            self.stream(NODE_ROWS_SQL, None, 1, node_with_data)
        } else {
            self.stream(NODE_KEYS_SQL, None, 1, node_key_only)
        };
        Ok(Box::new(rows))
    }

    fn add_edge(&self, u: NodeKey, v: NodeKey, metadata: Metadata) -> Result<(), GraphError> {
        let (src, dst) = self.edge_row_key(&u, &v)?;
        self.write_tx(|conn| {
            {
                let mut insert_node = conn
                    .prepare_cached("INSERT OR IGNORE INTO graph_nodes(key, data) VALUES(?1, '{}')")
                    .map_err(storage_error)?;
                insert_node.execute(params![src]).map_err(storage_error)?;
                insert_node.execute(params![dst]).map_err(storage_error)?;
            }
            let mut data = read_metadata(
                conn,
                "SELECT data FROM graph_edges WHERE src=?1 AND dst=?2",
                &[&src, &dst],
            )?
            .unwrap_or_default();
            merge_metadata(&mut data, metadata);
            let text = encode_metadata(&data)?;
            conn.prepare_cached(
                "INSERT INTO graph_edges(src, dst, data) VALUES(?1, ?2, ?3) \
                 ON CONFLICT(src, dst) DO UPDATE SET data=excluded.data",
            )
            .and_then(|mut stmt| stmt.execute(params![src, dst, text]))
            .map_err(storage_error)?;
            Ok(())
        })?;
        trace!(source = %u, target = %v, "sqlite add_edge");
        Ok(())
    }

    fn get_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<Metadata, GraphError> {
        let (src, dst) = self.edge_row_key(u, v)?;
        read_metadata(
            &self.conn,
            "SELECT data FROM graph_edges WHERE src=?1 AND dst=?2",
            &[&src, &dst],
        )?
        .ok_or_else(|| GraphError::not_found(format!("edge ({u}, {v})")))
    }

    fn all_edges(&self, include_metadata: bool) -> Result<BackendIter<'_, EdgeView>, GraphError> {
        let rows = if include_metadata {
            self.stream(EDGE_ROWS_SQL, None, 2, edge_with_data)
        } else {
            self.stream(EDGE_KEYS_SQL, None, 2, edge_key_only)
        };
        Ok(Box::new(rows))
    }

    fn neighbors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError> {
        let encoded = self.require_node(key)?;
        let sql = if self.directed {
            SUCCESSORS_SQL
        } else {
            UNDIRECTED_NEIGHBORS_SQL
        };
        Ok(Box::new(self.stream(sql, Some(encoded), 1, neighbor_key)))
    }

    fn predecessors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError> {
        if !self.directed {
            return self.neighbors(key);
        }
        let encoded = self.require_node(key)?;
        Ok(Box::new(self.stream(
            PREDECESSORS_SQL,
            Some(encoded),
            1,
            neighbor_key,
        )))
    }

    fn remove_node(&self, key: &NodeKey) -> Result<(), GraphError> {
        let encoded = key.encode()?;
        self.write_tx(|conn| {
            conn.execute(
                "DELETE FROM graph_edges WHERE src=?1 OR dst=?1",
                params![encoded],
            )
            .map_err(storage_error)?;
            let affected = conn
                .execute("DELETE FROM graph_nodes WHERE key=?1", params![encoded])
                .map_err(storage_error)?;
            if affected == 0 {
                return Err(GraphError::not_found(format!("node {key}")));
            }
            Ok(())
        })
    }

    fn remove_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<(), GraphError> {
        let (src, dst) = self.edge_row_key(u, v)?;
        let affected = self
            .conn
            .execute(
                "DELETE FROM graph_edges WHERE src=?1 AND dst=?2",
                params![src, dst],
            )
            .map_err(storage_error)?;
        if affected == 0 {
            return Err(GraphError::not_found(format!("edge ({u}, {v})")));
        }
        Ok(())
    }

    fn has_node(&self, key: &NodeKey) -> Result<bool, GraphError> {
        self.node_exists(&key.encode()?)
    }

    fn node_count(&self) -> Result<usize, GraphError> {
        self.count("SELECT COUNT(*) FROM graph_nodes")
    }

    fn edge_count(&self) -> Result<usize, GraphError> {
        self.count("SELECT COUNT(*) FROM graph_edges")
    }
}

/// Aborts the open transaction; a failed rollback is logged, the
/// original error is what the caller sees.
fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        warn!(error = %e, "rollback failed");
    }
}

fn read_metadata(
    conn: &Connection,
    sql: &str,
    keys: &[&String],
) -> Result<Option<Metadata>, GraphError> {
    let mut stmt = conn.prepare_cached(sql).map_err(storage_error)?;
    let text: Option<String> = stmt
        .query_row(rusqlite::params_from_iter(keys.iter()), |row| row.get(0))
        .optional()
        .map_err(storage_error)?;
    text.as_deref().map(decode_metadata).transpose()
}

fn encode_metadata(metadata: &Metadata) -> Result<String, GraphError> {
    serde_json::to_string(metadata)
        .map_err(|e| GraphError::unavailable(format!("cannot encode metadata: {e}")))
}

fn decode_metadata(text: &str) -> Result<Metadata, GraphError> {
    serde_json::from_str(text)
        .map_err(|e| GraphError::unavailable(format!("corrupt metadata {text:?}: {e}")))
}

fn take_column(columns: &mut std::vec::IntoIter<String>) -> Result<String, GraphError> {
    columns
        .next()
        .ok_or_else(|| GraphError::unavailable("row is missing a column"))
}

fn node_key_only(row: Vec<String>) -> Result<NodeView, GraphError> {
    let mut columns = row.into_iter();
    Ok(NodeView {
        key: NodeKey::decode(&take_column(&mut columns)?)?,
        metadata: None,
    })
}

fn node_with_data(row: Vec<String>) -> Result<NodeView, GraphError> {
    let mut columns = row.into_iter();
    let key = NodeKey::decode(&take_column(&mut columns)?)?;
    let metadata = decode_metadata(&take_column(&mut columns)?)?;
    Ok(NodeView {
        key,
        metadata: Some(metadata),
    })
}

fn edge_key_only(row: Vec<String>) -> Result<EdgeView, GraphError> {
    let mut columns = row.into_iter();
    Ok(EdgeView {
        source: NodeKey::decode(&take_column(&mut columns)?)?,
        target: NodeKey::decode(&take_column(&mut columns)?)?,
        metadata: None,
    })
}

fn edge_with_data(row: Vec<String>) -> Result<EdgeView, GraphError> {
    let mut columns = row.into_iter();
    let source = NodeKey::decode(&take_column(&mut columns)?)?;
    let target = NodeKey::decode(&take_column(&mut columns)?)?;
    let metadata = decode_metadata(&take_column(&mut columns)?)?;
    Ok(EdgeView {
        source,
        target,
        metadata: Some(metadata),
    })
}

fn neighbor_key(row: Vec<String>) -> Result<NodeKey, GraphError> {
    let mut columns = row.into_iter();
    NodeKey::decode(&take_column(&mut columns)?)
}
