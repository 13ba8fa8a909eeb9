//! Configuration for backend selection and backend-specific options.
//!
//! A [`GraphConfig`] names the storage medium, the graph's directedness
//! and the options of the persistent adapter. [`open_graph`] turns it into
//! a ready [`Graph`].

use std::{collections::HashMap, path::PathBuf, time::Duration};

use tracing::debug;

use crate::{
    backend::{MemoryBackend, SqliteBackend},
    errors::GraphError,
    graph::Graph,
};

/// Storage medium backing a graph.
///
/// # Examples
///
/// ```rust
/// use anygraph::{BackendKind, GraphConfig};
///
/// let cfg = GraphConfig::new(BackendKind::Sqlite);
/// assert_eq!(cfg.backend, BackendKind::Sqlite);
/// assert_eq!(GraphConfig::default().backend, BackendKind::Memory);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Hash-map adapter living in process memory.
    #[default]
    Memory,
    /// Relational adapter persisting nodes and edges in SQLite tables.
    Sqlite,
}

/// Options for the in-memory adapter.
#[derive(Clone, Debug, Default)]
pub struct MemoryConfig {
    /// Optional node capacity hint; the tables grow beyond it as needed.
    pub reserve_node_capacity: Option<usize>,
}

/// Options for the SQLite adapter.
///
/// # Default Configuration
///
/// ```rust
/// use anygraph::SqliteConfig;
/// let config = SqliteConfig::default();
/// assert!(config.path.is_none());
/// assert_eq!(config.page_size, 256);
/// assert!(config.pragma_settings.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct SqliteConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,

    /// Rows fetched per round trip by streaming enumerations.
    ///
    /// **Default:** `256`. Values below 1 are treated as 1.
    pub page_size: usize,

    /// How long a writer waits on a locked database before the call fails
    /// with [`GraphError::BackendUnavailable`].
    ///
    /// **Default:** 5 seconds.
    pub busy_timeout: Option<Duration>,

    /// Capacity of the prepared statement cache.
    pub statement_cache_capacity: usize,

    /// Additional PRAGMA settings applied right after the connection opens.
    ///
    /// ```rust
    /// use anygraph::GraphConfig;
    ///
    /// let mut cfg = GraphConfig::sqlite();
    /// cfg.sqlite.pragma_settings.insert("synchronous".to_string(), "NORMAL".to_string());
    /// let graph = anygraph::open_graph(&cfg)?;
    /// # Ok::<(), anygraph::GraphError>(())
    /// ```
    pub pragma_settings: HashMap<String, String>,
}

impl SqliteConfig {
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub(crate) fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            page_size: 256,
            busy_timeout: Some(Duration::from_secs(5)),
            statement_cache_capacity: 128,
            pragma_settings: HashMap::new(),
        }
    }
}

/// Complete configuration for graph construction.
///
/// # Examples
///
/// ```rust
/// use anygraph::{BackendKind, GraphConfig};
///
/// let cfg = GraphConfig::sqlite().directed(true);
/// assert_eq!(cfg.backend, BackendKind::Sqlite);
/// assert!(cfg.directed);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GraphConfig {
    /// Which adapter to construct.
    pub backend: BackendKind,

    /// Directed or undirected semantics, immutable once the graph exists.
    pub directed: bool,

    pub memory: MemoryConfig,

    /// Only read when `backend` is [`BackendKind::Sqlite`].
    pub sqlite: SqliteConfig,
}

impl GraphConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn memory() -> Self {
        Self::new(BackendKind::Memory)
    }

    pub fn sqlite() -> Self {
        Self::new(BackendKind::Sqlite)
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Selects the SQLite adapter backed by the file at `path`.
    pub fn sqlite_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.backend = BackendKind::Sqlite;
        self.sqlite.path = Some(path.into());
        self
    }
}

/// Opens a graph with the adapter selected by `cfg`.
///
/// ```rust
/// use anygraph::{GraphConfig, open_graph};
///
/// let graph = open_graph(&GraphConfig::memory())?;
/// graph.nx().add_edge("A", "B")?;
/// assert_eq!(graph.nx().number_of_nodes()?, 2);
/// # Ok::<(), anygraph::GraphError>(())
/// ```
pub fn open_graph(cfg: &GraphConfig) -> Result<Graph, GraphError> {
    debug!(backend = ?cfg.backend, directed = cfg.directed, "opening graph");
    match cfg.backend {
        BackendKind::Memory => {
            let backend = match cfg.memory.reserve_node_capacity {
                Some(capacity) => MemoryBackend::with_capacity(cfg.directed, capacity),
                None => MemoryBackend::new(cfg.directed),
            };
            Ok(Graph::new(backend))
        }
        BackendKind::Sqlite => {
            let backend = match &cfg.sqlite.path {
                Some(path) => SqliteBackend::open_with_config(path, cfg.directed, &cfg.sqlite)?,
                None => SqliteBackend::open_in_memory_with_config(cfg.directed, &cfg.sqlite)?,
            };
            Ok(Graph::new(backend))
        }
    }
}
