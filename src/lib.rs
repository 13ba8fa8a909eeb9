//! Storage-agnostic graph model with interchangeable backends.
//!
//! A [`Graph`] owns one [`Backend`]; callers talk to it through the
//! NetworkX-style [`NetworkXDialect`] returned by [`Graph::nx`].
//! [`MemoryBackend`] is the reference adapter and [`SqliteBackend`]
//! persists the same semantics in SQLite.
//!
//! ```rust
//! use anygraph::{Graph, MemoryBackend};
//!
//! let graph = Graph::new(MemoryBackend::undirected());
//! graph.nx().add_edge_with("A", "B", [("weight", 3)])?;
//! assert_eq!(graph.nx().get(("B", "A"))?["weight"], 3);
//! # Ok::<(), anygraph::GraphError>(())
//! ```
//!
//! Run Criterion benchmarks with `cargo bench` to compare adapters.

pub mod algo;
pub mod backend;
pub mod config;
pub mod dialect;
pub mod errors;
pub mod graph;
pub mod schema;

pub use crate::backend::{Backend, BackendIter, MemoryBackend, SqliteBackend};
pub use crate::config::{BackendKind, GraphConfig, MemoryConfig, SqliteConfig, open_graph};
pub use crate::dialect::{Lookup, NetworkXDialect};
pub use crate::errors::GraphError;
pub use crate::graph::{AdjacencyView, EdgeView, Graph, Metadata, NodeKey, NodeView};
