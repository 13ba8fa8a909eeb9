//! Backend contract shared by every storage adapter.
//!
//! A [`Backend`] stores one graph with fixed directedness and answers the
//! same CRUD and enumeration primitives regardless of the medium behind it.
//! [`MemoryBackend`] is the reference adapter; [`SqliteBackend`] persists
//! the same semantics in SQLite tables.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::{
    errors::GraphError,
    graph::{AdjacencyView, EdgeView, Metadata, NodeKey, NodeView},
};

/// Lazy, single-pass sequence returned by enumeration operations.
///
/// Items are fallible because a streaming adapter may fail between pages.
pub type BackendIter<'a, T> = Box<dyn Iterator<Item = Result<T, GraphError>> + 'a>;

/// Storage-neutral graph operations.
///
/// Mutations are total: they merge into existing state and never report
/// [`GraphError::NotFound`]. Lookups report `NotFound` for absent keys and
/// an empty result for present keys with nothing to return.
pub trait Backend {
    /// Directedness fixed at construction.
    fn is_directed(&self) -> bool;

    /// Inserts `key`, or merges `metadata` into the existing node (last
    /// write wins per metadata key).
    fn add_node(&self, key: NodeKey, metadata: Metadata) -> Result<(), GraphError>;

    fn get_node(&self, key: &NodeKey) -> Result<Metadata, GraphError>;

    /// Enumerates every node once. With `include_metadata == false` the
    /// returned views carry `metadata: None`.
    fn all_nodes(&self, include_metadata: bool) -> Result<BackendIter<'_, NodeView>, GraphError>;

    /// Inserts or merges the edge `(u, v)`.
    ///
    /// Missing endpoints are created with empty metadata as part of the
    /// same operation. On undirected graphs `(v, u)` resolves to the same
    /// edge afterwards.
    fn add_edge(&self, u: NodeKey, v: NodeKey, metadata: Metadata) -> Result<(), GraphError>;

    fn get_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<Metadata, GraphError>;

    /// Enumerates every edge once; undirected edges are not repeated in
    /// the reverse direction.
    fn all_edges(&self, include_metadata: bool) -> Result<BackendIter<'_, EdgeView>, GraphError>;

    /// Adjacent keys of `key`: outgoing neighbors on directed graphs.
    fn neighbors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError>;

    /// Incoming neighbors on directed graphs, `neighbors` otherwise.
    fn predecessors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError>;

    /// Removes `key` and every incident edge.
    fn remove_node(&self, key: &NodeKey) -> Result<(), GraphError>;

    fn remove_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<(), GraphError>;

    fn has_node(&self, key: &NodeKey) -> Result<bool, GraphError> {
        absent_as_false(self.get_node(key))
    }

    fn has_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<bool, GraphError> {
        absent_as_false(self.get_edge(u, v))
    }

    fn node_count(&self) -> Result<usize, GraphError> {
        count_items(self.all_nodes(false)?)
    }

    fn edge_count(&self) -> Result<usize, GraphError> {
        count_items(self.all_edges(false)?)
    }

    /// Materialized adjacency mapping, symmetric on undirected graphs.
    fn adjacency_view(&self) -> Result<AdjacencyView, GraphError> {
        let directed = self.is_directed();
        let mut view = AdjacencyView::new();
        for node in self.all_nodes(false)? {
            view.insert_node(node?.key);
        }
        for edge in self.all_edges(true)? {
            let edge = edge?;
            view.insert_edge(
                edge.source,
                edge.target,
                edge.metadata.unwrap_or_default(),
                directed,
            );
        }
        Ok(view)
    }
}

fn absent_as_false<T>(result: Result<T, GraphError>) -> Result<bool, GraphError> {
    match result {
        Ok(_) => Ok(true),
        Err(GraphError::NotFound(_)) => Ok(false),
        Err(other) => Err(other),
    }
}

fn count_items<T>(items: BackendIter<'_, T>) -> Result<usize, GraphError> {
    let mut count = 0;
    for item in items {
        item?;
        count += 1;
    }
    Ok(count)
}

macro_rules! forward_backend {
    () => {
        fn is_directed(&self) -> bool {
            (**self).is_directed()
        }

        fn add_node(&self, key: NodeKey, metadata: Metadata) -> Result<(), GraphError> {
            (**self).add_node(key, metadata)
        }

        fn get_node(&self, key: &NodeKey) -> Result<Metadata, GraphError> {
            (**self).get_node(key)
        }

        fn all_nodes(
            &self,
            include_metadata: bool,
        ) -> Result<BackendIter<'_, NodeView>, GraphError> {
            (**self).all_nodes(include_metadata)
        }

        fn add_edge(&self, u: NodeKey, v: NodeKey, metadata: Metadata) -> Result<(), GraphError> {
            (**self).add_edge(u, v, metadata)
        }

        fn get_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<Metadata, GraphError> {
            (**self).get_edge(u, v)
        }

        fn all_edges(
            &self,
            include_metadata: bool,
        ) -> Result<BackendIter<'_, EdgeView>, GraphError> {
            (**self).all_edges(include_metadata)
        }

        fn neighbors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError> {
            (**self).neighbors(key)
        }

        fn predecessors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError> {
            (**self).predecessors(key)
        }

        fn remove_node(&self, key: &NodeKey) -> Result<(), GraphError> {
            (**self).remove_node(key)
        }

        fn remove_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<(), GraphError> {
            (**self).remove_edge(u, v)
        }

        fn has_node(&self, key: &NodeKey) -> Result<bool, GraphError> {
            (**self).has_node(key)
        }

        fn has_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<bool, GraphError> {
            (**self).has_edge(u, v)
        }

        fn node_count(&self) -> Result<usize, GraphError> {
            (**self).node_count()
        }

        fn edge_count(&self) -> Result<usize, GraphError> {
            (**self).edge_count()
        }

        fn adjacency_view(&self) -> Result<AdjacencyView, GraphError> {
            (**self).adjacency_view()
        }
    };
}

/// Reference implementation for Backend trait that works with references.
impl<B> Backend for &B
where
    B: Backend + ?Sized,
{
    forward_backend!();
}

impl<B> Backend for Box<B>
where
    B: Backend + ?Sized,
{
    forward_backend!();
}
