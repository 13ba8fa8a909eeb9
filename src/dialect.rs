//! NetworkX-compatible call surface over a [`Graph`].
//!
//! The dialect is the only layer that accepts flexible call-site metadata
//! (`(key, value)` pairs); everything below it takes a [`Metadata`] map.
//! Results come back as plain keys, maps and lazy sequences, never as
//! backend handles.

use serde_json::Value;

use crate::{
    backend::BackendIter,
    errors::GraphError,
    graph::{AdjacencyView, Graph, Metadata, NodeKey, metadata_from},
};

/// Target of an indexed lookup: a node key or an `(u, v)` edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Node(NodeKey),
    Edge(NodeKey, NodeKey),
}

impl From<NodeKey> for Lookup {
    fn from(key: NodeKey) -> Self {
        Lookup::Node(key)
    }
}

impl From<&NodeKey> for Lookup {
    fn from(key: &NodeKey) -> Self {
        Lookup::Node(key.clone())
    }
}

impl From<&str> for Lookup {
    fn from(key: &str) -> Self {
        Lookup::Node(key.into())
    }
}

impl From<String> for Lookup {
    fn from(key: String) -> Self {
        Lookup::Node(key.into())
    }
}

impl From<i64> for Lookup {
    fn from(key: i64) -> Self {
        Lookup::Node(key.into())
    }
}

impl<A, B> From<(A, B)> for Lookup
where
    A: Into<NodeKey>,
    B: Into<NodeKey>,
{
    fn from((u, v): (A, B)) -> Self {
        Lookup::Edge(u.into(), v.into())
    }
}

impl TryFrom<&[NodeKey]> for Lookup {
    type Error = GraphError;

    fn try_from(path: &[NodeKey]) -> Result<Self, Self::Error> {
        match path {
            [key] => Ok(Lookup::Node(key.clone())),
            [u, v] => Ok(Lookup::Edge(u.clone(), v.clone())),
            other => Err(GraphError::invalid_key(format!(
                "lookup takes a node key or an (u, v) pair, got {} components",
                other.len()
            ))),
        }
    }
}

/// Borrowed NetworkX-style view of a graph.
#[derive(Clone, Copy)]
pub struct NetworkXDialect<'g> {
    parent: &'g Graph,
}

impl<'g> NetworkXDialect<'g> {
    pub(crate) fn new(parent: &'g Graph) -> Self {
        Self { parent }
    }

    pub fn is_directed(&self) -> bool {
        self.parent.is_directed()
    }

    pub fn add_node<K: Into<NodeKey>>(&self, key: K) -> Result<(), GraphError> {
        self.parent.backend().add_node(key.into(), Metadata::new())
    }

    /// `add_node(key, **attrs)`.
    pub fn add_node_with<K, A, V, I>(&self, key: K, attrs: I) -> Result<(), GraphError>
    where
        K: Into<NodeKey>,
        A: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (A, V)>,
    {
        self.parent
            .backend()
            .add_node(key.into(), metadata_from(attrs))
    }

    pub fn add_nodes_from<K, I>(&self, keys: I) -> Result<(), GraphError>
    where
        K: Into<NodeKey>,
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            self.add_node(key)?;
        }
        Ok(())
    }

    /// Adds `(u, v)`, creating missing endpoints.
    pub fn add_edge<U, V>(&self, u: U, v: V) -> Result<(), GraphError>
    where
        U: Into<NodeKey>,
        V: Into<NodeKey>,
    {
        self.parent
            .backend()
            .add_edge(u.into(), v.into(), Metadata::new())
    }

    /// `add_edge(u, v, **attrs)`.
    pub fn add_edge_with<U, V, A, T, I>(&self, u: U, v: V, attrs: I) -> Result<(), GraphError>
    where
        U: Into<NodeKey>,
        V: Into<NodeKey>,
        A: Into<String>,
        T: Into<Value>,
        I: IntoIterator<Item = (A, T)>,
    {
        self.parent
            .backend()
            .add_edge(u.into(), v.into(), metadata_from(attrs))
    }

    pub fn add_edges_from<U, V, I>(&self, edges: I) -> Result<(), GraphError>
    where
        U: Into<NodeKey>,
        V: Into<NodeKey>,
        I: IntoIterator<Item = (U, V)>,
    {
        for (u, v) in edges {
            self.add_edge(u, v)?;
        }
        Ok(())
    }

    /// `nodes(data=False)`.
    pub fn nodes(&self) -> Result<BackendIter<'g, NodeKey>, GraphError> {
        let nodes = self.parent.backend().all_nodes(false)?;
        Ok(Box::new(nodes.map(|node| node.map(|view| view.key))))
    }

    /// `nodes(data=True)`.
    pub fn nodes_with_data(&self) -> Result<BackendIter<'g, (NodeKey, Metadata)>, GraphError> {
        let nodes = self.parent.backend().all_nodes(true)?;
        Ok(Box::new(nodes.map(|node| {
            node.map(|view| (view.key, view.metadata.unwrap_or_default()))
        })))
    }

    /// `edges(data=False)`.
    pub fn edges(&self) -> Result<BackendIter<'g, (NodeKey, NodeKey)>, GraphError> {
        let edges = self.parent.backend().all_edges(false)?;
        Ok(Box::new(
            edges.map(|edge| edge.map(|view| (view.source, view.target))),
        ))
    }

    /// `edges(data=True)`.
    pub fn edges_with_data(
        &self,
    ) -> Result<BackendIter<'g, (NodeKey, NodeKey, Metadata)>, GraphError> {
        let edges = self.parent.backend().all_edges(true)?;
        Ok(Box::new(edges.map(|edge| {
            edge.map(|view| {
                (
                    view.source,
                    view.target,
                    view.metadata.unwrap_or_default(),
                )
            })
        })))
    }

    pub fn neighbors<K: Into<NodeKey>>(&self, key: K) -> Result<BackendIter<'g, NodeKey>, GraphError> {
        self.parent.backend().neighbors(&key.into())
    }

    pub fn successors<K: Into<NodeKey>>(
        &self,
        key: K,
    ) -> Result<BackendIter<'g, NodeKey>, GraphError> {
        self.neighbors(key)
    }

    pub fn predecessors<K: Into<NodeKey>>(
        &self,
        key: K,
    ) -> Result<BackendIter<'g, NodeKey>, GraphError> {
        self.parent.backend().predecessors(&key.into())
    }

    /// `graph[key]` / `graph[u, v]`.
    pub fn get<L: Into<Lookup>>(&self, lookup: L) -> Result<Metadata, GraphError> {
        match lookup.into() {
            Lookup::Node(key) => self.parent.backend().get_node(&key),
            Lookup::Edge(u, v) => self.parent.backend().get_edge(&u, &v),
        }
    }

    /// Indexed lookup with a tuple-like slice of key components.
    pub fn get_path(&self, path: &[NodeKey]) -> Result<Metadata, GraphError> {
        self.get(Lookup::try_from(path)?)
    }

    /// `graph.nodes[key]`.
    pub fn node<K: Into<NodeKey>>(&self, key: K) -> Result<Metadata, GraphError> {
        self.parent.backend().get_node(&key.into())
    }

    pub fn get_edge_data<U, V>(&self, u: U, v: V) -> Result<Metadata, GraphError>
    where
        U: Into<NodeKey>,
        V: Into<NodeKey>,
    {
        self.parent.backend().get_edge(&u.into(), &v.into())
    }

    pub fn has_node<K: Into<NodeKey>>(&self, key: K) -> Result<bool, GraphError> {
        self.parent.backend().has_node(&key.into())
    }

    pub fn has_edge<U, V>(&self, u: U, v: V) -> Result<bool, GraphError>
    where
        U: Into<NodeKey>,
        V: Into<NodeKey>,
    {
        self.parent.backend().has_edge(&u.into(), &v.into())
    }

    pub fn number_of_nodes(&self) -> Result<usize, GraphError> {
        self.parent.backend().node_count()
    }

    pub fn number_of_edges(&self) -> Result<usize, GraphError> {
        self.parent.backend().edge_count()
    }

    /// Incident edge count; a self loop counts twice.
    pub fn degree<K: Into<NodeKey>>(&self, key: K) -> Result<usize, GraphError> {
        let key = key.into();
        let backend = self.parent.backend();
        let mut degree = 0;
        for neighbor in backend.neighbors(&key)? {
            degree += if neighbor? == key { 2 } else { 1 };
        }
        if backend.is_directed() {
            for predecessor in backend.predecessors(&key)? {
                // Directed self loops were already counted twice above.
                if predecessor? != key {
                    degree += 1;
                }
            }
        }
        Ok(degree)
    }

    /// The `_adj` mapping consumed by algorithm libraries.
    pub fn adj(&self) -> Result<AdjacencyView, GraphError> {
        self.parent.backend().adjacency_view()
    }

    pub fn remove_node<K: Into<NodeKey>>(&self, key: K) -> Result<(), GraphError> {
        self.parent.backend().remove_node(&key.into())
    }

    pub fn remove_edge<U, V>(&self, u: U, v: V) -> Result<(), GraphError>
    where
        U: Into<NodeKey>,
        V: Into<NodeKey>,
    {
        self.parent.backend().remove_edge(&u.into(), &v.into())
    }
}
