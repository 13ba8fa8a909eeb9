//! In-memory reference backend.
//!
//! Nodes and adjacency live in hash maps behind a single `RwLock`. Every
//! edge owns one shared metadata slot; undirected insertions register that
//! slot under both directions, so `(u, v)` and `(v, u)` observe the same
//! value by construction.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use tracing::trace;

use crate::{
    backend::{Backend, BackendIter},
    errors::GraphError,
    graph::{AdjacencyView, EdgeView, Metadata, NodeKey, NodeView, merge_metadata},
};

type EdgeSlot = Arc<RwLock<Metadata>>;
type AdjacencyMap = AHashMap<NodeKey, AHashMap<NodeKey, EdgeSlot>>;

#[derive(Default)]
struct MemoryState {
    nodes: AHashMap<NodeKey, Metadata>,
    /// Outgoing adjacency; both directions for undirected graphs.
    succ: AdjacencyMap,
    /// Incoming adjacency, maintained for directed graphs only.
    pred: AdjacencyMap,
}

impl MemoryState {
    fn ensure_node(&mut self, key: &NodeKey, directed: bool) {
        if self.nodes.contains_key(key) {
            return;
        }
        self.nodes.insert(key.clone(), Metadata::new());
        self.succ.insert(key.clone(), AHashMap::new());
        if directed {
            self.pred.insert(key.clone(), AHashMap::new());
        }
    }

    fn row(
        &self,
        key: &NodeKey,
        incoming: bool,
    ) -> Result<&AHashMap<NodeKey, EdgeSlot>, GraphError> {
        let map = if incoming { &self.pred } else { &self.succ };
        map.get(key)
            .ok_or_else(|| GraphError::not_found(format!("node {key}")))
    }
}

/// Reference adapter used both in production and as the conformance oracle.
pub struct MemoryBackend {
    directed: bool,
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            state: RwLock::new(MemoryState::default()),
        }
    }

    pub fn undirected() -> Self {
        Self::new(false)
    }

    pub fn directed() -> Self {
        Self::new(true)
    }

    /// Pre-sizes the node and adjacency tables.
    pub fn with_capacity(directed: bool, nodes: usize) -> Self {
        let state = MemoryState {
            nodes: AHashMap::with_capacity(nodes),
            succ: AHashMap::with_capacity(nodes),
            pred: if directed {
                AHashMap::with_capacity(nodes)
            } else {
                AHashMap::new()
            },
        };
        Self {
            directed,
            state: RwLock::new(state),
        }
    }

    fn neighbor_keys(&self, key: &NodeKey, incoming: bool) -> Result<Vec<NodeKey>, GraphError> {
        let state = self.state.read();
        let row = state.row(key, incoming && self.directed)?;
        Ok(row.keys().cloned().collect())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::undirected()
    }
}

impl Backend for MemoryBackend {
    fn is_directed(&self) -> bool {
        self.directed
    }

    fn add_node(&self, key: NodeKey, metadata: Metadata) -> Result<(), GraphError> {
        let mut state = self.state.write();
        state.ensure_node(&key, self.directed);
        if let Some(existing) = state.nodes.get_mut(&key) {
            merge_metadata(existing, metadata);
        }
        trace!(node = %key, "memory add_node");
        Ok(())
    }

    fn get_node(&self, key: &NodeKey) -> Result<Metadata, GraphError> {
        self.state
            .read()
            .nodes
            .get(key)
            .cloned()
            .ok_or_else(|| GraphError::not_found(format!("node {key}")))
    }

    fn all_nodes(&self, include_metadata: bool) -> Result<BackendIter<'_, NodeView>, GraphError> {
        let state = self.state.read();
        let snapshot: Vec<NodeView> = state
            .nodes
            .iter()
            .map(|(key, metadata)| NodeView {
                key: key.clone(),
                metadata: include_metadata.then(|| metadata.clone()),
            })
            .collect();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn add_edge(&self, u: NodeKey, v: NodeKey, metadata: Metadata) -> Result<(), GraphError> {
        let directed = self.directed;
        let mut state = self.state.write();
        state.ensure_node(&u, directed);
        state.ensure_node(&v, directed);

        let existing = state.succ.get(&u).and_then(|row| row.get(&v)).cloned();
        match existing {
            Some(slot) => merge_metadata(&mut slot.write(), metadata),
            None => {
                let slot: EdgeSlot = Arc::new(RwLock::new(metadata));
                if let Some(row) = state.succ.get_mut(&u) {
                    row.insert(v.clone(), Arc::clone(&slot));
                }
                let back = if directed {
                    state.pred.get_mut(&v)
                } else {
                    state.succ.get_mut(&v)
                };
                if let Some(row) = back {
                    row.insert(u.clone(), slot);
                }
            }
        }
        trace!(source = %u, target = %v, "memory add_edge");
        Ok(())
    }

    fn get_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<Metadata, GraphError> {
        let state = self.state.read();
        state
            .succ
            .get(u)
            .and_then(|row| row.get(v))
            .map(|slot| slot.read().clone())
            .ok_or_else(|| GraphError::not_found(format!("edge ({u}, {v})")))
    }

    fn all_edges(&self, include_metadata: bool) -> Result<BackendIter<'_, EdgeView>, GraphError> {
        let state = self.state.read();
        let mut seen: AHashSet<&NodeKey> = AHashSet::new();
        let mut snapshot = Vec::new();
        for (u, row) in &state.succ {
            for (v, slot) in row {
                if !self.directed && seen.contains(v) {
                    continue;
                }
                snapshot.push(EdgeView {
                    source: u.clone(),
                    target: v.clone(),
                    metadata: include_metadata.then(|| slot.read().clone()),
                });
            }
            seen.insert(u);
        }
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn neighbors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError> {
        let keys = self.neighbor_keys(key, false)?;
        Ok(Box::new(keys.into_iter().map(Ok)))
    }

    fn predecessors(&self, key: &NodeKey) -> Result<BackendIter<'_, NodeKey>, GraphError> {
        let keys = self.neighbor_keys(key, true)?;
        Ok(Box::new(keys.into_iter().map(Ok)))
    }

    fn remove_node(&self, key: &NodeKey) -> Result<(), GraphError> {
        let directed = self.directed;
        let mut state = self.state.write();
        if state.nodes.remove(key).is_none() {
            return Err(GraphError::not_found(format!("node {key}")));
        }
        let outgoing = state.succ.remove(key).unwrap_or_default();
        for target in outgoing.keys() {
            let back = if directed {
                state.pred.get_mut(target)
            } else {
                state.succ.get_mut(target)
            };
            if let Some(row) = back {
                row.remove(key);
            }
        }
        if directed {
            let incoming = state.pred.remove(key).unwrap_or_default();
            for source in incoming.keys() {
                if let Some(row) = state.succ.get_mut(source) {
                    row.remove(key);
                }
            }
        }
        Ok(())
    }

    fn remove_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<(), GraphError> {
        let directed = self.directed;
        let mut state = self.state.write();
        let removed = state
            .succ
            .get_mut(u)
            .and_then(|row| row.remove(v))
            .is_some();
        if !removed {
            return Err(GraphError::not_found(format!("edge ({u}, {v})")));
        }
        let back = if directed {
            state.pred.get_mut(v)
        } else {
            state.succ.get_mut(v)
        };
        if let Some(row) = back {
            row.remove(u);
        }
        Ok(())
    }

    fn has_node(&self, key: &NodeKey) -> Result<bool, GraphError> {
        Ok(self.state.read().nodes.contains_key(key))
    }

    fn has_edge(&self, u: &NodeKey, v: &NodeKey) -> Result<bool, GraphError> {
        let state = self.state.read();
        Ok(state.succ.get(u).is_some_and(|row| row.contains_key(v)))
    }

    fn node_count(&self) -> Result<usize, GraphError> {
        Ok(self.state.read().nodes.len())
    }

    fn edge_count(&self) -> Result<usize, GraphError> {
        let state = self.state.read();
        let entries: usize = state.succ.values().map(|row| row.len()).sum();
        if self.directed {
            return Ok(entries);
        }
        // Self loops occupy a single entry; every other edge occupies two.
        let loops = state
            .succ
            .iter()
            .filter(|(key, row)| row.contains_key(*key))
            .count();
        Ok((entries + loops) / 2)
    }

    fn adjacency_view(&self) -> Result<AdjacencyView, GraphError> {
        let state = self.state.read();
        let mut view = AdjacencyView::new();
        for key in state.nodes.keys() {
            view.insert_node(key.clone());
        }
        for (u, row) in &state.succ {
            for (v, slot) in row {
                // Undirected rows already hold both directions.
                view.insert_edge(u.clone(), v.clone(), slot.read().clone(), true);
            }
        }
        Ok(view)
    }
}
