use std::{
    collections::{BTreeMap, btree_map},
    fmt,
    ops::Index,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GraphError;

/// String-keyed metadata attached to a node or an edge.
pub type Metadata = serde_json::Map<String, Value>;

/// Caller-supplied node identity.
///
/// Keys are immutable values that compare and hash by content. Floats are
/// deliberately absent: they cannot serve as a stable identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Bool(bool),
    Int(i64),
    Str(String),
    Tuple(Vec<NodeKey>),
}

impl NodeKey {
    /// Canonical text form used by persistent adapters.
    pub fn encode(&self) -> Result<String, GraphError> {
        serde_json::to_string(self).map_err(|e| GraphError::invalid_key(e.to_string()))
    }

    pub fn decode(text: &str) -> Result<Self, GraphError> {
        serde_json::from_str(text)
            .map_err(|e| GraphError::invalid_key(format!("cannot decode key {text:?}: {e}")))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NodeKey::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Bool(value) => write!(f, "{value}"),
            NodeKey::Int(value) => write!(f, "{value}"),
            NodeKey::Str(value) => write!(f, "{value}"),
            NodeKey::Tuple(items) => {
                write!(f, "(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        NodeKey::Str(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        NodeKey::Str(value)
    }
}

impl From<&String> for NodeKey {
    fn from(value: &String) -> Self {
        NodeKey::Str(value.clone())
    }
}

impl From<&NodeKey> for NodeKey {
    fn from(value: &NodeKey) -> Self {
        value.clone()
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        NodeKey::Int(value)
    }
}

impl From<i32> for NodeKey {
    fn from(value: i32) -> Self {
        NodeKey::Int(value.into())
    }
}

impl From<u32> for NodeKey {
    fn from(value: u32) -> Self {
        NodeKey::Int(value.into())
    }
}

impl From<bool> for NodeKey {
    fn from(value: bool) -> Self {
        NodeKey::Bool(value)
    }
}

impl From<Vec<NodeKey>> for NodeKey {
    fn from(items: Vec<NodeKey>) -> Self {
        NodeKey::Tuple(items)
    }
}

/// Merges `update` into `existing`, last write wins per key.
pub fn merge_metadata(existing: &mut Metadata, update: Metadata) {
    for (key, value) in update {
        existing.insert(key, value);
    }
}

/// Builds a metadata map from `(key, value)` pairs.
pub fn metadata_from<K, V, I>(pairs: I) -> Metadata
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// One item of a node enumeration. `metadata` is `None` when the caller
/// asked for keys only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub key: NodeKey,
    pub metadata: Option<Metadata>,
}

/// One item of an edge enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: NodeKey,
    pub target: NodeKey,
    pub metadata: Option<Metadata>,
}

impl EdgeView {
    pub fn endpoints(&self) -> (&NodeKey, &NodeKey) {
        (&self.source, &self.target)
    }
}

/// Read-only `node -> (neighbor -> edge metadata)` mapping.
///
/// Two views compare equal when they hold the same nodes, the same
/// neighbors and the same metadata values, independent of the backend
/// that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacencyView {
    inner: BTreeMap<NodeKey, BTreeMap<NodeKey, Metadata>>,
}

impl AdjacencyView {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_node(&mut self, key: NodeKey) {
        self.inner.entry(key).or_default();
    }

    /// Records `u -> v`, plus `v -> u` for undirected graphs.
    pub(crate) fn insert_edge(
        &mut self,
        u: NodeKey,
        v: NodeKey,
        metadata: Metadata,
        directed: bool,
    ) {
        if !directed {
            self.inner
                .entry(v.clone())
                .or_default()
                .insert(u.clone(), metadata.clone());
        }
        self.inner.entry(v.clone()).or_default();
        self.inner.entry(u).or_default().insert(v, metadata);
    }

    pub fn get(&self, key: &NodeKey) -> Option<&BTreeMap<NodeKey, Metadata>> {
        self.inner.get(key)
    }

    pub fn contains_node(&self, key: &NodeKey) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, NodeKey, BTreeMap<NodeKey, Metadata>> {
        self.inner.iter()
    }

    pub fn edge(&self, u: &NodeKey, v: &NodeKey) -> Option<&Metadata> {
        self.inner.get(u).and_then(|row| row.get(v))
    }

    /// True when every `u -> v` entry has a matching `v -> u` entry with
    /// equal metadata.
    pub fn is_symmetric(&self) -> bool {
        self.inner.iter().all(|(u, row)| {
            row.iter()
                .all(|(v, metadata)| self.edge(v, u).is_some_and(|back| back == metadata))
        })
    }
}

impl Index<&NodeKey> for AdjacencyView {
    type Output = BTreeMap<NodeKey, Metadata>;

    fn index(&self, key: &NodeKey) -> &Self::Output {
        &self.inner[key]
    }
}

impl<'a> IntoIterator for &'a AdjacencyView {
    type Item = (&'a NodeKey, &'a BTreeMap<NodeKey, Metadata>);
    type IntoIter = btree_map::Iter<'a, NodeKey, BTreeMap<NodeKey, Metadata>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
