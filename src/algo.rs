//! Graph algorithms written purely against the dialect surface.
//!
//! Nothing here knows which adapter is installed, so running the same
//! routine over two backends holding the same graph must give the same
//! answer.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::{
    dialect::NetworkXDialect,
    errors::GraphError,
    graph::{AdjacencyView, NodeKey},
};

/// Node-to-node assignment produced by subgraph matching.
pub type Mapping = BTreeMap<NodeKey, NodeKey>;

/// Breadth-first successor lists rooted at `source`.
///
/// Each discovered parent maps to the children it discovered, in discovery
/// order. Neighbors are expanded in key order so the result does not
/// depend on backend enumeration order.
pub fn bfs_successors<K: Into<NodeKey>>(
    graph: &NetworkXDialect<'_>,
    source: K,
) -> Result<BTreeMap<NodeKey, Vec<NodeKey>>, GraphError> {
    let source = source.into();
    let mut successors = BTreeMap::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    seen.insert(source.clone());
    queue.push_back(source);
    while let Some(node) = queue.pop_front() {
        let mut neighbors = graph
            .neighbors(node.clone())?
            .collect::<Result<Vec<_>, _>>()?;
        neighbors.sort();
        let mut children = Vec::new();
        for next in neighbors {
            if seen.insert(next.clone()) {
                children.push(next.clone());
                queue.push_back(next);
            }
        }
        if !children.is_empty() {
            successors.insert(node, children);
        }
    }
    Ok(successors)
}

/// Every injective mapping of `pattern` nodes onto `host` nodes that
/// carries each pattern edge onto a host edge.
///
/// Host edges with no pattern counterpart are allowed (monomorphism, not
/// induced isomorphism). Mappings are returned in lexicographic order of
/// the pattern's sorted node keys.
pub fn subgraph_monomorphisms(
    host: &NetworkXDialect<'_>,
    pattern: &NetworkXDialect<'_>,
) -> Result<Vec<Mapping>, GraphError> {
    let host_adj = host.adj()?;
    let pattern_adj = pattern.adj()?;
    let order: Vec<NodeKey> = pattern_adj.iter().map(|(key, _)| key.clone()).collect();
    let candidates: Vec<NodeKey> = host_adj.iter().map(|(key, _)| key.clone()).collect();
    if order.len() > candidates.len() {
        return Ok(Vec::new());
    }

    let mut matcher = Matcher {
        host: &host_adj,
        pattern: &pattern_adj,
        order: &order,
        candidates: &candidates,
        assigned: Mapping::new(),
        used: BTreeSet::new(),
        found: Vec::new(),
    };
    matcher.extend(0);
    Ok(matcher.found)
}

/// Number of monomorphisms of `pattern` into `host`.
pub fn count_subgraph_monomorphisms(
    host: &NetworkXDialect<'_>,
    pattern: &NetworkXDialect<'_>,
) -> Result<usize, GraphError> {
    Ok(subgraph_monomorphisms(host, pattern)?.len())
}

struct Matcher<'a> {
    host: &'a AdjacencyView,
    pattern: &'a AdjacencyView,
    order: &'a [NodeKey],
    candidates: &'a [NodeKey],
    assigned: Mapping,
    used: BTreeSet<NodeKey>,
    found: Vec<Mapping>,
}

impl Matcher<'_> {
    fn extend(&mut self, depth: usize) {
        let Some(node) = self.order.get(depth) else {
            self.found.push(self.assigned.clone());
            return;
        };
        for candidate in self.candidates {
            if self.used.contains(candidate) || !self.consistent(node, candidate) {
                continue;
            }
            self.assigned.insert(node.clone(), candidate.clone());
            self.used.insert(candidate.clone());
            self.extend(depth + 1);
            self.used.remove(candidate);
            self.assigned.remove(node);
        }
    }

    /// Checks every pattern edge between `node` and the already assigned
    /// nodes (itself included) against the host.
    fn consistent(&self, node: &NodeKey, candidate: &NodeKey) -> bool {
        if self.pattern.edge(node, node).is_some() && self.host.edge(candidate, candidate).is_none()
        {
            return false;
        }
        self.assigned.iter().all(|(other, image)| {
            let forward = self.pattern.edge(node, other).is_none()
                || self.host.edge(candidate, image).is_some();
            let backward = self.pattern.edge(other, node).is_none()
                || self.host.edge(image, candidate).is_some();
            forward && backward
        })
    }
}
