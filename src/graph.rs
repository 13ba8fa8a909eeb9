//! User-facing graph handle.

mod types;

pub use types::{
    AdjacencyView, EdgeView, Metadata, NodeKey, NodeView, merge_metadata, metadata_from,
};

use std::fmt;

use crate::{backend::Backend, dialect::NetworkXDialect};

/// Owns exactly one backend and hands out the dialect surface.
///
/// The facade only knows the [`Backend`] trait, so any adapter can be
/// installed without changing callers. Every shipped adapter is `Send`,
/// so a `Graph` can be handed to another thread.
pub struct Graph {
    backend: Box<dyn Backend + Send>,
}

impl Graph {
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend + Send + 'static,
    {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn Backend + Send>) -> Self {
        Self { backend }
    }

    /// NetworkX-style view over this graph.
    pub fn nx(&self) -> NetworkXDialect<'_> {
        NetworkXDialect::new(self)
    }

    pub fn is_directed(&self) -> bool {
        self.backend.is_directed()
    }

    /// The installed adapter, for callers that speak the contract directly.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Releases the installed backend.
    pub fn into_backend(self) -> Box<dyn Backend + Send> {
        self.backend
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("directed", &self.is_directed())
            .finish_non_exhaustive()
    }
}
