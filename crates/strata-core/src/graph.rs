//! Persistent [`StrataGraph`] value with batched mutation.
//!
//! # Design
//!
//! A `StrataGraph` is an immutable snapshot of a layered DAG. Every mutation
//! entry point commits one batch and returns a *new* graph value; the
//! receiver is never modified and stays fully readable. Versions share
//! unchanged interior structure (the indices are `im` tries), so holding a
//! chain of versions is cheap.
//!
//! # Invariants
//!
//! After every successful commit:
//!
//! - every node sits on exactly one layer, and for every edge u→v the layer
//!   index of u is strictly less than that of v;
//! - layer indices are exactly `0..num_layers()` with no empty layer;
//! - a node without predecessors sits on layer 0, and a node with
//!   predecessors sits exactly one layer below its deepest predecessor.
//!
//! A batch that would introduce a cycle fails with `CycleDetected` and the
//! original graph is untouched.

use std::sync::Arc;

use crate::changes::Mutator;
use crate::commit;
use crate::error::GraphError;
use crate::store::GraphCore;
use crate::types::{EdgeDef, GraphSnapshotV1, Layer, LayerId, NodeDef};
use crate::validate;

/// Persistent layered DAG. Cheap to clone; mutations return new versions.
#[derive(Debug, Clone, Default)]
pub struct StrataGraph {
    core: GraphCore,
    prior: Option<Arc<StrataGraph>>,
}

impl StrataGraph {
    /// An empty graph with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and commit a versioned snapshot as the seed batch.
    /// Dangling edge endpoints surface as `UnknownEndpoint`.
    pub fn from_snapshot(snapshot: GraphSnapshotV1) -> Result<Self, GraphError> {
        validate::validate(&snapshot)?;
        StrataGraph::new().with_mutations(|m| {
            m.add_nodes(snapshot.nodes);
            m.add_edges(snapshot.edges);
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.core.nodes.is_empty()
    }

    pub fn num_nodes(&self) -> usize {
        self.core.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.core.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeDef> {
        self.core.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeDef> {
        self.core.edges.values()
    }

    /// All node ids, sorted lexicographically.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.core.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn get_node(&self, id: &str) -> Option<&NodeDef> {
        self.core.nodes.get(id)
    }

    pub fn get_edge(&self, edge_id: &str) -> Option<&EdgeDef> {
        self.core.edges.get(edge_id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.core.nodes.contains_key(id)
    }

    pub fn has_edge(&self, edge_id: &str) -> bool {
        self.core.edges.contains_key(edge_id)
    }

    /// Distinct predecessor node ids, sorted lexicographically.
    pub fn pred_nodes(&self, id: &str) -> Vec<String> {
        self.core.pred_node_ids(id)
    }

    /// Distinct successor node ids, sorted lexicographically.
    pub fn succ_nodes(&self, id: &str) -> Vec<String> {
        self.core.succ_node_ids(id)
    }

    /// Incoming edge ids, sorted lexicographically.
    pub fn pred_edges(&self, id: &str) -> Vec<String> {
        self.core.pred_edge_ids(id)
    }

    /// Outgoing edge ids, sorted lexicographically.
    pub fn succ_edges(&self, id: &str) -> Vec<String> {
        self.core.succ_edge_ids(id)
    }

    /// Positional layer index of a node; `None` iff `has_node` is false.
    pub fn layer_of(&self, id: &str) -> Option<usize> {
        self.core.layer_index_of(id)
    }

    /// The previous version in the commit chain, if any.
    pub fn prior(&self) -> Option<&StrataGraph> {
        self.prior.as_deref()
    }

    // ── Layer introspection ──────────────────────────────────────────

    pub fn num_layers(&self) -> usize {
        self.core.layer_list.len()
    }

    pub fn layers(&self) -> &im::HashMap<LayerId, Layer> {
        &self.core.layers
    }

    /// node id → layer id.
    pub fn layer_map(&self) -> &im::HashMap<String, LayerId> {
        &self.core.layer_map
    }

    /// Ordered layer ids; position equals current index.
    pub fn layer_list(&self) -> &im::Vector<LayerId> {
        &self.core.layer_list
    }

    // ── Mutations (each returns a new graph) ─────────────────────────

    pub fn add_node(&self, node: NodeDef) -> Result<StrataGraph, GraphError> {
        self.with_mutations(|m| {
            m.add_node(node);
        })
    }

    pub fn add_nodes(
        &self,
        nodes: impl IntoIterator<Item = NodeDef>,
    ) -> Result<StrataGraph, GraphError> {
        self.with_mutations(|m| {
            m.add_nodes(nodes);
        })
    }

    /// Remove a node by id (removal by `NodeDef` is `remove_node(&node.id)`).
    /// All incident edges are removed with it; an absent id is a no-op.
    pub fn remove_node(&self, id: impl Into<String>) -> Result<StrataGraph, GraphError> {
        self.with_mutations(|m| {
            m.remove_node(id);
        })
    }

    pub fn remove_nodes<I, S>(&self, ids: I) -> Result<StrataGraph, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_mutations(|m| {
            m.remove_nodes(ids);
        })
    }

    pub fn add_edge(&self, edge: EdgeDef) -> Result<StrataGraph, GraphError> {
        self.with_mutations(|m| {
            m.add_edge(edge);
        })
    }

    pub fn add_edges(
        &self,
        edges: impl IntoIterator<Item = EdgeDef>,
    ) -> Result<StrataGraph, GraphError> {
        self.with_mutations(|m| {
            m.add_edges(edges);
        })
    }

    /// Remove an edge by derived id; an absent id is a no-op.
    pub fn remove_edge(&self, edge_id: impl Into<String>) -> Result<StrataGraph, GraphError> {
        self.with_mutations(|m| {
            m.remove_edge(edge_id);
        })
    }

    pub fn remove_edges<I, S>(&self, edge_ids: I) -> Result<StrataGraph, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_mutations(|m| {
            m.remove_edges(edge_ids);
        })
    }

    /// Accumulate one batch through a [`Mutator`] and commit it atomically.
    /// On error the receiver is unchanged and no new version is produced.
    pub fn with_mutations<F>(&self, build: F) -> Result<StrataGraph, GraphError>
    where
        F: FnOnce(&mut Mutator),
    {
        let mut mutator = Mutator::default();
        build(&mut mutator);
        let changes = mutator.into_changes();
        let core = commit::commit(&self.core, &changes)?;
        Ok(StrataGraph {
            core,
            prior: Some(Arc::new(self.clone())),
        })
    }

    pub(crate) fn core(&self) -> &GraphCore {
        &self.core
    }
}
