//! Shared data types for the graph boundary.
//!
//! # Identity
//!
//! Nodes are identified by their `id` string, unique within a graph. Edge
//! identity is *derived*: [`EdgeDef::edge_id`] composes
//! `"{source[.sourcePort]}-{target[.targetPort]}"`, which is deterministic
//! and collision-free given unique port names. Two `EdgeDef`s with the same
//! endpoints and ports denote the same edge; re-adding one overwrites the
//! previous record (last-writer-wins).
//!
//! # Snapshot contract
//!
//! [`GraphSnapshotV1`] is the stable, versioned seed format. `version` must
//! be `1`; breaking schema changes require a new version struct. Node and
//! edge payloads (`data`) are opaque JSON maps carried through untouched.

use im::HashSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ── Graph snapshot (versioned, deterministic) ──────────────────────

/// Stable, versioned seed input format. The whole snapshot is committed as
/// one initial batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshotV1 {
    /// Must be `1`.
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    pub id: String,
    /// Opaque per-node payload.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl NodeDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), data: HashMap::new() }
    }

    pub fn with_data(id: impl Into<String>, data: HashMap<String, serde_json::Value>) -> Self {
        Self { id: id.into(), data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,
    /// Opaque per-edge payload.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl EdgeDef {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_port: None,
            target: target.into(),
            target_port: None,
            data: HashMap::new(),
        }
    }

    pub fn with_ports(
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_port: Some(source_port.into()),
            target: target.into(),
            target_port: Some(target_port.into()),
            data: HashMap::new(),
        }
    }

    /// Derived edge identity: `"{source[.sourcePort]}-{target[.targetPort]}"`.
    pub fn edge_id(&self) -> String {
        let mut id = String::with_capacity(self.source.len() + self.target.len() + 2);
        id.push_str(&self.source);
        if let Some(port) = &self.source_port {
            id.push('.');
            id.push_str(port);
        }
        id.push('-');
        id.push_str(&self.target);
        if let Some(port) = &self.target_port {
            id.push('.');
            id.push_str(port);
        }
        id
    }
}

// ── Layer records ──────────────────────────────────────────────────

/// Stable handle for a layer. Survives compaction; only the positional
/// `index` of a [`Layer`] is renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One horizontal stratum of the layering. A layer may be empty transiently
/// during a batch but never at batch commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    /// Position in the layer list; renumbered on compaction.
    pub index: usize,
    pub nodes: HashSet<String>,
}

// ── Audit findings ─────────────────────────────────────────────────

/// What a snapshot pre-flight or an invariant audit can flag.
///
/// The first three only come out of `validate` (they describe raw snapshot
/// input); the rest describe how a graph deviates from the layering
/// contract and only come out of `check_invariants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCode {
    /// An edge endpoint no node supplies.
    DanglingEdge,
    /// A node id defined more than once; the last definition wins.
    DuplicateNode,
    /// Two edge definitions deriving the same edge id.
    DuplicateEdge,
    /// A node the layer map does not cover.
    UnlayeredNode,
    /// A layer-map entry for a node that no longer exists.
    StaleLayerEntry,
    /// An edge whose source layer is not strictly above its target layer.
    LayerOrder,
    /// Layer list, layer records, and index fields out of sync.
    LayerIndex,
    /// A layer that survived to commit with no nodes on it.
    EmptyLayer,
    /// An adjacency set disagreeing with the edge map.
    AdjacencyDrift,
    /// A directed cycle.
    CycleDetected,
}

impl AuditCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCode::DanglingEdge => "DANGLING_EDGE",
            AuditCode::DuplicateNode => "DUPLICATE_NODE",
            AuditCode::DuplicateEdge => "DUPLICATE_EDGE",
            AuditCode::UnlayeredNode => "UNLAYERED_NODE",
            AuditCode::StaleLayerEntry => "STALE_LAYER_ENTRY",
            AuditCode::LayerOrder => "LAYER_ORDER",
            AuditCode::LayerIndex => "LAYER_INDEX",
            AuditCode::EmptyLayer => "EMPTY_LAYER",
            AuditCode::AdjacencyDrift => "ADJACENCY_DRIFT",
            AuditCode::CycleDetected => "CYCLE_DETECTED",
        }
    }
}

impl fmt::Display for AuditCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding, anchored to a node, a layer, or the graph as a whole.
/// Findings are descriptive; they never abort a commit by themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: AuditCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<LayerId>,
    pub message: String,
}

impl Diagnostic {
    pub fn node(code: AuditCode, node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code, node_id: Some(node_id.into()), layer_id: None, message: message.into() }
    }

    pub fn layer(code: AuditCode, layer_id: LayerId, message: impl Into<String>) -> Self {
        Self { code, node_id: None, layer_id: Some(layer_id), message: message.into() }
    }

    pub fn graph(code: AuditCode, message: impl Into<String>) -> Self {
        Self { code, node_id: None, layer_id: None, message: message.into() }
    }
}
