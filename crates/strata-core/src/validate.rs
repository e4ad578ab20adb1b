//! Snapshot pre-flight and invariant auditing.
//!
//! [`validate`] inspects a raw [`GraphSnapshotV1`] before it is committed.
//! Only a wrong `version` is fatal; everything else comes back as findings
//! the caller can act on: endpoints no node supplies (commit would reject
//! those with `UnknownEndpoint`), node ids or derived edge ids defined more
//! than once (commit keeps the last definition), and self-loops (commit
//! would reject those as cycles).
//!
//! [`check_invariants`] audits a *committed* graph against the layering
//! contract and describes every deviation. A healthy graph yields no
//! findings. The test suite runs it after every random batch; it is public
//! as a debugging aid.

use std::collections::HashSet;

use crate::cycles;
use crate::error::{ErrorCode, GraphError};
use crate::graph::StrataGraph;
use crate::types::{AuditCode, Diagnostic, GraphSnapshotV1};

const SUPPORTED_VERSION: u32 = 1;

/// Pre-flight a snapshot. Fatal only on an unsupported version; all other
/// findings are returned for inspection.
pub fn validate(snapshot: &GraphSnapshotV1) -> Result<Vec<Diagnostic>, GraphError> {
    if snapshot.version != SUPPORTED_VERSION {
        return Err(GraphError::new(
            ErrorCode::UnsupportedVersion,
            format!(
                "Snapshot version {} is not supported (expected {})",
                snapshot.version, SUPPORTED_VERSION
            ),
        ));
    }

    let mut findings = Vec::new();

    let mut ids: HashSet<&str> = HashSet::with_capacity(snapshot.nodes.len());
    for node in &snapshot.nodes {
        if !ids.insert(node.id.as_str()) {
            findings.push(Diagnostic::node(
                AuditCode::DuplicateNode,
                node.id.clone(),
                format!("Node id '{}' is defined more than once; the last definition wins", node.id),
            ));
        }
    }

    let mut edge_ids: HashSet<String> = HashSet::with_capacity(snapshot.edges.len());
    for edge in &snapshot.edges {
        let edge_id = edge.edge_id();
        for (endpoint, role) in [(&edge.source, "source"), (&edge.target, "target")] {
            if !ids.contains(endpoint.as_str()) {
                findings.push(Diagnostic::graph(
                    AuditCode::DanglingEdge,
                    format!("No node '{}' for the {} of edge '{}'", endpoint, role, edge_id),
                ));
            }
        }
        if edge.source == edge.target {
            findings.push(Diagnostic::node(
                AuditCode::CycleDetected,
                edge.source.clone(),
                format!("Edge '{}' loops '{}' onto itself", edge_id, edge.source),
            ));
        }
        if !edge_ids.insert(edge_id.clone()) {
            findings.push(Diagnostic::graph(
                AuditCode::DuplicateEdge,
                format!("Edge id '{}' is derived more than once; the last definition wins", edge_id),
            ));
        }
    }

    Ok(findings)
}

/// Audit the layering contract of a committed graph.
pub fn check_invariants(graph: &StrataGraph) -> Vec<Diagnostic> {
    let core = graph.core();
    let mut findings = Vec::new();

    // The layer map and the node map must cover each other exactly.
    for id in core.nodes.keys() {
        if core.layer_map.get(id).is_none() {
            findings.push(Diagnostic::node(
                AuditCode::UnlayeredNode,
                id.clone(),
                format!("Node '{}' is missing from the layer map", id),
            ));
        }
    }
    for id in core.layer_map.keys() {
        if !core.nodes.contains_key(id) {
            findings.push(Diagnostic::node(
                AuditCode::StaleLayerEntry,
                id.clone(),
                format!("Layer map still references removed node '{}'", id),
            ));
        }
    }

    // Every edge runs strictly downward in layer index.
    for (edge_id, edge) in core.edges.iter() {
        match (core.layer_index_of(&edge.source), core.layer_index_of(&edge.target)) {
            (Some(src), Some(tgt)) if src < tgt => {}
            (Some(src), Some(tgt)) => findings.push(Diagnostic::graph(
                AuditCode::LayerOrder,
                format!("Edge '{}' runs from layer {} to layer {}", edge_id, src, tgt),
            )),
            _ => findings.push(Diagnostic::graph(
                AuditCode::DanglingEdge,
                format!("Edge '{}' has an unlayered endpoint", edge_id),
            )),
        }
    }

    // Layer shape: list positions in sync with index fields, no empties,
    // no unlisted or listed-but-missing records.
    for (position, layer_id) in core.layer_list.iter().enumerate() {
        let Some(layer) = core.layers.get(layer_id) else {
            findings.push(Diagnostic::layer(
                AuditCode::LayerIndex,
                *layer_id,
                format!("Listed layer {} has no record", layer_id),
            ));
            continue;
        };
        if layer.index != position {
            findings.push(Diagnostic::layer(
                AuditCode::LayerIndex,
                *layer_id,
                format!("Layer {} records index {} but sits at position {}", layer_id, layer.index, position),
            ));
        }
        if layer.nodes.is_empty() {
            findings.push(Diagnostic::layer(
                AuditCode::EmptyLayer,
                *layer_id,
                format!("Layer {} at position {} holds no nodes", layer_id, position),
            ));
        }
    }
    if core.layers.len() != core.layer_list.len() {
        findings.push(Diagnostic::graph(
            AuditCode::LayerIndex,
            format!("{} layer records for {} listed layers", core.layers.len(), core.layer_list.len()),
        ));
    }

    // Adjacency agrees with the edge map in both directions.
    for (edge_id, edge) in core.edges.iter() {
        let indexed_out = core
            .succs
            .get(&edge.source)
            .map(|set| set.contains(edge_id))
            .unwrap_or(false);
        let indexed_in = core
            .preds
            .get(&edge.target)
            .map(|set| set.contains(edge_id))
            .unwrap_or(false);
        if !(indexed_out && indexed_in) {
            findings.push(Diagnostic::graph(
                AuditCode::AdjacencyDrift,
                format!("Edge '{}' is missing from its endpoint indices", edge_id),
            ));
        }
    }
    let adjacency_backed = |edge_id: &str, owner: &String, outgoing: bool| {
        core.edges
            .get(edge_id)
            .map(|e| if outgoing { &e.source == owner } else { &e.target == owner })
            .unwrap_or(false)
    };
    for (outgoing, index) in [(true, &core.succs), (false, &core.preds)] {
        for (id, edge_ids) in index.iter() {
            for edge_id in edge_ids {
                if !adjacency_backed(edge_id, id, outgoing) {
                    findings.push(Diagnostic::node(
                        AuditCode::AdjacencyDrift,
                        id.clone(),
                        format!("Adjacency entry '{}' on '{}' has no backing edge", edge_id, id),
                    ));
                }
            }
        }
    }

    // Acyclicity last; everything above can hold and this still fail.
    if let Some(cycle) = cycles::full_scan(core) {
        findings.push(Diagnostic::graph(
            AuditCode::CycleDetected,
            format!("Cycle detected: {}", cycle.join(" → ")),
        ));
    }

    findings
}
