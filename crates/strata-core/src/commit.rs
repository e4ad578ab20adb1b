//! Mutation engine: applies a [`ChangeLog`] and orchestrates a commit.
//!
//! A commit works on a clone of the prior core (cheap, structurally shared),
//! so a rejected batch is simply dropped and the prior graph is untouched.
//! Order within one batch is fixed: add nodes, remove nodes, add edges,
//! remove edges; within each list, insertion order into the mutator.
//!
//! Cycle detection runs on the patched core *before* the layer updater, so
//! the incremental detector can rely on pre-batch layer data (see `cycles`).

use log::debug;
use std::collections::HashSet;

use crate::changes::ChangeLog;
use crate::error::{ErrorCode, GraphError};
use crate::store::GraphCore;
use crate::{cycles, layering};

/// Apply `changes` to `prior`, returning the next core or the error that
/// rejected the batch.
pub(crate) fn commit(prior: &GraphCore, changes: &ChangeLog) -> Result<GraphCore, GraphError> {
    let mut next = prior.clone();
    let dirty = apply(&mut next, changes)?;

    if let Some(cycle) = cycles::detect(&next, changes) {
        return Err(GraphError::cycle(cycle));
    }
    layering::update_layers(&mut next, &dirty);

    debug!(
        "commit: +{}/-{} nodes, +{}/-{} edges, {} dirty, {} layers",
        changes.added_nodes.len(),
        changes.removed_nodes.len(),
        changes.added_edges.len(),
        changes.removed_edges.len(),
        dirty.len(),
        next.layer_list.len()
    );
    Ok(next)
}

/// Structural application only. Returns the dirty node ids, deduplicated in
/// first-marked order: every added node plus the target of every added or
/// removed edge.
fn apply(core: &mut GraphCore, changes: &ChangeLog) -> Result<Vec<String>, GraphError> {
    let mut dirty: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // 1. Add nodes.
    for def in &changes.added_nodes {
        if seen.insert(def.id.clone()) {
            dirty.push(def.id.clone());
        }
        core.insert_node(def.clone());
    }

    // 2. Remove nodes, enqueueing incident edges ahead of the caller's own
    //    removals.
    let mut removal_queue: Vec<String> = Vec::new();
    for id in &changes.removed_nodes {
        removal_queue.extend(core.remove_node(id));
    }
    removal_queue.extend(changes.removed_edges.iter().cloned());

    // 3. Add edges. Both endpoints must exist at this point in the batch.
    for def in &changes.added_edges {
        for (endpoint, role) in [(&def.source, "source"), (&def.target, "target")] {
            if !core.nodes.contains_key(endpoint.as_str()) {
                return Err(GraphError::new(
                    ErrorCode::UnknownEndpoint,
                    format!(
                        "Edge '{}': {} node '{}' does not exist",
                        def.edge_id(),
                        role,
                        endpoint
                    ),
                ));
            }
        }
        core.insert_edge(def.clone());
        if seen.insert(def.target.clone()) {
            dirty.push(def.target.clone());
        }
    }

    // 4. Remove edges (cascaded first, then explicit). Missing ids are
    //    tolerated.
    for edge_id in &removal_queue {
        if let Some(edge) = core.remove_edge(edge_id) {
            if seen.insert(edge.target.clone()) {
                dirty.push(edge.target);
            }
        }
    }

    Ok(dirty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeDef, NodeDef};

    fn seeded(nodes: &[&str], edges: &[(&str, &str)]) -> GraphCore {
        let mut changes = ChangeLog::default();
        for id in nodes {
            changes.added_nodes.push(NodeDef::new(*id));
        }
        for (s, t) in edges {
            changes.added_edges.push(EdgeDef::new(*s, *t));
        }
        commit(&GraphCore::new(), &changes).expect("seed batch must commit")
    }

    #[test]
    fn apply_order_is_nodes_add_remove_then_edges_add_remove() {
        let prior = seeded(&["a", "b"], &[("a", "b")]);

        // One batch: add node c, remove node b, add edge a→c, remove a-c.
        // The removal runs last, so the edge must not survive.
        let mut changes = ChangeLog::default();
        changes.added_nodes.push(NodeDef::new("c"));
        changes.removed_nodes.push("b".to_string());
        changes.added_edges.push(EdgeDef::new("a", "c"));
        changes.removed_edges.push("a-c".to_string());

        let next = commit(&prior, &changes).unwrap();
        assert!(next.nodes.contains_key("c"));
        assert!(!next.nodes.contains_key("b"));
        assert!(!next.edges.contains_key("a-c"));
        assert!(!next.edges.contains_key("a-b"));
    }

    #[test]
    fn node_removal_cascades_incident_edges() {
        let prior = seeded(&["n1", "n2", "n3"], &[("n1", "n2"), ("n2", "n3")]);
        let mut changes = ChangeLog::default();
        changes.removed_nodes.push("n2".to_string());

        let next = commit(&prior, &changes).unwrap();
        assert!(next.edges.is_empty());
        assert!(next.succ_edge_ids("n1").is_empty());
        assert!(next.pred_edge_ids("n3").is_empty());
        assert_eq!(next.layer_index_of("n3"), Some(0));
    }

    #[test]
    fn edge_to_missing_source_is_rejected() {
        let prior = seeded(&["a"], &[]);
        let mut changes = ChangeLog::default();
        changes.added_edges.push(EdgeDef::new("ghost", "a"));
        let err = commit(&prior, &changes).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownEndpoint);
        assert!(err.message.contains("source node 'ghost' does not exist"));
    }

    #[test]
    fn edge_to_node_removed_in_same_batch_is_rejected() {
        let prior = seeded(&["a", "b"], &[]);
        let mut changes = ChangeLog::default();
        changes.removed_nodes.push("b".to_string());
        changes.added_edges.push(EdgeDef::new("a", "b"));
        let err = commit(&prior, &changes).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownEndpoint);
        assert!(err.message.contains("target node 'b' does not exist"));
    }

    #[test]
    fn removing_absent_edge_is_tolerated() {
        let prior = seeded(&["a", "b"], &[("a", "b")]);
        let mut changes = ChangeLog::default();
        changes.removed_edges.push("nope-nope".to_string());
        let next = commit(&prior, &changes).unwrap();
        assert_eq!(next.edges.len(), 1);
    }

    #[test]
    fn duplicate_edge_add_overwrites_payload() {
        let prior = seeded(&["a", "b"], &[("a", "b")]);
        let mut replacement = EdgeDef::new("a", "b");
        replacement
            .data
            .insert("weight".to_string(), serde_json::json!(2));
        let mut changes = ChangeLog::default();
        changes.added_edges.push(replacement);

        let next = commit(&prior, &changes).unwrap();
        assert_eq!(next.edges.len(), 1);
        let stored = next.edges.get("a-b").unwrap();
        assert_eq!(stored.data.get("weight"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn cycle_rejection_leaves_prior_untouched() {
        let prior = seeded(&["n1", "n2", "n3"], &[("n1", "n2"), ("n2", "n3")]);
        let mut changes = ChangeLog::default();
        changes.added_edges.push(EdgeDef::new("n3", "n1"));

        let err = commit(&prior, &changes).unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleDetected);
        let cycle = err.cycle.unwrap();
        assert_eq!(cycle.first(), cycle.last());
        for id in ["n1", "n2", "n3"] {
            assert!(cycle.contains(&id.to_string()));
        }
        assert_eq!(prior.edges.len(), 2);
        assert_eq!(prior.layer_index_of("n3"), Some(2));
    }

    #[test]
    fn self_loop_is_rejected() {
        let prior = seeded(&["n1"], &[]);
        let mut changes = ChangeLog::default();
        changes.added_edges.push(EdgeDef::new("n1", "n1"));
        let err = commit(&prior, &changes).unwrap_err();
        assert_eq!(err.cycle.unwrap(), vec!["n1".to_string(), "n1".into()]);
    }

    #[test]
    fn empty_batch_commits_to_equivalent_core() {
        let prior = seeded(&["a", "b"], &[("a", "b")]);
        let next = commit(&prior, &ChangeLog::default()).unwrap();
        assert_eq!(next.nodes.len(), prior.nodes.len());
        assert_eq!(next.edges.len(), prior.edges.len());
        assert_eq!(next.layer_index_of("b"), prior.layer_index_of("b"));
    }
}
