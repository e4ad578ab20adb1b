//! Two-phase incremental layer maintenance.
//!
//! Runs after a batch's structural edits have been applied and the cycle
//! check has passed. Restores the layering invariant (every edge u→v has
//! `index(u) < index(v)`, indices contiguous from 0, no empty layers) by
//! touching only the dirty subgraph.
//!
//! # Phase 1 — push children below their highest parent
//!
//! A LIFO worklist seeded with the dirty set. Each node's correct index is
//! `max(parent index) + 1`, or 0 for a node without predecessors. When a
//! node moves, its successors are re-queued (their constraint may have
//! changed) and its parents are captured for phase 2. On acyclic input this
//! converges to the longest-path layering over the affected region.
//!
//! # Phase 2 — tighten parents against their lowest child
//!
//! Captured nodes are bucketed by current layer and processed from the
//! deepest bucket upward. A node with successors belongs at
//! `min(child index) − 1`; a move only ever *decreases* an index. A target
//! at or above the current index is left alone: phase 1 already placed the
//! node as low as its parents allow, and raising it again would pull roots
//! off layer 0. Moves cascade into the parents' buckets.
//!
//! Each phase-1 move is bounded by the longest path through the affected
//! region and each phase-2 move strictly decreases a finite non-negative
//! potential, so the pass terminates.
//!
//! Layers emptied by a move are compacted immediately (`move_node`); layers
//! emptied by node removal are swept at the end.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::store::GraphCore;

/// Restore the layering invariant for the given dirty node ids. Ids that no
/// longer exist (removed later in the same batch) are skipped.
pub(crate) fn update_layers(core: &mut GraphCore, dirty: &[String]) {
    let mut moves = 0usize;

    // ── Phase 1: down-propagation ────────────────────────────────────
    let mut stack: Vec<String> = dirty
        .iter()
        .filter(|id| core.nodes.contains_key(id.as_str()))
        .cloned()
        .collect();
    let mut phase2: BTreeSet<String> = stack.iter().cloned().collect();

    while let Some(id) = stack.pop() {
        if !core.nodes.contains_key(id.as_str()) {
            continue;
        }
        let Some(current) = core.layer_index_of(&id) else {
            continue;
        };
        let parents = core.pred_node_ids(&id);
        let correct = parents
            .iter()
            .filter_map(|p| core.layer_index_of(p))
            .max()
            .map(|deepest| deepest + 1)
            .unwrap_or(0);
        if correct != current {
            core.move_node(&id, correct);
            moves += 1;
            for succ in core.succ_node_ids(&id) {
                stack.push(succ);
            }
            for parent in parents {
                phase2.insert(parent);
            }
        }
    }

    // ── Phase 2: upward tightening ───────────────────────────────────
    let mut buckets: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
    for id in phase2 {
        if let Some(index) = core.layer_index_of(&id) {
            buckets.entry(index).or_default().insert(id);
        }
    }

    while let Some((&index, _)) = buckets.iter().next_back() {
        let Some(bucket) = buckets.remove(&index) else {
            break;
        };
        for id in bucket {
            let Some(current) = core.layer_index_of(&id) else {
                continue;
            };
            if current != index {
                // Already relocated by an earlier cascade.
                continue;
            }
            let children = core.succ_node_ids(&id);
            if children.is_empty() {
                continue;
            }
            let Some(lowest_child) = children
                .iter()
                .filter_map(|c| core.layer_index_of(c))
                .min()
            else {
                continue;
            };
            let correct = lowest_child.saturating_sub(1);
            if correct < current {
                core.move_node(&id, correct);
                moves += 1;
                for parent in core.pred_node_ids(&id) {
                    if let Some(pi) = core.layer_index_of(&parent) {
                        buckets.entry(pi).or_default().insert(parent);
                    }
                }
            }
        }
    }

    core.compact_layers();
    debug!(
        "relayer: {} dirty, {} moves, {} layers",
        dirty.len(),
        moves,
        core.layer_list.len()
    );
}
