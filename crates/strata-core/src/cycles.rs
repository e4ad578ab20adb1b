//! Hybrid cycle detection.
//!
//! Every batch is checked for cycles *after* its structural edits are
//! applied but *before* the layer updater runs, so all layer data seen here
//! is pre-batch (fresh nodes sit at layer 0, which is well-defined at this
//! point).
//!
//! Two strategies:
//!
//! - **Full detection** — three-colour DFS over the whole successor
//!   relation. O(N+E), cheap constant.
//! - **Incremental detection** — per added edge u→v, a BFS reachability
//!   probe. An edge with `layer(u) < layer(v)` respects the prior (still
//!   valid) topological order and cannot itself close a cycle, so it is
//!   skipped; any cycle introduced by the batch must contain at least one
//!   non-descending added edge, and the probe for that edge walks the fully
//!   patched adjacency, so combinations of added edges are caught.
//!
//! The mode is picked per batch: full when the graph is small (`N < 20`) or
//! the change ratio is large (`C/N > 0.2`), incremental otherwise.
//!
//! The returned cycle is an ordered list of node ids whose first and last
//! elements coincide, in edge-traversal order.

use log::debug;
use std::collections::{HashMap, VecDeque};

use crate::changes::ChangeLog;
use crate::store::GraphCore;

/// Minimum node count for the incremental mode to pay off.
const FULL_SCAN_NODE_FLOOR: usize = 20;
/// Change ratio above which the incremental candidate set is too large.
const FULL_SCAN_CHANGE_RATIO: f64 = 0.2;

/// Check a freshly patched core for cycles. Returns the first cycle found.
pub(crate) fn detect(core: &GraphCore, changes: &ChangeLog) -> Option<Vec<String>> {
    let node_count = core.nodes.len();
    if node_count == 0 {
        return None;
    }
    let change_count = changes.added_nodes.len() + changes.added_edges.len();
    let ratio = change_count as f64 / node_count as f64;
    let full = node_count < FULL_SCAN_NODE_FLOOR || ratio > FULL_SCAN_CHANGE_RATIO;
    debug!(
        "cycle check: {} nodes, {} additions (ratio {:.3}), mode={}",
        node_count,
        change_count,
        ratio,
        if full { "full" } else { "incremental" }
    );
    if full {
        full_scan(core)
    } else {
        incremental(core, changes)
    }
}

// ── Full detection ───────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Gray,
    Black,
}

/// Three-colour DFS from every white node. A gray→gray edge is a back edge;
/// the cycle is reconstructed by walking DFS parents from the edge's source
/// (`end`) up to its target (`start`).
pub(crate) fn full_scan(core: &GraphCore) -> Option<Vec<String>> {
    let mut colour: HashMap<String, Colour> = HashMap::with_capacity(core.nodes.len());
    let mut parent: HashMap<String, String> = HashMap::new();

    for root in core.nodes.keys() {
        if colour.get(root.as_str()).copied().unwrap_or(Colour::White) != Colour::White {
            continue;
        }
        colour.insert(root.clone(), Colour::Gray);
        // Frame: (node, successor list, cursor into it).
        let mut stack: Vec<(String, Vec<String>, usize)> =
            vec![(root.clone(), core.succ_node_ids(root), 0)];

        loop {
            // Advance the top frame's cursor, releasing the stack borrow
            // before any push or pop.
            let step = match stack.last_mut() {
                Some(frame) if frame.2 < frame.1.len() => {
                    let next = frame.1[frame.2].clone();
                    frame.2 += 1;
                    Some((frame.0.clone(), next))
                }
                Some(_) => None,
                None => break,
            };
            match step {
                Some((current, next)) => {
                    match colour.get(next.as_str()).copied().unwrap_or(Colour::White) {
                        Colour::White => {
                            parent.insert(next.clone(), current);
                            colour.insert(next.clone(), Colour::Gray);
                            let succs = core.succ_node_ids(&next);
                            stack.push((next, succs, 0));
                        }
                        Colour::Gray => {
                            return Some(reconstruct(&current, &next, &parent));
                        }
                        Colour::Black => {}
                    }
                }
                None => {
                    if let Some((done, _, _)) = stack.pop() {
                        colour.insert(done, Colour::Black);
                    }
                }
            }
        }
    }
    None
}

/// Walk parents from `end` back to `start` and close the loop, yielding
/// `[start, …, end, start]` in traversal order.
fn reconstruct(end: &str, start: &str, parent: &HashMap<String, String>) -> Vec<String> {
    let mut path = vec![end.to_string()];
    let mut cursor = end;
    while cursor != start {
        match parent.get(cursor) {
            Some(prev) => {
                path.push(prev.clone());
                cursor = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path.push(start.to_string());
    path
}

// ── Incremental detection ────────────────────────────────────────────

/// Probe each added edge still present in the patched core. Sound only
/// relative to a valid pre-batch layering, which the commit ordering
/// guarantees.
fn incremental(core: &GraphCore, changes: &ChangeLog) -> Option<Vec<String>> {
    for def in &changes.added_edges {
        let edge_id = def.edge_id();
        if !core.edges.contains_key(&edge_id) {
            // Added then removed within the same batch.
            continue;
        }
        let (source, target) = (&def.source, &def.target);
        if let (Some(ls), Some(lt)) =
            (core.layer_index_of(source), core.layer_index_of(target))
        {
            if ls < lt {
                continue;
            }
        }
        if let Some(cycle) = probe(core, target, source) {
            return Some(cycle);
        }
    }
    None
}

/// BFS along successors from `from`, looking for `to`. On a hit the cycle is
/// the BFS path `from → … → to` closed by the probed edge `to → from`,
/// rendered as `[from, …, to, from]`.
fn probe(core: &GraphCore, from: &str, to: &str) -> Option<Vec<String>> {
    if from == to {
        return Some(vec![from.to_string(), from.to_string()]);
    }
    let mut parent: HashMap<String, String> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    parent.insert(from.to_string(), from.to_string());
    queue.push_back(from.to_string());

    while let Some(current) = queue.pop_front() {
        for next in core.succ_node_ids(&current) {
            if parent.contains_key(&next) {
                continue;
            }
            parent.insert(next.clone(), current.clone());
            if next == to {
                let mut path = vec![next];
                let mut cursor = path[0].clone();
                while cursor != from {
                    match parent.get(&cursor) {
                        Some(prev) => {
                            path.push(prev.clone());
                            cursor = prev.clone();
                        }
                        None => break,
                    }
                }
                path.reverse();
                path.push(from.to_string());
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}
