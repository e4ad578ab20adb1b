//! `strata-core` — persistent layered-DAG engine.
//!
//! A [`StrataGraph`] is an immutable directed-acyclic-graph value. Batched
//! mutations commit atomically into a new version that shares unchanged
//! structure with its predecessor, while two incremental algorithms keep the
//! graph honest:
//!
//! - **Layer assignment** — every node gets a non-negative layer index such
//!   that every edge points strictly downward, layers stay contiguous, and
//!   no layer is empty.
//! - **Hybrid cycle detection** — a per-edge reachability probe against the
//!   pre-batch layering, falling back to a full three-colour DFS for small
//!   graphs or large batches. A batch that would close a cycle is rejected
//!   with the offending cycle.
//!
//! # Modules
//!
//! - [`types`]    — node/edge/layer records, derived edge ids, `GraphSnapshotV1`
//! - [`changes`]  — `Mutator` / `ChangeLog` batch accumulation
//! - [`graph`]    — the persistent `StrataGraph` facade
//! - [`validate`] — snapshot validation and invariant auditing
//! - [`error`]    — `GraphError`, `ErrorCode`
//!
//! # Example
//!
//! ```
//! use strata_core::{EdgeDef, NodeDef, StrataGraph};
//!
//! let g = StrataGraph::new()
//!     .with_mutations(|m| {
//!         m.add_nodes(vec![NodeDef::new("a"), NodeDef::new("b"), NodeDef::new("c")])
//!         .add_edges(vec![EdgeDef::new("a", "b"), EdgeDef::new("b", "c")]);
//!     })
//!     .unwrap();
//!
//! assert_eq!(g.layer_of("c"), Some(2));
//! assert!(g.add_edge(EdgeDef::new("c", "a")).is_err());
//! ```

pub mod changes;
pub mod error;
pub mod graph;
pub mod types;
pub mod validate;

mod commit;
mod cycles;
mod layering;
mod store;

pub use changes::{ChangeLog, Mutator};
pub use error::{ErrorCode, GraphError};
pub use graph::StrataGraph;
pub use types::{AuditCode, Diagnostic, EdgeDef, GraphSnapshotV1, Layer, LayerId, NodeDef};

/// Parse and commit a JSON snapshot (see [`GraphSnapshotV1`]).
pub fn load_snapshot(json: &str) -> Result<StrataGraph, GraphError> {
    let snapshot: GraphSnapshotV1 = serde_json::from_str(json).map_err(|e| {
        GraphError::new(
            ErrorCode::InvalidSnapshot,
            format!("Failed to parse snapshot: {}", e),
        )
    })?;
    StrataGraph::from_snapshot(snapshot)
}
