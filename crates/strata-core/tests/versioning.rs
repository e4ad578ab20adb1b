//! Version-chain behaviour: structural sharing, immutability, atomicity.

use std::collections::BTreeMap;
use strata_core::{EdgeDef, ErrorCode, NodeDef, StrataGraph};

fn node(id: &str) -> NodeDef {
    NodeDef::new(id)
}

fn edge(src: &str, tgt: &str) -> EdgeDef {
    EdgeDef::new(src, tgt)
}

fn layer_snapshot(g: &StrataGraph) -> BTreeMap<String, usize> {
    g.node_ids()
        .into_iter()
        .map(|id| {
            let layer = g.layer_of(&id).expect("layered");
            (id, layer)
        })
        .collect()
}

#[test]
fn prior_points_at_previous_version() {
    let g1 = StrataGraph::new().add_node(node("a")).unwrap();
    let g2 = g1.add_node(node("b")).unwrap();

    let prior = g2.prior().expect("prior");
    assert_eq!(prior.node_ids(), g1.node_ids());
    assert_eq!(layer_snapshot(prior), layer_snapshot(&g1));
}

#[test]
fn version_chain_walks_back_to_the_empty_graph() {
    let g = StrataGraph::new()
        .add_node(node("a"))
        .unwrap()
        .add_node(node("b"))
        .unwrap()
        .add_edge(edge("a", "b"))
        .unwrap();

    let mut depth = 0;
    let mut cursor = Some(&g);
    while let Some(version) = cursor {
        depth += 1;
        cursor = version.prior();
    }
    // g ← edge-commit ← node-commit ← node-commit ← empty... the empty
    // origin has no prior of its own.
    assert_eq!(depth, 4);
    assert!(g.prior().unwrap().prior().unwrap().prior().unwrap().is_empty());
}

#[test]
fn observations_of_prior_survive_further_commits() {
    let g1 = StrataGraph::new()
        .with_mutations(|m| {
            m.add_nodes(vec![node("a"), node("b"), node("c")])
                .add_edges(vec![edge("a", "b"), edge("b", "c")]);
        })
        .unwrap();
    let before = layer_snapshot(&g1);
    let edges_before = g1.num_edges();

    // Heavy follow-up mutation.
    let _g2 = g1
        .with_mutations(|m| {
            m.remove_node("b").add_node(node("d")).add_edge(edge("a", "d"));
        })
        .unwrap();

    assert_eq!(layer_snapshot(&g1), before);
    assert_eq!(g1.num_edges(), edges_before);
    assert_eq!(g1.succ_nodes("b"), vec!["c".to_string()]);
}

#[test]
fn rejected_batch_produces_no_version() {
    let g = StrataGraph::new()
        .with_mutations(|m| {
            m.add_nodes(vec![node("a"), node("b")]).add_edge(edge("a", "b"));
        })
        .unwrap();
    let before = layer_snapshot(&g);

    // The batch does some legitimate work before closing the cycle; all of
    // it must be discarded.
    let err = g
        .with_mutations(|m| {
            m.add_node(node("c"))
                .add_edge(edge("b", "c"))
                .add_edge(edge("c", "a"));
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CycleDetected);

    assert_eq!(layer_snapshot(&g), before);
    assert!(!g.has_node("c"));
    assert_eq!(g.num_edges(), 1);
}

#[test]
fn unknown_endpoint_is_atomic_too() {
    let g = StrataGraph::new().add_node(node("a")).unwrap();
    let err = g
        .with_mutations(|m| {
            m.add_node(node("b")).add_edge(edge("b", "ghost"));
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownEndpoint);
    assert!(!g.has_node("b"));
    assert_eq!(g.num_nodes(), 1);
}

#[test]
fn node_round_trip_is_observationally_identity() {
    let g = StrataGraph::new()
        .with_mutations(|m| {
            m.add_nodes(vec![node("a"), node("b")]).add_edge(edge("a", "b"));
        })
        .unwrap();
    let before = layer_snapshot(&g);

    let round = g.add_node(node("tmp")).unwrap().remove_node("tmp").unwrap();
    assert_eq!(layer_snapshot(&round), before);
    assert_eq!(round.node_ids(), g.node_ids());
    assert_eq!(round.num_layers(), g.num_layers());
}

#[test]
fn edge_round_trip_is_observationally_identity() {
    let g = StrataGraph::new()
        .with_mutations(|m| {
            m.add_nodes(vec![node("a"), node("b"), node("c")])
                .add_edge(edge("a", "b"));
        })
        .unwrap();
    let before = layer_snapshot(&g);

    let round = g.add_edge(edge("b", "c")).unwrap().remove_edge("b-c").unwrap();
    assert_eq!(layer_snapshot(&round), before);
    assert_eq!(round.num_edges(), g.num_edges());
}

#[test]
fn removing_a_node_twice_is_a_noop_the_second_time() {
    let g = StrataGraph::new()
        .with_mutations(|m| {
            m.add_nodes(vec![node("a"), node("b")]).add_edge(edge("a", "b"));
        })
        .unwrap();
    let once = g.remove_node("b").unwrap();
    let twice = once.remove_node("b").unwrap();
    assert_eq!(layer_snapshot(&twice), layer_snapshot(&once));
    assert_eq!(twice.num_edges(), 0);
}
