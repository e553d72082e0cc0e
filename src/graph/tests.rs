//! Tests for the graph session store

use super::*;

fn addr(id: &str, kind: AddressKind) -> Address {
    Address::new(id, kind)
}

fn edge(source: &str, target: &str, count: u64, total_amount: f64) -> Edge {
    Edge {
        source: source.to_string(),
        target: target.to_string(),
        count,
        total_amount,
    }
}

/// Parts shaped like the normalizer's output: source then target per edge
fn parts(pairs: &[(&str, &str)]) -> (Vec<Address>, Vec<Edge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for (source, target) in pairs {
        nodes.push(addr(source, AddressKind::Normal));
        nodes.push(addr(target, AddressKind::Normal));
        edges.push(edge(source, target, 1, 1.0));
    }
    (nodes, edges)
}

fn batch(pairs: &[(&str, &str)]) -> NormalizedBatch {
    let (nodes, edges) = parts(pairs);
    NormalizedBatch::from_parts(nodes, edges).unwrap()
}

fn ids(session: &GraphSession) -> Vec<&str> {
    session.nodes().iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn test_replace_dedups_nodes_first_wins() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    let (mut nodes, edges) = parts(&[("a", "b"), ("a", "c")]);
    nodes[0].kind = AddressKind::Abnormal;
    nodes[2].kind = AddressKind::Normal;

    let report = session.replace(NormalizedBatch::from_parts(nodes, edges).unwrap());

    assert_eq!(ids(&session), vec!["a", "b", "c"]);
    assert_eq!(session.get("a").unwrap().kind, AddressKind::Abnormal);
    assert_eq!(session.edge_count(), 2);
    assert_eq!(report.mode, MergeMode::Replace);
    assert_eq!(report.added_nodes.len(), 3);
    assert_eq!(report.edges_appended, 2);
}

#[test]
fn test_replace_discards_previous_session() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b")]));
    session.expand_from_node(batch(&[("b", "c"), ("c", "d")]));
    assert_eq!(session.node_count(), 4);

    let next = batch(&[("x", "y")]);
    session.replace(next.clone());

    assert_eq!(ids(&session), vec!["x", "y"]);
    assert_eq!(session.edges(), next.edges());
    assert!(!session.contains("a"));
}

#[test]
fn test_replace_with_empty_batch_clears() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b")]));
    session.replace(NormalizedBatch::default());
    assert!(session.is_empty());
    assert_eq!(session.edge_count(), 0);
}

#[test]
fn test_expand_adds_only_new_nodes() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b")]));

    let report = session.expand_from_node(batch(&[("b", "c"), ("d", "b")]));

    assert_eq!(ids(&session), vec!["a", "b", "c", "d"]);
    let added: Vec<&str> = report.added_nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(added, vec!["c", "d"]);
    assert_eq!(report.edges_appended, 2);
    assert_eq!(session.edge_count(), 3);
}

#[test]
fn test_expand_keeps_first_kind() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    let (mut nodes, edges) = parts(&[("a", "b")]);
    nodes[0].kind = AddressKind::Abnormal;
    session.replace(NormalizedBatch::from_parts(nodes, edges).unwrap());

    let (mut nodes, edges) = parts(&[("a", "c")]);
    nodes[0].kind = AddressKind::Normal;
    session.expand_from_node(NormalizedBatch::from_parts(nodes, edges).unwrap());

    assert_eq!(session.get("a").unwrap().kind, AddressKind::Abnormal);
}

#[test]
fn test_expand_skips_edges_between_known_nodes() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b"), ("a", "c")]));

    // b -> c is between known nodes; c -> d introduces d
    let report = session.expand_from_node(batch(&[("b", "c"), ("c", "d")]));

    assert_eq!(report.edges_appended, 1);
    assert_eq!(report.edges_skipped, 1);
    assert_eq!(session.edges().last().unwrap(), &edge("c", "d", 1, 1.0));
}

#[test]
fn test_expand_keeps_edge_to_node_added_earlier_in_same_merge() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b")]));

    let report = session.expand_from_node(batch(&[("a", "n"), ("b", "n")]));

    assert_eq!(report.added_nodes.len(), 1);
    assert_eq!(report.edges_appended, 2);
}

#[test]
fn test_expand_without_new_nodes_is_noop() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b"), ("b", "c")]));
    let before = session.snapshot();

    let report = session.expand_from_node(batch(&[("a", "b"), ("c", "b")]));

    assert!(report.is_noop());
    assert_eq!(report.edges_skipped, 2);
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_no_dangling_edges_after_expand_sequence() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b")]));
    let steps: [&[(&str, &str)]; 4] = [
        &[("b", "c"), ("c", "a")],
        &[("c", "d"), ("d", "e"), ("a", "b")],
        &[("e", "a")],
        &[("f", "e"), ("e", "g"), ("g", "f")],
    ];
    for step in steps {
        session.expand_from_node(batch(step));
        assert!(session.dangling_edges().is_empty());
    }

    let mut seen = std::collections::HashSet::new();
    for node in session.nodes() {
        assert!(seen.insert(node.id.clone()), "duplicate node {}", node.id);
    }
    assert_eq!(session.node_count(), 7);
}

#[test]
fn test_append_log_keeps_parallel_edges() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b"), ("a", "b")]));
    assert_eq!(session.edge_count(), 2);
}

#[test]
fn test_merge_by_pair_sums_parallel_edges() {
    let mut session = GraphSession::new(EdgePolicy::MergeByPair);
    let (nodes, mut edges) = parts(&[("a", "b"), ("a", "b"), ("b", "a")]);
    edges[1] = edge("a", "b", 4, 2.5);

    let report = session.replace(NormalizedBatch::from_parts(nodes, edges).unwrap());

    assert_eq!(session.edge_count(), 2);
    assert_eq!(session.edges()[0], edge("a", "b", 5, 3.5));
    assert_eq!(session.edges()[1], edge("b", "a", 1, 1.0));
    assert_eq!(report.edges_merged, 1);

    let report = session.expand_from_node(batch(&[("a", "z"), ("a", "z")]));
    assert_eq!(report.edges_appended, 1);
    assert_eq!(report.edges_merged, 1);
    assert_eq!(session.edge_count(), 3);
    assert_eq!(session.edges()[2], edge("a", "z", 2, 2.0));
}

#[test]
fn test_dangling_batch_is_rejected_before_replace() {
    let mut session = GraphSession::new(EdgePolicy::MergeByPair);
    session.replace(batch(&[("a", "b")]));
    let before = session.snapshot();

    let nodes = vec![addr("a", AddressKind::Normal)];
    let result = NormalizedBatch::from_parts(nodes, vec![edge("a", "z", 1, 1.0)]);

    assert!(matches!(
        result,
        Err(crate::error::InvalidRecordError::DanglingEndpoint { row: 0, ref address }) if address == "z"
    ));
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_dangling_batch_is_rejected_before_expand() {
    let mut session = GraphSession::new(EdgePolicy::AppendLog);
    session.replace(batch(&[("a", "b")]));
    let before = session.snapshot();

    // c is new, so an unchecked expand would add it before reaching the edge
    let nodes = vec![addr("c", AddressKind::Normal)];
    let result = NormalizedBatch::from_parts(nodes, vec![edge("c", "zz", 1, 1.0)]);

    assert!(result.is_err());
    assert_eq!(session.snapshot(), before);
    assert!(!session.contains("c"));
}
