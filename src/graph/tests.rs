use super::*;

#[test]
fn test_empty_graph() {
    let g = Graph::new(false);
    assert_eq!(g.num_nodes(), 0);
    assert_eq!(g.num_edges(), 0);
    assert!(!g.is_directed());
}

#[test]
fn test_from_edges_empty() {
    let g = Graph::from_edges(&[], false);
    assert_eq!(g.num_nodes(), 0);
    assert_eq!(g.nodes().count(), 0);
}

#[test]
fn test_undirected_neighbors_are_symmetric() {
    let g = Graph::from_edges(&[(0, 1), (1, 2)], false);
    assert_eq!(g.neighbors(0), &[1]);
    assert_eq!(g.neighbors(1), &[0, 2]);
    assert_eq!(g.neighbors(2), &[1]);
    assert_eq!(g.num_edges(), 2);
}

#[test]
fn test_directed_neighbors() {
    let g = Graph::from_edges(&[(0, 1), (1, 2)], true);
    assert_eq!(g.neighbors(0), &[1]);
    assert_eq!(g.neighbors(2), &[] as &[NodeId]);
    assert!(g.has_edge(0, 1));
    assert!(!g.has_edge(1, 0));
    assert_eq!(g.num_edges(), 2);
}

#[test]
fn test_duplicate_edges_deduplicated() {
    let g = Graph::from_edges(&[(0, 1), (1, 0), (0, 1)], false);
    assert_eq!(g.neighbors(0), &[1]);
    assert_eq!(g.num_edges(), 1);
}

#[test]
fn test_self_loop_counted_once() {
    let g = Graph::from_edges(&[(0, 0), (0, 1)], false);
    assert_eq!(g.neighbors(0), &[0, 1]);
    assert_eq!(g.num_edges(), 2);
}

#[test]
fn test_with_nodes_keeps_isolated_nodes() {
    let g = Graph::with_nodes(5, &[(0, 1), (1, 2)], false);
    assert_eq!(g.num_nodes(), 5);
    assert_eq!(g.degree(3), 0);
    assert_eq!(g.degree(4), 0);
    assert_eq!(g.nodes().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_with_nodes_grows_for_larger_ids() {
    let g = Graph::with_nodes(2, &[(0, 6)], false);
    assert_eq!(g.num_nodes(), 7);
    assert!(g.has_edge(6, 0));
}

#[test]
fn test_out_of_range_neighbors_empty() {
    let g = Graph::from_edges(&[(0, 1)], false);
    assert!(g.neighbors(42).is_empty());
    assert_eq!(g.degree(42), 0);
}
