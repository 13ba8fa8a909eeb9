use anygraph::{
    Graph, MemoryBackend, NodeKey, SqliteBackend,
    algo::{bfs_successors, count_subgraph_monomorphisms, subgraph_monomorphisms},
};

fn cycle(graph: &Graph) {
    graph
        .nx()
        .add_edges_from([("A", "B"), ("B", "C"), ("C", "A")])
        .unwrap();
}

#[test]
fn test_bfs_successors_equal_across_backends() {
    for directed in [false, true] {
        let oracle = Graph::new(MemoryBackend::new(directed));
        let sqlite = Graph::new(SqliteBackend::open_in_memory(directed).unwrap());
        cycle(&oracle);
        cycle(&sqlite);
        let expected = bfs_successors(&oracle.nx(), "A").unwrap();
        assert_eq!(bfs_successors(&sqlite.nx(), "A").unwrap(), expected);
    }
}

#[test]
fn test_bfs_successors_directed_cycle() {
    let graph = Graph::new(MemoryBackend::directed());
    cycle(&graph);
    let tree = bfs_successors(&graph.nx(), "A").unwrap();
    assert_eq!(tree[&NodeKey::from("A")], vec![NodeKey::from("B")]);
    assert_eq!(tree[&NodeKey::from("B")], vec![NodeKey::from("C")]);
    assert!(!tree.contains_key(&NodeKey::from("C")));
}

#[test]
fn test_monomorphism_counts_equal_across_backends() {
    for (directed, expected) in [(false, 6), (true, 3)] {
        let oracle = Graph::new(MemoryBackend::new(directed));
        let sqlite = Graph::new(SqliteBackend::open_in_memory(directed).unwrap());
        cycle(&oracle);
        cycle(&sqlite);
        assert_eq!(
            count_subgraph_monomorphisms(&oracle.nx(), &oracle.nx()).unwrap(),
            expected
        );
        assert_eq!(
            subgraph_monomorphisms(&sqlite.nx(), &sqlite.nx()).unwrap(),
            subgraph_monomorphisms(&oracle.nx(), &oracle.nx()).unwrap()
        );
    }
}

#[test]
fn test_directed_path_pattern() {
    let host = Graph::new(MemoryBackend::directed());
    cycle(&host);
    let pattern = Graph::new(SqliteBackend::open_in_memory(true).unwrap());
    pattern.nx().add_edges_from([(1, 2), (2, 3)]).unwrap();
    let mappings = subgraph_monomorphisms(&host.nx(), &pattern.nx()).unwrap();
    assert_eq!(mappings.len(), 3);
    for mapping in mappings {
        let (a, b) = (&mapping[&NodeKey::Int(1)], &mapping[&NodeKey::Int(2)]);
        assert!(host.nx().has_edge(a.clone(), b.clone()).unwrap());
    }
}
