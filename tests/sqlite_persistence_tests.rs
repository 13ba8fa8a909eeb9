use std::collections::BTreeSet;

use anygraph::{
    BackendKind, Graph, GraphConfig, GraphError, NodeKey, SqliteBackend, SqliteConfig, open_graph,
};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_reopen_sees_same_graph() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let expected = {
        let graph = Graph::new(SqliteBackend::open(&path, false).unwrap());
        let nx = graph.nx();
        nx.add_node_with("A", [("color", "red")]).unwrap();
        nx.add_edge_with("A", "B", [("w", 5)]).unwrap();
        nx.add_edge("B", "C").unwrap();
        nx.adj().unwrap()
    };

    let reopened = Graph::new(SqliteBackend::open(&path, false).unwrap());
    let nx = reopened.nx();
    assert_eq!(nx.adj().unwrap(), expected);
    assert_eq!(nx.node("A").unwrap()["color"], json!("red"));
    assert_eq!(nx.get(("B", "A")).unwrap()["w"], json!(5));
    assert_eq!(nx.number_of_edges().unwrap(), 2);
}

#[test]
fn test_reopen_with_opposite_directedness_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("directed.db");
    {
        let graph = Graph::new(SqliteBackend::open(&path, true).unwrap());
        graph.nx().add_edge("A", "B").unwrap();
    }
    let err = SqliteBackend::open(&path, false).err().expect("mismatch");
    assert!(matches!(err, GraphError::BackendUnavailable(_)));
    assert!(SqliteBackend::open(&path, true).is_ok());
}

#[test]
fn test_open_unreachable_path_is_unavailable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("graph.db");
    let err = SqliteBackend::open(&path, false).err().expect("bad path");
    assert!(err.is_unavailable());
}

#[test]
fn test_two_connections_see_each_others_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let first = Graph::new(SqliteBackend::open(&path, false).unwrap());
    let second = Graph::new(SqliteBackend::open(&path, false).unwrap());
    first.nx().add_node_with("A", [("k", 1)]).unwrap();
    second.nx().add_node_with("A", [("other", 2)]).unwrap();
    let merged = first.nx().node("A").unwrap();
    assert_eq!(merged["k"], json!(1));
    assert_eq!(merged["other"], json!(2));
}

#[test]
fn test_concurrent_writers_do_not_lose_merges() {
    const WRITERS: usize = 4;
    const MERGES: usize = 50;

    let dir = tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    // Create the schema once so writers only race on data.
    drop(SqliteBackend::open(&path, false).unwrap());

    let workers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let path = path.clone();
            std::thread::spawn(move || {
                let graph = Graph::new(SqliteBackend::open(&path, false).expect("writer"));
                let nx = graph.nx();
                for merge in 0..MERGES {
                    let key = format!("w{writer}-{merge}");
                    nx.add_node_with("shared", [(key.clone(), merge)])
                        .expect("node merge");
                    nx.add_edge_with("shared", "peer", [(key, merge)])
                        .expect("edge merge");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("writer thread");
    }

    let graph = Graph::new(SqliteBackend::open(&path, false).unwrap());
    let nx = graph.nx();
    assert_eq!(nx.node("shared").unwrap().len(), WRITERS * MERGES);
    assert_eq!(nx.get(("peer", "shared")).unwrap().len(), WRITERS * MERGES);
    assert_eq!(nx.number_of_edges().unwrap(), 1);
}

#[test]
fn test_enumeration_larger_than_page_size() {
    let cfg = SqliteConfig {
        page_size: 3,
        ..SqliteConfig::default()
    };
    let backend = SqliteBackend::open_in_memory_with_config(false, &cfg).unwrap();
    assert_eq!(backend.page_size(), 3);
    let graph = Graph::new(backend);
    let nx = graph.nx();
    for idx in 0..20i64 {
        nx.add_edge(idx, (idx + 1) % 20).unwrap();
        nx.add_edge("hub", idx).unwrap();
    }

    let nodes: Vec<NodeKey> = nx.nodes().unwrap().collect::<Result<_, _>>().unwrap();
    let unique: BTreeSet<_> = nodes.iter().cloned().collect();
    assert_eq!(nodes.len(), 21);
    assert_eq!(unique.len(), 21);

    let edges: Vec<_> = nx.edges().unwrap().collect::<Result<_, _>>().unwrap();
    let unique_edges: BTreeSet<_> = edges.iter().cloned().collect();
    assert_eq!(edges.len(), 40);
    assert_eq!(unique_edges.len(), 40);

    let hub: BTreeSet<NodeKey> = nx.neighbors("hub").unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(hub.len(), 20);
    assert_eq!(nx.degree(0).unwrap(), 3);
}

#[test]
fn test_open_graph_from_config_file() {
    let dir = tempdir().unwrap();
    let cfg = GraphConfig::new(BackendKind::Sqlite)
        .sqlite_path(dir.path().join("cfg.db"))
        .directed(true);
    {
        let graph = open_graph(&cfg).unwrap();
        graph.nx().add_edge("A", "B").unwrap();
    }
    let graph = open_graph(&cfg).unwrap();
    assert!(graph.is_directed());
    assert!(graph.nx().has_edge("A", "B").unwrap());
    assert!(!graph.nx().has_edge("B", "A").unwrap());
}

#[test]
fn test_schema_version_is_current() {
    let backend = SqliteBackend::open_in_memory(false).unwrap();
    assert_eq!(
        backend.schema_version().unwrap(),
        anygraph::schema::SCHEMA_VERSION
    );
}
