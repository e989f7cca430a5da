use multitess::prelude::*;

fn tid(raw: u64) -> TileId {
    TileId::new(raw).unwrap()
}

/// Unit quad, 2 coarse triangles refined into a 4-triangle fan around the
/// center, as an ASCII stream.
const QUAD: &str = "\
multitess 1 ascii
vertexdim 2
tiledim 2
vertices 5
tiles 6
nodes 3
arcs 2
body
0 0
1 0
1 1
0 1
0.5 0.5
1 2 3
1 3 4
1 2 5
2 3 5
3 4 5
4 1 5
1 2
1 2 0
2 3
3 4 5 6 0
";

#[test]
fn extract_both_ends_after_load() {
    let mesh = read_mesh(QUAD.as_bytes()).unwrap();

    let coarse = extract_coarsest(&mesh.tileset, &mesh.graph).unwrap();
    assert_eq!(coarse.tiles, vec![tid(1), tid(2)]);
    assert_eq!(coarse.boundary.len(), 4);

    let fine = extract_full(&mesh.tileset, &mesh.graph).unwrap();
    assert_eq!(fine.tiles, vec![tid(3), tid(4), tid(5), tid(6)]);
    assert_eq!(fine.boundary.len(), 4);
    for t in &fine.tiles {
        let matched = fine.neighbors[t].iter().filter(|n| n.is_some()).count();
        assert_eq!(matched, 2);
    }
}

#[test]
fn error_threshold_picks_the_level() {
    let mesh = read_mesh(QUAD.as_bytes()).unwrap();
    let err = VecAttribute::from_values([1.0, 0.1, 0.0]);

    let coarse = extract_at_error(&mesh.tileset, &mesh.graph, &err, 0.5).unwrap();
    assert_eq!(coarse.tiles, vec![tid(1), tid(2)]);

    let fine = extract_at_error(&mesh.tileset, &mesh.graph, &err, 0.01).unwrap();
    assert_eq!(fine.tiles, vec![tid(3), tid(4), tid(5), tid(6)]);
}

#[test]
fn stats_summarize_the_loaded_graph() {
    let mesh = read_mesh(QUAD.as_bytes()).unwrap();
    let stats = graph_stats(&mesh.graph).unwrap();

    assert_eq!(stats.node_count, 3);
    assert_eq!(stats.arc_count, 2);
    assert_eq!(stats.tile_count, 6);
    assert_eq!(stats.longest_path, 2);
    assert_eq!(stats.full_resolution_tiles, 4);
    assert!((stats.compression_ratio - 1.5).abs() < 1e-12);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["node_count"], 3);
    assert_eq!(json["longest_path"], 2);
}
