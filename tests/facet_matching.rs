use multitess::prelude::*;
use proptest::prelude::*;

fn vid(raw: u64) -> VertexId {
    VertexId::new(raw).unwrap()
}

fn tid(raw: u64) -> TileId {
    TileId::new(raw).unwrap()
}

/// A bipyramid over an `n`-gon ring: a closed 2-manifold with `2n` triangles
/// and `3n` interior edges.
fn bipyramid(n: u64) -> TileSet {
    let mut ts = TileSet::new(3, 2).unwrap();
    ts.set_vertex_count(n + 2).unwrap();
    ts.set_tile_count(2 * n).unwrap();

    ts.set_vertex(vid(1), &[0.0, 0.0, 1.0]).unwrap();
    ts.set_vertex(vid(2), &[0.0, 0.0, -1.0]).unwrap();
    for i in 0..n {
        let theta = std::f64::consts::TAU * i as f64 / n as f64;
        ts.set_vertex(vid(3 + i), &[theta.cos(), theta.sin(), 0.0])
            .unwrap();
    }

    for i in 0..n {
        let a = vid(3 + i);
        let b = vid(3 + (i + 1) % n);
        ts.set_tile(tid(1 + i), &[vid(1), a, b]).unwrap();
        ts.set_tile(tid(1 + n + i), &[vid(2), b, a]).unwrap();
    }
    ts
}

/// Runs the pairwise get-else-put protocol over the given tiles and returns
/// the number of matched facet pairs.
fn pair_facets(ts: &TileSet, tiles: &[TileId], table: &mut FacetTable) -> usize {
    let mut matched = 0;
    for &t in tiles {
        for omit in 0..ts.verts_per_tile() {
            match table.get(ts, t, omit).unwrap() {
                Some(_) => matched += 1,
                None => table.put(ts, t, omit).unwrap(),
            }
        }
    }
    matched
}

#[test]
fn closed_surface_pairs_every_facet() {
    let n = 6;
    let ts = bipyramid(n);
    let tiles: Vec<_> = (1..=2 * n).map(tid).collect();
    let mut table = FacetTable::new(16).unwrap();
    let matched = pair_facets(&ts, &tiles, &mut table);
    assert_eq!(matched as u64, 3 * n);
    assert!(table.is_empty());
    assert_eq!(table.pop(), None);
}

#[test]
fn open_surface_leaves_its_boundary() {
    let n = 6;
    let ts = bipyramid(n);
    // Only the top fan: the ring edges have no partner.
    let tiles: Vec<_> = (1..=n).map(tid).collect();
    let mut table = FacetTable::new(16).unwrap();
    let matched = pair_facets(&ts, &tiles, &mut table);
    assert_eq!(matched as u64, n); // the spoke edges
    assert_eq!(table.len() as u64, n);

    let mut boundary = Vec::new();
    while let Some((t, omit)) = table.pop() {
        // A ring edge is the facet excluding the apex, local position 0.
        assert_eq!(omit, 0);
        boundary.push(t);
    }
    boundary.sort_unstable();
    assert_eq!(boundary, tiles);
}

/// Distinct 4-vertex facets can collide on all three hints; the membership
/// cross-check must tell them apart.
#[test]
fn colliding_hints_do_not_match_distinct_facets() {
    let mut ts = TileSet::new(4, 4).unwrap();
    ts.set_vertex_count(9).unwrap();
    ts.set_tile_count(3).unwrap();
    // {1,4,5,8} and {1,3,6,8} share sum 18, min 1, max 8.
    ts.set_tile(tid(1), &[vid(1), vid(4), vid(5), vid(8), vid(2)])
        .unwrap();
    ts.set_tile(tid(2), &[vid(1), vid(3), vid(6), vid(8), vid(2)])
        .unwrap();
    ts.set_tile(tid(3), &[vid(1), vid(4), vid(5), vid(8), vid(9)])
        .unwrap();

    let mut table = FacetTable::new(8).unwrap();
    table.put(&ts, tid(1), 4).unwrap();
    assert_eq!(table.get(&ts, tid(2), 4).unwrap(), None);
    assert_eq!(table.len(), 1);
    // The genuinely shared facet still pairs.
    assert_eq!(table.get(&ts, tid(3), 4).unwrap(), Some((tid(1), 4)));
    assert!(table.is_empty());
}

proptest! {
    /// Pairing a closed surface is order-independent and always drains the
    /// table, even when the bucket count forces long chains.
    #[test]
    fn closed_surface_drains_in_any_order(
        n in 3u64..16,
        seed in any::<u64>(),
        buckets in 1usize..32,
    ) {
        let ts = bipyramid(n);
        let mut tiles: Vec<_> = (1..=2 * n).map(tid).collect();
        // Cheap deterministic shuffle.
        let len = tiles.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_mul(31).wrapping_add(i * 17) % len;
            tiles.swap(i, j);
        }

        let mut table = FacetTable::new(buckets).unwrap();
        let matched = pair_facets(&ts, &tiles, &mut table);
        prop_assert_eq!(matched as u64, 3 * n);
        prop_assert!(table.is_empty());
    }
}
