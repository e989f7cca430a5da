//! Tessellation extraction: walking the DAG to a chosen resolution.
//!
//! A resolution is a set `S` of nodes that contains the root and is closed
//! under ancestry (every parent of a member is a member). The tessellation
//! at `S` is the set of tiles created by a node in `S` and removed by a node
//! outside it — exactly the labels of the arcs crossing the cut. Walking the
//! whole DAG once and stitching the selected tiles through a
//! [`FacetTable`](crate::topology::facet::FacetTable) yields an
//! adjacency-complete output without ever comparing tiles pairwise.

use crate::data::attribute::Attribute;
use crate::data::tileset::TileSet;
use crate::error::MtError;
use crate::topology::facet::FacetTable;
use crate::topology::graph::MtGraph;
use crate::topology::handle::{ArcId, NodeId, TileId};
use hashbrown::HashMap;

/// An extracted tessellation with reconstructed tile adjacency.
#[derive(Debug, Clone)]
pub struct Tessellation {
    /// Active tiles, in increasing index order.
    pub tiles: Vec<TileId>,
    /// Per-tile neighbors: slot `i` pairs the facet excluding local vertex
    /// `i` with `(neighbor tile, neighbor's excluded position)`.
    pub neighbors: HashMap<TileId, Box<[Option<(TileId, usize)>]>>,
    /// Unmatched facets: the boundary of the extracted mesh.
    pub boundary: Vec<(TileId, usize)>,
}

/// Extracts the tessellation for a node predicate.
///
/// The predicate marks nodes considered too coarse; the root is always
/// selected and the marked set is closed under ancestry before the cut is
/// taken, so any predicate yields a consistent tessellation. The drain is
/// never selected (selecting it would remove every tile).
pub fn extract_with<F>(
    tiles: &TileSet,
    graph: &MtGraph,
    mut select: F,
) -> Result<Tessellation, MtError>
where
    F: FnMut(NodeId) -> Result<bool, MtError>,
{
    let root = graph.root()?;
    let drain = graph.drain()?;

    let slots = graph.node_count() as usize + 1;
    let mut in_set = vec![false; slots];
    in_set[root.index()] = true;
    for n in 1..=graph.node_count() {
        let node = NodeId::new(n)?;
        if node == drain {
            continue;
        }
        if select(node)? {
            in_set[node.index()] = true;
        }
    }

    // Ancestor closure: pull in every parent of a selected node.
    let mut stack: Vec<NodeId> = (1..=graph.node_count())
        .filter(|&n| in_set[n as usize])
        .map(NodeId::new)
        .collect::<Result<_, _>>()?;
    while let Some(node) = stack.pop() {
        for a in graph.in_arcs(node)? {
            let parent = graph.arc_source(a)?;
            if !in_set[parent.index()] {
                in_set[parent.index()] = true;
                stack.push(parent);
            }
        }
    }

    // Active tiles label exactly the arcs crossing the cut.
    let mut active: Vec<TileId> = Vec::new();
    for a in 1..=graph.arc_count() {
        let arc = ArcId::new(a)?;
        let source = graph.arc_source(arc)?;
        let dest = graph.arc_dest(arc)?;
        if in_set[source.index()] && !in_set[dest.index()] {
            active.extend(graph.arc_tiles(arc)?);
        }
    }
    active.sort_unstable();

    stitch_adjacency(tiles, active)
}

/// Pairs up the shared facets of `active` tiles and collects the boundary.
fn stitch_adjacency(tiles: &TileSet, active: Vec<TileId>) -> Result<Tessellation, MtError> {
    let facets_per_tile = tiles.verts_per_tile();
    let bucket_count = (active.len() * facets_per_tile).max(16);
    let mut table = FacetTable::new(bucket_count)?;

    let mut neighbors: HashMap<TileId, Box<[Option<(TileId, usize)>]>> =
        HashMap::with_capacity(active.len());
    for &t in &active {
        neighbors.insert(t, vec![None; facets_per_tile].into_boxed_slice());
    }

    for &t in &active {
        for omit in 0..facets_per_tile {
            match table.get(tiles, t, omit)? {
                Some((other, other_omit)) => {
                    if let Some(slots) = neighbors.get_mut(&t) {
                        slots[omit] = Some((other, other_omit));
                    }
                    if let Some(slots) = neighbors.get_mut(&other) {
                        slots[other_omit] = Some((t, omit));
                    }
                }
                None => table.put(tiles, t, omit)?,
            }
        }
    }

    let mut boundary = Vec::with_capacity(table.len());
    while let Some(rec) = table.pop() {
        boundary.push(rec);
    }
    log::debug!(
        "extracted {} tiles, {} boundary facets",
        active.len(),
        boundary.len()
    );

    Ok(Tessellation {
        tiles: active,
        neighbors,
        boundary,
    })
}

/// The coarsest tessellation: only the root is selected.
pub fn extract_coarsest(tiles: &TileSet, graph: &MtGraph) -> Result<Tessellation, MtError> {
    extract_with(tiles, graph, |_| Ok(false))
}

/// The finest tessellation: every node but the drain is selected.
pub fn extract_full(tiles: &TileSet, graph: &MtGraph) -> Result<Tessellation, MtError> {
    extract_with(tiles, graph, |_| Ok(true))
}

/// Extracts at a uniform error threshold: a node stays selected (too
/// coarse) while its error exceeds `threshold`, so every extracted tile has
/// error at most `threshold` wherever the graph provides it.
///
/// `error` is a per-node attribute, typically the maximum error bound of
/// the tiles a node creates.
pub fn extract_at_error<A: Attribute>(
    tiles: &TileSet,
    graph: &MtGraph,
    error: &A,
    threshold: f64,
) -> Result<Tessellation, MtError> {
    extract_with(tiles, graph, |n| Ok(error.value_at(n.get())? > threshold))
}
