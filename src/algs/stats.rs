//! Graph statistics: counts, fan-in/out, path length, compression.

use crate::error::MtError;
use crate::topology::graph::MtGraph;
use crate::topology::handle::NodeId;
use itertools::{Itertools, MinMaxResult};
use std::fmt;

/// Summary figures for one refinement graph.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GraphStats {
    pub node_count: u64,
    pub arc_count: u64,
    pub tile_count: u64,
    pub min_fan_out: u64,
    pub max_fan_out: u64,
    pub mean_fan_out: f64,
    pub min_fan_in: u64,
    pub max_fan_in: u64,
    pub mean_fan_in: f64,
    /// Arcs on the longest root-to-drain path.
    pub longest_path: u64,
    /// Tiles of the finest tessellation (labels of the drain's in-arcs).
    pub full_resolution_tiles: u64,
    /// Total tiles stored per tile actually present at full resolution; the
    /// overhead factor of the multi-resolution encoding.
    pub compression_ratio: f64,
}

fn spread(values: impl Iterator<Item = u64>) -> (u64, u64) {
    match values.minmax() {
        MinMaxResult::NoElements => (0, 0),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    }
}

/// Computes summary statistics over a populated graph.
///
/// Fan-in excludes the root and fan-out excludes the drain, so the forced
/// zeros of the end nodes do not mask the interior minimum.
pub fn graph_stats(graph: &MtGraph) -> Result<GraphStats, MtError> {
    let root = graph.root()?;
    let drain = graph.drain()?;
    let nodes = graph.node_count();

    let mut fan_out = Vec::with_capacity(nodes as usize);
    let mut fan_in = Vec::with_capacity(nodes as usize);
    for n in 1..=nodes {
        let node = NodeId::new(n)?;
        if node != drain {
            fan_out.push(graph.out_degree(node)?);
        }
        if node != root {
            fan_in.push(graph.in_degree(node)?);
        }
    }
    let (min_fan_out, max_fan_out) = spread(fan_out.iter().copied());
    let (min_fan_in, max_fan_in) = spread(fan_in.iter().copied());
    let mean_of = |v: &[u64]| {
        if v.is_empty() {
            0.0
        } else {
            v.iter().sum::<u64>() as f64 / v.len() as f64
        }
    };

    let longest_path = graph.node_depths()?[drain.index()];
    let full_resolution_tiles = graph.num_removed_tiles(drain)?;
    let compression_ratio = if full_resolution_tiles == 0 {
        0.0
    } else {
        graph.tile_count() as f64 / full_resolution_tiles as f64
    };

    Ok(GraphStats {
        node_count: nodes,
        arc_count: graph.arc_count(),
        tile_count: graph.tile_count(),
        min_fan_out,
        max_fan_out,
        mean_fan_out: mean_of(&fan_out),
        min_fan_in,
        max_fan_in,
        mean_fan_in: mean_of(&fan_in),
        longest_path,
        full_resolution_tiles,
        compression_ratio,
    })
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "nodes {}  arcs {}  tiles {}",
            self.node_count, self.arc_count, self.tile_count
        )?;
        writeln!(
            f,
            "fan-out {}..{} (mean {:.2})  fan-in {}..{} (mean {:.2})",
            self.min_fan_out,
            self.max_fan_out,
            self.mean_fan_out,
            self.min_fan_in,
            self.max_fan_in,
            self.mean_fan_in
        )?;
        write!(
            f,
            "longest path {} arcs  full resolution {} tiles  ratio {:.2}",
            self.longest_path, self.full_resolution_tiles, self.compression_ratio
        )
    }
}
