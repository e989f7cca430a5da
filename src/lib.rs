//! # multitess
//!
//! multitess represents one spatial object (a surface or volume mesh) at
//! many levels of detail as a single compact structure: a directed acyclic
//! graph of refinement/simplification steps layered over shared arrays of
//! vertices and simplicial tiles. Consumers traverse the DAG to extract a
//! consistent tessellation at an arbitrary resolution without duplicating
//! geometry per level.
//!
//! ## Structure
//! - [`data::tileset::TileSet`] owns vertex coordinates and tile
//!   connectivity, shared by every resolution.
//! - [`topology::graph::MtGraph`] is the DAG itself: nodes, arcs labelled
//!   with contiguous tile ranges, and the tile-to-arc backreference, all
//!   encoded as parallel arrays addressed by 1-based handles (0 is the
//!   universal null sentinel).
//! - [`topology::facet::FacetTable`] pairs up tiles sharing a facet while
//!   an extraction walks the DAG, reconstructing adjacency incrementally.
//! - [`io`] reads and writes the whole structure in an ASCII or a binary
//!   encoding behind a shared keyword header.
//! - [`algs`] provides extraction at a chosen resolution and summary
//!   statistics.
//!
//! Everything is single-threaded and synchronous; population is append-only
//! behind up-front capacity calls, and there is no entity deletion or graph
//! restructuring after construction.
//!
//! ## Example
//! ```rust
//! use multitess::prelude::*;
//!
//! # fn main() -> Result<(), MtError> {
//! let mut tiles = TileSet::new(2, 2)?;
//! tiles.set_vertex_count(3)?;
//! tiles.set_tile_count(1)?;
//! tiles.set_vertex(VertexId::new(1)?, &[0.0, 0.0])?;
//! tiles.set_vertex(VertexId::new(2)?, &[1.0, 0.0])?;
//! tiles.set_vertex(VertexId::new(3)?, &[0.0, 1.0])?;
//! tiles.set_tile(TileId::new(1)?, &[VertexId::new(1)?, VertexId::new(2)?, VertexId::new(3)?])?;
//!
//! let mut graph = MtGraph::new();
//! graph.set_node_count(2)?;
//! graph.set_arc_count(1)?;
//! graph.set_tile_count(1)?;
//! graph.add_arc(ArcId::new(1)?, NodeId::new(1)?, NodeId::new(2)?)?;
//! graph.add_tile_label(TileId::new(1)?, ArcId::new(1)?)?;
//! graph.validate()?;
//!
//! assert_eq!(graph.num_created_tiles(graph.root()?)?, 1);
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod data;
pub mod error;
pub mod io;
pub mod topology;

/// A convenient prelude importing the most-used types.
pub mod prelude {
    pub use crate::algs::extract::{
        Tessellation, extract_at_error, extract_coarsest, extract_full, extract_with,
    };
    pub use crate::algs::stats::{GraphStats, graph_stats};
    pub use crate::data::attribute::{Attribute, VecAttribute};
    pub use crate::data::tileset::TileSet;
    pub use crate::error::MtError;
    pub use crate::io::{Encoding, Header, MtMesh, read_mesh, write_mesh};
    pub use crate::topology::facet::FacetTable;
    pub use crate::topology::graph::MtGraph;
    pub use crate::topology::handle::{ArcId, NodeId, TileId, VertexId};
}
