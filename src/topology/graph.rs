//! `MtGraph`: the Multi-Tessellation DAG over a shared tile set.
//!
//! Nodes and arcs live in parallel arrays addressed by 1-based handles, with
//! slot 0 reserved. The encoding is deliberately compact:
//!
//! - arcs leaving one node occupy a **contiguous index range**, so out-arc
//!   navigation is `arc + 1` with a source check instead of stored links;
//! - tiles labelling one arc occupy a contiguous range, so label navigation
//!   is `tile + 1` with a bounds check;
//! - incoming arcs are an **intrusive chain** threaded through the arc array
//!   (`next_in`), iterated in insertion order, most recently added first.
//!
//! Both contiguity properties are contracts on the population order (arcs in
//! non-decreasing source order, tiles in increasing index order per label).
//! [`add_arc`](MtGraph::add_arc) and [`add_tile_label`](MtGraph::add_tile_label)
//! trust the caller, as the extraction-time navigation cannot afford checks;
//! the file reader rejects out-of-order streams and [`validate`](MtGraph::validate)
//! verifies the result after a load.
//!
//! Node 1 is the root (coarsest resolution), node `node_count` the drain
//! (finest). The root creates the coarsest tiles, the drain removes the
//! finest ones.

use crate::error::MtError;
use crate::io::{BodyReader, BodyWriter};
use crate::topology::handle::{ArcId, NodeId, TileId, slot_count};
use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Copy, Default)]
struct NodeRec {
    first_out: Option<ArcId>,
    last_out: Option<ArcId>,
    in_head: Option<ArcId>,
    in_count: u64,
}

#[derive(Debug, Clone, Copy)]
struct ArcRec {
    source: NodeId,
    dest: NodeId,
    first_tile: Option<TileId>,
    last_tile: Option<TileId>,
    next_in: Option<ArcId>,
}

/// The refinement DAG: nodes, arcs, and the tile-to-arc backreference.
#[derive(Debug, Clone, Default)]
pub struct MtGraph {
    node_count: u64,
    arc_count: u64,
    tile_count: u64,
    nodes: Vec<NodeRec>,
    arcs: Vec<Option<ArcRec>>,
    tile_arc: Vec<Option<ArcId>>,
    /// Longest-path-from-root per node, computed lazily for statistics.
    depths: OnceCell<Vec<u64>>,
}

impl MtGraph {
    /// Creates an empty graph; set counts before populating.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Number of arcs.
    #[inline]
    pub fn arc_count(&self) -> u64 {
        self.arc_count
    }

    /// Number of tiles tracked by the backreference array.
    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.tile_count
    }

    /// The root node (coarsest resolution), node 1.
    ///
    /// # Errors
    /// [`MtError::InvalidStructure`] on an empty graph.
    pub fn root(&self) -> Result<NodeId, MtError> {
        if self.node_count == 0 {
            return Err(MtError::InvalidStructure("graph has no nodes".into()));
        }
        NodeId::new(1)
    }

    /// The drain node (finest resolution), node `node_count`.
    pub fn drain(&self) -> Result<NodeId, MtError> {
        if self.node_count == 0 {
            return Err(MtError::InvalidStructure("graph has no nodes".into()));
        }
        NodeId::new(self.node_count)
    }

    // ---- capacity ----------------------------------------------------------

    /// Allocates `n + 1` node slots, discarding existing contents.
    ///
    /// # Errors
    /// [`MtError::Allocation`] or [`MtError::Parse`] for an unaddressable
    /// count; the node count is left at zero.
    pub fn set_node_count(&mut self, n: u64) -> Result<(), MtError> {
        self.depths.take();
        self.node_count = 0;
        self.nodes = Vec::new();
        let slots = slot_count(n)?;
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(slots)?;
        nodes.resize_with(slots, NodeRec::default);
        self.nodes = nodes;
        self.node_count = n;
        Ok(())
    }

    /// Allocates `n + 1` arc slots, discarding existing contents.
    pub fn set_arc_count(&mut self, n: u64) -> Result<(), MtError> {
        self.depths.take();
        self.arc_count = 0;
        self.arcs = Vec::new();
        let slots = slot_count(n)?;
        let mut arcs = Vec::new();
        arcs.try_reserve_exact(slots)?;
        arcs.resize(slots, None);
        self.arcs = arcs;
        self.arc_count = n;
        Ok(())
    }

    /// Allocates `n + 1` tile backreference slots, discarding existing contents.
    pub fn set_tile_count(&mut self, n: u64) -> Result<(), MtError> {
        self.depths.take();
        self.tile_count = 0;
        self.tile_arc = Vec::new();
        let slots = slot_count(n)?;
        let mut tile_arc = Vec::new();
        tile_arc.try_reserve_exact(slots)?;
        tile_arc.resize(slots, None);
        self.tile_arc = tile_arc;
        self.tile_count = n;
        Ok(())
    }

    // ---- checked slot access ----------------------------------------------

    fn check_node(&self, n: NodeId) -> Result<(), MtError> {
        if n.get() > self.node_count {
            return Err(MtError::InvalidNode(n.get(), self.node_count));
        }
        Ok(())
    }

    fn check_tile(&self, t: TileId) -> Result<(), MtError> {
        if t.get() > self.tile_count {
            return Err(MtError::InvalidTile(t.get(), self.tile_count));
        }
        Ok(())
    }

    fn node(&self, n: NodeId) -> Result<&NodeRec, MtError> {
        self.check_node(n)?;
        Ok(&self.nodes[n.index()])
    }

    fn arc(&self, a: ArcId) -> Result<&ArcRec, MtError> {
        if a.get() > self.arc_count {
            return Err(MtError::InvalidArc(a.get(), self.arc_count));
        }
        self.arcs[a.index()]
            .as_ref()
            .ok_or_else(|| MtError::InvalidStructure(format!("arc {a} was never recorded")))
    }

    // ---- population --------------------------------------------------------

    /// Records arc `a` from `source` to `dest`.
    ///
    /// Extends `source`'s contiguous out-range and pushes `a` onto the head
    /// of `dest`'s incoming chain. Arcs for one source must be added in
    /// increasing arc-index order and sources in non-decreasing order; this
    /// is the caller's contract and is not checked here. No cycle or
    /// self-loop detection is performed.
    ///
    /// # Errors
    /// [`MtError::InvalidArc`]/[`MtError::InvalidNode`] for out-of-range
    /// handles, [`MtError::InvalidStructure`] if `a` was already recorded.
    pub fn add_arc(&mut self, a: ArcId, source: NodeId, dest: NodeId) -> Result<(), MtError> {
        if a.get() > self.arc_count {
            return Err(MtError::InvalidArc(a.get(), self.arc_count));
        }
        self.check_node(source)?;
        self.check_node(dest)?;
        if self.arcs[a.index()].is_some() {
            return Err(MtError::InvalidStructure(format!(
                "arc {a} recorded twice"
            )));
        }
        self.depths.take();

        let dest_rec = &mut self.nodes[dest.index()];
        let next_in = dest_rec.in_head;
        dest_rec.in_head = Some(a);
        dest_rec.in_count += 1;

        self.arcs[a.index()] = Some(ArcRec {
            source,
            dest,
            first_tile: None,
            last_tile: None,
            next_in,
        });

        let src_rec = &mut self.nodes[source.index()];
        if src_rec.first_out.is_none() {
            src_rec.first_out = Some(a);
        }
        src_rec.last_out = Some(a);
        Ok(())
    }

    /// Labels tile `t` with arc `a`: `a`'s source creates `t`, `a`'s dest
    /// removes it.
    ///
    /// Widens the arc's label range to include `t`. Tiles must be appended
    /// to one label in increasing index order for the range to stay exact;
    /// caller's contract, unchecked.
    pub fn add_tile_label(&mut self, t: TileId, a: ArcId) -> Result<(), MtError> {
        self.check_tile(t)?;
        if a.get() > self.arc_count {
            return Err(MtError::InvalidArc(a.get(), self.arc_count));
        }
        if self.tile_arc[t.index()].is_some() {
            return Err(MtError::InvalidStructure(format!(
                "tile {t} labeled twice"
            )));
        }
        let rec = self.arcs[a.index()]
            .as_mut()
            .ok_or_else(|| MtError::InvalidStructure(format!("arc {a} was never recorded")))?;
        rec.first_tile = Some(match rec.first_tile {
            Some(f) => f.min(t),
            None => t,
        });
        rec.last_tile = Some(match rec.last_tile {
            Some(l) => l.max(t),
            None => t,
        });
        self.tile_arc[t.index()] = Some(a);
        Ok(())
    }

    // ---- navigation --------------------------------------------------------

    /// First arc leaving `n`, or `None` for a sink.
    pub fn first_out_arc(&self, n: NodeId) -> Result<Option<ArcId>, MtError> {
        Ok(self.node(n)?.first_out)
    }

    /// Arc after `a` in `n`'s contiguous out-range: `a + 1` if that slot
    /// still has source `n`, else `None`.
    pub fn next_out_arc(&self, n: NodeId, a: ArcId) -> Result<Option<ArcId>, MtError> {
        self.check_node(n)?;
        self.arc(a)?;
        Ok(self.next_out_unchecked(n, a))
    }

    fn next_out_unchecked(&self, n: NodeId, a: ArcId) -> Option<ArcId> {
        let next = a.succ();
        if next.get() > self.arc_count {
            return None;
        }
        match &self.arcs[next.index()] {
            Some(rec) if rec.source == n => Some(next),
            _ => None,
        }
    }

    /// Head of `n`'s incoming chain, or `None` for a source node.
    pub fn first_in_arc(&self, n: NodeId) -> Result<Option<ArcId>, MtError> {
        Ok(self.node(n)?.in_head)
    }

    /// Arc after `a` in its destination's incoming chain.
    pub fn next_in_arc(&self, a: ArcId) -> Result<Option<ArcId>, MtError> {
        Ok(self.arc(a)?.next_in)
    }

    /// First tile of `a`'s label, or `None` for an empty label.
    pub fn first_arc_tile(&self, a: ArcId) -> Result<Option<TileId>, MtError> {
        Ok(self.arc(a)?.first_tile)
    }

    /// Tile after `t` in `a`'s contiguous label range.
    pub fn next_arc_tile(&self, a: ArcId, t: TileId) -> Result<Option<TileId>, MtError> {
        let rec = self.arc(a)?;
        let next = t.succ();
        Ok(match (rec.first_tile, rec.last_tile) {
            (Some(first), Some(last)) if next >= first && next <= last => Some(next),
            _ => None,
        })
    }

    /// Arcs leaving `n`, in increasing index order.
    pub fn out_arcs(&self, n: NodeId) -> Result<impl Iterator<Item = ArcId> + '_, MtError> {
        let first = self.first_out_arc(n)?;
        Ok(std::iter::successors(first, move |&a| {
            self.next_out_unchecked(n, a)
        }))
    }

    /// Arcs entering `n`, in insertion order, most recently added first.
    pub fn in_arcs(&self, n: NodeId) -> Result<impl Iterator<Item = ArcId> + '_, MtError> {
        let first = self.first_in_arc(n)?;
        Ok(std::iter::successors(first, move |&a| {
            self.arcs[a.index()].as_ref().and_then(|rec| rec.next_in)
        }))
    }

    /// Tiles of `a`'s label, in increasing index order.
    pub fn arc_tiles(&self, a: ArcId) -> Result<impl Iterator<Item = TileId> + '_, MtError> {
        let rec = self.arc(a)?;
        let (first, last) = (rec.first_tile, rec.last_tile);
        Ok(std::iter::successors(first, move |&t| {
            let next = t.succ();
            match last {
                Some(l) if next <= l => Some(next),
                _ => None,
            }
        }))
    }

    // ---- derived queries ---------------------------------------------------

    /// Source node of arc `a`.
    pub fn arc_source(&self, a: ArcId) -> Result<NodeId, MtError> {
        Ok(self.arc(a)?.source)
    }

    /// Destination node of arc `a`.
    pub fn arc_dest(&self, a: ArcId) -> Result<NodeId, MtError> {
        Ok(self.arc(a)?.dest)
    }

    /// Number of tiles in `a`'s label.
    pub fn arc_label_size(&self, a: ArcId) -> Result<u64, MtError> {
        let rec = self.arc(a)?;
        Ok(match (rec.first_tile, rec.last_tile) {
            (Some(f), Some(l)) => l.get() - f.get() + 1,
            _ => 0,
        })
    }

    /// The arc whose label contains tile `t`.
    ///
    /// # Errors
    /// [`MtError::InvalidStructure`] if `t` was never labeled.
    pub fn tile_arc(&self, t: TileId) -> Result<ArcId, MtError> {
        self.check_tile(t)?;
        self.tile_arc[t.index()]
            .ok_or_else(|| MtError::InvalidStructure(format!("tile {t} has no owning arc")))
    }

    /// The node that creates tile `t` (source of its owning arc).
    pub fn tile_creator(&self, t: TileId) -> Result<NodeId, MtError> {
        self.arc_source(self.tile_arc(t)?)
    }

    /// The node that removes tile `t` (destination of its owning arc).
    pub fn tile_remover(&self, t: TileId) -> Result<NodeId, MtError> {
        self.arc_dest(self.tile_arc(t)?)
    }

    /// Number of arcs entering `n`.
    pub fn in_degree(&self, n: NodeId) -> Result<u64, MtError> {
        Ok(self.node(n)?.in_count)
    }

    /// Number of arcs leaving `n`, from the contiguous out-range.
    pub fn out_degree(&self, n: NodeId) -> Result<u64, MtError> {
        let rec = self.node(n)?;
        Ok(match (rec.first_out, rec.last_out) {
            (Some(f), Some(l)) => l.get() - f.get() + 1,
            _ => 0,
        })
    }

    /// Total label size over `n`'s out-arcs: tiles `n` creates.
    pub fn num_created_tiles(&self, n: NodeId) -> Result<u64, MtError> {
        let mut total = 0;
        for a in self.out_arcs(n)? {
            total += self.arc_label_size(a)?;
        }
        Ok(total)
    }

    /// Total label size over `n`'s in-arcs: tiles `n` removes.
    pub fn num_removed_tiles(&self, n: NodeId) -> Result<u64, MtError> {
        let mut total = 0;
        for a in self.in_arcs(n)? {
            total += self.arc_label_size(a)?;
        }
        Ok(total)
    }

    /// Source of `n`'s first in-arc, or `None` for the root.
    pub fn first_parent(&self, n: NodeId) -> Result<Option<NodeId>, MtError> {
        match self.first_in_arc(n)? {
            Some(a) => Ok(Some(self.arc_source(a)?)),
            None => Ok(None),
        }
    }

    /// Destination of `n`'s first out-arc, or `None` for the drain.
    pub fn first_child(&self, n: NodeId) -> Result<Option<NodeId>, MtError> {
        match self.first_out_arc(n)? {
            Some(a) => Ok(Some(self.arc_dest(a)?)),
            None => Ok(None),
        }
    }

    // ---- structure checks --------------------------------------------------

    /// Longest-path-from-root depth of every node (slot 0 unused), computed
    /// once and cached until the next mutation.
    ///
    /// # Errors
    /// [`MtError::InvalidStructure`] if the graph contains a cycle.
    pub fn node_depths(&self) -> Result<&[u64], MtError> {
        let depths = self.depths.get_or_try_init(|| self.compute_depths())?;
        Ok(depths)
    }

    fn compute_depths(&self) -> Result<Vec<u64>, MtError> {
        let slots = self.node_count as usize + 1;
        let mut indeg = vec![0u64; slots];
        for rec in self.arcs.iter().skip(1).flatten() {
            indeg[rec.dest.index()] += 1;
        }
        let mut depth = vec![0u64; slots];
        let mut queue: Vec<usize> = (1..slots).filter(|&i| indeg[i] == 0).collect();
        let mut visited = 0usize;
        while let Some(i) = queue.pop() {
            visited += 1;
            let rec = self.nodes[i];
            let mut a = rec.first_out;
            while let Some(arc) = a {
                let arc_rec = self.arcs[arc.index()].as_ref().ok_or_else(|| {
                    MtError::InvalidStructure(format!("arc {arc} was never recorded"))
                })?;
                let d = arc_rec.dest.index();
                depth[d] = depth[d].max(depth[i] + 1);
                indeg[d] -= 1;
                if indeg[d] == 0 {
                    queue.push(d);
                }
                a = self.next_out_unchecked(arc_rec.source, arc);
            }
        }
        if visited != self.node_count as usize {
            return Err(MtError::InvalidStructure(
                "cycle detected in refinement graph (expected a DAG)".into(),
            ));
        }
        Ok(depth)
    }

    /// Verifies the structural invariants of a fully populated graph:
    /// every arc recorded and every tile labeled; out-ranges and label
    /// ranges consistent with the per-entity records; root without in-arcs;
    /// drain without out-arcs; no cycles.
    ///
    /// The file reader calls this after `read_body`; builders should call it
    /// once population is complete.
    pub fn validate(&self) -> Result<(), MtError> {
        let root = self.root()?;
        let drain = self.drain()?;

        for a in 1..=self.arc_count {
            let id = ArcId::new(a)?;
            self.arc(id)?;
            for t in self.arc_tiles(id)? {
                let owner = self.tile_arc(t)?;
                if owner != id {
                    log::warn!("tile {t} inside label range of arc {id} but owned by {owner}");
                    return Err(MtError::InvalidStructure(format!(
                        "label range of arc {id} is not contiguous at tile {t}"
                    )));
                }
            }
        }

        for n in 1..=self.node_count {
            let id = NodeId::new(n)?;
            for a in self.out_arcs(id)? {
                if self.arc_source(a)? != id {
                    return Err(MtError::InvalidStructure(format!(
                        "out-range of node {id} contains arc {a} with a different source"
                    )));
                }
            }
        }

        for t in 1..=self.tile_count {
            self.tile_arc(TileId::new(t)?)?;
        }

        if self.in_degree(root)? != 0 {
            return Err(MtError::InvalidStructure(format!(
                "root node {root} has incoming arcs"
            )));
        }
        if self.out_degree(drain)? != 0 {
            return Err(MtError::InvalidStructure(format!(
                "drain node {drain} has outgoing arcs"
            )));
        }

        self.node_depths()?;
        Ok(())
    }

    // ---- serialization -----------------------------------------------------

    /// Reads the arc section of a body stream: for each arc in index order,
    /// the `(source, dest)` pair followed by a 0-terminated tile list.
    ///
    /// One pass reconstructs out-ranges, incoming chains, and tile
    /// backreferences. The reader is strict: arc sources must arrive in
    /// non-decreasing order and each label's tiles in increasing order,
    /// otherwise the contiguous-range encoding would silently corrupt
    /// navigation. On error the graph is left partially populated.
    pub fn read_body<R: BodyReader>(&mut self, r: &mut R) -> Result<(), MtError> {
        let mut prev_source = 0u64;
        for a in 1..=self.arc_count {
            let arc = ArcId::new(a)?;
            let source = NodeId::from_wire(r.read_u64()?)
                .ok_or_else(|| MtError::parse(format!("arc {a}: source index is 0")))?;
            let dest = NodeId::from_wire(r.read_u64()?)
                .ok_or_else(|| MtError::parse(format!("arc {a}: dest index is 0")))?;
            if source.get() < prev_source {
                return Err(MtError::parse(format!(
                    "arc {a}: source {source} out of order (previous was {prev_source})"
                )));
            }
            prev_source = source.get();
            self.add_arc(arc, source, dest)?;

            let mut prev_tile = 0u64;
            loop {
                let raw = r.read_u64()?;
                let Some(tile) = TileId::from_wire(raw) else {
                    break;
                };
                if raw <= prev_tile {
                    return Err(MtError::parse(format!(
                        "arc {a}: tile {raw} out of order (previous was {prev_tile})"
                    )));
                }
                prev_tile = raw;
                self.add_tile_label(tile, arc)?;
            }
        }
        log::debug!("read {} arcs over {} nodes", self.arc_count, self.node_count);
        Ok(())
    }

    /// Writes the arc section: the mirror of [`read_body`](Self::read_body).
    pub fn write_body<W: BodyWriter>(&self, w: &mut W) -> Result<(), MtError> {
        for a in 1..=self.arc_count {
            let arc = ArcId::new(a)?;
            let rec = self.arc(arc)?;
            w.write_u64(rec.source.get())?;
            w.write_u64(rec.dest.get())?;
            w.end_record()?;
            for t in self.arc_tiles(arc)? {
                w.write_u64(t.get())?;
            }
            w.write_u64(0)?;
            w.end_record()?;
        }
        Ok(())
    }
}
