//! `FacetTable`: transient open-hash matching of shared tile facets.
//!
//! During extraction, tiles are discovered one at a time from unrelated
//! regions of the DAG, and the output tessellation needs tile adjacency. A
//! facet (a tile's vertex set minus one vertex) is shared by at most two
//! tiles of a valid simplicial complex, so adjacency reduces to pairing up
//! facets. The table holds the facets whose partner has not been seen yet:
//! [`put`](FacetTable::put) files one, [`get`](FacetTable::get) consumes the
//! match, and whatever remains at the end is the mesh boundary, drained with
//! [`pop`](FacetTable::pop).
//!
//! A facet is summarized by three hints over its vertex indices: sum, min,
//! max. The bucket is `(max - min) mod bucket_count`. For facets of at most
//! 3 vertices (tile dimension <= 2, the dominant case) the hint triple
//! determines the vertex set, so hint equality is facet equality; larger
//! facets fall back to a full cross-membership check on hint match.
//!
//! The table never resizes; the caller picks the bucket count at
//! construction. Records live in an internal arena with an intrusive chain
//! per bucket and a free list, so consuming lookups recycle slots without
//! touching the allocator.

use crate::data::tileset::TileSet;
use crate::error::MtError;
use crate::topology::handle::{TileId, VertexId};

#[derive(Debug, Clone, Copy)]
struct Record {
    tile: TileId,
    omit: usize,
    sum: u64,
    min: u64,
    max: u64,
    next: Option<usize>,
}

/// Open-hash table of unmatched facets.
#[derive(Debug, Clone)]
pub struct FacetTable {
    /// Chain head per bucket, indexing into `records`.
    buckets: Vec<Option<usize>>,
    records: Vec<Record>,
    /// Recycled arena slots.
    free: Vec<usize>,
    len: usize,
    /// Bucket scan position for `pop`; buckets behind it may refill.
    cursor: usize,
}

fn facet_hints(verts: &[VertexId], omit: usize) -> (u64, u64, u64) {
    let mut sum = 0u64;
    let mut min = u64::MAX;
    let mut max = 0u64;
    for (i, v) in verts.iter().enumerate() {
        if i == omit {
            continue;
        }
        let raw = v.get();
        sum += raw;
        min = min.min(raw);
        max = max.max(raw);
    }
    (sum, min, max)
}

/// Cross-membership check for facets of 4+ vertices with colliding hints.
fn same_facet(a: &[VertexId], omit_a: usize, b: &[VertexId], omit_b: usize) -> bool {
    for (i, v) in a.iter().enumerate() {
        if i == omit_a {
            continue;
        }
        let found = b.iter().enumerate().any(|(j, w)| j != omit_b && w == v);
        if !found {
            return false;
        }
    }
    true
}

impl FacetTable {
    /// Creates a table with a fixed number of buckets.
    ///
    /// A reasonable choice is on the order of the number of tiles expected
    /// to be live in the extraction frontier.
    ///
    /// # Errors
    /// [`MtError::InvalidStructure`] for a zero bucket count,
    /// [`MtError::Allocation`] if the bucket array cannot be allocated.
    pub fn new(bucket_count: usize) -> Result<Self, MtError> {
        if bucket_count == 0 {
            return Err(MtError::InvalidStructure(
                "facet table needs at least one bucket".into(),
            ));
        }
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(bucket_count)?;
        buckets.resize(bucket_count, None);
        Ok(Self {
            buckets,
            records: Vec::new(),
            free: Vec::new(),
            len: 0,
            cursor: 0,
        })
    }

    /// Number of unmatched facets currently filed.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether every filed facet has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hints_for(
        &self,
        tiles: &TileSet,
        tile: TileId,
        omit: usize,
    ) -> Result<(u64, u64, u64, usize), MtError> {
        let verts = tiles.tile(tile)?;
        if omit >= verts.len() {
            return Err(MtError::InvalidStructure(format!(
                "facet position {omit} out of range for tile {tile} with {} vertices",
                verts.len()
            )));
        }
        let (sum, min, max) = facet_hints(verts, omit);
        let bucket = ((max - min) % self.buckets.len() as u64) as usize;
        Ok((sum, min, max, bucket))
    }

    /// Files the facet of `tile` obtained by excluding local position `omit`.
    ///
    /// # Errors
    /// [`MtError::Allocation`] if the record arena cannot grow; the table is
    /// unchanged in that case.
    pub fn put(&mut self, tiles: &TileSet, tile: TileId, omit: usize) -> Result<(), MtError> {
        let (sum, min, max, bucket) = self.hints_for(tiles, tile, omit)?;
        let rec = Record {
            tile,
            omit,
            sum,
            min,
            max,
            next: self.buckets[bucket],
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.records[slot] = rec;
                slot
            }
            None => {
                self.records.try_reserve(1)?;
                self.records.push(rec);
                self.records.len() - 1
            }
        };
        self.buckets[bucket] = Some(slot);
        self.len += 1;
        Ok(())
    }

    /// Consuming lookup: finds the previously filed tile sharing this facet,
    /// unlinks its record, and returns the owning tile with the local
    /// position it excludes.
    ///
    /// A facet of a valid complex is shared by at most two tiles, so a match
    /// fully resolves the pair. `Ok(None)` leaves the table unchanged; the
    /// partner's own `put` is what will eventually pair it.
    pub fn get(
        &mut self,
        tiles: &TileSet,
        tile: TileId,
        omit: usize,
    ) -> Result<Option<(TileId, usize)>, MtError> {
        let (sum, min, max, bucket) = self.hints_for(tiles, tile, omit)?;
        let verts = tiles.tile(tile)?;
        // Hints alone decide equality for facets of <= 3 vertices.
        let need_cross_check = verts.len() - 1 >= 4;

        let mut prev: Option<usize> = None;
        let mut cur = self.buckets[bucket];
        while let Some(slot) = cur {
            let rec = self.records[slot];
            let hint_match = rec.sum == sum && rec.min == min && rec.max == max;
            let matched = if !hint_match {
                false
            } else if !need_cross_check {
                true
            } else {
                let other = tiles.tile(rec.tile)?;
                same_facet(verts, omit, other, rec.omit)
            };
            if matched {
                match prev {
                    Some(p) => self.records[p].next = rec.next,
                    None => self.buckets[bucket] = rec.next,
                }
                self.free.push(slot);
                self.len -= 1;
                return Ok(Some((rec.tile, rec.omit)));
            }
            prev = Some(slot);
            cur = rec.next;
        }
        Ok(None)
    }

    /// Removes and returns an arbitrary remaining facet, or `None` when the
    /// table is empty. After pairwise extraction, the remaining facets are
    /// exactly the mesh boundary.
    pub fn pop(&mut self) -> Option<(TileId, usize)> {
        if self.len == 0 {
            return None;
        }
        let n = self.buckets.len();
        let start = self.cursor;
        for step in 0..n {
            let b = (start + step) % n;
            if let Some(slot) = self.buckets[b] {
                let rec = self.records[slot];
                self.buckets[b] = rec.next;
                self.free.push(slot);
                self.len -= 1;
                self.cursor = b;
                return Some((rec.tile, rec.omit));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(raw: u64) -> VertexId {
        VertexId::new(raw).unwrap()
    }

    fn tid(raw: u64) -> TileId {
        TileId::new(raw).unwrap()
    }

    /// Two triangles sharing edge (2,3).
    fn two_triangles() -> TileSet {
        let mut ts = TileSet::new(2, 2).unwrap();
        ts.set_vertex_count(4).unwrap();
        ts.set_tile_count(2).unwrap();
        for (i, xy) in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
            .iter()
            .enumerate()
        {
            ts.set_vertex(vid(i as u64 + 1), xy).unwrap();
        }
        ts.set_tile(tid(1), &[vid(1), vid(2), vid(3)]).unwrap();
        ts.set_tile(tid(2), &[vid(2), vid(4), vid(3)]).unwrap();
        ts
    }

    #[test]
    fn put_then_get_pairs_shared_edge() {
        let ts = two_triangles();
        let mut table = FacetTable::new(8).unwrap();
        // Edge (2,3) of tile 1 excludes local position 0.
        table.put(&ts, tid(1), 0).unwrap();
        // Same edge seen from tile 2 excludes local position 1 (vertex 4).
        let hit = table.get(&ts, tid(2), 1).unwrap();
        assert_eq!(hit, Some((tid(1), 0)));
        assert!(table.is_empty());
    }

    #[test]
    fn get_without_partner_leaves_table_unchanged() {
        let ts = two_triangles();
        let mut table = FacetTable::new(8).unwrap();
        table.put(&ts, tid(1), 0).unwrap();
        // Edge (1,2) of tile 1 has no partner filed.
        assert_eq!(table.get(&ts, tid(1), 2).unwrap(), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn pop_drains_in_some_order() {
        let ts = two_triangles();
        let mut table = FacetTable::new(4).unwrap();
        for omit in 0..3 {
            table.put(&ts, tid(1), omit).unwrap();
        }
        let mut seen = Vec::new();
        while let Some(rec) = table.pop() {
            seen.push(rec);
        }
        assert_eq!(seen.len(), 3);
        assert!(table.pop().is_none());
    }

    #[test]
    fn single_bucket_chains_still_match() {
        let ts = two_triangles();
        let mut table = FacetTable::new(1).unwrap();
        for omit in 0..3 {
            table.put(&ts, tid(1), omit).unwrap();
        }
        let hit = table.get(&ts, tid(2), 1).unwrap();
        assert_eq!(hit, Some((tid(1), 0)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn bad_local_position_is_rejected() {
        let ts = two_triangles();
        let mut table = FacetTable::new(4).unwrap();
        assert!(table.put(&ts, tid(1), 3).is_err());
    }
}
