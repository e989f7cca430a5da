//! `TileSet`: shared vertex and tile arrays underlying a Multi-Tessellation.
//!
//! A tile set owns the geometry every resolution level shares: vertex
//! coordinates of a fixed embedding dimension, and simplicial tiles given as
//! ordered lists of `tile_dim + 1` vertex handles. Tile vertex order encodes
//! orientation; this crate consumes it but never reorders it.
//!
//! Capacities are fixed up front with [`set_vertex_count`](TileSet::set_vertex_count)
//! and [`set_tile_count`](TileSet::set_tile_count), then slots are filled by
//! index during load or by a builder. There is no entity deletion; the whole
//! set is dropped together.
//!
//! # Invariants
//! - Slot 0 of every array is reserved and never read.
//! - Every stored tile has exactly `tile_dim + 1` vertices, each a valid
//!   handle into the vertex array at the time it was set.

use crate::error::MtError;
use crate::io::{BodyReader, BodyWriter};
use crate::topology::handle::{TileId, VertexId, slot_count};

/// Shared vertex coordinates and tile connectivity.
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    vertex_dim: usize,
    tile_dim: usize,
    vertex_count: u64,
    tile_count: u64,
    /// Flat coordinate storage, `(vertex_count + 1) * vertex_dim` slots.
    coords: Vec<f64>,
    /// Per-tile vertex lists; slot 0 and unfilled slots hold an empty list.
    conn: Vec<Box<[VertexId]>>,
}

impl TileSet {
    /// Creates an empty tile set for tiles of dimension `tile_dim` embedded
    /// in `vertex_dim`-dimensional space.
    ///
    /// # Errors
    /// Returns [`MtError::InvalidStructure`] if either dimension is zero.
    pub fn new(vertex_dim: usize, tile_dim: usize) -> Result<Self, MtError> {
        if vertex_dim == 0 || tile_dim == 0 {
            return Err(MtError::InvalidStructure(format!(
                "dimensions must be positive (vertex_dim={vertex_dim}, tile_dim={tile_dim})"
            )));
        }
        Ok(Self {
            vertex_dim,
            tile_dim,
            ..Self::default()
        })
    }

    /// Embedding dimension of vertex coordinates.
    #[inline]
    pub fn vertex_dim(&self) -> usize {
        self.vertex_dim
    }

    /// Dimension of the tiles (2 = triangles, 3 = tetrahedra, ...).
    #[inline]
    pub fn tile_dim(&self) -> usize {
        self.tile_dim
    }

    /// Number of vertices per tile, `tile_dim + 1`.
    #[inline]
    pub fn verts_per_tile(&self) -> usize {
        self.tile_dim + 1
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> u64 {
        self.vertex_count
    }

    /// Number of tiles.
    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.tile_count
    }

    /// Allocates storage for `n` vertices, discarding any existing contents.
    ///
    /// # Errors
    /// [`MtError::Allocation`] if storage cannot be obtained, or
    /// [`MtError::Parse`] for an unaddressable count; the vertex count is
    /// left at zero and the current load must be abandoned.
    pub fn set_vertex_count(&mut self, n: u64) -> Result<(), MtError> {
        self.vertex_count = 0;
        self.coords = Vec::new();
        let slots = slot_count(n)?
            .checked_mul(self.vertex_dim)
            .ok_or_else(|| {
                MtError::parse(format!("vertex count {n} exceeds addressable memory"))
            })?;
        let mut coords = Vec::new();
        coords.try_reserve_exact(slots)?;
        coords.resize(slots, 0.0);
        self.coords = coords;
        self.vertex_count = n;
        Ok(())
    }

    /// Allocates storage for `n` tiles, discarding any existing contents.
    ///
    /// # Errors
    /// [`MtError::Allocation`] if storage cannot be obtained; the tile count
    /// is left at zero.
    pub fn set_tile_count(&mut self, n: u64) -> Result<(), MtError> {
        self.tile_count = 0;
        self.conn = Vec::new();
        let slots = slot_count(n)?;
        let mut conn = Vec::new();
        conn.try_reserve_exact(slots)?;
        conn.resize_with(slots, Default::default);
        self.conn = conn;
        self.tile_count = n;
        Ok(())
    }

    fn check_vertex(&self, v: VertexId) -> Result<(), MtError> {
        if v.get() > self.vertex_count {
            return Err(MtError::InvalidVertex(v.get(), self.vertex_count));
        }
        Ok(())
    }

    fn check_tile(&self, t: TileId) -> Result<(), MtError> {
        if t.get() > self.tile_count {
            return Err(MtError::InvalidTile(t.get(), self.tile_count));
        }
        Ok(())
    }

    /// Stores the coordinates of vertex `v`.
    ///
    /// # Errors
    /// [`MtError::InvalidVertex`] if `v` is out of range,
    /// [`MtError::ArityMismatch`] if `coords.len() != vertex_dim`.
    pub fn set_vertex(&mut self, v: VertexId, coords: &[f64]) -> Result<(), MtError> {
        self.check_vertex(v)?;
        if coords.len() != self.vertex_dim {
            return Err(MtError::ArityMismatch {
                expected: self.vertex_dim,
                got: coords.len(),
            });
        }
        let off = v.index() * self.vertex_dim;
        self.coords[off..off + self.vertex_dim].copy_from_slice(coords);
        Ok(())
    }

    /// Stores the ordered vertex list of tile `t`.
    ///
    /// # Errors
    /// [`MtError::InvalidTile`] if `t` is out of range,
    /// [`MtError::ArityMismatch`] if the list is not `tile_dim + 1` long,
    /// [`MtError::InvalidVertex`] if any listed vertex is out of range.
    pub fn set_tile(&mut self, t: TileId, verts: &[VertexId]) -> Result<(), MtError> {
        self.check_tile(t)?;
        if verts.len() != self.verts_per_tile() {
            return Err(MtError::ArityMismatch {
                expected: self.verts_per_tile(),
                got: verts.len(),
            });
        }
        for &v in verts {
            self.check_vertex(v)?;
        }
        self.conn[t.index()] = verts.into();
        Ok(())
    }

    /// Coordinates of vertex `v`.
    pub fn vertex(&self, v: VertexId) -> Result<&[f64], MtError> {
        self.check_vertex(v)?;
        let off = v.index() * self.vertex_dim;
        Ok(&self.coords[off..off + self.vertex_dim])
    }

    /// Ordered vertex list of tile `t`.
    ///
    /// # Errors
    /// [`MtError::InvalidTile`] if `t` is out of range,
    /// [`MtError::InvalidStructure`] if the slot was never filled.
    pub fn tile(&self, t: TileId) -> Result<&[VertexId], MtError> {
        self.check_tile(t)?;
        let verts = &self.conn[t.index()];
        if verts.is_empty() {
            return Err(MtError::InvalidStructure(format!(
                "tile {t} was never populated"
            )));
        }
        Ok(verts)
    }

    /// Reads the vertex and tile sections of a body stream.
    ///
    /// Counts and dimensions must already be set from the header. On a parse
    /// error the set is left partially populated; there is no rollback.
    pub fn read_body<R: BodyReader>(&mut self, r: &mut R) -> Result<(), MtError> {
        let mut coords = vec![0.0; self.vertex_dim];
        for v in 1..=self.vertex_count {
            for c in coords.iter_mut() {
                *c = r.read_f64()?;
            }
            self.set_vertex(VertexId::new(v)?, &coords)?;
        }
        log::debug!("read {} vertices", self.vertex_count);

        let mut verts = Vec::with_capacity(self.verts_per_tile());
        for t in 1..=self.tile_count {
            verts.clear();
            for _ in 0..self.verts_per_tile() {
                let raw = r.read_u64()?;
                let v = VertexId::from_wire(raw)
                    .ok_or_else(|| MtError::parse(format!("tile {t}: vertex index 0")))?;
                verts.push(v);
            }
            self.set_tile(TileId::new(t)?, &verts)?;
        }
        log::debug!("read {} tiles", self.tile_count);
        Ok(())
    }

    /// Writes the vertex and tile sections of a body stream.
    pub fn write_body<W: BodyWriter>(&self, w: &mut W) -> Result<(), MtError> {
        for v in 1..=self.vertex_count {
            let coords = self.vertex(VertexId::new(v)?)?;
            for &c in coords {
                w.write_f64(c)?;
            }
            w.end_record()?;
        }
        for t in 1..=self.tile_count {
            for &v in self.tile(TileId::new(t)?)? {
                w.write_u64(v.get())?;
            }
            w.end_record()?;
        }
        Ok(())
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

    #[test]
    fn zero_dims_rejected() {
        assert!(TileSet::new(0, 2).is_err());
        assert!(TileSet::new(3, 0).is_err());
    }

    #[test]
    fn fill_and_read_back() {
        let mut ts = TileSet::new(2, 2).unwrap();
        ts.set_vertex_count(3).unwrap();
        ts.set_tile_count(1).unwrap();
        ts.set_vertex(vid(1), &[0.0, 0.0]).unwrap();
        ts.set_vertex(vid(2), &[1.0, 0.0]).unwrap();
        ts.set_vertex(vid(3), &[0.0, 1.0]).unwrap();
        ts.set_tile(tid(1), &[vid(1), vid(2), vid(3)]).unwrap();

        assert_eq!(ts.vertex(vid(2)).unwrap(), &[1.0, 0.0]);
        assert_eq!(ts.tile(tid(1)).unwrap(), &[vid(1), vid(2), vid(3)]);
    }

    #[test]
    fn arity_is_checked() {
        let mut ts = TileSet::new(3, 2).unwrap();
        ts.set_vertex_count(4).unwrap();
        ts.set_tile_count(1).unwrap();
        assert!(matches!(
            ts.set_vertex(vid(1), &[0.0, 0.0]),
            Err(MtError::ArityMismatch { expected: 3, got: 2 })
        ));
        assert!(matches!(
            ts.set_tile(tid(1), &[vid(1), vid(2)]),
            Err(MtError::ArityMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn out_of_range_indices() {
        let mut ts = TileSet::new(2, 2).unwrap();
        ts.set_vertex_count(2).unwrap();
        ts.set_tile_count(1).unwrap();
        assert!(matches!(
            ts.set_vertex(vid(3), &[0.0, 0.0]),
            Err(MtError::InvalidVertex(3, 2))
        ));
        assert!(matches!(
            ts.set_tile(tid(1), &[vid(1), vid(2), vid(9)]),
            Err(MtError::InvalidVertex(9, 2))
        ));
        assert!(ts.tile(tid(1)).is_err()); // never populated
    }

    #[test]
    fn unaddressable_counts_are_rejected() {
        let mut ts = TileSet::new(3, 2).unwrap();
        assert!(ts.set_vertex_count(u64::MAX).is_err());
        assert_eq!(ts.vertex_count(), 0);
        assert!(ts.set_tile_count(u64::MAX).is_err());
        assert_eq!(ts.tile_count(), 0);
    }

    #[test]
    fn set_count_discards_contents() {
        let mut ts = TileSet::new(2, 2).unwrap();
        ts.set_vertex_count(1).unwrap();
        ts.set_vertex(vid(1), &[5.0, 5.0]).unwrap();
        ts.set_vertex_count(2).unwrap();
        assert_eq!(ts.vertex(vid(1)).unwrap(), &[0.0, 0.0]);
    }
}
