//! Reading and writing Multi-Tessellation files.
//!
//! A file is an ASCII keyword header followed by a body in one of two
//! encodings selected by the header flag:
//!
//! ```text
//! multitess 1 ascii
//! vertexdim 3
//! tiledim 2
//! vertices 6
//! tiles 6
//! nodes 3
//! arcs 2
//! body
//! <vertex coordinates> <tile vertex lists> <arc section>
//! ```
//!
//! The body structure is identical in both encodings: all vertices, then all
//! tiles, then per arc the `(source, dest)` pair followed by its
//! 0-terminated tile list, arcs in index order. The ASCII body is
//! whitespace-separated tokens; the binary body is fixed-width big-endian
//! (`f64` coordinates, `u64` indices).
//!
//! Reads are strict: missing keywords, wrong arity, out-of-order arc or
//! tile streams, and trailing data are [`MtError::Parse`] errors, and the
//! graph is validated after loading. A failed read leaves the target
//! partially populated; there is no rollback.

pub mod binary;
pub mod text;

use crate::data::tileset::TileSet;
use crate::error::MtError;
use crate::topology::graph::MtGraph;
use std::io::{BufRead, BufReader, Read, Write};

/// Body encoding selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Encoding {
    /// Whitespace-separated decimal tokens.
    Ascii,
    /// Fixed-width big-endian values.
    Binary,
}

impl Encoding {
    fn keyword(self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Binary => "binary",
        }
    }
}

/// Parsed file header: dimensions, counts, and the body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Header {
    pub encoding: Encoding,
    pub vertex_dim: usize,
    pub tile_dim: usize,
    pub vertex_count: u64,
    pub tile_count: u64,
    pub node_count: u64,
    pub arc_count: u64,
}

/// A tile set together with the refinement DAG over it, as loaded from or
/// written to one file.
#[derive(Debug, Clone)]
pub struct MtMesh {
    pub tileset: TileSet,
    pub graph: MtGraph,
}

/// Scalar source for body decoding, implemented per encoding.
pub trait BodyReader {
    fn read_u64(&mut self) -> Result<u64, MtError>;
    fn read_f64(&mut self) -> Result<f64, MtError>;
    /// Whether the body has been fully consumed.
    fn at_end(&mut self) -> bool;
}

/// Scalar sink for body encoding, implemented per encoding.
pub trait BodyWriter {
    fn write_u64(&mut self, v: u64) -> Result<(), MtError>;
    fn write_f64(&mut self, v: f64) -> Result<(), MtError>;
    /// Ends a logical record (a line in the ASCII encoding; a no-op in binary).
    fn end_record(&mut self) -> Result<(), MtError>;
    /// Flushes any buffered output.
    fn finish(&mut self) -> Result<(), MtError>;
}

const MAGIC: &str = "multitess";
const FORMAT_VERSION: u64 = 1;

fn header_line<R: BufRead>(r: &mut R, what: &str) -> Result<String, MtError> {
    let mut line = String::new();
    if r.read_line(&mut line)? == 0 {
        return Err(MtError::parse(format!("missing {what} line")));
    }
    Ok(line.trim().to_string())
}

fn keyword_value<R: BufRead>(r: &mut R, keyword: &str) -> Result<u64, MtError> {
    let line = header_line(r, keyword)?;
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(k) if k == keyword => {}
        other => {
            return Err(MtError::parse(format!(
                "expected keyword `{keyword}`, got `{}`",
                other.unwrap_or("")
            )));
        }
    }
    let value = parts
        .next()
        .ok_or_else(|| MtError::parse(format!("keyword `{keyword}` has no value")))?;
    if parts.next().is_some() {
        return Err(MtError::parse(format!("trailing tokens after `{keyword}`")));
    }
    value
        .parse::<u64>()
        .map_err(|_| MtError::parse(format!("invalid value for `{keyword}`: {value}")))
}

/// Reads a header from the start of a stream.
pub fn read_header<R: BufRead>(r: &mut R) -> Result<Header, MtError> {
    let line = header_line(r, "magic")?;
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(MAGIC) => {}
        other => {
            return Err(MtError::parse(format!(
                "not a multitess file (got `{}`)",
                other.unwrap_or("")
            )));
        }
    }
    let version = parts
        .next()
        .ok_or_else(|| MtError::parse("missing format version"))?;
    let version: u64 = version
        .parse()
        .map_err(|_| MtError::parse(format!("invalid format version: {version}")))?;
    if version != FORMAT_VERSION {
        return Err(MtError::parse(format!(
            "unsupported format version: {version}"
        )));
    }
    let encoding = match parts.next() {
        Some("ascii") => Encoding::Ascii,
        Some("binary") => Encoding::Binary,
        other => {
            return Err(MtError::parse(format!(
                "invalid encoding flag: `{}`",
                other.unwrap_or("")
            )));
        }
    };

    let vertex_dim = keyword_value(r, "vertexdim")? as usize;
    let tile_dim = keyword_value(r, "tiledim")? as usize;
    let vertex_count = keyword_value(r, "vertices")?;
    let tile_count = keyword_value(r, "tiles")?;
    let node_count = keyword_value(r, "nodes")?;
    let arc_count = keyword_value(r, "arcs")?;

    let line = header_line(r, "body")?;
    if line != "body" {
        return Err(MtError::parse(format!(
            "expected keyword `body`, got `{line}`"
        )));
    }

    Ok(Header {
        encoding,
        vertex_dim,
        tile_dim,
        vertex_count,
        tile_count,
        node_count,
        arc_count,
    })
}

/// Writes a header.
pub fn write_header<W: Write>(w: &mut W, h: &Header) -> Result<(), MtError> {
    writeln!(w, "{MAGIC} {FORMAT_VERSION} {}", h.encoding.keyword())?;
    writeln!(w, "vertexdim {}", h.vertex_dim)?;
    writeln!(w, "tiledim {}", h.tile_dim)?;
    writeln!(w, "vertices {}", h.vertex_count)?;
    writeln!(w, "tiles {}", h.tile_count)?;
    writeln!(w, "nodes {}", h.node_count)?;
    writeln!(w, "arcs {}", h.arc_count)?;
    writeln!(w, "body")?;
    Ok(())
}

fn read_body_with<B: BodyReader>(body: &mut B, header: &Header) -> Result<MtMesh, MtError> {
    let mut tileset = TileSet::new(header.vertex_dim, header.tile_dim)?;
    tileset.set_vertex_count(header.vertex_count)?;
    tileset.set_tile_count(header.tile_count)?;

    let mut graph = MtGraph::new();
    graph.set_node_count(header.node_count)?;
    graph.set_arc_count(header.arc_count)?;
    graph.set_tile_count(header.tile_count)?;

    tileset.read_body(body)?;
    graph.read_body(body)?;
    if !body.at_end() {
        return Err(MtError::parse("trailing data after body"));
    }
    graph.validate()?;
    Ok(MtMesh { tileset, graph })
}

/// Loads a complete mesh: header, tile set body, graph body, validation.
pub fn read_mesh<R: Read>(reader: R) -> Result<MtMesh, MtError> {
    let mut reader = BufReader::new(reader);
    let header = read_header(&mut reader)?;
    log::debug!(
        "loading {:?} mesh: {} vertices, {} tiles, {} nodes, {} arcs",
        header.encoding,
        header.vertex_count,
        header.tile_count,
        header.node_count,
        header.arc_count
    );
    match header.encoding {
        Encoding::Ascii => {
            let mut body = text::TextBodyReader::from_reader(&mut reader)?;
            read_body_with(&mut body, &header)
        }
        Encoding::Binary => {
            let mut body = binary::BinaryBodyReader::from_reader(&mut reader)?;
            read_body_with(&mut body, &header)
        }
    }
}

/// The header a mesh would be written with.
pub fn header_of(mesh: &MtMesh, encoding: Encoding) -> Header {
    Header {
        encoding,
        vertex_dim: mesh.tileset.vertex_dim(),
        tile_dim: mesh.tileset.tile_dim(),
        vertex_count: mesh.tileset.vertex_count(),
        tile_count: mesh.tileset.tile_count(),
        node_count: mesh.graph.node_count(),
        arc_count: mesh.graph.arc_count(),
    }
}

/// Writes a complete mesh in the chosen encoding; the mirror of
/// [`read_mesh`].
pub fn write_mesh<W: Write>(
    mut writer: W,
    mesh: &MtMesh,
    encoding: Encoding,
) -> Result<(), MtError> {
    let header = header_of(mesh, encoding);
    write_header(&mut writer, &header)?;
    match encoding {
        Encoding::Ascii => {
            let mut body = text::TextBodyWriter::new(&mut writer);
            mesh.tileset.write_body(&mut body)?;
            mesh.graph.write_body(&mut body)?;
            body.finish()?;
        }
        Encoding::Binary => {
            let mut body = binary::BinaryBodyWriter::new(&mut writer);
            mesh.tileset.write_body(&mut body)?;
            mesh.graph.write_body(&mut body)?;
            body.finish()?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let h = Header {
            encoding: Encoding::Binary,
            vertex_dim: 3,
            tile_dim: 2,
            vertex_count: 10,
            tile_count: 12,
            node_count: 4,
            arc_count: 5,
        };
        let mut buf = Vec::new();
        write_header(&mut buf, &h).unwrap();
        let parsed = read_header(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn header_rejects_bad_magic() {
        let err = read_header(&mut "mesh 1 ascii\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MtError::Parse(_)));
    }

    #[test]
    fn header_rejects_missing_keyword() {
        let text = "multitess 1 ascii\nvertexdim 3\ntiles 2\n";
        let err = read_header(&mut text.as_bytes()).unwrap_err();
        assert!(matches!(err, MtError::Parse(_)));
    }

    #[test]
    fn header_serde_roundtrip() {
        let h = Header {
            encoding: Encoding::Ascii,
            vertex_dim: 2,
            tile_dim: 2,
            vertex_count: 1,
            tile_count: 1,
            node_count: 2,
            arc_count: 1,
        };
        let s = serde_json::to_string(&h).unwrap();
        let h2: Header = serde_json::from_str(&s).unwrap();
        assert_eq!(h2, h);
    }
}
