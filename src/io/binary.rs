//! Binary body codec: fixed-width big-endian values.
//!
//! Indices are `u64`, coordinates `f64`, both network byte order, with no
//! padding or record markers; the body structure alone determines how many
//! values to read.

use crate::error::MtError;
use crate::io::{BodyReader, BodyWriter};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::{Read, Write};

const FLUSH_THRESHOLD: usize = 8 * 1024;

/// Reader over a fully buffered binary body.
#[derive(Debug)]
pub struct BinaryBodyReader {
    buf: Bytes,
}

impl BinaryBodyReader {
    /// Consumes the rest of `reader` as the body.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, MtError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self {
            buf: Bytes::from(data),
        })
    }

    fn need(&self, n: usize) -> Result<(), MtError> {
        if self.buf.remaining() < n {
            return Err(MtError::parse("unexpected end of binary body"));
        }
        Ok(())
    }
}

impl BodyReader for BinaryBodyReader {
    fn read_u64(&mut self) -> Result<u64, MtError> {
        self.need(8)?;
        Ok(self.buf.get_u64())
    }

    fn read_f64(&mut self) -> Result<f64, MtError> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    fn at_end(&mut self) -> bool {
        !self.buf.has_remaining()
    }
}

/// Buffered writer for a binary body.
#[derive(Debug)]
pub struct BinaryBodyWriter<W: Write> {
    writer: W,
    buf: BytesMut,
}

impl<W: Write> BinaryBodyWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: BytesMut::with_capacity(FLUSH_THRESHOLD),
        }
    }

    fn maybe_flush(&mut self) -> Result<(), MtError> {
        if self.buf.len() >= FLUSH_THRESHOLD {
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl<W: Write> BodyWriter for BinaryBodyWriter<W> {
    fn write_u64(&mut self, v: u64) -> Result<(), MtError> {
        self.buf.put_u64(v);
        self.maybe_flush()
    }

    fn write_f64(&mut self, v: f64) -> Result<(), MtError> {
        self.buf.put_f64(v);
        self.maybe_flush()
    }

    fn end_record(&mut self) -> Result<(), MtError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), MtError> {
        if !self.buf.is_empty() {
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_roundtrip() {
        let mut out = Vec::new();
        {
            let mut w = BinaryBodyWriter::new(&mut out);
            w.write_f64(std::f64::consts::PI).unwrap();
            w.write_u64(u64::MAX).unwrap();
            w.write_u64(0).unwrap();
            w.end_record().unwrap();
            w.finish().unwrap();
        }
        assert_eq!(out.len(), 24);

        let mut r = BinaryBodyReader::from_reader(&mut out.as_slice()).unwrap();
        assert_eq!(r.read_f64().unwrap(), std::f64::consts::PI);
        assert_eq!(r.read_u64().unwrap(), u64::MAX);
        assert!(!r.at_end());
        assert_eq!(r.read_u64().unwrap(), 0);
        assert!(r.at_end());
    }

    #[test]
    fn truncated_body_is_a_parse_error() {
        let mut r = BinaryBodyReader::from_reader(&mut [0u8; 4].as_slice()).unwrap();
        assert!(matches!(r.read_u64(), Err(MtError::Parse(_))));
    }
}
