//! ASCII body codec: whitespace-separated decimal tokens.

use crate::error::MtError;
use crate::io::{BodyReader, BodyWriter};
use std::io::{Read, Write};

/// Token reader over the remainder of the stream after the header.
#[derive(Debug)]
pub struct TextBodyReader {
    data: String,
    pos: usize,
}

impl TextBodyReader {
    /// Consumes the rest of `reader` as UTF-8 text.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, MtError> {
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        Ok(Self { data, pos: 0 })
    }

    fn next_token(&mut self) -> Option<&str> {
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some(&self.data[start..self.pos])
    }

    fn expect_token(&mut self) -> Result<&str, MtError> {
        self.next_token()
            .ok_or_else(|| MtError::parse("unexpected end of body"))
    }
}

impl BodyReader for TextBodyReader {
    fn read_u64(&mut self) -> Result<u64, MtError> {
        let tok = self.expect_token()?;
        tok.parse::<u64>()
            .map_err(|_| MtError::parse(format!("invalid index token: {tok}")))
    }

    fn read_f64(&mut self) -> Result<f64, MtError> {
        let tok = self.expect_token()?;
        tok.parse::<f64>()
            .map_err(|_| MtError::parse(format!("invalid coordinate token: {tok}")))
    }

    fn at_end(&mut self) -> bool {
        let pos = self.pos;
        let done = self.next_token().is_none();
        self.pos = pos;
        done
    }
}

/// Token writer producing one record per line.
#[derive(Debug)]
pub struct TextBodyWriter<W: Write> {
    writer: W,
    line_started: bool,
}

impl<W: Write> TextBodyWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            line_started: false,
        }
    }

    fn separator(&mut self) -> Result<(), MtError> {
        if self.line_started {
            write!(self.writer, " ")?;
        }
        self.line_started = true;
        Ok(())
    }
}

impl<W: Write> BodyWriter for TextBodyWriter<W> {
    fn write_u64(&mut self, v: u64) -> Result<(), MtError> {
        self.separator()?;
        write!(self.writer, "{v}")?;
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), MtError> {
        self.separator()?;
        // `{}` on f64 is shortest round-trip formatting.
        write!(self.writer, "{v}")?;
        Ok(())
    }

    fn end_record(&mut self) -> Result<(), MtError> {
        writeln!(self.writer)?;
        self.line_started = false;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), MtError> {
        if self.line_started {
            self.end_record()?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
