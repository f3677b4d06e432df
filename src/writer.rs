//! A stateful, sequential builder over a [`Buffer`], producing maps/arrays with backpatched
//! `byte_size`/`count` headers.
//!
//! Grounded on `json::Writer` (`include/json/json.h`, `src/Writer.cpp`): the core trick is that
//! opening a container writes a zeroed placeholder header and remembers its offset; every other
//! write bumps the enclosing container's running element count; closing a container rewinds the
//! cursor to the placeholder and rewrites it with the now-known size, then restores the cursor.
//! This is the "open container stack" the design notes call for, generalized slightly to also
//! track element counts per level (the original recomputes `size` via a parallel stack of its
//! own, which this mirrors with [`OpenContainer`]).

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::datetime::DateTimeValue;
use crate::error::{Error, Result};

enum Mode {
    InArray,
    InMap,
}

struct OpenContainer {
    start: usize,
    count: u32,
    mode: Mode,
}

/// A sequential document builder. Each `write_*`/`start_*` call appends one value to whichever
/// container is currently open (or, before any container has been opened, writes a single
/// top-level scalar and closes the writer).
pub struct Writer<'a, 'b> {
    buf: &'a mut Buffer<'b>,
    open: Vec<OpenContainer>,
    done: bool,
}

impl<'a, 'b> Writer<'a, 'b> {
    /// Creates a writer appending to `buf` starting at its current cursor position.
    pub fn new(buf: &'a mut Buffer<'b>) -> Self {
        Self {
            buf,
            open: Vec::new(),
            done: false,
        }
    }

    fn handle_key(&mut self, key: &str) -> Result<()> {
        if self.done {
            return Err(Error::writer_closed());
        }

        if let Some(top) = self.open.last_mut() {
            top.count += 1;
            if matches!(top.mode, Mode::InMap) {
                if !codec::is_valid_key(key) {
                    return Err(Error::invalid_key(key));
                }
                self.buf.write_str(key)?;
            }
        }

        Ok(())
    }

    fn check_end(&mut self) {
        if self.open.is_empty() {
            self.done = true;
        }
    }

    /// Begins a map. `key` is the field name under which it's stored in the enclosing map (or
    /// ignored if the enclosing container is an array, or if this is the top-level value).
    pub fn start_map(&mut self, key: &str) -> Result<()> {
        tracing::trace!(key, "start_map");
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Map as u8)?;
        let start = self.buf.pos();
        self.buf.write_u32(0)?;
        self.buf.write_u32(0)?;
        self.open.push(OpenContainer {
            start,
            count: 0,
            mode: Mode::InMap,
        });
        Ok(())
    }

    /// Closes the most recently opened map, backpatching its `byte_size`/`count` header.
    pub fn end_map(&mut self) -> Result<()> {
        let top = self.pop_open(Mode::InMap)?;
        tracing::trace!(count = top.count, "end_map");
        codec::backpatch_container_header(self.buf, top.start, top.count)?;
        self.check_end();
        Ok(())
    }

    /// Begins an array.
    pub fn start_array(&mut self, key: &str) -> Result<()> {
        tracing::trace!(key, "start_array");
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Array as u8)?;
        let start = self.buf.pos();
        self.buf.write_u32(0)?;
        self.buf.write_u32(0)?;
        self.open.push(OpenContainer {
            start,
            count: 0,
            mode: Mode::InArray,
        });
        Ok(())
    }

    /// Closes the most recently opened array, backpatching its `byte_size`/`count` header.
    pub fn end_array(&mut self) -> Result<()> {
        let top = self.pop_open(Mode::InArray)?;
        tracing::trace!(count = top.count, "end_array");
        codec::backpatch_container_header(self.buf, top.start, top.count)?;
        self.check_end();
        Ok(())
    }

    fn pop_open(&mut self, expected: Mode) -> Result<OpenContainer> {
        let top = self
            .open
            .pop()
            .ok_or_else(|| Error::unsupported_mode("no open container to close"))?;
        match (&top.mode, &expected) {
            (Mode::InMap, Mode::InMap) | (Mode::InArray, Mode::InArray) => Ok(top),
            _ => Err(Error::unsupported_mode("mismatched start/end container call")),
        }
    }

    /// Writes data that is already binary-formatted (a full `<tag><payload>` sequence), such as
    /// the raw bytes of another document.
    pub fn write_raw_data(&mut self, key: &str, data: &[u8]) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_raw(data)?;
        self.check_end();
        Ok(())
    }

    /// Writes the full encoded contents of `doc` as this value.
    pub fn write_document(&mut self, key: &str, doc: &crate::document::Document<'_>) -> Result<()> {
        self.write_raw_data(key, doc.as_bytes())
    }

    pub fn write_null(&mut self, key: &str) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Null as u8)?;
        self.check_end();
        Ok(())
    }

    pub fn write_boolean(&mut self, key: &str, value: bool) -> Result<()> {
        self.handle_key(key)?;
        self.buf
            .write_u8(if value { ValueKind::True as u8 } else { ValueKind::False as u8 })?;
        self.check_end();
        Ok(())
    }

    pub fn write_datetime(&mut self, key: &str, value: &DateTimeValue) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Datetime as u8)?;
        value.encode(self.buf)?;
        self.check_end();
        Ok(())
    }

    pub fn write_integer(&mut self, key: &str, value: i64) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Integer as u8)?;
        self.buf.write_i64(value)?;
        self.check_end();
        Ok(())
    }

    pub fn write_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::String as u8)?;
        self.buf.write_str(value)?;
        self.check_end();
        Ok(())
    }

    pub fn write_float(&mut self, key: &str, value: f64) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Float as u8)?;
        self.buf.write_f64(value)?;
        self.check_end();
        Ok(())
    }

    pub fn write_binary(&mut self, key: &str, data: &[u8]) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Binary as u8)?;
        self.buf.write_u32(data.len() as u32)?;
        self.buf.write_raw(data)?;
        self.check_end();
        Ok(())
    }

    #[cfg(feature = "geo")]
    pub fn write_vector2(&mut self, key: &str, x: f64, y: f64) -> Result<()> {
        self.handle_key(key)?;
        self.buf.write_u8(ValueKind::Vector2 as u8)?;
        self.buf.write_f64(x)?;
        self.buf.write_f64(y)?;
        self.check_end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;

    #[test]
    fn top_level_scalar_closes_writer() {
        let mut buf = Buffer::owned(Vec::new());
        let mut w = Writer::new(&mut buf);
        w.write_integer("", 7).unwrap();
        assert!(w.write_integer("", 8).is_err());
    }

    #[test]
    fn map_backpatches_size_and_count() {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.write_string("b", "x").unwrap();
            w.end_map().unwrap();
        }

        buf.move_to(0);
        assert_eq!(ValueKind::try_from(buf.read_u8().unwrap()).unwrap(), ValueKind::Map);
        let (byte_size, count) = codec::read_container_header(&mut buf).unwrap();
        assert_eq!(count, 2);
        assert_eq!(byte_size as usize, buf.size() - 1 - 4);
    }

    #[test]
    fn invalid_key_in_map_is_rejected() {
        let mut buf = Buffer::owned(Vec::new());
        let mut w = Writer::new(&mut buf);
        w.start_map("").unwrap();
        assert!(w.write_integer("bad key!", 1).is_err());
    }

    #[test]
    fn array_ignores_key() {
        let mut buf = Buffer::owned(Vec::new());
        let mut w = Writer::new(&mut buf);
        w.start_array("").unwrap();
        w.write_integer("ignored", 1).unwrap();
        w.write_integer("ignored-too", 2).unwrap();
        w.end_array().unwrap();

        buf.move_to(0);
        assert_eq!(ValueKind::try_from(buf.read_u8().unwrap()).unwrap(), ValueKind::Array);
        let (_, count) = codec::read_container_header(&mut buf).unwrap();
        assert_eq!(count, 2);
    }

    #[cfg(feature = "geo")]
    #[test]
    fn vector2_round_trips() {
        let mut buf = Buffer::owned(Vec::new());
        let mut w = Writer::new(&mut buf);
        w.write_vector2("", 1.5, -2.25).unwrap();

        buf.move_to(0);
        assert_eq!(ValueKind::try_from(buf.read_u8().unwrap()).unwrap(), ValueKind::Vector2);
        assert_eq!(buf.read_f64().unwrap(), 1.5);
        assert_eq!(buf.read_f64().unwrap(), -2.25);
    }
}
