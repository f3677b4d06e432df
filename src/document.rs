//! The public [`Document`] type: a position-addressable, JSON-like value backed by the binary
//! wire format, with every mutating/traversal operation delegating to the engine modules.
//!
//! Grounded on `json::Document` (`src/Document.cpp`): construction from raw bytes with a chosen
//! [`DocumentMode`], scalar accessors that reject a type mismatch rather than coerce, `diff`,
//! `duplicate`, `hash`, and path-based projection all map directly onto methods there. Iteration
//! and text rendering are layered on top of [`crate::visit`]/[`crate::printer`] instead of the
//! original's separate `Iterator`/`Printer` entry points, since in Rust both are just
//! `Visitor` implementations driven by the same `walk`.

use crate::add::Amount;
use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::datetime::DateTimeValue;
use crate::diff::DiffEntry;
use crate::error::{Error, Result};
use crate::predicate::PathPredicate;
use crate::visit::Visitor;
use crate::writer::Writer;

pub use crate::buffer::DocumentMode;

/// A JSON-like value backed by the binary wire format.
///
/// `Document` wraps a [`Buffer`] positioned at a value's tag byte. Most construction paths
/// produce a document whose buffer holds exactly one encoded value at position `0`; projections
/// (`project`, `project_index`, `search`) likewise.
#[derive(Debug)]
pub struct Document<'a> {
    buf: Buffer<'a>,
}

impl<'a> Document<'a> {
    /// Wraps already-encoded bytes without copying them, read-only.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        Self::validated(Buffer::borrowed(data))
    }

    /// Takes ownership of already-encoded bytes, permitting in-place mutation.
    pub fn from_owned_bytes(data: Vec<u8>) -> Result<Self> {
        Self::validated(Buffer::owned(data))
    }

    /// Clones `data` into an independent, mutable document.
    pub fn from_bytes_copied(data: &[u8]) -> Result<Self> {
        Self::validated(Buffer::copied(data))
    }

    fn validated(buf: Buffer<'a>) -> Result<Self> {
        let mut probe = Buffer::borrowed(buf.as_slice());
        let kind = codec::read_tag(&mut probe)?;
        codec::skip_next(kind, &mut probe)?;
        Ok(Self { buf })
    }

    /// An empty document: a `Map` with zero entries.
    pub fn empty() -> Self {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.end_map().unwrap();
        }
        Self { buf }
    }

    fn root_kind(&self) -> ValueKind {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        codec::read_tag(&mut probe).expect("validated at construction")
    }

    /// The value kind at the document's root.
    pub fn get_type(&self) -> ValueKind {
        self.root_kind()
    }

    /// The encoded byte size of the whole document, tag byte included.
    pub fn byte_size(&self) -> usize {
        self.buf.size()
    }

    /// The number of direct children, for `Map`/`Array`; `0` for any scalar.
    pub fn get_size(&self) -> u32 {
        match self.root_kind() {
            ValueKind::Map | ValueKind::Array => {
                let mut probe = Buffer::borrowed(self.buf.as_slice());
                probe.move_to(1);
                codec::read_container_header(&mut probe).map(|(_, count)| count).unwrap_or(0)
            }
            _ => 0,
        }
    }

    fn child_document(&self, value_pos: usize) -> Document<'_> {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(value_pos);
        let kind = codec::read_tag(&mut probe).expect("validated structure");
        codec::skip_next(kind, &mut probe).expect("validated structure");
        let end = probe.pos();
        Document {
            buf: Buffer::borrowed(&self.buf.as_slice()[value_pos..end]),
        }
    }

    /// The child stored under `key`, if this is a `Map` and it has one.
    pub fn get_child(&self, key: &str) -> Option<Document<'_>> {
        if self.root_kind() != ValueKind::Map {
            return None;
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        let (_, count) = codec::read_container_header(&mut probe).ok()?;
        for _ in 0..count {
            let k = probe.read_str().ok()?.to_string();
            let value_pos = probe.pos();
            let kind = codec::read_tag(&mut probe).ok()?;
            codec::skip_next(kind, &mut probe).ok()?;
            if k == key {
                return Some(self.child_document(value_pos));
            }
        }
        None
    }

    /// The element at `index`, if this is an `Array` and `index` is in bounds.
    pub fn get_index(&self, index: usize) -> Option<Document<'_>> {
        if self.root_kind() != ValueKind::Array {
            return None;
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        let (_, count) = codec::read_container_header(&mut probe).ok()?;
        if index >= count as usize {
            return None;
        }
        let mut value_pos = probe.pos();
        for _ in 0..=index {
            value_pos = probe.pos();
            let kind = codec::read_tag(&mut probe).ok()?;
            codec::skip_next(kind, &mut probe).ok()?;
        }
        Some(self.child_document(value_pos))
    }

    /// The keys of a `Map`, in on-wire order. Empty for any other kind.
    pub fn get_keys(&self) -> Vec<String> {
        if self.root_kind() != ValueKind::Map {
            return Vec::new();
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        let Ok((_, count)) = codec::read_container_header(&mut probe) else {
            return Vec::new();
        };
        let mut keys = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let Ok(key) = probe.read_str() else { break };
            keys.push(key.to_string());
            let Ok(kind) = codec::read_tag(&mut probe) else { break };
            if codec::skip_next(kind, &mut probe).is_err() {
                break;
            }
        }
        keys
    }

    /// The `String` values of a `Map`, in on-wire order. Entries whose value is not a `String`
    /// are skipped, mirroring the original's `get_string_values`.
    pub fn get_string_values(&self) -> Vec<String> {
        if self.root_kind() != ValueKind::Map {
            return Vec::new();
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        let Ok((_, count)) = codec::read_container_header(&mut probe) else {
            return Vec::new();
        };
        let mut values = Vec::new();
        for _ in 0..count {
            if probe.read_str().is_err() {
                break;
            }
            let Ok(kind) = codec::read_tag(&mut probe) else { break };
            if kind == ValueKind::String {
                match probe.read_str() {
                    Ok(s) => values.push(s.to_string()),
                    Err(_) => break,
                }
            } else if codec::skip_next(kind, &mut probe).is_err() {
                break;
            }
        }
        values
    }

    fn expect_scalar(&self, expected: ValueKind) -> Result<Buffer<'_>> {
        let kind = self.root_kind();
        if kind != expected {
            return Err(Error::type_mismatch(expected.name(), kind.name()));
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        Ok(probe)
    }

    pub fn as_integer(&self) -> Result<i64> {
        self.expect_scalar(ValueKind::Integer)?.read_i64()
    }

    pub fn as_float(&self) -> Result<f64> {
        self.expect_scalar(ValueKind::Float)?.read_f64()
    }

    pub fn as_string(&self) -> Result<&str> {
        let kind = self.root_kind();
        if kind != ValueKind::String {
            return Err(Error::type_mismatch(ValueKind::String.name(), kind.name()));
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        probe.read_str()
    }

    pub fn as_boolean(&self) -> Result<bool> {
        match self.root_kind() {
            ValueKind::True => Ok(true),
            ValueKind::False => Ok(false),
            other => Err(Error::type_mismatch("True or False", other.name())),
        }
    }

    pub fn is_null(&self) -> bool {
        self.root_kind() == ValueKind::Null
    }

    pub fn as_datetime(&self) -> Result<DateTimeValue> {
        let mut probe = self.expect_scalar(ValueKind::Datetime)?;
        DateTimeValue::decode(&mut probe)
    }

    pub fn as_binary(&self) -> Result<&[u8]> {
        let kind = self.root_kind();
        if kind != ValueKind::Binary {
            return Err(Error::type_mismatch(ValueKind::Binary.name(), kind.name()));
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        let len = probe.read_u32()? as usize;
        probe.read_raw(len)
    }

    /// The `(x, y)` pair of a `Vector2` value. Requires the `geo` feature.
    #[cfg(feature = "geo")]
    pub fn as_vector2(&self) -> Result<(f64, f64)> {
        let kind = self.root_kind();
        if kind != ValueKind::Vector2 {
            return Err(Error::type_mismatch(ValueKind::Vector2.name(), kind.name()));
        }
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        probe.move_to(1);
        let x = probe.read_f64()?;
        let y = probe.read_f64()?;
        Ok((x, y))
    }

    /// The raw encoded bytes of this value (tag byte included).
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// A deterministic hash of this document's encoded bytes.
    pub fn hash(&self) -> u64 {
        self.buf.hash()
    }

    /// Renders this document as compact text (see [`crate::printer`]).
    pub fn str(&self) -> Result<String> {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        crate::printer::render(&mut probe, false)
    }

    /// Renders this document as multi-line, indented text.
    pub fn pretty_str(&self) -> Result<String> {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        crate::printer::render(&mut probe, true)
    }

    /// Drives `visitor` depth-first over this document's values.
    pub fn iterate<V: Visitor>(&self, visitor: &mut V) -> Result<()> {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        crate::visit::walk(&mut probe, visitor, "", 0)
    }

    /// An independent copy of this document, regardless of the mode it was constructed with.
    pub fn duplicate(&self) -> Document<'static> {
        Document {
            buf: Buffer::copied(self.buf.as_slice()),
        }
    }

    /// Whether this document satisfies every predicate in `predicates`. Internal traversal
    /// errors (a corrupt tag, say) collapse to `false` rather than propagating, matching
    /// `insert`/`add`'s error-to-`bool` boundary.
    pub fn matches_predicates(&self, predicates: &[PathPredicate]) -> bool {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        crate::predicate::matches(&mut probe, predicates).unwrap_or(false)
    }

    fn array_size_at_path(&self, path: &str) -> Option<usize> {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        let components = crate::path::split(path);
        let (kind, pos) = crate::predicate::navigate(&mut probe, &components).ok()??;
        if kind != ValueKind::Array {
            return None;
        }
        probe.move_to(pos + 1);
        codec::read_container_header(&mut probe).ok().map(|(_, count)| count as usize)
    }

    /// Projects this document down to just the values reachable via `paths` (dotted; `*`
    /// expands over arrays).
    pub fn search(&self, paths: &[&str]) -> Result<Document<'static>> {
        let mut concrete: Vec<String> = Vec::new();
        for path in paths {
            let mut size_at = |prefix: &[&str]| self.array_size_at_path(&crate::path::join(prefix.iter().copied()));
            concrete.extend(crate::path::expand_wildcards(path, &mut size_at));
        }
        let refs: Vec<&str> = concrete.iter().map(String::as_str).collect();
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        let bytes = crate::search::search(&mut probe, &refs)?;
        Document::from_owned_bytes(bytes)
    }

    /// Projects this document down to the single value at `path` (a dotted path with no
    /// wildcards), returning [`crate::error::ErrorKind::PathNotFound`] if it does not exist.
    pub fn project(&self, path: &str) -> Result<Document<'static>> {
        let mut probe = Buffer::borrowed(self.buf.as_slice());
        let components = crate::path::split(path);
        let Some((kind, value_pos)) = crate::predicate::navigate(&mut probe, &components)? else {
            return Err(Error::path_not_found());
        };
        probe.move_to(value_pos);
        codec::skip_next(kind, &mut probe)?;
        let end = probe.pos();
        Ok(Document {
            buf: Buffer::copied(&self.buf.as_slice()[value_pos..end]),
        })
    }

    /// Projects this document (which must be an `Array`) down to the single element at `index`.
    pub fn project_index(&self, index: usize) -> Result<Document<'static>> {
        let size = self.get_size() as usize;
        self.get_index(index)
            .map(|child| Document {
                buf: Buffer::copied(child.buf.as_slice()),
            })
            .ok_or(Error::out_of_bounds(index, size))
    }

    /// Structural diff from `self` to `other`; see [`crate::diff`].
    pub fn diff(&self, other: &Document<'_>) -> Result<Vec<DiffEntry>> {
        let mut a = Buffer::borrowed(self.buf.as_slice());
        let mut b = Buffer::borrowed(other.buf.as_slice());
        crate::diff::diff(&mut a, &mut b)
    }

    /// Encodes a diff (see [`crate::diff::compress`]) as a standalone document.
    pub fn compress_diff(entries: &[DiffEntry], write_size: bool) -> Result<Document<'static>> {
        let bytes = crate::diff::compress(entries, write_size)?;
        Ok(Document { buf: Buffer::owned(bytes) })
    }

    /// Inserts or replaces the value at `path`, auto-creating intermediate containers. Requires
    /// this document to own a mutable buffer (`ReadWrite` or `Copy`).
    ///
    /// Returns `false`, leaving the document byte-for-byte unchanged, if the mutation could not
    /// be applied (e.g. the final path component names an unsupported array mutation, or an
    /// internal error occurred); only the document's own construction failures surface as `Err`
    /// elsewhere in this type.
    pub fn insert(&mut self, path: &str, value: &Document<'_>) -> bool {
        crate::merge::insert(&mut self.buf, path, value.as_bytes()).unwrap_or(false)
    }

    /// Adds `amount` to the existing numeric value at `path`, in place. Returns `false`, leaving
    /// the document unchanged, if the path doesn't exist or its value's kind doesn't match
    /// `amount`'s.
    pub fn add(&mut self, path: &str, amount: Amount) -> bool {
        crate::add::add(&mut self.buf, path, amount).is_ok()
    }

    /// Resets this document to an empty `Map`, discarding any prior content.
    pub fn clear(&mut self) -> Result<()> {
        self.buf.move_to(0);
        let current_len = self.buf.size();
        if current_len > 0 {
            self.buf.remove_space(current_len)?;
        }
        let mut w = Writer::new(&mut self.buf);
        w.start_map("")?;
        w.end_map()
    }

    /// Consumes this document, returning its encoded bytes.
    pub fn detach_data(self) -> Vec<u8> {
        self.buf.detach()
    }

    /// Encodes this document in its persisted form: a `u32` length prefix followed by its raw
    /// bytes. A buffer may hold a concatenation of several framed documents; see
    /// [`Document::from_framed_bytes`].
    pub fn to_framed_bytes(&self) -> Vec<u8> {
        let raw = self.as_bytes();
        let mut out = Vec::with_capacity(4 + raw.len());
        out.extend_from_slice(&(raw.len() as u32).to_le_bytes());
        out.extend_from_slice(raw);
        out
    }

    /// Reads one framed document (a `u32` length prefix followed by that many bytes) from the
    /// front of `data`, returning it alongside the number of bytes consumed so the caller can
    /// continue reading further framed documents from the same buffer.
    pub fn from_framed_bytes(data: &'a [u8]) -> Result<(Self, usize)> {
        if data.len() < 4 {
            return Err(Error::corrupt_encoding().with_message("buffer too short for a frame length"));
        }
        let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let end = 4 + len;
        if data.len() < end {
            return Err(Error::corrupt_encoding().with_message("buffer too short for its framed length"));
        }
        let doc = Self::from_bytes(&data[4..end])?;
        Ok((doc, end))
    }
}

impl PartialEq for Document<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.buf.as_slice() == other.buf.as_slice()
    }
}
