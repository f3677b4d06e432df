//! The value kind tag and the shared `skip_next` primitive.
//!
//! Grounded on `json::ObjectType` and `DocumentTraversal::skip_next` in the original
//! (`include/json/json.h`, `src/helper.h`). Every traversal engine in this crate (iteration,
//! search, merge, add, diff) is a distinct state machine, but they all reuse this one function
//! to jump over a sub-tree whose kind they've already read and don't care about, which is what
//! gives the format its O(type) skipping: containers carry their own `byte_size` so skipping
//! never requires descending into children.

use crate::buffer::Buffer;
use crate::datetime;
use crate::error::{Error, Result};

/// The closed set of value kinds a [`crate::Document`] can hold. The discriminant is the tag
/// byte stored on the wire, so `ValueKind as u8` and [`ValueKind::try_from`] round-trip.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Map = 0,
    Array = 1,
    String = 2,
    Datetime = 3,
    Integer = 4,
    Float = 5,
    True = 6,
    False = 7,
    Binary = 8,
    Null = 9,
    #[cfg(feature = "geo")]
    Vector2 = 10,
}

impl ValueKind {
    /// A short name used in error messages (`TypeMismatch`).
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Map => "Map",
            ValueKind::Array => "Array",
            ValueKind::String => "String",
            ValueKind::Datetime => "Datetime",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::True => "True",
            ValueKind::False => "False",
            ValueKind::Binary => "Binary",
            ValueKind::Null => "Null",
            #[cfg(feature = "geo")]
            ValueKind::Vector2 => "Vector2",
        }
    }

    /// Whether this kind is `True` or `False` (the boolean values share one accessor).
    pub fn is_boolean(self) -> bool {
        matches!(self, ValueKind::True | ValueKind::False)
    }
}

impl TryFrom<u8> for ValueKind {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => ValueKind::Map,
            1 => ValueKind::Array,
            2 => ValueKind::String,
            3 => ValueKind::Datetime,
            4 => ValueKind::Integer,
            5 => ValueKind::Float,
            6 => ValueKind::True,
            7 => ValueKind::False,
            8 => ValueKind::Binary,
            9 => ValueKind::Null,
            #[cfg(feature = "geo")]
            10 => ValueKind::Vector2,
            _ => {
                tracing::warn!(tag, "unrecognized value tag byte");
                return Err(Error::corrupt_encoding().with_message(format!("unknown tag byte {tag}")));
            }
        })
    }
}

/// Width, in bytes, of the fixed-size payload of the two numeric scalar kinds.
pub(crate) const INTEGER_LEN: usize = 8;
pub(crate) const FLOAT_LEN: usize = 8;

/// Reads the tag byte at the cursor and advances past it.
pub(crate) fn read_tag(buf: &mut Buffer<'_>) -> Result<ValueKind> {
    ValueKind::try_from(buf.read_u8()?)
}

/// Advances `buf`'s cursor past the payload of a value of kind `kind`, assuming the cursor is
/// positioned immediately after that value's tag byte. This is the one place that knows the
/// on-wire width of every kind; every traversal engine calls this to skip a sub-tree it has
/// already decided it doesn't need to look inside.
pub(crate) fn skip_next(kind: ValueKind, buf: &mut Buffer<'_>) -> Result<()> {
    match kind {
        ValueKind::Null | ValueKind::True | ValueKind::False => Ok(()),
        ValueKind::Integer => {
            buf.move_by(INTEGER_LEN as i64);
            Ok(())
        }
        ValueKind::Float => {
            buf.move_by(FLOAT_LEN as i64);
            Ok(())
        }
        ValueKind::Datetime => {
            buf.move_by(datetime::ENCODED_LEN as i64);
            Ok(())
        }
        ValueKind::Binary | ValueKind::String | ValueKind::Map | ValueKind::Array => {
            let byte_size = buf.read_u32()?;
            buf.move_by(byte_size as i64);
            Ok(())
        }
        #[cfg(feature = "geo")]
        ValueKind::Vector2 => {
            buf.move_by(16);
            Ok(())
        }
    }
}

/// The path component that means "append a new element" when targeting an array in
/// [`crate::merge`].
pub(crate) const APPEND_TOKEN: &str = "+";

/// Map keys must be non-empty ASCII alphanumerics/`_`. The wire format itself does not enforce
/// this (any length-prefixed byte string decodes); the writer and merger do, per the data model.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Reads a container's `byte_size` and `count` header, leaving the cursor positioned at the
/// first child (or at the end of the container if `count == 0`).
pub(crate) fn read_container_header(buf: &mut Buffer<'_>) -> Result<(u32, u32)> {
    let byte_size = buf.read_u32()?;
    let count = buf.read_u32()?;
    Ok((byte_size, count))
}

/// Backpatches a container header at `start` (the position immediately after the tag byte, i.e.
/// where `byte_size` is stored) once its true extent is known. `end` is the buffer's current
/// cursor, which is restored afterwards.
pub(crate) fn backpatch_container_header(buf: &mut Buffer<'_>, start: usize, count: u32) -> Result<()> {
    let end = buf.pos();
    let byte_size = (end - start - 4) as u32;
    buf.move_to(start);
    buf.write_u32(byte_size)?;
    buf.write_u32(count)?;
    buf.move_to(end);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips() {
        for kind in [
            ValueKind::Map,
            ValueKind::Array,
            ValueKind::String,
            ValueKind::Datetime,
            ValueKind::Integer,
            ValueKind::Float,
            ValueKind::True,
            ValueKind::False,
            ValueKind::Binary,
            ValueKind::Null,
        ] {
            assert_eq!(ValueKind::try_from(kind as u8).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_corrupt_encoding() {
        assert!(ValueKind::try_from(200).unwrap_err().is_corrupt_encoding());
    }

    #[test]
    fn skip_next_integer_advances_fixed_width() {
        let mut buf = Buffer::owned(vec![0u8; INTEGER_LEN + 1]);
        skip_next(ValueKind::Integer, &mut buf).unwrap();
        assert_eq!(buf.pos(), INTEGER_LEN);
    }

    #[test]
    fn key_validity() {
        assert!(is_valid_key("abc_123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a.b"));
        assert!(!is_valid_key("+"));
    }

    #[test]
    fn skip_next_string_uses_byte_size_header() {
        let mut buf = Buffer::owned(Vec::new());
        buf.write_u32(5).unwrap();
        buf.write_raw(b"hello").unwrap();
        buf.move_to(0);
        skip_next(ValueKind::String, &mut buf).unwrap();
        assert!(buf.at_end());
    }
}
