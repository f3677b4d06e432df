//! The depth-first traversal engine shared by printing, searching, and predicate matching.
//!
//! Grounded on `IterationEngine` (`src/Iterator.cpp`): rather than a virtual `handle_*` dispatch
//! per value kind, callers implement the [`Visitor`] trait and the engine drives it, reading one
//! tag at a time and calling back into whichever method matches. Containers get an
//! enter/exit pair around their children so a visitor can track nesting (the original's
//! `push_key`/`pop_path` bookkeeping in `PredicateChecker`).

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::datetime::DateTimeValue;
use crate::error::Result;

/// What a [`Visitor`] wants the engine to do after visiting one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Continue descending into a container's children (ignored for scalars).
    Continue,
    /// Skip this value's children (for a container) or simply move on (for a scalar), without
    /// further callbacks for anything nested inside it.
    Skip,
}

/// A callback interface driven by [`walk`] as it depth-first traverses a document's bytes.
///
/// Every method has a default no-op/`Continue` implementation so visitors only override what
/// they care about, mirroring how the original's various traversal subclasses only specialize a
/// handful of `handle_*` methods each.
pub trait Visitor {
    /// Called for every value before its kind-specific handler, with the key it is stored under
    /// (empty for array elements and the document root) and its zero-based index within the
    /// enclosing container (`0` for the root).
    fn enter_value(&mut self, _key: &str, _index: usize, _kind: ValueKind) {}

    fn handle_map_start(&mut self, _key: &str, _index: usize, _count: u32) -> Step {
        Step::Continue
    }
    fn handle_map_end(&mut self, _key: &str, _index: usize) {}

    fn handle_array_start(&mut self, _key: &str, _index: usize, _count: u32) -> Step {
        Step::Continue
    }
    fn handle_array_end(&mut self, _key: &str, _index: usize) {}

    fn handle_string(&mut self, _key: &str, _index: usize, _value: &str) {}
    fn handle_integer(&mut self, _key: &str, _index: usize, _value: i64) {}
    fn handle_float(&mut self, _key: &str, _index: usize, _value: f64) {}
    fn handle_boolean(&mut self, _key: &str, _index: usize, _value: bool) {}
    fn handle_datetime(&mut self, _key: &str, _index: usize, _value: &DateTimeValue) {}
    fn handle_binary(&mut self, _key: &str, _index: usize, _value: &[u8]) {}
    fn handle_null(&mut self, _key: &str, _index: usize) {}
    #[cfg(feature = "geo")]
    fn handle_vector2(&mut self, _key: &str, _index: usize, _x: f64, _y: f64) {}
}

/// Walks one value at the buffer's current cursor, calling back into `visitor`. On return, the
/// cursor is positioned immediately past the value, regardless of whether the visitor asked to
/// descend into it.
pub fn walk<V: Visitor>(buf: &mut Buffer<'_>, visitor: &mut V, key: &str, index: usize) -> Result<()> {
    let kind = codec::read_tag(buf)?;
    visitor.enter_value(key, index, kind);

    match kind {
        ValueKind::Map => {
            let start = buf.pos();
            let (byte_size, count) = codec::read_container_header(buf)?;
            let end = start + 4 + byte_size as usize;
            match visitor.handle_map_start(key, index, count) {
                Step::Continue => {
                    for i in 0..count {
                        let child_key = buf.read_str()?.to_string();
                        walk(buf, visitor, &child_key, i as usize)?;
                    }
                    visitor.handle_map_end(key, index);
                }
                Step::Skip => buf.move_to(end),
            }
        }
        ValueKind::Array => {
            let start = buf.pos();
            let (byte_size, count) = codec::read_container_header(buf)?;
            let end = start + 4 + byte_size as usize;
            match visitor.handle_array_start(key, index, count) {
                Step::Continue => {
                    for i in 0..count {
                        walk(buf, visitor, "", i as usize)?;
                    }
                    visitor.handle_array_end(key, index);
                }
                Step::Skip => buf.move_to(end),
            }
        }
        ValueKind::String => {
            let value = buf.read_str()?.to_string();
            visitor.handle_string(key, index, &value);
        }
        ValueKind::Integer => {
            let value = buf.read_i64()?;
            visitor.handle_integer(key, index, value);
        }
        ValueKind::Float => {
            let value = buf.read_f64()?;
            visitor.handle_float(key, index, value);
        }
        ValueKind::True => visitor.handle_boolean(key, index, true),
        ValueKind::False => visitor.handle_boolean(key, index, false),
        ValueKind::Datetime => {
            let value = DateTimeValue::decode(buf)?;
            visitor.handle_datetime(key, index, &value);
        }
        ValueKind::Binary => {
            let len = buf.read_u32()? as usize;
            let data = buf.read_raw(len)?.to_vec();
            visitor.handle_binary(key, index, &data);
        }
        ValueKind::Null => visitor.handle_null(key, index),
        #[cfg(feature = "geo")]
        ValueKind::Vector2 => {
            let x = buf.read_f64()?;
            let y = buf.read_f64()?;
            visitor.handle_vector2(key, index, x, y);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Writer;

    #[derive(Default)]
    struct Collector {
        integers: Vec<i64>,
        strings: Vec<String>,
        map_entries: u32,
    }

    impl Visitor for Collector {
        fn handle_map_start(&mut self, _key: &str, _index: usize, count: u32) -> Step {
            self.map_entries = count;
            Step::Continue
        }

        fn handle_integer(&mut self, _key: &str, _index: usize, value: i64) {
            self.integers.push(value);
        }

        fn handle_string(&mut self, _key: &str, _index: usize, value: &str) {
            self.strings.push(value.to_string());
        }
    }

    #[test]
    fn walks_a_map_of_scalars() {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.write_string("b", "hi").unwrap();
            w.write_integer("c", 2).unwrap();
            w.end_map().unwrap();
        }

        buf.move_to(0);
        let mut collector = Collector::default();
        walk(&mut buf, &mut collector, "", 0).unwrap();
        assert_eq!(collector.map_entries, 3);
        assert_eq!(collector.integers, vec![1, 2]);
        assert_eq!(collector.strings, vec!["hi".to_string()]);
        assert!(buf.at_end());
    }

    #[test]
    fn skip_leaves_cursor_past_the_container() {
        struct SkipAll;
        impl Visitor for SkipAll {
            fn handle_map_start(&mut self, _key: &str, _index: usize, _count: u32) -> Step {
                Step::Skip
            }
        }

        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.end_map().unwrap();
        }

        buf.move_to(0);
        walk(&mut buf, &mut SkipAll, "", 0).unwrap();
        assert!(buf.at_end());
    }
}
