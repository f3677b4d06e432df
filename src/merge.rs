//! In-place insertion/replacement at a dotted path, auto-creating intermediate containers.
//!
//! Grounded on `DocumentMerger` (`src/helper.h`): `parse_map`/`parse_array` walk the existing
//! structure one path component at a time. A component that names an existing child recurses (or,
//! at the last component, replaces that child's bytes outright); a component with no existing
//! child auto-creates the rest of the path as freshly built nested containers. The `+` token
//! always appends a new array element rather than looking one up. Every insertion/replacement
//! changes the byte length of some sub-tree, so each level backpatches its own `byte_size` (and,
//! if it gained a direct child, its `count`) with the delta before returning that same delta to
//! its caller — the same "backpatch ancestors on unwind" discipline the writer uses, just driven
//! bottom-up instead of via an explicit stack.

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::error::{Error, Result};

/// The result of attempting a merge at one level of the structure.
enum Outcome {
    /// The mutation was applied; `delta` is the signed byte-length change the caller must fold
    /// into its own `byte_size`, and `gained_entry` is whether the caller's own direct child
    /// count increased by one.
    Applied { delta: i64, gained_entry: bool },
    /// Nothing was mutated. Returned instead of an error when the final path component names a
    /// mutation the target doesn't support (an array's final component that isn't `+`).
    NoMatch,
}

fn is_array_component(component: &str) -> bool {
    crate::path::is_append(component) || component.parse::<usize>().is_ok()
}

/// Builds the wire bytes for a fresh value at the end of `remaining`, wrapping `leaf` in freshly
/// built Map/Array containers for every component still in `remaining`.
fn build_value(remaining: &[&str], leaf: &[u8]) -> Vec<u8> {
    let Some((next, rest)) = remaining.split_first() else {
        return leaf.to_vec();
    };

    let inner = build_value(rest, leaf);

    // `byte_size` counts everything after its own 4-byte field, which includes the 4-byte
    // `count` field written right after it — see `codec::backpatch_container_header`.
    if is_array_component(next) {
        let mut out = vec![ValueKind::Array as u8];
        out.extend_from_slice(&((4 + inner.len()) as u32).to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&inner);
        out
    } else {
        let mut key_bytes = Vec::new();
        key_bytes.extend_from_slice(&(next.len() as u32).to_le_bytes());
        key_bytes.extend_from_slice(next.as_bytes());

        let mut out = vec![ValueKind::Map as u8];
        out.extend_from_slice(&((4 + key_bytes.len() + inner.len()) as u32).to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&key_bytes);
        out.extend_from_slice(&inner);
        out
    }
}

fn build_entry(key: &str, remaining: &[&str], leaf: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(key.len() as u32).to_le_bytes());
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&build_value(remaining, leaf));
    out
}

/// Replaces the `old_len` bytes of an existing value at `value_pos` with `new_bytes`, returning
/// the signed byte delta.
fn replace_span(buf: &mut Buffer<'_>, value_pos: usize, old_len: usize, new_bytes: &[u8]) -> Result<i64> {
    buf.move_to(value_pos);
    match new_bytes.len().cmp(&old_len) {
        std::cmp::Ordering::Greater => buf.make_space(new_bytes.len() - old_len)?,
        std::cmp::Ordering::Less => buf.remove_space(old_len - new_bytes.len())?,
        std::cmp::Ordering::Equal => {}
    }
    buf.move_to(value_pos);
    buf.write_raw(new_bytes)?;
    Ok(new_bytes.len() as i64 - old_len as i64)
}

fn insert_span(buf: &mut Buffer<'_>, at: usize, bytes: &[u8]) -> Result<()> {
    buf.move_to(at);
    buf.make_space(bytes.len())?;
    buf.move_to(at);
    buf.write_raw(bytes)
}

/// Inserts or replaces the value at `path` within the container whose tag byte is at
/// `container_pos`. Returns the signed byte delta the caller (the enclosing container, if any)
/// must add to its own `byte_size`.
fn merge_at(buf: &mut Buffer<'_>, container_pos: usize, path: &[&str], leaf: &[u8]) -> Result<Outcome> {
    let Some((component, rest)) = path.split_first() else {
        return Err(Error::unsupported_mode("merge path must have at least one component"));
    };

    buf.move_to(container_pos);
    let kind = codec::read_tag(buf)?;
    let header_pos = buf.pos();
    let (byte_size, count) = codec::read_container_header(buf)?;
    let data_start = buf.pos();
    // `byte_size` is measured from just past its own field, so it already includes the 4 bytes
    // of `count` that were just read along with it.
    let data_end = data_start + byte_size as usize - 4;

    let outcome = match kind {
        ValueKind::Map => merge_map(buf, data_start, data_end, count, component, rest, leaf)?,
        ValueKind::Array => merge_array(buf, data_start, data_end, count, component, rest, leaf)?,
        other => {
            return Err(Error::type_mismatch("Map or Array", other.name()));
        }
    };

    let Outcome::Applied { delta, gained_entry } = outcome else {
        return Ok(Outcome::NoMatch);
    };

    let new_count = if gained_entry { count + 1 } else { count };
    let new_byte_size = (byte_size as i64 + delta) as u32;
    buf.move_to(header_pos);
    buf.write_u32(new_byte_size)?;
    buf.write_u32(new_count)?;
    Ok(Outcome::Applied { delta, gained_entry: false })
}

#[allow(clippy::too_many_arguments)]
fn merge_map(
    buf: &mut Buffer<'_>,
    data_start: usize,
    data_end: usize,
    count: u32,
    component: &str,
    rest: &[&str],
    leaf: &[u8],
) -> Result<Outcome> {
    buf.move_to(data_start);
    for _ in 0..count {
        let key = buf.read_str()?.to_string();
        let value_pos = buf.pos();
        let value_kind = codec::read_tag(buf)?;
        codec::skip_next(value_kind, buf)?;
        let value_end = buf.pos();

        if key == component {
            return if rest.is_empty() {
                let delta = replace_span(buf, value_pos, value_end - value_pos, leaf)?;
                Ok(Outcome::Applied { delta, gained_entry: false })
            } else {
                match merge_at(buf, value_pos, rest, leaf)? {
                    Outcome::Applied { delta, .. } => Ok(Outcome::Applied { delta, gained_entry: false }),
                    Outcome::NoMatch => Ok(Outcome::NoMatch),
                }
            };
        }
    }

    // No existing entry named `component`: this always inserts a fresh key (there is no
    // "replace by key" ambiguity left to resolve), but only if `component` is actually a valid
    // map key — `+` and anything else the writer would reject must not silently corrupt the map.
    if !codec::is_valid_key(component) {
        return Err(Error::invalid_key(component));
    }

    let entry = build_entry(component, rest, leaf);
    insert_span(buf, data_end, &entry)?;
    Ok(Outcome::Applied { delta: entry.len() as i64, gained_entry: true })
}

#[allow(clippy::too_many_arguments)]
fn merge_array(
    buf: &mut Buffer<'_>,
    data_start: usize,
    data_end: usize,
    count: u32,
    component: &str,
    rest: &[&str],
    leaf: &[u8],
) -> Result<Outcome> {
    if crate::path::is_append(component) {
        let value = build_value(rest, leaf);
        insert_span(buf, data_end, &value)?;
        return Ok(Outcome::Applied { delta: value.len() as i64, gained_entry: true });
    }

    if rest.is_empty() {
        // The only supported mutation on an array is append (`+`). Any other final path
        // component (a numeric index or anything else) leaves the array untouched.
        return Ok(Outcome::NoMatch);
    }

    let index: usize = component
        .parse()
        .map_err(|_| Error::unsupported_mode(format!("\"{component}\" is not a valid array index")))?;

    buf.move_to(data_start);
    for i in 0..count {
        let value_pos = buf.pos();
        let value_kind = codec::read_tag(buf)?;
        codec::skip_next(value_kind, buf)?;

        if i as usize == index {
            return match merge_at(buf, value_pos, rest, leaf)? {
                Outcome::Applied { delta, .. } => Ok(Outcome::Applied { delta, gained_entry: false }),
                Outcome::NoMatch => Ok(Outcome::NoMatch),
            };
        }
    }

    Err(Error::out_of_bounds(index, count as usize))
}

/// Inserts or replaces the value at `path` (dotted, non-empty; `+` as a final component appends
/// to an array), auto-creating any intermediate Maps/Arrays the path doesn't yet traverse.
/// `leaf` is the complete encoded `<tag><payload>` of the value to store. `buf` must be
/// positioned so that its start is the root value's tag byte.
///
/// Returns `false` (leaving `buf` byte-for-byte unchanged) when the final path component names
/// an unsupported array mutation — anything other than `+`. Any other failure (an invalid map
/// key, an out-of-bounds intermediate index, a type mismatch) is reported as `Err`.
pub fn insert(buf: &mut Buffer<'_>, path: &str, leaf: &[u8]) -> Result<bool> {
    tracing::debug!(target: "wiredoc::merge", path, bytes = leaf.len(), "inserting value");
    let components = crate::path::split(path);
    if components.is_empty() {
        return Err(Error::unsupported_mode("cannot merge into an empty path"));
    }
    match merge_at(buf, 0, &components, leaf)? {
        Outcome::Applied { .. } => Ok(true),
        Outcome::NoMatch => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::writer::Writer;

    fn sample() -> Vec<u8> {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.start_array("list").unwrap();
            w.write_integer("", 10).unwrap();
            w.write_integer("", 20).unwrap();
            w.end_array().unwrap();
            w.end_map().unwrap();
        }
        buf.detach()
    }

    fn encode_integer(value: i64) -> Vec<u8> {
        let mut buf = Buffer::owned(Vec::new());
        buf.write_u8(ValueKind::Integer as u8).unwrap();
        buf.write_i64(value).unwrap();
        buf.detach()
    }

    #[test]
    fn replaces_existing_scalar() {
        let mut bytes = sample();
        {
            let mut buf = Buffer::owned(std::mem::take(&mut bytes));
            insert(&mut buf, "a", &encode_integer(99)).unwrap();
            bytes = buf.detach();
        }
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.get_child("a").unwrap().as_integer().unwrap(), 99);
    }

    #[test]
    fn auto_creates_missing_intermediate_map() {
        let mut bytes = sample();
        {
            let mut buf = Buffer::owned(std::mem::take(&mut bytes));
            insert(&mut buf, "nested.leaf", &encode_integer(7)).unwrap();
            bytes = buf.detach();
        }
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.get_child("nested").unwrap().get_child("leaf").unwrap().as_integer().unwrap(), 7);
        assert_eq!(doc.get_child("a").unwrap().as_integer().unwrap(), 1);
    }

    #[test]
    fn append_token_grows_array() {
        let mut bytes = sample();
        {
            let mut buf = Buffer::owned(std::mem::take(&mut bytes));
            insert(&mut buf, "list.+", &encode_integer(30)).unwrap();
            bytes = buf.detach();
        }
        let doc = Document::from_bytes(&bytes).unwrap();
        let list = doc.get_child("list").unwrap();
        assert_eq!(list.get_size(), 3);
        assert_eq!(list.get_index(2).unwrap().as_integer().unwrap(), 30);
    }

    #[test]
    fn numeric_index_on_array_is_unsupported_and_leaves_buffer_untouched() {
        let mut bytes = sample();
        let original = bytes.clone();
        let applied = {
            let mut buf = Buffer::owned(std::mem::take(&mut bytes));
            let applied = insert(&mut buf, "list.0", &encode_integer(999)).unwrap();
            bytes = buf.detach();
            applied
        };
        assert!(!applied);
        assert_eq!(bytes, original);
    }

    #[test]
    fn rejects_invalid_map_key_without_mutating() {
        // {"a": [4, 3, 2], "b": {}} — "+" is not a valid map key, so inserting at "b.+" must
        // fail rather than silently adding a literal "+" entry to the empty map.
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.start_array("a").unwrap();
            w.write_integer("", 4).unwrap();
            w.write_integer("", 3).unwrap();
            w.write_integer("", 2).unwrap();
            w.end_array().unwrap();
            w.start_map("b").unwrap();
            w.end_map().unwrap();
            w.end_map().unwrap();
        }
        let bytes = buf.detach();
        let original = bytes.clone();

        let mut buf = Buffer::owned(bytes);
        assert!(insert(&mut buf, "b.+", &encode_integer(23)).is_err());
        assert_eq!(buf.as_slice(), original.as_slice());
    }

    #[test]
    fn out_of_range_nested_index_errors() {
        let mut bytes = sample();
        let mut buf = Buffer::owned(std::mem::take(&mut bytes));
        assert!(insert(&mut buf, "list.9.leaf", &encode_integer(1)).is_err());
    }
}
