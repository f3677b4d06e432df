//! Structural diffing between two documents.
//!
//! Grounded on `DocumentDiffs` (`src/helper.h`): both documents are walked in lock-step, position
//! by position rather than by re-sorting or hash-joining keys. For a `Map`, that means entry `i`
//! of the left side is compared against entry `i` of the right side; as soon as two positions
//! disagree on key, everything from that position onward on the left is reported `Deleted` and
//! everything from that position onward on the right is reported `Added` — no attempt is made to
//! match a moved key back up. This is intentional: reordering a map's keys is observably a
//! delete-then-add, the same as the original, not a bug to paper over with a smarter matcher.
//! Arrays are compared the same way, by index.

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::error::Result;
use crate::writer::Writer;

/// What changed about one path between two documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffKind {
    Modified,
    Deleted,
    Added,
}

impl DiffKind {
    fn as_str(self) -> &'static str {
        match self {
            DiffKind::Modified => "Modified",
            DiffKind::Deleted => "Deleted",
            DiffKind::Added => "Added",
        }
    }
}

/// One recorded change. `data` holds the encoded `<tag><payload>` of the new value for
/// `Modified`/`Added`; it is empty for `Deleted`, since there is nothing left to show.
#[derive(Clone, Debug)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub path: String,
    pub data: Vec<u8>,
}

impl DiffEntry {
    /// Encodes this entry as a small standalone document: `{kind, path, data}`.
    pub fn as_document(&self) -> Result<Vec<u8>> {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("")?;
            w.write_string("kind", self.kind.as_str())?;
            w.write_string("path", &self.path)?;
            if self.data.is_empty() {
                w.write_null("data")?;
            } else {
                w.write_raw_data("data", &self.data)?;
            }
            w.end_map()?;
        }
        Ok(buf.detach())
    }
}

fn join_path(prefix: &str, component: &str) -> String {
    if prefix.is_empty() {
        component.to_string()
    } else {
        format!("{prefix}.{component}")
    }
}

fn read_value_raw(buf: &mut Buffer<'_>, pos: usize) -> Result<(ValueKind, Vec<u8>)> {
    buf.move_to(pos);
    let kind = codec::read_tag(buf)?;
    codec::skip_next(kind, buf)?;
    let raw = buf.as_slice()[pos..buf.pos()].to_vec();
    Ok((kind, raw))
}

fn diff_values(path: &str, a: &mut Buffer<'_>, pos_a: usize, b: &mut Buffer<'_>, pos_b: usize, out: &mut Vec<DiffEntry>) -> Result<()> {
    a.move_to(pos_a);
    let kind_a = codec::read_tag(a)?;
    b.move_to(pos_b);
    let kind_b = codec::read_tag(b)?;

    if kind_a != kind_b {
        let (_, raw_b) = read_value_raw(b, pos_b)?;
        out.push(DiffEntry {
            kind: DiffKind::Modified,
            path: path.to_string(),
            data: raw_b,
        });
        return Ok(());
    }

    match kind_a {
        ValueKind::Map => diff_maps(path, a, pos_a, b, pos_b, out),
        ValueKind::Array => diff_arrays(path, a, pos_a, b, pos_b, out),
        _ => {
            let (_, raw_a) = read_value_raw(a, pos_a)?;
            let (_, raw_b) = read_value_raw(b, pos_b)?;
            if raw_a != raw_b {
                out.push(DiffEntry {
                    kind: DiffKind::Modified,
                    path: path.to_string(),
                    data: raw_b,
                });
            }
            Ok(())
        }
    }
}

fn diff_maps(path: &str, a: &mut Buffer<'_>, pos_a: usize, b: &mut Buffer<'_>, pos_b: usize, out: &mut Vec<DiffEntry>) -> Result<()> {
    a.move_to(pos_a + 1);
    let (_, count_a) = codec::read_container_header(a)?;
    b.move_to(pos_b + 1);
    let (_, count_b) = codec::read_container_header(b)?;

    let mut i = 0u32;
    while i < count_a && i < count_b {
        let key_a = a.read_str()?.to_string();
        let value_pos_a = a.pos();
        let kind_a = codec::read_tag(a)?;
        codec::skip_next(kind_a, a)?;

        let key_b = b.read_str()?.to_string();
        let value_pos_b = b.pos();
        let kind_b = codec::read_tag(b)?;
        codec::skip_next(kind_b, b)?;

        if key_a != key_b {
            break;
        }

        diff_values(&join_path(path, &key_a), a, value_pos_a, b, value_pos_b, out)?;
        i += 1;
    }

    for _ in i..count_a {
        let key_a = a.read_str()?.to_string();
        let kind_a = codec::read_tag(a)?;
        codec::skip_next(kind_a, a)?;
        out.push(DiffEntry {
            kind: DiffKind::Deleted,
            path: join_path(path, &key_a),
            data: Vec::new(),
        });
    }

    for _ in i..count_b {
        let key_b = b.read_str()?.to_string();
        let value_pos_b = b.pos();
        let kind_b = codec::read_tag(b)?;
        codec::skip_next(kind_b, b)?;
        let raw = b.as_slice()[value_pos_b..b.pos()].to_vec();
        out.push(DiffEntry {
            kind: DiffKind::Added,
            path: join_path(path, &key_b),
            data: raw,
        });
    }

    Ok(())
}

fn diff_arrays(path: &str, a: &mut Buffer<'_>, pos_a: usize, b: &mut Buffer<'_>, pos_b: usize, out: &mut Vec<DiffEntry>) -> Result<()> {
    a.move_to(pos_a + 1);
    let (_, count_a) = codec::read_container_header(a)?;
    b.move_to(pos_b + 1);
    let (_, count_b) = codec::read_container_header(b)?;

    let common = count_a.min(count_b);
    for i in 0..common {
        let value_pos_a = a.pos();
        let kind_a = codec::read_tag(a)?;
        codec::skip_next(kind_a, a)?;

        let value_pos_b = b.pos();
        let kind_b = codec::read_tag(b)?;
        codec::skip_next(kind_b, b)?;

        diff_values(&join_path(path, &i.to_string()), a, value_pos_a, b, value_pos_b, out)?;
    }

    for i in common..count_a {
        let kind_a = codec::read_tag(a)?;
        codec::skip_next(kind_a, a)?;
        out.push(DiffEntry {
            kind: DiffKind::Deleted,
            path: join_path(path, &i.to_string()),
            data: Vec::new(),
        });
    }

    for i in common..count_b {
        let value_pos_b = b.pos();
        let kind_b = codec::read_tag(b)?;
        codec::skip_next(kind_b, b)?;
        let raw = b.as_slice()[value_pos_b..b.pos()].to_vec();
        out.push(DiffEntry {
            kind: DiffKind::Added,
            path: join_path(path, &i.to_string()),
            data: raw,
        });
    }

    Ok(())
}

/// Computes the ordered list of changes needed to turn `a` into `b`.
pub fn diff(a: &mut Buffer<'_>, b: &mut Buffer<'_>) -> Result<Vec<DiffEntry>> {
    let mut out = Vec::new();
    diff_values("", a, 0, b, 0, &mut out)?;
    tracing::debug!(target: "wiredoc::diff", entries = out.len(), "computed diff");
    Ok(out)
}

/// Encodes a diff as a single document: an `Array` of [`DiffEntry::as_document`] values. When
/// `write_size` is set, each entry is framed as `Binary` so a reader can skip over entries
/// without decoding their `kind`/`path`/`data` map header, matching the original's
/// `Diff::compress` framing flag.
pub fn compress(entries: &[DiffEntry], write_size: bool) -> Result<Vec<u8>> {
    let mut buf = Buffer::owned(Vec::new());
    {
        let mut w = Writer::new(&mut buf);
        w.start_array("")?;
        for entry in entries {
            let doc_bytes = entry.as_document()?;
            if write_size {
                w.write_binary("", &doc_bytes)?;
            } else {
                w.write_raw_data("", &doc_bytes)?;
            }
        }
        w.end_array()?;
    }
    Ok(buf.detach())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Writer;

    fn doc(build: impl FnOnce(&mut Writer<'_, '_>)) -> Vec<u8> {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            build(&mut w);
        }
        buf.detach()
    }

    #[test]
    fn identical_documents_have_no_diff() {
        let bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.end_map().unwrap();
        });
        let mut a = Buffer::borrowed(&bytes);
        let mut b = Buffer::borrowed(&bytes);
        assert!(diff(&mut a, &mut b).unwrap().is_empty());
    }

    #[test]
    fn changed_scalar_is_modified() {
        let a_bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.end_map().unwrap();
        });
        let b_bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("a", 2).unwrap();
            w.end_map().unwrap();
        });
        let mut a = Buffer::borrowed(&a_bytes);
        let mut b = Buffer::borrowed(&b_bytes);
        let entries = diff(&mut a, &mut b).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::Modified);
        assert_eq!(entries[0].path, "a");
    }

    #[test]
    fn reordered_keys_show_as_delete_and_add() {
        let a_bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.write_integer("b", 2).unwrap();
            w.end_map().unwrap();
        });
        let b_bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("b", 2).unwrap();
            w.write_integer("a", 1).unwrap();
            w.end_map().unwrap();
        });
        let mut a = Buffer::borrowed(&a_bytes);
        let mut b = Buffer::borrowed(&b_bytes);
        let entries = diff(&mut a, &mut b).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.kind == DiffKind::Deleted || e.kind == DiffKind::Added));
    }

    #[test]
    fn added_key_is_reported() {
        let a_bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.end_map().unwrap();
        });
        let b_bytes = doc(|w| {
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.write_integer("b", 2).unwrap();
            w.end_map().unwrap();
        });
        let mut a = Buffer::borrowed(&a_bytes);
        let mut b = Buffer::borrowed(&b_bytes);
        let entries = diff(&mut a, &mut b).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::Added);
        assert_eq!(entries[0].path, "b");
    }
}
