//! Path-filtered document projection.
//!
//! Grounded on `DocumentSearch` (`src/Search.h`): given a set of target paths, walk the document
//! once and produce a new, independent document containing only the values reachable at those
//! paths, reproducing the map/array structure along the way. A value whose path is a strict
//! prefix of some target ("on path") gets its container shell rebuilt and its matching children
//! recursed into; a value whose path exactly equals a target ("on target") is copied wholesale,
//! raw bytes and all, via [`crate::codec::skip_next`] rather than being re-encoded value by
//! value. Everything else is skipped without being copied anywhere.

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::error::Result;
use crate::writer::Writer;

/// Projects `buf` (positioned at the start of a value) down to just the values reachable via
/// `paths` (dotted, concrete — already wildcard-expanded), returning the encoded bytes of a new
/// document holding the projection.
pub fn search(buf: &mut Buffer<'_>, paths: &[&str]) -> Result<Vec<u8>> {
    let targets: Vec<Vec<&str>> = paths.iter().map(|p| crate::path::split(p)).collect();
    let target_refs: Vec<&[&str]> = targets.iter().map(Vec::as_slice).collect();

    let mut out = Buffer::owned(Vec::new());
    {
        let mut writer = Writer::new(&mut out);
        search_value(buf, &mut writer, "", &target_refs)?;
    }
    Ok(out.detach())
}

fn search_value(buf: &mut Buffer<'_>, writer: &mut Writer<'_, '_>, key: &str, targets: &[&[&str]]) -> Result<bool> {
    let tag_pos = buf.pos();
    let kind = codec::read_tag(buf)?;

    if targets.iter().any(|t| t.is_empty()) {
        codec::skip_next(kind, buf)?;
        let raw = buf.as_slice()[tag_pos..buf.pos()].to_vec();
        writer.write_raw_data(key, &raw)?;
        return Ok(true);
    }

    match kind {
        ValueKind::Map => {
            let (_, count) = codec::read_container_header(buf)?;
            writer.start_map(key)?;
            let mut wrote_any = false;
            for _ in 0..count {
                let child_key = buf.read_str()?.to_string();
                let child_targets: Vec<&[&str]> = targets
                    .iter()
                    .filter(|t| !t.is_empty() && t[0] == child_key)
                    .map(|t| &t[1..])
                    .collect();

                if child_targets.is_empty() {
                    let child_kind = codec::read_tag(buf)?;
                    codec::skip_next(child_kind, buf)?;
                } else {
                    wrote_any |= search_value(buf, writer, &child_key, &child_targets)?;
                }
            }
            writer.end_map()?;
            Ok(wrote_any)
        }
        ValueKind::Array => {
            let (_, count) = codec::read_container_header(buf)?;
            writer.start_array(key)?;
            let mut wrote_any = false;
            for i in 0..count {
                let index_str = i.to_string();
                let child_targets: Vec<&[&str]> = targets
                    .iter()
                    .filter(|t| !t.is_empty() && t[0] == index_str)
                    .map(|t| &t[1..])
                    .collect();

                if child_targets.is_empty() {
                    let child_kind = codec::read_tag(buf)?;
                    codec::skip_next(child_kind, buf)?;
                } else {
                    wrote_any |= search_value(buf, writer, "", &child_targets)?;
                }
            }
            writer.end_array()?;
            Ok(wrote_any)
        }
        other => {
            // A target path runs past a scalar's leaves: the path doesn't exist in this
            // document, so nothing is copied.
            codec::skip_next(other, buf)?;
            Ok(false)
        }
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
            w.start_map("a").unwrap();
            w.write_integer("b", 1).unwrap();
            w.write_integer("c", 2).unwrap();
            w.end_map().unwrap();
            w.write_string("d", "hi").unwrap();
            w.end_map().unwrap();
        }
        buf.detach()
    }

    #[test]
    fn keeps_only_requested_leaf() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let projected = search(&mut buf, &["a.b"]).unwrap();

        let doc = Document::from_bytes(&projected).unwrap();
        assert_eq!(doc.get_child("a").unwrap().get_child("b").unwrap().as_integer().unwrap(), 1);
        assert!(doc.get_child("a").unwrap().get_child("c").is_none());
        assert!(doc.get_child("d").is_none());
    }

    #[test]
    fn full_map_target_copies_whole_subtree() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let projected = search(&mut buf, &["a"]).unwrap();

        let doc = Document::from_bytes(&projected).unwrap();
        assert_eq!(doc.get_child("a").unwrap().get_child("c").unwrap().as_integer().unwrap(), 2);
    }

    #[test]
    fn unmatched_path_yields_empty_document() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let projected = search(&mut buf, &["zzz"]).unwrap();

        let doc = Document::from_bytes(&projected).unwrap();
        assert_eq!(doc.get_size(), 0);
    }
}
