//! In-place numeric increment at a dotted path.
//!
//! Grounded on `DocumentAdd` (`src/helper.h`): unlike [`crate::merge`], `add` never changes any
//! value's byte length — `Integer` and `Float` are both fixed-width — so no ancestor's
//! `byte_size` ever needs backpatching. The existing value's kind must match the kind of the
//! increment being applied; the original's `parse_next` rejects adding a float to an integer (or
//! vice versa) rather than silently coercing.

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::error::{Error, Result};

/// The amount to add, carrying its own kind so a mismatch against the existing value is rejected
/// rather than silently coerced.
#[derive(Clone, Copy, Debug)]
pub enum Amount {
    Integer(i64),
    Float(f64),
}

fn add_at(buf: &mut Buffer<'_>, container_pos: usize, path: &[&str], amount: Amount) -> Result<()> {
    let Some((component, rest)) = path.split_first() else {
        return Err(Error::path_not_found());
    };

    buf.move_to(container_pos);
    let kind = codec::read_tag(buf)?;
    let (_, count) = codec::read_container_header(buf)?;
    let data_start = buf.pos();

    match kind {
        ValueKind::Map => {
            buf.move_to(data_start);
            for _ in 0..count {
                let key = buf.read_str()?.to_string();
                let value_pos = buf.pos();
                let value_kind = codec::read_tag(buf)?;
                codec::skip_next(value_kind, buf)?;

                if key == component {
                    return apply_or_recurse(buf, value_pos, value_kind, rest, amount);
                }
            }
        }
        ValueKind::Array => {
            let index: usize = component.parse().map_err(|_| Error::path_not_found())?;
            buf.move_to(data_start);
            for i in 0..count {
                let value_pos = buf.pos();
                let value_kind = codec::read_tag(buf)?;
                codec::skip_next(value_kind, buf)?;

                if i as usize == index {
                    return apply_or_recurse(buf, value_pos, value_kind, rest, amount);
                }
            }
        }
        other => return Err(Error::type_mismatch("Map or Array", other.name())),
    }

    Err(Error::path_not_found())
}

fn apply_or_recurse(
    buf: &mut Buffer<'_>,
    value_pos: usize,
    value_kind: ValueKind,
    rest: &[&str],
    amount: Amount,
) -> Result<()> {
    if rest.is_empty() {
        return apply(buf, value_pos, value_kind, amount);
    }
    add_at(buf, value_pos, rest, amount)
}

fn apply(buf: &mut Buffer<'_>, value_pos: usize, value_kind: ValueKind, amount: Amount) -> Result<()> {
    match (value_kind, amount) {
        (ValueKind::Integer, Amount::Integer(delta)) => {
            buf.move_to(value_pos);
            let existing = buf.read_i64()?;
            buf.move_to(value_pos);
            buf.write_i64(existing.wrapping_add(delta))
        }
        (ValueKind::Float, Amount::Float(delta)) => {
            buf.move_to(value_pos);
            let existing = buf.read_f64()?;
            buf.move_to(value_pos);
            buf.write_f64(existing + delta)
        }
        (found, _) => Err(Error::type_mismatch(
            match amount {
                Amount::Integer(_) => "Integer",
                Amount::Float(_) => "Float",
            },
            found.name(),
        )),
    }
}

/// Adds `amount` to the existing numeric value at `path` (dotted, non-empty), in place. The
/// existing value's kind must match `amount`'s kind. `buf` must be positioned so its start is the
/// root value's tag byte.
pub fn add(buf: &mut Buffer<'_>, path: &str, amount: Amount) -> Result<()> {
    tracing::debug!(target: "wiredoc::add", path, ?amount, "applying numeric increment");
    let components = crate::path::split(path);
    if components.is_empty() {
        return Err(Error::unsupported_mode("cannot add at an empty path"));
    }
    add_at(buf, 0, &components, amount)
}
