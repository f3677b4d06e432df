//! The fixed-width datetime value kind.
//!
//! The wire format stores datetimes as a fixed-width struct of nine signed 32-bit fields
//! mirroring C's `struct tm` (year, month, day, hour, minute, second, weekday, year-day, DST
//! flag) rather than a single epoch timestamp, matching the original `json::Document`'s
//! `tm`-based encoding. `wiredoc` does not pull in a calendar crate for this: none of `time`,
//! `chrono`, or `jiff` model `tm`'s redundant/denormalized fields (wday/yday/isdst) directly, and
//! the wire format intentionally never normalizes them, so a thin, honest struct is clearer than
//! bending an external type to fit.

use crate::error::Result;

/// Width in bytes of the encoded payload: nine `i32` fields.
pub(crate) const ENCODED_LEN: usize = 9 * 4;

/// A calendar datetime value, stored exactly as it round-trips through the wire format.
///
/// No field is validated or normalized against the others (e.g. `wday` is not recomputed from
/// `year`/`month`/`day`); callers that construct one directly are responsible for consistency if
/// they care about it, exactly as the original format allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DateTimeValue {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    pub weekday: i32,
    pub year_day: i32,
    pub is_dst: i32,
}

impl DateTimeValue {
    /// Constructs a value from the calendar fields alone (`weekday`, `year_day`, `is_dst` are
    /// set to `0`).
    pub fn from_ymd_hms(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday: 0,
            year_day: 0,
            is_dst: 0,
        }
    }

    pub(crate) fn decode(buf: &mut crate::buffer::Buffer<'_>) -> Result<Self> {
        Ok(Self {
            year: buf.read_i32()?,
            month: buf.read_i32()?,
            day: buf.read_i32()?,
            hour: buf.read_i32()?,
            minute: buf.read_i32()?,
            second: buf.read_i32()?,
            weekday: buf.read_i32()?,
            year_day: buf.read_i32()?,
            is_dst: buf.read_i32()?,
        })
    }

    pub(crate) fn encode(&self, buf: &mut crate::buffer::Buffer<'_>) -> Result<()> {
        buf.write_i32(self.year)?;
        buf.write_i32(self.month)?;
        buf.write_i32(self.day)?;
        buf.write_i32(self.hour)?;
        buf.write_i32(self.minute)?;
        buf.write_i32(self.second)?;
        buf.write_i32(self.weekday)?;
        buf.write_i32(self.year_day)?;
        buf.write_i32(self.is_dst)
    }
}

impl std::fmt::Display for DateTimeValue {
    /// Renders as `d"YYYY-MM-DD HH:MM:SS"`, matching the text surface in the design.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "d\"{:04}-{:02}-{:02} {:02}:{:02}:{:02}\"",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
