//! A hand-written recursive-descent parser from the text surface (the grammar
//! [`crate::printer`] renders) back into the binary wire format.
//!
//! The original only specifies this surface at the interface level (`src/Parser.h` carries no
//! implementation in the retrieved source) — this is a fresh implementation of that interface,
//! built to accept exactly what `printer::render` produces: `{key: value, ...}` maps,
//! `[value, ...]` arrays, quoted strings, `b'<hex>'` binary literals, `d"YYYY-MM-DD HH:MM:SS"`
//! datetimes, `true`/`false`/`null`, and plain integer/float literals.

use crate::buffer::Buffer;
use crate::datetime::DateTimeValue;
use crate::error::{Error, Result};
use crate::writer::Writer;

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.bump() == Some(byte) {
            Ok(())
        } else {
            Err(parse_error(format!("expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self, w: &mut Writer<'_, '_>, key: &str) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.parse_map(w, key),
            Some(b'[') => self.parse_array(w, key),
            Some(b'"') => {
                let s = self.parse_quoted()?;
                w.write_string(key, &s)
            }
            Some(b'd') if self.input[self.pos..].starts_with(b"d\"") => self.parse_datetime(w, key),
            Some(b'b') if self.input[self.pos..].starts_with(b"b'") => self.parse_binary(w, key),
            Some(b't') if self.input[self.pos..].starts_with(b"true") => {
                self.pos += 4;
                w.write_boolean(key, true)
            }
            Some(b'f') if self.input[self.pos..].starts_with(b"false") => {
                self.pos += 5;
                w.write_boolean(key, false)
            }
            Some(b'n') if self.input[self.pos..].starts_with(b"null") => {
                self.pos += 4;
                w.write_null(key)
            }
            Some(c) if c == b'-' || c.is_ascii_digit() => self.parse_number(w, key),
            _ => Err(parse_error("expected a value")),
        }
    }

    fn parse_map(&mut self, w: &mut Writer<'_, '_>, key: &str) -> Result<()> {
        self.expect(b'{')?;
        w.start_map(key)?;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return w.end_map();
        }
        loop {
            self.skip_ws();
            let field = self.parse_ident()?;
            self.skip_ws();
            self.expect(b':')?;
            self.parse_value(w, &field)?;
            self.skip_ws();
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => break,
                _ => return Err(parse_error("expected ',' or '}'")),
            }
        }
        w.end_map()
    }

    fn parse_array(&mut self, w: &mut Writer<'_, '_>, key: &str) -> Result<()> {
        self.expect(b'[')?;
        w.start_array(key)?;
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return w.end_array();
        }
        loop {
            self.parse_value(w, "")?;
            self.skip_ws();
            match self.bump() {
                Some(b',') => continue,
                Some(b']') => break,
                _ => return Err(parse_error("expected ',' or ']'")),
            }
        }
        w.end_array()
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(parse_error("expected a map key"));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    Some(b'"') => s.push('"'),
                    Some(b'\\') => s.push('\\'),
                    Some(b'n') => s.push('\n'),
                    Some(b't') => s.push('\t'),
                    _ => return Err(parse_error("invalid escape sequence")),
                },
                Some(c) => s.push(c as char),
                None => return Err(parse_error("unterminated string")),
            }
        }
        Ok(s)
    }

    fn parse_number(&mut self, w: &mut Writer<'_, '_>, key: &str) -> Result<()> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        if is_float {
            let value: f64 = text.parse().map_err(|_| parse_error("invalid float literal"))?;
            w.write_float(key, value)
        } else {
            let value: i64 = text.parse().map_err(|_| parse_error("invalid integer literal"))?;
            w.write_integer(key, value)
        }
    }

    fn parse_binary(&mut self, w: &mut Writer<'_, '_>, key: &str) -> Result<()> {
        self.pos += 1; // 'b'
        self.expect(b'\'')?;
        let start = self.pos;
        while self.peek() != Some(b'\'') {
            if self.bump().is_none() {
                return Err(parse_error("unterminated binary literal"));
            }
        }
        let hex_text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        self.pos += 1; // closing '
        let bytes = hex::decode(hex_text).map_err(|_| parse_error("invalid hex in binary literal"))?;
        w.write_binary(key, &bytes)
    }

    fn parse_datetime(&mut self, w: &mut Writer<'_, '_>, key: &str) -> Result<()> {
        self.pos += 1; // 'd'
        let s = self.parse_quoted()?;
        let (date, time) = s.split_once(' ').ok_or_else(|| parse_error("malformed datetime literal"))?;
        let mut date_parts = date.split('-');
        let mut time_parts = time.split(':');
        let (year, month, day) = (
            next_int(&mut date_parts)?,
            next_int(&mut date_parts)?,
            next_int(&mut date_parts)?,
        );
        let (hour, minute, second) = (
            next_int(&mut time_parts)?,
            next_int(&mut time_parts)?,
            next_int(&mut time_parts)?,
        );
        w.write_datetime(key, &DateTimeValue::from_ymd_hms(year, month, day, hour, minute, second))
    }
}

fn next_int<'a>(it: &mut impl Iterator<Item = &'a str>) -> Result<i32> {
    it.next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| parse_error("malformed datetime literal"))
}

fn parse_error(message: impl ToString) -> Error {
    Error::corrupt_encoding().with_message(message)
}

/// Parses `input` as a single text-surface value and returns its encoded wire bytes.
pub fn parse(input: &str) -> Result<Vec<u8>> {
    let mut buf = Buffer::owned(Vec::new());
    {
        let mut writer = Writer::new(&mut buf);
        let mut parser = Parser::new(input);
        parser.parse_value(&mut writer, "")?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parse_error("trailing input after value"));
        }
    }
    Ok(buf.detach())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn parses_a_map_with_mixed_values() {
        let bytes = parse(r#"{a: 1, b: "hi", c: [1, 2, 3], d: true, e: null}"#).unwrap();
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.get_child("a").unwrap().as_integer().unwrap(), 1);
        assert_eq!(doc.get_child("b").unwrap().as_string().unwrap(), "hi");
        assert_eq!(doc.get_child("c").unwrap().get_size(), 3);
        assert!(doc.get_child("d").unwrap().as_boolean().unwrap());
        assert!(doc.get_child("e").unwrap().is_null());
    }

    #[test]
    fn parses_binary_and_datetime_literals() {
        let bytes = parse(r#"{x: b'deadbeef', t: d"2024-03-09 08:07:06"}"#).unwrap();
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.get_child("x").unwrap().as_binary().unwrap(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(doc.get_child("t").unwrap().as_datetime().unwrap().year, 2024);
    }

    #[test]
    fn round_trips_through_the_printer() {
        let bytes = parse(r#"{a: 1, b: [2, 3]}"#).unwrap();
        let mut buf = Buffer::borrowed(&bytes);
        let rendered = crate::printer::render(&mut buf, false).unwrap();
        assert_eq!(rendered, "{a: 1, b: [2, 3]}");
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("1 2").is_err());
    }
}
