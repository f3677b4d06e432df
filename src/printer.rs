//! Renders a document as compact or indented text.
//!
//! Grounded on `Printer` (`src/Iterator.cpp`): a [`crate::visit::Visitor`] that tracks nesting
//! depth and, for maps, whether the enclosing container is empty, to decide where commas and
//! newlines go. Binary values render as `b'<hex>'`; datetimes render via
//! [`crate::datetime::DateTimeValue`]'s own `Display` (`d"YYYY-MM-DD HH:MM:SS"`), matching the
//! text surface the format's hand-written parser would accept back.

use crate::buffer::Buffer;
use crate::codec::ValueKind;
use crate::datetime::DateTimeValue;
use crate::error::Result;
use crate::visit::{self, Step, Visitor};

struct Printer {
    out: String,
    pretty: bool,
    depth: usize,
    counts: Vec<u32>,
}

impl Printer {
    fn new(pretty: bool) -> Self {
        Self {
            out: String::new(),
            pretty,
            depth: 0,
            counts: Vec::new(),
        }
    }

    fn indent(&mut self) {
        if self.pretty {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        }
    }

    fn before_value(&mut self, key: &str, index: usize) {
        if index > 0 {
            self.out.push(',');
            if !self.pretty {
                self.out.push(' ');
            }
        }
        if self.pretty && !(index == 0 && self.depth == 0) {
            self.indent();
        }
        if !key.is_empty() {
            self.out.push_str(key);
            self.out.push_str(": ");
        }
    }

    fn enter_container(&mut self, open: char, key: &str, index: usize, count: u32) {
        self.before_value(key, index);
        self.out.push(open);
        self.counts.push(count);
        self.depth += 1;
    }

    fn exit_container(&mut self, close: char) {
        self.depth -= 1;
        let count = self.counts.pop().unwrap_or(0);
        if count > 0 {
            self.indent();
        }
        self.out.push(close);
    }

    fn hex_binary(data: &[u8]) -> String {
        let mut s = String::with_capacity(data.len() * 2 + 3);
        s.push_str("b'");
        s.push_str(&hex::encode(data));
        s.push('\'');
        s
    }
}

impl Visitor for Printer {
    fn handle_map_start(&mut self, key: &str, index: usize, count: u32) -> Step {
        self.enter_container('{', key, index, count);
        Step::Continue
    }

    fn handle_map_end(&mut self, _key: &str, _index: usize) {
        self.exit_container('}');
    }

    fn handle_array_start(&mut self, key: &str, index: usize, count: u32) -> Step {
        self.enter_container('[', key, index, count);
        Step::Continue
    }

    fn handle_array_end(&mut self, _key: &str, _index: usize) {
        self.exit_container(']');
    }

    fn handle_string(&mut self, key: &str, index: usize, value: &str) {
        self.before_value(key, index);
        self.out.push('"');
        self.out.push_str(&value.replace('\\', "\\\\").replace('"', "\\\""));
        self.out.push('"');
    }

    fn handle_integer(&mut self, key: &str, index: usize, value: i64) {
        self.before_value(key, index);
        self.out.push_str(&value.to_string());
    }

    fn handle_float(&mut self, key: &str, index: usize, value: f64) {
        self.before_value(key, index);
        self.out.push_str(&value.to_string());
    }

    fn handle_boolean(&mut self, key: &str, index: usize, value: bool) {
        self.before_value(key, index);
        self.out.push_str(if value { "true" } else { "false" });
    }

    fn handle_datetime(&mut self, key: &str, index: usize, value: &DateTimeValue) {
        self.before_value(key, index);
        self.out.push_str(&value.to_string());
    }

    fn handle_binary(&mut self, key: &str, index: usize, value: &[u8]) {
        self.before_value(key, index);
        self.out.push_str(&Self::hex_binary(value));
    }

    fn handle_null(&mut self, key: &str, index: usize) {
        self.before_value(key, index);
        self.out.push_str("null");
    }

    #[cfg(feature = "geo")]
    fn handle_vector2(&mut self, key: &str, index: usize, x: f64, y: f64) {
        self.before_value(key, index);
        self.out.push_str(&format!("v({x}, {y})"));
    }
}

/// Renders the value at `buf`'s current position as text; `pretty` selects multi-line, indented
/// output over a single compact line.
pub fn render(buf: &mut Buffer<'_>, pretty: bool) -> Result<String> {
    let mut printer = Printer::new(pretty);
    visit::walk(buf, &mut printer, "", 0)?;
    Ok(printer.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Writer;

    fn sample() -> Vec<u8> {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.write_integer("a", 1).unwrap();
            w.start_array("b").unwrap();
            w.write_integer("", 2).unwrap();
            w.write_integer("", 3).unwrap();
            w.end_array().unwrap();
            w.end_map().unwrap();
        }
        buf.detach()
    }

    #[test]
    fn compact_render_has_no_newlines() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let rendered = render(&mut buf, false).unwrap();
        assert_eq!(rendered, "{a: 1, b: [2, 3]}");
    }

    #[test]
    fn pretty_render_is_indented() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let rendered = render(&mut buf, true).unwrap();
        assert!(rendered.contains('\n'));
        assert!(rendered.starts_with('{'));
        assert!(rendered.trim_end().ends_with('}'));
    }

    #[test]
    fn binary_renders_as_hex_literal() {
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.write_binary("", &[0xde, 0xad, 0xbe, 0xef]).unwrap();
        }
        let bytes = buf.detach();
        let mut buf = Buffer::borrowed(&bytes);
        assert_eq!(render(&mut buf, false).unwrap(), "b'deadbeef'");
    }
}
