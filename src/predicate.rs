//! Path-predicate matching, used to filter a set of documents by value.
//!
//! Grounded on `PredicateChecker` (`src/Iterator.cpp`): rather than looking up each path
//! independently, the checker walks the whole document once via the shared [`crate::visit::walk`]
//! engine, pushing the current value's key/index onto a path stack on the way into a Map/Array
//! (or a scalar) and popping it back off on the way out — the original's `push_path`/`push_key`/
//! `pop_path` bookkeeping. A predicate is satisfied the moment some scalar's current path matches
//! its pattern (`*` matching any single component) and the operator accepts the value found
//! there; `$in` is the original's only operator (`mode()` returning `IN`/`NORMAL`), `$lt`/`$gte`/
//! plain equality (`Normal`) are design content built in the same shape.

use crate::buffer::Buffer;
use crate::codec::{self, ValueKind};
use crate::error::Result;
use crate::path;
use crate::visit::{self, Step, Visitor};

/// A scalar literal used as an operand in a [`Predicate`].
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateValue {
    Integer(i64),
    Float(f64),
    String(String),
}

/// An operator applied to the value found at a path.
#[derive(Clone, Debug)]
pub enum Predicate {
    /// The value equals the literal exactly.
    Normal(PredicateValue),
    /// The value equals one of the given literals.
    In(Vec<PredicateValue>),
    /// The value is numerically less than the literal.
    Lt(PredicateValue),
    /// The value is numerically greater than or equal to the literal.
    Gte(PredicateValue),
}

/// One `path` / `predicate` pair. A document satisfies it if at least one concrete path reached
/// by expanding `*` in `path` exists and satisfies `predicate`.
#[derive(Clone, Debug)]
pub struct PathPredicate {
    pub path: String,
    pub predicate: Predicate,
}

fn as_f64(value: &PredicateValue) -> Option<f64> {
    match value {
        PredicateValue::Integer(i) => Some(*i as f64),
        PredicateValue::Float(f) => Some(*f),
        PredicateValue::String(_) => None,
    }
}

fn evaluate(predicate: &Predicate, found: &PredicateValue) -> bool {
    match predicate {
        Predicate::Normal(want) => want == found,
        Predicate::In(values) => values.contains(found),
        Predicate::Lt(bound) => match (as_f64(found), as_f64(bound)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        Predicate::Gte(bound) => match (as_f64(found), as_f64(bound)) {
            (Some(a), Some(b)) => a >= b,
            _ => false,
        },
    }
}

/// Whether a wildcard-bearing pattern (already split into components) matches a concrete path
/// (components seen so far while walking), `*` matching any single component.
fn pattern_matches(pattern: &[&str], current: &[String]) -> bool {
    pattern.len() == current.len()
        && pattern.iter().zip(current.iter()).all(|(p, c)| path::is_wildcard(p) || *p == c.as_str())
}

/// Drives [`crate::visit::walk`] over a document, tracking the dotted path to the value currently
/// being visited and marking off each [`PathPredicate`] the moment some value along the walk
/// satisfies it.
struct PredicateChecker<'p> {
    predicates: &'p [PathPredicate],
    patterns: Vec<Vec<&'p str>>,
    path_stack: Vec<String>,
    depth: usize,
    satisfied: Vec<bool>,
}

impl<'p> PredicateChecker<'p> {
    fn new(predicates: &'p [PathPredicate]) -> Self {
        let patterns = predicates.iter().map(|p| path::split(&p.path)).collect();
        Self {
            predicates,
            patterns,
            path_stack: Vec::new(),
            depth: 0,
            satisfied: vec![false; predicates.len()],
        }
    }

    fn push_path(&mut self, key: &str, index: usize) {
        let component = if key.is_empty() { index.to_string() } else { key.to_string() };
        self.path_stack.push(component);
    }

    fn pop_path(&mut self) {
        self.path_stack.pop();
    }

    fn enter(&mut self, key: &str, index: usize) {
        if self.depth > 0 {
            self.push_path(key, index);
        }
        self.depth += 1;
    }

    fn exit(&mut self) {
        self.depth -= 1;
        if self.depth > 0 {
            self.pop_path();
        }
    }

    fn check_scalar(&mut self, key: &str, index: usize, value: PredicateValue) {
        self.enter(key, index);
        for (i, pattern) in self.patterns.iter().enumerate() {
            if !self.satisfied[i] && pattern_matches(pattern, &self.path_stack) && evaluate(&self.predicates[i].predicate, &value) {
                self.satisfied[i] = true;
            }
        }
        self.exit();
    }

    fn all_satisfied(&self) -> bool {
        self.satisfied.iter().all(|&b| b)
    }
}

impl Visitor for PredicateChecker<'_> {
    fn handle_map_start(&mut self, key: &str, index: usize, _count: u32) -> Step {
        self.enter(key, index);
        Step::Continue
    }

    fn handle_map_end(&mut self, _key: &str, _index: usize) {
        self.exit();
    }

    fn handle_array_start(&mut self, key: &str, index: usize, _count: u32) -> Step {
        self.enter(key, index);
        Step::Continue
    }

    fn handle_array_end(&mut self, _key: &str, _index: usize) {
        self.exit();
    }

    fn handle_string(&mut self, key: &str, index: usize, value: &str) {
        self.check_scalar(key, index, PredicateValue::String(value.to_string()));
    }

    fn handle_integer(&mut self, key: &str, index: usize, value: i64) {
        self.check_scalar(key, index, PredicateValue::Integer(value));
    }

    fn handle_float(&mut self, key: &str, index: usize, value: f64) {
        self.check_scalar(key, index, PredicateValue::Float(value));
    }
}

/// Returns `true` if `buf` (a document) satisfies every predicate in `predicates`.
pub fn matches(buf: &mut Buffer<'_>, predicates: &[PathPredicate]) -> Result<bool> {
    if predicates.is_empty() {
        return Ok(true);
    }
    let mut checker = PredicateChecker::new(predicates);
    visit::walk(buf, &mut checker, "", 0)?;
    Ok(checker.all_satisfied())
}

/// Walks `components` (a dotted path already split, no wildcards) from the document root,
/// returning the kind and tag-byte position of the value found, or `None` if the path does not
/// exist. Shared by [`crate::document::Document::project`] and [`crate::document::Document::search`].
pub(crate) fn navigate(buf: &mut Buffer<'_>, components: &[&str]) -> Result<Option<(ValueKind, usize)>> {
    let mut pos = 0usize;
    let mut remaining = components;

    loop {
        buf.move_to(pos);
        let kind = codec::read_tag(buf)?;

        let Some((component, rest)) = remaining.split_first() else {
            return Ok(Some((kind, pos)));
        };

        match kind {
            ValueKind::Map => {
                let (_, count) = codec::read_container_header(buf)?;
                let mut found = None;
                for _ in 0..count {
                    let key = buf.read_str()?.to_string();
                    let value_pos = buf.pos();
                    let child_kind = codec::read_tag(buf)?;
                    codec::skip_next(child_kind, buf)?;
                    if key == *component {
                        found = Some(value_pos);
                        break;
                    }
                }
                match found {
                    Some(value_pos) => {
                        pos = value_pos;
                        remaining = rest;
                    }
                    None => return Ok(None),
                }
            }
            ValueKind::Array => {
                let Ok(index) = component.parse::<usize>() else {
                    return Ok(None);
                };
                let (_, count) = codec::read_container_header(buf)?;
                if index >= count as usize {
                    return Ok(None);
                }
                let mut value_pos = buf.pos();
                for i in 0..=index {
                    value_pos = buf.pos();
                    let child_kind = codec::read_tag(buf)?;
                    codec::skip_next(child_kind, buf)?;
                    let _ = i;
                }
                pos = value_pos;
                remaining = rest;
            }
            _ => return Ok(None),
        }
    }
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
            w.write_integer("age", 30).unwrap();
            w.start_array("scores").unwrap();
            w.write_integer("", 10).unwrap();
            w.write_integer("", 99).unwrap();
            w.end_array().unwrap();
            w.end_map().unwrap();
        }
        buf.detach()
    }

    #[test]
    fn in_matches_exact_value() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let predicates = vec![PathPredicate {
            path: "age".to_string(),
            predicate: Predicate::In(vec![PredicateValue::Integer(30)]),
        }];
        assert!(matches(&mut buf, &predicates).unwrap());
    }

    #[test]
    fn gte_rejects_lower_value() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let predicates = vec![PathPredicate {
            path: "age".to_string(),
            predicate: Predicate::Gte(PredicateValue::Integer(40)),
        }];
        assert!(!matches(&mut buf, &predicates).unwrap());
    }

    #[test]
    fn wildcard_is_existential_over_array() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let predicates = vec![PathPredicate {
            path: "scores.*".to_string(),
            predicate: Predicate::Lt(PredicateValue::Integer(20)),
        }];
        assert!(matches(&mut buf, &predicates).unwrap());
    }

    #[test]
    fn missing_path_fails() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let predicates = vec![PathPredicate {
            path: "missing".to_string(),
            predicate: Predicate::In(vec![PredicateValue::Integer(1)]),
        }];
        assert!(!matches(&mut buf, &predicates).unwrap());
    }

    #[test]
    fn normal_matches_any_wildcard_element() {
        // {"a": [1, 3, 4]} against {"a.*": 3} (plain equality, not $in/$lt/$gte).
        let mut buf = Buffer::owned(Vec::new());
        {
            let mut w = Writer::new(&mut buf);
            w.start_map("").unwrap();
            w.start_array("a").unwrap();
            w.write_integer("", 1).unwrap();
            w.write_integer("", 3).unwrap();
            w.write_integer("", 4).unwrap();
            w.end_array().unwrap();
            w.end_map().unwrap();
        }
        let bytes = buf.detach();
        let mut buf = Buffer::borrowed(&bytes);
        let predicates = vec![PathPredicate {
            path: "a.*".to_string(),
            predicate: Predicate::Normal(PredicateValue::Integer(3)),
        }];
        assert!(matches(&mut buf, &predicates).unwrap());
    }

    #[test]
    fn normal_rejects_when_no_element_matches() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        let predicates = vec![PathPredicate {
            path: "age".to_string(),
            predicate: Predicate::Normal(PredicateValue::Integer(31)),
        }];
        assert!(!matches(&mut buf, &predicates).unwrap());
    }

    #[test]
    fn empty_predicate_list_always_matches() {
        let bytes = sample();
        let mut buf = Buffer::borrowed(&bytes);
        assert!(matches(&mut buf, &[]).unwrap());
    }
}
