//! Dotted path parsing and wildcard expansion against a document's shape.
//!
//! Grounded on `path_strings`/`path_string` in `src/json.h`: a dotted path like `a.b.*.c` is
//! expanded against the actual shape of a document by walking it, replacing each `*` token with
//! a concrete array index for every element present. The fixed-length-`*` cases are resolved
//! outside of this module (callers already have a decoded element count); what lives here is the
//! pure string manipulation: splitting a path into components, joining components back into a
//! path string, and detecting/substituting the wildcard and append tokens.
//!
//! One deliberate deviation from the original: `path_strings` there joins a leading wildcard
//! substitution with a stray leading `.` (e.g. expanding `*.a` at index `0` produces `.0.a`
//! instead of `0.a`). That was never called out as intentional in the format's documentation, so
//! this version joins components unconditionally with `.` and never produces a leading one.

use crate::codec::APPEND_TOKEN;

/// The wildcard path component, matching every element of an array.
pub const WILDCARD: &str = "*";

/// Splits a dotted path string into its components. An empty string yields zero components,
/// meaning "the document itself".
pub fn split(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Joins path components back into a single dotted string.
pub fn join<'a>(components: impl IntoIterator<Item = &'a str>) -> String {
    components.into_iter().collect::<Vec<_>>().join(".")
}

/// Whether `component` is the wildcard token (`*`).
pub fn is_wildcard(component: &str) -> bool {
    component == WILDCARD
}

/// Whether `component` is the append token (`+`), meaning "a new element past the end of an
/// array" when used as the final component of a merge target path.
pub fn is_append(component: &str) -> bool {
    component == APPEND_TOKEN
}

/// Expands every wildcard component in `path` given a callback that, for a prefix of path
/// components already resolved, returns the number of array elements present at that point (or
/// `None` if the prefix does not resolve to an array, which prunes that branch). Returns every
/// concrete, wildcard-free path reachable by substituting each `*` with a valid index, in
/// depth-first order.
///
/// `size_at` is called with the already-resolved (concrete) prefix, as a slice of components.
pub fn expand_wildcards<'a, F>(path: &'a str, size_at: &mut F) -> Vec<String>
where
    F: FnMut(&[&str]) -> Option<usize>,
{
    let components = split(path);
    let mut out = Vec::new();
    let mut resolved: Vec<String> = Vec::new();
    expand_rec(&components, 0, &mut resolved, size_at, &mut out);
    out
}

fn expand_rec<'a, F>(
    components: &[&'a str],
    index: usize,
    resolved: &mut Vec<String>,
    size_at: &mut F,
    out: &mut Vec<String>,
) where
    F: FnMut(&[&str]) -> Option<usize>,
{
    if index == components.len() {
        out.push(join(resolved.iter().map(String::as_str)));
        return;
    }

    let component = components[index];
    if is_wildcard(component) {
        let refs: Vec<&str> = resolved.iter().map(String::as_str).collect();
        let Some(size) = size_at(&refs) else {
            return;
        };
        for i in 0..size {
            resolved.push(i.to_string());
            expand_rec(components, index + 1, resolved, size_at, out);
            resolved.pop();
        }
    } else {
        resolved.push(component.to_string());
        expand_rec(components, index + 1, resolved, size_at, out);
        resolved.pop();
    }
}
