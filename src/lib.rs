// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

#![doc = include_str!("../README.md")]
#![allow(clippy::cognitive_complexity, clippy::derive_partial_eq_without_eq)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[doc(inline)]
pub use self::{
    add::Amount,
    buffer::{Buffer, DocumentMode},
    codec::ValueKind,
    datetime::DateTimeValue,
    diff::{DiffEntry, DiffKind},
    document::Document,
    error::{Error, ErrorKind, Result},
    predicate::{PathPredicate, Predicate, PredicateValue},
    visit::{Step, Visitor},
    writer::Writer,
};

mod add;
mod buffer;
mod codec;
mod datetime;
mod diff;
pub mod document;
mod error;
mod merge;
pub mod parser;
mod path;
mod predicate;
pub mod printer;
mod search;
mod visit;
pub mod writer;

/// Parses the compact text surface (see [`printer`]) into encoded bytes, as produced by
/// [`printer::render`].
pub fn parse(input: &str) -> Result<Vec<u8>> {
    parser::parse(input)
}
