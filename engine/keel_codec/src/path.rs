//! Location of a value inside the graph being encoded or decoded.
//!
//! Paths are linked through the call stack and only rendered when an error
//! is reported, e.g. `Book.trades[2].legs{usd}.notional`.

use std::fmt;

#[derive(Copy, Clone, Debug)]
pub(crate) enum Segment<'a> {
    Root(&'a str),
    Field(&'a str),
    Index(usize),
    Entry(&'a str),
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Path<'a> {
    parent: Option<&'a Path<'a>>,
    segment: Segment<'a>,
}

impl<'a> Path<'a> {
    pub(crate) fn root(name: &'a str) -> Self {
        Path {
            parent: None,
            segment: Segment::Root(name),
        }
    }

    pub(crate) fn field(&'a self, name: &'a str) -> Path<'a> {
        self.child(Segment::Field(name))
    }

    pub(crate) fn index(&'a self, index: usize) -> Path<'a> {
        self.child(Segment::Index(index))
    }

    pub(crate) fn entry(&'a self, key: &'a str) -> Path<'a> {
        self.child(Segment::Entry(key))
    }

    fn child(&'a self, segment: Segment<'a>) -> Path<'a> {
        Path {
            parent: Some(self),
            segment,
        }
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent {
            write!(f, "{parent}")?;
        }
        match self.segment {
            Segment::Root(name) => f.write_str(name),
            Segment::Field(name) => write!(f, ".{name}"),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Entry(key) => write!(f, "{{{key}}}"),
        }
    }
}
