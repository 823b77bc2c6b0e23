//! Compiled patterns and match results.
//!
//! All offsets are byte offsets into the haystack.

use std::ops::Range;

use regex::{Captures, Regex, RegexBuilder};

use crate::translate::{translate, CaptureKind};
use crate::PatternError;

/// A compiled pattern.
#[derive(Clone, Debug)]
pub struct LuaPattern {
    source: Box<str>,
    regex: Regex,
    captures: Vec<CaptureKind>,
}

/// One capture of a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capture {
    Text(Range<usize>),
    Position(usize),
}

impl Capture {
    /// Captured text, `None` for position captures.
    pub fn text<'h>(&self, haystack: &'h str) -> Option<&'h str> {
        match self {
            Capture::Text(range) => haystack.get(range.clone()),
            Capture::Position(_) => None,
        }
    }
}

/// A successful match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMatch {
    /// The whole match.
    pub range: Range<usize>,
    /// Explicit captures, in order. Empty when the pattern has none.
    pub captures: Vec<Capture>,
}

impl PatternMatch {
    /// The captures, or the whole match as a single capture when the
    /// pattern has no captures of its own.
    pub fn values(&self) -> Vec<Capture> {
        if self.captures.is_empty() {
            vec![Capture::Text(self.range.clone())]
        } else {
            self.captures.clone()
        }
    }
}

impl LuaPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let translation = translate(pattern)?;
        let regex = RegexBuilder::new(&translation.regex)
            .dot_matches_new_line(true)
            .build()
            .map_err(|err| PatternError::Regex(err.to_string()))?;
        Ok(LuaPattern {
            source: pattern.into(),
            regex,
            captures: translation.captures,
        })
    }

    /// Pattern text as given to `new`.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    /// First match starting at or after byte offset `start`.
    ///
    /// The haystack is sliced at `start`, so a leading `^` anchors there.
    /// Returns `None` when `start` is past the end or not on a char boundary.
    pub fn match_at(&self, haystack: &str, start: usize) -> Option<PatternMatch> {
        let tail = haystack.get(start..)?;
        let caps = self.regex.captures(tail)?;
        self.to_match(&caps, start)
    }

    /// First match at or after byte offset `start`, searching the whole
    /// haystack so a leading `^` still anchors at offset 0.
    pub fn find_at(&self, haystack: &str, start: usize) -> Option<PatternMatch> {
        if start > haystack.len() || !haystack.is_char_boundary(start) {
            return None;
        }
        let caps = self.regex.captures_at(haystack, start)?;
        self.to_match(&caps, 0)
    }

    /// All non-overlapping matches, left to right.
    pub fn matches<'p, 'h>(&'p self, haystack: &'h str) -> Matches<'p, 'h> {
        Matches {
            pattern: self,
            inner: self.regex.captures_iter(haystack),
        }
    }

    fn to_match(&self, caps: &Captures<'_>, offset: usize) -> Option<PatternMatch> {
        let whole = caps.get(0)?;
        let start = whole.start() + offset;
        let captures = self
            .captures
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let group = caps.get(i + 1);
                match kind {
                    CaptureKind::Position => {
                        Capture::Position(group.map_or(start, |m| m.start() + offset))
                    }
                    CaptureKind::Text => Capture::Text(
                        group.map_or(start..start, |m| m.start() + offset..m.end() + offset),
                    ),
                }
            })
            .collect();
        Some(PatternMatch {
            range: start..whole.end() + offset,
            captures,
        })
    }
}

/// Iterator returned by [`LuaPattern::matches`].
pub struct Matches<'p, 'h> {
    pattern: &'p LuaPattern,
    inner: regex::CaptureMatches<'p, 'h>,
}

impl Iterator for Matches<'_, '_> {
    type Item = PatternMatch;

    fn next(&mut self) -> Option<PatternMatch> {
        let caps = self.inner.next()?;
        self.pattern.to_match(&caps, 0)
    }
}
