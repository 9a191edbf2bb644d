//! Source location tracking for the PeopleCode front end
//!
//! Positions carry both a character index and a UTF-8 byte index, because
//! editor-facing consumers disagree on which coordinate system they need:
//! text-buffer protocols want byte offsets, column-based tooling wants
//! character offsets. The two diverge on any non-ASCII input, so both are
//! tracked independently rather than derived from one another.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A position in source text.
///
/// Ordering compares the character index only; equality requires all four
/// fields to match, since a byte index that drifts from its character index
/// indicates a coordinate-tracking bug worth catching in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Character offset from start of input (0-based)
    pub index: usize,
    /// UTF-8 byte offset from start of input (0-based)
    pub byte_index: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number in characters (1-based)
    pub column: u32,
}

impl SourcePosition {
    pub fn new(index: usize, byte_index: usize, line: u32, column: u32) -> Self {
        Self {
            index,
            byte_index,
            line,
            column,
        }
    }

    /// The starting position (index 0, line 1, column 1)
    pub fn start() -> Self {
        Self {
            index: 0,
            byte_index: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advance past one character, keeping both coordinate systems in step
    pub fn advance(self, ch: char) -> Self {
        match ch {
            '\n' => Self {
                index: self.index + 1,
                byte_index: self.byte_index + 1,
                line: self.line + 1,
                column: 1,
            },
            _ => Self {
                index: self.index + 1,
                byte_index: self.byte_index + ch.len_utf8(),
                line: self.line,
                column: self.column + 1,
            },
        }
    }

    /// Advance past every character of a string
    pub fn advance_str(self, s: &str) -> Self {
        s.chars().fold(self, |pos, ch| pos.advance(ch))
    }
}

impl PartialOrd for SourcePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open span of source text from `start` (inclusive) to `end`
/// (exclusive), expressed in both character and byte coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        debug_assert!(start.index <= end.index, "span start must not be after end");
        Self { start, end }
    }

    pub fn start(&self) -> SourcePosition {
        self.start
    }

    pub fn end(&self) -> SourcePosition {
        self.end
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.end.index - self.start.index
    }

    /// Length in UTF-8 bytes
    pub fn byte_len(&self) -> usize {
        self.end.byte_index - self.start.byte_index
    }

    pub fn is_empty(&self) -> bool {
        self.start.index == self.end.index
    }

    /// Hit-test a position against this span
    pub fn contains_position(&self, pos: SourcePosition) -> bool {
        pos.index >= self.start.index && pos.index < self.end.index
    }

    /// Check whether any part of this span lies on the given line
    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start.line && line <= self.end.line
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Self) -> Self {
        let start = if self.start.index < other.start.index {
            self.start
        } else {
            other.start
        };
        let end = if self.end.index > other.end.index {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Get the source text for this span, sliced by byte offsets
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start.byte_index..self.end.byte_index]
    }

    /// An empty span at the start of input, for synthesized nodes
    pub fn dummy() -> Self {
        Self {
            start: SourcePosition::start(),
            end: SourcePosition::start(),
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{}-{}",
                self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_over_multibyte() {
        let pos = SourcePosition::start().advance_str("café");
        assert_eq!(pos.index, 4);
        assert_eq!(pos.byte_index, 5);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.line, 1);
    }

    #[test]
    fn test_advance_over_newline() {
        let pos = SourcePosition::start().advance_str("a\nb");
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.index, 3);
    }

    #[test]
    fn test_equality_requires_all_fields() {
        let a = SourcePosition::new(3, 3, 1, 4);
        let b = SourcePosition::new(3, 5, 1, 4);
        assert_ne!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_span_lengths_diverge_on_multibyte() {
        let source = "a🌟b";
        let start = SourcePosition::start();
        let end = start.advance_str(source);
        let span = SourceSpan::new(start, end);
        assert_eq!(span.len(), 3);
        assert_eq!(span.byte_len(), 6);
        assert_eq!(span.slice(source), source);
    }

    #[test]
    fn test_contains_position_is_half_open() {
        let start = SourcePosition::new(2, 2, 1, 3);
        let end = SourcePosition::new(5, 5, 1, 6);
        let span = SourceSpan::new(start, end);
        assert!(span.contains_position(SourcePosition::new(2, 2, 1, 3)));
        assert!(span.contains_position(SourcePosition::new(4, 4, 1, 5)));
        assert!(!span.contains_position(SourcePosition::new(5, 5, 1, 6)));
    }

    #[test]
    fn test_contains_line() {
        let span = SourceSpan::new(
            SourcePosition::new(0, 0, 2, 1),
            SourcePosition::new(10, 10, 4, 1),
        );
        assert!(span.contains_line(2));
        assert!(span.contains_line(3));
        assert!(span.contains_line(4));
        assert!(!span.contains_line(1));
        assert!(!span.contains_line(5));
    }

    #[test]
    fn test_merge() {
        let a = SourceSpan::new(
            SourcePosition::new(0, 0, 1, 1),
            SourcePosition::new(3, 3, 1, 4),
        );
        let b = SourceSpan::new(
            SourcePosition::new(5, 5, 1, 6),
            SourcePosition::new(8, 8, 1, 9),
        );
        let merged = a.merge(b);
        assert_eq!(merged.start.index, 0);
        assert_eq!(merged.end.index, 8);
    }
}
