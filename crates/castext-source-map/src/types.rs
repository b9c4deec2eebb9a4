//! Core types for source locations

use serde::{Deserialize, Serialize};

/// A unique identifier for a registered source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

/// A range in source text from start to end
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    /// Start location (inclusive)
    pub start: Location,
    /// End location (exclusive)
    pub end: Location,
}

impl Range {
    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(offset: usize, row: usize, column: usize) -> Location {
        Location {
            offset,
            row,
            column,
        }
    }

    #[test]
    fn test_location_ordering() {
        assert!(loc(0, 0, 0) < loc(5, 0, 5));
        assert!(loc(5, 0, 5) < loc(10, 1, 0));
    }

    #[test]
    fn test_range_len() {
        let range = Range {
            start: loc(2, 0, 2),
            end: loc(6, 0, 6),
        };
        assert_eq!(range.len(), 4);
        assert!(!range.is_empty());
    }

    #[test]
    fn test_empty_range() {
        let range = Range::default();
        assert!(range.is_empty());
    }
}
