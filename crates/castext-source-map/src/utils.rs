//! Utility functions for working with source positions

use crate::types::{Location, Range};

/// Convert a byte offset to a Location with line and column info
///
/// Returns None if the offset is out of bounds.
pub fn offset_to_location(source: &str, offset: usize) -> Option<Location> {
    if offset > source.len() {
        return None;
    }

    let mut row = 0;
    let mut column = 0;
    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            row += 1;
            column = 0;
        } else {
            column += 1;
        }
    }

    Some(Location {
        offset,
        row,
        column,
    })
}

/// Create a Range from start and end byte offsets
///
/// Rows and columns are left at 0; use `offset_to_location` for full info.
pub fn range_from_offsets(start: usize, end: usize) -> Range {
    Range {
        start: Location {
            offset: start,
            row: 0,
            column: 0,
        },
        end: Location {
            offset: end,
            row: 0,
            column: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_location() {
        let source = "ab\ncd\u{e9}f";
        assert_eq!(offset_to_location(source, 0).unwrap().column, 0);

        let loc = offset_to_location(source, 4).unwrap();
        assert_eq!((loc.row, loc.column), (1, 1));

        // 'é' is two bytes but one column
        let loc = offset_to_location(source, 7).unwrap();
        assert_eq!((loc.row, loc.column), (1, 3));

        assert!(offset_to_location(source, 100).is_none());
    }

    #[test]
    fn test_range_from_offsets() {
        let range = range_from_offsets(3, 8);
        assert_eq!(range.start.offset, 3);
        assert_eq!(range.end.offset, 8);
        assert_eq!(range.len(), 5);
    }
}
