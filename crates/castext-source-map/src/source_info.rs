//! Source information attached to template nodes and diagnostics

use crate::types::{FileId, Range};
use crate::utils::{offset_to_location, range_from_offsets};
use serde::{Deserialize, Serialize};

/// A byte range inside one registered source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The source the range belongs to
    pub file_id: FileId,
    /// The range in that source
    pub range: Range,
}

impl SourceInfo {
    /// Create source info from byte offsets, resolving rows and columns
    /// against `source`.
    ///
    /// Offsets past the end of `source` fall back to offset-only locations.
    pub fn from_offsets(file_id: FileId, source: &str, start: usize, end: usize) -> Self {
        let range = match (
            offset_to_location(source, start),
            offset_to_location(source, end),
        ) {
            (Some(start), Some(end)) => Range { start, end },
            _ => range_from_offsets(start, end),
        };
        SourceInfo { file_id, range }
    }

    /// Start byte offset
    pub fn start_offset(&self) -> usize {
        self.range.start.offset
    }

    /// End byte offset (exclusive)
    pub fn end_offset(&self) -> usize {
        self.range.end.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_offsets_resolves_rows() {
        let source = "line one\n{@x@}";
        let info = SourceInfo::from_offsets(FileId(0), source, 9, 14);

        assert_eq!(info.start_offset(), 9);
        assert_eq!(info.end_offset(), 14);
        assert_eq!(info.range.start.row, 1);
        assert_eq!(info.range.start.column, 0);
        assert_eq!(info.range.end.column, 5);
    }

    #[test]
    fn test_from_offsets_out_of_bounds() {
        let info = SourceInfo::from_offsets(FileId(0), "abc", 1, 10);
        assert_eq!(info.start_offset(), 1);
        assert_eq!(info.end_offset(), 10);
        assert_eq!(info.range.start.row, 0);
    }

    #[test]
    fn test_serializes() {
        let info = SourceInfo::from_offsets(FileId(3), "abc", 0, 2);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["file_id"], 3);
        assert_eq!(json["range"]["end"]["offset"], 2);
    }
}
