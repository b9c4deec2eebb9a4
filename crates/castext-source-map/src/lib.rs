//! Source locations for CASText.
//!
//! Templates are single strings, so a location is a byte range in one
//! registered source plus row/column information for human-readable output.
//!
//! # Overview
//!
//! - [`SourceInfo`]: a range in a registered source
//! - [`SourceContext`]: the registered sources, used when rendering snippets
//! - [`offset_to_location`]: byte offset to row/column conversion
//!
//! # Example
//!
//! ```rust
//! use castext_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! let file_id = ctx.add_file("question.txt".into(), "Hello {@x@}".into());
//!
//! let info = SourceInfo::from_offsets(file_id, "Hello {@x@}", 6, 11);
//! assert_eq!(info.start_offset(), 6);
//! assert_eq!(info.range.start.column, 6);
//! ```

pub mod context;
pub mod source_info;
pub mod types;
pub mod utils;

pub use context::{SourceContext, SourceFile};
pub use source_info::SourceInfo;
pub use types::{FileId, Location, Range};
pub use utils::{offset_to_location, range_from_offsets};
