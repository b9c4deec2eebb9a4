//! Structured diagnostic messages for CASText.
//!
//! Every problem found while parsing, validating or expanding a template is
//! recorded as a [`DiagnosticMessage`]: an error code from the catalog, a
//! short title, an optional problem statement, detail bullets, hints and the
//! source location in the template.
//!
//! Messages render three ways:
//!
//! - plain text in tidyverse style ([`DiagnosticMessage::to_text`])
//! - a source snippet via ariadne when a [`castext_source_map::SourceContext`]
//!   is supplied
//! - JSON for machine consumers ([`DiagnosticMessage::to_json`])
//!
//! # Example
//!
//! ```
//! use castext_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("If-block needs a test attribute.")
//!     .with_code("C-1-6")
//!     .add_hint("Write the block as [[ if test=\"...\" ]]?")
//!     .build();
//!
//! assert!(error.to_text(None).contains("If-block needs a test attribute."));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
