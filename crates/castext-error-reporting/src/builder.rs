//! Builder API for diagnostic messages.
//!
//! The builder encodes the tidyverse structure: a title, an optional problem
//! statement, error and info detail bullets and hints.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
use castext_source_map::SourceInfo;

/// Builder for [`DiagnosticMessage`].
///
/// ```
/// use castext_error_reporting::{DiagnosticKind, DiagnosticMessageBuilder};
///
/// let msg = DiagnosticMessageBuilder::error("Iteration length mismatch")
///     .with_code("C-3-4")
///     .problem("Parallel foreach sources must have the same length")
///     .add_detail("`I` has 3 elements")
///     .add_detail("`K` has 4 elements")
///     .build();
///
/// assert_eq!(msg.kind, DiagnosticKind::Error);
/// assert_eq!(msg.details.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    /// Start an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Start a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Set the catalog error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement.
    pub fn problem(mut self, problem: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail bullet.
    pub fn add_detail(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    /// Add an error detail bullet pointing at a location.
    pub fn add_detail_at(self, detail: impl Into<MessageContent>, location: SourceInfo) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    /// Add an info detail bullet.
    pub fn add_info(self, info: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Info, info.into(), None)
    }

    /// Add a hint. Hints are phrased as questions.
    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    /// Set the main location.
    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    /// Finish the message.
    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: MessageContent,
        location: Option<SourceInfo>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castext_source_map::FileId;

    #[test]
    fn test_builder_sets_every_field() {
        let location = SourceInfo::from_offsets(FileId(0), "{@2*@}", 0, 6);
        let msg = DiagnosticMessageBuilder::warning("Careful")
            .with_code("C-2-3")
            .problem("Something is off")
            .add_detail("detail")
            .add_detail_at("located", location.clone())
            .add_info("info")
            .add_hint("Try again?")
            .with_location(location.clone())
            .build();

        assert_eq!(msg.kind, DiagnosticKind::Warning);
        assert_eq!(msg.code.as_deref(), Some("C-2-3"));
        assert_eq!(msg.problem.as_ref().map(|p| p.as_str()), Some("Something is off"));
        assert_eq!(msg.details.len(), 3);
        assert_eq!(msg.details[1].location, Some(location.clone()));
        assert_eq!(msg.details[2].kind, DetailKind::Info);
        assert_eq!(msg.hints.len(), 1);
        assert_eq!(msg.location, Some(location));
    }
}
