//! Core diagnostic message types.
//!
//! This module defines the structures for representing diagnostic messages
//! (errors, warnings, info) following tidyverse-style guidelines.

use castext_source_map::{SourceContext, SourceInfo};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// An error; the template fails validation
    Error,
    /// A problem that does not fail validation
    Warning,
    /// Informational message
    Info,
    /// A note providing additional context
    Note,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
            DiagnosticKind::Note => "Note",
        }
    }
}

/// How detail items should be presented (tidyverse x/i bullet style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (i bullet)
    Info,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
        }
    }
}

/// The content of a message or detail item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Plain text content
    Plain(String),
    /// Markdown content; inline code spans mark expressions
    Markdown(String),
}

impl MessageContent {
    /// Get the raw string content for display
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(s) => s,
            MessageContent::Markdown(s) => s,
        }
    }

    /// Convert to JSON value with type information
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            MessageContent::Plain(s) => json!({
                "type": "plain",
                "content": s
            }),
            MessageContent::Markdown(s) => json!({
                "type": "markdown",
                "content": s
            }),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Markdown(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Markdown(s.to_string())
    }
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    /// The kind of detail (error, info, note)
    pub kind: DetailKind,
    /// The content of the detail
    pub content: MessageContent,
    /// Optional source location for this detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A diagnostic message following tidyverse-style structure.
///
/// Structure:
/// 1. **Code**: Optional error code (e.g., "C-1-6") from the catalog
/// 2. **Title**: Brief error message
/// 3. **Kind**: Error, Warning, Info
/// 4. **Problem**: What went wrong
/// 5. **Details**: Specific information (bulleted)
/// 6. **Hints**: Optional guidance for fixing (ends with ?)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Optional error code (e.g., "C-1-6")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Brief title for the error
    pub title: String,

    /// The kind of diagnostic (Error, Warning, Info)
    pub kind: DiagnosticKind,

    /// The problem statement
    pub problem: Option<MessageContent>,

    /// Specific error details
    pub details: Vec<DetailItem>,

    /// Optional hints for fixing (ends with ?)
    pub hints: Vec<MessageContent>,

    /// Location in the template the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    ///
    /// Note: Consider using [`crate::DiagnosticMessageBuilder`] instead.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Create a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Create an info diagnostic.
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    /// Set the error code.
    ///
    /// ```
    /// use castext_error_reporting::DiagnosticMessage;
    ///
    /// let msg = DiagnosticMessage::error("Unclosed block").with_code("C-1-2");
    /// assert_eq!(msg.code.as_deref(), Some("C-1-2"));
    /// ```
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this diagnostic fails validation.
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Render this diagnostic message as text following tidyverse style.
    ///
    /// Format:
    /// ```text
    /// Error [C-2-2]: title
    /// Problem statement here
    /// ✖ Error detail
    /// ℹ Info detail
    /// ? Hint
    /// ```
    ///
    /// When `ctx` is given and the diagnostic has a location in one of its
    /// sources, the header is replaced by an ariadne source snippet.
    ///
    /// ```
    /// use castext_error_reporting::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::error("Invalid input")
    ///     .problem("Values must be numeric")
    ///     .add_detail("Found text in the test attribute")
    ///     .add_hint("Use is(...) to compare?")
    ///     .build();
    /// let text = msg.to_text(None);
    /// assert!(text.contains("Error: Invalid input"));
    /// assert!(text.contains("Values must be numeric"));
    /// ```
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        let mut result = String::new();

        let snippet = match (ctx, &self.location) {
            (Some(ctx), Some(location)) => self.render_ariadne_source_context(location, ctx),
            _ => None,
        };

        match snippet {
            Some(snippet) => {
                result.push_str(&snippet);
                // ariadne shows the title, code and located details
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    writeln!(result, "{} {}", detail.kind.bullet(), detail.content.as_str()).unwrap();
                }
            }
            None => {
                match &self.code {
                    Some(code) => {
                        writeln!(result, "{} [{}]: {}", self.kind.label(), code, self.title).unwrap();
                    }
                    None => {
                        writeln!(result, "{}: {}", self.kind.label(), self.title).unwrap();
                    }
                }
                if let Some(problem) = &self.problem {
                    writeln!(result, "{}", problem.as_str()).unwrap();
                }
                for detail in &self.details {
                    writeln!(result, "{} {}", detail.kind.bullet(), detail.content.as_str()).unwrap();
                }
            }
        }

        for hint in &self.hints {
            writeln!(result, "? {}", hint.as_str()).unwrap();
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// ```
    /// use castext_error_reporting::DiagnosticMessage;
    ///
    /// let msg = DiagnosticMessage::error("Something went wrong");
    /// let json = msg.to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut obj = json!({
            "kind": self.kind.label().to_lowercase(),
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }

        if let Some(problem) = &self.problem {
            obj["problem"] = problem.to_json();
        }

        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let detail_kind = match d.kind {
                        DetailKind::Error => "error",
                        DetailKind::Info => "info",
                    };
                    let mut detail_obj = json!({
                        "kind": detail_kind,
                        "content": d.content.to_json()
                    });
                    if let Some(location) = &d.location {
                        detail_obj["location"] = json!(location);
                    }
                    detail_obj
                })
                .collect();
            obj["details"] = json!(details);
        }

        if !self.hints.is_empty() {
            let hints: Vec<_> = self.hints.iter().map(|h| h.to_json()).collect();
            obj["hints"] = json!(hints);
        }

        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        obj
    }

    /// Render the source snippet for `location` using ariadne.
    fn render_ariadne_source_context(
        &self,
        location: &SourceInfo,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file = ctx.get_file(location.file_id)?;
        let content = file.content.as_str();

        // ariadne spans count characters, locations count bytes
        let to_char = |offset: usize| content.get(..offset).map(|s| s.chars().count());
        let start = to_char(location.start_offset())?;
        let end = to_char(location.end_offset())?;

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let mut report = Report::build(report_kind, file.path.clone(), start)
            .with_config(Config::default().with_color(false));

        report = match &self.code {
            Some(code) => report.with_message(format!("[{}] {}", code, self.title)),
            None => report.with_message(&self.title),
        };

        let main_message = self
            .problem
            .as_ref()
            .map_or(self.title.as_str(), |p| p.as_str());
        report = report.with_label(
            Label::new((file.path.clone(), start..end))
                .with_message(main_message)
                .with_color(main_color),
        );

        for detail in &self.details {
            let Some(detail_loc) = &detail.location else {
                continue;
            };
            if detail_loc.file_id != location.file_id {
                continue;
            }
            let (Some(detail_start), Some(detail_end)) = (
                to_char(detail_loc.start_offset()),
                to_char(detail_loc.end_offset()),
            ) else {
                continue;
            };
            let detail_color = match detail.kind {
                DetailKind::Error => Color::Red,
                DetailKind::Info => Color::Cyan,
            };
            report = report.with_label(
                Label::new((file.path.clone(), detail_start..detail_end))
                    .with_message(detail.content.as_str())
                    .with_color(detail_color),
            );
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((file.path.clone(), Source::from(content)), &mut output)
            .ok()?;

        String::from_utf8(output).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticMessageBuilder;
    use castext_source_map::FileId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_diagnostic_message_new() {
        let msg = DiagnosticMessage::new(DiagnosticKind::Error, "Test error");
        assert_eq!(msg.title, "Test error");
        assert_eq!(msg.kind, DiagnosticKind::Error);
        assert!(msg.code.is_none());
        assert!(msg.problem.is_none());
        assert!(msg.details.is_empty());
        assert!(msg.hints.is_empty());
        assert!(msg.is_error());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(DiagnosticMessage::warning("w").kind, DiagnosticKind::Warning);
        assert_eq!(DiagnosticMessage::info("i").kind, DiagnosticKind::Info);
        assert!(!DiagnosticMessage::warning("w").is_error());
    }

    #[test]
    fn test_to_text_plain() {
        let msg = DiagnosticMessageBuilder::error("You seem to be missing * characters.")
            .with_code("C-2-2")
            .add_info("The expression is `c2A`")
            .add_hint("Perhaps you meant to type `c2*A`?")
            .build();

        assert_eq!(
            msg.to_text(None),
            "Error [C-2-2]: You seem to be missing * characters.\n\
             ℹ The expression is `c2A`\n\
             ? Perhaps you meant to type `c2*A`?\n"
        );
    }

    #[test]
    fn test_to_text_with_source_context() {
        let source = "Value {@2*@} here";
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file("<template>".into(), source.into());

        let msg = DiagnosticMessageBuilder::error("Invalid final character")
            .with_code("C-2-3")
            .with_location(SourceInfo::from_offsets(file_id, source, 6, 12))
            .add_hint("Remove the trailing operator?")
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("[C-2-3] Invalid final character"));
        assert!(text.contains("{@2*@}"));
        assert!(text.contains("? Remove the trailing operator?"));
    }

    #[test]
    fn test_to_text_unknown_file_falls_back() {
        let ctx = SourceContext::new();
        let msg = DiagnosticMessageBuilder::error("Broken")
            .with_location(SourceInfo::from_offsets(FileId(4), "abc", 0, 1))
            .build();
        assert_eq!(msg.to_text(Some(&ctx)), "Error: Broken\n");
    }

    #[test]
    fn test_to_json() {
        let msg = DiagnosticMessageBuilder::error("Forbidden")
            .with_code("C-4-1")
            .problem("`system` may not be used")
            .add_detail("Found in `system(rm)`")
            .build();
        let json = msg.to_json();

        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "C-4-1");
        assert_eq!(json["problem"]["type"], "markdown");
        assert_eq!(json["details"][0]["kind"], "error");
        assert!(json.get("hints").is_none());
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_to_json_with_location() {
        let msg = DiagnosticMessageBuilder::error("Located")
            .with_location(SourceInfo::from_offsets(FileId(0), "abcdef", 2, 5))
            .build();
        let json = msg.to_json();
        assert_eq!(json["location"]["range"]["start"]["offset"], 2);
        assert_eq!(json["location"]["range"]["end"]["offset"], 5);
    }
}
