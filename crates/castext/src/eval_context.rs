/*
 * eval_context.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Expansion context.
//!
//! [`ExpandContext`] is threaded through the expander and carries:
//!
//! 1. **Diagnostics**: errors with error codes and source locations
//! 2. **State**: the session being appended to and the current block depth
//! 3. **Collaborators**: the evaluator, the fact sheet provider and the plot
//!    renderer

use crate::error::ErrorKind;
use crate::expression::ValidationIssue;
use crate::facts::FactSheetProvider;
use crate::options::{ContextMode, ExpandOptions};
use crate::plots::PlotRenderer;
use crate::session::Session;
use castext_cas::{CasError, CasEvaluator};
use castext_error_reporting::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder};
use castext_source_map::SourceInfo;

/// Collector for diagnostics produced while expanding.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<DiagnosticMessage>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: DiagnosticMessage) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an error of `kind` with a problem statement and location.
    pub fn error_at(&mut self, kind: ErrorKind, problem: impl Into<String>, location: &SourceInfo) {
        self.add(
            kind.diagnostic()
                .problem(problem.into())
                .with_location(location.clone())
                .build(),
        );
    }

    /// Check if any errors were collected (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Consume the collector and return the diagnostics in source order.
    ///
    /// The sort is stable, so errors repeated by a foreach keep their
    /// iteration order.
    pub fn into_diagnostics(mut self) -> Vec<DiagnosticMessage> {
        self.diagnostics
            .sort_by_key(|diag| diag.location.as_ref().map_or(0, |loc| loc.start_offset()));
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Context for one expansion.
pub struct ExpandContext<'a> {
    pub session: &'a mut Session,
    pub cas: &'a dyn CasEvaluator,
    pub facts: &'a dyn FactSheetProvider,
    pub plots: &'a dyn PlotRenderer,
    pub options: &'a ExpandOptions,
    pub diagnostics: DiagnosticCollector,
    /// Student mode adds the student-only forbidden words.
    pub mode: ContextMode,
    /// Current block nesting depth.
    pub depth: usize,
}

impl<'a> ExpandContext<'a> {
    pub fn new(
        session: &'a mut Session,
        cas: &'a dyn CasEvaluator,
        facts: &'a dyn FactSheetProvider,
        plots: &'a dyn PlotRenderer,
        options: &'a ExpandOptions,
    ) -> Self {
        Self {
            session,
            cas,
            facts,
            plots,
            options,
            diagnostics: DiagnosticCollector::new(),
            mode: ContextMode::Teacher,
            depth: 0,
        }
    }

    pub fn with_mode(mut self, mode: ContextMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn error_at(&mut self, kind: ErrorKind, problem: impl Into<String>, location: &SourceInfo) {
        self.diagnostics.error_at(kind, problem, location);
    }

    /// Report a validation failure for an expression.
    pub fn report_issue(&mut self, issue: &ValidationIssue, location: &SourceInfo) {
        let mut builder = issue
            .kind
            .diagnostic()
            .problem(issue.message.clone())
            .with_location(location.clone());
        if let Some(hint) = &issue.hint {
            builder = builder.add_hint(hint.clone());
        }
        self.diagnostics.add(builder.build());
    }

    /// Report an evaluator error for `expression`.
    pub fn report_cas_error(&mut self, expression: &str, err: &CasError, location: &SourceInfo) {
        let builder = match err {
            CasError::Syntax { message, suggestion } => {
                let builder = ErrorKind::EvaluatorSyntax
                    .diagnostic()
                    .problem(format!("`{expression}` could not be read by the evaluator."))
                    .add_detail(message.clone());
                match suggestion {
                    Some(s) => builder.add_hint(format!("Perhaps you meant to type `{s}`")),
                    None => builder,
                }
            }
            CasError::Runtime { message } => ErrorKind::EvaluatorRuntime
                .diagnostic()
                .problem(format!("`{expression}` could not be evaluated."))
                .add_detail(message.clone()),
        };
        self.diagnostics.add(builder.with_location(location.clone()).build());
    }

    /// Add a prebuilt diagnostic.
    pub fn add(&mut self, builder: DiagnosticMessageBuilder) {
        self.diagnostics.add(builder.build());
    }
}
