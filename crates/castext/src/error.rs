/*
 * error.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Error kinds and the fatal parse error type.

use castext_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, get_error_info};
use castext_source_map::SourceInfo;
use serde::Serialize;
use thiserror::Error;

/// Every problem the engine reports, each tied to an error catalog code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    UnmatchedClosingTag,
    UnclosedBlock,
    UnbalancedMathDelimiters,
    UnterminatedSegment,
    UnterminatedTag,
    MissingAttribute,
    MalformedAttributes,
    EmptySegment,
    EvaluatorSyntax,
    MissingMultiplication,
    InvalidFinalCharacter,
    UnbalancedBrackets,
    EvaluatorRuntime,
    NonBooleanTest,
    NotASequence,
    IterationLengthMismatch,
    ForbiddenWord,
    ForbiddenWordForCall,
    UnknownFactSheet,
    PlotError,
}

impl ErrorKind {
    /// The catalog code, e.g. `C-3-4`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnmatchedClosingTag => "C-1-1",
            ErrorKind::UnclosedBlock => "C-1-2",
            ErrorKind::UnbalancedMathDelimiters => "C-1-3",
            ErrorKind::UnterminatedSegment => "C-1-4",
            ErrorKind::UnterminatedTag => "C-1-5",
            ErrorKind::MissingAttribute => "C-1-6",
            ErrorKind::MalformedAttributes => "C-1-7",
            ErrorKind::EmptySegment => "C-1-8",
            ErrorKind::EvaluatorSyntax => "C-2-1",
            ErrorKind::MissingMultiplication => "C-2-2",
            ErrorKind::InvalidFinalCharacter => "C-2-3",
            ErrorKind::UnbalancedBrackets => "C-2-4",
            ErrorKind::EvaluatorRuntime => "C-3-1",
            ErrorKind::NonBooleanTest => "C-3-2",
            ErrorKind::NotASequence => "C-3-3",
            ErrorKind::IterationLengthMismatch => "C-3-4",
            ErrorKind::ForbiddenWord => "C-4-1",
            ErrorKind::ForbiddenWordForCall => "C-4-2",
            ErrorKind::UnknownFactSheet => "C-5-1",
            ErrorKind::PlotError => "C-5-2",
        }
    }

    /// Fatal parse errors prevent expansion altogether.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::UnmatchedClosingTag
                | ErrorKind::UnclosedBlock
                | ErrorKind::UnbalancedMathDelimiters
                | ErrorKind::UnterminatedSegment
                | ErrorKind::UnterminatedTag
        )
    }

    /// Title from the error catalog.
    pub fn title(self) -> &'static str {
        get_error_info(self.code())
            .map(|info| info.title.as_str())
            .unwrap_or("CASText error")
    }

    /// Start a diagnostic for this kind with its title and code filled in.
    pub fn diagnostic(self) -> DiagnosticMessageBuilder {
        DiagnosticMessageBuilder::error(self.title()).with_code(self.code())
    }

    /// Start a warning for this kind. Warnings do not fail validation.
    pub fn warning(self) -> DiagnosticMessageBuilder {
        DiagnosticMessageBuilder::warning(self.title()).with_code(self.code())
    }
}

/// A parse error severe enough that no expansion is attempted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceInfo,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: SourceInfo) -> Self {
        ParseError {
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        self.kind
            .diagnostic()
            .problem(self.message.clone())
            .with_location(self.location.clone())
            .build()
    }
}
