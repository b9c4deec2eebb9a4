/*
 * lib.rs
 * Copyright (c) 2025 CASText contributors
 */

//! CASText: question text with embedded computer-algebra expressions.
//!
//! A CASText template is ordinary text (usually HTML with LaTeX maths) in
//! which expressions are evaluated by a computer-algebra system and
//! substituted into the output:
//!
//! - `{@expr@}` inserts the LaTeX display form, wrapped as `\( \)` when it
//!   appears outside a maths region
//! - `{#expr#}` inserts the value in input syntax
//! - `[[if test="..."]]...[[/if]]` includes its body when the test is true
//! - `[[define name="..."/]]` binds names without producing output
//! - `[[foreach x="[...]"]]...[[/foreach]]` repeats its body per element
//! - `[[facts:key]]` inserts a fact sheet
//! - a segment whose value is `plot(..)` is replaced by a rendered plot
//!
//! # Architecture
//!
//! The engine does not do any algebra itself. Evaluation goes through the
//! [`castext_cas::CasEvaluator`] trait; expressions are evaluated in document
//! order against a [`Session`] that records every binding.
//!
//! # Example
//!
//! ```
//! use castext::{ContextMode, ExpandOptions, Session, Template};
//! use castext_minicas::MiniCas;
//!
//! let template = Template::compile(
//!     "[[foreach k=\"[1,2,3]\"]]{#k^2#},[[/foreach]]",
//!     ContextMode::Teacher,
//! );
//! let mut session = Session::new();
//! let result = template.expand(&mut session, &MiniCas, &ExpandOptions::default());
//!
//! assert!(result.valid);
//! assert_eq!(result.display, "1,4,9,");
//! ```

pub mod ast;
pub mod castext;
pub mod error;
pub mod eval_context;
pub mod expander;
pub mod expression;
pub mod facts;
pub mod forbidden;
pub mod options;
pub mod parser;
pub mod plots;
pub mod session;

pub use ast::{
    Assignment, DefineBlock, Delimiter, ErrorMarker, FactSheetRef, ForeachBlock, IfBlock,
    MathSegment, Node, Text,
};
pub use castext::CasText;
pub use error::{ErrorKind, ParseError};
pub use expander::{ExpansionResult, expand, expand_with, expand_with_fact_sheets};
pub use expression::{ValidationIssue, validate};
pub use facts::{BuiltinFactSheets, FactSheet, FactSheetProvider, MemoryFactSheets, NullFactSheets};
pub use options::{ContextMode, ExpandOptions};
pub use parser::{Template, parse};
pub use plots::{PlaceholderPlots, Plot, PlotError, PlotRenderer};
pub use session::{Appended, Binding, Session, Watermark};

pub use castext_cas::{
    CasError, CasEvaluator, CasValue, MatrixParens, MultiplicationSign, PlotRequest, RenderOptions,
};
