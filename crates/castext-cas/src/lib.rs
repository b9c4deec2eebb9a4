/*
 * lib.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Expression evaluator interface for CASText.
//!
//! The CASText engine never does algebra itself. Every embedded expression is
//! handed to a [`CasEvaluator`] together with the [`Environment`] of prior
//! bindings and the caller's [`RenderOptions`]; the evaluator answers with a
//! [`CasValue`] and a LaTeX display string, or a [`CasError`].
//!
//! Values are structured only as far as the engine needs: booleans drive
//! `if` blocks, lists and sets drive `foreach` blocks, everything else is an
//! opaque [`CasValue::Atom`] in the evaluator's own input syntax.

pub mod error;
pub mod options;
pub mod value;

pub use error::{CasError, CasResult, InvalidOption};
pub use options::{MatrixParens, MultiplicationSign, RenderOptions};
pub use value::{CasValue, Evaluation, PlotParameter, PlotRequest};

use std::collections::HashMap;

/// Read access to the bindings made before the expression being evaluated.
pub trait Environment {
    /// The most recent value bound to `name`, if any.
    fn value_of(&self, name: &str) -> Option<&CasValue>;
}

/// An environment with no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl Environment for EmptyEnvironment {
    fn value_of(&self, _name: &str) -> Option<&CasValue> {
        None
    }
}

impl Environment for HashMap<String, CasValue> {
    fn value_of(&self, name: &str) -> Option<&CasValue> {
        self.get(name)
    }
}

/// A computer-algebra evaluator.
///
/// Implementations must be deterministic for a given expression, environment
/// and options: the engine relies on strict document-order evaluation and
/// never re-evaluates a binding.
pub trait CasEvaluator {
    /// Evaluate one expression.
    ///
    /// `expression` never contains a leading `name:` assignment; the engine
    /// strips it and records the binding under `name` itself. Element
    /// assignments such as `A[1,2]:3` are passed whole, and the returned value
    /// is bound under `A`.
    fn evaluate(
        &self,
        expression: &str,
        env: &dyn Environment,
        options: &RenderOptions,
    ) -> CasResult<Evaluation>;
}

impl<T: CasEvaluator + ?Sized> CasEvaluator for &T {
    fn evaluate(
        &self,
        expression: &str,
        env: &dyn Environment,
        options: &RenderOptions,
    ) -> CasResult<Evaluation> {
        (**self).evaluate(expression, env, options)
    }
}
