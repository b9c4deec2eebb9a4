/*
 * lib.rs
 * Copyright (c) 2025 CASText contributors
 */

//! A small reference evaluator for CASText.
//!
//! [`MiniCas`] implements [`castext_cas::CasEvaluator`] for a Maxima-like
//! subset of expressions so the template engine can be driven end to end
//! without a real computer-algebra system:
//!
//! - integers and decimals, symbols, strings, `true`/`false`
//! - `+ - * / ^`, relations `= # < > <= >=`, `and`, `or`, `not`
//! - lists `[..]`, sets `{..}`, `matrix([..],..)`
//! - element assignment into a bound matrix or list, `A[1,2]:3`
//! - function calls; `is`, `length`, `first`, `last`, `rest`, `reverse`
//!   and `abs` are evaluated, every other function stays symbolic
//!
//! Simplification is limited to integer arithmetic, exact integer division,
//! flattening, and merging integer powers of the same base (`x*x^2` is `x^3`,
//! `(x^2)^2` is `x^4`). Values render back in input syntax and as LaTeX,
//! honouring [`castext_cas::RenderOptions`].
//!
//! ```
//! use castext_cas::{CasEvaluator, EmptyEnvironment, RenderOptions};
//! use castext_minicas::MiniCas;
//!
//! let result = MiniCas::new()
//!     .evaluate("x*x^2", &EmptyEnvironment, &RenderOptions::default())
//!     .unwrap();
//! assert_eq!(result.value.to_string(), "x^3");
//! assert_eq!(result.display, "x^3");
//! ```

pub mod expr;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod simplify;

pub use expr::{Expr, RelOp};
pub use parser::Statement;

use castext_cas::{
    CasEvaluator, CasResult, CasValue, Environment, Evaluation, PlotParameter, PlotRequest,
    RenderOptions,
};

/// The reference evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniCas;

impl MiniCas {
    pub fn new() -> Self {
        MiniCas
    }
}

impl CasEvaluator for MiniCas {
    fn evaluate(
        &self,
        expression: &str,
        env: &dyn Environment,
        options: &RenderOptions,
    ) -> CasResult<Evaluation> {
        let value = match parser::parse_statement(expression)? {
            Statement::Expr(parsed) => simplify::evaluate(&parsed, Some(env))?,
            Statement::SetElement {
                name,
                indices,
                value,
            } => simplify::set_element(&name, &indices, &value, Some(env))?,
        };
        tracing::trace!(expression, value = %render::to_input(&value), "evaluated");
        Ok(Evaluation::new(
            to_cas_value(&value),
            render::to_latex(&value, options),
        )
        .with_plot(plot_request(&value)))
    }
}

/// Describe a top-level `plot(..)` value for the caller's plot renderer.
///
/// The first argument gives the drawn expressions (a list draws each
/// element). Each later argument is a parameter: a list `[name,values..]`
/// such as a range, or a bare option name.
pub fn plot_request(expr: &Expr) -> Option<PlotRequest> {
    let Expr::Call(function, args) = expr else {
        return None;
    };
    if function != "plot" {
        return None;
    }
    let (first, rest) = args.split_first()?;
    let expressions = match first {
        Expr::List(items) => items.iter().map(render::to_input).collect(),
        other => vec![render::to_input(other)],
    };
    let parameters = rest
        .iter()
        .map(|arg| match arg {
            Expr::List(items) if !items.is_empty() => PlotParameter {
                name: render::to_input(&items[0]),
                values: items[1..].iter().map(render::to_input).collect(),
            },
            other => PlotParameter {
                name: render::to_input(other),
                values: Vec::new(),
            },
        })
        .collect();
    Some(PlotRequest {
        expressions,
        parameters,
    })
}

/// Convert an evaluated expression to the engine's value model.
pub fn to_cas_value(expr: &Expr) -> CasValue {
    match expr {
        Expr::Bool(b) => CasValue::Bool(*b),
        Expr::List(items) => CasValue::List(items.iter().map(to_cas_value).collect()),
        Expr::Set(items) => CasValue::Set(items.iter().map(to_cas_value).collect()),
        other => CasValue::Atom(render::to_input(other)),
    }
}
