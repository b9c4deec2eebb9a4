/*
 * expander.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Template expansion.
//!
//! Expansion walks the template tree depth first in document order. Every
//! expression is validated, appended to the session and, for math segments,
//! substituted into the output. Problems are collected as diagnostics; a
//! failing segment produces no output but expansion carries on.

use crate::ast::{DefineBlock, Delimiter, FactSheetRef, ForeachBlock, IfBlock, MathSegment, Node};
use crate::error::ErrorKind;
use crate::eval_context::ExpandContext;
use crate::expression::{split_assignment, validate_binding};
use crate::facts::{BuiltinFactSheets, FactSheetProvider};
use crate::options::ExpandOptions;
use crate::parser::Template;
use crate::plots::{PlaceholderPlots, Plot, PlotRenderer};
use crate::session::Session;
use castext_cas::{CasEvaluator, CasValue, PlotRequest};
use castext_error_reporting::DiagnosticMessage;
use castext_source_map::SourceInfo;
use serde_json::json;
use std::fmt::Write;

/// Outcome of expanding a template.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionResult {
    /// Rendered text. Empty when the template could not be parsed.
    pub display: String,
    pub valid: bool,
    /// Template and expansion diagnostics, in document order.
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl ExpansionResult {
    /// The error diagnostics only.
    pub fn errors(&self) -> Vec<&DiagnosticMessage> {
        self.diagnostics.iter().filter(|d| d.is_error()).collect()
    }

    /// Human-readable summary of every error, or an empty string when the
    /// expansion is valid.
    pub fn error_summary(&self) -> String {
        let errors = self.errors();
        if errors.is_empty() {
            return String::new();
        }
        let mut summary = String::from("CASText failed validation.\n");
        for diagnostic in errors {
            summary.push_str(&diagnostic.to_text(None));
        }
        summary
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "display": self.display,
            "valid": self.valid,
            "diagnostics": self.diagnostics.iter().map(|d| d.to_json()).collect::<Vec<_>>(),
        })
    }
}

impl Template {
    /// Expand this template against `session`, using the built-in fact sheets.
    pub fn expand(
        &self,
        session: &mut Session,
        cas: &dyn CasEvaluator,
        options: &ExpandOptions,
    ) -> ExpansionResult {
        expand(self, session, cas, options)
    }

    /// Expand this template with a custom fact sheet provider.
    pub fn expand_with_fact_sheets(
        &self,
        session: &mut Session,
        cas: &dyn CasEvaluator,
        facts: &dyn FactSheetProvider,
        options: &ExpandOptions,
    ) -> ExpansionResult {
        expand_with_fact_sheets(self, session, cas, facts, options)
    }

    /// Expand this template with custom fact sheet and plot collaborators.
    pub fn expand_with(
        &self,
        session: &mut Session,
        cas: &dyn CasEvaluator,
        facts: &dyn FactSheetProvider,
        plots: &dyn PlotRenderer,
        options: &ExpandOptions,
    ) -> ExpansionResult {
        expand_with(self, session, cas, facts, plots, options)
    }
}

/// Expand `template` against `session`.
///
/// The session is extended in place: after expansion it holds the seed
/// bindings followed by every expression of the template in document order.
pub fn expand(
    template: &Template,
    session: &mut Session,
    cas: &dyn CasEvaluator,
    options: &ExpandOptions,
) -> ExpansionResult {
    expand_with_fact_sheets(template, session, cas, &BuiltinFactSheets, options)
}

pub fn expand_with_fact_sheets(
    template: &Template,
    session: &mut Session,
    cas: &dyn CasEvaluator,
    facts: &dyn FactSheetProvider,
    options: &ExpandOptions,
) -> ExpansionResult {
    expand_with(
        template,
        session,
        cas,
        facts,
        &PlaceholderPlots::default(),
        options,
    )
}

/// Expand `template` with every collaborator supplied by the caller.
pub fn expand_with(
    template: &Template,
    session: &mut Session,
    cas: &dyn CasEvaluator,
    facts: &dyn FactSheetProvider,
    plots: &dyn PlotRenderer,
    options: &ExpandOptions,
) -> ExpansionResult {
    let mut diagnostics = template.diagnostics().to_vec();

    if template.is_fatal() {
        tracing::debug!(
            diagnostics = diagnostics.len(),
            "template could not be parsed, skipping expansion"
        );
        return ExpansionResult {
            display: String::new(),
            valid: false,
            diagnostics,
        };
    }

    let mut ctx = ExpandContext::new(session, cas, facts, plots, options).with_mode(template.mode());
    let mut display = String::new();
    expand_nodes(template.nodes(), &mut ctx, &mut display);

    diagnostics.extend(ctx.diagnostics.into_diagnostics());
    diagnostics.sort_by_key(|d| d.location.as_ref().map_or(0, SourceInfo::start_offset));
    let valid = !diagnostics.iter().any(DiagnosticMessage::is_error);

    let bytes = display.len();
    tracing::debug!(
        valid,
        diagnostics = diagnostics.len(),
        bytes,
        "expanded template"
    );

    ExpansionResult {
        display,
        valid,
        diagnostics,
    }
}

fn expand_nodes(nodes: &[Node], ctx: &mut ExpandContext, out: &mut String) {
    for node in nodes {
        expand_node(node, ctx, out);
    }
}

fn expand_node(node: &Node, ctx: &mut ExpandContext, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.text),
        Node::Math(segment) => expand_math(segment, ctx, out),
        Node::If(block) => expand_if(block, ctx, out),
        Node::Define(block) => expand_define(block, ctx),
        Node::Foreach(block) => expand_foreach(block, ctx, out),
        Node::FactSheet(reference) => expand_fact_sheet(reference, ctx, out),
        // Already reported while parsing.
        Node::Error(_) => {}
    }
}

/// Run the static checks on `expression` and on the `name` it is bound to.
/// Rejected expressions are still logged in the session, under `key` or an
/// auto-generated key.
fn accept(
    ctx: &mut ExpandContext,
    key: Option<&str>,
    name: Option<&str>,
    raw: &str,
    expression: &str,
    location: &SourceInfo,
) -> bool {
    let issues = validate_binding(name, expression, ctx.mode, &ctx.options.forbidden_words);
    let Some(first) = issues.first() else {
        return true;
    };
    ctx.session.append_invalid(key, raw, first.message.clone());
    for issue in &issues {
        ctx.report_issue(issue, location);
    }
    false
}

fn expand_math(segment: &MathSegment, ctx: &mut ExpandContext, out: &mut String) {
    let raw = segment.expression();
    let (key, expression) = split_assignment(raw);
    if !accept(ctx, key, key, raw, expression, &segment.source_info) {
        return;
    }

    let appended = ctx.session.add_assignment(ctx.cas, raw);
    if let Some(err) = &appended.error {
        ctx.report_cas_error(expression, err, &segment.source_info);
        return;
    }
    if let Some(request) = &appended.plot {
        expand_plot(request, ctx, out, &segment.source_info);
        return;
    }

    let display = appended.display.as_deref().unwrap_or_default();
    match segment.delimiter {
        Delimiter::Implicit => write!(out, "\\({{{display}}}\\)").unwrap(),
        Delimiter::Inline | Delimiter::Display => write!(out, "{{{display}}}").unwrap(),
        Delimiter::Value => {
            if let Some(value) = &appended.value {
                write!(out, "{value}").unwrap();
            }
        }
    }
}

/// Replace a plot segment by the renderer's output. A plot that cannot be
/// rendered leaves a warning and no output.
fn expand_plot(request: &PlotRequest, ctx: &mut ExpandContext, out: &mut String, location: &SourceInfo) {
    let rendered = Plot::from_request(request.clone()).and_then(|plot| ctx.plots.render(&plot));
    match rendered {
        Ok(text) => out.push_str(&text),
        Err(err) => {
            tracing::debug!(error = %err, "plot not rendered");
            ctx.add(
                ErrorKind::PlotError
                    .warning()
                    .problem(err.to_string())
                    .add_info(format!("The plot call was `{}`", request.call()))
                    .with_location(location.clone()),
            );
        }
    }
}

fn expand_if(block: &IfBlock, ctx: &mut ExpandContext, out: &mut String) {
    let test = block.test.trim();
    if !accept(ctx, None, None, test, test, &block.source_info) {
        return;
    }

    let appended = ctx.session.append(ctx.cas, None, test);
    if let Some(err) = &appended.error {
        ctx.report_cas_error(test, err, &block.source_info);
        return;
    }

    let value = appended.value.unwrap_or(CasValue::Bool(false));
    match value.as_bool() {
        Some(true) => {
            tracing::debug!(depth = ctx.depth, test, "if: entering block");
            let mark = ctx.session.snapshot();
            ctx.depth += 1;
            expand_nodes(&block.children, ctx, out);
            ctx.depth -= 1;
            ctx.session.restore(mark);
        }
        Some(false) => {
            tracing::debug!(depth = ctx.depth, test, "if: skipping block");
        }
        None => ctx.error_at(
            ErrorKind::NonBooleanTest,
            format!("The test `{test}` evaluated to `{value}`, which is neither true nor false."),
            &block.source_info,
        ),
    }
}

fn expand_define(block: &DefineBlock, ctx: &mut ExpandContext) {
    for assignment in &block.assignments {
        let expression = assignment.expression.trim();
        let raw = format!("{}:{}", assignment.name, expression);
        if !accept(
            ctx,
            Some(&assignment.name),
            Some(&assignment.name),
            &raw,
            expression,
            &assignment.source_info,
        ) {
            continue;
        }
        let appended = ctx.session.assign(ctx.cas, &assignment.name, expression);
        if let Some(err) = &appended.error {
            ctx.report_cas_error(expression, err, &assignment.source_info);
        }
    }
}

fn expand_foreach(block: &ForeachBlock, ctx: &mut ExpandContext, out: &mut String) {
    let mut sources: Vec<(&str, &SourceInfo, Vec<CasValue>)> =
        Vec::with_capacity(block.variables.len());
    let mut complete = true;

    for variable in &block.variables {
        let expression = variable.expression.trim();
        if !accept(
            ctx,
            None,
            Some(&variable.name),
            expression,
            expression,
            &variable.source_info,
        ) {
            complete = false;
            continue;
        }
        let appended = ctx.session.append(ctx.cas, None, expression);
        if let Some(err) = &appended.error {
            ctx.report_cas_error(expression, err, &variable.source_info);
            complete = false;
            continue;
        }
        match appended.value.as_ref().and_then(CasValue::elements) {
            Some(items) => sources.push((
                variable.name.as_str(),
                &variable.source_info,
                items.to_vec(),
            )),
            None => {
                let shown = appended
                    .value
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string);
                ctx.error_at(
                    ErrorKind::NotASequence,
                    format!(
                        "The values for `{}` come from `{expression}` = `{shown}`, which is not a list or a set.",
                        variable.name
                    ),
                    &variable.source_info,
                );
                complete = false;
            }
        }
    }

    if !complete {
        return;
    }

    let iterations = sources.first().map_or(0, |(_, _, items)| items.len());
    if sources.iter().any(|(_, _, items)| items.len() != iterations) {
        let mut builder = ErrorKind::IterationLengthMismatch
            .diagnostic()
            .problem("All lists in a foreach-block must have the same length.")
            .with_location(block.source_info.clone());
        for (name, location, items) in &sources {
            builder = builder.add_detail_at(
                format!("`{name}` has {} elements", items.len()),
                (*location).clone(),
            );
        }
        ctx.add(builder);
        return;
    }

    tracing::debug!(
        depth = ctx.depth,
        variables = sources.len(),
        iterations,
        "foreach: unrolling block"
    );

    let mark = ctx.session.snapshot();
    ctx.depth += 1;
    for index in 0..iterations {
        for (name, _, items) in &sources {
            let element = items[index].to_string();
            let appended = ctx.session.append(ctx.cas, Some(*name), &element);
            if let Some(err) = &appended.error {
                ctx.report_cas_error(&element, err, &block.source_info);
            }
        }
        expand_nodes(&block.children, ctx, out);
    }
    ctx.depth -= 1;
    ctx.session.restore(mark);
}

fn expand_fact_sheet(reference: &FactSheetRef, ctx: &mut ExpandContext, out: &mut String) {
    match ctx.facts.lookup(&reference.key) {
        Some(sheet) => out.push_str(&sheet.render()),
        None => ctx.error_at(
            ErrorKind::UnknownFactSheet,
            format!("No fact sheet is registered under `{}`.", reference.key),
            &reference.source_info,
        ),
    }
}
