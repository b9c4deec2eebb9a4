/*
 * castext.rs
 * Copyright (c) 2025 CASText contributors
 */

//! One-stop wrapper around parsing and expansion.

use crate::expander::{ExpansionResult, expand_with};
use crate::facts::{BuiltinFactSheets, FactSheetProvider};
use crate::options::ExpandOptions;
use crate::parser::Template;
use crate::plots::{PlaceholderPlots, PlotRenderer};
use crate::session::Session;
use castext_cas::CasEvaluator;
use castext_error_reporting::DiagnosticMessage;
use once_cell::unsync::OnceCell;

#[derive(Debug)]
struct Expanded {
    result: ExpansionResult,
    session: Session,
}

/// A template bound to a seed session and an evaluator.
///
/// The template is compiled on construction and expanded lazily, once, the
/// first time a result is asked for. The caller's session is never mutated:
/// expansion runs on a copy.
///
/// ```
/// use castext::{CasText, Session};
/// use castext_minicas::MiniCas;
///
/// let mut seed = Session::new();
/// seed.add_assignment(&MiniCas, "a:2");
///
/// let text = CasText::new("a = {@a@}", &seed, MiniCas);
/// assert!(text.is_valid());
/// assert_eq!(text.display(), "a = \\({2}\\)");
/// ```
pub struct CasText<C: CasEvaluator> {
    template: Template,
    seed: Session,
    cas: C,
    facts: Box<dyn FactSheetProvider>,
    plots: Box<dyn PlotRenderer>,
    options: ExpandOptions,
    expanded: OnceCell<Expanded>,
}

impl<C: CasEvaluator> CasText<C> {
    pub fn new(source: &str, seed: &Session, cas: C) -> Self {
        Self::with_options(source, seed, cas, ExpandOptions::default())
    }

    /// Compile `source` in `options.mode`.
    pub fn with_options(source: &str, seed: &Session, cas: C, options: ExpandOptions) -> Self {
        CasText {
            template: Template::compile(source, options.mode),
            seed: seed.clone(),
            cas,
            facts: Box::new(BuiltinFactSheets),
            plots: Box::new(PlaceholderPlots::default()),
            options,
            expanded: OnceCell::new(),
        }
    }

    /// Replace the fact sheet provider. Any earlier expansion is discarded.
    pub fn with_fact_sheets(mut self, facts: impl FactSheetProvider + 'static) -> Self {
        self.facts = Box::new(facts);
        self.expanded = OnceCell::new();
        self
    }

    /// Replace the plot renderer. Any earlier expansion is discarded.
    pub fn with_plot_renderer(mut self, plots: impl PlotRenderer + 'static) -> Self {
        self.plots = Box::new(plots);
        self.expanded = OnceCell::new();
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    fn expanded(&self) -> &Expanded {
        self.expanded.get_or_init(|| {
            let mut session = self.seed.clone();
            let result = expand_with(
                &self.template,
                &mut session,
                &self.cas,
                self.facts.as_ref(),
                self.plots.as_ref(),
                &self.options,
            );
            Expanded { result, session }
        })
    }

    pub fn result(&self) -> &ExpansionResult {
        &self.expanded().result
    }

    /// The expanded text.
    pub fn display(&self) -> &str {
        &self.result().display
    }

    pub fn is_valid(&self) -> bool {
        self.result().valid
    }

    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.result().diagnostics
    }

    pub fn errors(&self) -> Vec<&DiagnosticMessage> {
        self.result().errors()
    }

    pub fn error_summary(&self) -> String {
        self.result().error_summary()
    }

    /// The seed session extended by everything the template evaluated.
    pub fn session(&self) -> &Session {
        &self.expanded().session
    }

    /// Raw text of every expression evaluated, seed first, with
    /// foreach-blocks unrolled.
    pub fn all_raw_expressions(&self) -> Vec<&str> {
        self.session().raw_expressions()
    }

    /// Whether any of `words` occurs as an identifier in the expanded session,
    /// seed bindings included, or anywhere in the template. Blocks skipped by
    /// a false test still count.
    pub fn check_external_forbidden_words<W: AsRef<str>>(&self, words: &[W]) -> bool {
        crate::forbidden::contains_any(self.all_raw_expressions(), words)
            || self.template.check_forbidden_words(words)
    }
}

impl<C: CasEvaluator> std::fmt::Debug for CasText<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasText")
            .field("template", &self.template)
            .field("options", &self.options)
            .field("expanded", &self.expanded.get().is_some())
            .finish_non_exhaustive()
    }
}
