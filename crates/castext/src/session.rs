/*
 * session.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Evaluation session.
//!
//! The session is an append-only log of bindings. Lookups always see the most
//! recent successful binding of a key. Block scoping is done with a
//! [`Watermark`]: restoring one hides later bindings from [`Session::keys`]
//! and rewinds the auto-key counter, but the bindings stay in the log and
//! stay visible to lookups.

use crate::expression::{element_assignment_target, split_assignment};
use castext_cas::{CasError, CasEvaluator, CasValue, Environment, PlotRequest, RenderOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

static AUTOGEN_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^autogen([0-9]+)$").unwrap());

const AUTOGEN_PREFIX: &str = "autogen";

/// One entry of the session log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub key: String,
    /// Text as the author wrote it, `name:` prefix included for assignments.
    pub raw: String,
    /// The expression handed to the evaluator.
    pub expression: String,
    pub value: Option<CasValue>,
    pub display: Option<String>,
    pub error: Option<String>,
    /// Appended inside a block that has since been left.
    pub scoped: bool,
}

impl Binding {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// What [`Session::append`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct Appended {
    pub key: String,
    pub value: Option<CasValue>,
    pub display: Option<String>,
    /// Set when the value is a plot to be rendered in place of the display.
    pub plot: Option<PlotRequest>,
    pub error: Option<CasError>,
}

impl Appended {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// A point in the session log to return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    len: usize,
    autogen_next: usize,
}

/// Ordered store of bindings evaluated in document order.
#[derive(Debug, Clone, Default)]
pub struct Session {
    bindings: Vec<Binding>,
    /// Index of the latest binding with a value, per key.
    latest: HashMap<String, usize>,
    autogen_next: usize,
    options: RenderOptions,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Session {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Seed the session from `name:expression`, `name[i,j]:expression`, or an
    /// anonymous expression.
    pub fn add_assignment(&mut self, cas: &dyn CasEvaluator, assignment: &str) -> Appended {
        if let Some(name) = element_assignment_target(assignment) {
            let statement = assignment.trim().to_string();
            return self.push(cas, name.to_string(), statement.clone(), statement);
        }
        match split_assignment(assignment) {
            (Some(key), expression) => self.assign(cas, key, expression),
            (None, expression) => self.append(cas, None, expression),
        }
    }

    /// Evaluate `expression` and bind it under `key`, recording the
    /// assignment as `key:expression`.
    pub fn assign(&mut self, cas: &dyn CasEvaluator, key: &str, expression: &str) -> Appended {
        let expression = expression.trim();
        self.push(
            cas,
            key.to_string(),
            format!("{key}:{expression}"),
            expression.to_string(),
        )
    }

    /// Evaluate `expression` and bind it under `key`, or under the next
    /// unused auto-generated key.
    pub fn append(&mut self, cas: &dyn CasEvaluator, key: Option<&str>, expression: &str) -> Appended {
        let key = match key {
            Some(name) => name.to_string(),
            None => self.next_autogen_key(),
        };
        let expression = expression.trim().to_string();
        self.push(cas, key, expression.clone(), expression)
    }

    /// Record an expression rejected before evaluation.
    pub fn append_invalid(&mut self, key: Option<&str>, raw: &str, message: impl Into<String>) -> String {
        let key = match key {
            Some(name) => name.to_string(),
            None => self.next_autogen_key(),
        };
        let (_, expression) = split_assignment(raw);
        self.note_key(&key);
        self.bindings.push(Binding {
            key: key.clone(),
            raw: raw.trim().to_string(),
            expression: expression.to_string(),
            value: None,
            display: None,
            error: Some(message.into()),
            scoped: false,
        });
        key
    }

    fn push(&mut self, cas: &dyn CasEvaluator, key: String, raw: String, expression: String) -> Appended {
        self.note_key(&key);
        let outcome = cas.evaluate(&expression, &*self, &self.options);

        let index = self.bindings.len();
        match outcome {
            Ok(evaluation) => {
                tracing::debug!(key = %key, expression = %expression, value = %evaluation.value, "bound");
                self.latest.insert(key.clone(), index);
                self.bindings.push(Binding {
                    key: key.clone(),
                    raw,
                    expression,
                    value: Some(evaluation.value.clone()),
                    display: Some(evaluation.display.clone()),
                    error: None,
                    scoped: false,
                });
                Appended {
                    key,
                    value: Some(evaluation.value),
                    display: Some(evaluation.display),
                    plot: evaluation.plot,
                    error: None,
                }
            }
            Err(err) => {
                tracing::debug!(key = %key, expression = %expression, error = %err, "evaluation failed");
                self.bindings.push(Binding {
                    key: key.clone(),
                    raw,
                    expression,
                    value: None,
                    display: None,
                    error: Some(err.to_string()),
                    scoped: false,
                });
                Appended {
                    key,
                    value: None,
                    display: None,
                    plot: None,
                    error: Some(err),
                }
            }
        }
    }

    /// Keep the auto-key counter past explicitly used `autogenN` keys.
    fn note_key(&mut self, key: &str) {
        if let Some(n) = AUTOGEN_KEY
            .captures(key)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        {
            self.autogen_next = self.autogen_next.max(n + 1);
        }
    }

    fn is_visible_key(&self, key: &str) -> bool {
        self.bindings.iter().any(|b| !b.scoped && b.key == key)
    }

    fn next_autogen_key(&mut self) -> String {
        loop {
            let key = format!("{AUTOGEN_PREFIX}{}", self.autogen_next);
            self.autogen_next += 1;
            if !self.is_visible_key(&key) {
                return key;
            }
        }
    }

    pub fn snapshot(&self) -> Watermark {
        Watermark {
            len: self.bindings.len(),
            autogen_next: self.autogen_next,
        }
    }

    /// Return to `mark`: later bindings leave the key list but remain
    /// available to lookups.
    pub fn restore(&mut self, mark: Watermark) {
        for binding in self.bindings.iter_mut().skip(mark.len) {
            binding.scoped = true;
        }
        self.autogen_next = mark.autogen_next;
    }

    /// Distinct visible keys in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for binding in self.bindings.iter().filter(|b| !b.scoped) {
            if !keys.contains(&binding.key.as_str()) {
                keys.push(&binding.key);
            }
        }
        keys
    }

    /// Raw text of every binding in append order, scoped ones included.
    pub fn raw_expressions(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.raw.as_str()).collect()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Most recent value bound to `key`.
    pub fn value_of(&self, key: &str) -> Option<&CasValue> {
        self.latest
            .get(key)
            .and_then(|&index| self.bindings[index].value.as_ref())
    }

    /// Display form of the most recent value bound to `key`.
    pub fn display_of(&self, key: &str) -> Option<&str> {
        self.latest
            .get(key)
            .and_then(|&index| self.bindings[index].display.as_deref())
    }

    pub fn is_valid(&self) -> bool {
        self.bindings.iter().all(Binding::is_valid)
    }

    /// `(key, message)` for every failed binding.
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.bindings
            .iter()
            .filter_map(|b| b.error.as_deref().map(|e| (b.key.as_str(), e)))
            .collect()
    }
}

impl Environment for Session {
    fn value_of(&self, name: &str) -> Option<&CasValue> {
        Session::value_of(self, name)
    }
}
