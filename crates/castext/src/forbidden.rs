/*
 * forbidden.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Forbidden word policy.
//!
//! Words are matched case-sensitively against whole identifiers outside of
//! string literals, so `systematic` and `"system"` never match `system`.

use crate::error::ErrorKind;
use crate::options::ContextMode;
use once_cell::sync::Lazy;
use regex::Regex;

/// Always forbidden: system access, file I/O, evaluation control and
/// anything that can change the evaluator's own state.
pub const GLOBAL_FORBIDDEN: &[&str] = &[
    "system",
    "eval",
    "ev",
    "load",
    "loadfile",
    "batch",
    "batchload",
    "bug_report",
    "build_info",
    "closefile",
    "compfile",
    "compile",
    "compile_file",
    "demo",
    "describe",
    "example",
    "kill",
    "opena",
    "openr",
    "openw",
    "remfunction",
    "remvalue",
    "reset",
    "run_testsuite",
    "save",
    "setup_autoload",
    "stringout",
    "to_lisp",
    "translate",
    "translate_file",
    "with_stdout",
    "writefile",
    "appendfile",
    "file_search",
    "filename_merge",
    "playback",
    "printfile",
    "quit",
    "restart",
];

/// Additionally forbidden in student-facing text.
pub const STUDENT_FORBIDDEN: &[&str] = &[
    "apply",
    "block",
    "define",
    "diff",
    "errcatch",
    "for",
    "funmake",
    "integrate",
    "lambda",
    "makelist",
    "map",
    "plot",
    "print",
    "simp",
    "solve",
    "subst",
    "while",
];

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_%][A-Za-z0-9_]*").unwrap());

/// Blank out string literals so identifiers inside them are ignored.
fn without_strings(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in expression.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                out.push('"');
                continue;
            }
            out.push(' ');
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}

/// Identifiers of an expression in order of appearance.
pub fn identifiers(expression: &str) -> Vec<String> {
    IDENTIFIER
        .find_iter(&without_strings(expression))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A forbidden identifier found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenWord {
    pub word: String,
    pub kind: ErrorKind,
}

/// Every distinct forbidden identifier in `expression`, in order.
pub fn find_forbidden(
    expression: &str,
    mode: ContextMode,
    extra: &[String],
) -> Vec<ForbiddenWord> {
    let mut found: Vec<ForbiddenWord> = Vec::new();
    for ident in identifiers(expression) {
        if found.iter().any(|f| f.word == ident) {
            continue;
        }
        let word = ident.as_str();
        let kind = if GLOBAL_FORBIDDEN.contains(&word)
            || (mode.is_strict() && STUDENT_FORBIDDEN.contains(&word))
        {
            ErrorKind::ForbiddenWord
        } else if extra.iter().any(|w| w == word) {
            ErrorKind::ForbiddenWordForCall
        } else {
            continue;
        };
        found.push(ForbiddenWord { word: ident, kind });
    }
    found
}

/// Whether any of `words` occurs as an identifier in any expression.
pub fn contains_any<'a, I, W>(expressions: I, words: &[W]) -> bool
where
    I: IntoIterator<Item = &'a str>,
    W: AsRef<str>,
{
    if words.is_empty() {
        return false;
    }
    expressions.into_iter().any(|expression| {
        identifiers(expression)
            .iter()
            .any(|ident| words.iter().any(|w| w.as_ref() == ident))
    })
}
