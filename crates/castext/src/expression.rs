/*
 * expression.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Checks applied to a raw expression before it reaches the evaluator.

use crate::error::ErrorKind;
use crate::forbidden::find_forbidden;
use crate::options::ContextMode;
use once_cell::sync::Lazy;
use regex::Regex;

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z%][A-Za-z0-9_]*)\s*:").unwrap());

static ELEMENT_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z%][A-Za-z0-9_]*)\s*\[[^\]:]*\]\s*:").unwrap());

/// Split a leading `name:` assignment off an expression.
///
/// `:=` (function definition) is not an assignment. An element assignment
/// `name[i,j]:value` binds `name` but stays whole, since the evaluator needs
/// the indices.
pub fn split_assignment(raw: &str) -> (Option<&str>, &str) {
    if let Some(name) = element_assignment_target(raw) {
        return (Some(name), raw.trim());
    }
    if let Some(caps) = ASSIGNMENT.captures(raw) {
        let whole = caps.get(0).map_or(0, |m| m.end());
        let rest = &raw[whole..];
        if !rest.starts_with('=')
            && let Some(name) = caps.get(1)
        {
            return (Some(name.as_str()), rest.trim());
        }
    }
    (None, raw.trim())
}

/// The variable updated by an element assignment such as `A[1,2]:3`.
pub fn element_assignment_target(raw: &str) -> Option<&str> {
    let caps = ELEMENT_ASSIGNMENT.captures(raw)?;
    let end = caps.get(0)?.end();
    if raw[end..].starts_with('=') {
        return None;
    }
    caps.get(1).map(|name| name.as_str())
}

/// A problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: ErrorKind,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ValidationIssue {
            kind,
            message: message.into(),
            hint: None,
        }
    }
}

const INVALID_FINAL: &[char] = &['+', '-', '*', '/', '^', '=', '<', '>', ',', ':', '.'];

/// Validate a raw expression.
///
/// Forbidden words are reported first; the remaining checks only run when
/// none were found.
pub fn validate(raw: &str, mode: ContextMode, extra_forbidden: &[String]) -> Vec<ValidationIssue> {
    validate_binding(None, raw, mode, extra_forbidden)
}

/// Validate `expression` as the value bound to `name`.
///
/// The name is subject to the forbidden word policy as well; the syntax
/// checks apply to the expression only.
pub fn validate_binding(
    name: Option<&str>,
    raw: &str,
    mode: ContextMode,
    extra_forbidden: &[String],
) -> Vec<ValidationIssue> {
    let expression = raw.trim();
    let checked = match name {
        Some(name) => format!("{name}:{expression}"),
        None => expression.to_string(),
    };
    let forbidden: Vec<ValidationIssue> = find_forbidden(&checked, mode, extra_forbidden)
        .into_iter()
        .map(|f| ValidationIssue::new(f.kind, format!("The expression `{}` is forbidden.", f.word)))
        .collect();
    if !forbidden.is_empty() {
        return forbidden;
    }

    let mut issues = Vec::new();
    if let Some(last) = expression.chars().last()
        && INVALID_FINAL.contains(&last)
    {
        issues.push(ValidationIssue::new(
            ErrorKind::InvalidFinalCharacter,
            format!("'{last}' is an invalid final character in `{expression}`"),
        ));
    }
    if let Some(message) = check_brackets(expression) {
        issues.push(ValidationIssue::new(ErrorKind::UnbalancedBrackets, message));
    }
    if let Some(suggestion) = insert_missing_stars(expression) {
        issues.push(ValidationIssue {
            kind: ErrorKind::MissingMultiplication,
            message: "You seem to be missing * characters.".to_string(),
            hint: Some(format!("Perhaps you meant to type `{suggestion}`")),
        });
    }
    issues
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Describe the first bracket mismatch, skipping string literals.
pub fn check_brackets(expression: &str) -> Option<String> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in expression.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => match stack.pop() {
                Some(open) if closing_for(open) == c => {}
                Some(open) => {
                    return Some(format!(
                        "Brackets do not match in `{expression}`: expected '{}' but found '{c}'.",
                        closing_for(open)
                    ));
                }
                None => {
                    return Some(format!(
                        "Brackets do not match in `{expression}`: '{c}' has no opening bracket."
                    ));
                }
            },
            _ => {}
        }
    }
    if in_string {
        return Some(format!("A string in `{expression}` is missing its closing quote."));
    }
    stack.last().map(|open| {
        format!("Brackets do not match in `{expression}`: '{open}' is never closed.")
    })
}

/// Return `expression` with `*` inserted where multiplication looks
/// implied, or `None` when nothing is missing.
///
/// Flags a number directly followed by a letter (`2x`), letters-digits-letter
/// inside an identifier (`c2A`, but not `Ax2`) and `)(`.
pub fn insert_missing_stars(expression: &str) -> Option<String> {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len() + 4);
    let mut changed = false;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            continue;
        }
        let Some(&next) = chars.get(i + 1) else { break };

        if c == ')' && next == '(' {
            out.push('*');
            changed = true;
            continue;
        }
        if !(c.is_ascii_digit() && next.is_alphabetic()) {
            continue;
        }

        let mut digits_start = i;
        while digits_start > 0 && chars[digits_start - 1].is_ascii_digit() {
            digits_start -= 1;
        }
        let mut token_start = digits_start;
        while token_start > 0 && is_word_char(chars[token_start - 1]) {
            token_start -= 1;
        }

        let implied = if token_start == digits_start {
            let before = digits_start.checked_sub(1).map(|j| chars[j]);
            let exponent = matches!(next, 'e' | 'E')
                && chars
                    .get(i + 2)
                    .is_some_and(|d| d.is_ascii_digit() || *d == '-' || *d == '+');
            before != Some('.') && !exponent
        } else {
            chars[digits_start - 1].is_alphabetic()
        };
        if implied {
            out.push('*');
            changed = true;
        }
    }

    changed.then_some(out)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '%'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("n:n+1"), (Some("n"), "n+1"));
        assert_eq!(split_assignment(" a : x^2 "), (Some("a"), "x^2"));
        assert_eq!(split_assignment("x^2"), (None, "x^2"));
        assert_eq!(split_assignment("f(x):=x^2"), (None, "f(x):=x^2"));
        assert_eq!(split_assignment("f:=x"), (None, "f:=x"));
        assert_eq!(split_assignment("\"a:b\""), (None, "\"a:b\""));
        assert_eq!(split_assignment("A[1,2]:3"), (Some("A"), "A[1,2]:3"));
        assert_eq!(split_assignment(" L [2] : x "), (Some("L"), "L [2] : x"));
        assert_eq!(split_assignment("f[x]:=x^2"), (None, "f[x]:=x^2"));
        assert_eq!(element_assignment_target("A:B[1]"), None);
    }

    #[test]
    fn test_missing_stars() {
        assert_eq!(insert_missing_stars("c2A").as_deref(), Some("c2*A"));
        assert_eq!(insert_missing_stars("2x+1").as_deref(), Some("2*x+1"));
        assert_eq!(insert_missing_stars("(x+1)(x-1)").as_deref(), Some("(x+1)*(x-1)"));
        assert_eq!(insert_missing_stars("c2A3B").as_deref(), Some("c2*A3*B"));
    }

    #[test]
    fn test_identifiers_with_digits_are_not_flagged() {
        for ok in ["Ax2", "double_cAx", "ApBx2", "xterm", "Ac2", "x_2a", "1e5", "1.5e-3", "\"2x\""] {
            assert_eq!(insert_missing_stars(ok), None, "{ok}");
        }
    }

    #[test]
    fn test_invalid_final_character() {
        let issues = validate("2*", ContextMode::Teacher, &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ErrorKind::InvalidFinalCharacter);
        assert_eq!(issues[0].message, "'*' is an invalid final character in `2*`");
    }

    #[test]
    fn test_brackets() {
        assert_eq!(check_brackets("f([1,2])"), None);
        assert_eq!(check_brackets("\"(\""), None);
        assert_eq!(
            check_brackets("x^2)").as_deref(),
            Some("Brackets do not match in `x^2)`: ')' has no opening bracket.")
        );
        assert_eq!(
            check_brackets("(x]").as_deref(),
            Some("Brackets do not match in `(x]`: expected ')' but found ']'.")
        );
        assert_eq!(
            check_brackets("[x").as_deref(),
            Some("Brackets do not match in `[x`: '[' is never closed.")
        );
    }

    #[test]
    fn test_forbidden_words_take_precedence() {
        let issues = validate("system(rm*)", ContextMode::Teacher, &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ErrorKind::ForbiddenWord);
        assert_eq!(issues[0].message, "The expression `system` is forbidden.");
    }

    #[test]
    fn test_binding_name_is_checked() {
        let issues = validate_binding(Some("system"), "1", ContextMode::Teacher, &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, ErrorKind::ForbiddenWord);
        assert_eq!(issues[0].message, "The expression `system` is forbidden.");

        let issues = validate_binding(Some("k"), "[1,2]", ContextMode::Teacher, &["k".to_string()]);
        assert_eq!(issues[0].kind, ErrorKind::ForbiddenWordForCall);

        assert!(validate_binding(Some("n"), "n+1", ContextMode::Student, &[]).is_empty());
    }

    #[test]
    fn test_missing_stars_issue_carries_hint() {
        let issues = validate("c2A", ContextMode::Teacher, &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "You seem to be missing * characters.");
        assert_eq!(issues[0].hint.as_deref(), Some("Perhaps you meant to type `c2*A`"));
    }

    #[test]
    fn test_valid_expression() {
        assert!(validate("a*sin(2*x)", ContextMode::Student, &[]).is_empty());
    }
}
