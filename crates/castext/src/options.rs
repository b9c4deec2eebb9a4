/*
 * options.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Expansion options.

use serde::Deserialize;

/// Who authored the template.
///
/// Student-facing text is validated against an additional forbidden word
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    #[default]
    Teacher,
    Student,
}

impl ContextMode {
    pub fn is_strict(self) -> bool {
        self == ContextMode::Student
    }
}

/// Options that apply to a single expansion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExpandOptions {
    pub mode: ContextMode,
    /// Words forbidden for this expansion only, on top of the global list.
    pub forbidden_words: Vec<String>,
}

impl ExpandOptions {
    pub fn with_mode(mut self, mode: ContextMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_forbidden_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden_words = words.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_toml() {
        let options: ExpandOptions = toml::from_str(
            r#"
            mode = "student"
            forbidden-words = ["diff", "int"]
            "#,
        )
        .unwrap();
        assert_eq!(options.mode, ContextMode::Student);
        assert_eq!(options.forbidden_words, vec!["diff", "int"]);
    }

    #[test]
    fn test_defaults() {
        let options: ExpandOptions = toml::from_str("").unwrap();
        assert_eq!(options, ExpandOptions::default());
        assert!(!options.mode.is_strict());
    }
}
