//! Display options threaded through every evaluation.

use crate::error::InvalidOption;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a product is typeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplicationSign {
    /// `a\cdot b`
    #[default]
    Dot,
    /// `a\times b`
    Cross,
    /// `a\,b`
    None,
}

impl MultiplicationSign {
    /// The LaTeX placed between two factors.
    pub fn latex(self) -> &'static str {
        match self {
            MultiplicationSign::Dot => "\\cdot ",
            MultiplicationSign::Cross => "\\times ",
            MultiplicationSign::None => "\\,",
        }
    }
}

impl FromStr for MultiplicationSign {
    type Err = InvalidOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dot" => Ok(MultiplicationSign::Dot),
            "cross" => Ok(MultiplicationSign::Cross),
            "none" => Ok(MultiplicationSign::None),
            _ => Err(InvalidOption {
                option: "multiplication sign",
                value: s.to_string(),
                expected: "dot, cross, none",
            }),
        }
    }
}

/// The brackets drawn around a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatrixParens {
    /// `\left[ ... \right]`
    #[default]
    #[serde(rename = "[")]
    Brackets,
    /// `\left( ... \right)`
    #[serde(rename = "(")]
    Parentheses,
    /// No delimiters
    #[serde(rename = "")]
    None,
}

impl MatrixParens {
    /// Opening and closing LaTeX, or `None` for a bare array.
    pub fn delimiters(self) -> Option<(&'static str, &'static str)> {
        match self {
            MatrixParens::Brackets => Some(("\\left[", "\\right]")),
            MatrixParens::Parentheses => Some(("\\left(", "\\right)")),
            MatrixParens::None => None,
        }
    }
}

impl FromStr for MatrixParens {
    type Err = InvalidOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "[" => Ok(MatrixParens::Brackets),
            "(" => Ok(MatrixParens::Parentheses),
            "" | "none" => Ok(MatrixParens::None),
            _ => Err(InvalidOption {
                option: "matrix parenthesis",
                value: s.to_string(),
                expected: "[, (, none",
            }),
        }
    }
}

/// Caller-supplied rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOptions {
    pub multiplication_sign: MultiplicationSign,
    pub matrix_parens: MatrixParens,
}

impl RenderOptions {
    pub fn with_multiplication_sign(mut self, sign: MultiplicationSign) -> Self {
        self.multiplication_sign = sign;
        self
    }

    pub fn with_matrix_parens(mut self, parens: MatrixParens) -> Self {
        self.matrix_parens = parens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplication_sign_from_str() {
        assert_eq!("cross".parse::<MultiplicationSign>(), Ok(MultiplicationSign::Cross));
        let err = "star".parse::<MultiplicationSign>().unwrap_err();
        assert!(err.to_string().contains("`star`"));
    }

    #[test]
    fn test_matrix_parens_from_str() {
        assert_eq!("(".parse::<MatrixParens>(), Ok(MatrixParens::Parentheses));
        assert_eq!("none".parse::<MatrixParens>(), Ok(MatrixParens::None));
        assert_eq!("".parse::<MatrixParens>(), Ok(MatrixParens::None));
        assert!("{".parse::<MatrixParens>().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let options: RenderOptions = toml::from_str(
            r#"
            multiplication-sign = "none"
            matrix-parens = "("
            "#,
        )
        .unwrap();
        assert_eq!(options.multiplication_sign, MultiplicationSign::None);
        assert_eq!(options.matrix_parens, MatrixParens::Parentheses);
    }

    #[test]
    fn test_missing_fields_default() {
        let options: RenderOptions = toml::from_str("").unwrap();
        assert_eq!(options, RenderOptions::default());
    }
}
