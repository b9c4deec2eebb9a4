/*
 * config.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Settings file and command-line overrides.
//!
//! A settings file is TOML:
//!
//! ```toml
//! mode = "student"
//! forbidden-words = ["diff", "int"]
//! seed = ["a:x^2", "b:(x+1)^2"]
//! plot-url = "/media/plots"
//!
//! [render]
//! multiplication-sign = "cross"
//! matrix-parens = "("
//! ```
//!
//! Flags given on the command line win over the file.

use castext::{ContextMode, ExpandOptions};
use castext_cas::{MatrixParens, MultiplicationSign, RenderOptions};
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid --var `{0}`: expected NAME=EXPRESSION")]
    InvalidVar(String),
}

/// Everything a settings file may contain.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    #[serde(flatten)]
    pub expand: ExpandOptions,
    pub render: RenderOptions,
    /// `name:expression` assignments evaluated before the template.
    pub seed: Vec<String>,
    /// Where plot images are linked from.
    pub plot_url: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Flags shared by every command that reads a template.
#[derive(Debug, Clone, Args)]
pub struct TemplateArgs {
    /// Template file
    pub input: PathBuf,

    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed binding, evaluated before the template (repeatable)
    #[arg(long = "var", value_name = "NAME=EXPRESSION")]
    pub vars: Vec<String>,

    /// Validate expressions as student input
    #[arg(long)]
    pub student: bool,

    /// Additional forbidden word (repeatable)
    #[arg(long = "forbid", value_name = "WORD")]
    pub forbid: Vec<String>,

    /// Multiplication sign: dot, cross or none
    #[arg(long)]
    pub multiplication_sign: Option<MultiplicationSign>,

    /// Matrix parentheses: "[", "(" or none
    #[arg(long)]
    pub matrix_parens: Option<MatrixParens>,

    /// Base URL of plot images
    #[arg(long, value_name = "URL")]
    pub plot_url: Option<String>,
}

impl TemplateArgs {
    /// The settings file, if any, with the flags applied on top.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if self.student {
            settings.expand.mode = ContextMode::Student;
        }
        settings
            .expand
            .forbidden_words
            .extend(self.forbid.iter().cloned());
        if let Some(sign) = self.multiplication_sign {
            settings.render.multiplication_sign = sign;
        }
        if let Some(parens) = self.matrix_parens {
            settings.render.matrix_parens = parens;
        }
        if let Some(url) = &self.plot_url {
            settings.plot_url = Some(url.clone());
        }
        for var in &self.vars {
            settings.seed.push(var_assignment(var)?);
        }
        Ok(settings)
    }
}

/// `a=x^2` becomes `a:x^2`.
fn var_assignment(var: &str) -> Result<String, ConfigError> {
    match var.split_once('=') {
        Some((name, expression)) if !name.trim().is_empty() && !expression.trim().is_empty() => {
            Ok(format!("{}:{}", name.trim(), expression.trim()))
        }
        _ => Err(ConfigError::InvalidVar(var.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn args(input: &str) -> TemplateArgs {
        TemplateArgs {
            input: PathBuf::from(input),
            config: None,
            vars: Vec::new(),
            student: false,
            forbid: Vec::new(),
            multiplication_sign: None,
            matrix_parens: None,
            plot_url: None,
        }
    }

    #[test]
    fn test_parse_settings() {
        let settings: Settings = toml::from_str(
            r#"
            mode = "student"
            forbidden-words = ["diff"]
            seed = ["a:2"]
            plot-url = "/media"

            [render]
            multiplication-sign = "cross"
            "#,
        )
        .unwrap();

        assert_eq!(settings.expand.mode, ContextMode::Student);
        assert_eq!(settings.expand.forbidden_words, vec!["diff"]);
        assert_eq!(settings.seed, vec!["a:2"]);
        assert_eq!(settings.plot_url.as_deref(), Some("/media"));
        assert_eq!(settings.render.multiplication_sign, MultiplicationSign::Cross);
        assert_eq!(settings.render.matrix_parens, MatrixParens::Brackets);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("castext.toml");
        fs::write(
            &path,
            "forbidden-words = [\"diff\"]\nseed = [\"a:1\"]\n[render]\nmatrix-parens = \"(\"\n",
        )
        .unwrap();

        let mut args = args("q.txt");
        args.config = Some(path);
        args.student = true;
        args.forbid = vec!["int".to_string()];
        args.vars = vec!["b = a+1".to_string()];
        args.matrix_parens = Some(MatrixParens::None);
        args.plot_url = Some("/plots".to_string());

        let settings = args.settings().unwrap();
        assert_eq!(settings.expand.mode, ContextMode::Student);
        assert_eq!(settings.expand.forbidden_words, vec!["diff", "int"]);
        assert_eq!(settings.seed, vec!["a:1", "b:a+1"]);
        assert_eq!(settings.render.matrix_parens, MatrixParens::None);
        assert_eq!(settings.plot_url.as_deref(), Some("/plots"));
    }

    #[test]
    fn test_invalid_var() {
        let mut args = args("q.txt");
        args.vars = vec!["nothing".to_string()];
        let err = args.settings().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar(_)));
        assert!(err.to_string().contains("NAME=EXPRESSION"));
    }

    #[test]
    fn test_missing_settings_file() {
        let mut args = args("q.txt");
        args.config = Some(PathBuf::from("/definitely/not/here.toml"));
        assert!(matches!(args.settings(), Err(ConfigError::Read { .. })));
    }
}
