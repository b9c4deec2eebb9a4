/*
 * expand.rs
 * Copyright (c) 2025 CASText contributors
 */

//! `castext expand`: print the expanded text of a template.
//!
//! Diagnostics go to stderr with source snippets. With `--json` a single
//! object carrying the display text, validity, diagnostics and the final
//! session is printed instead. Invalid templates exit non-zero either way.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use castext::CasText;
use castext_minicas::MiniCas;
use serde_json::json;
use tracing::info;

use crate::config::TemplateArgs;

#[derive(Debug)]
pub struct ExpandArgs {
    pub template: TemplateArgs,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub fn execute(args: ExpandArgs) -> Result<()> {
    let settings = args.template.settings()?;
    let text = super::load(&args.template.input, settings)?;

    let rendered = if args.json {
        let mut value = json_output(&text)?;
        value["input"] = json!(args.template.input.display().to_string());
        serde_json::to_string_pretty(&value)?
    } else {
        eprint!("{}", super::report(&text, &args.template.input));
        text.display().to_string()
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(output = %path.display(), "wrote expansion");
        }
        None => println!("{rendered}"),
    }

    if !text.is_valid() {
        anyhow::bail!(
            "{} failed validation with {} error(s)",
            args.template.input.display(),
            text.errors().len()
        );
    }
    Ok(())
}

fn json_output(text: &CasText<MiniCas>) -> Result<serde_json::Value> {
    let mut value = text.result().to_json();
    value["session"] = serde_json::to_value(text.session().bindings())?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_json_output_includes_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.txt");
        fs::write(&path, "{@b:a+1@}").unwrap();

        let settings = Settings {
            seed: vec!["a:1".to_string()],
            ..Settings::default()
        };
        let text = crate::commands::load(&path, settings).unwrap();
        let value = json_output(&text).unwrap();

        assert_eq!(value["display"], "\\({2}\\)");
        assert_eq!(value["valid"], true);
        assert_eq!(value["session"][0]["raw"], "a:1");
        assert_eq!(value["session"][1]["key"], "b");
    }

    #[test]
    fn test_plot_url_setting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.txt");
        fs::write(&path, "{@plot(x^2,[x,0,1])@}").unwrap();

        let settings = Settings {
            plot_url: Some("/media".to_string()),
            ..Settings::default()
        };
        let text = crate::commands::load(&path, settings).unwrap();
        assert!(text.is_valid());
        assert!(text.display().starts_with("<img src='/media/plot-"));
    }
}
