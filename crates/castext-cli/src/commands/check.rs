/*
 * check.rs
 * Copyright (c) 2025 CASText contributors
 */

//! `castext check`: validate a template without printing its expansion.

use anyhow::Result;
use castext::CasText;
use castext_minicas::MiniCas;
use std::fmt::Write;

use crate::config::TemplateArgs;

#[derive(Debug)]
pub struct CheckArgs {
    pub template: TemplateArgs,
    pub words: Vec<String>,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let settings = args.template.settings()?;
    let text = super::load(&args.template.input, settings)?;

    eprint!("{}", super::report(&text, &args.template.input));
    print!("{}", summary(&text, &args.words));

    if !text.is_valid() {
        anyhow::bail!("{} failed validation", args.template.input.display());
    }
    Ok(())
}

fn summary(text: &CasText<MiniCas>, words: &[String]) -> String {
    let mut out = String::new();
    let expressions = text.template().raw_expressions();
    writeln!(out, "expressions: {}", expressions.len()).unwrap();
    for expression in expressions {
        writeln!(out, "  {expression}").unwrap();
    }
    if !words.is_empty() {
        let found = text.check_external_forbidden_words(words);
        writeln!(out, "uses {}: {}", words.join(", "), if found { "yes" } else { "no" }).unwrap();
    }
    writeln!(out, "valid: {}", text.is_valid()).unwrap();
    out
}
