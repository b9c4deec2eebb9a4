//! Command implementations for the CASText CLI
//!
//! Each command module handles the CLI interface and delegates to the
//! `castext` crate for the actual work.

pub mod check;
pub mod expand;
pub mod facts;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use castext::{CasText, PlaceholderPlots, Session};
use castext_minicas::MiniCas;
use tracing::{debug, warn};

use crate::config::Settings;

/// Read the template at `path` and bind it to a session seeded from `settings`.
pub fn load(path: &Path, settings: Settings) -> Result<CasText<MiniCas>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;

    let mut seed = Session::with_options(settings.render);
    for assignment in &settings.seed {
        let appended = seed.add_assignment(&MiniCas, assignment);
        match &appended.error {
            Some(err) => warn!(key = %appended.key, error = %err, "seed binding failed"),
            None => debug!(key = %appended.key, "seeded"),
        }
    }

    let text = CasText::with_options(&source, &seed, MiniCas, settings.expand);
    Ok(match settings.plot_url {
        Some(url) => text.with_plot_renderer(PlaceholderPlots::new(url)),
        None => text,
    })
}

/// Every diagnostic, with source snippets pointing into the template.
pub fn report(text: &CasText<MiniCas>, path: &Path) -> String {
    let ctx = text.template().source_context(path.display().to_string());
    text.diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.to_text(Some(&ctx)))
        .collect()
}
