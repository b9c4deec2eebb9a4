//! CASText CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::TemplateArgs;

#[derive(Parser)]
#[command(name = "castext")]
#[command(version)]
#[command(about = "Expand and check CASText templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a template and print the result
    Expand {
        #[command(flatten)]
        template: TemplateArgs,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Print the result, diagnostics and session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a template and list its expressions without printing the expansion
    Check {
        #[command(flatten)]
        template: TemplateArgs,

        /// Report whether any of these words occur in the template or seed (repeatable)
        #[arg(long = "word", value_name = "WORD")]
        words: Vec<String>,
    },

    /// List the built-in fact sheets, or print one
    Facts {
        /// Fact sheet key
        key: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "castext=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Expand {
            template,
            output,
            json,
        } => commands::expand::execute(commands::expand::ExpandArgs {
            template,
            output,
            json,
        }),
        Commands::Check { template, words } => {
            commands::check::execute(commands::check::CheckArgs { template, words })
        }
        Commands::Facts { key } => commands::facts::execute(key.as_deref()),
    }
}
