//! # vaultport CLI
//!
//! Command-line interface for converting a wiki vault into one of two
//! publishing dialects.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vaultport_core::{run, Profile, RunPaths, RunSummary};

#[derive(Parser)]
#[command(name = "vaultport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the vault into a mirrored static-site content tree
    Site {
        /// Vault input directory
        #[arg(default_value = "./obsidian")]
        input: PathBuf,

        /// Converted content output directory
        #[arg(default_value = "./content")]
        output: PathBuf,

        /// Static asset output directory
        #[arg(default_value = "./static")]
        assets: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert the vault into a flat article directory with a
    /// reconciled images directory
    Article {
        /// Vault input directory
        #[arg(default_value = "./articles-vault")]
        input: PathBuf,

        /// Converted article output directory
        #[arg(default_value = "./articles")]
        output: PathBuf,

        /// Reconciled image output directory
        #[arg(default_value = "./images")]
        assets: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (profile, paths, json) = match cli.command {
        Commands::Site {
            input,
            output,
            assets,
            json,
        } => (
            Profile::site(),
            RunPaths {
                input,
                output,
                assets,
            },
            json,
        ),
        Commands::Article {
            input,
            output,
            assets,
            json,
        } => (
            Profile::article(),
            RunPaths {
                input,
                output,
                assets,
            },
            json,
        ),
    };

    let summary = run(profile, &paths).context("Conversion run failed")?;
    report(&summary, json)
}

fn report(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!(
            "{} converted, {} skipped, {} assets copied, {} deleted, {} dangling",
            summary.converted,
            summary.skipped,
            summary.assets_copied,
            summary.assets_deleted,
            summary.dangling_refs
        );
    }
    Ok(())
}
