use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod workflow;

/// Generates robot worklists and solution-loading sheets for NAAT and LFA runs.
#[derive(Debug, Parser)]
#[command(name = "roboforge", version, about)]
struct Cli {
    /// Log engine decisions at debug level (overrides ROBOFORGE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mastermix build, sample transfer and loading sheet for a PCR/LAMP plan
    Naat {
        /// Exported experiment and mastermixes (.yaml, .yml or .json)
        #[arg(short, long)]
        input: PathBuf,
        /// Plate catalogue entries to add to or replace the standard plates
        #[arg(long)]
        plates: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Only dispense the reagents; skip the mixing and aliquoting steps
        #[arg(long)]
        mastermix_only: bool,
    },
    /// Strip-by-strip worklist and loading sheet for a lateral-flow assay
    Lfa {
        /// Exported protocol steps and plate configuration
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        plates: Option<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("ROBOFORGE_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!("--- Roboforge Worklist Generator ---");

    let report = match &cli.command {
        Command::Naat {
            input,
            plates,
            output_dir,
            mastermix_only,
        } => workflow::run_naat(
            input,
            plates.as_deref(),
            output_dir.as_deref(),
            !mastermix_only,
        )?,
        Command::Lfa {
            input,
            plates,
            output_dir,
        } => workflow::run_lfa(input, plates.as_deref(), output_dir.as_deref())?,
    };

    println!(
        "\nWorklist generation complete. {} file(s) are in '{}'",
        report.files.len(),
        report.output_dir.display()
    );
    Ok(())
}
