use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sheetcut_export::{FileFormat, LengthUnit};
use tracing_subscriber::EnvFilter;

mod error;
mod export;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "sheetcut", version, about = "Export cutting diagrams as DXF or SVG sheets", long_about = None)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write one file per sheet group of a cutting diagram
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Cutting diagram document (YAML or JSON)
    #[arg(value_name = "DIAGRAM")]
    pub diagram: PathBuf,

    /// Directory that receives the export folder
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Render configuration (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the configured file format
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<FileFormat>,

    /// Model length unit: in, ft, mm, cm or m
    #[arg(short, long, value_name = "UNIT", default_value = "mm")]
    pub units: LengthUnit,

    /// Skip the sheet group starting at this 1-based index (repeatable)
    #[arg(long = "hide-sheet", value_name = "INDEX")]
    pub hidden_sheets: Vec<usize>,

    /// Label parts by name instead of number
    #[arg(long)]
    pub names: bool,

    /// Write arcs as native curves
    #[arg(long)]
    pub smooth: bool,

    /// Replace an existing export folder without asking
    #[arg(short, long)]
    pub yes: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                CliError::usage(err.to_string()).exit_code()
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Export(args) => export::run_export(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code()
        }
    }
}
