//! dtc command-line interface.

use clap::Parser;
use dtc::{Options, Source};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dtc", version, about = "Decision-table compiler")]
struct Cli {
    /// Quick mode: accept the first complete solution instead of searching
    /// for the shallowest one
    #[arg(short = 'q', long = "quick")]
    quick: bool,

    /// Decision-table CSV files, compiled in order into one program
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let prog = std::env::args()
        .next()
        .unwrap_or_else(|| "dtc".to_string());

    let mut sources = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match std::fs::read(path) {
            Ok(data) => sources.push(Source {
                path: path.display().to_string(),
                data,
            }),
            Err(e) => {
                eprintln!("{prog}: cannot read {}: {e}", path.display());
                process::exit(1);
            }
        }
    }

    let stdout = io::stdout().lock();
    match dtc::compile(&sources, Options { quick: cli.quick }, stdout) {
        Ok(stats) => {
            tracing::info!(
                names = stats.names,
                inferences = stats.inferences,
                independent_values = stats.independent_values,
                depth = stats.depth,
                "compiled"
            );
        }
        Err(errors) => {
            for e in errors {
                eprintln!("{prog}: {e}");
            }
            process::exit(1);
        }
    }
}
