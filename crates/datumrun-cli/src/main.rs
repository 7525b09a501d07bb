//! Datumrun binary.
//!
//! Serves the local component catalog either interactively (line
//! protocol over stdio, `--serve`) or as a single-shot CLI run.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use datumrun_runtime::{CliBackend, Runtime, StdioBackend};

mod components;

fn main() -> ExitCode {
    // Logs go to stderr; stdout may carry the protocol stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "runtime failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = components::build_local_catalog()?;
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if let Some(serve) = args.iter().position(|a| a == "--serve") {
        args.remove(serve);
        info!("serving the line protocol over stdio");
        let backend = StdioBackend::stdio();
        Runtime::new(catalog, backend).start()?;
    } else {
        let backend = CliBackend::from_args(&catalog, args)?;
        Runtime::new(catalog, backend).start()?;
    }
    Ok(())
}
