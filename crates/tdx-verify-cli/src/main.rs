use anyhow::Context;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::error;

use tdx_verify_cli::{init_tracing, workflow, Args, VerifierConfig};

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("failed to set tracing subscriber: {e}");
    }

    match run_cli(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("verification failed: {e:#}");
            println!("✗ {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(args: &Args) -> anyhow::Result<()> {
    let config = VerifierConfig::from_env(args.verbose).context("invalid configuration")?;
    let mut out = io::stdout().lock();
    workflow::run(&config, &mut out)?;
    Ok(())
}
