//! Z2monitor - Main Entry Point

use clap::Parser;
use std::process::ExitCode;
use tracing::info;
use z2monitor::{init_logging, run, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    info!("=== Z2monitor v{} ===", env!("CARGO_PKG_VERSION"));
    run(cli).await
}
