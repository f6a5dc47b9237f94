mod cli;
#[cfg(feature = "tui")]
mod tui;

use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    // Must happen before the runtime spawns its worker threads.
    trackit_console::model::capture_local_offset();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let result = runtime.block_on(cli::run(args));
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "exiting with error");
    }
    result
}
