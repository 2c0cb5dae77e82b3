//! dfanalyst: single-dataset analysis tools over JSON-RPC or a shell.

use anyhow::{Context, Result};
use clap::Parser;
use dfanalyst::tools::tool_specs;
use dfanalyst::{Cli, Command, build_config, rpc, shell};
use dfanalyst_core::Analyst;
use dfanalyst_core::logging::init_logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_format)
        .context("Failed to initialize logging")?;

    let config = build_config(&cli.global)?;
    let analyst = Analyst::new(config);
    info!(session = %analyst.session_id().await, "Session started");

    match cli.command {
        Command::Serve => rpc::serve(&analyst).await.context("JSON-RPC transport failed")?,
        Command::Shell => shell::run(&analyst).await.context("Shell I/O failed")?,
        Command::Tools => print_tools(),
    }

    Ok(())
}

fn print_tools() {
    for spec in tool_specs() {
        println!("{}", spec.name);
        println!("    {}", spec.description);
        let required = spec.required_params();
        if !required.is_empty() {
            println!("    required: {}", required.join(", "));
        }
        let optional = spec.optional_params();
        if !optional.is_empty() {
            println!("    optional: {}", optional.join(", "));
        }
    }
}
