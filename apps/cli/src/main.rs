//! ai-protocol CLI — protocol injection and just-in-time documentation context.
//!
//! Bootstraps the AI agent protocol into target projects, checks version
//! drift, and serves registry-keyed documentation sections to agents.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("Warning: {e}");
    }

    // Usage errors exit 1, not clap's 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
