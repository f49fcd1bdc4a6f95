//! `spark` binary entry point.

mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    let Err(err) = run(cli).await else {
        return ExitCode::SUCCESS;
    };
    let code = u8::try_from(err.exit_code()).unwrap_or(1);
    eprintln!("{:?}", miette::Report::new(err));
    ExitCode::from(code)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    if let Command::Completions(args) = command {
        print_completions(args.shell);
        return Ok(());
    }

    let resolved = config::resolve(&global)?;
    tracing::debug!(?command, api_url = %resolved.cloud.url, "running");
    commands::dispatch(command, &resolved, &global).await
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_owned();
    clap_complete::generate(shell, &mut cmd, bin, &mut std::io::stdout());
}

// ── Logging ─────────────────────────────────────────────────────────

/// Diagnostics go to stderr so command output stays pipeable.
/// `RUST_LOG` overrides the level picked from `-v`/`-q`.
fn init_tracing(global: &GlobalOpts) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(global.verbose, global.quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
