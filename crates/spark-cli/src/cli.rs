//! Clap derive structures for the `spark` CLI.
//!
//! Defines the command tree, global flags, and shared types. Depends only
//! on clap + clap_complete so `build.rs` can pull it in for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// spark -- call functions and read variables on spark cloud devices
#[derive(Debug, Parser)]
#[command(
    name = "spark",
    version,
    about = "Talk to your spark devices from the command line",
    long_about = "Call device functions and read device variables through the spark Cloud.\n\n\
        Devices are registered once with `spark add <token>` and afterwards\n\
        addressed by name or id.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Cloud API base URL (overrides config)
    #[arg(long, env = "SPARK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "SPARK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Device cache file (defaults to ~/.sparkrc)
    #[arg(long, env = "SPARK_CACHE_FILE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Output format for values
    #[arg(
        long,
        short = 'o',
        env = "SPARK_OUTPUT",
        default_value = "plain",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one value per line (default)
    Plain,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a device function with an argument, or list available functions
    #[command(name = "fn")]
    Function(FunctionArgs),

    /// Read a device variable, or list available variables
    #[command(name = "var")]
    Variable(VariableArgs),

    /// Register every device behind a token, or a single device by id
    Add(AddArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── fn ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FunctionArgs {
    /// Device name or id
    pub device: String,

    /// Function to call; omit to list functions
    pub function: Option<String>,

    /// Argument passed to the function
    #[arg(allow_hyphen_values = true)]
    pub argument: Option<String>,
}

// ── var ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VariableArgs {
    /// Device name or id
    pub device: String,

    /// Variable to read; omit to list variables
    pub variable: Option<String>,

    /// Print this many updates, then stop
    #[arg(long = "number", short = 'n', value_name = "N", conflicts_with = "continuous")]
    pub count: Option<u64>,

    /// Print updates until interrupted
    #[arg(long, short = 'c')]
    pub continuous: bool,

    /// Update interval in milliseconds
    #[arg(long, short = 'i', value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

impl VariableArgs {
    /// Whether the variable should be polled instead of read once.
    pub fn polls(&self) -> bool {
        self.continuous || self.count.is_some()
    }
}

// ── add ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Access token
    pub token: String,

    /// Register only this device id
    pub id: Option<String>,
}

// ── completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
