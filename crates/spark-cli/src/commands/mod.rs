//! Command dispatch: bridges CLI args -> core sessions -> output formatting.

pub mod add;
pub mod function;
pub mod util;
pub mod variable;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Function(args) => function::handle(args, resolved, global).await,
        Command::Variable(args) => variable::handle(args, resolved, global).await,
        Command::Add(args) => add::handle(args, resolved, global).await,
        // Completions is handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
