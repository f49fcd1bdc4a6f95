//! `spark fn` handler.

use crate::cli::{FunctionArgs, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    args: FunctionArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = util::open_session(resolved, &args.device).await?;

    let Some(name) = args.function else {
        let listing = output::render_names(
            global.output,
            session.function_names().iter().map(String::as_str),
            &format!("Functions available for core '{}':", args.device),
            &format!("No functions available for core '{}'.", args.device),
            output::should_color(global.color),
        );
        output::print_output(&listing, global.quiet);
        return Ok(());
    };

    let argument = args.argument.unwrap_or_default();
    let value = session.invoke_function(&name, &argument).await?;
    output::print_output(&output::render_value(global.output, &value), global.quiet);
    Ok(())
}
