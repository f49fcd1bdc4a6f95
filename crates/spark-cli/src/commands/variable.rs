//! `spark var` handler: list, read once, or poll.

use std::time::Duration;

use futures_util::StreamExt;
use spark_core::{AutoUpdate, DeviceSession};

use crate::cli::{GlobalOpts, VariableArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    args: VariableArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = util::open_session(resolved, &args.device).await?;
    let color = output::should_color(global.color);

    let Some(ref name) = args.variable else {
        let listing = output::render_names(
            global.output,
            session.variable_names(),
            &format!("Variables available for core '{}':", args.device),
            &format!("No variables available for core '{}'.", args.device),
            color,
        );
        output::print_output(&listing, global.quiet);
        return Ok(());
    };

    if !args.polls() {
        let value = session.read_variable(name).await?;
        output::print_output(&output::render_value(global.output, &value), global.quiet);
        return Ok(());
    }

    let interval = args
        .interval
        .map_or(resolved.cloud.poll_interval, Duration::from_millis);
    poll(&session, name, interval, args.count, global, color).await
}

/// Print updates until `limit` have arrived, or until Ctrl-C when unlimited.
///
/// Failed ticks count toward the limit.
async fn poll(
    session: &DeviceSession,
    name: &str,
    interval: Duration,
    limit: Option<u64>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if limit == Some(0) {
        return Ok(());
    }

    let handle = session.variable(name)?;
    let mut updates = handle.updates();
    handle.set_auto_update(AutoUpdate::Every(interval));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                break;
            }
            update = updates.next() => {
                let Some(update) = update else { break };
                match update.result {
                    Ok(value) => output::print_output(
                        &output::render_value(global.output, &value),
                        global.quiet,
                    ),
                    Err(err) => eprintln!("{}{err}", output::error_prefix(color)),
                }

                seen += 1;
                if limit.is_some_and(|n| seen >= n) {
                    break;
                }
            }
        }
    }

    handle.disable_auto_update();
    Ok(())
}
