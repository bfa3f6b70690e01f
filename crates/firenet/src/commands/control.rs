//! `set`: send a control update and show the confirmed state.

use firenet_core::{Coordinator, CoreError};
use tracing::debug;

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

use super::stoves::StoveView;
use super::{status, util};

pub async fn handle(
    coordinator: &Coordinator,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let stove = util::find_stove(coordinator, &args.stove)?;
    let value = util::parse_value(&args.value);
    debug!(stove_id = stove.get_id(), field = %args.field, %value, "set");

    let stove = coordinator
        .send_command(stove.get_id(), &args.field, &value)
        .await
        .map_err(|e| match e {
            CoreError::Validation { message } => CliError::Validation {
                field: args.field.clone(),
                reason: message,
            },
            other => other.into(),
        })?;

    if !global.quiet {
        eprintln!("✓ Set {} on '{}'", args.field, stove.get_name());
    }

    let view = StoveView::from(stove.as_ref());
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &view, |v| status::detail(v, color), |v| {
        v.id.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
