//! `watch`: poll on an interval and print a line per stove after each tick.

use std::time::Duration;

use chrono::Local;
use tracing::info;

use firenet_core::{Coordinator, CoordinatorConfig, CoordinatorState};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::stoves::StoveView;

fn line(view: &StoveView, color: bool) -> String {
    format!(
        "{} {:<16} {:<18} stove {:>8}  room {:>8}  thermostat {:>8}",
        Local::now().format("%H:%M:%S"),
        view.name,
        output::paint_status(view.status, color),
        output::fmt_temperature(view.stove_temperature),
        output::fmt_temperature(view.room_temperature),
        output::fmt_temperature(view.thermostat),
    )
}

pub async fn handle(
    mut config: CoordinatorConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.refresh_interval = Duration::from_secs(secs);
    }
    if config.refresh_interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let coordinator = Coordinator::new(config);
    let mut state = coordinator.state();
    coordinator.setup().await?;
    info!(stoves = coordinator.get_stoves().len(), "watching");

    let color = output::should_color(&global.color);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                match current {
                    // Setup also ends in Ready, before any stove has state.
                    CoordinatorState::Ready if coordinator.last_update_success() => {
                        for stove in coordinator.get_stoves() {
                            let view = StoveView::from(stove.as_ref());
                            output::print_output(&line(&view, color), global.quiet);
                        }
                    }
                    CoordinatorState::Degraded => {
                        let reason = coordinator.last_error().unwrap_or_default();
                        eprintln!("{} update failed: {reason}", Local::now().format("%H:%M:%S"));
                    }
                    _ => {}
                }
            }
        }
    }

    coordinator.teardown().await;
    Ok(())
}
