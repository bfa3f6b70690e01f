//! Detailed view of one stove.

use firenet_core::Coordinator;

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::stoves::{FanView, StoveView};
use super::util;

fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn fmt_fan(fan: &FanView) -> String {
    if !fan.active {
        return "off".into();
    }
    format!(
        "level {}, area {}",
        fmt_opt(fan.level),
        fmt_opt(fan.area)
    )
}

/// Key/value detail block for the table format.
pub fn detail(view: &StoveView, color: bool) -> String {
    let [fan1, fan2] = &view.convection_fans;
    output::render_detail(&[
        ("ID", view.id.clone()),
        ("Name", view.name.clone()),
        ("Status", output::paint_status(view.status, color)),
        ("On", output::fmt_flag(view.on).into()),
        ("Burning", output::fmt_flag(view.burning).into()),
        ("Frost protection", output::fmt_flag(view.frost_protection).into()),
        ("Stove temperature", output::fmt_temperature(view.stove_temperature)),
        ("Room temperature", output::fmt_temperature(view.room_temperature)),
        ("Thermostat", output::fmt_temperature(view.thermostat)),
        ("Set-back", output::fmt_temperature(view.set_back_temperature)),
        (
            "Main / sub state",
            format!("{} / {}", fmt_opt(view.main_state), fmt_opt(view.sub_state)),
        ),
        ("Operating mode", fmt_opt(view.operating_mode)),
        ("Heating power", view.heating_power.map_or_else(|| "-".into(), |p| format!("{p}%"))),
        ("Room power request", fmt_opt(view.room_power_request)),
        (
            "Comfort heating times",
            output::fmt_flag(view.comfort_heating_times).into(),
        ),
        ("Convection fan 1", fmt_fan(fan1)),
        ("Convection fan 2", fmt_fan(fan2)),
        (
            "Pellet runtime",
            view.pellet_runtime_hours.map_or_else(|| "-".into(), |h| format!("{h} h")),
        ),
        (
            "Pellets burned",
            view.feed_rate_total.map_or_else(|| "-".into(), |kg| format!("{kg} kg")),
        ),
        (
            "Updated",
            view.updated_at.map_or_else(|| "-".into(), |t| t.to_rfc3339()),
        ),
    ])
}

pub async fn handle(
    coordinator: &Coordinator,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.refresh().await?;

    let stove = util::find_stove(coordinator, &args.stove)?;
    let view = StoveView::from(stove.as_ref());
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &view, |v| detail(v, color), |v| {
        v.status.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
