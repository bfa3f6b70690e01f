//! Stove listing, plus the serializable stove view shared by other handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use firenet_core::{ConvectionFan, Coordinator, StatusText, Stove};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Serializable view ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FanView {
    pub active: bool,
    pub level: Option<i64>,
    pub area: Option<i64>,
}

/// Everything the CLI reports about one stove, read from a single
/// snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StoveView {
    pub id: String,
    pub name: String,
    pub status: StatusText,
    pub on: bool,
    pub burning: bool,
    pub frost_protection: bool,
    pub stove_temperature: Option<f64>,
    pub room_temperature: Option<f64>,
    pub thermostat: Option<f64>,
    pub set_back_temperature: Option<f64>,
    pub main_state: Option<i64>,
    pub sub_state: Option<i64>,
    pub operating_mode: Option<i64>,
    pub heating_power: Option<i64>,
    pub room_power_request: Option<i64>,
    pub comfort_heating_times: bool,
    pub convection_fans: [FanView; 2],
    pub pellet_runtime_hours: Option<f64>,
    pub feed_rate_total: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Stove> for StoveView {
    fn from(s: &Stove) -> Self {
        let fan = |f| FanView {
            active: s.is_fan_active(f),
            level: s.get_fan_level(f),
            area: s.get_fan_area(f),
        };
        Self {
            id: s.get_id().to_owned(),
            name: s.get_name().to_owned(),
            status: s.get_status_text(),
            on: s.is_stove_on(),
            burning: s.is_stove_burning(),
            frost_protection: s.is_frost_protection_active(),
            stove_temperature: s.get_stove_temperature(),
            room_temperature: s.get_room_temperature(),
            thermostat: s.get_stove_thermostat(),
            set_back_temperature: s.get_stove_set_back_temperature(),
            main_state: s.get_main_status_code(),
            sub_state: s.get_sub_status_code(),
            operating_mode: s.get_operating_mode(),
            heating_power: s.get_heating_power(),
            room_power_request: s.get_room_power_request(),
            comfort_heating_times: s.is_comfort_heating_times_active(),
            convection_fans: [fan(ConvectionFan::One), fan(ConvectionFan::Two)],
            pellet_runtime_hours: s.get_pellet_runtime_hours(),
            feed_rate_total: s.get_feed_rate_total(),
            updated_at: s.snapshot().updated_at,
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StoveRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Stove")]
    stove: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Thermostat")]
    thermostat: String,
    #[tabled(rename = "On")]
    on: &'static str,
    #[tabled(rename = "Burning")]
    burning: &'static str,
}

impl From<&StoveView> for StoveRow {
    fn from(v: &StoveView) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            status: v.status.to_string(),
            stove: output::fmt_temperature(v.stove_temperature),
            room: output::fmt_temperature(v.room_temperature),
            thermostat: output::fmt_temperature(v.thermostat),
            on: output::fmt_flag(v.on),
            burning: output::fmt_flag(v.burning),
        }
    }
}

pub fn views(stoves: &[Arc<Stove>]) -> Vec<StoveView> {
    stoves.iter().map(|s| StoveView::from(s.as_ref())).collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    coordinator.refresh().await?;

    let snap = views(&coordinator.get_stoves());
    let out = output::render_list(&global.output, &snap, |v| StoveRow::from(v), |v| v.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
