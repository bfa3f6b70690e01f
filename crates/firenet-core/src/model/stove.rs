// ── Stove domain type ──
//
// Typed, read-only view over the last state document a stove reported.
// The document is swapped in whole on every apply; accessors project a
// single loaded snapshot and never perform I/O.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use firenet_api::{ControlUpdate, StoveDescriptor, StovePayload};

use super::control::control_spec;
use super::status::{StatusText, is_burning_state};
use super::value::{as_f64, as_i64, is_truthy};
use crate::error::CoreError;

// Sensor keys
const FLAME_TEMPERATURE: &str = "inputFlameTemperature";
const ROOM_TEMPERATURE: &str = "inputRoomTemperature";
const MAIN_STATE: &str = "statusMainState";
const SUB_STATE: &str = "statusSubState";
const FROST_STARTED: &str = "statusFrostStarted";
const PELLET_RUNTIME: &str = "parameterRuntimePellets";
const FEED_RATE_TOTAL: &str = "parameterFeedRateTotal";

// Control keys
const TARGET_TEMPERATURE: &str = "targetTemperature";
const SET_BACK_TEMPERATURE: &str = "setBackTemperature";
const ON_OFF: &str = "onOff";
const OPERATING_MODE: &str = "operatingMode";
const HEATING_POWER: &str = "heatingPower";
const ROOM_POWER_REQUEST: &str = "RoomPowerRequest";
const COMFORT_HEATING_TIMES: &str = "heatingTimesActiveForComfort";

/// One of the two convection fans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvectionFan {
    One,
    Two,
}

impl ConvectionFan {
    fn key(self, suffix: &str) -> String {
        let n = match self {
            Self::One => 1,
            Self::Two => 2,
        };
        format!("convectionFan{n}{suffix}")
    }
}

/// Everything known about a stove as of one apply.
#[derive(Debug, Clone, Default)]
pub struct StoveSnapshot {
    /// Last applied document; `None` until the first successful fetch.
    pub payload: Option<Arc<StovePayload>>,
    /// Bumped on every apply.
    pub revision: u64,
    pub updated_at: Option<DateTime<Utc>>,
    /// Most recent stove temperature seen in any payload.
    pub last_observed_temperature: Option<f64>,
    /// The latest payload lacked a stove temperature an earlier one had.
    pub temperature_regressed: bool,
}

/// A discovered stove. Identity is fixed at discovery; state is replaced
/// atomically on every successful fetch.
#[derive(Debug)]
pub struct Stove {
    id: String,
    name: String,
    default_temperature: f64,
    snapshot: ArcSwap<StoveSnapshot>,
    /// Held across "send, re-fetch, apply" and around a tick's commit.
    writes: Mutex<()>,
}

impl Stove {
    pub fn new(id: impl Into<String>, name: impl Into<String>, default_temperature: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            default_temperature,
            snapshot: ArcSwap::from_pointee(StoveSnapshot::default()),
            writes: Mutex::new(()),
        }
    }

    pub fn from_descriptor(descriptor: StoveDescriptor, default_temperature: f64) -> Self {
        let name = if descriptor.name.is_empty() {
            descriptor.stove_id.clone()
        } else {
            descriptor.name
        };
        Self::new(descriptor.stove_id, name, default_temperature)
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The current snapshot. Use it when several fields must come from
    /// the same poll cycle.
    pub fn snapshot(&self) -> Arc<StoveSnapshot> {
        self.snapshot.load_full()
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.load().revision
    }

    pub fn has_state(&self) -> bool {
        self.snapshot.load().payload.is_some()
    }

    /// Raw last-applied document, for diagnostics.
    pub fn get_state(&self) -> Option<Arc<StovePayload>> {
        self.snapshot.load().payload.clone()
    }

    // ── Mutation (coordinator only) ──────────────────────────────

    /// Replace the stored document with `payload`.
    pub(crate) fn apply(&self, payload: StovePayload) {
        let previous = self.snapshot.load();
        let temperature = payload.sensor(FLAME_TEMPERATURE).and_then(as_f64);
        let next = StoveSnapshot {
            payload: Some(Arc::new(payload)),
            revision: previous.revision + 1,
            updated_at: Some(Utc::now()),
            last_observed_temperature: temperature.or(previous.last_observed_temperature),
            temperature_regressed: temperature.is_none()
                && previous.last_observed_temperature.is_some(),
        };
        self.snapshot.store(Arc::new(next));
    }

    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    // ── Temperatures ─────────────────────────────────────────────

    pub fn get_stove_temperature(&self) -> Option<f64> {
        self.sensor_f64(FLAME_TEMPERATURE)
    }

    pub fn get_room_temperature(&self) -> Option<f64> {
        self.sensor_f64(ROOM_TEMPERATURE)
    }

    /// Target temperature. Falls back to the configured default when the
    /// stove has reported state but no usable target.
    pub fn get_stove_thermostat(&self) -> Option<f64> {
        let snapshot = self.snapshot.load();
        let payload = snapshot.payload.as_ref()?;
        Some(
            payload
                .control(TARGET_TEMPERATURE)
                .and_then(as_f64)
                .unwrap_or(self.default_temperature),
        )
    }

    pub fn get_stove_set_back_temperature(&self) -> Option<f64> {
        self.control_f64(SET_BACK_TEMPERATURE)
    }

    pub fn last_observed_temperature(&self) -> Option<f64> {
        self.snapshot.load().last_observed_temperature
    }

    pub fn temperature_regressed(&self) -> bool {
        self.snapshot.load().temperature_regressed
    }

    // ── Status ───────────────────────────────────────────────────

    pub fn is_stove_on(&self) -> bool {
        self.control(ON_OFF).is_some_and(|v| is_truthy(&v))
    }

    pub fn is_stove_burning(&self) -> bool {
        self.get_main_status_code().is_some_and(is_burning_state)
    }

    pub fn is_frost_protection_active(&self) -> bool {
        self.sensor(FROST_STARTED).is_some_and(|v| is_truthy(&v))
    }

    pub fn get_main_status_code(&self) -> Option<i64> {
        self.sensor_i64(MAIN_STATE)
    }

    pub fn get_sub_status_code(&self) -> Option<i64> {
        self.sensor_i64(SUB_STATE)
    }

    pub fn get_status_text(&self) -> StatusText {
        let snapshot = self.snapshot.load();
        let Some(payload) = snapshot.payload.as_ref() else {
            return StatusText::Unknown;
        };
        let frost = payload.sensor(FROST_STARTED).is_some_and(is_truthy);
        StatusText::resolve(frost, payload.sensor(MAIN_STATE).and_then(as_i64))
    }

    // ── Settings ─────────────────────────────────────────────────

    pub fn get_operating_mode(&self) -> Option<i64> {
        self.control_i64(OPERATING_MODE)
    }

    pub fn get_heating_power(&self) -> Option<i64> {
        self.control_i64(HEATING_POWER)
    }

    pub fn get_room_power_request(&self) -> Option<i64> {
        self.control_i64(ROOM_POWER_REQUEST)
    }

    pub fn is_comfort_heating_times_active(&self) -> bool {
        self.control(COMFORT_HEATING_TIMES)
            .is_some_and(|v| is_truthy(&v))
    }

    pub fn is_fan_active(&self, fan: ConvectionFan) -> bool {
        self.control(&fan.key("Active"))
            .is_some_and(|v| is_truthy(&v))
    }

    pub fn get_fan_level(&self, fan: ConvectionFan) -> Option<i64> {
        self.control_i64(&fan.key("Level"))
    }

    pub fn get_fan_area(&self, fan: ConvectionFan) -> Option<i64> {
        self.control_i64(&fan.key("Area"))
    }

    // ── Counters ─────────────────────────────────────────────────

    pub fn get_pellet_runtime_hours(&self) -> Option<f64> {
        self.sensor_f64(PELLET_RUNTIME)
    }

    pub fn get_feed_rate_total(&self) -> Option<f64> {
        self.sensor_f64(FEED_RATE_TOTAL)
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate a control update for this stove and build the wire form.
    /// Never touches the network.
    pub fn build_command(&self, field: &str, value: &Value) -> Result<ControlUpdate, CoreError> {
        let spec = control_spec(field).ok_or_else(|| {
            CoreError::validation(format!("{field} is not a writable control"))
        })?;
        Ok(ControlUpdate {
            field: spec.field.to_owned(),
            value: spec.encode(value)?,
        })
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn sensor(&self, key: &str) -> Option<Value> {
        let snapshot = self.snapshot.load();
        snapshot.payload.as_ref()?.sensor(key).cloned()
    }

    fn control(&self, key: &str) -> Option<Value> {
        let snapshot = self.snapshot.load();
        snapshot.payload.as_ref()?.control(key).cloned()
    }

    fn sensor_f64(&self, key: &str) -> Option<f64> {
        self.sensor(key).as_ref().and_then(as_f64)
    }

    fn sensor_i64(&self, key: &str) -> Option<i64> {
        self.sensor(key).as_ref().and_then(as_i64)
    }

    fn control_f64(&self, key: &str) -> Option<f64> {
        self.control(key).as_ref().and_then(as_f64)
    }

    fn control_i64(&self, key: &str) -> Option<i64> {
        self.control(key).as_ref().and_then(as_i64)
    }
}
