// ── Operating status ──

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

/// Main-state codes during which pellets are combusting:
/// ignition, start-up, running, cleaning.
pub const BURNING_STATES: [i64; 4] = [2, 3, 4, 5];

/// Derived operating status of a stove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusText {
    Off,
    Starting,
    Running,
    Cleaning,
    Cooldown,
    Error,
    FrostProtection,
    Unknown,
}

impl StatusText {
    /// Map a `statusMainState` code.
    pub fn from_main_state(code: i64) -> Self {
        match code {
            0 | 1 => Self::Off,
            2 | 3 => Self::Starting,
            4 => Self::Running,
            5 => Self::Cleaning,
            6 => Self::Cooldown,
            7..=9 => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Frost protection wins over whatever the main state reports, faults included.
    pub fn resolve(frost_protection: bool, main_state: Option<i64>) -> Self {
        if frost_protection {
            return Self::FrostProtection;
        }
        main_state.map_or(Self::Unknown, Self::from_main_state)
    }
}

pub fn is_burning_state(code: i64) -> bool {
    BURNING_STATES.contains(&code)
}
