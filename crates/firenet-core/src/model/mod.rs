// ── Domain model ──
//
// Typed projections over the loosely-typed stove state document.

pub mod control;
pub mod status;
pub mod stove;

mod value;

pub use control::{ControlKind, ControlSpec, WRITABLE_CONTROLS, control_spec};
pub use status::{BURNING_STATES, StatusText, is_burning_state};
pub use stove::{ConvectionFan, Stove, StoveSnapshot};
