//! Stove model and polling coordinator on top of `firenet-api`.
//!
//! - **[`Coordinator`]** — One per account. [`setup()`](Coordinator::setup)
//!   logs in and discovers stoves, [`refresh()`](Coordinator::refresh) runs
//!   one all-or-nothing polling tick, and a background task repeats it on
//!   the configured interval. [`Coordinator::oneshot()`] is the
//!   single-invocation mode used by the CLI.
//!
//! - **[`Stove`]** — Typed projections over the last state document a stove
//!   reported: temperatures, derived [`StatusText`], control settings, and
//!   validated command construction.
//!
//! - **Diagnostics** ([`diagnostics`]) — Redacted dump of coordinator and
//!   stove state.

pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, DEFAULT_TEMPERATURE, Platform};
pub use coordinator::{Coordinator, CoordinatorState};
pub use diagnostics::DiagnosticsReport;
pub use error::CoreError;
pub use model::{ConvectionFan, StatusText, Stove, StoveSnapshot, WRITABLE_CONTROLS, control_spec};

pub use firenet_api::DEFAULT_BASE_URL;
