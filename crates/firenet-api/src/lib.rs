// firenet-api: Async Rust client for the RIKA Firenet pellet-stove cloud service

pub mod client;
pub mod discovery;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use client::StoveClient;
pub use error::Error;
pub use models::{ControlUpdate, StoveDescriptor, StovePayload};
pub use session::{DEFAULT_BASE_URL, SessionClient};
pub use transport::TransportConfig;
