// Firenet stove client
//
// Discovery, state polling, and control updates on top of a
// `SessionClient`. Each call transparently logs in again once when the
// session has expired; a second rejection is reported as an
// authentication failure instead of being retried further.

use std::future::Future;

use tracing::{debug, warn};

use crate::discovery::parse_stove_list;
use crate::error::Error;
use crate::models::{ControlUpdate, StoveDescriptor, StovePayload};
use crate::session::SessionClient;

/// Summary page listing every stove on the account.
pub const SUMMARY_PATH: &str = "/web/summary";

/// Client for the stove endpoints of the Firenet service.
pub struct StoveClient {
    session: SessionClient,
}

impl StoveClient {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// The underlying session (for login, logout, and auth checks).
    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    /// List the stoves registered on the account, in page order.
    ///
    /// A page that loads fine but lists no stove is a `Discovery` error.
    pub async fn discover_stoves(&self) -> Result<Vec<StoveDescriptor>, Error> {
        let html = self
            .with_reauth("discover_stoves", || self.session.get_text(SUMMARY_PATH))
            .await?;

        let stoves = parse_stove_list(&html);
        if stoves.is_empty() {
            return Err(Error::Discovery {
                message: format!(
                    "{SUMMARY_PATH} contained no stove entries for {}",
                    self.session.username()
                ),
            });
        }
        debug!(count = stoves.len(), "discovered stoves");
        Ok(stoves)
    }

    /// Fetch the current state document of a stove.
    pub async fn fetch_state(&self, stove_id: &str) -> Result<StovePayload, Error> {
        let path = status_path(stove_id);
        self.with_reauth("fetch_state", || self.session.get_json(&path))
            .await
    }

    /// Post a single control update.
    ///
    /// The service may clamp, round, or silently ignore the value; fetch
    /// the state afterwards to learn what was actually applied.
    pub async fn send_command(&self, stove_id: &str, update: &ControlUpdate) -> Result<(), Error> {
        let path = controls_path(stove_id);
        debug!(stove_id, field = %update.field, "sending control update");
        self.with_reauth("send_command", || self.session.post_json(&path, update))
            .await
    }

    /// Run `call`; on session expiry log in again and run it exactly once more.
    async fn with_reauth<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let generation = self.session.generation();
        match call().await {
            Err(e) if e.is_auth_expired() => {
                debug!(operation, "session expired, logging in again");
                self.session.reconnect_if_stale(generation).await?;
            }
            other => return other,
        }

        match call().await {
            Err(e) if e.is_auth_expired() => {
                warn!(operation, "session rejected right after a fresh login");
                Err(Error::Authentication {
                    message: format!("{operation}: session rejected after re-authentication"),
                })
            }
            other => other,
        }
    }
}

fn status_path(stove_id: &str) -> String {
    format!("/api/client/{stove_id}/status")
}

fn controls_path(stove_id: &str) -> String {
    format!("/api/client/{stove_id}/controls")
}
