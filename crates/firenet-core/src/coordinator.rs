// ── Coordinator ──
//
// Lifecycle management for one Firenet account: login, discovery,
// periodic polling, command round trips, and teardown. The single place
// consumers ask for the current known state of the account's stoves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use firenet_api::{SessionClient, StoveClient, StoveDescriptor, TransportConfig};

use crate::config::{CoordinatorConfig, Platform};
use crate::diagnostics::{
    AccountDiagnostics, CoordinatorDiagnostics, DiagnosticsReport, REDACTED, StoveDiagnostics,
    redact,
};
use crate::error::CoreError;
use crate::model::Stove;

// ── CoordinatorState ─────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoordinatorState {
    Unconfigured,
    Connecting,
    Discovering,
    Ready,
    Refreshing,
    /// The last tick failed; stoves keep their last-known state.
    Degraded,
}

#[derive(Debug, Clone, Default)]
struct UpdateStatus {
    success: bool,
    success_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Owns the stove client
/// (and through it the session), the discovered stoves, and the
/// background polling task.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    client: StoveClient,
    /// Discovery order; empty unless set up.
    stoves: ArcSwap<Vec<Arc<Stove>>>,
    status: ArcSwap<UpdateStatus>,
    state: watch::Sender<CoordinatorState>,
    /// Serializes ticks.
    tick_lock: Mutex<()>,
    /// Serializes setup against teardown.
    lifecycle: Mutex<()>,
    cancel: CancellationToken,
    /// Child token for the current setup -- cancelled on teardown,
    /// replaced on the next setup.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator for one account. Does NOT connect --
    /// call [`setup()`](Self::setup) to log in and discover stoves.
    pub fn new(config: CoordinatorConfig) -> Self {
        let session = SessionClient::new(
            config.base_url.clone(),
            config.username.clone(),
            config.password.clone(),
            TransportConfig::with_timeout(config.timeout),
        );
        let (state, _) = watch::channel(CoordinatorState::Unconfigured);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client: StoveClient::new(session),
                stoves: ArcSwap::from_pointee(Vec::new()),
                status: ArcSwap::from_pointee(UpdateStatus::default()),
                state,
                tick_lock: Mutex::new(()),
                lifecycle: Mutex::new(()),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the account configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Access the stove client.
    pub fn client(&self) -> &StoveClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Log in, discover stoves, and start background polling.
    ///
    /// Errors are returned as they occur and never retried; the
    /// coordinator falls back to `Unconfigured` with no session.
    pub async fn setup(&self) -> Result<(), CoreError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.current_state() != CoordinatorState::Unconfigured {
            debug!("coordinator already set up");
            return Ok(());
        }

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        self.set_state(CoordinatorState::Connecting);
        let descriptors = match self.connect_and_discover().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                self.inner.client.session().invalidate();
                self.set_state(CoordinatorState::Unconfigured);
                return Err(e.into());
            }
        };

        let default_temperature = self.inner.config.default_temperature;
        let stoves: Vec<Arc<Stove>> = descriptors
            .into_iter()
            .map(|d| Arc::new(Stove::from_descriptor(d, default_temperature)))
            .collect();
        info!(stoves = stoves.len(), "coordinator ready");
        self.inner.stoves.store(Arc::new(stoves));
        self.set_state(CoordinatorState::Ready);

        let period = self.inner.config.refresh_interval;
        if !period.is_zero() {
            let coordinator = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(coordinator, period, child)));
        }

        Ok(())
    }

    async fn connect_and_discover(&self) -> Result<Vec<StoveDescriptor>, firenet_api::Error> {
        self.inner.client.session().connect().await?;
        self.set_state(CoordinatorState::Discovering);
        self.inner.client.discover_stoves().await
    }

    /// Stop polling, drop the session, and forget every stove.
    ///
    /// An in-flight tick is cancelled and its results are discarded.
    pub async fn teardown(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.inner.cancel_child.lock().await.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        // A manual tick may still be unwinding from the cancellation.
        let _tick = self.inner.tick_lock.lock().await;

        if let Err(e) = self.inner.client.session().logout().await {
            debug!(error = %e, "logout failed (non-fatal)");
        }

        self.inner.stoves.store(Arc::new(Vec::new()));
        self.inner.status.store(Arc::new(UpdateStatus::default()));
        self.set_state(CoordinatorState::Unconfigured);
        info!("coordinator torn down");
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one tick: fetch every stove concurrently, then commit.
    ///
    /// All or nothing: payloads are applied only when every fetch
    /// succeeded. On any failure no stove changes, the coordinator turns
    /// `Degraded`, and the first error is returned.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _tick = self.inner.tick_lock.lock().await;
        let cancel = self.inner.cancel_child.lock().await.clone();

        let stoves = self.inner.stoves.load_full();
        if stoves.is_empty() || cancel.is_cancelled() {
            return Err(CoreError::NotConfigured);
        }

        self.set_state(CoordinatorState::Refreshing);
        let revisions: Vec<u64> = stoves.iter().map(|s| s.revision()).collect();

        let fetches = join_all(
            stoves
                .iter()
                .map(|stove| self.inner.client.fetch_state(stove.get_id())),
        );
        let results = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("refresh cancelled");
                return Err(CoreError::NotConfigured);
            }
            results = fetches => results,
        };

        let mut payloads = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (stove, result) in stoves.iter().zip(results) {
            match result {
                Ok(payload) => payloads.push(payload),
                Err(e) => {
                    warn!(stove_id = %stove.get_id(), error = %e, "state fetch failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            let err = CoreError::from(e);
            self.record_failure(&err);
            return Err(err);
        }
        if cancel.is_cancelled() {
            return Err(CoreError::NotConfigured);
        }

        for ((stove, payload), seen) in stoves.iter().zip(payloads).zip(revisions) {
            let _writes = stove.lock_writes().await;
            if stove.revision() == seen {
                stove.apply(payload);
            } else {
                debug!(stove_id = %stove.get_id(), "newer command state present, dropping tick payload");
            }
        }

        self.record_success();
        debug!(stoves = stoves.len(), "refresh complete");
        Ok(())
    }

    fn record_success(&self) {
        self.inner.status.store(Arc::new(UpdateStatus {
            success: true,
            success_time: Some(Utc::now()),
            last_error: None,
        }));
        self.set_state(CoordinatorState::Ready);
    }

    fn record_failure(&self, err: &CoreError) {
        let previous = self.inner.status.load();
        self.inner.status.store(Arc::new(UpdateStatus {
            success: false,
            success_time: previous.success_time,
            last_error: Some(err.to_string()),
        }));
        self.set_state(CoordinatorState::Degraded);
        warn!(error = %err, "refresh failed, stoves keep their last known state");
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate, send, and confirm a control update.
    ///
    /// The stove is re-fetched after the service accepts the update, so
    /// the returned stove reflects what the service actually applied.
    pub async fn send_command(
        &self,
        stove_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<Arc<Stove>, CoreError> {
        let stove = self.get_stove(stove_id).ok_or_else(|| {
            if self.inner.stoves.load().is_empty() {
                CoreError::NotConfigured
            } else {
                CoreError::StoveNotFound {
                    identifier: stove_id.to_owned(),
                }
            }
        })?;
        let command = stove.build_command(field, value)?;

        {
            let _writes = stove.lock_writes().await;
            info!(stove_id, field = %command.field, value = %command.value, "sending command");
            self.inner
                .client
                .send_command(stove.get_id(), &command)
                .await?;
            let payload = self.inner.client.fetch_state(stove.get_id()).await?;
            stove.apply(payload);
        }

        Ok(stove)
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: set up, run closure, tear down.
    ///
    /// Disables background polling; the closure calls
    /// [`refresh()`](Self::refresh) itself when it needs state.
    pub async fn oneshot<F, Fut, T>(config: CoordinatorConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let coordinator = Coordinator::new(cfg);
        coordinator.setup().await?;
        let result = f(coordinator.clone()).await;
        coordinator.teardown().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> CoordinatorState {
        *self.inner.state.borrow()
    }

    fn set_state(&self, state: CoordinatorState) {
        self.inner.state.send_replace(state);
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn get_stoves(&self) -> Vec<Arc<Stove>> {
        self.inner.stoves.load().iter().map(Arc::clone).collect()
    }

    pub fn get_stove(&self, stove_id: &str) -> Option<Arc<Stove>> {
        self.inner
            .stoves
            .load()
            .iter()
            .find(|s| s.get_id() == stove_id)
            .map(Arc::clone)
    }

    pub fn get_default_temperature(&self) -> f64 {
        self.inner.config.default_temperature
    }

    pub fn last_update_success(&self) -> bool {
        self.inner.status.load().success
    }

    pub fn last_update_success_time(&self) -> Option<DateTime<Utc>> {
        self.inner.status.load().success_time
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.status.load().last_error.clone()
    }

    /// Whether stove values are current. Last-known values stay readable
    /// either way.
    pub fn is_available(&self) -> bool {
        self.last_update_success()
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.inner.config.platforms
    }

    /// Redacted snapshot of the account and every stove.
    pub fn diagnostics(&self) -> DiagnosticsReport {
        let config = &self.inner.config;
        let status = self.inner.status.load();

        DiagnosticsReport {
            account: AccountDiagnostics {
                username: REDACTED.into(),
                base_url: config.base_url.to_string(),
                default_temperature: config.default_temperature,
                refresh_interval_secs: config.refresh_interval.as_secs(),
            },
            coordinator: CoordinatorDiagnostics {
                state: self.current_state().to_string(),
                last_update_success: status.success,
                last_update_time: status.success_time.map(|t| t.to_rfc3339()),
                last_error: status.last_error.clone(),
                platforms: config.platforms.clone(),
            },
            stoves: self
                .get_stoves()
                .iter()
                .map(|stove| StoveDiagnostics {
                    name: stove.get_name().to_owned(),
                    state: stove.get_state().map(|p| redact(&p.to_value())),
                })
                .collect(),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh every stove. The first tick fires immediately.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    debug!(error = %e, "scheduled refresh failed");
                }
            }
        }
    }
}
