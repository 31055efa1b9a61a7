// ── Refresh coordinator ──
//
// Full lifecycle of one Easy PV account: token validation, periodic and
// on-demand refreshes bounded by an overall deadline, failure
// classification, and publication of complete snapshots to observers.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use easypv_api::EasyPvClient;

use crate::config::CoordinatorConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Device, Panel, Snapshot, Station};
use crate::store::SnapshotStore;

const EVENT_CHANNEL_SIZE: usize = 64;

// ── State & events ───────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Token not yet validated.
    Uninitialized,
    /// Token valid; refreshes run.
    Ready,
    /// Token rejected; refreshes are refused until `reauthenticate`.
    AuthFailed,
    /// `shutdown()` was called.
    Stopped,
}

/// Notifications delivered to every subscriber.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// Exactly one per successful refresh.
    SnapshotUpdated(Arc<Snapshot>),
    /// A refresh failed transiently; the previous snapshot is still current.
    UpdateFailed { message: String },
    /// The token was rejected; scheduling has stopped.
    ReauthRequired { message: String },
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Refreshes never overlap:
/// an on-demand refresh waits for one in flight, and scheduled ticks that
/// fall behind are skipped.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    client: EasyPvClient,
    store: SnapshotStore,
    state: watch::Sender<CoordinatorState>,
    last_error: watch::Sender<Option<String>>,
    event_tx: broadcast::Sender<CoordinatorEvent>,
    refresh_lock: Mutex<()>,
    cancel: CancellationToken,
    scheduler: Mutex<Option<Scheduler>>,
}

struct Scheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Coordinator {
    /// Create a coordinator. Does NOT touch the network; call
    /// [`first_refresh()`](Self::first_refresh) to validate the token and
    /// start polling.
    pub fn new(config: CoordinatorConfig, client: EasyPvClient) -> Self {
        let (state, _) = watch::channel(CoordinatorState::Uninitialized);
        let (last_error, _) = watch::channel(None);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                store: SnapshotStore::new(),
                state,
                last_error,
                event_tx,
                refresh_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                scheduler: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// The underlying API client (for account lookups).
    pub fn client(&self) -> &EasyPvClient {
        &self.inner.client
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Validate the persisted token, perform the first refresh and start
    /// the scheduler.
    ///
    /// A rejected token is fatal ([`CoreError::ReauthRequired`]). Any other
    /// validation failure is [`CoreError::SetupFailed`] and may be retried.
    /// Errors of the first refresh itself are returned as they are.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        match self.current_state() {
            CoordinatorState::Stopped => return Err(CoreError::Stopped),
            CoordinatorState::AuthFailed => return Err(self.reauth_required_error()),
            CoordinatorState::Ready => return self.refresh_now().await,
            CoordinatorState::Uninitialized => {}
        }

        let guard = self.inner.refresh_lock.lock().await;
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        match self
            .inner
            .client
            .login_with_token(self.inner.config.token.clone())
            .await
        {
            Ok(user) => {
                info!(user = user.user_name.as_deref().unwrap_or("?"), "session token accepted");
            }
            Err(e) if e.is_login() => {
                return Err(self.fail_auth(e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "token validation failed");
                self.inner.last_error.send_replace(Some(e.to_string()));
                return Err(CoreError::SetupFailed {
                    message: e.to_string(),
                });
            }
        }

        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }
        self.set_state(CoordinatorState::Ready);

        let snapshot = match self.refresh_locked().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if self.current_state() == CoordinatorState::Ready {
                    self.set_state(CoordinatorState::Uninitialized);
                }
                return Err(e);
            }
        };
        drop(guard);

        self.start_scheduler().await;
        Ok(snapshot)
    }

    /// Run one refresh cycle now.
    ///
    /// Waits for an in-flight refresh instead of overlapping it. Refused
    /// without any network traffic while authentication has failed.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>, CoreError> {
        let _guard = self.inner.refresh_lock.lock().await;
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        match self.current_state() {
            CoordinatorState::Ready => self.refresh_locked().await,
            CoordinatorState::AuthFailed => Err(self.reauth_required_error()),
            CoordinatorState::Uninitialized => Err(CoreError::NotInitialized),
            CoordinatorState::Stopped => Err(CoreError::Stopped),
        }
    }

    /// Log in again with account credentials after a token rejection.
    ///
    /// Returns the new token so the owner can persist it. Scheduling
    /// resumes and a refresh runs right away.
    pub async fn reauthenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SecretString, CoreError> {
        if self.current_state() == CoordinatorState::Stopped {
            return Err(CoreError::Stopped);
        }

        let token = {
            let _guard = self.inner.refresh_lock.lock().await;
            self.inner
                .client
                .login_with_password(username, password)
                .await?;
            if self.inner.cancel.is_cancelled() {
                return Err(CoreError::Stopped);
            }
            let token = self
                .inner
                .client
                .token()
                .ok_or_else(|| CoreError::AuthenticationFailed {
                    message: "login returned no token".into(),
                })?;
            self.set_state(CoordinatorState::Ready);
            self.inner.last_error.send_replace(None);
            info!("re-authenticated");
            token
        };

        self.start_scheduler().await;
        if let Err(e) = self.refresh_now().await {
            debug!(error = %e, "refresh after re-authentication failed");
        }
        Ok(token)
    }

    /// Stop background refreshes and mark the coordinator stopped.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(scheduler) = self.inner.scheduler.lock().await.take() {
            scheduler.cancel.cancel();
            let _ = scheduler.handle.await;
        }

        self.set_state(CoordinatorState::Stopped);
        debug!("coordinator stopped");
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: validate, refresh once, run closure, shut down.
    ///
    /// Disables the scheduler since the closure only needs one snapshot.
    pub async fn oneshot<F, Fut, T>(
        config: CoordinatorConfig,
        client: EasyPvClient,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let coordinator = Coordinator::new(cfg, client);
        if let Err(e) = coordinator.first_refresh().await {
            coordinator.shutdown().await;
            return Err(e);
        }
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to snapshot and failure notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> CoordinatorState {
        *self.inner.state.borrow()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.load()
    }

    /// Entity availability: true while a token is held.
    pub fn is_logged_in(&self) -> bool {
        self.inner.client.is_logged_in()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.borrow().clone()
    }

    // ── Snapshot accessors ───────────────────────────────────────

    pub fn station(&self, station_id: &str) -> Option<Station> {
        self.snapshot().station(station_id).cloned()
    }

    pub fn device(&self, station_id: &str, device_id: &str) -> Option<Device> {
        self.snapshot().device(station_id, device_id).cloned()
    }

    pub fn panel(&self, station_id: &str, device_id: &str, idx: usize) -> Option<Panel> {
        self.snapshot().panel(station_id, device_id, idx).cloned()
    }

    // ── Internals ────────────────────────────────────────────────

    /// `Stopped` is terminal: later transitions are ignored.
    fn set_state(&self, state: CoordinatorState) {
        self.inner.state.send_if_modified(|current| {
            if *current == state || *current == CoordinatorState::Stopped {
                return false;
            }
            debug!(previous = ?*current, ?state, "coordinator state changed");
            *current = state;
            true
        });
    }

    fn reauth_required_error(&self) -> CoreError {
        CoreError::ReauthRequired {
            message: self
                .last_error()
                .unwrap_or_else(|| "session token rejected".into()),
        }
    }

    /// Drop the token, stop refreshing and tell subscribers.
    fn fail_auth(&self, message: String) -> CoreError {
        warn!(error = %message, "authentication rejected, re-authentication required");
        self.inner.client.logout();
        self.set_state(CoordinatorState::AuthFailed);
        self.inner.last_error.send_replace(Some(message.clone()));
        let _ = self.inner.event_tx.send(CoordinatorEvent::ReauthRequired {
            message: message.clone(),
        });
        CoreError::ReauthRequired { message }
    }

    /// One bounded refresh cycle. Caller holds `refresh_lock`.
    async fn refresh_locked(&self) -> Result<Arc<Snapshot>, CoreError> {
        let deadline = self.inner.config.refresh_timeout;

        let result = match tokio::time::timeout(deadline, self.fetch_snapshot()).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: deadline.as_secs(),
            }),
        };

        match result {
            Ok(snapshot) => {
                let snapshot = self.inner.store.publish(snapshot);
                self.inner.last_error.send_replace(None);
                let _ = self
                    .inner
                    .event_tx
                    .send(CoordinatorEvent::SnapshotUpdated(Arc::clone(&snapshot)));
                debug!(stations = snapshot.len(), "refresh complete");
                Ok(snapshot)
            }
            Err(e) if e.is_auth_fatal() => Err(self.fail_auth(e.to_string())),
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping previous data");
                let message = e.to_string();
                self.inner.last_error.send_replace(Some(message.clone()));
                let _ = self
                    .inner
                    .event_tx
                    .send(CoordinatorEvent::UpdateFailed { message });
                Err(e)
            }
        }
    }

    /// Stations, then devices per station, then data per device; strictly
    /// sequential. Any failure discards the partial result.
    async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
        let raw_stations = self.inner.client.get_stations().await?;

        let mut stations = BTreeMap::new();
        for raw in raw_stations {
            let devices = self
                .fetch_devices(&raw.id)
                .await
                .map_err(|source| CoreError::StationFetch {
                    station_id: raw.id.clone(),
                    source,
                })?;
            let station = convert::station(raw, devices);
            stations.insert(station.id.clone(), station);
        }

        Ok(Snapshot::new(stations))
    }

    async fn fetch_devices(&self, station_id: &str) -> Result<Vec<Device>, easypv_api::Error> {
        let client = &self.inner.client;
        let listed = client.get_station_devices(station_id).await?;

        let mut devices = Vec::with_capacity(listed.len());
        for entry in listed {
            let data = client.get_device_data(station_id, &entry.id, None).await?;
            devices.push(convert::device(station_id, &entry.id, data));
        }
        Ok(devices)
    }

    /// (Re)start the periodic refresh task. No-op when the interval is zero.
    async fn start_scheduler(&self) {
        let interval = self.inner.config.refresh_interval;
        if interval.is_zero() || self.inner.cancel.is_cancelled() {
            return;
        }

        let mut slot = self.inner.scheduler.lock().await;
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            let _ = previous.handle.await;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(refresh_task(self.clone(), interval, cancel.clone()));
        *slot = Some(Scheduler { cancel, handle });
        debug!(interval_secs = interval.as_secs(), "refresh scheduler started");
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh until cancelled or authentication fails.
async fn refresh_task(coordinator: Coordinator, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match coordinator.refresh_now().await {
                    Ok(_) => {}
                    Err(e) if e.is_auth_fatal() => {
                        info!("scheduled refresh paused until re-authentication");
                        break;
                    }
                    Err(CoreError::Stopped) => break,
                    Err(e) => debug!(error = %e, "scheduled refresh failed"),
                }
            }
        }
    }
}
