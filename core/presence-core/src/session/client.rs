use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use presence_daemon_protocol::SessionSnapshot;
use tracing::{debug, info, warn};

use super::heartbeat::{self, HeartbeatHandle};
use super::phase::{next_phase, PhaseEvent, ReportedPath, SessionPhase};
use crate::config::PresenceConfig;
use crate::error::{CallError, PresenceError};
use crate::rpc::DaemonRpc;
use crate::status::{project, SessionView, StatusSink};
use crate::transport::{HttpTransport, Transport};

/// Result of a daemon call made through the session client.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failed(CallError),
    /// The client is terminating; no request was sent or the reply was dropped.
    Suppressed,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failed(_) | Outcome::Suppressed => None,
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Collapses failures to the default value (the "not in a repository"
    /// snapshot, an empty path, `false`).
    pub fn unwrap_or_default(self) -> T {
        self.success().unwrap_or_default()
    }
}

/// Keeps the daemon informed of what this editor is working on.
///
/// Cheap to clone; clones share one session. Every daemon failure is folded
/// into an [`Outcome`] plus the offline status, never an error.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    rpc: DaemonRpc,
    sink: Arc<dyn StatusSink>,
    heartbeat_interval: Duration,
    state: Mutex<ClientState>,
}

struct ClientState {
    phase: SessionPhase,
    heartbeat: Option<HeartbeatHandle>,
    snapshot: Option<SessionSnapshot>,
    last_contact: Option<DateTime<Utc>>,
}

impl SessionClient {
    pub fn new(rpc: DaemonRpc, sink: Arc<dyn StatusSink>, heartbeat_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                rpc,
                sink,
                heartbeat_interval,
                state: Mutex::new(ClientState {
                    phase: SessionPhase::NotStarted,
                    heartbeat: None,
                    snapshot: None,
                    last_contact: None,
                }),
            }),
        }
    }

    /// Builds a client talking HTTP to the configured daemon address.
    pub fn from_config(
        config: &PresenceConfig,
        instance_id: u32,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self, PresenceError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.address.clone())?);
        let rpc = DaemonRpc::new(transport, config.editor.clone(), instance_id);
        Ok(Self::new(rpc, sink, config.heartbeat_interval()))
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub fn instance_id(&self) -> u32 {
        self.inner.rpc.instance_id()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock_state().phase.clone()
    }

    /// Last snapshot received from `set_path` or `ping`.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.lock_state().snapshot.clone()
    }

    pub fn last_contact(&self) -> Option<DateTime<Utc>> {
        self.lock_state().last_contact
    }

    pub fn heartbeat_running(&self) -> bool {
        self.lock_state()
            .heartbeat
            .as_ref()
            .is_some_and(HeartbeatHandle::is_running)
    }

    /// Asks the daemon whether it is up. Any failure reads as `false`.
    pub async fn probe_liveness(&self) -> bool {
        if self.is_terminating() {
            return false;
        }
        match self.inner.rpc.is_running().await {
            Ok(running) => running,
            Err(err) => {
                self.on_disconnect(&err);
                false
            }
        }
    }

    /// Polls [`probe_liveness`](Self::probe_liveness) until the daemon answers
    /// or `attempts` probes have failed.
    pub async fn await_running(&self, attempts: u32, interval: Duration) -> bool {
        for attempt in 0..attempts {
            if self.probe_liveness().await {
                debug!(attempt = attempt + 1, "Daemon answered liveness probe");
                return true;
            }
            if self.is_terminating() {
                return false;
            }
            tokio::time::sleep(interval).await;
        }
        false
    }

    /// Reports the active document. Callers are expected to deduplicate.
    ///
    /// The first acknowledged report starts the heartbeat loop.
    pub async fn report_path(&self, path: &str, language: &str) -> Outcome<SessionSnapshot> {
        if self.is_terminating() {
            return Outcome::Suppressed;
        }

        let snapshot = match self.inner.rpc.set_path(path, language).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.on_disconnect(&err);
                return Outcome::Failed(err);
            }
        };

        let mut state = self.lock_state();
        if state.phase.is_terminating() {
            debug!(path = %path, "Dropping set_path reply received after leaving");
            return Outcome::Suppressed;
        }

        let reported = ReportedPath {
            path: path.to_string(),
            language: language.to_string(),
        };
        let previous = state.phase.name();
        state.phase = next_phase(&state.phase, PhaseEvent::ReportAcknowledged(reported));
        if previous != state.phase.name() {
            info!(from = previous, to = state.phase.name(), "Session phase changed");
        }
        self.accept_snapshot(&mut state, &snapshot);

        if state.heartbeat.is_none() {
            info!(
                interval_secs = self.inner.heartbeat_interval.as_secs(),
                "First path acknowledged, starting heartbeat"
            );
            state.heartbeat = Some(heartbeat::spawn(
                Arc::downgrade(&self.inner),
                self.inner.heartbeat_interval,
            ));
        }

        Outcome::Success(snapshot)
    }

    /// One heartbeat tick: resend the last path if a previous tick failed,
    /// then ping.
    pub(crate) async fn heartbeat_tick(&self) -> Outcome<SessionSnapshot> {
        let resync = {
            let state = self.lock_state();
            if state.phase.is_terminating() {
                return Outcome::Suppressed;
            }
            state.phase.resync_target().cloned()
        };

        if let Some(last) = resync {
            debug!(path = %last.path, "Resyncing path after daemon outage");
            if let Outcome::Failed(err) = self.report_path(&last.path, &last.language).await {
                debug!(error = %err, "Resync failed");
            }
        }

        match self.inner.rpc.ping().await {
            Ok(snapshot) => {
                let mut state = self.lock_state();
                if state.phase.is_terminating() {
                    return Outcome::Suppressed;
                }
                self.accept_snapshot(&mut state, &snapshot);
                debug!(valid = snapshot.valid, "Heartbeat acknowledged");
                Outcome::Success(snapshot)
            }
            Err(err) => {
                {
                    let mut state = self.lock_state();
                    let previous = state.phase.name();
                    state.phase = next_phase(&state.phase, PhaseEvent::HeartbeatFailed);
                    if previous != state.phase.name() {
                        info!(from = previous, to = state.phase.name(), "Session phase changed");
                    }
                }
                self.on_disconnect(&err);
                Outcome::Failed(err)
            }
        }
    }

    /// Absolute path of the repository the daemon currently tracks for us.
    pub async fn get_path(&self) -> Outcome<String> {
        if self.is_terminating() {
            return Outcome::Suppressed;
        }
        match self.inner.rpc.get_path().await {
            Ok(path) => Outcome::Success(path),
            Err(err) => {
                self.on_disconnect(&err);
                Outcome::Failed(err)
            }
        }
    }

    /// Reads the daemon's current snapshot without touching session state.
    pub async fn get_info(&self) -> Outcome<SessionSnapshot> {
        if self.is_terminating() {
            return Outcome::Suppressed;
        }
        match self.inner.rpc.get_info().await {
            Ok(snapshot) => Outcome::Success(snapshot),
            Err(err) => {
                self.on_disconnect(&err);
                Outcome::Failed(err)
            }
        }
    }

    /// Tells the daemon this editor is going away. Idempotent; only the first
    /// call sends the notice, and nothing else is sent afterwards.
    pub async fn notify_leaving(&self) {
        let heartbeat = {
            let mut state = self.lock_state();
            if state.phase.is_terminating() {
                return;
            }
            state.phase = next_phase(&state.phase, PhaseEvent::Leaving);
            state.heartbeat.take()
        };

        if let Some(heartbeat) = heartbeat {
            heartbeat.cancel();
        }

        info!(id = self.instance_id(), "Leaving presence session");
        if let Err(err) = self.inner.rpc.im_leaving().await {
            debug!(error = %err, "Leaving notice not delivered");
        }
    }

    fn is_terminating(&self) -> bool {
        self.lock_state().phase.is_terminating()
    }

    /// Snapshots are replaced wholesale, never merged.
    fn accept_snapshot(&self, state: &mut ClientState, snapshot: &SessionSnapshot) {
        state.snapshot = Some(snapshot.clone());
        state.last_contact = Some(Utc::now());
        self.inner
            .sink
            .render(&project(SessionView::Snapshot(snapshot)));
    }

    fn on_disconnect(&self, err: &CallError) {
        let state = self.lock_state();
        if state.phase.is_terminating() {
            return;
        }
        warn!(error = %err, phase = state.phase.name(), "Daemon call failed");
        self.inner.sink.render(&project(SessionView::Unreachable));
    }

    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
