//! `attach`: the long-running editor bridge.
//!
//! Reads editor events as JSON lines from stdin and writes status lines to
//! stdout. Runs until stdin closes or the process is asked to stop, then
//! tells the daemon this editor is leaving.
//!
//! Events are only forwarded once the daemon has answered. Until then the
//! active document is remembered so it can be reported as soon as the
//! daemon comes up, either at startup or after a `start_daemon` line.

use std::sync::Arc;
use std::time::Duration;

use presence_core::launcher::start_daemon;
use presence_core::{
    Document, EditorBridge, EditorEvent, ProcessLauncher, RecoveryPrompt, SessionClient,
};
use serde::Deserialize;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long an exiting editor waits for `im_leaving` to go through.
const LEAVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Requests from the editor that aren't document events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Control {
    /// The user clicked the offline status's recovery action.
    StartDaemon,
}

#[derive(Debug, PartialEq, Eq)]
enum Incoming {
    Event(EditorEvent),
    Control(Control),
}

fn parse_line(line: &str) -> Result<Incoming, serde_json::Error> {
    match serde_json::from_str::<EditorEvent>(line) {
        Ok(event) => Ok(Incoming::Event(event)),
        Err(event_err) => serde_json::from_str::<Control>(line)
            .map(Incoming::Control)
            .map_err(|_| event_err),
    }
}

pub struct Attachment {
    bridge: EditorBridge,
    launcher: Arc<dyn ProcessLauncher>,
    prompt: Arc<dyn RecoveryPrompt>,
    probe_attempts: u32,
    probe_interval: Duration,
    activated: bool,
    pending: Option<Document>,
}

impl Attachment {
    pub fn new(
        session: SessionClient,
        launcher: Arc<dyn ProcessLauncher>,
        prompt: Arc<dyn RecoveryPrompt>,
        probe_attempts: u32,
        probe_interval: Duration,
    ) -> Self {
        Self {
            bridge: EditorBridge::new(session),
            launcher,
            prompt,
            probe_attempts,
            probe_interval,
            activated: false,
            pending: None,
        }
    }

    /// The document to report once the daemon answers.
    pub fn with_initial_document(mut self, document: Option<Document>) -> Self {
        self.pending = document;
        self
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Makes sure the daemon is up, launching it if needed. The first time
    /// it answers, the remembered document is reported.
    ///
    /// Runs the full probe and launch on every call, so a `start_daemon`
    /// line after an outage relaunches the daemon; the heartbeat then
    /// resends the last path.
    pub async fn activate(&mut self) -> bool {
        let started = start_daemon(
            self.bridge.session(),
            self.launcher.as_ref(),
            self.prompt.as_ref(),
            self.probe_attempts,
            self.probe_interval,
        )
        .await;
        if let Err(err) = started {
            warn!(error = %err, "Presence daemon unavailable");
            return false;
        }

        if !self.activated {
            info!(id = self.bridge.session().instance_id(), "Attached to presence daemon");
            self.activated = true;
            self.bridge.attach(self.pending.take()).await;
        }
        true
    }

    pub async fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match parse_line(line) {
            Ok(Incoming::Event(event)) if self.activated => {
                self.bridge.handle(event).await;
            }
            Ok(Incoming::Event(event)) => self.remember(event),
            Ok(Incoming::Control(Control::StartDaemon)) => {
                self.activate().await;
            }
            Err(err) => {
                warn!(error = %err, line = %line, "Skipping malformed editor event");
            }
        }
    }

    fn remember(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::ActiveDocumentChanged { document } => self.pending = document,
            EditorEvent::SelectionChanged {
                document: Some(document),
                ..
            } => self.pending = Some(document),
            EditorEvent::SelectionChanged { document: None, .. }
            | EditorEvent::WindowFocusChanged { .. } => {}
        }
    }

    /// Consumes `input` until EOF or `shutdown`, then leaves the session.
    ///
    /// Daemon calls have no timeout of their own, so every await here races
    /// `shutdown`; a hung daemon can't keep the editor from exiting.
    pub async fn run<R>(mut self, input: R, shutdown: CancellationToken)
    where
        R: tokio::io::AsyncBufRead + Unpin,
    {
        let mut running = tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            _ = self.activate() => true,
        };

        let mut lines = input.lines();
        while running {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = lines.next_line() => next,
            };
            match next {
                Ok(Some(line)) => {
                    running = tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => false,
                        _ = self.handle_line(&line) => true,
                    };
                }
                Ok(None) => {
                    debug!("Editor closed the event stream");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to read editor events");
                    break;
                }
            }
        }
        if shutdown.is_cancelled() {
            debug!("Shutdown requested");
        }

        let leaving = self.bridge.session().notify_leaving();
        if tokio::time::timeout(LEAVE_TIMEOUT, leaving).await.is_err() {
            warn!(
                timeout_secs = LEAVE_TIMEOUT.as_secs(),
                "Daemon did not acknowledge leaving"
            );
        }
    }
}

/// Cancels `token` on SIGINT or SIGTERM.
pub async fn wait_for_shutdown_signal(token: CancellationToken) -> Result<(), std::io::Error> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::select! {
            _ = ctrl_c => info!(signal = "SIGINT", "Signal received"),
            _ = sigterm.recv() => info!(signal = "SIGTERM", "Signal received"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            warn!(error = %err, "Ctrl-C handler failed, leaving anyway");
        }
    }

    token.cancel();
    Ok(())
}
