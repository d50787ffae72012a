//! Status output.
//!
//! Each rendered status becomes one JSON line on stdout. Rendering happens
//! inline in the session client, so lines are handed to a writer task over a
//! channel instead of touching stdout there.

use chrono::{DateTime, Utc};
use presence_core::{DisplayStatus, StatusSink};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tooltip: Option<String>,
    pub alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusLine {
    pub fn new(status: &DisplayStatus) -> Self {
        Self {
            text: status.status_line(),
            tooltip: status.tooltip().map(str::to_string),
            alert: status.is_alert(),
            action: status.action().map(|action| action.command().to_string()),
            updated_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain strings, bools and a timestamp always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub struct StdoutSink {
    tx: mpsc::UnboundedSender<StatusLine>,
}

impl StdoutSink {
    /// Returns the sink and the writer task. The task ends once every clone
    /// of the sink is dropped and the queue is drained.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<StatusLine>();
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                let mut payload = line.to_json();
                payload.push('\n');
                if let Err(err) = stdout.write_all(payload.as_bytes()).await {
                    warn!(error = %err, "Failed to write status line");
                    break;
                }
                if let Err(err) = stdout.flush().await {
                    warn!(error = %err, "Failed to flush status line");
                    break;
                }
            }
        });
        (Self { tx }, writer)
    }
}

impl StatusSink for StdoutSink {
    fn render(&self, status: &DisplayStatus) {
        // Closed only during shutdown, when nobody reads the status anyway.
        let _ = self.tx.send(StatusLine::new(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::RecoveryAction;

    #[test]
    fn offline_line_carries_action() {
        let line = StatusLine::new(&DisplayStatus::Offline {
            action: RecoveryAction::StartDaemon,
        });
        let value: serde_json::Value = serde_json::from_str(&line.to_json()).unwrap();
        assert_eq!(value["text"], "Presence offline");
        assert_eq!(value["tooltip"], "Server offline, click to start it…");
        assert_eq!(value["alert"], true);
        assert_eq!(value["action"], "start");
        assert!(value["updated_at"].is_string());
    }

    #[test]
    fn regular_line_omits_action() {
        let line = StatusLine::new(&DisplayStatus::Pushed {
            pushed: 3,
            ahead: 5,
        });
        let value: serde_json::Value = serde_json::from_str(&line.to_json()).unwrap();
        assert_eq!(value["text"], "Presence: Pushed 3 of 5");
        assert!(value["tooltip"].is_null());
        assert_eq!(value["alert"], false);
        assert!(value.get("action").is_none());
    }
}
