//! Status projection.
//!
//! [`project`] is a pure, total mapping from the daemon's last word (or its
//! absence) to the small set of states the status indicator can show. Rules
//! are checked in priority order:
//!
//! ```text
//! Unreachable                         → offline (+ start action)
//! !valid                              → not in a repository
//! !has_remote, ahead_of_local > 0     → ahead by N (local)
//! !has_remote, ahead_of_local < 0     → behind by N (local)
//! has_remote,  pushed_to_remote > 0   → pushed P of A
//! has_remote,  ahead_of_remote > 0    → ahead by N
//! has_remote,  ahead_of_remote < 0    → behind by N
//! otherwise                           → working on <display name>
//! ```
//!
//! A fully synced repository deliberately looks the same as one where work
//! just started.

use std::fmt;

use presence_daemon_protocol::SessionSnapshot;

const STATUS_PREFIX: &str = "Presence: ";
const OFFLINE_LINE: &str = "Presence offline";
const NOT_IN_REPO_TOOLTIP: &str = "Assuming \"Working on something private\"";
const OFFLINE_TOOLTIP: &str = "Server offline, click to start it…";

/// What the projector is looking at.
#[derive(Debug, Clone, Copy)]
pub enum SessionView<'a> {
    Unreachable,
    Snapshot(&'a SessionSnapshot),
}

/// User-invocable recovery offered alongside the offline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// (Re)launch the daemon process.
    StartDaemon,
}

impl RecoveryAction {
    pub fn command(self) -> &'static str {
        match self {
            RecoveryAction::StartDaemon => "start",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayStatus {
    Offline { action: RecoveryAction },
    NotInRepository,
    LocalAhead(u64),
    LocalBehind(u64),
    Pushed { pushed: i64, ahead: i64 },
    Ahead(u64),
    Behind(u64),
    WorkingOn(String),
}

pub fn project(view: SessionView<'_>) -> DisplayStatus {
    let snapshot = match view {
        SessionView::Unreachable => {
            return DisplayStatus::Offline {
                action: RecoveryAction::StartDaemon,
            }
        }
        SessionView::Snapshot(snapshot) => snapshot,
    };

    if !snapshot.valid {
        return DisplayStatus::NotInRepository;
    }

    let counters = &snapshot.counters;
    if !snapshot.has_remote {
        return match counters.ahead_of_local {
            n if n > 0 => DisplayStatus::LocalAhead(n.unsigned_abs()),
            n if n < 0 => DisplayStatus::LocalBehind(n.unsigned_abs()),
            _ => DisplayStatus::WorkingOn(snapshot.repo_display_name.clone()),
        };
    }

    if counters.pushed_to_remote > 0 {
        return DisplayStatus::Pushed {
            pushed: counters.pushed_to_remote,
            ahead: counters.ahead_of_remote,
        };
    }

    match counters.ahead_of_remote {
        n if n > 0 => DisplayStatus::Ahead(n.unsigned_abs()),
        n if n < 0 => DisplayStatus::Behind(n.unsigned_abs()),
        _ => DisplayStatus::WorkingOn(snapshot.repo_display_name.clone()),
    }
}

impl DisplayStatus {
    pub fn action(&self) -> Option<RecoveryAction> {
        match self {
            DisplayStatus::Offline { action } => Some(*action),
            _ => None,
        }
    }

    /// Offline is the only state drawn in the alert color.
    pub fn is_alert(&self) -> bool {
        matches!(self, DisplayStatus::Offline { .. })
    }

    pub fn tooltip(&self) -> Option<&'static str> {
        match self {
            DisplayStatus::Offline { .. } => Some(OFFLINE_TOOLTIP),
            DisplayStatus::NotInRepository => Some(NOT_IN_REPO_TOOLTIP),
            _ => None,
        }
    }

    /// Full status bar text, e.g. `Presence: Pushed 3 of 5`.
    pub fn status_line(&self) -> String {
        if self.is_alert() {
            return OFFLINE_LINE.to_string();
        }
        let text = self.to_string();
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => format!("{}{}{}", STATUS_PREFIX, first.to_uppercase(), chars.as_str()),
            None => STATUS_PREFIX.trim_end().to_string(),
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayStatus::Offline { .. } => f.write_str("offline"),
            DisplayStatus::NotInRepository => f.write_str("not in a repository"),
            DisplayStatus::LocalAhead(n) => write!(f, "ahead by {} (local)", n),
            DisplayStatus::LocalBehind(n) => write!(f, "behind by {} (local)", n),
            DisplayStatus::Pushed { pushed, ahead } => write!(f, "pushed {} of {}", pushed, ahead),
            DisplayStatus::Ahead(n) => write!(f, "ahead by {}", n),
            DisplayStatus::Behind(n) => write!(f, "behind by {}", n),
            DisplayStatus::WorkingOn(name) => write!(f, "working on {}", name),
        }
    }
}

/// The UI surface that shows the status indicator.
///
/// Implementations must be cheap and non-blocking: the session client calls
/// `render` inline after every daemon reply.
pub trait StatusSink: Send + Sync {
    fn render(&self, status: &DisplayStatus);
}

/// Sink for headless use; drops every update.
pub struct NullSink;

impl StatusSink for NullSink {
    fn render(&self, _status: &DisplayStatus) {}
}
