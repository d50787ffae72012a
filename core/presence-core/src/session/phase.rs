//! Session lifecycle phases and the rules that move between them.
//!
//! ```text
//! NotStarted --report ok--> Active --heartbeat failed--> Degraded
//!                             ^                            |
//!                             +--------report ok-----------+
//! any --leaving--> Terminating (terminal)
//! ```
//!
//! `Degraded` carries the same last-acknowledged path as `Active`; it only
//! marks that the next heartbeat tick must resend it before pinging.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedPath {
    pub path: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Active { last: ReportedPath },
    Degraded { last: ReportedPath },
    Terminating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    ReportAcknowledged(ReportedPath),
    HeartbeatFailed,
    Leaving,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::Active { .. } => "active",
            SessionPhase::Degraded { .. } => "degraded",
            SessionPhase::Terminating => "terminating",
        }
    }

    pub fn last_reported(&self) -> Option<&ReportedPath> {
        match self {
            SessionPhase::Active { last } | SessionPhase::Degraded { last } => Some(last),
            SessionPhase::NotStarted | SessionPhase::Terminating => None,
        }
    }

    /// The path a heartbeat tick must resend first, if any.
    pub fn resync_target(&self) -> Option<&ReportedPath> {
        match self {
            SessionPhase::Degraded { last } => Some(last),
            _ => None,
        }
    }

    pub fn is_terminating(&self) -> bool {
        matches!(self, SessionPhase::Terminating)
    }
}

pub fn next_phase(current: &SessionPhase, event: PhaseEvent) -> SessionPhase {
    match (current, event) {
        (SessionPhase::Terminating, _) => SessionPhase::Terminating,
        (_, PhaseEvent::Leaving) => SessionPhase::Terminating,
        (_, PhaseEvent::ReportAcknowledged(last)) => SessionPhase::Active { last },
        (SessionPhase::Active { last }, PhaseEvent::HeartbeatFailed) => SessionPhase::Degraded {
            last: last.clone(),
        },
        // Nothing acknowledged yet means there is nothing to resend.
        (current, PhaseEvent::HeartbeatFailed) => current.clone(),
    }
}
