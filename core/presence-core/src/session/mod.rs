//! Session client.
//!
//! Owns the conversation with the daemon for one editor instance.
//!
//! # Lifecycle
//!
//! ```text
//! editor → report_path → daemon (set_path) → snapshot → StatusSink
//!                ↓ first ack
//!          heartbeat loop: [resync set_path] → ping → snapshot → StatusSink
//! ```
//!
//! Every failed call renders the offline status and leaves the loop running,
//! so the session heals by itself once the daemon is back. `notify_leaving`
//! is terminal: afterwards nothing is sent and nothing is rendered.
//!
//! # Module Structure
//!
//! - [`phase`]: Lifecycle phases and the pure transition function
//! - `client`: The [`SessionClient`] and its [`Outcome`] type
//! - `heartbeat`: The cancellable periodic task

mod client;
mod heartbeat;
pub mod phase;

pub use client::{Outcome, SessionClient};
pub use phase::{next_phase, PhaseEvent, ReportedPath, SessionPhase};
