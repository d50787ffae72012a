//! Error types for presence-core operations.
//!
//! Calls to the daemon never surface these past the session client: they
//! are folded into an [`Outcome`](crate::session::Outcome) and the offline
//! status. Launcher and config errors do reach callers, since they need a
//! decision (retry, abandon, fix the file).

use std::path::PathBuf;

use presence_daemon_protocol::{ErrorInfo, Method};

// ═══════════════════════════════════════════════════════════════════════════════
// Daemon Calls
// ═══════════════════════════════════════════════════════════════════════════════

/// A failed round trip to the daemon.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Nothing is listening at the daemon address.
    #[error("Daemon unreachable at {address}: {details}")]
    Unreachable { address: String, details: String },

    /// The connection was made but broke before a reply arrived.
    #[error("Transport failure during {method}: {details}")]
    Transport { method: Method, details: String },

    /// The daemon answered with something other than what `method` promises.
    #[error("Unexpected reply to {method}: {details}")]
    Protocol { method: Method, details: String },
}

impl CallError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, CallError::Unreachable { .. })
    }

    pub(crate) fn shape(method: Method, info: ErrorInfo) -> Self {
        CallError::Protocol {
            method,
            details: info.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Launcher
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Daemon executable not found at {0}")]
    ExecutableMissing(PathBuf),

    #[error("Failed to spawn daemon {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download from {url} failed: {details}")]
    Download { url: String, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Daemon launch declined")]
    Declined,

    #[error("Daemon did not answer after {attempts} probes")]
    NotResponding { attempts: u32 },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    Malformed { path: PathBuf, details: String },
}

/// Everything a presence client can fail with.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Convenience type alias for Results using PresenceError.
pub type Result<T> = std::result::Result<T, PresenceError>;
