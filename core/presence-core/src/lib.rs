//! # presence-core
//!
//! Editor-side client for the presence daemon. An editor plugin feeds it
//! document, focus and selection events; it keeps the daemon told which file
//! is being worked on and turns the daemon's replies into a status line.
//!
//! ## Design Principles
//!
//! - **One session per editor**: a [`SessionClient`] is constructed explicitly
//!   and handed to whatever needs it. There is no global instance.
//! - **Failures are values**: daemon calls return an [`Outcome`], and every
//!   failure also flips the status to offline. Nothing is thrown past the
//!   session client.
//! - **Self-healing**: the heartbeat keeps running through outages and resends
//!   the last path once the daemon answers again.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use presence_core::{EditorBridge, NullSink, PresenceConfig, SessionClient};
//!
//! let config = PresenceConfig::load()?;
//! let session = SessionClient::from_config(&config, std::process::id(), Arc::new(NullSink))?;
//! let mut bridge = EditorBridge::new(session);
//! bridge.attach(Some(Document::new("/repo/src/main.rs", "rust"))).await;
//! ```

pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod launcher;
pub mod rpc;
pub mod session;
pub mod status;
pub mod transport;

pub use config::PresenceConfig;
pub use debounce::EventDebouncer;
pub use editor::{Document, EditorBridge, EditorEvent, SelectionKind};
pub use error::{CallError, ConfigError, LaunchError, PresenceError, Result};
pub use launcher::{ExecutableLauncher, ProcessLauncher, RecoveryPrompt};
pub use rpc::DaemonRpc;
pub use session::{Outcome, SessionClient, SessionPhase};
pub use status::{project, DisplayStatus, NullSink, RecoveryAction, SessionView, StatusSink};
pub use transport::{HttpTransport, Transport};

/// Re-export the wire types so plugins need only one dependency.
pub use presence_daemon_protocol::{Counters, SessionSnapshot};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory daemon and status sink for unit tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use presence_daemon_protocol::{Method, Request, SessionSnapshot};
    use serde_json::Value;
    use tokio::sync::Notify;

    use crate::error::CallError;
    use crate::status::{DisplayStatus, StatusSink};
    use crate::transport::Transport;

    /// Answers each method with a fixed reply, or refuses every call while
    /// marked down. Every call is recorded, including refused ones.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<HashMap<Method, Value>>,
        calls: Mutex<Vec<Request>>,
        down: AtomicBool,
        gates: Mutex<HashMap<Method, Arc<Notify>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(&self, method: Method, value: Value) {
            self.replies.lock().unwrap().insert(method, value);
        }

        pub fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        /// The next `method` call blocks until the returned gate is notified.
        pub fn hold(&self, method: Method) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates.lock().unwrap().insert(method, gate.clone());
            gate
        }

        pub fn calls(&self) -> Vec<Request> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, method: Method) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|request| request.method == method)
                .count()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn call(&self, request: &Request) -> Result<Value, CallError> {
            self.calls.lock().unwrap().push(request.clone());

            let gate = self.gates.lock().unwrap().remove(&request.method);
            if let Some(gate) = gate {
                gate.notified().await;
            }

            if self.down.load(Ordering::SeqCst) {
                return Err(CallError::Unreachable {
                    address: "http://127.0.0.1:8080".to_string(),
                    details: "connection refused".to_string(),
                });
            }

            self.replies
                .lock()
                .unwrap()
                .get(&request.method)
                .cloned()
                .ok_or_else(|| CallError::Transport {
                    method: request.method,
                    details: "no scripted reply".to_string(),
                })
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        rendered: Mutex<Vec<DisplayStatus>>,
    }

    impl RecordingSink {
        pub fn last(&self) -> Option<DisplayStatus> {
            self.rendered.lock().unwrap().last().cloned()
        }

        pub fn len(&self) -> usize {
            self.rendered.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.rendered.lock().unwrap().is_empty()
        }
    }

    impl StatusSink for RecordingSink {
        fn render(&self, status: &DisplayStatus) {
            self.rendered.lock().unwrap().push(status.clone());
        }
    }

    pub fn repo_snapshot(display_name: &str) -> SessionSnapshot {
        SessionSnapshot {
            valid: true,
            repo_name: display_name.to_lowercase(),
            repo_display_name: display_name.to_string(),
            branch: "master".to_string(),
            repo_path: format!("/home/me/{}", display_name.to_lowercase()),
            has_remote: true,
            ..SessionSnapshot::default()
        }
    }

    pub fn reply_snapshot(snapshot: &SessionSnapshot) -> Value {
        serde_json::to_value(snapshot).unwrap()
    }
}
