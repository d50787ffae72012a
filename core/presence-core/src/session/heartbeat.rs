//! Periodic heartbeat task.
//!
//! Each tick runs to completion before the next interval starts, so at most
//! one heartbeat call is ever in flight. The task holds only a weak reference
//! to the client; it stops when cancelled or when the client is dropped.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::client::{Inner, SessionClient};

pub(crate) struct HeartbeatHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    pub(crate) fn cancel(self) {
        self.cancel.cancel();
        // An in-flight tick is dropped with the task; its reply is never seen.
        self.task.abort();
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

pub(crate) fn spawn(client: Weak<Inner>, interval: Duration) -> HeartbeatHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let Some(inner) = client.upgrade() else {
                break;
            };
            let session = SessionClient::from_inner(inner);

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = session.heartbeat_tick() => {}
            }
        }
        debug!("Heartbeat loop stopped");
    });

    HeartbeatHandle { cancel, task }
}
