//! The "start the daemon" flow behind the offline status's recovery action.

use std::time::Duration;

use tracing::{info, warn};

use super::{ProcessLauncher, RecoveryPrompt};
use crate::error::LaunchError;
use crate::session::SessionClient;

/// Launches the daemon, downloading it first if the user agrees.
///
/// A failed download asks whether to retry until it succeeds or the user
/// gives up; the last download error is returned in that case.
pub async fn launch_with_recovery(
    launcher: &dyn ProcessLauncher,
    prompt: &dyn RecoveryPrompt,
) -> Result<u32, LaunchError> {
    if !launcher.executable_present() {
        info!("Presence executable not found");
        if !prompt.confirm_download().await {
            return Err(LaunchError::Declined);
        }

        loop {
            match launcher.download().await {
                Ok(()) => break,
                Err(err) => {
                    warn!(error = %err, "Daemon download failed");
                    if !prompt.confirm_retry(&err).await {
                        return Err(err);
                    }
                }
            }
        }
    }

    launcher.launch().await
}

/// Makes sure the daemon is answering, launching it if needed, then waits
/// for it to come up.
pub async fn start_daemon(
    session: &SessionClient,
    launcher: &dyn ProcessLauncher,
    prompt: &dyn RecoveryPrompt,
    attempts: u32,
    interval: Duration,
) -> Result<(), LaunchError> {
    if session.probe_liveness().await {
        return Ok(());
    }

    launch_with_recovery(launcher, prompt).await?;

    if session.await_running(attempts, interval).await {
        info!("Presence daemon is up");
        Ok(())
    } else {
        Err(LaunchError::NotResponding { attempts })
    }
}
