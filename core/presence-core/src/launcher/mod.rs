//! Daemon process management.
//!
//! The daemon is a separate executable. When it is not answering, the client
//! can start it, and when it is not installed, download it first. Both steps
//! can fail in ways only the user can resolve, so they go through a
//! [`RecoveryPrompt`].
//!
//! # Module Structure
//!
//! - [`backoff`]: Launch history and the relaunch delay it implies
//! - [`executable`]: The on-disk launcher (spawn + download)
//! - [`recovery`]: The interactive start flow

use async_trait::async_trait;

use crate::error::LaunchError;

pub mod backoff;
pub mod executable;
pub mod recovery;

pub use executable::{executable_name, ExecutableLauncher};
pub use recovery::{launch_with_recovery, start_daemon};

/// Starts and installs the daemon process.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    fn executable_present(&self) -> bool;

    /// Spawns the daemon detached from this process. Returns its pid.
    async fn launch(&self) -> Result<u32, LaunchError>;

    async fn download(&self) -> Result<(), LaunchError>;
}

/// User decisions needed while recovering the daemon.
#[async_trait]
pub trait RecoveryPrompt: Send + Sync {
    /// The executable is missing. Fetch it?
    async fn confirm_download(&self) -> bool;

    /// A download failed. Try again?
    async fn confirm_retry(&self, error: &LaunchError) -> bool;
}
