//! Launching and installing the daemon executable.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use fs_err as fs;
use tracing::{debug, info};

use super::backoff::wait_for_launch_slot;
use super::ProcessLauncher;
use crate::config::{get_backoff_state_path, PresenceConfig};
use crate::error::LaunchError;

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "presence.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "presence";

pub fn executable_name() -> &'static str {
    EXECUTABLE_NAME
}

pub struct ExecutableLauncher {
    dir: PathBuf,
    download_url: String,
    backoff_path: Option<PathBuf>,
    http: reqwest::Client,
}

impl ExecutableLauncher {
    pub fn new(dir: impl Into<PathBuf>, download_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            dir: dir.into(),
            download_url: download_url.into(),
            backoff_path: None,
            http: reqwest::Client::builder().build()?,
        })
    }

    pub fn from_config(config: &PresenceConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(config.executable_dir(), config.download_url.clone())?
            .with_backoff_state(get_backoff_state_path()))
    }

    /// Where launch history is kept. `None` disables relaunch backoff.
    pub fn with_backoff_state(mut self, path: Option<PathBuf>) -> Self {
        self.backoff_path = path;
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        self.dir.join(EXECUTABLE_NAME)
    }

    pub fn download_source(&self) -> String {
        format!("{}{}", self.download_url, EXECUTABLE_NAME)
    }

    fn spawn_detached(path: &Path) -> Result<u32, LaunchError> {
        let mut command = Command::new(path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group so the daemon outlives the editor's signals.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(child.id())
    }

    fn install(&self, bytes: &[u8]) -> Result<(), LaunchError> {
        fs::create_dir_all(&self.dir).map_err(io_error("create executable dir"))?;
        let target = self.executable_path();
        let tmp_path = target.with_extension("download");
        fs::write(&tmp_path, bytes).map_err(io_error("write executable"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o755))
                .map_err(io_error("mark executable"))?;
        }

        fs::rename(&tmp_path, &target).map_err(io_error("install executable"))
    }
}

fn io_error(context: &'static str) -> impl FnOnce(std::io::Error) -> LaunchError {
    move |source| LaunchError::Io {
        context: context.to_string(),
        source,
    }
}

#[async_trait]
impl ProcessLauncher for ExecutableLauncher {
    fn executable_present(&self) -> bool {
        self.executable_path().is_file()
    }

    async fn launch(&self) -> Result<u32, LaunchError> {
        let path = self.executable_path();
        if !path.is_file() {
            return Err(LaunchError::ExecutableMissing(path));
        }

        if let Some(backoff_path) = &self.backoff_path {
            wait_for_launch_slot(backoff_path).await;
        }

        let pid = Self::spawn_detached(&path)?;
        info!(pid, path = %path.display(), "Launched presence daemon");
        Ok(pid)
    }

    async fn download(&self) -> Result<(), LaunchError> {
        let url = self.download_source();
        info!(url = %url, "Downloading presence daemon");

        let download_error = |err: reqwest::Error| LaunchError::Download {
            url: url.clone(),
            details: err.to_string(),
        };
        let bytes = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(download_error)?
            .bytes()
            .await
            .map_err(download_error)?;

        if bytes.is_empty() {
            return Err(LaunchError::Download {
                url,
                details: "empty response body".to_string(),
            });
        }

        self.install(&bytes)?;
        debug!(bytes = bytes.len(), path = %self.executable_path().display(), "Daemon executable installed");
        Ok(())
    }
}
