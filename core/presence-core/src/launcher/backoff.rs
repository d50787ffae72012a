//! Relaunch backoff.
//!
//! Every launch is recorded in a small JSON file shared by all editor
//! instances. More than [`MAX_LAUNCHES`] launches inside [`WINDOW_SECS`]
//! means the daemon keeps dying, so each extra launch waits another
//! [`BACKOFF_STEP_SECS`], up to [`BACKOFF_MAX_SECS`].

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LaunchError;

pub const WINDOW_SECS: i64 = 120;
pub const MAX_LAUNCHES: usize = 3;
pub const BACKOFF_STEP_SECS: u64 = 10;
pub const BACKOFF_MAX_SECS: u64 = 60;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LaunchHistory {
    #[serde(default)]
    launches: Vec<DateTime<Utc>>,
}

impl LaunchHistory {
    pub fn len(&self) -> usize {
        self.launches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.launches.is_empty()
    }

    /// Forgets launches older than the window, records one at `now`, and
    /// returns how long that launch should wait.
    pub fn record(&mut self, now: DateTime<Utc>) -> Option<Duration> {
        self.launches
            .retain(|at| now.signed_duration_since(*at).num_seconds() <= WINDOW_SECS);
        self.launches.push(now);

        let extra = self.launches.len().checked_sub(MAX_LAUNCHES)?;
        if extra == 0 {
            return None;
        }
        let secs = BACKOFF_STEP_SECS
            .saturating_mul(extra as u64)
            .min(BACKOFF_MAX_SECS);
        Some(Duration::from_secs(secs))
    }

    /// A missing or unreadable file is an empty history.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %err, "Failed to read launch history");
                }
                return Self::default();
            }
        };
        serde_json::from_slice(&data).unwrap_or_else(|err| {
            warn!(error = %err, path = %path.display(), "Discarding corrupt launch history");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), LaunchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LaunchError::Io {
                context: "create launch history dir".to_string(),
                source,
            })?;
        }

        let payload = serde_json::to_vec_pretty(self).map_err(|err| LaunchError::Io {
            context: "serialize launch history".to_string(),
            source: err.into(),
        })?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, payload).map_err(|source| LaunchError::Io {
            context: "write launch history".to_string(),
            source,
        })?;
        fs::rename(&tmp_path, path).map_err(|source| LaunchError::Io {
            context: "commit launch history".to_string(),
            source,
        })
    }
}

/// Records a launch in the history at `path` and sleeps off any backoff.
pub async fn wait_for_launch_slot(path: &Path) {
    let mut history = LaunchHistory::load(path);
    let delay = history.record(Utc::now());

    if let Err(err) = history.save(path) {
        warn!(error = %err, "Failed to persist launch history");
    }

    if let Some(delay) = delay {
        warn!(
            launches = history.len(),
            backoff_secs = delay.as_secs(),
            "Daemon relaunch backoff engaged"
        );
        tokio::time::sleep(delay).await;
    }
}
