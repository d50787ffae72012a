//! Recovery prompts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use presence_core::{LaunchError, RecoveryPrompt};
use tracing::info;

/// Asks on the terminal. Used by `start`, where stdin belongs to the user.
pub struct TerminalPrompt;

impl TerminalPrompt {
    async fn ask(question: String) -> bool {
        tokio::task::spawn_blocking(move || {
            let mut stderr = io::stderr();
            let _ = write!(stderr, "{} [y/N] ", question);
            let _ = stderr.flush();

            let mut answer = String::new();
            if io::stdin().lock().read_line(&mut answer).is_err() {
                return false;
            }
            is_yes(&answer)
        })
        .await
        .unwrap_or(false)
    }
}

#[async_trait]
impl RecoveryPrompt for TerminalPrompt {
    async fn confirm_download(&self) -> bool {
        Self::ask("Presence server was not found. Download it?".to_string()).await
    }

    async fn confirm_retry(&self, error: &LaunchError) -> bool {
        Self::ask(format!("Presence download failed ({}). Retry?", error)).await
    }
}

/// Declines everything. Used by `attach`, where stdin carries editor events.
pub struct NonInteractive;

#[async_trait]
impl RecoveryPrompt for NonInteractive {
    async fn confirm_download(&self) -> bool {
        info!("Presence server not installed; run `presence-editor start` to download it");
        false
    }

    async fn confirm_retry(&self, _error: &LaunchError) -> bool {
        false
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[tokio::test]
    async fn non_interactive_declines() {
        assert!(!NonInteractive.confirm_download().await);
        assert!(!NonInteractive.confirm_retry(&LaunchError::Declined).await);
    }
}
