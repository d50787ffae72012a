//! presence-editor: editor bridge for the presence daemon.
//!
//! Editor plugins spawn `presence-editor attach` and talk to it over
//! stdin/stdout; the other subcommands are one-shot helpers for scripts and
//! for starting the daemon by hand.
//!
//! ## Subcommands
//!
//! - `attach`: Event loop. Editor events in (JSON lines), status lines out
//! - `status`: Print the current status line once
//! - `ping`: Exit 0 if the daemon answers, 1 otherwise
//! - `path`: Print the repository path the daemon tracks for this editor
//! - `start`: Launch the daemon, offering to download it if missing

mod attach;
mod logging;
mod prompt;
mod sink;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use presence_core::config::daemon_enabled;
use presence_core::launcher::start_daemon;
use presence_core::{
    project, Document, ExecutableLauncher, NullSink, Outcome, PresenceConfig, PresenceError,
    SessionClient, SessionView, StatusSink,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::attach::{wait_for_shutdown_signal, Attachment};
use crate::prompt::{NonInteractive, TerminalPrompt};
use crate::sink::{StatusLine, StdoutSink};

#[derive(Parser)]
#[command(name = "presence-editor")]
#[command(about = "Reports editor activity to the presence daemon")]
#[command(version)]
struct Cli {
    /// Instance id sent with every call (defaults to the parent process id)
    #[arg(long, global = true)]
    id: Option<u32>,

    /// Editor kind reported to the daemon
    #[arg(long, global = true)]
    editor: Option<String>,

    /// Daemon address (overrides config and PRESENCE_ADDRESS)
    #[arg(long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bridge editor events on stdin to the daemon; print status lines on stdout
    Attach {
        /// Document open at startup
        #[arg(long, value_name = "PATH")]
        path: Option<String>,

        /// Language of the startup document
        #[arg(long, default_value = "plaintext")]
        language: String,
    },

    /// Print the current status line
    Status,

    /// Check whether the daemon is answering
    Ping,

    /// Print the repository path the daemon tracks for this editor
    Path,

    /// Launch the daemon, downloading it first if needed
    Start,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "presence-editor failed");
            eprintln!("presence-editor: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, PresenceError> {
    if !daemon_enabled() {
        info!("PRESENCE_ENABLED=0, exiting without contacting the daemon");
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = PresenceConfig::load()?;
    if let Some(editor) = cli.editor {
        config.editor = editor;
    }
    if let Some(address) = cli.address {
        config.address = address;
    }
    let instance_id = cli.id.unwrap_or_else(default_instance_id);

    match cli.command {
        Commands::Attach { path, language } => {
            let initial = path.map(|path| Document::new(path, language));
            run_attach(&config, instance_id, initial).await
        }
        Commands::Status => {
            let session = SessionClient::from_config(&config, instance_id, Arc::new(NullSink))?;
            let (status, code) = match session.get_info().await {
                Outcome::Success(snapshot) => {
                    (project(SessionView::Snapshot(&snapshot)), ExitCode::SUCCESS)
                }
                Outcome::Failed(_) | Outcome::Suppressed => {
                    (project(SessionView::Unreachable), ExitCode::FAILURE)
                }
            };
            println!("{}", StatusLine::new(&status).to_json());
            Ok(code)
        }
        Commands::Ping => {
            let session = SessionClient::from_config(&config, instance_id, Arc::new(NullSink))?;
            if session.probe_liveness().await {
                println!("running");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("not running");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Path => {
            let session = SessionClient::from_config(&config, instance_id, Arc::new(NullSink))?;
            match session.get_path().await {
                Outcome::Success(path) => {
                    println!("{}", path);
                    Ok(ExitCode::SUCCESS)
                }
                Outcome::Failed(err) => Err(err.into()),
                Outcome::Suppressed => Ok(ExitCode::FAILURE),
            }
        }
        Commands::Start => {
            let session = SessionClient::from_config(&config, instance_id, Arc::new(NullSink))?;
            let launcher = ExecutableLauncher::from_config(&config)?;
            start_daemon(
                &session,
                &launcher,
                &TerminalPrompt,
                config.probe_attempts,
                config.probe_interval(),
            )
            .await?;
            println!("Presence daemon is running");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_attach(
    config: &PresenceConfig,
    instance_id: u32,
    initial: Option<Document>,
) -> Result<ExitCode, PresenceError> {
    let (sink, writer) = StdoutSink::spawn();
    let sink: Arc<dyn StatusSink> = Arc::new(sink);
    let session = SessionClient::from_config(config, instance_id, sink)?;
    let launcher = Arc::new(ExecutableLauncher::from_config(config)?);

    info!(
        id = instance_id,
        editor = %config.editor,
        address = %config.address,
        "Attaching editor"
    );

    let shutdown = CancellationToken::new();
    let signals = tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));

    Attachment::new(
        session,
        launcher,
        Arc::new(NonInteractive),
        config.probe_attempts,
        config.probe_interval(),
    )
    .with_initial_document(initial)
    .run(tokio::io::BufReader::new(tokio::io::stdin()), shutdown)
    .await;

    signals.abort();
    // The writer finishes once the session (and with it the sink) is gone.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), writer).await;
    Ok(ExitCode::SUCCESS)
}

#[cfg(unix)]
fn default_instance_id() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn default_instance_id() -> u32 {
    std::process::id()
}
