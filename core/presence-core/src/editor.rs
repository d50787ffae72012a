//! Editor-side glue: the events an editor delivers and the bridge that feeds
//! them through the debouncer into the session client.

use presence_daemon_protocol::SessionSnapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::debounce::EventDebouncer;
use crate::session::{Outcome, SessionClient};

/// A document open in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub language: String,
}

impl Document {
    pub fn new(path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
        }
    }
}

/// What caused a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Keyboard,
    Mouse,
    /// Programmatic moves (go-to-definition, search results, macros).
    Command,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    ActiveDocumentChanged {
        #[serde(default)]
        document: Option<Document>,
    },
    WindowFocusChanged {
        focused: bool,
    },
    SelectionChanged {
        #[serde(default)]
        kind: SelectionKind,
        #[serde(default)]
        document: Option<Document>,
    },
}

/// Routes editor events to the session client.
///
/// Tracks the active document itself; the debouncer only decides when.
pub struct EditorBridge {
    session: SessionClient,
    debouncer: EventDebouncer,
    active: Option<Document>,
}

impl EditorBridge {
    pub fn new(session: SessionClient) -> Self {
        Self {
            session,
            debouncer: EventDebouncer::new(),
            active: None,
        }
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.as_ref()
    }

    /// Reports the document open at startup without waiting for a keystroke.
    pub async fn attach(&mut self, active: Option<Document>) -> Option<Outcome<SessionSnapshot>> {
        self.active = active;
        let document = self.debouncer.dispatch(self.active.as_ref()?)?;
        Some(self.report(document).await)
    }

    /// Returns the outcome when the event led to a `set_path` call.
    pub async fn handle(&mut self, event: EditorEvent) -> Option<Outcome<SessionSnapshot>> {
        let document = match event {
            EditorEvent::ActiveDocumentChanged { document } => {
                self.active = document;
                self.debouncer.on_active_document_changed();
                None
            }
            EditorEvent::WindowFocusChanged { focused } => {
                self.debouncer.on_window_focus_changed(focused);
                None
            }
            EditorEvent::SelectionChanged { kind, document } => {
                if document.is_some() {
                    self.active = document;
                }
                self.debouncer
                    .on_selection_changed(kind, self.active.as_ref())
            }
        }?;
        Some(self.report(document).await)
    }

    async fn report(&self, document: Document) -> Outcome<SessionSnapshot> {
        debug!(path = %document.path, language = %document.language, "Reporting active document");
        self.session
            .report_path(&document.path, &document.language)
            .await
    }
}
