//! Event debouncing.
//!
//! Editors fire document, focus and selection events far faster than the
//! daemon needs to hear about them. The debouncer turns that stream into rare
//! "report this document now" decisions:
//!
//! - Switching documents or regaining focus only marks a report as due.
//! - The next keyboard-originated selection change dispatches it.
//! - A document whose path was the last one dispatched is never sent again.
//!
//! Mouse, command and unclassified selection changes never dispatch, so a
//! multi-file replace or a scripted navigation touches nothing.

use crate::editor::{Document, SelectionKind};

#[derive(Debug, Default)]
pub struct EventDebouncer {
    report_due: bool,
    focused: bool,
    last_dispatched: Option<String>,
}

impl EventDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_due(&self) -> bool {
        self.report_due
    }

    pub fn last_dispatched(&self) -> Option<&str> {
        self.last_dispatched.as_deref()
    }

    pub fn on_active_document_changed(&mut self) {
        self.report_due = true;
    }

    /// Only the unfocused → focused transition marks a report as due.
    pub fn on_window_focus_changed(&mut self, focused: bool) {
        if focused && !self.focused {
            self.report_due = true;
        }
        self.focused = focused;
    }

    /// Returns the document to report, if this selection change should
    /// trigger one.
    ///
    /// The due flag survives a keyboard event that arrives while no document
    /// is active; it is cleared only when something is actually dispatched.
    pub fn on_selection_changed(
        &mut self,
        kind: SelectionKind,
        active: Option<&Document>,
    ) -> Option<Document> {
        if !self.report_due || kind != SelectionKind::Keyboard {
            return None;
        }
        let document = active?;
        self.report_due = false;
        self.dispatch(document)
    }

    /// Records `document` as sent unless its path matches the last one.
    ///
    /// The path is recorded before the send happens, so a failed send is not
    /// retried from here; the heartbeat's resync covers that.
    pub fn dispatch(&mut self, document: &Document) -> Option<Document> {
        if self.last_dispatched.as_deref() == Some(document.path.as_str()) {
            return None;
        }
        self.last_dispatched = Some(document.path.clone());
        Some(document.clone())
    }
}
