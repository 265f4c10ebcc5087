use super::session::{EditorState, SessionToken};

/// Change notifications for renderers. Receivers re-read
/// [`AttributeEditor::snapshot`](super::AttributeEditor::snapshot) on any event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    StateChanged {
        token: SessionToken,
        state: EditorState,
    },
    FieldsChanged {
        token: SessionToken,
        names: Vec<String>,
    },
    FieldError {
        token: SessionToken,
        field: String,
        message: String,
    },
    Completed {
        token: SessionToken,
    },
    Closed {
        token: SessionToken,
        discarded: bool,
    },
}
