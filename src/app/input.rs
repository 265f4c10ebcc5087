use crossterm::event::{KeyEvent, KeyEventKind};

use crate::presentation::ActiveList;

use super::{
    controller::{AttributeEditor, CompletionOutcome},
    error::EditorError,
    keymap::{KeyAction, KeymapContext},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Focus moved inside the active list; carries the new active index.
    Navigated(usize),
    /// Enter on the list item at this index; the caller runs its action.
    Activated(usize),
    Completion(CompletionOutcome),
    Unhandled,
}

/// Routes a key press to list navigation or to the editor.
///
/// With a focused `list` the `list` keymap context applies, otherwise the
/// `editor` context. Escape always ends up in
/// [`AttributeEditor::request_completion`], never in a silent cancel.
pub async fn route_key<T>(
    editor: &AttributeEditor,
    list: Option<&mut ActiveList<T>>,
    key: &KeyEvent,
) -> Result<KeyOutcome, EditorError> {
    if key.kind != KeyEventKind::Press {
        return Ok(KeyOutcome::Unhandled);
    }
    let context = if list.is_some() {
        KeymapContext::List
    } else {
        KeymapContext::Editor
    };
    let Some(action) = editor.options().keymap.classify(context, key) else {
        return Ok(KeyOutcome::Unhandled);
    };
    match (action, list) {
        (KeyAction::RequestCompletion, _) => editor
            .request_completion()
            .await
            .map(KeyOutcome::Completion),
        (KeyAction::FocusStep(delta), Some(list)) => {
            list.step(delta);
            Ok(list
                .active()
                .map(KeyOutcome::Navigated)
                .unwrap_or(KeyOutcome::Unhandled))
        }
        (KeyAction::Activate, Some(list)) => Ok(list
            .active()
            .map(KeyOutcome::Activated)
            .unwrap_or(KeyOutcome::Unhandled)),
        (_, None) => Ok(KeyOutcome::Unhandled),
    }
}
