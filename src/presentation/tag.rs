use crate::app::EditorState;

const DEFAULT_LABEL: &str = "Edit";

/// The compact tag a grid cell shows for an attribute field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    pub caption: Option<String>,
    pub readonly: bool,
    pub row_id: Option<String>,
}

impl FieldTag {
    pub fn new(caption: Option<String>) -> Self {
        Self {
            caption,
            ..Self::default()
        }
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn in_row(mut self, row_id: impl Into<String>) -> Self {
        self.row_id = Some(row_id.into());
        self
    }

    pub fn label(&self) -> &str {
        self.caption
            .as_deref()
            .filter(|caption| !caption.is_empty())
            .unwrap_or(DEFAULT_LABEL)
    }

    /// The tag cannot be activated while its editor is active or the field
    /// is read-only.
    pub fn is_disabled(&self, state: EditorState) -> bool {
        self.readonly || state != EditorState::Closed
    }

    pub fn in_table(&self) -> bool {
        self.row_id.is_some()
    }
}
