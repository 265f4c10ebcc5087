use std::fmt;

use indexmap::IndexMap;

use crate::{
    form::FieldValueStore,
    gateway::{InstanceId, InstanceRequest, LayoutDescriptor},
};

/// Lifecycle of one attribute editor.
///
/// `Opening` and `Completing` are the only states with remote work in
/// flight; `Completing` always leaves again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditorState {
    #[default]
    Closed,
    Opening,
    Open,
    Completing,
}

impl EditorState {
    pub fn as_str(self) -> &'static str {
        match self {
            EditorState::Closed => "closed",
            EditorState::Opening => "opening",
            EditorState::Open => "open",
            EditorState::Completing => "completing",
        }
    }
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic counter tagging every open attempt. Responses carrying an
/// older token than the session's are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(pub u64);

impl SessionToken {
    pub(crate) fn next(self) -> Self {
        SessionToken(self.0 + 1)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the edited attribute lives in the parent document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorTarget {
    pub attribute_type: String,
    pub reference_key: Option<String>,
    pub doc_type: Option<String>,
    pub data_id: Option<String>,
    pub tab_id: Option<String>,
    pub row_id: Option<String>,
    pub field_name: String,
    pub entity: String,
}

impl EditorTarget {
    pub fn new(
        attribute_type: impl Into<String>,
        field_name: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            attribute_type: attribute_type.into(),
            reference_key: None,
            doc_type: None,
            data_id: None,
            tab_id: None,
            row_id: None,
            field_name: field_name.into(),
            entity: entity.into(),
        }
    }

    pub fn with_reference_key(mut self, key: impl Into<String>) -> Self {
        self.reference_key = Some(key.into());
        self
    }

    pub fn with_document(mut self, doc_type: impl Into<String>, data_id: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self.data_id = Some(data_id.into());
        self
    }

    pub fn with_row(mut self, tab_id: impl Into<String>, row_id: impl Into<String>) -> Self {
        self.tab_id = Some(tab_id.into());
        self.row_id = Some(row_id.into());
        self
    }

    pub(crate) fn instance_request(&self) -> InstanceRequest {
        InstanceRequest {
            attribute_type: self.attribute_type.clone(),
            reference_key: self.reference_key.clone(),
            doc_type: self.doc_type.clone(),
            data_id: self.data_id.clone(),
            tab_id: self.tab_id.clone(),
            row_id: self.row_id.clone(),
            field_name: self.field_name.clone(),
            entity: self.entity.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeInstance {
    pub id: InstanceId,
    pub fields: FieldValueStore,
}

/// Mutable session owned by the controller. Never leaves the controller;
/// observers get a [`SessionSnapshot`].
#[derive(Debug, Default)]
pub(crate) struct EditorSession {
    pub(crate) state: EditorState,
    pub(crate) token: SessionToken,
    pub(crate) target: Option<EditorTarget>,
    pub(crate) instance: Option<AttributeInstance>,
    pub(crate) layout: Option<LayoutDescriptor>,
    pub(crate) field_errors: IndexMap<String, String>,
    pub(crate) status: super::status::StatusLine,
}

impl EditorSession {
    /// Drops everything tied to the current open attempt and invalidates
    /// any response still in flight for it.
    pub(crate) fn reset(&mut self) {
        self.state = EditorState::Closed;
        self.token = self.token.next();
        self.target = None;
        self.instance = None;
        self.layout = None;
        self.field_errors.clear();
        self.status.ready();
    }

    /// True while `token` still names this session in `expected` state.
    pub(crate) fn is_current(&self, token: SessionToken, expected: EditorState) -> bool {
        self.token == token && self.state == expected
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            token: self.token,
            target: self.target.clone(),
            instance_id: self.instance.as_ref().map(|instance| instance.id.clone()),
            fields: self
                .instance
                .as_ref()
                .map(|instance| instance.fields.clone())
                .unwrap_or_default(),
            layout: self.layout.clone(),
            field_errors: self.field_errors.clone(),
            status: self.status.message().to_string(),
        }
    }
}

/// Read-only view of the session handed to renderers.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: EditorState,
    pub token: SessionToken,
    pub target: Option<EditorTarget>,
    pub instance_id: Option<InstanceId>,
    pub fields: FieldValueStore,
    pub layout: Option<LayoutDescriptor>,
    pub field_errors: IndexMap<String, String>,
    pub status: String,
}

impl SessionSnapshot {
    pub fn can_render_form(&self) -> bool {
        self.instance_id.is_some() && self.layout.is_some()
    }

    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.field_errors.get(name).map(String::as_str)
    }
}
