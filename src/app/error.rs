use thiserror::Error;

use crate::{
    form::UnknownField,
    gateway::{GatewayError, InstanceId},
};

use super::session::EditorState;

/// Everything an editor operation can report back to the host.
///
/// Gateway failures never escape raw; they arrive wrapped in the variant
/// naming the lifecycle step that failed.
#[derive(Debug, Error)]
pub enum EditorError {
    /// fetch-instance or fetch-layout was rejected; the editor is closed again.
    #[error("could not open attributes for {field_name}")]
    OpenFailed {
        field_name: String,
        #[source]
        source: GatewayError,
    },
    /// A field patch was rejected; the editor stays open with its values unchanged.
    #[error("could not save {field}")]
    PatchFailed {
        field: String,
        #[source]
        source: GatewayError,
    },
    /// complete-instance was rejected.
    #[error("could not complete attribute instance {instance_id}")]
    CompletionFailed {
        instance_id: InstanceId,
        #[source]
        source: GatewayError,
    },
    #[error("{operation} is not allowed while the editor is {state}")]
    InvalidState {
        operation: &'static str,
        state: EditorState,
    },
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
    #[error("instance {got} is not the open instance {expected}")]
    InstanceMismatch {
        expected: InstanceId,
        got: InstanceId,
    },
}

impl EditorError {
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            EditorError::OpenFailed { source, .. }
            | EditorError::PatchFailed { source, .. }
            | EditorError::CompletionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
