#![deny(rust_2018_idioms)]

pub mod app;
pub mod form;
pub mod gateway;
pub mod presentation;

pub use app::{
    AttributeEditor, CompletionFailurePolicy, CompletionOutcome, EditorError, EditorEvent,
    EditorHost, EditorOptions, EditorState, EditorTarget, OpenOutcome, PatchOutcome,
    SessionSnapshot,
};
pub use form::{FieldDescriptor, FieldValueStore, PatchMergePolicy};
pub use gateway::{AttributeGateway, FixtureGateway, GatewayError, InstanceId};

pub mod prelude {
    pub use super::{
        AttributeEditor, AttributeGateway, EditorHost, EditorOptions, EditorState, EditorTarget,
    };
}
