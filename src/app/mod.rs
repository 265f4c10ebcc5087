mod controller;
mod error;
mod events;
mod host;
mod input;
pub(crate) mod keymap;
mod options;
mod session;
mod status;

pub use controller::{AttributeEditor, CompletionOutcome, OpenOutcome, PatchOutcome};
pub use error::EditorError;
pub use events::EditorEvent;
pub use host::EditorHost;
pub use input::{KeyOutcome, route_key};
pub use keymap::{KeyAction, Keymap, KeymapContext, KeymapError, default_keymap, parse_key};
pub use options::{CompletionFailurePolicy, EditorOptions};
pub use session::{AttributeInstance, EditorState, EditorTarget, SessionSnapshot, SessionToken};
pub use status::READY_STATUS;
