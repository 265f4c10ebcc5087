use std::sync::Arc;

use crate::form::PatchMergePolicy;

use super::keymap::{self, Keymap};

/// What happens to the session when complete-instance is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFailurePolicy {
    /// Close anyway; the user retries from the field tag.
    #[default]
    Close,
    /// Return to `Open` with all edits kept so completion can be retried.
    StayOpen,
}

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub completion_failure: CompletionFailurePolicy,
    pub patch_merge: PatchMergePolicy,
    pub event_capacity: usize,
    pub(crate) keymap: Arc<Keymap>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            completion_failure: CompletionFailurePolicy::default(),
            patch_merge: PatchMergePolicy::default(),
            event_capacity: 64,
            keymap: keymap::default_keymap(),
        }
    }
}

impl EditorOptions {
    pub fn with_completion_failure(mut self, policy: CompletionFailurePolicy) -> Self {
        self.completion_failure = policy;
        self
    }

    pub fn with_patch_merge(mut self, policy: PatchMergePolicy) -> Self {
        self.patch_merge = policy;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = Arc::new(keymap);
        self
    }

    pub fn keymap(&self) -> Arc<Keymap> {
        Arc::clone(&self.keymap)
    }
}
