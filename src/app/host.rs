use serde_json::Value;

/// Callbacks into whatever embeds the editor (grid cell, modal, test).
pub trait EditorHost: Send + Sync {
    /// Called with `true` when the editor starts opening and `false` once it
    /// is closed, so ancestor overlays ignore outside clicks meanwhile.
    fn backdrop_lock(&self, active: bool);

    /// Receives the completion payload. Called at most once per completion.
    fn patch_parent(&self, payload: Value);

    /// Asks the user whether to leave although `missing` mandatory fields
    /// are empty. `false` keeps the editor open.
    fn confirm_discard(&self, missing: &[String]) -> bool;
}
