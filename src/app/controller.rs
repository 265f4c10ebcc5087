use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    form::{FieldValue, FieldValueStore},
    gateway::{AttributeGateway, GatewayError, InstanceId, PatchRequest},
};

use super::{
    error::EditorError,
    events::EditorEvent,
    host::EditorHost,
    keymap::KeymapContext,
    options::{CompletionFailurePolicy, EditorOptions},
    session::{
        AttributeInstance, EditorSession, EditorState, EditorTarget, SessionSnapshot, SessionToken,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Instance and layout arrived; the editor is `Open`.
    Opened,
    /// The editor was not `Closed`; nothing happened.
    Ignored,
    /// The editor was closed or reopened while this attempt was in flight;
    /// its responses were dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied { changed: Vec<String> },
    /// The server accepted the value but named no fields.
    NoChanges,
    /// The session moved on before the response arrived.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// complete-instance succeeded and the payload went to the parent.
    Completed,
    /// Mandatory fields are empty and the user chose to keep editing.
    Declined { missing: Vec<String> },
    /// Mandatory fields are empty and the user chose to leave anyway.
    Discarded { missing: Vec<String> },
    /// A completion request is already running.
    InProgress,
}

enum CompletionGate {
    Missing {
        token: SessionToken,
        missing: Vec<String>,
    },
    Ready {
        token: SessionToken,
        attribute_type: String,
        instance_id: InstanceId,
    },
}

/// Drives one attribute editor through open, edit, patch and completion.
///
/// The handle is cheap to clone; all clones share one session. The session
/// lock is only held for synchronous bookkeeping, never across a gateway
/// call, so `close` always returns immediately. Every remote response is
/// checked against the session token it was issued under and dropped when
/// the session has moved on.
#[derive(Clone)]
pub struct AttributeEditor {
    session: Arc<Mutex<EditorSession>>,
    gateway: Arc<dyn AttributeGateway>,
    host: Arc<dyn EditorHost>,
    events: broadcast::Sender<EditorEvent>,
    options: Arc<EditorOptions>,
}

impl AttributeEditor {
    pub fn new(gateway: Arc<dyn AttributeGateway>, host: Arc<dyn EditorHost>) -> Self {
        Self::with_options(gateway, host, EditorOptions::default())
    }

    pub fn with_options(
        gateway: Arc<dyn AttributeGateway>,
        host: Arc<dyn EditorHost>,
        options: EditorOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            session: Arc::new(Mutex::new(EditorSession::default())),
            gateway,
            host,
            events,
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> EditorState {
        self.session.lock().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Opens the editor for `target`. Only acts from `Closed`.
    ///
    /// fetch-layout is issued strictly after fetch-instance resolved, since
    /// it needs the instance id.
    pub async fn open(&self, target: EditorTarget) -> Result<OpenOutcome, EditorError> {
        let (token, request) = {
            let mut session = self.session.lock();
            if session.state != EditorState::Closed {
                debug!(state = %session.state, "open ignored, editor already active");
                return Ok(OpenOutcome::Ignored);
            }
            session.token = session.token.next();
            session.state = EditorState::Opening;
            session.status.loading(&target.field_name);
            let request = target.instance_request();
            session.target = Some(target);
            (session.token, request)
        };
        debug!(%token, field = %request.field_name, "opening attribute editor");
        self.host.backdrop_lock(true);
        self.emit(EditorEvent::StateChanged {
            token,
            state: EditorState::Opening,
        });

        let instance = match self.gateway.fetch_instance(&request).await {
            Ok(instance) => instance,
            Err(source) => return self.fail_open(token, request.field_name, source),
        };
        let instance_id = instance.id.clone();
        let names = {
            let mut session = self.session.lock();
            if !session.is_current(token, EditorState::Opening) {
                debug!(%token, current = %session.token, "dropping stale fetch-instance response");
                return Ok(OpenOutcome::Superseded);
            }
            let fields = FieldValueStore::from_fields_by_name(instance.fields_by_name);
            let names = fields.names().map(str::to_string).collect::<Vec<_>>();
            session.instance = Some(AttributeInstance {
                id: instance.id,
                fields,
            });
            names
        };
        self.emit(EditorEvent::FieldsChanged { token, names });

        let layout = match self
            .gateway
            .fetch_layout(&request.attribute_type, &instance_id)
            .await
        {
            Ok(layout) => layout,
            Err(source) => return self.fail_open(token, request.field_name, source),
        };
        {
            let mut session = self.session.lock();
            if !session.is_current(token, EditorState::Opening) {
                debug!(%token, current = %session.token, "dropping stale fetch-layout response");
                return Ok(OpenOutcome::Superseded);
            }
            session.layout = Some(layout);
            session.state = EditorState::Open;
            let help = self.options.keymap.help_text(KeymapContext::Editor);
            session.status.editing(help.as_deref());
        }
        info!(%token, instance = %instance_id, "attribute editor open");
        self.emit(EditorEvent::StateChanged {
            token,
            state: EditorState::Open,
        });
        Ok(OpenOutcome::Opened)
    }

    /// Toggle-off/toggle-on: forces the editor closed, dropping whatever is
    /// in flight, then opens it for `target`.
    pub async fn reopen(&self, target: EditorTarget) -> Result<OpenOutcome, EditorError> {
        self.close(true);
        self.open(target).await
    }

    /// Tears the session down and releases the backdrop lock. Works from
    /// any state; pending responses for the old session are dropped when
    /// they arrive. Returns `false` if the editor was already closed.
    pub fn close(&self, discard: bool) -> bool {
        self.close_session(None, discard)
    }

    /// Local edit. No remote call and no validation.
    pub fn edit_field(&self, field: &str, value: FieldValue) -> Result<(), EditorError> {
        let token = {
            let mut guard = self.session.lock();
            let session = &mut *guard;
            let state = session.state;
            let Some(instance) = session
                .instance
                .as_mut()
                .filter(|_| state == EditorState::Open)
            else {
                return Err(EditorError::InvalidState {
                    operation: "edit",
                    state,
                });
            };
            instance.fields = instance.fields.with_value(field, value)?;
            session.field_errors.shift_remove(field);
            session.token
        };
        self.emit(EditorEvent::FieldsChanged {
            token,
            names: vec![field.to_string()],
        });
        Ok(())
    }

    /// Persists one field remotely and folds the response into the store.
    ///
    /// The response may name more fields than the one edited; all of them
    /// are merged. On rejection the store is left alone and the error is
    /// recorded against the field.
    pub async fn patch_field(
        &self,
        field: &str,
        value: FieldValue,
        instance_id: &InstanceId,
    ) -> Result<PatchOutcome, EditorError> {
        let (token, request) = {
            let session = self.session.lock();
            let state = session.state;
            let (Some(instance), Some(target)) = (session.instance.as_ref(), session.target.as_ref())
            else {
                return Err(EditorError::InvalidState {
                    operation: "patch",
                    state,
                });
            };
            if state != EditorState::Open {
                return Err(EditorError::InvalidState {
                    operation: "patch",
                    state,
                });
            }
            if instance.id != *instance_id {
                return Err(EditorError::InstanceMismatch {
                    expected: instance.id.clone(),
                    got: instance_id.clone(),
                });
            }
            if !instance.fields.contains(field) {
                return Err(crate::form::UnknownField(field.to_string()).into());
            }
            let request = PatchRequest {
                entity: target.attribute_type.clone(),
                doc_type: None,
                doc_id: instance.id.clone(),
                property: field.to_string(),
                value,
            };
            (session.token, request)
        };

        let result = self.gateway.patch_field(&request).await;

        let mut guard = self.session.lock();
        let session = &mut *guard;
        let current = session.token == token;
        let Some(instance) = session.instance.as_mut().filter(|_| current) else {
            debug!(%token, field, "dropping patch response for a closed session");
            return Ok(PatchOutcome::Discarded);
        };
        match result {
            Ok(documents) => {
                let (fields, changed) = instance.fields.merge_patch(
                    documents.iter().map(|document| &document.fields_by_name),
                    &request.value,
                    self.options.patch_merge,
                );
                instance.fields = fields;
                session.field_errors.shift_remove(field);
                if changed.is_empty() {
                    debug!(%token, field, "patch accepted without field changes");
                    return Ok(PatchOutcome::NoChanges);
                }
                session.status.value_updated(field);
                drop(guard);
                debug!(%token, field, changed = ?changed, "patch merged");
                self.emit(EditorEvent::FieldsChanged {
                    token,
                    names: changed.clone(),
                });
                Ok(PatchOutcome::Applied { changed })
            }
            Err(source) => {
                let message = source.to_string();
                warn!(%token, field, error = %message, "patch rejected");
                session.field_errors.insert(field.to_string(), message.clone());
                session.status.set_raw(format!("{field}: {message}"));
                drop(guard);
                self.emit(EditorEvent::FieldError {
                    token,
                    field: field.to_string(),
                    message,
                });
                Err(EditorError::PatchFailed {
                    field: field.to_string(),
                    source,
                })
            }
        }
    }

    /// Tries to finish editing. Escape and outside clicks land here too.
    ///
    /// Empty mandatory fields turn this into a discard prompt; otherwise the
    /// instance is completed, the payload is handed to the parent and the
    /// editor closes.
    pub async fn request_completion(&self) -> Result<CompletionOutcome, EditorError> {
        let gate = {
            let mut guard = self.session.lock();
            let session = &mut *guard;
            match session.state {
                EditorState::Completing => return Ok(CompletionOutcome::InProgress),
                EditorState::Open => {}
                state => {
                    return Err(EditorError::InvalidState {
                        operation: "complete",
                        state,
                    });
                }
            }
            let Some(instance) = session.instance.as_ref() else {
                return Err(EditorError::InvalidState {
                    operation: "complete",
                    state: session.state,
                });
            };
            let missing = instance.fields.missing_mandatory();
            if missing.is_empty() {
                let gate = CompletionGate::Ready {
                    token: session.token,
                    attribute_type: session
                        .target
                        .as_ref()
                        .map(|target| target.attribute_type.clone())
                        .unwrap_or_default(),
                    instance_id: instance.id.clone(),
                };
                session.state = EditorState::Completing;
                session.status.saving();
                gate
            } else {
                session.status.missing_mandatory(&missing);
                CompletionGate::Missing {
                    token: session.token,
                    missing,
                }
            }
        };

        match gate {
            CompletionGate::Missing { token, missing } => {
                if self.host.confirm_discard(&missing) {
                    info!(%token, missing = ?missing, "leaving with empty mandatory fields");
                    self.close_session(Some(token), true);
                    Ok(CompletionOutcome::Discarded { missing })
                } else {
                    debug!(%token, missing = ?missing, "discard declined, editor stays open");
                    Ok(CompletionOutcome::Declined { missing })
                }
            }
            CompletionGate::Ready {
                token,
                attribute_type,
                instance_id,
            } => {
                self.emit(EditorEvent::StateChanged {
                    token,
                    state: EditorState::Completing,
                });
                let result = self
                    .gateway
                    .complete_instance(&attribute_type, &instance_id)
                    .await;
                self.finish_completion(token, instance_id, result)
            }
        }
    }

    fn finish_completion(
        &self,
        token: SessionToken,
        instance_id: InstanceId,
        result: Result<serde_json::Value, GatewayError>,
    ) -> Result<CompletionOutcome, EditorError> {
        match result {
            Ok(payload) => {
                // The payload belongs to the parent document even if this
                // session was closed meanwhile.
                self.host.patch_parent(payload);
                self.emit(EditorEvent::Completed { token });
                info!(%token, instance = %instance_id, "attribute instance completed");
                self.close_session(Some(token), false);
                Ok(CompletionOutcome::Completed)
            }
            Err(source) => {
                warn!(%token, instance = %instance_id, error = %source, "completion rejected");
                match self.options.completion_failure {
                    CompletionFailurePolicy::Close => {
                        self.close_session(Some(token), true);
                    }
                    CompletionFailurePolicy::StayOpen => {
                        let reopened = {
                            let mut session = self.session.lock();
                            let current = session.is_current(token, EditorState::Completing);
                            if current {
                                session.state = EditorState::Open;
                                session.status.set_raw(source.to_string());
                            }
                            current
                        };
                        if reopened {
                            self.emit(EditorEvent::StateChanged {
                                token,
                                state: EditorState::Open,
                            });
                        }
                    }
                }
                Err(EditorError::CompletionFailed {
                    instance_id,
                    source,
                })
            }
        }
    }

    fn fail_open(
        &self,
        token: SessionToken,
        field_name: String,
        source: GatewayError,
    ) -> Result<OpenOutcome, EditorError> {
        let current = self.session.lock().is_current(token, EditorState::Opening);
        if !current {
            debug!(%token, error = %source, "ignoring failure of a superseded open");
            return Ok(OpenOutcome::Superseded);
        }
        warn!(%token, field = %field_name, error = %source, "open failed");
        self.close_session(Some(token), true);
        Err(EditorError::OpenFailed { field_name, source })
    }

    /// Resets the session if it is still the one `expected` names (or any
    /// session when `expected` is `None`). Host callbacks run after the lock
    /// is released.
    fn close_session(&self, expected: Option<SessionToken>, discard: bool) -> bool {
        let token = {
            let mut session = self.session.lock();
            if session.state == EditorState::Closed {
                return false;
            }
            if expected.is_some_and(|token| token != session.token) {
                return false;
            }
            let token = session.token;
            session.reset();
            token
        };
        debug!(%token, discard, "attribute editor closed");
        self.host.backdrop_lock(false);
        self.emit(EditorEvent::Closed {
            token,
            discarded: discard,
        });
        self.emit(EditorEvent::StateChanged {
            token,
            state: EditorState::Closed,
        });
        true
    }

    fn emit(&self, event: EditorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
