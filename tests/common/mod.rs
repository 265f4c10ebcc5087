#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use attredit::{
    AttributeEditor, EditorHost, EditorOptions, EditorState, EditorTarget, FieldDescriptor,
    GatewayError, InstanceId, OpenOutcome,
    form::FieldsByName,
    gateway::{
        AttributeGateway, CompletionPayload, InstanceRequest, InstanceResponse, LayoutDescriptor,
        Operation, PatchDocument, PatchRequest,
    },
};

pub type Answer<T> = Result<T, GatewayError>;

enum Reply<T> {
    Ready(Answer<T>),
    Deferred(oneshot::Receiver<Answer<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self, operation: Operation) -> Answer<T> {
        match self {
            Reply::Ready(answer) => answer,
            Reply::Deferred(receiver) => receiver
                .await
                .unwrap_or(Err(GatewayError::Unavailable { operation })),
        }
    }
}

struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Script<T> {
    fn push(&self, answer: Answer<T>) {
        self.replies.lock().push_back(Reply::Ready(answer));
    }

    fn defer(&self) -> oneshot::Sender<Answer<T>> {
        let (sender, receiver) = oneshot::channel();
        self.replies.lock().push_back(Reply::Deferred(receiver));
        sender
    }

    async fn next(&self, operation: Operation) -> Answer<T> {
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve(operation).await,
            None => Err(GatewayError::Unavailable { operation }),
        }
    }
}

/// Gateway answering from per-operation queues and logging every call.
#[derive(Default)]
pub struct ScriptedGateway {
    log: Mutex<Vec<String>>,
    patch_requests: Mutex<Vec<PatchRequest>>,
    instances: Script<InstanceResponse>,
    layouts: Script<LayoutDescriptor>,
    patches: Script<Vec<PatchDocument>>,
    completions: Script<CompletionPayload>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_instance(&self, answer: Answer<InstanceResponse>) {
        self.instances.push(answer);
    }

    pub fn defer_instance(&self) -> oneshot::Sender<Answer<InstanceResponse>> {
        self.instances.defer()
    }

    pub fn push_layout(&self, answer: Answer<LayoutDescriptor>) {
        self.layouts.push(answer);
    }

    pub fn defer_layout(&self) -> oneshot::Sender<Answer<LayoutDescriptor>> {
        self.layouts.defer()
    }

    pub fn push_patch(&self, answer: Answer<Vec<PatchDocument>>) {
        self.patches.push(answer);
    }

    pub fn defer_patch(&self) -> oneshot::Sender<Answer<Vec<PatchDocument>>> {
        self.patches.defer()
    }

    pub fn push_completion(&self, answer: Answer<CompletionPayload>) {
        self.completions.push(answer);
    }

    pub fn defer_completion(&self) -> oneshot::Sender<Answer<CompletionPayload>> {
        self.completions.defer()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn calls(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }

    pub fn patch_requests(&self) -> Vec<PatchRequest> {
        self.patch_requests.lock().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().push(entry);
    }
}

#[async_trait]
impl AttributeGateway for ScriptedGateway {
    async fn fetch_instance(&self, request: &InstanceRequest) -> Answer<InstanceResponse> {
        self.record(format!("fetch-instance:start:{}", request.field_name));
        let answer = self.instances.next(Operation::FetchInstance).await;
        self.record(format!("fetch-instance:done:{}", request.field_name));
        answer
    }

    async fn fetch_layout(
        &self,
        _attribute_type: &str,
        instance_id: &InstanceId,
    ) -> Answer<LayoutDescriptor> {
        self.record(format!("fetch-layout:start:{instance_id}"));
        self.layouts.next(Operation::FetchLayout).await
    }

    async fn patch_field(&self, request: &PatchRequest) -> Answer<Vec<PatchDocument>> {
        self.record(format!("patch-field:start:{}", request.property));
        self.patch_requests.lock().push(request.clone());
        self.patches.next(Operation::PatchField).await
    }

    async fn complete_instance(
        &self,
        _attribute_type: &str,
        instance_id: &InstanceId,
    ) -> Answer<CompletionPayload> {
        self.record(format!("complete-instance:start:{instance_id}"));
        self.completions.next(Operation::CompleteInstance).await
    }
}

/// Host recording every callback; answers discard prompts with `confirm`.
#[derive(Default)]
pub struct RecordingHost {
    pub locks: Mutex<Vec<bool>>,
    pub payloads: Mutex<Vec<Value>>,
    pub prompts: Mutex<Vec<Vec<String>>>,
    confirm: Mutex<bool>,
}

impl RecordingHost {
    pub fn new(confirm: bool) -> Arc<Self> {
        Arc::new(Self {
            confirm: Mutex::new(confirm),
            ..Self::default()
        })
    }

    pub fn locks(&self) -> Vec<bool> {
        self.locks.lock().clone()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().clone()
    }

    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.prompts.lock().clone()
    }
}

impl EditorHost for RecordingHost {
    fn backdrop_lock(&self, active: bool) {
        self.locks.lock().push(active);
    }

    fn patch_parent(&self, payload: Value) {
        self.payloads.lock().push(payload);
    }

    fn confirm_discard(&self, missing: &[String]) -> bool {
        self.prompts.lock().push(missing.to_vec());
        *self.confirm.lock()
    }
}

pub fn target(field: &str) -> EditorTarget {
    EditorTarget::new("pattribute", field, "window")
        .with_reference_key("1000001")
        .with_document("143", "1000042")
        .with_row("AD_Tab-187", "1000007")
}

pub fn instance(id: i64, fields: &[(&str, Value, bool)]) -> InstanceResponse {
    let mut fields_by_name = FieldsByName::new();
    for (name, value, mandatory) in fields {
        fields_by_name.insert(
            name.to_string(),
            FieldDescriptor::new(*name, value.clone()).mandatory(*mandatory),
        );
    }
    InstanceResponse {
        id: InstanceId::from(id),
        fields_by_name,
    }
}

pub fn layout() -> LayoutDescriptor {
    LayoutDescriptor {
        elements: vec![json!({"type": "primary", "fields": ["qty", "uom"]})],
    }
}

pub fn patch_echo(fields: &[(&str, Value)]) -> Vec<PatchDocument> {
    let mut fields_by_name = FieldsByName::new();
    for (name, value) in fields {
        fields_by_name.insert(name.to_string(), FieldDescriptor::new(*name, value.clone()));
    }
    vec![PatchDocument { fields_by_name }]
}

pub fn rejected(operation: Operation) -> GatewayError {
    GatewayError::rejected(operation, "server said no")
}

pub struct Harness {
    pub editor: AttributeEditor,
    pub gateway: Arc<ScriptedGateway>,
    pub host: Arc<RecordingHost>,
}

impl Harness {
    pub fn new(confirm: bool) -> Self {
        Self::with_options(confirm, EditorOptions::default())
    }

    pub fn with_options(confirm: bool, options: EditorOptions) -> Self {
        let gateway = ScriptedGateway::new();
        let host = RecordingHost::new(confirm);
        let editor = AttributeEditor::with_options(gateway.clone(), host.clone(), options);
        Self {
            editor,
            gateway,
            host,
        }
    }

    /// Scripts instance + layout and opens the editor for `field`.
    pub async fn open(&self, field: &str, response: InstanceResponse) {
        self.gateway.push_instance(Ok(response));
        self.gateway.push_layout(Ok(layout()));
        let outcome = self.editor.open(target(field)).await.expect("open");
        assert_eq!(outcome, OpenOutcome::Opened);
        assert_eq!(self.editor.state(), EditorState::Open);
    }
}

/// Yields until the editor reaches `state`; panics if it never does.
pub async fn wait_for_state(editor: &AttributeEditor, state: EditorState) {
    wait_until(&format!("editor to reach {state}"), || editor.state() == state).await;
}

/// Yields until `ready` holds; panics with `what` if it never does.
pub async fn wait_until(what: &str, mut ready: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if ready() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("gave up waiting for {what}");
}
