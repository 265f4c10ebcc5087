use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::form::{FieldDescriptor, FieldsByName};

use super::{
    AttributeGateway, CompletionPayload, GatewayError, InstanceId, InstanceRequest,
    InstanceResponse, LayoutDescriptor, Operation, PatchDocument, PatchRequest,
};

/// Canned answers for a [`FixtureGateway`], usually read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayFixture {
    pub instance: InstanceResponse,
    #[serde(default)]
    pub layout: LayoutDescriptor,
    /// Patch responses keyed by the patched property. Properties without an
    /// entry get a single-field echo of the issued value.
    #[serde(default)]
    pub patches: IndexMap<String, Vec<PatchDocument>>,
    #[serde(default)]
    pub completion: Value,
    /// Operation name (`fetch-instance`, `patch-field`, ...) to rejection message.
    #[serde(default)]
    pub reject: IndexMap<String, String>,
}

/// In-memory gateway that replays a [`GatewayFixture`].
///
/// Patches are applied to an internal copy of the instance so the completion
/// payload reflects what was edited.
pub struct FixtureGateway {
    fixture: GatewayFixture,
    rejections: HashMap<Operation, String>,
    current: Mutex<FieldsByName>,
}

impl FixtureGateway {
    pub fn new(fixture: GatewayFixture) -> Self {
        let mut rejections = HashMap::new();
        for (name, message) in &fixture.reject {
            match name.parse::<Operation>() {
                Ok(operation) => {
                    rejections.insert(operation, message.clone());
                }
                Err(err) => warn!(error = %err, "ignoring scripted rejection"),
            }
        }
        let current = Mutex::new(fixture.instance.fields_by_name.clone());
        Self {
            fixture,
            rejections,
            current,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let fixture: GatewayFixture = serde_json::from_str(raw)?;
        Ok(Self::new(fixture))
    }

    /// Field values as the fixture currently holds them.
    pub fn current_values(&self) -> Map<String, Value> {
        self.current
            .lock()
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.value.clone()))
            .collect()
    }

    fn check(&self, operation: Operation) -> Result<(), GatewayError> {
        match self.rejections.get(&operation) {
            Some(message) => Err(GatewayError::rejected(operation, message.clone())),
            None => Ok(()),
        }
    }

    fn check_instance(
        &self,
        operation: Operation,
        instance_id: &InstanceId,
    ) -> Result<(), GatewayError> {
        if *instance_id != self.fixture.instance.id {
            return Err(GatewayError::rejected(
                operation,
                format!("no attribute instance {instance_id}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AttributeGateway for FixtureGateway {
    async fn fetch_instance(
        &self,
        request: &InstanceRequest,
    ) -> Result<InstanceResponse, GatewayError> {
        self.check(Operation::FetchInstance)?;
        debug!(
            attribute_type = %request.attribute_type,
            field = %request.field_name,
            "fixture fetch-instance"
        );
        Ok(InstanceResponse {
            id: self.fixture.instance.id.clone(),
            fields_by_name: self.current.lock().clone(),
        })
    }

    async fn fetch_layout(
        &self,
        _attribute_type: &str,
        instance_id: &InstanceId,
    ) -> Result<LayoutDescriptor, GatewayError> {
        self.check(Operation::FetchLayout)?;
        self.check_instance(Operation::FetchLayout, instance_id)?;
        Ok(self.fixture.layout.clone())
    }

    async fn patch_field(
        &self,
        request: &PatchRequest,
    ) -> Result<Vec<PatchDocument>, GatewayError> {
        self.check(Operation::PatchField)?;
        self.check_instance(Operation::PatchField, &request.doc_id)?;
        let documents = match self.fixture.patches.get(&request.property) {
            Some(documents) => documents.clone(),
            None => {
                let mut fields = FieldsByName::new();
                fields.insert(
                    request.property.clone(),
                    FieldDescriptor::new(request.property.clone(), request.value.clone()),
                );
                vec![PatchDocument {
                    fields_by_name: fields,
                }]
            }
        };
        let mut current = self.current.lock();
        for document in &documents {
            for name in document.fields_by_name.keys() {
                if let Some(descriptor) = current.get_mut(name) {
                    descriptor.value = request.value.clone();
                }
            }
        }
        Ok(documents)
    }

    async fn complete_instance(
        &self,
        _attribute_type: &str,
        instance_id: &InstanceId,
    ) -> Result<CompletionPayload, GatewayError> {
        self.check(Operation::CompleteInstance)?;
        self.check_instance(Operation::CompleteInstance, instance_id)?;
        let mut payload = self.fixture.completion.clone();
        if let Value::Object(entries) = &mut payload
            && !entries.contains_key("values")
        {
            entries.insert("values".to_string(), Value::Object(self.current_values()));
        }
        Ok(payload)
    }
}
