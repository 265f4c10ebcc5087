//! Remote side of the attribute editor.
//!
//! The controller only ever talks to an [`AttributeGateway`]; transports
//! (HTTP clients, fixtures, test doubles) implement it.

mod error;
mod fixture;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::form::{FieldValue, FieldsByName};

pub use error::{GatewayError, Operation, UnknownOperation};
pub use fixture::{FixtureGateway, GatewayFixture};

/// Identifier of a remote attribute instance. Servers hand these out as
/// either numbers or strings; both are normalized to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for InstanceId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => InstanceId(text),
            RawId::Number(number) => InstanceId(number.to_string()),
        })
    }
}

/// Parameters of the fetch-instance call; mirrors the editor's open target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRequest {
    pub attribute_type: String,
    pub reference_key: Option<String>,
    pub doc_type: Option<String>,
    pub data_id: Option<String>,
    pub tab_id: Option<String>,
    pub row_id: Option<String>,
    pub field_name: String,
    pub entity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResponse {
    pub id: InstanceId,
    #[serde(default)]
    pub fields_by_name: FieldsByName,
}

/// Layout of the editor form. The controller never looks inside the
/// elements; it only needs to know whether a layout arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    #[serde(default)]
    pub elements: Vec<Value>,
}

impl LayoutDescriptor {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    pub entity: String,
    pub doc_type: Option<String>,
    pub doc_id: InstanceId,
    pub property: String,
    pub value: FieldValue,
}

/// One document of a patch response. A single edit may fan out into
/// several documents and several fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDocument {
    #[serde(default)]
    pub fields_by_name: FieldsByName,
}

/// Opaque completion result, handed to the parent document as-is.
pub type CompletionPayload = Value;

#[async_trait]
pub trait AttributeGateway: Send + Sync {
    async fn fetch_instance(
        &self,
        request: &InstanceRequest,
    ) -> Result<InstanceResponse, GatewayError>;

    async fn fetch_layout(
        &self,
        attribute_type: &str,
        instance_id: &InstanceId,
    ) -> Result<LayoutDescriptor, GatewayError>;

    /// An empty vector means the server accepted the value but reported
    /// no field changes.
    async fn patch_field(&self, request: &PatchRequest)
    -> Result<Vec<PatchDocument>, GatewayError>;

    async fn complete_instance(
        &self,
        attribute_type: &str,
        instance_id: &InstanceId,
    ) -> Result<CompletionPayload, GatewayError>;
}
